//! Event handlers: build protection, siege escalation on death, and the update tick.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::commands::{self, Reply};
use crate::events::{BlockModifyEvent, PlayerDeathEvent, ServerTickEvent};
use crate::privilege::PrivilegeEngine;
use crate::siege::{SiegeController, UpdateOutcome};
use crate::store::ClaimRegistry;
use crate::world::{GameProfile, World};

/// Language code shown to a player whose block modification was refused.
pub const NO_BUILD_PRIVILEGE: &str = "stronghold-nobuildprivilege";

/// The host world as the handlers see it.
pub type HostWorld = dyn World + Sync;

pub type SharedRegistry = Arc<RwLock<ClaimRegistry>>;

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// A host event subscriber. `handle_blocking` may cancel the event.
pub trait EventHandler<E>: Send + Sync {
    fn handle<'a>(&'a self, _world: &'a HostWorld, _event: &'a E) -> HandlerFuture<'a> {
        Box::pin(async {})
    }

    fn handle_blocking<'a>(&'a self, _world: &'a HostWorld, _event: &'a mut E) -> HandlerFuture<'a> {
        Box::pin(async {})
    }
}

/// Shared handle to stronghold state (used by commands).
#[derive(Clone)]
pub struct StrongholdRef {
    pub registry: SharedRegistry,
}

impl StrongholdRef {
    /// Run one `/stronghold` command line under the write lock.
    pub async fn run_command(&self, world: &HostWorld, caller: &GameProfile, args: &[&str]) -> Reply {
        let mut registry = self.registry.write().await;
        commands::dispatch(&mut *registry, world, caller, args)
    }
}

pub struct BlockModifyHandler {
    pub registry: SharedRegistry,
}

impl EventHandler<BlockModifyEvent> for BlockModifyHandler {
    fn handle_blocking<'a>(
        &'a self,
        world: &'a HostWorld,
        event: &'a mut BlockModifyEvent,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            let registry = self.registry.read().await;
            let decision =
                PrivilegeEngine::new(&*registry).may_modify(world, &event.player, event.position);
            drop(registry);

            if decision.is_allowed() {
                return;
            }
            event.claimant = decision.claimant().map(str::to_owned);
            event.cancelled = true;
            world.send_ingame_error(event.player.id, NO_BUILD_PRIVILEGE);
        })
    }
}

pub struct PlayerDeathHandler {
    pub registry: SharedRegistry,
    pub controller: SiegeController,
}

impl EventHandler<PlayerDeathEvent> for PlayerDeathHandler {
    fn handle<'a>(&'a self, world: &'a HostWorld, event: &'a PlayerDeathEvent) -> HandlerFuture<'a> {
        Box::pin(async move {
            let mut registry = self.registry.write().await;
            self.controller
                .on_player_death(&mut *registry, world, &event.player, &event.damage_source);
        })
    }
}

pub struct StrongholdTickHandler {
    pub registry: SharedRegistry,
    pub controller: SiegeController,
}

impl EventHandler<ServerTickEvent> for StrongholdTickHandler {
    fn handle<'a>(&'a self, world: &'a HostWorld, event: &'a ServerTickEvent) -> HandlerFuture<'a> {
        Box::pin(async move {
            let mut registry = self.registry.write().await;
            let outcomes = self.controller.tick(&mut *registry, world, event.elapsed);
            drop(registry);

            let expired = outcomes
                .iter()
                .filter(|(_, outcome)| *outcome == UpdateOutcome::Expired)
                .count();
            if expired > 0 {
                log::debug!("strongholdpmc: {expired} stronghold(s) expired this tick");
            }
        })
    }
}
