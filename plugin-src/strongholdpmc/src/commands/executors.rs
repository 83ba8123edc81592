//! Command executors for each /stronghold subcommand.

use crate::claim::ClaimId;
use crate::commands::Reply;
use crate::error::ClaimError;
use crate::schedule::Scheduler;
use crate::store::ClaimRegistry;
use crate::world::{GameProfile, Group, World};

const NOT_YOUR_STRONGHOLD: &str = "You're not in a stronghold you claimed";
const NO_SUCH_GROUP: &str = "No such group found";

pub trait CommandExecutor {
    fn execute<S, W>(
        &self,
        registry: &mut ClaimRegistry<S>,
        world: &W,
        caller: &GameProfile,
        arg: &str,
    ) -> Reply
    where
        S: Scheduler,
        W: World + ?Sized;
}

/// Resolve the stronghold the caller stands in and owns, then run `process` on it.
fn with_owned_stronghold<S, W, F>(
    registry: &mut ClaimRegistry<S>,
    world: &W,
    caller: &GameProfile,
    process: F,
) -> Reply
where
    S: Scheduler,
    W: World + ?Sized,
    F: FnOnce(&mut ClaimRegistry<S>, ClaimId) -> Result<Reply, ClaimError>,
{
    let Some(pos) = world.player_position(caller.id) else {
        return Reply::NoOp(NOT_YOUR_STRONGHOLD.to_owned());
    };
    let Some(id) = registry.find_owned_by(caller.id, pos).map(|c| c.id()) else {
        return Reply::NoOp(NOT_YOUR_STRONGHOLD.to_owned());
    };
    process(registry, id).unwrap_or_else(|e| {
        log::warn!("strongholdpmc: Command by {} failed: {e}", caller.name);
        Reply::NoOp(e.to_string())
    })
}

fn resolve_group<W: World + ?Sized>(world: &W, name: &str) -> Option<Group> {
    world.group_by_name(name)
}

pub struct NameExecutor;

impl CommandExecutor for NameExecutor {
    fn execute<S, W>(
        &self,
        registry: &mut ClaimRegistry<S>,
        world: &W,
        caller: &GameProfile,
        name: &str,
    ) -> Reply
    where
        S: Scheduler,
        W: World + ?Sized,
    {
        with_owned_stronghold(registry, world, caller, |registry, id| {
            registry.rename(world, id, name)?;
            Ok(Reply::Done(format!("Stronghold named '{name}'")))
        })
    }
}

pub struct LeagueExecutor;

impl CommandExecutor for LeagueExecutor {
    fn execute<S, W>(
        &self,
        registry: &mut ClaimRegistry<S>,
        world: &W,
        caller: &GameProfile,
        group_name: &str,
    ) -> Reply
    where
        S: Scheduler,
        W: World + ?Sized,
    {
        with_owned_stronghold(registry, world, caller, |registry, id| {
            let Some(group) = resolve_group(world, group_name) else {
                return Ok(Reply::NoOp(NO_SUCH_GROUP.to_owned()));
            };
            registry.affiliate(world, id, &group)?;
            log::info!(
                "strongholdpmc: {} affiliated stronghold {id} with '{}'",
                caller.name,
                group.name
            );
            Ok(Reply::Done(format!("Stronghold affiliated with '{}'", group.name)))
        })
    }
}

pub struct StopLeagueExecutor;

impl CommandExecutor for StopLeagueExecutor {
    fn execute<S, W>(
        &self,
        registry: &mut ClaimRegistry<S>,
        world: &W,
        caller: &GameProfile,
        group_name: &str,
    ) -> Reply
    where
        S: Scheduler,
        W: World + ?Sized,
    {
        with_owned_stronghold(registry, world, caller, |registry, id| {
            let Some(group) = resolve_group(world, group_name) else {
                return Ok(Reply::NoOp(NO_SUCH_GROUP.to_owned()));
            };
            registry.unaffiliate(world, id)?;
            Ok(Reply::Done(format!(
                "Stronghold no longer affiliated with '{}'",
                group.name
            )))
        })
    }
}
