//! StrongholdPMC: stronghold territorial claims with siege escalation.
//!
//! Modules, from pure values up to the host-facing surface:
//! - **[region](region)** - Block positions and axis-aligned claim volumes
//! - **[world](world)** - The host world as the stronghold core sees it
//! - **[claim](claim)** - Claim state: ownership, league, siege, upkeep
//! - **[store](store)** - Claim registry with the non-overlap guarantee
//! - **[privilege](privilege)** - Build privilege decisions
//! - **[siege](siege)** - Siege escalation, decay and upkeep expiry
//! - **[schedule](schedule)** - Per-claim periodic update scheduling
//! - **[events](events)** - Registry notifications and host events
//! - **[handlers](handlers)** - Block modify, player death and tick handlers
//! - **[commands](commands)** - /stronghold commands and executors
//! - **[testkit](testkit)** - In-memory world

pub mod claim;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod privilege;
pub mod region;
pub mod schedule;
pub mod siege;
pub mod store;
pub mod testkit;
pub mod world;

use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;

pub use claim::{Affiliation, Claim, ClaimId, Ownership, SiegeState, Upkeep};
pub use config::StrongholdConfig;
pub use error::{ClaimError, Result};
pub use privilege::{Grant, Privilege, PrivilegeEngine};
pub use region::{BlockPos, SpatialRegion};
pub use siege::{SiegeController, UpdateOutcome};
pub use store::ClaimRegistry;
pub use world::World;

use handlers::{
    BlockModifyHandler, HostWorld, PlayerDeathHandler, SharedRegistry, StrongholdRef,
    StrongholdTickHandler,
};

pub struct StrongholdPlugin {
    registry: SharedRegistry,
    config: StrongholdConfig,
}

impl StrongholdPlugin {
    pub fn new() -> Self {
        Self::with_config(StrongholdConfig::default())
    }

    pub fn with_config(config: StrongholdConfig) -> Self {
        Self {
            registry: Arc::new(RwLock::new(ClaimRegistry::default())),
            config,
        }
    }

    /// Load (or create) the config file at `config_path`.
    pub fn on_load(&mut self, config_path: &Path) -> std::result::Result<(), String> {
        self.config = StrongholdConfig::load(config_path)?;
        log::info!(
            "strongholdpmc: Loaded (claim radius {}, /stronghold commands)",
            self.config.claim.radius
        );
        Ok(())
    }

    pub fn on_unload(&mut self) {
        log::info!("strongholdpmc: Unloaded");
    }

    #[must_use]
    pub const fn config(&self) -> &StrongholdConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> SharedRegistry {
        Arc::clone(&self.registry)
    }

    fn controller(&self) -> SiegeController {
        SiegeController::from_config(&self.config.siege)
    }

    pub fn commands(&self) -> StrongholdRef {
        StrongholdRef {
            registry: self.registry(),
        }
    }

    pub fn block_modify_handler(&self) -> Arc<BlockModifyHandler> {
        Arc::new(BlockModifyHandler {
            registry: self.registry(),
        })
    }

    pub fn death_handler(&self) -> Arc<PlayerDeathHandler> {
        Arc::new(PlayerDeathHandler {
            registry: self.registry(),
            controller: self.controller(),
        })
    }

    pub fn tick_handler(&self) -> Arc<StrongholdTickHandler> {
        Arc::new(StrongholdTickHandler {
            registry: self.registry(),
            controller: self.controller(),
        })
    }

    /// Claim the configured area around a freshly placed stronghold anchor.
    ///
    /// The claim starts with the configured initial upkeep.
    pub async fn found_stronghold(
        &self,
        world: &HostWorld,
        anchor: BlockPos,
        ownership: Ownership,
    ) -> Result<ClaimId> {
        let mut claim = Claim::new(self.config.claim.region_around(anchor), anchor, ownership);
        claim.upkeep = Upkeep::until(world.calendar_days() + self.config.upkeep.initial_days);
        let mut registry = self.registry.write().await;
        let id = registry.register(claim)?;
        world.mark_dirty(anchor);
        Ok(id)
    }

    /// Feed satiety into a stronghold's upkeep. Returns the in-game days added.
    pub async fn provision(&self, world: &HostWorld, id: ClaimId, satiety: f32) -> Result<f64> {
        let mut registry = self.registry.write().await;
        registry.provision(world, id, satiety, self.config.upkeep.duration_per_satiety)
    }

    /// Hang a logistic banner in a stronghold, raising what future provisioning buys.
    pub async fn attach_banner(
        &self,
        world: &HostWorld,
        id: ClaimId,
        expectancy_bonus: f32,
    ) -> Result<()> {
        let mut registry = self.registry.write().await;
        registry.attach_banner(world, id, expectancy_bonus)
    }

    /// Drop a stronghold whose anchor was destroyed.
    pub async fn abandon(&self, id: ClaimId) -> Option<Claim> {
        self.registry.write().await.remove(id)
    }
}

impl Default for StrongholdPlugin {
    fn default() -> Self {
        Self::new()
    }
}
