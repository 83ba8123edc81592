//! Events: notifications the registry publishes, and host events the handlers consume.

use std::time::Duration;

use crate::claim::ClaimId;
use crate::region::{BlockPos, SpatialRegion};
use crate::world::{DamageSource, GameProfile};

/// Why a claim left the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// Removed on request (flag broken, admin action).
    Explicit,
    /// Upkeep lapsed during a periodic update.
    Expired,
}

/// Published synchronously by [`ClaimRegistry`](crate::store::ClaimRegistry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimEvent {
    /// Fired after a successful registration.
    Added {
        claim: ClaimId,
        region: SpatialRegion,
        owner: Option<String>,
    },
    Removed {
        claim: ClaimId,
        reason: RemovalReason,
    },
}

/// Subscriber to registry notifications.
pub trait ClaimListener: Send + Sync {
    fn on_claim_event(&self, event: &ClaimEvent);
}

impl<F> ClaimListener for F
where
    F: Fn(&ClaimEvent) + Send + Sync,
{
    fn on_claim_event(&self, event: &ClaimEvent) {
        self(event);
    }
}

/// Fired when a player tries to place or break a block.
///
/// If cancelled, the modification is refused.
#[derive(Debug, Clone)]
pub struct BlockModifyEvent {
    /// The player modifying the block.
    pub player: GameProfile,
    /// Target block position.
    pub position: BlockPos,
    /// Owner name of the claim that refused the action, when known.
    pub claimant: Option<String>,
    pub cancelled: bool,
}

impl BlockModifyEvent {
    #[must_use]
    pub const fn new(player: GameProfile, position: BlockPos) -> Self {
        Self {
            player,
            position,
            claimant: None,
            cancelled: false,
        }
    }
}

/// Fired when a player has died.
#[derive(Debug, Clone)]
pub struct PlayerDeathEvent {
    /// The player who died.
    pub player: GameProfile,
    /// Death position.
    pub position: BlockPos,
    pub damage_source: DamageSource,
}

/// Fired by the host's tick loop.
#[derive(Debug, Clone, Copy)]
pub struct ServerTickEvent {
    /// Real time since the previous tick.
    pub elapsed: Duration,
}
