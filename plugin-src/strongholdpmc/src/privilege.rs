//! Build privilege: may this player place or break a block here?

use crate::claim::{Claim, Ownership};
use crate::region::BlockPos;
use crate::schedule::Scheduler;
use crate::store::ClaimRegistry;
use crate::world::{GameProfile, World};

/// Why a modification was allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    /// The target block or the wielded tool is siege equipment.
    SiegeEquipment,
    /// No stronghold covers the position.
    Unclaimed,
    /// The covering stronghold has no owner.
    Unowned,
    Owner,
    /// The player belongs to the stronghold's league.
    League,
}

/// Outcome of a privilege check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Privilege {
    Granted(Grant),
    /// Refused. `claimant` names the stronghold owner when one is known.
    Denied { claimant: Option<String> },
}

impl Privilege {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Granted(_))
    }

    #[must_use]
    pub fn claimant(&self) -> Option<&str> {
        match self {
            Self::Denied { claimant } => claimant.as_deref(),
            Self::Granted(_) => None,
        }
    }
}

/// Read-only privilege checks against a registry.
pub struct PrivilegeEngine<'a, S> {
    registry: &'a ClaimRegistry<S>,
}

impl<'a, S: Scheduler> PrivilegeEngine<'a, S> {
    #[must_use]
    pub const fn new(registry: &'a ClaimRegistry<S>) -> Self {
        Self { registry }
    }

    /// Decide whether `actor` may modify the block at `pos`.
    ///
    /// Fails closed when the target block cannot be resolved.
    pub fn may_modify<W: World + ?Sized>(
        &self,
        world: &W,
        actor: &GameProfile,
        pos: BlockPos,
    ) -> Privilege {
        log::debug!("strongholdpmc: Block modification attempt by {} at {pos}", actor.name);

        let Some(block) = world.block_at(pos) else {
            log::error!("strongholdpmc: Invalid block access by {} at {pos}", actor.name);
            return Privilege::Denied { claimant: None };
        };
        if block.siege_equipment {
            return Privilege::Granted(Grant::SiegeEquipment);
        }
        if let Some(item) = world.held_item(actor.id) {
            if item.siege_equipment {
                log::debug!("strongholdpmc: Siege equipment detected: {}", item.code);
                return Privilege::Granted(Grant::SiegeEquipment);
            }
        }

        let Some(claim) = self.registry.find_containing(pos) else {
            return Privilege::Granted(Grant::Unclaimed);
        };
        match check_access(claim, actor, world) {
            Some(grant) => {
                log::debug!(
                    "strongholdpmc: Privilege granted in {}'s stronghold",
                    claim.ownership.owner_name().unwrap_or("nobody")
                );
                Privilege::Granted(grant)
            }
            None => {
                log::debug!("strongholdpmc: Privilege denied for {}", actor.name);
                Privilege::Denied {
                    claimant: claim.ownership.owner_name().map(str::to_owned),
                }
            }
        }
    }
}

/// Ownership and league rules for one claim. An unowned claim is open to all,
/// whatever its affiliation.
fn check_access<W: World + ?Sized>(claim: &Claim, actor: &GameProfile, world: &W) -> Option<Grant> {
    match &claim.ownership {
        Ownership::Unowned => Some(Grant::Unowned),
        Ownership::OwnedBy(owner) if owner.id == actor.id => Some(Grant::Owner),
        Ownership::OwnedBy(_) => claim
            .affiliation
            .group_id()
            .filter(|group| world.is_member(actor.id, *group))
            .map(|_| Grant::League),
    }
}
