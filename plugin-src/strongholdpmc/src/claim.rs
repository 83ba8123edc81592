//! A single stronghold: claimed area, ownership, league affiliation, siege and upkeep state.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::region::{BlockPos, SpatialRegion};
use crate::schedule::TickHandle;
use crate::world::{EntityId, GameProfile, Group, GroupId, PlayerId};

/// Identity of a claim. Two claims are the same claim iff their ids are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimId(pub Uuid);

impl ClaimId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClaimId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Who holds exclusive build rights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ownership {
    /// Open access: anyone may build.
    Unowned,
    OwnedBy(GameProfile),
}

impl Ownership {
    #[must_use]
    pub const fn owner_id(&self) -> Option<PlayerId> {
        match self {
            Self::Unowned => None,
            Self::OwnedBy(profile) => Some(profile.id),
        }
    }

    #[must_use]
    pub fn owner_name(&self) -> Option<&str> {
        match self {
            Self::Unowned => None,
            Self::OwnedBy(profile) => Some(profile.name.as_str()),
        }
    }

    #[must_use]
    pub fn is_owner(&self, player: PlayerId) -> bool {
        self.owner_id() == Some(player)
    }
}

/// League affiliation. Members of the affiliated group share the owner's privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Affiliation {
    Unaffiliated,
    AffiliatedWith(GroupId),
}

impl Affiliation {
    #[must_use]
    pub const fn group_id(&self) -> Option<GroupId> {
        match self {
            Self::Unaffiliated => None,
            Self::AffiliatedWith(id) => Some(*id),
        }
    }
}

/// Siege meter. Never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SiegeState {
    intensity: f32,
    last_aggressor: Option<EntityId>,
}

impl SiegeState {
    #[must_use]
    pub const fn intensity(&self) -> f32 {
        self.intensity
    }

    #[must_use]
    pub const fn last_aggressor(&self) -> Option<EntityId> {
        self.last_aggressor
    }
}

/// Satiety-funded claim duration, in in-game calendar days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Upkeep {
    /// Day the funded upkeep runs out. `None` until first provisioned; an
    /// unfunded claim never lapses.
    pub expires_at_day: Option<f64>,
    /// Summed expectancy bonus of attached logistic banners.
    pub expectancy_bonus: f32,
}

impl Upkeep {
    #[must_use]
    pub const fn unfunded() -> Self {
        Self {
            expires_at_day: None,
            expectancy_bonus: 0.0,
        }
    }

    #[must_use]
    pub const fn until(expires_at_day: f64) -> Self {
        Self {
            expires_at_day: Some(expires_at_day),
            expectancy_bonus: 0.0,
        }
    }

    #[must_use]
    pub fn has_lapsed(&self, now_day: f64) -> bool {
        self.expires_at_day.is_some_and(|day| now_day >= day)
    }
}

/// One stronghold's persistent state.
///
/// `schedule` is `Some` exactly while the claim sits in a
/// [`ClaimRegistry`](crate::store::ClaimRegistry).
#[derive(Debug)]
pub struct Claim {
    id: ClaimId,
    region: SpatialRegion,
    anchor: BlockPos,
    pub ownership: Ownership,
    pub affiliation: Affiliation,
    pub display_name: Option<String>,
    siege: SiegeState,
    pub upkeep: Upkeep,
    pub(crate) schedule: Option<TickHandle>,
}

impl Claim {
    /// A fresh, unregistered claim.
    #[must_use]
    pub fn new(region: SpatialRegion, anchor: BlockPos, ownership: Ownership) -> Self {
        Self::restore(ClaimId::new(), region, anchor, ownership)
    }

    /// Rebuild a claim under a known id, e.g. when its anchor block entity reloads.
    #[must_use]
    pub fn restore(
        id: ClaimId,
        region: SpatialRegion,
        anchor: BlockPos,
        ownership: Ownership,
    ) -> Self {
        Self {
            id,
            region,
            anchor,
            ownership,
            affiliation: Affiliation::Unaffiliated,
            display_name: None,
            siege: SiegeState::default(),
            upkeep: Upkeep::unfunded(),
            schedule: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> ClaimId {
        self.id
    }

    #[must_use]
    pub const fn region(&self) -> &SpatialRegion {
        &self.region
    }

    #[must_use]
    pub const fn anchor(&self) -> BlockPos {
        self.anchor
    }

    #[must_use]
    pub const fn siege(&self) -> &SiegeState {
        &self.siege
    }

    #[must_use]
    pub const fn is_registered(&self) -> bool {
        self.schedule.is_some()
    }

    /// Whether `player` owns this claim or belongs to its league.
    ///
    /// `groups` are the player's group memberships.
    #[must_use]
    pub fn is_defender(&self, player: PlayerId, groups: &[GroupId]) -> bool {
        self.ownership.is_owner(player)
            || self
                .affiliation
                .group_id()
                .is_some_and(|group| groups.contains(&group))
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.display_name = Some(name.into());
    }

    pub fn affiliate(&mut self, group: &Group) {
        self.affiliation = Affiliation::AffiliatedWith(group.id);
    }

    pub fn unaffiliate(&mut self) {
        self.affiliation = Affiliation::Unaffiliated;
    }

    /// Add a logistic banner's expectancy bonus to future provisioning.
    pub fn attach_banner(&mut self, expectancy_bonus: f32) {
        self.upkeep.expectancy_bonus += expectancy_bonus.max(0.0);
    }

    pub fn increase_siege_intensity(&mut self, amount: f32, by: Option<EntityId>) {
        self.siege.intensity += amount.max(0.0);
        if by.is_some() {
            self.siege.last_aggressor = by;
        }
    }

    /// Lower the meter by `amount`, clamping at zero.
    pub fn decay_siege_intensity(&mut self, amount: f32) {
        self.siege.intensity = (self.siege.intensity - amount.max(0.0)).max(0.0);
        if self.siege.intensity == 0.0 {
            self.siege.last_aggressor = None;
        }
    }
}
