//! Claim registry: the set of active strongholds.
//!
//! Claims never overlap. That is checked once, at registration; a claim's area
//! does not change afterwards. Registration is also the only place a claim gets
//! a live schedule, and removal always cancels it.

use std::sync::Arc;

use crate::claim::{Claim, ClaimId};
use crate::error::{ClaimError, Result};
use crate::events::{ClaimEvent, ClaimListener, RemovalReason};
use crate::region::BlockPos;
use crate::schedule::{INITIAL_DELAY, Scheduler, TickScheduler, UPDATE_PERIOD};
use crate::world::{Group, GroupId, PlayerId, World};

/// Owns every registered [`Claim`] and its update schedule.
pub struct ClaimRegistry<S = TickScheduler> {
    claims: Vec<Claim>,
    scheduler: S,
    listeners: Vec<Arc<dyn ClaimListener>>,
}

impl<S: Scheduler + Default> Default for ClaimRegistry<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: Scheduler> ClaimRegistry<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            claims: Vec::new(),
            scheduler,
            listeners: Vec::new(),
        }
    }

    /// Register a claim and start its periodic update.
    ///
    /// Re-registering a claim id that is already present is a successful no-op.
    /// A claim whose region intersects any registered one is rejected and dropped.
    pub fn register(&mut self, mut claim: Claim) -> Result<ClaimId> {
        let id = claim.id();
        if self.contains(id) {
            return Ok(id);
        }
        if let Some(existing) = self
            .claims
            .iter()
            .find(|c| c.region().intersects(claim.region()))
        {
            log::info!(
                "strongholdpmc: Rejected stronghold at {}, overlaps {}",
                claim.region(),
                existing.id()
            );
            return Err(ClaimError::Overlap {
                existing: existing.id(),
            });
        }

        claim.schedule = Some(
            self.scheduler
                .schedule_repeating(id, INITIAL_DELAY, UPDATE_PERIOD),
        );
        let event = ClaimEvent::Added {
            claim: id,
            region: *claim.region(),
            owner: claim.ownership.owner_name().map(str::to_owned),
        };
        log::info!(
            "strongholdpmc: Registered stronghold {id} ({}) for {}",
            claim.region(),
            claim.ownership.owner_name().unwrap_or("nobody"),
        );
        self.claims.push(claim);
        self.publish(&event);
        Ok(id)
    }

    /// Remove a claim and cancel its schedule. Absent ids are ignored.
    pub fn remove(&mut self, id: ClaimId) -> Option<Claim> {
        self.remove_with_reason(id, RemovalReason::Explicit)
    }

    pub(crate) fn remove_with_reason(
        &mut self,
        id: ClaimId,
        reason: RemovalReason,
    ) -> Option<Claim> {
        let index = self.claims.iter().position(|c| c.id() == id)?;
        let mut claim = self.claims.remove(index);
        if let Some(handle) = claim.schedule.take() {
            self.scheduler.cancel(handle);
        }
        log::info!("strongholdpmc: Removed stronghold {id} ({reason:?})");
        self.publish(&ClaimEvent::Removed { claim: id, reason });
        Some(claim)
    }

    #[must_use]
    pub fn contains(&self, id: ClaimId) -> bool {
        self.claims.iter().any(|c| c.id() == id)
    }

    #[must_use]
    pub fn get(&self, id: ClaimId) -> Option<&Claim> {
        self.claims.iter().find(|c| c.id() == id)
    }

    pub fn get_mut(&mut self, id: ClaimId) -> Option<&mut Claim> {
        self.claims.iter_mut().find(|c| c.id() == id)
    }

    /// The claim covering `pos`. At most one exists.
    #[must_use]
    pub fn find_containing(&self, pos: BlockPos) -> Option<&Claim> {
        self.claims.iter().find(|c| c.region().contains(pos))
    }

    /// The claim `player` owns and is standing in at `pos`.
    #[must_use]
    pub fn find_owned_by(&self, player: PlayerId, pos: BlockPos) -> Option<&Claim> {
        self.claims
            .iter()
            .find(|c| c.ownership.is_owner(player) && c.region().contains(pos))
    }

    /// First claim, in registration order, that `player` owns or defends through
    /// one of `groups`.
    #[must_use]
    pub fn find_defended_by(&self, player: PlayerId, groups: &[GroupId]) -> Option<&Claim> {
        self.claims.iter().find(|c| c.is_defender(player, groups))
    }

    /// Registered claims in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Claim> {
        self.claims.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    #[must_use]
    pub const fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub(crate) fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn subscribe(&mut self, listener: Arc<dyn ClaimListener>) {
        self.listeners.push(listener);
    }

    /// Deliver `event` to every subscriber, in subscription order.
    pub fn publish(&self, event: &ClaimEvent) {
        for listener in &self.listeners {
            listener.on_claim_event(event);
        }
    }

    // ── Mutations that must reach the save file ──

    pub fn rename<W: World + ?Sized>(
        &mut self,
        world: &W,
        id: ClaimId,
        name: &str,
    ) -> Result<()> {
        self.mutate(world, id, |claim| claim.rename(name))
    }

    pub fn affiliate<W: World + ?Sized>(
        &mut self,
        world: &W,
        id: ClaimId,
        group: &Group,
    ) -> Result<()> {
        self.mutate(world, id, |claim| claim.affiliate(group))
    }

    pub fn unaffiliate<W: World + ?Sized>(&mut self, world: &W, id: ClaimId) -> Result<()> {
        self.mutate(world, id, Claim::unaffiliate)
    }

    /// Add a logistic banner's expectancy bonus to a claim.
    pub fn attach_banner<W: World + ?Sized>(
        &mut self,
        world: &W,
        id: ClaimId,
        expectancy_bonus: f32,
    ) -> Result<()> {
        self.mutate(world, id, |claim| claim.attach_banner(expectancy_bonus))
    }

    /// Feed `satiety` into a claim's upkeep. Returns the in-game days added.
    ///
    /// Days bought are `satiety * duration_per_satiety`, scaled up by the claim's
    /// banner expectancy bonus, and extend from now if upkeep is unfunded or
    /// already lapsed.
    pub fn provision<W: World + ?Sized>(
        &mut self,
        world: &W,
        id: ClaimId,
        satiety: f32,
        duration_per_satiety: f64,
    ) -> Result<f64> {
        let now = world.calendar_days();
        let mut added = 0.0;
        self.mutate(world, id, |claim| {
            let bonus = 1.0 + f64::from(claim.upkeep.expectancy_bonus);
            added = f64::from(satiety.max(0.0)) * duration_per_satiety * bonus;
            let from = claim.upkeep.expires_at_day.map_or(now, |day| day.max(now));
            claim.upkeep.expires_at_day = Some(from + added);
        })?;
        Ok(added)
    }

    fn mutate<W, F>(&mut self, world: &W, id: ClaimId, f: F) -> Result<()>
    where
        W: World + ?Sized,
        F: FnOnce(&mut Claim),
    {
        let claim = self.get_mut(id).ok_or(ClaimError::UnknownClaim(id))?;
        f(claim);
        world.mark_dirty(claim.anchor());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use proptest::prelude::*;
    use uuid::Uuid;

    use super::*;
    use crate::claim::{Affiliation, Ownership};
    use crate::region::SpatialRegion;
    use crate::testkit::MemoryWorld;
    use crate::world::GameProfile;

    fn cube(a: (i32, i32, i32), b: (i32, i32, i32)) -> SpatialRegion {
        SpatialRegion::new(BlockPos::new(a.0, a.1, a.2), BlockPos::new(b.0, b.1, b.2))
    }

    fn owned(region: SpatialRegion, owner: &GameProfile) -> Claim {
        Claim::new(region, region.min(), Ownership::OwnedBy(owner.clone()))
    }

    fn alice() -> GameProfile {
        GameProfile::new(Uuid::new_v4(), "Alice")
    }

    #[test]
    fn register_schedules_and_announces() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut registry = ClaimRegistry::<TickScheduler>::default();
        registry.subscribe(Arc::new(move |e: &ClaimEvent| {
            sink.lock().unwrap().push(e.clone());
        }));

        let id = registry
            .register(owned(cube((0, 60, 0), (10, 70, 10)), &alice()))
            .unwrap();

        assert!(registry.get(id).unwrap().is_registered());
        assert_eq!(registry.scheduler().active(), 1);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(matches!(&seen[0], ClaimEvent::Added { claim, owner, .. }
            if *claim == id && owner.as_deref() == Some("Alice")));
    }

    #[test]
    fn overlapping_registration_leaves_registry_unchanged() {
        let mut registry = ClaimRegistry::<TickScheduler>::default();
        let x = registry
            .register(owned(cube((0, 60, 0), (10, 70, 10)), &alice()))
            .unwrap();

        let err = registry
            .register(owned(cube((5, 60, 5), (15, 70, 15)), &alice()))
            .unwrap_err();

        assert_eq!(err, ClaimError::Overlap { existing: x });
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.scheduler().active(), 1);
    }

    #[test]
    fn reregistering_same_claim_is_a_noop() {
        let mut registry = ClaimRegistry::<TickScheduler>::default();
        let region = cube((0, 0, 0), (4, 4, 4));
        let id = registry
            .register(Claim::new(region, region.min(), Ownership::Unowned))
            .unwrap();

        let again = registry.register(Claim::restore(id, region, region.min(), Ownership::Unowned));

        assert_eq!(again, Ok(id));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.scheduler().active(), 1);
    }

    #[test]
    fn remove_cancels_schedule_and_ignores_unknown_ids() {
        let mut registry = ClaimRegistry::<TickScheduler>::default();
        let id = registry
            .register(owned(cube((0, 0, 0), (4, 4, 4)), &alice()))
            .unwrap();

        let removed = registry.remove(id).unwrap();
        assert!(!removed.is_registered());
        assert!(registry.is_empty());
        assert!(registry.scheduler_mut().advance(std::time::Duration::from_secs(60)).is_empty());

        assert!(registry.remove(id).is_none());
        assert!(registry.remove(ClaimId::new()).is_none());
    }

    #[test]
    fn schedule_is_live_exactly_while_registered() {
        let mut registry = ClaimRegistry::<TickScheduler>::default();
        let a = cube((0, 0, 0), (4, 4, 4));
        let b = cube((10, 0, 0), (14, 4, 4));
        let a = registry
            .register(Claim::new(a, a.min(), Ownership::Unowned))
            .unwrap();
        let b = registry
            .register(Claim::new(b, b.min(), Ownership::Unowned))
            .unwrap();

        registry.remove(a);

        assert_eq!(registry.scheduler().active(), 1);
        assert!(registry.get(b).unwrap().is_registered());
        assert_eq!(
            registry.scheduler_mut().advance(std::time::Duration::from_secs(1)),
            vec![b]
        );
    }

    #[test]
    fn lookups_by_position_and_owner() {
        let owner = alice();
        let bob = GameProfile::new(Uuid::new_v4(), "Bob");
        let mut registry = ClaimRegistry::<TickScheduler>::default();
        let a = registry
            .register(owned(cube((0, 0, 0), (9, 9, 9)), &owner))
            .unwrap();
        let b = registry
            .register(owned(cube((20, 0, 0), (29, 9, 9)), &bob))
            .unwrap();

        assert_eq!(registry.find_containing(BlockPos::new(5, 5, 5)).map(Claim::id), Some(a));
        assert_eq!(registry.find_containing(BlockPos::new(25, 5, 5)).map(Claim::id), Some(b));
        assert!(registry.find_containing(BlockPos::new(15, 5, 5)).is_none());

        assert_eq!(
            registry.find_owned_by(owner.id, BlockPos::new(5, 5, 5)).map(Claim::id),
            Some(a)
        );
        assert!(registry.find_owned_by(owner.id, BlockPos::new(25, 5, 5)).is_none());
        assert!(registry.find_owned_by(bob.id, BlockPos::new(5, 5, 5)).is_none());
    }

    #[test]
    fn mutations_mark_anchor_dirty() {
        let world = MemoryWorld::new();
        let mut registry = ClaimRegistry::<TickScheduler>::default();
        let region = cube((0, 0, 0), (9, 9, 9));
        let anchor = BlockPos::new(4, 4, 4);
        let id = registry
            .register(Claim::new(region, anchor, Ownership::OwnedBy(alice())))
            .unwrap();
        let league = Group {
            id: GroupId(3),
            name: "wardens".into(),
        };

        registry.rename(&world, id, "Eastwatch").unwrap();
        registry.affiliate(&world, id, &league).unwrap();
        assert_eq!(
            registry.get(id).unwrap().affiliation,
            Affiliation::AffiliatedWith(GroupId(3))
        );
        registry.unaffiliate(&world, id).unwrap();

        let claim = registry.get(id).unwrap();
        assert_eq!(claim.display_name.as_deref(), Some("Eastwatch"));
        assert_eq!(claim.affiliation, Affiliation::Unaffiliated);
        assert_eq!(world.dirty_marks(), vec![anchor; 3]);

        let missing = ClaimId::new();
        assert_eq!(
            registry.rename(&world, missing, "nope"),
            Err(ClaimError::UnknownClaim(missing))
        );
        assert_eq!(world.dirty_marks().len(), 3);
    }

    #[test]
    fn provisioning_extends_upkeep_with_banner_bonus() {
        let world = MemoryWorld::new();
        world.set_day(10.0);
        let mut registry = ClaimRegistry::<TickScheduler>::default();
        let id = registry
            .register(owned(cube((0, 0, 0), (9, 9, 9)), &alice()))
            .unwrap();

        // Unfunded upkeep starts from today.
        let added = registry.provision(&world, id, 400.0, 0.0025).unwrap();
        assert!((added - 1.0).abs() < 1e-9);
        let expires = registry.get(id).unwrap().upkeep.expires_at_day.unwrap();
        assert!((expires - 11.0).abs() < 1e-9);

        registry.get_mut(id).unwrap().attach_banner(0.5);
        let added = registry.provision(&world, id, 400.0, 0.0025).unwrap();
        assert!((added - 1.5).abs() < 1e-9);
        let expires = registry.get(id).unwrap().upkeep.expires_at_day.unwrap();
        assert!((expires - 12.5).abs() < 1e-9);

        // Lapsed upkeep restarts from today too.
        world.set_day(20.0);
        registry.provision(&world, id, 400.0, 0.0025).unwrap();
        let expires = registry.get(id).unwrap().upkeep.expires_at_day.unwrap();
        assert!((expires - 21.5).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn registered_claims_never_overlap(
            ops in prop::collection::vec(
                (any::<bool>(), (-20i32..20, 0i32..8, -20i32..20), (0i32..8, 0i32..4, 0i32..8)),
                1..40,
            )
        ) {
            let mut registry = ClaimRegistry::<TickScheduler>::default();
            let mut ids = Vec::new();
            for (remove, origin, size) in ops {
                if remove && !ids.is_empty() {
                    let id = ids.remove(0);
                    registry.remove(id);
                    continue;
                }
                let region = cube(origin, (origin.0 + size.0, origin.1 + size.1, origin.2 + size.2));
                if let Ok(id) = registry.register(Claim::new(region, region.min(), Ownership::Unowned)) {
                    ids.push(id);
                }
            }

            let claims: Vec<_> = registry.iter().collect();
            for (i, a) in claims.iter().enumerate() {
                for b in &claims[i + 1..] {
                    prop_assert!(!a.region().intersects(b.region()));
                }
            }
            prop_assert_eq!(registry.scheduler().active(), registry.len());
        }
    }
}
