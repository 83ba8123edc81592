//! Siege escalation and the periodic per-claim update.
//!
//! A stronghold is "sieged" when its owner or a league member is killed inside it
//! by a hostile player, or by a creature guarding a hostile player who stands inside.
//! The meter decays over time; a claim whose upkeep lapses is removed.

use std::time::Duration;

use crate::claim::{Claim, ClaimId};
use crate::config::SiegeConfig;
use crate::events::RemovalReason;
use crate::schedule::{Scheduler, TickScheduler, UPDATE_PERIOD};
use crate::store::ClaimRegistry;
use crate::world::{DamageSource, EntityId, EntityRef, GameProfile, World};

/// Result of one policy step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpkeepVerdict {
    Sustained,
    Lapsed,
}

/// Time-dependent claim state: how siege cools down and when upkeep lapses.
pub trait UpkeepPolicy {
    /// Advance `claim` by `elapsed` real time at in-game day `now_day`.
    fn advance(&self, claim: &mut Claim, now_day: f64, elapsed: Duration) -> UpkeepVerdict;
}

/// Linear siege decay; expiry once the calendar passes the satiety-funded deadline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SatietyUpkeep {
    pub decay_per_minute: f32,
}

impl UpkeepPolicy for SatietyUpkeep {
    fn advance(&self, claim: &mut Claim, now_day: f64, elapsed: Duration) -> UpkeepVerdict {
        claim.decay_siege_intensity(self.decay_per_minute * elapsed.as_secs_f32() / 60.0);
        if claim.upkeep.has_lapsed(now_day) {
            UpkeepVerdict::Lapsed
        } else {
            UpkeepVerdict::Sustained
        }
    }
}

/// What a periodic update did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Active,
    /// Upkeep lapsed; the claim was removed and its schedule cancelled.
    Expired,
    /// The claim is not registered (already removed).
    Unknown,
}

/// Reacts to deaths and drives per-claim updates.
#[derive(Debug, Clone)]
pub struct SiegeController<P = SatietyUpkeep> {
    increase: f32,
    policy: P,
}

impl SiegeController<SatietyUpkeep> {
    #[must_use]
    pub fn from_config(config: &SiegeConfig) -> Self {
        Self::new(
            config.increase,
            SatietyUpkeep {
                decay_per_minute: config.decay_per_minute,
            },
        )
    }
}

impl<P: UpkeepPolicy> SiegeController<P> {
    #[must_use]
    pub fn new(increase: f32, policy: P) -> Self {
        Self { increase, policy }
    }

    /// Escalate siege on the victim's stronghold if the kill was hostile.
    ///
    /// Returns the claim whose intensity rose, if any.
    pub fn on_player_death<S, W>(
        &self,
        registry: &mut ClaimRegistry<S>,
        world: &W,
        victim: &GameProfile,
        source: &DamageSource,
    ) -> Option<ClaimId>
    where
        S: Scheduler,
        W: World + ?Sized,
    {
        let victim_groups = world.player_groups(victim.id);
        let claim = registry.find_defended_by(victim.id, &victim_groups)?;
        let by = source.responsible()?;
        let aggressor = hostile_aggressor(claim, world, by)?;

        let id = claim.id();
        let claim = registry.get_mut(id)?;
        claim.increase_siege_intensity(self.increase, Some(aggressor));
        log::info!(
            "strongholdpmc: {} killed in stronghold {id}, siege intensity now {:.1}",
            victim.name,
            claim.siege().intensity(),
        );
        Some(id)
    }

    /// Advance one claim's time-dependent state; remove it if upkeep lapsed.
    pub fn update<S, W>(
        &self,
        registry: &mut ClaimRegistry<S>,
        world: &W,
        id: ClaimId,
        elapsed: Duration,
    ) -> UpdateOutcome
    where
        S: Scheduler,
        W: World + ?Sized,
    {
        let now_day = world.calendar_days();
        let Some(claim) = registry.get_mut(id) else {
            return UpdateOutcome::Unknown;
        };
        match self.policy.advance(claim, now_day, elapsed) {
            UpkeepVerdict::Sustained => UpdateOutcome::Active,
            UpkeepVerdict::Lapsed => {
                log::info!("strongholdpmc: Upkeep lapsed for stronghold {id} on day {now_day:.2}");
                registry.remove_with_reason(id, RemovalReason::Expired);
                UpdateOutcome::Expired
            }
        }
    }

    /// Advance the registry's scheduler and run every due update.
    pub fn tick<W: World + ?Sized>(
        &self,
        registry: &mut ClaimRegistry<TickScheduler>,
        world: &W,
        elapsed: Duration,
    ) -> Vec<(ClaimId, UpdateOutcome)> {
        let due = registry.scheduler_mut().advance(elapsed);
        let mut outcomes = Vec::with_capacity(due.len());
        for id in due {
            // An earlier callback in this batch may have expired it.
            if !registry.contains(id) {
                continue;
            }
            outcomes.push((id, self.update(registry, world, id, UPDATE_PERIOD)));
        }
        outcomes
    }
}

/// The entity to blame when the kill counts as hostile to `claim`.
///
/// A player killer counts when standing inside and not a defender. A guard
/// creature counts when the player it guards stands inside and is not a defender.
fn hostile_aggressor<W: World + ?Sized>(
    claim: &Claim,
    world: &W,
    by: &EntityRef,
) -> Option<EntityId> {
    if let Some(player) = by.as_player() {
        let hostile = claim.region().contains(by.position)
            && !claim.is_defender(player.id, &world.player_groups(player.id));
        return hostile.then_some(by.id);
    }

    let guarded = by.guarded_player()?;
    let guarded_pos = world.player_position(guarded)?;
    let hostile = claim.region().contains(guarded_pos)
        && !claim.is_defender(guarded, &world.player_groups(guarded));
    hostile.then_some(by.id)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::claim::{Affiliation, Ownership, Upkeep};
    use crate::region::{BlockPos, SpatialRegion};
    use crate::testkit::MemoryWorld;
    use crate::world::{EntityKind, GroupId};

    const INSIDE: BlockPos = BlockPos::new(5, 65, 5);
    const OUTSIDE: BlockPos = BlockPos::new(40, 65, 40);

    struct Fixture {
        world: MemoryWorld,
        registry: ClaimRegistry<TickScheduler>,
        controller: SiegeController,
        claim: ClaimId,
        alice: GameProfile,
        bob: GameProfile,
    }

    fn fixture() -> Fixture {
        let alice = GameProfile::new(Uuid::new_v4(), "Alice");
        let bob = GameProfile::new(Uuid::new_v4(), "Bob");
        let mut claim = Claim::new(
            SpatialRegion::new(BlockPos::new(0, 60, 0), BlockPos::new(10, 70, 10)),
            BlockPos::new(5, 64, 5),
            Ownership::OwnedBy(alice.clone()),
        );
        claim.upkeep = Upkeep::until(5.0);
        let mut registry = ClaimRegistry::default();
        let claim = registry.register(claim).unwrap();
        Fixture {
            world: MemoryWorld::new(),
            registry,
            controller: SiegeController::from_config(&SiegeConfig::default()),
            claim,
            alice,
            bob,
        }
    }

    fn player_entity(id: u64, profile: &GameProfile, position: BlockPos) -> EntityRef {
        EntityRef {
            id: EntityId(id),
            kind: EntityKind::Player(profile.clone()),
            position,
        }
    }

    fn guard_entity(id: u64, guarded: Option<Uuid>, position: BlockPos) -> EntityRef {
        EntityRef {
            id: EntityId(id),
            kind: EntityKind::Creature {
                guarded_player: guarded,
            },
            position,
        }
    }

    fn killed_by(entity: EntityRef) -> DamageSource {
        DamageSource {
            cause_entity: None,
            source_entity: Some(entity),
        }
    }

    fn intensity(f: &Fixture) -> f32 {
        f.registry.get(f.claim).unwrap().siege().intensity()
    }

    #[test]
    fn hostile_player_inside_raises_siege_by_one() {
        let mut f = fixture();
        let source = killed_by(player_entity(2, &f.bob, INSIDE));

        let hit = f
            .controller
            .on_player_death(&mut f.registry, &f.world, &f.alice, &source);

        assert_eq!(hit, Some(f.claim));
        assert!((intensity(&f) - 1.0).abs() < f32::EPSILON);
        assert_eq!(
            f.registry.get(f.claim).unwrap().siege().last_aggressor(),
            Some(EntityId(2))
        );
    }

    #[test]
    fn killer_outside_or_friendly_does_not_count() {
        let mut f = fixture();
        let outside = killed_by(player_entity(2, &f.bob, OUTSIDE));
        assert!(f.controller.on_player_death(&mut f.registry, &f.world, &f.alice, &outside).is_none());

        f.registry
            .get_mut(f.claim)
            .unwrap()
            .affiliation = Affiliation::AffiliatedWith(GroupId(9));
        f.world.join_group(f.bob.id, GroupId(9));
        let friendly = killed_by(player_entity(2, &f.bob, INSIDE));
        assert!(f.controller.on_player_death(&mut f.registry, &f.world, &f.alice, &friendly).is_none());

        assert_eq!(intensity(&f), 0.0);
    }

    #[test]
    fn cause_entity_takes_precedence_over_source() {
        let mut f = fixture();
        let source = DamageSource {
            cause_entity: Some(player_entity(2, &f.bob, INSIDE)),
            source_entity: Some(guard_entity(3, None, INSIDE)),
        };
        f.controller
            .on_player_death(&mut f.registry, &f.world, &f.alice, &source);
        assert_eq!(
            f.registry.get(f.claim).unwrap().siege().last_aggressor(),
            Some(EntityId(2))
        );
    }

    #[test]
    fn guard_of_hostile_player_inside_counts() {
        let mut f = fixture();
        let source = killed_by(guard_entity(7, Some(f.bob.id), OUTSIDE));

        // Guarded player offline.
        assert!(f.controller.on_player_death(&mut f.registry, &f.world, &f.alice, &source).is_none());

        f.world.set_position(f.bob.id, Some(INSIDE));
        assert_eq!(
            f.controller
                .on_player_death(&mut f.registry, &f.world, &f.alice, &source),
            Some(f.claim)
        );

        // A wild creature guards nobody.
        let wild = killed_by(guard_entity(8, None, INSIDE));
        assert!(f.controller.on_player_death(&mut f.registry, &f.world, &f.alice, &wild).is_none());
        assert!((intensity(&f) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn league_member_death_sieges_affiliated_claim() {
        let mut f = fixture();
        let carol = GameProfile::new(Uuid::new_v4(), "Carol");
        f.registry
            .get_mut(f.claim)
            .unwrap()
            .affiliation = Affiliation::AffiliatedWith(GroupId(9));
        f.world.join_group(carol.id, GroupId(9));

        let source = killed_by(player_entity(2, &f.bob, INSIDE));
        assert_eq!(
            f.controller
                .on_player_death(&mut f.registry, &f.world, &carol, &source),
            Some(f.claim)
        );

        // Bob has no stronghold of his own.
        let revenge = killed_by(player_entity(1, &f.alice, INSIDE));
        assert!(f.controller.on_player_death(&mut f.registry, &f.world, &f.bob, &revenge).is_none());
    }

    #[test]
    fn owner_killing_league_member_inside_does_not_siege() {
        let mut f = fixture();
        let carol = GameProfile::new(Uuid::new_v4(), "Carol");
        f.registry
            .get_mut(f.claim)
            .unwrap()
            .affiliation = Affiliation::AffiliatedWith(GroupId(9));
        f.world.join_group(carol.id, GroupId(9));

        let source = killed_by(player_entity(1, &f.alice, INSIDE));
        assert!(f.controller.on_player_death(&mut f.registry, &f.world, &carol, &source).is_none());
        assert_eq!(intensity(&f), 0.0);
        assert_eq!(f.registry.get(f.claim).unwrap().siege().last_aggressor(), None);
    }

    #[test]
    fn guard_of_a_defender_does_not_siege() {
        let mut f = fixture();
        let carol = GameProfile::new(Uuid::new_v4(), "Carol");
        f.registry
            .get_mut(f.claim)
            .unwrap()
            .affiliation = Affiliation::AffiliatedWith(GroupId(9));
        f.world.join_group(carol.id, GroupId(9));
        f.world.set_position(carol.id, Some(INSIDE));
        f.world.set_position(f.alice.id, Some(INSIDE));

        // Carol's guard kills Alice while Carol stands inside.
        let league_guard = killed_by(guard_entity(5, Some(carol.id), INSIDE));
        assert!(f.controller.on_player_death(&mut f.registry, &f.world, &f.alice, &league_guard).is_none());

        // Alice's guard kills Carol while Alice stands inside.
        let owner_guard = killed_by(guard_entity(6, Some(f.alice.id), INSIDE));
        assert!(f.controller.on_player_death(&mut f.registry, &f.world, &carol, &owner_guard).is_none());

        assert_eq!(intensity(&f), 0.0);
    }

    #[test]
    fn freshly_registered_claim_survives_its_first_update() {
        let world = MemoryWorld::new();
        world.set_day(0.5);
        let alice = GameProfile::new(Uuid::new_v4(), "Alice");
        let mut registry = ClaimRegistry::<TickScheduler>::default();
        let id = registry
            .register(Claim::new(
                SpatialRegion::new(BlockPos::new(0, 60, 0), BlockPos::new(10, 70, 10)),
                BlockPos::new(5, 64, 5),
                Ownership::OwnedBy(alice),
            ))
            .unwrap();
        let controller = SiegeController::from_config(&SiegeConfig::default());

        let outcomes = controller.tick(&mut registry, &world, Duration::from_millis(1000));

        assert_eq!(outcomes, vec![(id, UpdateOutcome::Active)]);
        assert!(registry.get(id).unwrap().is_registered());
    }

    #[test]
    fn update_decays_siege_without_going_negative() {
        let mut f = fixture();
        f.registry
            .get_mut(f.claim)
            .unwrap()
            .increase_siege_intensity(0.1, None);

        let outcome = f
            .controller
            .update(&mut f.registry, &f.world, f.claim, Duration::from_secs(30));
        assert_eq!(outcome, UpdateOutcome::Active);
        assert!((intensity(&f) - 0.05).abs() < 1e-4);

        for _ in 0..10 {
            f.controller
                .update(&mut f.registry, &f.world, f.claim, Duration::from_secs(30));
        }
        assert_eq!(intensity(&f), 0.0);
    }

    #[test]
    fn lapsed_upkeep_expires_and_cancels_schedule() {
        let mut f = fixture();
        f.world.set_day(5.0);

        let outcome = f
            .controller
            .update(&mut f.registry, &f.world, f.claim, UPDATE_PERIOD);

        assert_eq!(outcome, UpdateOutcome::Expired);
        assert!(f.registry.is_empty());
        assert_eq!(f.registry.scheduler().active(), 0);
        assert_eq!(
            f.controller
                .update(&mut f.registry, &f.world, f.claim, UPDATE_PERIOD),
            UpdateOutcome::Unknown
        );
    }

    #[test]
    fn tick_runs_due_updates_until_removal() {
        let mut f = fixture();
        assert!(f
            .controller
            .tick(&mut f.registry, &f.world, Duration::from_millis(500))
            .is_empty());
        assert_eq!(
            f.controller
                .tick(&mut f.registry, &f.world, Duration::from_millis(500)),
            vec![(f.claim, UpdateOutcome::Active)]
        );

        f.registry.remove(f.claim);
        assert!(f
            .controller
            .tick(&mut f.registry, &f.world, Duration::from_secs(60))
            .is_empty());
    }
}
