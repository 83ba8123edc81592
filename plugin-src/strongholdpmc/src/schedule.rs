//! Per-claim periodic update scheduling.

use std::time::Duration;

use crate::claim::ClaimId;

/// Delay before a claim's first update.
pub const INITIAL_DELAY: Duration = Duration::from_millis(1000);
/// Interval between a claim's updates.
pub const UPDATE_PERIOD: Duration = Duration::from_millis(2000);

/// Token for one registered repeating callback.
///
/// Not `Clone` and not constructible outside this crate: only a scheduler mints
/// one, the registry keeps it on the claim, and cancelling consumes it.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct TickHandle(u64);

/// Host scheduling service.
pub trait Scheduler {
    /// Start calling back for `claim` after `initial_delay`, then every `period`.
    fn schedule_repeating(
        &mut self,
        claim: ClaimId,
        initial_delay: Duration,
        period: Duration,
    ) -> TickHandle;

    /// Stop the schedule. No callback for it may fire afterwards.
    fn cancel(&mut self, handle: TickHandle);
}

#[derive(Debug)]
struct Entry {
    handle: u64,
    claim: ClaimId,
    next_due: Duration,
    period: Duration,
}

/// In-process scheduler driven by a virtual clock.
///
/// The host advances it from its tick loop; [`TickScheduler::advance`] reports
/// which claims are due.
#[derive(Debug, Default)]
pub struct TickScheduler {
    now: Duration,
    next_handle: u64,
    entries: Vec<Entry>,
}

impl TickScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on the virtual clock.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Number of live schedules.
    #[must_use]
    pub fn active(&self) -> usize {
        self.entries.len()
    }

    /// Move the clock forward and return every due callback, oldest first.
    ///
    /// A schedule that fell behind by several periods fires once per period.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<ClaimId> {
        self.now += elapsed;
        let mut due = Vec::new();
        for entry in &mut self.entries {
            while entry.next_due <= self.now {
                due.push((entry.next_due, entry.handle, entry.claim));
                if entry.period.is_zero() {
                    entry.next_due = Duration::MAX;
                    break;
                }
                entry.next_due += entry.period;
            }
        }
        due.sort_by_key(|(at, handle, _)| (*at, *handle));
        due.into_iter().map(|(_, _, claim)| claim).collect()
    }
}

impl Scheduler for TickScheduler {
    fn schedule_repeating(
        &mut self,
        claim: ClaimId,
        initial_delay: Duration,
        period: Duration,
    ) -> TickHandle {
        self.next_handle += 1;
        self.entries.push(Entry {
            handle: self.next_handle,
            claim,
            next_due: self.now + initial_delay,
            period,
        });
        TickHandle(self.next_handle)
    }

    fn cancel(&mut self, handle: TickHandle) {
        self.entries.retain(|e| e.handle != handle.0);
    }
}
