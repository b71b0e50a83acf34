//! Virtual-time deadline queue for session timers.
//!
//! The queue is the explicit replacement for ambient runtime timers. Each
//! entry is tagged with the [`Generation`] of the session that armed it, so
//! the coordinator can both cancel a whole session's timers in one call and
//! recognise a stale timer that was already popped before cancellation.
//!
//! # Design Principles
//!
//! - Time is a plain `u64` millisecond counter owned by the caller. The
//!   queue never reads a wall clock.
//! - Timers due at the same instant fire in the order they were armed.
//! - Repeating timers are re-armed at `due + period`, never at `now +
//!   period`, so a late `pop_due` catches up tick by tick.
//! - All deadline arithmetic is checked.

use std::collections::BTreeMap;

/// Errors raised by timer scheduling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimerError {
    /// `now + delay` does not fit in a `u64`.
    #[error("timer deadline overflow: {now_ms} + {delay_ms}")]
    DeadlineOverflow {
        /// Time at which the timer was armed.
        now_ms: u64,
        /// Requested delay.
        delay_ms: u64,
    },

    /// A repeating timer needs a non-zero period.
    #[error("repeating timer period must be at least 1ms")]
    ZeroPeriod,
}

/// Identifies which session a timer belongs to.
///
/// Generations increase by one on every selection; a timer whose generation
/// differs from the live session's is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

impl Generation {
    /// The generation that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Raw counter value.
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for Generation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle for one armed timer. Stays the same across repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Repeating: bump the fake progress bar.
    ProgressTick,
    /// One-shot: the simulated inference has finished.
    LoadComplete,
    /// Repeating: reveal the next few characters.
    StreamTick,
}

/// A timer that has come due and been removed (or re-armed) by the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    /// Handle of the timer that fired.
    pub id: TimerId,
    /// Session generation that armed it.
    pub generation: Generation,
    /// What to do.
    pub kind: TimerKind,
    /// The instant it was scheduled for.
    pub due_ms: u64,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    id: TimerId,
    generation: Generation,
    kind: TimerKind,
    period_ms: Option<u64>,
}

/// Ordering key: deadline first, then arm order.
type Slot = (u64, u64);

/// Deadline-ordered set of generation-tagged timers.
#[derive(Debug, Default)]
pub struct TimerQueue {
    /// Pending entries keyed by `(due_ms, sequence)`.
    entries: BTreeMap<Slot, Entry>,
    /// Reverse index so a handle can be cancelled without a scan.
    slots: BTreeMap<TimerId, Slot>,
    /// Monotonic arm counter; doubles as the source of [`TimerId`]s.
    next_seq: u64,
}

impl TimerQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a timer that fires once, `delay_ms` after `now_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::DeadlineOverflow`] if the deadline does not fit.
    pub fn schedule_once(
        &mut self,
        generation: Generation,
        kind: TimerKind,
        now_ms: u64,
        delay_ms: u64,
    ) -> Result<TimerId, TimerError> {
        self.arm(generation, kind, now_ms, delay_ms, None)
    }

    /// Arm a timer that first fires `period_ms` after `now_ms` and then every
    /// `period_ms` until cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::ZeroPeriod`] for a zero period or
    /// [`TimerError::DeadlineOverflow`] if the first deadline does not fit.
    pub fn schedule_repeating(
        &mut self,
        generation: Generation,
        kind: TimerKind,
        now_ms: u64,
        period_ms: u64,
    ) -> Result<TimerId, TimerError> {
        if period_ms == 0 {
            return Err(TimerError::ZeroPeriod);
        }
        self.arm(generation, kind, now_ms, period_ms, Some(period_ms))
    }

    fn arm(
        &mut self,
        generation: Generation,
        kind: TimerKind,
        now_ms: u64,
        delay_ms: u64,
        period_ms: Option<u64>,
    ) -> Result<TimerId, TimerError> {
        let due = now_ms
            .checked_add(delay_ms)
            .ok_or(TimerError::DeadlineOverflow { now_ms, delay_ms })?;
        let seq = self.bump_seq();
        let id = TimerId(seq);
        self.insert((due, seq), Entry {
            id,
            generation,
            kind,
            period_ms,
        });
        Ok(id)
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        seq
    }

    fn insert(&mut self, slot: Slot, entry: Entry) {
        self.slots.insert(entry.id, slot);
        self.entries.insert(slot, entry);
    }

    /// Disarm a timer. Returns `false` if it was not armed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.slots.remove(&id) {
            Some(slot) => self.entries.remove(&slot).is_some(),
            None => false,
        }
    }

    /// Disarm every timer belonging to `generation`. Returns how many were
    /// removed.
    pub fn cancel_generation(&mut self, generation: Generation) -> usize {
        let doomed: Vec<TimerId> = self
            .entries
            .values()
            .filter(|entry| entry.generation == generation)
            .map(|entry| entry.id)
            .collect();
        doomed.into_iter().filter(|id| self.cancel(*id)).count()
    }

    /// Disarm everything.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.slots.clear();
    }

    /// Whether a timer is still armed.
    pub fn is_armed(&self, id: TimerId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<u64> {
        self.entries.keys().next().map(|&(due, _)| due)
    }

    /// Number of armed timers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no timers are armed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return the earliest timer due at or before `now_ms`.
    ///
    /// Repeating timers are re-armed one period after their deadline before
    /// being returned.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::DeadlineOverflow`] if a repeating timer cannot
    /// be re-armed. The timer is dropped in that case.
    pub fn pop_due(&mut self, now_ms: u64) -> Result<Option<FiredTimer>, TimerError> {
        let Some((&slot, _)) = self.entries.iter().next() else {
            return Ok(None);
        };
        let (due, _) = slot;
        if due > now_ms {
            return Ok(None);
        }
        let Some(entry) = self.entries.remove(&slot) else {
            return Ok(None);
        };
        self.slots.remove(&entry.id);

        if let Some(period_ms) = entry.period_ms {
            let next_due = due.checked_add(period_ms).ok_or(TimerError::DeadlineOverflow {
                now_ms: due,
                delay_ms: period_ms,
            })?;
            let seq = self.bump_seq();
            self.insert((next_due, seq), entry);
        }

        Ok(Some(FiredTimer {
            id: entry.id,
            generation: entry.generation,
            kind: entry.kind,
            due_ms: due,
        }))
    }
}
