//! Fake progress bar for the loading stage.
//!
//! While armed, every tick adds a random step to the value and clamps it at
//! the configured ceiling (95 by default). The simulator can never report
//! 100 on its own; only [`ProgressSimulator::complete`], called by the
//! coordinator when loading actually finishes, sets it.

use rand::Rng;
use tracing::trace;

use crate::config::TimingConfig;
use crate::timer::{Generation, TimerError, TimerId, TimerKind, TimerQueue};

/// Value reported once loading has completed.
pub const COMPLETE: u8 = 100;

/// Bounded, monotonically non-decreasing progress value.
#[derive(Debug, Clone)]
pub struct ProgressSimulator {
    value: u8,
    ceiling: u8,
    step_min: u8,
    step_max: u8,
    interval_ms: u64,
    /// Repeating tick, present while armed.
    timer: Option<TimerId>,
}

impl ProgressSimulator {
    /// Create a disarmed simulator at 0.
    pub fn new(timing: &TimingConfig) -> Self {
        Self {
            value: 0,
            ceiling: timing.progress_ceiling.min(COMPLETE.saturating_sub(1)),
            step_min: timing.progress_step_min.min(timing.progress_step_max),
            step_max: timing.progress_step_max.max(timing.progress_step_min),
            interval_ms: timing.progress_interval_ms,
            timer: None,
        }
    }

    /// Reset to 0 and start the repeating tick.
    ///
    /// # Errors
    ///
    /// Propagates [`TimerError`] if the tick cannot be scheduled.
    pub fn arm(
        &mut self,
        queue: &mut TimerQueue,
        generation: Generation,
        now_ms: u64,
    ) -> Result<(), TimerError> {
        self.disarm(queue);
        self.value = 0;
        let id = queue.schedule_repeating(generation, TimerKind::ProgressTick, now_ms, self.interval_ms)?;
        self.timer = Some(id);
        Ok(())
    }

    /// Stop ticking. Returns `true` if a timer was cancelled.
    pub fn disarm(&mut self, queue: &mut TimerQueue) -> bool {
        self.timer.take().is_some_and(|id| queue.cancel(id))
    }

    /// Whether the repeating tick is live.
    pub const fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    /// Advance by one random step, clamped to the ceiling.
    ///
    /// A disarmed simulator does not move.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> u8 {
        if !self.is_armed() {
            return self.value;
        }
        let step = rng.random_range(self.step_min..=self.step_max);
        self.value = self.value.saturating_add(step).min(self.ceiling);
        trace!(progress = self.value, step, "Progress tick");
        self.value
    }

    /// Stop ticking and jump to 100.
    pub fn complete(&mut self, queue: &mut TimerQueue) -> u8 {
        self.disarm(queue);
        self.value = COMPLETE;
        self.value
    }

    /// Current value.
    pub const fn value(&self) -> u8 {
        self.value
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn armed(seed: u64) -> (ProgressSimulator, TimerQueue, SmallRng) {
        let mut queue = TimerQueue::new();
        let mut sim = ProgressSimulator::new(&TimingConfig::default());
        sim.arm(&mut queue, Generation(1), 0).unwrap();
        (sim, queue, SmallRng::seed_from_u64(seed))
    }

    #[test]
    fn starts_at_zero_and_disarmed() {
        let sim = ProgressSimulator::new(&TimingConfig::default());
        assert_eq!(sim.value(), 0);
        assert!(!sim.is_armed());
    }

    #[test]
    fn arming_schedules_a_repeating_tick() {
        let (sim, queue, _) = armed(1);
        assert!(sim.is_armed());
        assert_eq!(queue.next_deadline(), Some(260));
    }

    #[test]
    fn ticks_are_monotonic_and_capped() {
        let (mut sim, _queue, mut rng) = armed(7);
        let mut last = 0;
        for _ in 0..100 {
            let value = sim.tick(&mut rng);
            assert!(value >= last);
            assert!(value <= 95);
            last = value;
        }
        assert_eq!(last, 95);
    }

    #[test]
    fn first_tick_moves_within_step_range() {
        for seed in 0..50 {
            let (mut sim, _queue, mut rng) = armed(seed);
            let value = sim.tick(&mut rng);
            assert!((5..=13).contains(&value), "seed {seed} gave {value}");
        }
    }

    #[test]
    fn disarmed_simulator_does_not_move() {
        let (mut sim, mut queue, mut rng) = armed(3);
        let before = sim.tick(&mut rng);
        assert!(sim.disarm(&mut queue));
        assert!(queue.is_empty());
        assert_eq!(sim.tick(&mut rng), before);
    }

    #[test]
    fn complete_snaps_to_one_hundred_and_cancels() {
        let (mut sim, mut queue, mut rng) = armed(11);
        sim.tick(&mut rng);
        assert_eq!(sim.complete(&mut queue), 100);
        assert!(!sim.is_armed());
        assert!(queue.is_empty());
        // Late ticks cannot pull it back below 100 or push past it.
        assert_eq!(sim.tick(&mut rng), 100);
    }

    #[test]
    fn rearming_resets_to_zero() {
        let (mut sim, mut queue, mut rng) = armed(5);
        sim.tick(&mut rng);
        sim.arm(&mut queue, Generation(2), 1_000).unwrap();
        assert_eq!(sim.value(), 0);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn custom_ceiling_is_respected() {
        let timing = TimingConfig {
            progress_ceiling: 40,
            progress_step_min: 30,
            progress_step_max: 30,
            ..TimingConfig::default()
        };
        let mut queue = TimerQueue::new();
        let mut sim = ProgressSimulator::new(&timing);
        sim.arm(&mut queue, Generation(1), 0).unwrap();
        let mut rng = SmallRng::seed_from_u64(0);
        assert_eq!(sim.tick(&mut rng), 30);
        assert_eq!(sim.tick(&mut rng), 40);
    }
}
