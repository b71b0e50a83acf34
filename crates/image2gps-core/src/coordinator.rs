//! The stage coordinator: one live session, three stages, no stale timers.
//!
//! # State machine
//!
//! ```text
//!   select()          load timer fires        emitter completes
//! ──────────► Loading ─────────────────► Streaming ─────────────► Idle
//! ```
//!
//! Every [`select`](Coordinator::select) bumps the generation, tears down the
//! previous session (cancelling all of its timers) and only then arms the new
//! session's progress ticker and load timer. Every timer callback goes
//! through [`on_timer`](Coordinator::on_timer), which compares the timer's
//! generation against the live session before touching anything. A timer
//! that was already popped from the queue when the selection changed is
//! therefore dropped, not applied.
//!
//! Time is virtual: the coordinator only moves when the caller advances it
//! (tests) or when the [`runner`](crate::runner) maps the tokio clock onto
//! it.

use chrono::{DateTime, Utc};
use image2gps_samples::SampleRegistry;
use image2gps_types::{Record, SessionId, SessionSnapshot, Selection, Stage};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::{DemoConfig, TimingConfig};
use crate::formatter::format_record;
use crate::progress::ProgressSimulator;
use crate::stream::{StreamEmitter, StreamEvent};
use crate::timer::{FiredTimer, Generation, TimerError, TimerId, TimerKind, TimerQueue};

/// Errors raised while driving the coordinator.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// A timer could not be scheduled or re-armed.
    #[error("timer error: {source}")]
    Timer {
        /// The underlying timer error.
        #[from]
        source: TimerError,
    },
}

/// Mutable state for one selection's run through the pipeline.
#[derive(Debug)]
struct Session {
    id: SessionId,
    generation: Generation,
    record: Record,
    stage: Stage,
    progress: ProgressSimulator,
    load_timer: Option<TimerId>,
    stream: Option<StreamEmitter>,
    started_at: DateTime<Utc>,
    /// Cleared on teardown; a torn-down session accepts no callbacks.
    live: bool,
}

impl Session {
    fn text(&self) -> &str {
        self.stream.as_ref().map_or("", StreamEmitter::revealed)
    }
}

/// Owner of the live session and every timer it arms.
#[derive(Debug)]
pub struct Coordinator<R = SmallRng> {
    timing: TimingConfig,
    rng: R,
    queue: TimerQueue,
    now_ms: u64,
    generation: Generation,
    session: Option<Session>,
}

impl Coordinator<SmallRng> {
    /// Build a coordinator from the demo configuration.
    ///
    /// A configured seed makes every delay and progress step reproducible;
    /// otherwise the RNG is seeded from the OS.
    pub fn from_config(config: &DemoConfig) -> Self {
        let rng = config
            .randomness
            .seed
            .map_or_else(SmallRng::from_os_rng, SmallRng::seed_from_u64);
        Self::new(config.timing.clone(), rng)
    }
}

impl<R: Rng> Coordinator<R> {
    /// Create an idle coordinator at virtual time 0.
    pub fn new(timing: TimingConfig, rng: R) -> Self {
        Self {
            timing,
            rng,
            queue: TimerQueue::new(),
            now_ms: 0,
            generation: Generation::default(),
            session: None,
        }
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Start a fresh pipeline for `record`.
    ///
    /// Re-selecting the active record is allowed and restarts from
    /// `Loading` with progress 0 and no text.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Timer`] if the new session's timers
    /// cannot be armed. The new session is torn down in that case.
    pub fn select(&mut self, record: &Record) -> Result<Generation, CoordinatorError> {
        // Teardown strictly precedes arming anything for the new session.
        self.teardown();

        self.generation = self.generation.next();
        let generation = self.generation;

        let mut session = Session {
            id: SessionId::new(),
            generation,
            record: record.clone(),
            stage: Stage::Loading,
            progress: ProgressSimulator::new(&self.timing),
            load_timer: None,
            stream: None,
            started_at: Utc::now(),
            live: true,
        };

        let delay_ms = self.loading_delay_ms();
        let armed = session
            .progress
            .arm(&mut self.queue, generation, self.now_ms)
            .and_then(|()| {
                self.queue
                    .schedule_once(generation, TimerKind::LoadComplete, self.now_ms, delay_ms)
            });

        match armed {
            Ok(load_timer) => session.load_timer = Some(load_timer),
            Err(err) => {
                session.progress.disarm(&mut self.queue);
                self.queue.cancel_generation(generation);
                session.live = false;
                self.session = Some(session);
                return Err(err.into());
            }
        }

        info!(
            session = %session.id,
            generation = %generation,
            sample = %record.id,
            delay_ms,
            "Session started"
        );
        self.session = Some(session);
        Ok(generation)
    }

    /// Select by sample id, falling back to the registry's default record
    /// for unknown ids.
    ///
    /// # Errors
    ///
    /// See [`select`](Self::select).
    pub fn select_by_id(
        &mut self,
        registry: &SampleRegistry,
        id: &str,
    ) -> Result<Generation, CoordinatorError> {
        let record = registry.resolve(id);
        self.select(record)
    }

    fn loading_delay_ms(&mut self) -> u64 {
        let lo = self.timing.loading_min_ms.min(self.timing.loading_max_ms);
        let hi = self.timing.loading_max_ms.max(self.timing.loading_min_ms);
        self.rng.random_range(lo..=hi)
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Cancel every timer owned by the current session, whatever its stage.
    ///
    /// The session's last values stay readable. Any callback for it that
    /// still arrives is ignored.
    pub fn teardown(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.live {
            return;
        }
        session.progress.disarm(&mut self.queue);
        if let Some(id) = session.load_timer.take() {
            self.queue.cancel(id);
        }
        if let Some(stream) = session.stream.as_mut() {
            stream.disarm(&mut self.queue);
        }
        // Sweep anything else still tagged with this generation.
        let swept = self.queue.cancel_generation(session.generation);
        session.live = false;
        debug!(
            session = %session.id,
            generation = %session.generation,
            stage = %session.stage,
            swept,
            "Session torn down"
        );
    }

    /// Tear down and drop every pending timer. Used on unmount.
    pub fn shutdown(&mut self) {
        self.teardown();
        self.queue.clear();
        info!(generation = %self.generation, "Coordinator shut down");
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Current virtual time in milliseconds.
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Deadline of the next pending timer.
    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.next_deadline()
    }

    /// Fire the earliest timer due at or before `now_ms`, if any.
    ///
    /// Virtual time moves to the timer's deadline before dispatch, so
    /// anything the callback arms is relative to when it was due.
    ///
    /// # Errors
    ///
    /// Propagates timer scheduling failures.
    pub fn step(&mut self, now_ms: u64) -> Result<Option<FiredTimer>, CoordinatorError> {
        let Some(fired) = self.queue.pop_due(now_ms)? else {
            return Ok(None);
        };
        self.now_ms = self.now_ms.max(fired.due_ms);
        self.on_timer(fired)?;
        Ok(Some(fired))
    }

    /// Fire every timer due up to `target_ms`, one at a time in deadline
    /// order, then move the clock to `target_ms`. Returns how many fired.
    ///
    /// # Errors
    ///
    /// Propagates timer scheduling failures.
    pub fn advance_to(&mut self, target_ms: u64) -> Result<usize, CoordinatorError> {
        let mut fired = 0_usize;
        while self.step(target_ms)?.is_some() {
            fired = fired.saturating_add(1);
        }
        self.sync_clock(target_ms);
        Ok(fired)
    }

    /// Move the clock forward to `target_ms` without firing anything.
    ///
    /// The clock never moves backwards. Callers that fire timers themselves
    /// (one [`step`](Self::step) at a time) use this once nothing is due.
    pub fn sync_clock(&mut self, target_ms: u64) {
        self.now_ms = self.now_ms.max(target_ms);
    }

    /// Advance the clock by `delta_ms`.
    ///
    /// # Errors
    ///
    /// Propagates timer scheduling failures.
    pub fn advance_by(&mut self, delta_ms: u64) -> Result<usize, CoordinatorError> {
        let target = self.now_ms.saturating_add(delta_ms);
        self.advance_to(target)
    }

    /// Run until no timers remain and return the final virtual time.
    ///
    /// Every session's timers terminate on their own (the load timer is
    /// one-shot, it cancels the progress ticker, and the emitter cancels
    /// itself at the end of the text), so this always returns.
    ///
    /// # Errors
    ///
    /// Propagates timer scheduling failures.
    pub fn run_until_settled(&mut self) -> Result<u64, CoordinatorError> {
        while let Some(deadline) = self.queue.next_deadline() {
            self.advance_to(deadline)?;
        }
        Ok(self.now_ms)
    }

    // -----------------------------------------------------------------------
    // Callback dispatch
    // -----------------------------------------------------------------------

    /// Apply a fired timer to the live session.
    ///
    /// Returns `false` without mutating anything when the timer belongs to
    /// a torn-down or superseded session, or when it does not match the
    /// current stage.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Timer`] if entering `Streaming` fails to
    /// arm the emitter.
    pub fn on_timer(&mut self, fired: FiredTimer) -> Result<bool, CoordinatorError> {
        let Some(session) = self.session.as_mut() else {
            debug!(generation = %fired.generation, kind = ?fired.kind, "Timer with no session ignored");
            return Ok(false);
        };
        if !session.live || session.generation != fired.generation {
            debug!(
                timer_generation = %fired.generation,
                live_generation = %session.generation,
                kind = ?fired.kind,
                "Stale timer ignored"
            );
            return Ok(false);
        }

        match (fired.kind, session.stage) {
            (TimerKind::ProgressTick, Stage::Loading) => {
                session.progress.tick(&mut self.rng);
                Ok(true)
            }
            (TimerKind::LoadComplete, Stage::Loading) => {
                session.load_timer = None;
                session.progress.complete(&mut self.queue);
                session.stage = Stage::Streaming;

                let text = format_record(&session.record);
                let mut emitter = StreamEmitter::new(text, &self.timing);
                emitter.arm(&mut self.queue, session.generation, self.now_ms)?;
                info!(
                    session = %session.id,
                    generation = %session.generation,
                    chars = emitter.total_chars(),
                    at_ms = self.now_ms,
                    "Loading complete, streaming"
                );
                session.stream = Some(emitter);
                Ok(true)
            }
            (TimerKind::StreamTick, Stage::Streaming) => {
                let event = session
                    .stream
                    .as_mut()
                    .and_then(|stream| stream.tick(&mut self.queue));
                match event {
                    Some(StreamEvent::Completed { chars }) => {
                        session.stage = Stage::Idle;
                        session.live = false;
                        info!(
                            session = %session.id,
                            generation = %session.generation,
                            chars,
                            at_ms = self.now_ms,
                            "Streaming complete"
                        );
                        Ok(true)
                    }
                    Some(StreamEvent::Revealed { .. }) => Ok(true),
                    None => Ok(false),
                }
            }
            (kind, stage) => {
                debug!(kind = ?kind, stage = %stage, "Timer does not match stage, ignored");
                Ok(false)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    /// Generation of the most recent selection (0 before any).
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Current stage (`Idle` before any selection).
    pub fn stage(&self) -> Stage {
        self.session.as_ref().map_or(Stage::Idle, |s| s.stage)
    }

    /// Current progress percentage.
    pub fn progress(&self) -> u8 {
        self.session.as_ref().map_or(0, |s| s.progress.value())
    }

    /// Currently revealed text.
    pub fn text(&self) -> &str {
        self.session.as_ref().map_or("", Session::text)
    }

    /// The record behind the current session.
    pub fn record(&self) -> Option<&Record> {
        self.session.as_ref().map(|s| &s.record)
    }

    /// Number of timers currently armed.
    pub fn pending_timers(&self) -> usize {
        self.queue.len()
    }

    /// Immutable copy of the session for readers.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.as_ref().map_or_else(
            || SessionSnapshot {
                generation: self.generation.value(),
                ..SessionSnapshot::default()
            },
            |session| SessionSnapshot {
                session_id: Some(session.id),
                generation: session.generation.value(),
                selection: Some(Selection::from(&session.record)),
                stage: session.stage,
                progress: session.progress.value(),
                text: session.text().to_owned(),
                started_at: Some(session.started_at),
            },
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image2gps_types::{Coordinates, SampleId};

    use super::*;

    fn record(id: &str, lat: f64, lng: f64) -> Record {
        Record {
            id: SampleId::from(id),
            title: format!("Title {id}"),
            coordinates: Coordinates::new(lat, lng),
            zoom: Some(17),
            image: format!("/images/{id}.jpg"),
            narrative: format!("Narrative for {id}."),
            background: format!("Background for {id}."),
            summary: String::from("summary"),
            tags: Vec::new(),
        }
    }

    fn coordinator(seed: u64) -> Coordinator {
        Coordinator::new(TimingConfig::default(), SmallRng::seed_from_u64(seed))
    }

    /// Fire timers one at a time until the coordinator reaches `stage`.
    fn run_until_stage(c: &mut Coordinator, stage: Stage) {
        while c.stage() != stage {
            let Some(deadline) = c.next_deadline() else {
                break;
            };
            c.step(deadline).unwrap();
        }
    }

    #[test]
    fn starts_idle_with_nothing_selected() {
        let c = coordinator(0);
        assert_eq!(c.stage(), Stage::Idle);
        assert_eq!(c.progress(), 0);
        assert_eq!(c.text(), "");
        assert!(c.record().is_none());
        assert_eq!(c.snapshot(), SessionSnapshot::default());
    }

    #[test]
    fn select_enters_loading_with_two_timers() {
        let mut c = coordinator(1);
        let generation = c.select(&record("a", 1.0, 2.0)).unwrap();
        assert_eq!(generation, Generation(1));
        assert_eq!(c.stage(), Stage::Loading);
        assert_eq!(c.progress(), 0);
        assert_eq!(c.text(), "");
        assert_eq!(c.pending_timers(), 2);
    }

    #[test]
    fn load_fires_inside_the_configured_window() {
        for seed in 0..20 {
            let mut c = coordinator(seed);
            c.select(&record("a", 1.0, 2.0)).unwrap();
            c.advance_to(2599).unwrap();
            assert_eq!(c.stage(), Stage::Loading, "seed {seed}");
            c.advance_to(4400).unwrap();
            assert_ne!(c.stage(), Stage::Loading, "seed {seed}");
        }
    }

    #[test]
    fn progress_is_monotonic_and_capped_during_loading() {
        let mut c = coordinator(9);
        c.select(&record("a", 1.0, 2.0)).unwrap();
        let mut last = 0;
        while c.stage() == Stage::Loading {
            let Some(deadline) = c.next_deadline() else {
                break;
            };
            c.step(deadline).unwrap();
            if c.stage() == Stage::Loading {
                assert!(c.progress() >= last);
                assert!(c.progress() <= 95);
                last = c.progress();
            }
        }
        assert_eq!(c.stage(), Stage::Streaming);
        assert_eq!(c.progress(), 100);
    }

    #[test]
    fn streaming_ends_idle_with_full_text() {
        let mut c = coordinator(2);
        let r = record("a", 39.95149, -75.19106);
        c.select(&r).unwrap();
        c.run_until_settled().unwrap();
        assert_eq!(c.stage(), Stage::Idle);
        assert_eq!(c.progress(), 100);
        assert_eq!(c.text(), format_record(&r));
        assert_eq!(c.pending_timers(), 0);
    }

    #[test]
    fn reselecting_same_record_restarts() {
        let mut c = coordinator(3);
        let r = record("a", 1.0, 2.0);
        c.select(&r).unwrap();
        c.run_until_settled().unwrap();
        assert_eq!(c.stage(), Stage::Idle);

        let generation = c.select(&r).unwrap();
        assert_eq!(generation, Generation(2));
        assert_eq!(c.stage(), Stage::Loading);
        assert_eq!(c.progress(), 0);
        assert_eq!(c.text(), "");
    }

    #[test]
    fn switching_mid_stream_leaves_no_trace_of_the_first() {
        let mut c = coordinator(4);
        let a = record("a", 1.0, 2.0);
        let b = record("b", 3.0, 4.0);
        c.select(&a).unwrap();
        run_until_stage(&mut c, Stage::Streaming);
        c.advance_by(100).unwrap();
        assert_eq!(c.stage(), Stage::Streaming);
        assert!(!c.text().is_empty());

        c.select(&b).unwrap();
        assert_eq!(c.stage(), Stage::Loading);
        assert_eq!(c.text(), "");
        // Only b's progress ticker and load timer remain.
        assert_eq!(c.pending_timers(), 2);

        c.run_until_settled().unwrap();
        assert_eq!(c.text(), format_record(&b));
        assert_eq!(c.record().map(|r| r.id.as_str()), Some("b"));
    }

    #[test]
    fn stale_timer_already_dequeued_is_ignored() {
        let mut c = coordinator(5);
        c.select(&record("a", 1.0, 2.0)).unwrap();

        // Pull a's load timer out as if the runtime had already queued it.
        let mut foreign = TimerQueue::new();
        let stale_id = foreign
            .schedule_once(Generation(1), TimerKind::LoadComplete, 0, 0)
            .unwrap();
        let stale = foreign.pop_due(0).unwrap().unwrap();
        assert_eq!(stale.id, stale_id);

        c.select(&record("b", 3.0, 4.0)).unwrap();
        let before = c.snapshot();
        assert!(!c.on_timer(stale).unwrap());
        assert_eq!(c.snapshot(), before);
        assert_eq!(c.stage(), Stage::Loading);
    }

    #[test]
    fn timers_after_shutdown_are_ignored() {
        let mut c = coordinator(6);
        c.select(&record("a", 1.0, 2.0)).unwrap();
        c.advance_by(1000).unwrap();
        let progress = c.progress();
        c.shutdown();
        assert_eq!(c.pending_timers(), 0);

        let late = FiredTimer {
            id: TimerQueue::new()
                .schedule_once(Generation(1), TimerKind::ProgressTick, 0, 0)
                .unwrap(),
            generation: Generation(1),
            kind: TimerKind::ProgressTick,
            due_ms: 1000,
        };
        assert!(!c.on_timer(late).unwrap());
        assert_eq!(c.progress(), progress);
        assert_eq!(c.advance_by(10_000).unwrap(), 0);
    }

    #[test]
    fn mismatched_kind_for_stage_is_ignored() {
        let mut c = coordinator(7);
        c.select(&record("a", 1.0, 2.0)).unwrap();
        let tick = FiredTimer {
            id: TimerQueue::new()
                .schedule_once(Generation(1), TimerKind::StreamTick, 0, 0)
                .unwrap(),
            generation: Generation(1),
            kind: TimerKind::StreamTick,
            due_ms: 0,
        };
        assert!(!c.on_timer(tick).unwrap());
        assert_eq!(c.text(), "");
    }

    #[test]
    fn snapshot_reflects_selection() {
        let mut c = coordinator(8);
        c.select(&record("a", 39.95149, -75.19106)).unwrap();
        let snap = c.snapshot();
        assert_eq!(snap.generation, 1);
        assert_eq!(snap.stage, Stage::Loading);
        assert!(snap.session_id.is_some());
        assert!(snap.started_at.is_some());
        assert_eq!(snap.selection.map(|s| s.id), Some(SampleId::from("a")));
    }

    #[test]
    fn select_by_unknown_id_uses_default_record() {
        let registry = SampleRegistry::penn_engineering().unwrap();
        let mut c = coordinator(10);
        c.select_by_id(&registry, "does-not-exist").unwrap();
        assert_eq!(c.record().map(|r| r.id.as_str()), Some("penn-smith-walk"));
    }

    #[test]
    fn sync_clock_moves_forward_only_and_fires_nothing() {
        let mut c = coordinator(12);
        c.select(&record("a", 1.0, 2.0)).unwrap();
        let pending = c.pending_timers();
        c.sync_clock(10_000);
        assert_eq!(c.now_ms(), 10_000);
        assert_eq!(c.stage(), Stage::Loading);
        assert_eq!(c.progress(), 0);
        assert_eq!(c.pending_timers(), pending);
        c.sync_clock(5_000);
        assert_eq!(c.now_ms(), 10_000);
    }

    #[test]
    fn fixed_window_gives_exact_delay() {
        let timing = TimingConfig {
            loading_min_ms: 1000,
            loading_max_ms: 1000,
            ..TimingConfig::default()
        };
        let mut c = Coordinator::new(timing, SmallRng::seed_from_u64(0));
        c.select(&record("a", 1.0, 2.0)).unwrap();
        c.advance_to(999).unwrap();
        assert_eq!(c.stage(), Stage::Loading);
        c.advance_to(1000).unwrap();
        assert_eq!(c.stage(), Stage::Streaming);
        assert_eq!(c.progress(), 100);
        assert_eq!(c.text(), "");
    }
}
