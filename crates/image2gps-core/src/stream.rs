//! Character-stream emitter for the streaming stage.
//!
//! The emitter owns the full formatted text and a cursor counted in
//! characters (Unicode scalar values, so multi-byte punctuation in the
//! narratives is never split). Each tick moves the cursor forward by a fixed
//! step, clamped to the text length. When the cursor reaches the end the
//! emitter cancels its own timer and reports completion exactly once.

use tracing::trace;

use crate::config::TimingConfig;
use crate::timer::{Generation, TimerError, TimerId, TimerKind, TimerQueue};

/// Lifecycle of one emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitterState {
    /// Created but not armed.
    Pending,
    /// Ticking.
    Running,
    /// Revealed everything and signalled completion.
    Completed,
    /// Disarmed from outside before completion.
    Stopped,
}

/// Result of one emitter tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEvent {
    /// More text is visible; `chars` is the revealed length.
    Revealed {
        /// Characters now visible.
        chars: usize,
    },
    /// The whole text is visible. Emitted once.
    Completed {
        /// Characters now visible (the full length).
        chars: usize,
    },
}

/// Incremental revealer over a fixed text.
#[derive(Debug, Clone)]
pub struct StreamEmitter {
    text: String,
    total_chars: usize,
    /// Revealed length in characters.
    cursor: usize,
    /// Revealed length in bytes, kept in step with `cursor`.
    revealed_bytes: usize,
    step: usize,
    interval_ms: u64,
    timer: Option<TimerId>,
    state: EmitterState,
}

impl StreamEmitter {
    /// Create a pending emitter over `text`.
    pub fn new(text: String, timing: &TimingConfig) -> Self {
        let total_chars = text.chars().count();
        Self {
            text,
            total_chars,
            cursor: 0,
            revealed_bytes: 0,
            step: timing.stream_chars_per_tick.max(1),
            interval_ms: timing.stream_interval_ms,
            timer: None,
            state: EmitterState::Pending,
        }
    }

    /// Start the repeating tick.
    ///
    /// Arming a completed or stopped emitter is a no-op.
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
        if self.state != EmitterState::Pending {
            return Ok(());
        }
        let id = queue.schedule_repeating(generation, TimerKind::StreamTick, now_ms, self.interval_ms)?;
        self.timer = Some(id);
        self.state = EmitterState::Running;
        Ok(())
    }

    /// Stop without signalling completion.
    pub fn disarm(&mut self, queue: &mut TimerQueue) {
        if let Some(id) = self.timer.take() {
            queue.cancel(id);
        }
        if self.state != EmitterState::Completed {
            self.state = EmitterState::Stopped;
        }
    }

    /// Reveal the next step.
    ///
    /// Returns `None` unless the emitter is running, which makes a completed
    /// or stopped emitter inert.
    pub fn tick(&mut self, queue: &mut TimerQueue) -> Option<StreamEvent> {
        if self.state != EmitterState::Running {
            return None;
        }

        let target = self.cursor.saturating_add(self.step).min(self.total_chars);
        let advanced = target.saturating_sub(self.cursor);
        self.revealed_bytes = self
            .text
            .get(self.revealed_bytes..)
            .and_then(|rest| rest.char_indices().nth(advanced))
            .map_or(self.text.len(), |(offset, _)| self.revealed_bytes.saturating_add(offset));
        self.cursor = target;

        if self.cursor >= self.total_chars {
            if let Some(id) = self.timer.take() {
                queue.cancel(id);
            }
            self.state = EmitterState::Completed;
            trace!(chars = self.cursor, "Stream complete");
            return Some(StreamEvent::Completed { chars: self.cursor });
        }

        trace!(chars = self.cursor, total = self.total_chars, "Stream tick");
        Some(StreamEvent::Revealed { chars: self.cursor })
    }

    /// The currently visible prefix.
    pub fn revealed(&self) -> &str {
        self.text.get(..self.revealed_bytes).unwrap_or_default()
    }

    /// The full text being revealed.
    pub fn full_text(&self) -> &str {
        &self.text
    }

    /// Revealed length in characters.
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Full length in characters.
    pub const fn total_chars(&self) -> usize {
        self.total_chars
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> EmitterState {
        self.state
    }
}
