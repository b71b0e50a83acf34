//! Staged reveal engine for the `Image2GPS` demo.
//!
//! The demo pretends to run an image-to-coordinates model. Selecting a
//! sample starts a *session* that walks through three stages:
//!
//! 1. **Loading** -- a progress bar creeps towards 95% while a randomized
//!    delay elapses.
//! 2. **Streaming** -- progress snaps to 100% and the precomputed
//!    description is revealed a couple of characters at a time.
//! 3. **Idle** -- the full text stays on screen until the next selection.
//!
//! Every timer belongs to exactly one session generation. Selecting again
//! tears the old session down before arming anything new, and any timer
//! that still fires for an old generation is dropped without touching
//! state.
//!
//! # Modules
//!
//! - [`config`] -- Timing, randomness, logging, and demo configuration
//!   loaded from `image2gps-config.yaml`.
//! - [`timer`] -- Virtual-time deadline queue with generation-tagged timers.
//! - [`formatter`] -- Builds the markdown description for a record.
//! - [`progress`] -- Bounded, monotonically increasing fake progress.
//! - [`stream`] -- Character-stream emitter over the formatted text.
//! - [`coordinator`] -- The stage state machine and session ownership.
//! - [`runner`] -- Drives a coordinator against the tokio clock.
//! - [`markdown`] -- Markdown-to-HTML rendering of the revealed text.
//! - [`view`] -- Read-only projection of a snapshot for display.

pub mod config;
pub mod coordinator;
pub mod formatter;
pub mod markdown;
pub mod progress;
pub mod runner;
pub mod stream;
pub mod timer;
pub mod view;

pub use config::DemoConfig;
pub use coordinator::{Coordinator, CoordinatorError};
pub use formatter::format_record;
pub use runner::{Command, RunnerError, SessionHandle};
pub use timer::{FiredTimer, Generation, TimerKind, TimerQueue};
pub use view::ViewModel;
