//! Enumeration types for the demo pipeline.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Phase of the staged reveal for the active selection.
///
/// A cycle always runs `Loading -> Streaming -> Idle`; a new cycle is only
/// started by a fresh selection. `Idle` is also the state before anything
/// has been selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Nothing is running. Final progress and text are retained.
    #[default]
    Idle,
    /// The simulated model is "thinking"; progress creeps towards the ceiling.
    Loading,
    /// The formatted description is being revealed a few characters at a time.
    Streaming,
}

impl Stage {
    /// Whether timers may still be pending for this stage.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Loading | Self::Streaming)
    }
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Streaming => "streaming",
        };
        f.write_str(name)
    }
}
