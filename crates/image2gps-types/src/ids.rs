//! Identifier newtypes.
//!
//! Samples are keyed by a human-readable slug (`penn-smith-walk`) that is
//! stable across builds, so [`SampleId`] wraps a `String`. Sessions are
//! ephemeral and get a time-ordered UUID v7 so that log lines for one
//! selection can be correlated.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Stable slug identifying one sample in the registry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SampleId(pub String);

impl SampleId {
    /// Create a sample identifier from any string-like value.
    pub fn new(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    /// Borrow the slug.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for SampleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SampleId {
    fn from(slug: &str) -> Self {
        Self(slug.to_owned())
    }
}

/// Identifier for one run of the pipeline (one selection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SessionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_id_displays_slug() {
        let id = SampleId::from("penn-smith-walk");
        assert_eq!(id.to_string(), "penn-smith-walk");
        assert_eq!(id.as_str(), "penn-smith-walk");
    }

    #[test]
    fn session_ids_are_unique() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn sample_id_serializes_transparently_as_newtype() {
        let id = SampleId::new("penn-meyerson-hall");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"penn-meyerson-hall\"");
    }
}
