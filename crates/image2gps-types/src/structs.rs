//! Core data structures shared between the registry, the pipeline engine,
//! and the view layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::Stage;
use crate::ids::{SampleId, SessionId};

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Coordinates {
    /// Latitude in decimal degrees (positive north).
    pub lat: f64,
    /// Longitude in decimal degrees (positive east).
    pub lng: f64,
}

impl Coordinates {
    /// Create a coordinate pair.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Render as `"lat, lng"` with four decimal places, e.g.
    /// `"39.9515, -75.1911"`.
    ///
    /// Rounding works on the exact binary value. A value sitting exactly
    /// halfway between two four-decimal results (only possible when its
    /// exact decimal expansion ends at the fifth digit, such as `0.03125`)
    /// rounds to the even digit.
    pub fn to_fixed(&self) -> String {
        format!("{:.4}, {:.4}", self.lat, self.lng)
    }

    /// Key that changes whenever either component changes.
    ///
    /// The map widget is keyed on this value so that a new coordinate pair
    /// forces a full remount and recenter.
    pub fn remount_key(&self) -> String {
        format!("{}-{}", self.lat, self.lng)
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One static sample in the registry: an image plus its precomputed
/// "prediction".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Record {
    /// Unique slug within the registry.
    pub id: SampleId,
    /// Display title, also used for the map popup.
    pub title: String,
    /// Where the photo was taken.
    pub coordinates: Coordinates,
    /// Preferred map zoom. The view falls back to its configured default.
    pub zoom: Option<u8>,
    /// Path to the sample image, relative to the static asset root.
    pub image: String,
    /// What the "model" claims to have recognized.
    pub narrative: String,
    /// Background about the landmark, shown as the location note.
    pub background: String,
    /// One-line visual summary of the photo.
    pub summary: String,
    /// Free-form tags.
    pub tags: Vec<String>,
}

/// The subset of a [`Record`] the view needs to label the active selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Selection {
    /// Sample being shown.
    pub id: SampleId,
    /// Display title.
    pub title: String,
    /// Final coordinates.
    pub coordinates: Coordinates,
    /// Preferred zoom, if any.
    pub zoom: Option<u8>,
}

impl From<&Record> for Selection {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            coordinates: record.coordinates,
            zoom: record.zoom,
        }
    }
}

// ---------------------------------------------------------------------------
// Session snapshot
// ---------------------------------------------------------------------------

/// Immutable view of the coordinator's current session.
///
/// Published after every mutation. Readers never see a partially applied
/// transition: stage, progress, and text always belong to the same
/// generation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SessionSnapshot {
    /// Session identifier, `None` before the first selection.
    pub session_id: Option<SessionId>,
    /// Monotonic generation counter; bumps on every selection.
    pub generation: u64,
    /// The active selection, `None` before the first selection.
    pub selection: Option<Selection>,
    /// Current pipeline stage.
    pub stage: Stage,
    /// Progress percentage, 0 to 100.
    pub progress: u8,
    /// Revealed prefix of the formatted description.
    pub text: String,
    /// Wall-clock time the session was created.
    pub started_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    /// Whether coordinates may be shown (anything but `Loading` with a
    /// selection present).
    pub fn coordinates_locked(&self) -> bool {
        self.stage != Stage::Loading && self.selection.is_some()
    }
}

// ---------------------------------------------------------------------------
// Map collaborator input
// ---------------------------------------------------------------------------

/// Everything the map widget needs to drop a pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MapPin {
    /// Latitude of the pin and map center.
    pub lat: f64,
    /// Longitude of the pin and map center.
    pub lng: f64,
    /// Zoom level.
    pub zoom: u8,
    /// Popup title.
    pub title: String,
    /// Popup coordinate line (four decimals).
    pub label: String,
    /// Widget key; a new value forces a remount.
    pub remount_key: String,
}
