//! Read-only projection of a [`SessionSnapshot`] into display strings.
//!
//! Nothing here mutates the session. The view layer polls a snapshot and
//! calls [`ViewModel::project`] to get every label, the rendered HTML, and
//! the map pin (withheld while loading).

use image2gps_types::{MapPin, SessionSnapshot, Stage};
use serde::Serialize;

use crate::config::MapConfig;
use crate::markdown::render_html;

/// Labels for the four status chips, in order.
pub const STATUS_STEPS: [&str; 4] = [
    "Queue / preprocess",
    "Model forward",
    "Postprocess",
    "Format + render",
];

/// Placeholder shown instead of coordinates while loading.
pub const COORDINATE_PLACEHOLDER: &str = "--.-- , --.--";

/// Placeholder for a single coordinate component while loading.
pub const COMPONENT_PLACEHOLDER: &str = "--.--";

/// One step of the "how it works" explainer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineStep {
    /// Short label.
    pub label: &'static str,
    /// One-sentence description.
    pub detail: &'static str,
}

/// The static explainer shown under the results.
pub const PIPELINE: [PipelineStep; 4] = [
    PipelineStep {
        label: "Capture",
        detail: "Snap/upload a campus photo from phone or laptop",
    },
    PipelineStep {
        label: "Swin geo-locator",
        detail: "Swin Transformer predicts lat/lng + confidence from the image",
    },
    PipelineStep {
        label: "LLM enrichment",
        detail: "Predicted coords + building cues go to GPT to craft a tailored prompt and narrative",
    },
    PipelineStep {
        label: "Render",
        detail: "Map pin drops, coordinates lock in, and we stream the Penn landmark background",
    },
];

/// A status chip and whether it is lit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChip {
    /// Chip label.
    pub label: &'static str,
    /// Whether the chip is highlighted.
    pub active: bool,
}

/// Everything the view renders for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    /// Current stage.
    pub stage: Stage,
    /// Status card heading.
    pub headline: &'static str,
    /// Progress bar width in percent.
    pub progress: u8,
    /// The four status chips.
    pub chips: Vec<StatusChip>,
    /// Combined coordinate readout.
    pub coordinates: String,
    /// Latitude cell.
    pub lat: String,
    /// Longitude cell.
    pub lng: String,
    /// Caption under the coordinate readout.
    pub coordinate_caption: &'static str,
    /// Badge on the description card.
    pub stream_badge: &'static str,
    /// Map pin; `None` while loading or before any selection.
    pub map: Option<MapPin>,
    /// Rendered description; empty while loading.
    pub html: String,
}

impl ViewModel {
    /// Project `snapshot` for display.
    pub fn project(snapshot: &SessionSnapshot, map: &MapConfig) -> Self {
        let stage = snapshot.stage;
        let locked = snapshot.coordinates_locked();
        let coords = snapshot
            .selection
            .as_ref()
            .filter(|_| locked)
            .map(|selection| selection.coordinates);

        let (coordinates, lat, lng) = coords.map_or_else(
            || {
                (
                    COORDINATE_PLACEHOLDER.to_owned(),
                    COMPONENT_PLACEHOLDER.to_owned(),
                    COMPONENT_PLACEHOLDER.to_owned(),
                )
            },
            |c| (c.to_fixed(), format!("{:.4}", c.lat), format!("{:.4}", c.lng)),
        );

        let pin = snapshot.selection.as_ref().filter(|_| locked).map(|selection| MapPin {
            lat: selection.coordinates.lat,
            lng: selection.coordinates.lng,
            zoom: selection.zoom.unwrap_or(map.default_zoom),
            title: selection.title.clone(),
            label: selection.coordinates.to_fixed(),
            remount_key: selection.coordinates.remount_key(),
        });

        let html = if stage == Stage::Loading {
            String::new()
        } else {
            render_html(&snapshot.text)
        };

        Self {
            stage,
            headline: headline(stage),
            progress: snapshot.progress,
            chips: chips(stage),
            coordinates,
            lat,
            lng,
            coordinate_caption: if stage == Stage::Loading {
                "Locating..."
            } else {
                "Coordinate locked in"
            },
            stream_badge: if stage == Stage::Loading { "Pending" } else { "Done" },
            map: pin,
            html,
        }
    }
}

/// Status card heading for `stage`.
pub const fn headline(stage: Stage) -> &'static str {
    match stage {
        Stage::Loading => "Processing image...",
        Stage::Streaming => "Streaming description...",
        Stage::Idle => "Complete",
    }
}

/// Status chips for `stage`.
///
/// Loading lights only "Model forward", streaming lights it and everything
/// after, idle lights all four.
pub fn chips(stage: Stage) -> Vec<StatusChip> {
    STATUS_STEPS
        .iter()
        .enumerate()
        .map(|(index, &label)| StatusChip {
            label,
            active: match stage {
                Stage::Loading => index == 1,
                Stage::Streaming => index >= 1,
                Stage::Idle => true,
            },
        })
        .collect()
}
