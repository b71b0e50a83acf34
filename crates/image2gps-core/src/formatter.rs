//! Builds the description that the stream emitter reveals.
//!
//! The output is a small markdown document: a header, the narrative, a
//! location note taken from the record's background, and a quick-facts list
//! with the coordinates and the model line. Formatting is pure; the same
//! record always produces the same text.

use image2gps_types::Record;

/// Heading that opens every description.
pub const HEADER: &str = "# Prediction";

/// Model line in the quick-facts block.
pub const MODEL_LINE: &str = "- Model: Swin Transformer + retrieval postprocess";

/// Format the full description for `record`.
///
/// Sections are separated by a blank line:
///
/// ```text
/// # Prediction
///
/// <narrative>
///
/// **Location note:** <background>
///
/// **Quick facts:**
/// - Lat/Lng: 39.9515, -75.1911
/// - Model: Swin Transformer + retrieval postprocess
/// ```
pub fn format_record(record: &Record) -> String {
    let facts = [
        "**Quick facts:**".to_owned(),
        format!("- Lat/Lng: {}", record.coordinates.to_fixed()),
        MODEL_LINE.to_owned(),
    ]
    .join("\n");

    [
        HEADER.to_owned(),
        record.narrative.clone(),
        format!("**Location note:** {}", record.background),
        facts,
    ]
    .join("\n\n")
}

#[cfg(test)]
mod tests {
    use image2gps_types::{Coordinates, SampleId};

    use super::*;

    fn record() -> Record {
        Record {
            id: SampleId::from("penn-smith-walk"),
            title: String::from("Smith Walk"),
            coordinates: Coordinates::new(39.95149, -75.19106),
            zoom: Some(17),
            image: String::from("/images/penn-smith-walk.jpg"),
            narrative: String::from("The model sees a banner."),
            background: String::from("A pedestrian corridor."),
            summary: String::from("Walkway"),
            tags: vec![String::from("campus")],
        }
    }

    #[test]
    fn formats_every_section_in_order() {
        let text = format_record(&record());
        let expected = "# Prediction\n\n\
            The model sees a banner.\n\n\
            **Location note:** A pedestrian corridor.\n\n\
            **Quick facts:**\n\
            - Lat/Lng: 39.9515, -75.1911\n\
            - Model: Swin Transformer + retrieval postprocess";
        assert_eq!(text, expected);
    }

    #[test]
    fn formatting_is_deterministic() {
        let r = record();
        assert_eq!(format_record(&r), format_record(&r));
    }

    #[test]
    fn empty_fields_keep_the_skeleton() {
        let mut r = record();
        r.narrative.clear();
        r.background.clear();
        let text = format_record(&r);
        assert!(text.starts_with(HEADER));
        assert!(text.contains("**Location note:** \n\n"));
        assert!(text.ends_with(MODEL_LINE));
    }

    #[test]
    fn negative_coordinates_keep_sign() {
        let mut r = record();
        r.coordinates = Coordinates::new(-33.8688, 151.2093);
        assert!(format_record(&r).contains("Lat/Lng: -33.8688, 151.2093"));
    }
}
