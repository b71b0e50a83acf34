//! Shared type definitions for the `Image2GPS` demo pipeline.
//!
//! This crate is the single source of truth for the types that cross crate
//! boundaries: the sample records, the pipeline stage, and the read-only
//! session snapshot handed to the view layer. Types flow downstream to
//! `TypeScript` via `ts-rs` for the browser front-end.
//!
//! # Modules
//!
//! - [`ids`] -- Identifier newtypes for samples and sessions
//! - [`enums`] -- The pipeline [`Stage`]
//! - [`structs`] -- Records, coordinates, snapshots, and map pins

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::Stage;
pub use ids::{SampleId, SessionId};
pub use structs::{Coordinates, MapPin, Record, Selection, SessionSnapshot};
