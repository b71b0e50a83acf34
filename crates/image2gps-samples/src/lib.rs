//! Static sample registry for the `Image2GPS` demo pipeline.
//!
//! The registry is a read-only table of [`Record`]s, each pairing a sample
//! photo with a precomputed "prediction". It has no logic beyond lookup:
//! an unknown id falls back to the first record so the view always has
//! something to show, and an empty table is rejected at construction.
//!
//! # Modules
//!
//! - [`error`] -- Construction errors (empty table, duplicate ids).
//! - [`registry`] -- [`SampleRegistry`] lookup and gallery layout.
//! - [`penn`] -- The bundled Penn Engineering campus samples.
//!
//! [`Record`]: image2gps_types::Record

pub mod error;
pub mod penn;
pub mod registry;

pub use error::RegistryError;
pub use penn::penn_engineering_samples;
pub use registry::SampleRegistry;
