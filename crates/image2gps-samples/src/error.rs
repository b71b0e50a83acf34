//! Error types for the `image2gps-samples` crate.

use image2gps_types::SampleId;

/// Errors raised while building a [`SampleRegistry`].
///
/// Both are configuration mistakes that should stop startup.
///
/// [`SampleRegistry`]: crate::SampleRegistry
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The registry must hold at least one record.
    #[error("sample registry is empty")]
    Empty,

    /// Two records share the same id.
    #[error("duplicate sample id: {0}")]
    DuplicateId(SampleId),
}
