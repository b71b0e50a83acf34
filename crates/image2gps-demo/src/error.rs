//! Error types for the demo binary.

/// Top-level error for the demo binary.
///
/// Each variant wraps a subsystem error so `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: image2gps_core::config::ConfigError,
    },

    /// The sample table is empty or malformed.
    #[error("registry error: {source}")]
    Registry {
        /// The underlying registry error.
        #[from]
        source: image2gps_samples::RegistryError,
    },

    /// The session driver failed or stopped early.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: image2gps_core::RunnerError,
    },

    /// The session driver task panicked or was cancelled.
    #[error("driver task failed: {source}")]
    Join {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },

    /// A view could not be serialized.
    #[error("serialization error: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
