//! Error types for the host binary.

/// Errors that can abort host startup or the run loop.
///
/// Gateway bind failures are deliberately absent: they degrade the API
/// surface instead of aborting the host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The configuration file could not be read or parsed.
    #[error("config error: {message}")]
    Config {
        /// What went wrong.
        message: String,
    },
}

impl HostError {
    /// Build a config error from any displayable cause.
    pub fn config(cause: impl std::fmt::Display) -> Self {
        Self::Config {
            message: cause.to_string(),
        }
    }
}
