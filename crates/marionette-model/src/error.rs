//! Error types for model loading and session management.

/// Errors that can occur when loading or controlling a model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The descriptor's resolved asset could not be read or parsed.
    ///
    /// A failed load installs no state: the previous model, if any,
    /// remains active.
    #[error("failed to load model: {reason}")]
    Load {
        /// What went wrong while fetching or parsing the asset.
        reason: String,
    },

    /// The descriptor itself is malformed (unknown kind, empty path).
    #[error("invalid model descriptor: {reason}")]
    InvalidDescriptor {
        /// What is wrong with the descriptor.
        reason: String,
    },
}

impl ModelError {
    /// Build a [`ModelError::Load`] from any displayable cause.
    pub fn load(reason: impl std::fmt::Display) -> Self {
        Self::Load {
            reason: reason.to_string(),
        }
    }
}
