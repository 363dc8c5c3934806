//! Error types for grab operations.

use thiserror::Error;

/// Errors that can occur while resolving or attaching grab targets.
///
/// None of these are fatal: the engine degrades every failure to "the grab
/// had no effect this frame" and logs it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GrabError {
    /// The attach point has no owning rigid body.
    #[error("attach point has no owning rigid body")]
    UnboundAttachPoint,

    /// The attach point was removed from the store.
    #[error("attach point not found: {0}")]
    AttachPointNotFound(u64),

    /// The rigid body no longer exists in the physics layer.
    #[error("body not found: {0}")]
    BodyNotFound(u64),

    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },
}

impl GrabError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }

    /// Check if this error comes from a reference that went stale
    /// (destroyed body or removed attach point).
    #[must_use]
    pub fn is_stale_reference(&self) -> bool {
        matches!(self, Self::AttachPointNotFound(_) | Self::BodyNotFound(_))
    }
}
