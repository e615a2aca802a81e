//! Error types for river_animation

use thiserror::Error;

/// Errors raised while advancing animations
#[derive(Error, Debug)]
pub enum AnimationError {
    /// An update or completion callback failed
    #[error("Callback for '{label}' failed: {source}")]
    Callback {
        label: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A join barrier was used after it already released
    #[error("Barrier '{0}' already released")]
    BarrierReleased(String),

    /// The registry behind a handle has been dropped
    #[error("Animation registry is no longer alive")]
    RegistryGone,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl AnimationError {
    /// Wrap an arbitrary error raised inside a callback
    pub fn callback<E>(label: impl Into<String>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        AnimationError::Callback {
            label: label.into(),
            source: source.into(),
        }
    }
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;
