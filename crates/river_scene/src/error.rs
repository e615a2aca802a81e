//! Error types for river_scene

use river_animation::AnimationError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading the dataset
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Failed to read the dataset source
    #[error("Failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A field could not be parsed as a number
    #[error("Invalid value '{value}' at line {line}, column {column}")]
    Parse {
        line: usize,
        column: usize,
        value: String,
    },

    /// A row has more samples than the header has x values
    #[error("Row at line {line} has {found} samples but the header defines {expected}")]
    RowTooLong {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// The dataset produced no points
    #[error("Dataset contains no points")]
    Empty,

    /// A coordinate is NaN or infinite
    #[error("Non-finite coordinate at line {line}")]
    NonFinite { line: usize },
}

/// Errors that can occur in the river scene
#[derive(Error, Debug)]
pub enum SceneError {
    /// Dataset could not be loaded; the scene never starts with an empty ring
    #[error("Scene initialization failed: {0}")]
    Init(#[source] DatasetError),

    /// Ring bounds or footprint are unusable
    #[error("Invalid segment ring: {0}")]
    InvalidRing(String),

    /// Configuration file could not be read or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rendering backend reported a failure
    #[error("Rendering backend failed: {0}")]
    Backend(String),

    /// Animation machinery failed
    #[error(transparent)]
    Animation(#[from] AnimationError),

    /// Operation not valid in the current cycle phase
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl From<toml::de::Error> for SceneError {
    fn from(err: toml::de::Error) -> Self {
        SceneError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SceneError {
    fn from(err: toml::ser::Error) -> Self {
        SceneError::Config(err.to_string())
    }
}

/// Result type for scene operations
pub type Result<T> = std::result::Result<T, SceneError>;
