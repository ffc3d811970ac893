// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the composition engine.

use crate::element::ElementId;
use thiserror::Error;

/// Composition errors
#[derive(Debug, Error)]
pub enum CompositionError {
    /// Ingested file is neither an image nor a video
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Operation targets an element that no longer exists
    #[error("Element not found: {0:?}")]
    StaleReference(ElementId),

    /// Media content could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] image::ImageError),

    /// Settings file could not be parsed
    #[error("Settings error: {0}")]
    Settings(#[from] ron::error::SpannedError),

    /// Settings could not be written
    #[error("Settings serialization error: {0}")]
    SettingsWrite(#[from] ron::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for composition operations
pub type Result<T> = std::result::Result<T, CompositionError>;
