//! Error types for scene operations.

use thiserror::Error;

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// Errors that can occur in scene operations.
///
/// A mutation that fails with any of these leaves the scene exactly as it
/// was before the call.
#[derive(Debug, Error)]
pub enum SceneError {
    /// Non-positive scale, size, zoom or canvas dimension, or opacity outside `0..=1`.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A style value (usually a color) could not be parsed.
    #[error("Invalid style: {0}")]
    InvalidStyle(String),

    /// An asset id is referenced but not present in the asset table.
    #[error("Asset unavailable: {0}")]
    AssetUnavailable(String),

    /// Element not found in scene.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// An element or asset with this id already exists.
    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    /// A project document could not be turned into a scene.
    #[error("Malformed project document: {0}")]
    MalformedProjectDocument(String),

    /// Scene serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
