//! Renderer error types.

use overlay_core::SceneError;
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during preview or export.
///
/// Any of these aborts an export; no partial output is returned.
#[derive(Debug, Error)]
pub enum RenderError {
    /// An asset, background or font could not be fetched or found.
    #[error("Asset unavailable: {0}")]
    AssetUnavailable(String),

    /// Fetched bytes could not be decoded as an image, icon or font.
    #[error("Failed to decode {src}: {reason}")]
    ExportDecodeFailure {
        /// Source that failed to decode.
        src: String,
        /// Decoder message.
        reason: String,
    },

    /// Surface allocation failed.
    #[error("Surface error: {0}")]
    Surface(String),

    /// Output encoding failed.
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// The scene itself is invalid.
    #[error(transparent)]
    Scene(#[from] SceneError),
}

impl RenderError {
    pub(crate) fn decode(src: &str, reason: impl std::fmt::Display) -> Self {
        Self::ExportDecodeFailure {
            src: abbreviate(src),
            reason: reason.to_string(),
        }
    }
}

/// Shorten data URIs for messages and logs.
pub(crate) fn abbreviate(src: &str) -> String {
    const MAX: usize = 48;
    if src.len() <= MAX {
        return src.to_string();
    }
    let cut = (0..=MAX).rev().find(|i| src.is_char_boundary(*i)).unwrap_or(0);
    format!("{}…", &src[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbreviate_long_data_uri() {
        let uri = format!("data:image/png;base64,{}", "A".repeat(500));
        let short = abbreviate(&uri);
        assert!(short.len() < 60);
        assert!(short.starts_with("data:image/png;base64,"));
        assert_eq!(abbreviate("logo.png"), "logo.png");
    }
}
