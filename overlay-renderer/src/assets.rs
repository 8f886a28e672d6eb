//! Asset bytes: where image, background and font sources come from.
//!
//! Sources are data URIs (base64 or percent-encoded) or, when a base
//! directory is configured, file paths.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{abbreviate, RenderError, RenderResult};

/// Fetches the bytes behind an asset `src`.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Fetch the bytes for `src`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::AssetUnavailable`] if the content cannot be
    /// obtained.
    async fn fetch(&self, src: &str) -> RenderResult<Vec<u8>>;
}

/// Resolves data URIs, and file paths under an optional base directory.
#[derive(Debug, Clone, Default)]
pub struct DataUriSource {
    base_dir: Option<PathBuf>,
}

impl DataUriSource {
    /// A source that only understands data URIs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also read file paths; relative paths resolve against `base_dir`.
    #[must_use]
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    /// The configured base directory.
    #[must_use]
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    fn read_file(&self, src: &str) -> RenderResult<Vec<u8>> {
        let Some(base) = &self.base_dir else {
            return Err(RenderError::AssetUnavailable(format!(
                "{src}: file sources are disabled"
            )));
        };
        let path = src.strip_prefix("file://").unwrap_or(src);
        let path = base.join(path);
        std::fs::read(&path).map_err(|e| {
            RenderError::AssetUnavailable(format!("{}: {e}", path.display()))
        })
    }
}

#[async_trait]
impl AssetSource for DataUriSource {
    async fn fetch(&self, src: &str) -> RenderResult<Vec<u8>> {
        tracing::trace!("Fetching asset {}", abbreviate(src));
        if src.starts_with("data:") {
            decode_data_uri(src)
        } else {
            self.read_file(src)
        }
    }
}

/// The payload of a data URI.
///
/// Supports formats like: `data:image/png;base64,iVBORw0KGgo...`
///
/// # Errors
///
/// Returns [`RenderError::AssetUnavailable`] if the URI is malformed.
pub fn decode_data_uri(uri: &str) -> RenderResult<Vec<u8>> {
    let Some(rest) = uri.strip_prefix("data:") else {
        return Err(RenderError::AssetUnavailable(format!(
            "{}: not a data URI",
            abbreviate(uri)
        )));
    };
    let (metadata, payload) = rest.split_once(',').ok_or_else(|| {
        RenderError::AssetUnavailable(format!("{}: missing comma", abbreviate(uri)))
    })?;

    if metadata.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        use base64::Engine;
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| RenderError::AssetUnavailable(format!("{}: {e}", abbreviate(uri))))
    } else {
        Ok(percent_encoding::percent_decode_str(payload).collect())
    }
}

/// Media type of a data URI, lowercased (`image/png`), if present.
#[must_use]
pub fn data_uri_media_type(uri: &str) -> Option<String> {
    let rest = uri.strip_prefix("data:")?;
    let metadata = rest.split_once(',')?.0;
    let media = metadata.split(';').next()?.trim();
    (!media.is_empty()).then(|| media.to_ascii_lowercase())
}
