//! Asset table entries: images, vector icons, fonts and the background.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{SceneError, SceneResult};

/// Box size used when neither an image element nor its asset records one.
pub const DEFAULT_IMAGE_SIZE: f32 = 100.0;

const fn default_image_size() -> f32 {
    DEFAULT_IMAGE_SIZE
}

/// Unique identifier for an asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Create a new unique asset ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wrap an existing identifier.
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What an asset holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AssetContent {
    /// Raster (or SVG) image referenced by URI or path.
    #[serde(alias = "icon")]
    Image {
        /// Data URI or file path.
        src: String,
        /// Natural width in pixels.
        #[serde(default = "default_image_size")]
        width: f32,
        /// Natural height in pixels.
        #[serde(default = "default_image_size")]
        height: f32,
    },

    /// Inline SVG markup whose paint can be recolored.
    VectorIcon {
        /// SVG document markup.
        markup: String,
        /// Natural width in pixels.
        #[serde(default = "default_image_size")]
        width: f32,
        /// Natural height in pixels.
        #[serde(default = "default_image_size")]
        height: f32,
    },

    /// A custom font face registered under `family`.
    Font {
        /// Family name elements use to select this face.
        family: String,
        /// Font file as data URI or path, when available.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        src: Option<String>,
    },
}

/// An entry in the scene's asset table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Unique identifier; generated when a document omits it.
    #[serde(default)]
    pub id: AssetId,
    /// Display name, usually the uploaded file name.
    #[serde(default)]
    pub name: String,
    /// Asset content.
    #[serde(flatten)]
    pub content: AssetContent,
}

impl Asset {
    /// Create a raster image asset.
    #[must_use]
    pub fn image(name: impl Into<String>, src: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            id: AssetId::new(),
            name: name.into(),
            content: AssetContent::Image {
                src: src.into(),
                width,
                height,
            },
        }
    }

    /// Create a vector icon asset from SVG markup.
    #[must_use]
    pub fn vector_icon(
        name: impl Into<String>,
        markup: impl Into<String>,
        width: f32,
        height: f32,
    ) -> Self {
        Self {
            id: AssetId::new(),
            name: name.into(),
            content: AssetContent::VectorIcon {
                markup: markup.into(),
                width,
                height,
            },
        }
    }

    /// Create a custom font asset.
    #[must_use]
    pub fn font(name: impl Into<String>, family: impl Into<String>, src: Option<String>) -> Self {
        Self {
            id: AssetId::new(),
            name: name.into(),
            content: AssetContent::Font {
                family: family.into(),
                src,
            },
        }
    }

    /// Replace the generated id.
    #[must_use]
    pub fn with_id(mut self, id: AssetId) -> Self {
        self.id = id;
        self
    }

    /// Natural size for placeable assets; `None` for fonts.
    #[must_use]
    pub fn natural_size(&self) -> Option<(f32, f32)> {
        match &self.content {
            AssetContent::Image { width, height, .. }
            | AssetContent::VectorIcon { width, height, .. } => Some((*width, *height)),
            AssetContent::Font { .. } => None,
        }
    }

    /// Check the asset's size and content invariants.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidGeometry`] for non-positive sizes and
    /// [`SceneError::InvalidStyle`] for an empty font family.
    pub fn validate(&self) -> SceneResult<()> {
        if let Some((w, h)) = self.natural_size() {
            if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
                return Err(SceneError::InvalidGeometry(format!(
                    "asset {}: size must be > 0, got {w}x{h}",
                    self.id
                )));
            }
        }
        if let AssetContent::Font { family, .. } = &self.content {
            if family.trim().is_empty() {
                return Err(SceneError::InvalidStyle(format!(
                    "asset {}: font family is empty",
                    self.id
                )));
            }
        }
        Ok(())
    }
}

/// The full-canvas backdrop image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Background {
    /// Data URI or file path.
    pub src: String,
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
}

impl Background {
    /// Create a background reference.
    #[must_use]
    pub fn new(src: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            src: src.into(),
            width,
            height,
        }
    }
}
