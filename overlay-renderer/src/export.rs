//! Scene export to PNG, JPEG or SVG.
//!
//! Every format starts from the same [`PreviewTree`] built from a scene
//! snapshot at the moment the export begins; raster formats then paint it
//! with tiny-skia and the SVG format serializes it.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use overlay_core::{Color, ElementId, Scene};

use crate::assets::{AssetSource, DataUriSource};
use crate::error::RenderResult;
use crate::fonts::FontBook;
use crate::placement::FALLBACK_BACKGROUND;
use crate::preview::{self, PreviewTree};
use crate::raster::{self, RasterImage};
use crate::vector;

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// PNG image.
    Png,
    /// JPEG image.
    Jpeg,
    /// SVG document (UTF-8 bytes).
    Svg,
}

impl ExportFormat {
    /// Guess the format from a file extension (`png`, `jpg`, `jpeg`, `svg`).
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }

    /// Canonical file extension.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Svg => "svg",
        }
    }

    /// MIME type of the output.
    #[must_use]
    pub fn media_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Svg => "image/svg+xml",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s.trim()).ok_or_else(|| format!("unknown export format '{s}' (expected png, jpeg or svg)"))
    }
}

/// Configuration for scene export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Canvas fill when the scene has no background (default: `#111111`).
    pub fallback_background: Color,
    /// JPEG quality 1-100 (default: 85).
    pub jpeg_quality: u8,
    /// Load installed fonts for raster text (default: true).
    pub system_fonts: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            fallback_background: FALLBACK_BACKGROUND,
            jpeg_quality: 85,
            system_fonts: true,
        }
    }
}

/// Exports a [`Scene`] to image and document formats.
///
/// Concurrent exports are independent: each call builds its own tree and
/// paints its own surface.
pub struct SceneExporter {
    config: ExportConfig,
    source: Arc<dyn AssetSource>,
    fonts: FontBook,
}

impl fmt::Debug for SceneExporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneExporter")
            .field("config", &self.config)
            .field("fonts", &self.fonts)
            .finish_non_exhaustive()
    }
}

impl SceneExporter {
    /// Create an exporter that resolves data URIs only.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        let fonts = if config.system_fonts {
            FontBook::system()
        } else {
            FontBook::empty()
        };
        Self {
            config,
            source: Arc::new(DataUriSource::new()),
            fonts,
        }
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportConfig::default())
    }

    /// Fetch asset bytes through `source`.
    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn AssetSource>) -> Self {
        self.source = source;
        self
    }

    /// Use `fonts` instead of the configured font set.
    #[must_use]
    pub fn with_fonts(mut self, fonts: FontBook) -> Self {
        self.fonts = fonts;
        self
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export a scene to the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if the scene cannot be rendered or encoded. Nothing
    /// is returned for a failed export.
    pub async fn export(&self, scene: &Scene, format: ExportFormat) -> RenderResult<Vec<u8>> {
        tracing::info!(
            "Exporting {} element(s) as {} ({}x{})",
            scene.element_count(),
            format,
            scene.canvas_width(),
            scene.canvas_height()
        );
        match format {
            ExportFormat::Png => self.render_to_png(scene).await,
            ExportFormat::Jpeg => self.render_to_jpeg(scene).await,
            ExportFormat::Svg => Ok(self.render_to_svg(scene)?.into_bytes()),
        }
    }

    /// Paint the scene into a canvas-sized bitmap.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RenderError::AssetUnavailable`] if an asset, the
    /// background or a font cannot be obtained, and
    /// [`crate::RenderError::ExportDecodeFailure`] if fetched content does
    /// not decode.
    pub async fn render_raster(&self, scene: &Scene) -> RenderResult<RasterImage> {
        let tree = preview::build(scene, None, self.config.fallback_background)?;
        raster::paint(&tree, self.source.as_ref(), &self.fonts).await
    }

    /// Export the scene to PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    pub async fn render_to_png(&self, scene: &Scene) -> RenderResult<Vec<u8>> {
        self.render_raster(scene).await?.encode_png()
    }

    /// Export the scene to JPEG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    pub async fn render_to_jpeg(&self, scene: &Scene) -> RenderResult<Vec<u8>> {
        self.render_raster(scene)
            .await?
            .encode_jpeg(self.config.jpeg_quality, self.config.fallback_background)
    }

    /// Export the scene to an SVG document.
    ///
    /// # Errors
    ///
    /// Returns an error if an image element's asset is missing or an icon
    /// cannot be prepared.
    pub fn render_to_svg(&self, scene: &Scene) -> RenderResult<String> {
        vector::export_svg(scene, self.config.fallback_background)
    }

    /// Build the live preview tree, with an outline around `selection`.
    ///
    /// # Errors
    ///
    /// See [`preview::build`].
    pub fn preview(&self, scene: &Scene, selection: Option<&ElementId>) -> RenderResult<PreviewTree> {
        preview::build(scene, selection, self.config.fallback_background)
    }
}
