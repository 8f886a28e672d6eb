//! Project document: the JSON file a scene is saved to and loaded from.
//!
//! Reads the files the browser editor wrote (`maskData`, `assetLibrary`,
//! `customFonts`, `viewBox` and `icon` element types are all accepted) and
//! writes the canonical camelCase form.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::scene::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, DEFAULT_PROJECT_NAME};
use crate::asset::DEFAULT_IMAGE_SIZE;
use crate::{
    Asset, AssetContent, AssetId, Background, Element, ElementId, ElementKind, ImageContent, Scene, SceneError,
    SceneResult,
};

/// Background as stored in a document: either a bare source or a sized
/// record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BackgroundDocument {
    /// `{ "src": ..., "width": ..., "height": ... }`
    Sized {
        /// Data URI or file path.
        src: String,
        /// Natural width; the canvas width when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<Number>,
        /// Natural height; the canvas height when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<Number>,
    },
    /// A bare data URI or path covering the canvas.
    Src(String),
}

/// A custom font listed outside the asset table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFontDocument {
    /// Asset id to register the font under.
    #[serde(default)]
    pub id: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Family name text elements refer to.
    pub family: String,
    /// Font file as data URI or path.
    #[serde(default)]
    pub src: Option<String>,
}

/// Serialized project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    /// Project name.
    #[serde(default = "ProjectDocument::default_name")]
    pub name: String,
    /// Canvas width in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas_width: Option<Number>,
    /// Canvas height in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas_height: Option<Number>,
    /// `"0 0 w h"`, read when the explicit size is missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_box: Option<String>,
    /// Backdrop image.
    #[serde(default, alias = "maskData")]
    pub background: Option<BackgroundDocument>,
    /// Asset table.
    #[serde(default, alias = "assetLibrary")]
    pub assets: Vec<Asset>,
    /// Fonts merged into the asset table on load.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_fonts: Vec<CustomFontDocument>,
    /// Elements; sorted by `zIndex` on load.
    #[serde(default)]
    pub elements: Vec<Element>,
}

/// What a load had to discard to produce a consistent scene.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Image elements dropped because their asset is missing.
    pub dropped_elements: Vec<ElementId>,
}

impl LoadReport {
    /// Whether the document loaded without discarding anything.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.dropped_elements.is_empty()
    }
}

impl ProjectDocument {
    fn default_name() -> String {
        DEFAULT_PROJECT_NAME.to_string()
    }

    /// Parse a document.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::MalformedProjectDocument`] if the text is not a
    /// project document.
    pub fn from_json(json: &str) -> SceneResult<Self> {
        serde_json::from_str(json).map_err(|e| SceneError::MalformedProjectDocument(e.to_string()))
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> SceneResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Canonical document for a scene.
    #[must_use]
    pub fn from_scene(scene: &Scene) -> Self {
        Self {
            name: scene.name().to_string(),
            canvas_width: Some(Number::from(scene.canvas_width())),
            canvas_height: Some(Number::from(scene.canvas_height())),
            view_box: None,
            background: scene.background().map(|bg| BackgroundDocument::Sized {
                src: bg.src.clone(),
                width: Some(Number::from(bg.width)),
                height: Some(Number::from(bg.height)),
            }),
            assets: scene.assets().to_vec(),
            custom_fonts: Vec::new(),
            elements: scene.elements().to_vec(),
        }
    }

    /// Build a scene.
    ///
    /// Image elements whose asset is missing are dropped and listed in the
    /// report; every other inconsistency rejects the whole document.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::MalformedProjectDocument`] for non-positive
    /// sizes, invalid elements or assets, and duplicate ids.
    pub fn into_scene(self) -> SceneResult<(Scene, LoadReport)> {
        let (canvas_width, canvas_height) = self.canvas_size()?;

        let background = match self.background {
            None => None,
            Some(BackgroundDocument::Src(src)) => Some(Background::new(src, canvas_width, canvas_height)),
            Some(BackgroundDocument::Sized { src, width, height }) => {
                let width = width.map_or(Ok(canvas_width), |n| dimension("background width", &n))?;
                let height = height.map_or(Ok(canvas_height), |n| dimension("background height", &n))?;
                Some(Background::new(src, width, height))
            }
        };

        let mut assets = self.assets;
        for font in self.custom_fonts {
            let asset = Asset::font(font.name.unwrap_or_default(), font.family, font.src);
            let asset = match font.id {
                Some(id) => asset.with_id(AssetId::from_string(id)),
                None => asset,
            };
            assets.push(asset);
        }
        let mut asset_ids = HashSet::new();
        for asset in &assets {
            asset.validate().map_err(malformed)?;
            if !asset_ids.insert(asset.id.clone()) {
                return Err(SceneError::MalformedProjectDocument(format!(
                    "duplicate asset id {}",
                    asset.id
                )));
            }
        }

        let mut elements = self.elements;
        elements.sort_by_key(|e| e.rank);
        let mut element_ids = HashSet::new();
        let mut report = LoadReport::default();
        let mut kept = Vec::with_capacity(elements.len());
        for mut element in elements {
            if let ElementKind::Image(image) = &mut element.kind {
                fill_missing_size(image, &assets);
            }
            element.validate().map_err(malformed)?;
            element.rotation_degrees = crate::element::normalize_degrees(element.rotation_degrees);
            if !element_ids.insert(element.id.clone()) {
                return Err(SceneError::MalformedProjectDocument(format!(
                    "duplicate element id {}",
                    element.id
                )));
            }
            let placeable = element.asset_id().map_or(true, |asset_id| {
                assets
                    .iter()
                    .any(|a| &a.id == asset_id && !matches!(a.content, AssetContent::Font { .. }))
            });
            if placeable {
                kept.push(element);
            } else {
                tracing::warn!("Dropping element {}: its asset is missing", element.id);
                report.dropped_elements.push(element.id);
            }
        }

        let scene = Scene::from_parts(self.name, canvas_width, canvas_height, background, assets, kept);
        tracing::debug!(
            "Project loaded: {}x{}, {} element(s), {} dropped",
            canvas_width,
            canvas_height,
            scene.element_count(),
            report.dropped_elements.len()
        );
        Ok((scene, report))
    }

    fn canvas_size(&self) -> SceneResult<(u32, u32)> {
        if let (Some(w), Some(h)) = (&self.canvas_width, &self.canvas_height) {
            return Ok((dimension("canvasWidth", w)?, dimension("canvasHeight", h)?));
        }
        if let Some(view_box) = &self.view_box {
            return parse_view_box(view_box);
        }
        if let Some(BackgroundDocument::Sized {
            width: Some(w),
            height: Some(h),
            ..
        }) = &self.background
        {
            return Ok((dimension("background width", w)?, dimension("background height", h)?));
        }
        Ok((DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT))
    }
}

/// Take an image element's missing box size from its asset, else
/// [`DEFAULT_IMAGE_SIZE`]. Zero counts as missing.
#[allow(clippy::float_cmp)]
fn fill_missing_size(image: &mut ImageContent, assets: &[Asset]) {
    if image.intrinsic_width != 0.0 && image.intrinsic_height != 0.0 {
        return;
    }
    let (width, height) = assets
        .iter()
        .find(|a| a.id == image.asset_id)
        .and_then(Asset::natural_size)
        .unwrap_or((DEFAULT_IMAGE_SIZE, DEFAULT_IMAGE_SIZE));
    if image.intrinsic_width == 0.0 {
        image.intrinsic_width = width;
    }
    if image.intrinsic_height == 0.0 {
        image.intrinsic_height = height;
    }
}

fn malformed(err: SceneError) -> SceneError {
    SceneError::MalformedProjectDocument(err.to_string())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn dimension_f64(what: &str, value: f64) -> SceneResult<u32> {
    let rounded = value.round();
    if !rounded.is_finite() || rounded < 1.0 || rounded > f64::from(u32::MAX) {
        return Err(SceneError::MalformedProjectDocument(format!(
            "{what} must be a positive size, got {value}"
        )));
    }
    Ok(rounded as u32)
}

fn dimension(what: &str, value: &Number) -> SceneResult<u32> {
    let value = value.as_f64().ok_or_else(|| {
        SceneError::MalformedProjectDocument(format!("{what} is not a number"))
    })?;
    dimension_f64(what, value)
}

fn parse_view_box(view_box: &str) -> SceneResult<(u32, u32)> {
    let parts: Vec<f64> = view_box
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .map_err(|_| SceneError::MalformedProjectDocument(format!("bad viewBox {view_box:?}")))?;
    match parts.as_slice() {
        [_, _, w, h] => Ok((dimension_f64("viewBox width", *w)?, dimension_f64("viewBox height", *h)?)),
        _ => Err(SceneError::MalformedProjectDocument(format!(
            "viewBox needs 4 numbers, got {view_box:?}"
        ))),
    }
}

impl Scene {
    /// Serialize to a project document.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> SceneResult<String> {
        ProjectDocument::from_scene(self).to_json()
    }

    /// Load from a project document, logging (not returning) dropped
    /// elements. Use [`ProjectDocument::into_scene`] to inspect them.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::MalformedProjectDocument`] for unusable input.
    pub fn from_json(json: &str) -> SceneResult<Self> {
        ProjectDocument::from_json(json)?.into_scene().map(|(scene, _)| scene)
    }
}
