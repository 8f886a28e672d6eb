//! Scene elements - the placed, transformable text and image layers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::{AssetId, Color, SceneError, SceneResult};

/// Average glyph advance used for text box estimates, in em.
const ESTIMATED_ADVANCE_EM: f32 = 0.6;

/// Line box height used for text box estimates, in em.
const ESTIMATED_LINE_EM: f32 = 1.2;

/// Unique identifier for an element.
///
/// Stored as a string so project documents written by other tools keep
/// their ids when loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Create a new unique element ID.
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

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Paint applied to a vector icon's fill or stroke.
///
/// `InheritOriginal` keeps whatever colors the icon was authored with.
/// Serialized as `null` (inherit) or a color string; the legacy `"original"`
/// sentinel also reads as inherit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IconPaint {
    /// Leave the icon's authored paint untouched.
    #[default]
    InheritOriginal,
    /// Substitute this color on the icon's root.
    Override(Color),
}

impl IconPaint {
    /// The override color, if any.
    #[must_use]
    pub fn color(self) -> Option<Color> {
        match self {
            Self::InheritOriginal => None,
            Self::Override(color) => Some(color),
        }
    }
}

impl Serialize for IconPaint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::InheritOriginal => serializer.serialize_none(),
            Self::Override(color) => serializer.serialize_some(color),
        }
    }
}

impl<'de> Deserialize<'de> for IconPaint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(Self::InheritOriginal),
            Some(s) if s.trim().eq_ignore_ascii_case("original") => Ok(Self::InheritOriginal),
            Some(s) => Color::parse(&s)
                .map(Self::Override)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Content and style of a text element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    /// Text to draw (may be empty).
    #[serde(default)]
    pub content: String,
    /// Font family name or CSS generic family.
    #[serde(default = "TextContent::default_family")]
    pub font_family: String,
    /// CSS-like weight and/or style, e.g. `bold`, `italic`, `300`.
    #[serde(rename = "fontWeight", default = "TextContent::default_weight")]
    pub font_weight_or_style: String,
    /// Font size in pixels.
    #[serde(rename = "fontSize", default = "TextContent::default_size")]
    pub font_size_px: f32,
    /// Fill color.
    #[serde(rename = "color", default = "TextContent::default_fill")]
    pub fill_color: Color,
    /// Stroke color.
    #[serde(default = "TextContent::default_stroke")]
    pub stroke_color: Color,
    /// Stroke width in pixels; 0 disables the stroke pass.
    #[serde(rename = "strokeWidth", default)]
    pub stroke_width_px: f32,
}

impl TextContent {
    /// Text with the default style (48 px white sans-serif, no stroke).
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            font_family: Self::default_family(),
            font_weight_or_style: Self::default_weight(),
            font_size_px: Self::default_size(),
            fill_color: Self::default_fill(),
            stroke_color: Self::default_stroke(),
            stroke_width_px: 0.0,
        }
    }

    /// Whether a stroke pass is drawn beneath the fill.
    #[must_use]
    pub fn has_stroke(&self) -> bool {
        self.stroke_width_px > 0.0
    }

    fn default_family() -> String {
        "sans-serif".to_string()
    }

    fn default_weight() -> String {
        "normal".to_string()
    }

    const fn default_size() -> f32 {
        48.0
    }

    const fn default_fill() -> Color {
        Color::WHITE
    }

    const fn default_stroke() -> Color {
        Color::BLACK
    }
}

/// Content of an image element: a reference into the asset table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageContent {
    /// Referenced asset.
    pub asset_id: AssetId,
    /// Natural width, the pre-scale box width. Zero when a document omits
    /// it; loading fills it from the asset.
    #[serde(rename = "width", default)]
    pub intrinsic_width: f32,
    /// Natural height, the pre-scale box height. Zero when omitted.
    #[serde(rename = "height", default)]
    pub intrinsic_height: f32,
    /// Fill recoloring for vector icons.
    #[serde(default, rename = "fill")]
    pub fill_override: IconPaint,
    /// Stroke recoloring for vector icons.
    #[serde(default, rename = "stroke")]
    pub stroke_override: IconPaint,
}

/// The type of content an element contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    /// A styled text run.
    Text(TextContent),
    /// A raster image or vector icon from the asset table.
    #[serde(alias = "icon")]
    Image(ImageContent),
}

impl ElementKind {
    /// Short name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
        }
    }
}

/// A placed element with its transform and content.
///
/// `(x, y)` is the element center; rotation and scale pivot there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Unique identifier; generated when a document omits it.
    #[serde(default)]
    pub id: ElementId,
    /// Anchor X in scene space.
    #[serde(default)]
    pub x: f32,
    /// Anchor Y in scene space.
    #[serde(default)]
    pub y: f32,
    /// Clockwise rotation in degrees, kept in `[0, 360)`.
    #[serde(rename = "rotation", default)]
    pub rotation_degrees: f32,
    /// Uniform scale factor, always positive.
    #[serde(default = "Element::default_scale")]
    pub scale: f32,
    /// Opacity in `0.0..=1.0`.
    #[serde(default = "Element::default_opacity")]
    pub opacity: f32,
    /// Cached stacking rank, equal to the element's sequence position.
    #[serde(rename = "zIndex", default)]
    pub rank: usize,
    /// Element content.
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl Element {
    /// Create a new element with the given kind at the origin.
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        Self {
            id: ElementId::new(),
            x: 0.0,
            y: 0.0,
            rotation_degrees: 0.0,
            scale: Self::default_scale(),
            opacity: Self::default_opacity(),
            rank: 0,
            kind,
        }
    }

    /// Create a text element.
    #[must_use]
    pub fn text(content: TextContent) -> Self {
        Self::new(ElementKind::Text(content))
    }

    /// Create an image element referencing `asset_id` at its natural size.
    #[must_use]
    pub fn image(asset_id: AssetId, intrinsic_width: f32, intrinsic_height: f32) -> Self {
        Self::new(ElementKind::Image(ImageContent {
            asset_id,
            intrinsic_width,
            intrinsic_height,
            fill_override: IconPaint::InheritOriginal,
            stroke_override: IconPaint::InheritOriginal,
        }))
    }

    /// Set the anchor position.
    #[must_use]
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Set the rotation in degrees.
    #[must_use]
    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation_degrees = normalize_degrees(degrees);
        self
    }

    /// Set the uniform scale.
    #[must_use]
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Set the opacity.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// The referenced asset, for image elements.
    #[must_use]
    pub fn asset_id(&self) -> Option<&AssetId> {
        match &self.kind {
            ElementKind::Image(image) => Some(&image.asset_id),
            ElementKind::Text(_) => None,
        }
    }

    /// Check every geometric and style invariant of this element.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidGeometry`] for non-finite positions,
    /// non-positive scale, size or font size, negative stroke width or
    /// opacity outside `0..=1`.
    pub fn validate(&self) -> SceneResult<()> {
        if !(self.x.is_finite() && self.y.is_finite() && self.rotation_degrees.is_finite()) {
            return Err(geometry(&self.id, "position and rotation must be finite"));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(geometry(&self.id, &format!("scale must be > 0, got {}", self.scale)));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(geometry(
                &self.id,
                &format!("opacity must be within 0..=1, got {}", self.opacity),
            ));
        }
        match &self.kind {
            ElementKind::Text(text) => {
                if !(text.font_size_px.is_finite() && text.font_size_px > 0.0) {
                    return Err(geometry(
                        &self.id,
                        &format!("font size must be > 0, got {}", text.font_size_px),
                    ));
                }
                if !(text.stroke_width_px.is_finite() && text.stroke_width_px >= 0.0) {
                    return Err(geometry(
                        &self.id,
                        &format!("stroke width must be >= 0, got {}", text.stroke_width_px),
                    ));
                }
            }
            ElementKind::Image(image) => {
                let ok = |v: f32| v.is_finite() && v > 0.0;
                if !(ok(image.intrinsic_width) && ok(image.intrinsic_height)) {
                    return Err(geometry(
                        &self.id,
                        &format!(
                            "intrinsic size must be > 0, got {}x{}",
                            image.intrinsic_width, image.intrinsic_height
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Unscaled size of the element's box, centered on the anchor.
    ///
    /// Text has no font metrics at this level, so its box is estimated from
    /// the character count and font size.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn local_size(&self) -> (f32, f32) {
        match &self.kind {
            ElementKind::Text(text) => {
                let chars = text.content.chars().count().max(1) as f32;
                (
                    chars * text.font_size_px * ESTIMATED_ADVANCE_EM,
                    text.font_size_px * ESTIMATED_LINE_EM,
                )
            }
            ElementKind::Image(image) => (image.intrinsic_width, image.intrinsic_height),
        }
    }

    /// Check if a scene-space point falls within this element's rotated,
    /// scaled box.
    #[must_use]
    pub fn contains_point(&self, px: f32, py: f32) -> bool {
        let (lx, ly) = self.to_local(px, py);
        let (w, h) = self.local_size();
        lx.abs() <= w / 2.0 && ly.abs() <= h / 2.0
    }

    /// Map a scene-space point into the element's local, unscaled frame.
    #[must_use]
    pub fn to_local(&self, px: f32, py: f32) -> (f32, f32) {
        let dx = px - self.x;
        let dy = py - self.y;
        let (sin, cos) = self.rotation_degrees.to_radians().sin_cos();
        let rx = dx * cos + dy * sin;
        let ry = -dx * sin + dy * cos;
        (rx / self.scale, ry / self.scale)
    }

    const fn default_scale() -> f32 {
        1.0
    }

    const fn default_opacity() -> f32 {
        1.0
    }
}

/// Wrap an angle into `[0, 360)`.
#[must_use]
pub fn normalize_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

fn geometry(id: &ElementId, detail: &str) -> SceneError {
    SceneError::InvalidGeometry(format!("element {id}: {detail}"))
}

/// A partial update to an element. `None` fields are left unchanged.
///
/// Text fields on an image element (or icon fields on a text element) are
/// rejected rather than ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    /// New anchor X.
    pub x: Option<f32>,
    /// New anchor Y.
    pub y: Option<f32>,
    /// New rotation in degrees (wrapped into `[0, 360)`).
    pub rotation_degrees: Option<f32>,
    /// New uniform scale.
    pub scale: Option<f32>,
    /// New opacity.
    pub opacity: Option<f32>,
    /// New text content.
    pub content: Option<String>,
    /// New font family.
    pub font_family: Option<String>,
    /// New weight/style.
    pub font_weight_or_style: Option<String>,
    /// New font size.
    pub font_size_px: Option<f32>,
    /// New text fill.
    pub fill_color: Option<Color>,
    /// New text stroke color.
    pub stroke_color: Option<Color>,
    /// New text stroke width.
    pub stroke_width_px: Option<f32>,
    /// New icon fill paint.
    pub fill_override: Option<IconPaint>,
    /// New icon stroke paint.
    pub stroke_override: Option<IconPaint>,
}

impl ElementPatch {
    /// Patch that only moves the element.
    #[must_use]
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Apply the patch to a copy of `element`, returning the updated,
    /// validated record.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidStyle`] if a field does not apply to the
    /// element's kind, or [`SceneError::InvalidGeometry`] if the result
    /// violates an element invariant.
    pub fn apply_to(&self, element: &Element) -> SceneResult<Element> {
        let mut next = element.clone();
        if let Some(x) = self.x {
            next.x = x;
        }
        if let Some(y) = self.y {
            next.y = y;
        }
        if let Some(rotation) = self.rotation_degrees {
            next.rotation_degrees = normalize_degrees(rotation);
        }
        if let Some(scale) = self.scale {
            next.scale = scale;
        }
        if let Some(opacity) = self.opacity {
            next.opacity = opacity;
        }

        match &mut next.kind {
            ElementKind::Text(text) => {
                if self.fill_override.is_some() || self.stroke_override.is_some() {
                    return Err(SceneError::InvalidStyle(format!(
                        "element {}: icon paint does not apply to text",
                        element.id
                    )));
                }
                if let Some(content) = &self.content {
                    text.content.clone_from(content);
                }
                if let Some(family) = &self.font_family {
                    text.font_family.clone_from(family);
                }
                if let Some(weight) = &self.font_weight_or_style {
                    text.font_weight_or_style.clone_from(weight);
                }
                if let Some(size) = self.font_size_px {
                    text.font_size_px = size;
                }
                if let Some(fill) = self.fill_color {
                    text.fill_color = fill;
                }
                if let Some(stroke) = self.stroke_color {
                    text.stroke_color = stroke;
                }
                if let Some(width) = self.stroke_width_px {
                    text.stroke_width_px = width;
                }
            }
            ElementKind::Image(image) => {
                let touches_text = self.content.is_some()
                    || self.font_family.is_some()
                    || self.font_weight_or_style.is_some()
                    || self.font_size_px.is_some()
                    || self.fill_color.is_some()
                    || self.stroke_color.is_some()
                    || self.stroke_width_px.is_some();
                if touches_text {
                    return Err(SceneError::InvalidStyle(format!(
                        "element {}: text style does not apply to images",
                        element.id
                    )));
                }
                if let Some(fill) = self.fill_override {
                    image.fill_override = fill;
                }
                if let Some(stroke) = self.stroke_override {
                    image.stroke_override = stroke;
                }
            }
        }

        next.validate()?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_wraps() {
        assert!((normalize_degrees(370.0) - 10.0).abs() < 1e-4);
        assert!((normalize_degrees(-90.0) - 270.0).abs() < 1e-4);
        assert!(normalize_degrees(360.0).abs() < 1e-4);
        let el = Element::text(TextContent::new("a")).with_rotation(725.0);
        assert!((el.rotation_degrees - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_validate_rejects_bad_scale_and_opacity() {
        let el = Element::text(TextContent::new("a")).with_scale(0.0);
        assert!(matches!(el.validate(), Err(SceneError::InvalidGeometry(_))));

        let el = Element::text(TextContent::new("a")).with_scale(-1.0);
        assert!(el.validate().is_err());

        let el = Element::text(TextContent::new("a")).with_opacity(1.5);
        assert!(el.validate().is_err());

        let el = Element::image(AssetId::from_string("a"), 0.0, 10.0);
        assert!(el.validate().is_err());

        assert!(Element::text(TextContent::new(""))
            .with_scale(1000.0)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_patch_keeps_original_on_error() {
        let el = Element::text(TextContent::new("hello"));
        let patch = ElementPatch {
            scale: Some(-2.0),
            content: Some("changed".to_string()),
            ..ElementPatch::default()
        };
        assert!(patch.apply_to(&el).is_err());
        if let ElementKind::Text(text) = &el.kind {
            assert_eq!(text.content, "hello");
        }
    }

    #[test]
    fn test_patch_rejects_mismatched_kind() {
        let image = Element::image(AssetId::from_string("a"), 10.0, 10.0);
        let patch = ElementPatch {
            content: Some("nope".to_string()),
            ..ElementPatch::default()
        };
        assert!(matches!(
            patch.apply_to(&image),
            Err(SceneError::InvalidStyle(_))
        ));

        let text = Element::text(TextContent::new("a"));
        let patch = ElementPatch {
            fill_override: Some(IconPaint::Override(Color::WHITE)),
            ..ElementPatch::default()
        };
        assert!(patch.apply_to(&text).is_err());
    }

    #[test]
    fn test_contains_point_pivots_on_center() {
        // 20x10 box at (100, 100) rotated 90 degrees becomes 10 wide, 20 tall
        let el = Element::image(AssetId::from_string("a"), 20.0, 10.0)
            .with_position(100.0, 100.0)
            .with_rotation(90.0);
        assert!(el.contains_point(100.0, 109.0));
        assert!(!el.contains_point(109.0, 100.0));

        let scaled = Element::image(AssetId::from_string("a"), 20.0, 10.0)
            .with_position(100.0, 100.0)
            .with_scale(2.0);
        assert!(scaled.contains_point(119.0, 100.0));
        assert!(!scaled.contains_point(121.0, 100.0));
    }

    #[test]
    fn test_icon_paint_serde() {
        let paint: IconPaint = serde_json::from_str("\"original\"").unwrap();
        assert_eq!(paint, IconPaint::InheritOriginal);
        let paint: IconPaint = serde_json::from_str("null").unwrap();
        assert_eq!(paint, IconPaint::InheritOriginal);
        let paint: IconPaint = serde_json::from_str("\"#ff0000\"").unwrap();
        assert_eq!(paint, IconPaint::Override(Color::rgb(255, 0, 0)));
        assert_eq!(serde_json::to_string(&IconPaint::InheritOriginal).unwrap(), "null");
    }

    #[test]
    fn test_element_json_shape() {
        let el = Element::text(TextContent::new("Hi")).with_position(10.0, 20.0);
        let value = serde_json::to_value(&el).unwrap();
        assert_eq!(value["type"], "text");
        assert_eq!(value["fontSize"], 48.0);
        assert_eq!(value["color"], "#ffffff");
        assert_eq!(value["zIndex"], 0);

        let icon: Element = serde_json::from_value(serde_json::json!({
            "id": "abc123xyz",
            "type": "icon",
            "assetId": "asset1",
            "src": "data:image/png;base64,AAAA",
            "width": 64,
            "height": 32,
            "x": 5,
            "y": 6,
            "scale": 1.5,
            "rotation": 45,
            "zIndex": 3
        }))
        .unwrap();
        assert_eq!(icon.id.as_str(), "abc123xyz");
        assert_eq!(icon.rank, 3);
        assert!((icon.opacity - 1.0).abs() < f32::EPSILON);
        match icon.kind {
            ElementKind::Image(image) => {
                assert_eq!(image.asset_id.as_str(), "asset1");
                assert!((image.intrinsic_width - 64.0).abs() < f32::EPSILON);
            }
            ElementKind::Text(_) => panic!("expected image"),
        }
    }
}
