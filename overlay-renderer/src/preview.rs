//! Preview rendering: a scene flattened into drawable nodes.
//!
//! The preview tree is the single walk over the scene. The vector exporter
//! writes it out as SVG and the raster exporter paints it, so all three
//! outputs share placement, paint order and icon preparation. Only the
//! preview carries a selection outline.

use overlay_core::{AssetContent, Color, ElementId, ElementKind, Scene, TextContent};
use serde::Serialize;

use crate::error::{RenderError, RenderResult};
use crate::icon::{prepare_icon, IconStyle};
use crate::placement::{Placement, FALLBACK_BACKGROUND};
use crate::vector;

/// What fills the canvas before any element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum BackgroundNode {
    /// An image stretched to the canvas.
    Image {
        /// Data URI or path.
        src: String,
    },
    /// A solid fill.
    Fill {
        /// Fill color.
        color: Color,
    },
}

/// Text stroke drawn beneath the fill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeStyle {
    /// Stroke color.
    pub color: Color,
    /// Stroke width in local units.
    pub width: f32,
}

/// Drawable content of a node, centered on its local origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum NodeContent {
    /// A single line of text.
    #[serde(rename_all = "camelCase")]
    Text {
        /// Text to draw.
        content: String,
        /// Requested family.
        font_family: String,
        /// Weight and style keywords.
        font_weight_or_style: String,
        /// Size in pixels.
        font_size_px: f32,
        /// Fill paint.
        fill: Color,
        /// Stroke, when the width is positive.
        stroke: Option<StrokeStyle>,
    },
    /// A referenced image.
    Image {
        /// Data URI or path.
        src: String,
        /// Box width.
        width: f32,
        /// Box height.
        height: f32,
    },
    /// An inline, already recolored vector icon.
    Icon {
        /// Root `<svg>` element sized to the box.
        markup: String,
        /// Box width.
        width: f32,
        /// Box height.
        height: f32,
    },
}

/// One element ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewNode {
    /// Source element.
    pub id: ElementId,
    /// Local-to-scene placement.
    pub placement: Placement,
    /// Group opacity.
    pub opacity: f32,
    /// Content.
    pub content: NodeContent,
}

/// Non-printing outline around the selected element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionOutline {
    /// Selected element.
    pub id: ElementId,
    /// The element's placement.
    pub placement: Placement,
    /// Unscaled box width.
    pub width: f32,
    /// Unscaled box height.
    pub height: f32,
}

/// A `@font-face` the document needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FontFace {
    /// Family name.
    pub family: String,
    /// Font file source.
    pub src: String,
}

/// A flattened, ordered scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewTree {
    /// Canvas width.
    pub width: u32,
    /// Canvas height.
    pub height: u32,
    /// Background.
    pub background: BackgroundNode,
    /// Custom fonts used by text nodes.
    pub font_faces: Vec<FontFace>,
    /// Nodes bottom to top.
    pub nodes: Vec<PreviewNode>,
    /// Selection outline, preview only.
    pub selection: Option<SelectionOutline>,
}

impl PreviewTree {
    /// SVG markup for a host view, including the selection outline.
    #[must_use]
    pub fn to_svg(&self) -> String {
        vector::write_tree(self, true)
    }
}

/// Build the preview tree with the default fallback background.
///
/// # Errors
///
/// See [`build`].
pub fn render(scene: &Scene, selection: Option<&ElementId>) -> RenderResult<PreviewTree> {
    build(scene, selection, FALLBACK_BACKGROUND)
}

/// Build the preview tree.
///
/// A selection that does not name an element is ignored.
///
/// # Errors
///
/// Returns [`RenderError::AssetUnavailable`] if an image element's asset is
/// missing, or [`RenderError::ExportDecodeFailure`] if a vector icon's
/// markup is unusable.
pub fn build(scene: &Scene, selection: Option<&ElementId>, fallback: Color) -> RenderResult<PreviewTree> {
    let background = scene.background().map_or(BackgroundNode::Fill { color: fallback }, |bg| {
        BackgroundNode::Image { src: bg.src.clone() }
    });

    let mut nodes = Vec::with_capacity(scene.element_count());
    let mut font_faces: Vec<FontFace> = Vec::new();

    for element in scene.elements() {
        let content = match &element.kind {
            ElementKind::Text(text) => {
                if let Some(face) = custom_face(scene, text) {
                    if !font_faces.contains(&face) {
                        font_faces.push(face);
                    }
                }
                text_content(text)
            }
            ElementKind::Image(image) => {
                let asset = scene
                    .asset(&image.asset_id)
                    .ok_or_else(|| RenderError::AssetUnavailable(image.asset_id.to_string()))?;
                match &asset.content {
                    AssetContent::Image { src, .. } => NodeContent::Image {
                        src: src.clone(),
                        width: image.intrinsic_width,
                        height: image.intrinsic_height,
                    },
                    AssetContent::VectorIcon { markup, .. } => {
                        let style = IconStyle {
                            fill: image.fill_override,
                            stroke: image.stroke_override,
                            width: image.intrinsic_width,
                            height: image.intrinsic_height,
                        };
                        NodeContent::Icon {
                            markup: prepare_icon(markup, &style)?,
                            width: image.intrinsic_width,
                            height: image.intrinsic_height,
                        }
                    }
                    AssetContent::Font { .. } => {
                        return Err(RenderError::AssetUnavailable(format!(
                            "{} is a font, not an image",
                            image.asset_id
                        )));
                    }
                }
            }
        };
        nodes.push(PreviewNode {
            id: element.id.clone(),
            placement: Placement::of(element),
            opacity: element.opacity,
            content,
        });
    }

    let selection = selection.and_then(|id| scene.element(id)).map(|element| {
        let (width, height) = element.local_size();
        SelectionOutline {
            id: element.id.clone(),
            placement: Placement::of(element),
            width,
            height,
        }
    });

    Ok(PreviewTree {
        width: scene.canvas_width(),
        height: scene.canvas_height(),
        background,
        font_faces,
        nodes,
        selection,
    })
}

fn text_content(text: &TextContent) -> NodeContent {
    NodeContent::Text {
        content: text.content.clone(),
        font_family: text.font_family.clone(),
        font_weight_or_style: text.font_weight_or_style.clone(),
        font_size_px: text.font_size_px,
        fill: text.fill_color,
        stroke: text.has_stroke().then_some(StrokeStyle {
            color: text.stroke_color,
            width: text.stroke_width_px,
        }),
    }
}

fn custom_face(scene: &Scene, text: &TextContent) -> Option<FontFace> {
    scene.assets().iter().find_map(|asset| match &asset.content {
        AssetContent::Font {
            family,
            src: Some(src),
        } if family.eq_ignore_ascii_case(text.font_family.trim()) => Some(FontFace {
            family: family.clone(),
            src: src.clone(),
        }),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_core::{Asset, ElementPatch, IconPaint};

    #[test]
    fn test_nodes_follow_sequence_order() {
        let mut scene = Scene::new(800, 450).unwrap();
        let a = scene.add_text("A").unwrap();
        let b = scene.add_text("B").unwrap();
        scene.send_to_back(&b);
        let tree = render(&scene, None).unwrap();
        let ids: Vec<_> = tree.nodes.iter().map(|n| n.id.clone()).collect();
        assert_eq!(ids, vec![b, a]);
        assert_eq!(tree.background, BackgroundNode::Fill { color: FALLBACK_BACKGROUND });
    }

    #[test]
    fn test_selection_outline_uses_local_box() {
        let mut scene = Scene::new(800, 450).unwrap();
        let asset = scene
            .add_asset(Asset::image("a.png", "data:image/png;base64,AAAA", 64.0, 32.0))
            .unwrap();
        let id = scene.add_image(&asset).unwrap();
        scene
            .update_element(
                &id,
                &ElementPatch {
                    scale: Some(2.0),
                    ..ElementPatch::default()
                },
            )
            .unwrap();

        let tree = render(&scene, Some(&id)).unwrap();
        let outline = tree.selection.expect("outline");
        assert_eq!((outline.width, outline.height), (64.0, 32.0));
        assert!((outline.placement.scale - 2.0).abs() < f32::EPSILON);

        let ghost = ElementId::from_string("ghost");
        assert!(render(&scene, Some(&ghost)).unwrap().selection.is_none());
    }

    #[test]
    fn test_icon_is_recolored_once_for_both_exporters() {
        let mut scene = Scene::new(100, 100).unwrap();
        let asset = scene
            .add_asset(Asset::vector_icon(
                "dot.svg",
                r##"<svg width="10" height="10" fill="#000"><circle cx="5" cy="5" r="5"/></svg>"##,
                10.0,
                10.0,
            ))
            .unwrap();
        let id = scene.add_image(&asset).unwrap();
        scene
            .update_element(
                &id,
                &ElementPatch {
                    fill_override: Some(IconPaint::Override(Color::rgb(255, 0, 0))),
                    ..ElementPatch::default()
                },
            )
            .unwrap();
        let tree = render(&scene, None).unwrap();
        match &tree.nodes[0].content {
            NodeContent::Icon { markup, .. } => {
                assert!(markup.contains("fill=\"#ff0000\""));
                assert!(!markup.contains("#000\""));
            }
            other => panic!("expected icon, got {other:?}"),
        }
    }

    #[test]
    fn test_font_faces_only_for_used_custom_fonts() {
        let mut scene = Scene::new(100, 100).unwrap();
        scene
            .add_asset(Asset::font("a.ttf", "Used", Some("data:font/ttf;base64,AAAA".into())))
            .unwrap();
        scene
            .add_asset(Asset::font("b.ttf", "Unused", Some("data:font/ttf;base64,AAAA".into())))
            .unwrap();
        let id = scene.add_text("x").unwrap();
        scene
            .update_element(
                &id,
                &ElementPatch {
                    font_family: Some("Used".into()),
                    ..ElementPatch::default()
                },
            )
            .unwrap();
        scene.add_text("y").unwrap();
        let tree = render(&scene, None).unwrap();
        assert_eq!(tree.font_faces.len(), 1);
        assert_eq!(tree.font_faces[0].family, "Used");
    }

    #[test]
    fn test_tree_serializes_for_hosts() {
        let mut scene = Scene::new(100, 100).unwrap();
        scene.add_text("x").unwrap();
        let value = serde_json::to_value(render(&scene, None).unwrap()).unwrap();
        assert_eq!(value["nodes"][0]["content"]["type"], "text");
        assert_eq!(value["background"]["color"], "#111111");
    }
}
