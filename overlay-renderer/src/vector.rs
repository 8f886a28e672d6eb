//! SVG output for a [`PreviewTree`].
//!
//! Each node becomes a `<g>` carrying `translate(x, y) rotate(r) scale(s)`,
//! with content centered on the group origin. Text is anchored with
//! `text-anchor="middle"` and `dy=".35em"`, matching the raster baseline.

use std::fmt::Write;

use overlay_core::{Color, Scene};

use crate::error::RenderResult;
use crate::fonts::FontVariant;
use crate::placement::{centered_origin, BASELINE_SHIFT_EM};
use crate::preview::{self, BackgroundNode, NodeContent, PreviewNode, PreviewTree, SelectionOutline};

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
const SELECTION_COLOR: &str = "#3b82f6";

/// Export a scene as a standalone SVG document.
///
/// # Errors
///
/// Returns an error if the scene references a missing asset or an icon
/// cannot be prepared.
pub fn export_svg(scene: &Scene, fallback: Color) -> RenderResult<String> {
    let tree = preview::build(scene, None, fallback)?;
    Ok(write_tree(&tree, false))
}

/// Serialize a tree. `preview` output skips the XML prolog and includes
/// the selection outline; export output is the reverse.
#[must_use]
pub fn write_tree(tree: &PreviewTree, preview: bool) -> String {
    let mut svg = String::with_capacity(1024 + tree.nodes.len() * 256);
    if !preview {
        svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n");
    }
    let _ = write!(
        svg,
        "<svg width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" xmlns=\"{SVG_NS}\" xmlns:xlink=\"{XLINK_NS}\">",
        w = tree.width,
        h = tree.height,
    );

    if !tree.font_faces.is_empty() {
        svg.push_str("\n<defs><style>");
        for face in &tree.font_faces {
            let _ = write!(
                svg,
                "@font-face {{ font-family: \"{}\"; src: url(\"{}\"); }}",
                escape_xml(&face.family),
                escape_xml(&face.src),
            );
        }
        svg.push_str("</style></defs>");
    }

    match &tree.background {
        BackgroundNode::Image { src } => {
            let _ = write!(
                svg,
                "\n<image href=\"{}\" x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"none\"/>",
                escape_xml(src),
                tree.width,
                tree.height,
            );
        }
        BackgroundNode::Fill { color } => {
            let _ = write!(svg, "\n<rect width=\"100%\" height=\"100%\"");
            write_paint(&mut svg, "fill", *color);
            svg.push_str("/>");
        }
    }

    for node in &tree.nodes {
        write_node(&mut svg, node);
    }

    if preview {
        if let Some(outline) = &tree.selection {
            write_outline(&mut svg, outline);
        }
    }

    svg.push_str("\n</svg>");
    svg
}

fn write_node(svg: &mut String, node: &PreviewNode) {
    let _ = write!(svg, "\n<g transform=\"{}\"", node.placement.to_svg_transform());
    if node.opacity < 1.0 {
        let _ = write!(svg, " opacity=\"{}\"", node.opacity);
    }
    svg.push('>');

    match &node.content {
        NodeContent::Text {
            content,
            font_family,
            font_weight_or_style,
            font_size_px,
            fill,
            stroke,
        } => {
            let variant = FontVariant::parse(font_weight_or_style);
            let _ = write!(
                svg,
                "<text x=\"0\" y=\"0\" dy=\"{BASELINE_SHIFT_EM}em\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{font_size_px}\" font-weight=\"{}\"",
                escape_xml(font_family),
                variant.weight,
            );
            if variant.italic {
                svg.push_str(" font-style=\"italic\"");
            }
            write_paint(svg, "fill", *fill);
            if let Some(stroke) = stroke {
                write_paint(svg, "stroke", stroke.color);
                let _ = write!(svg, " stroke-width=\"{}\" paint-order=\"stroke\"", stroke.width);
            }
            let _ = write!(svg, ">{}</text>", escape_xml(content));
        }
        NodeContent::Image { src, width, height } => {
            let (ox, oy) = centered_origin(*width, *height);
            let _ = write!(
                svg,
                "<g transform=\"translate({ox}, {oy})\"><image href=\"{}\" x=\"0\" y=\"0\" width=\"{width}\" height=\"{height}\" preserveAspectRatio=\"none\"/></g>",
                escape_xml(src),
            );
        }
        NodeContent::Icon { markup, width, height } => {
            let (ox, oy) = centered_origin(*width, *height);
            let _ = write!(svg, "<g transform=\"translate({ox}, {oy})\">{markup}</g>");
        }
    }

    svg.push_str("</g>");
}

fn write_outline(svg: &mut String, outline: &SelectionOutline) {
    let (ox, oy) = centered_origin(outline.width, outline.height);
    let _ = write!(
        svg,
        "\n<g transform=\"{}\" data-selection=\"{}\"><rect x=\"{ox}\" y=\"{oy}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"{SELECTION_COLOR}\" stroke-width=\"2\" stroke-dasharray=\"6 4\" vector-effect=\"non-scaling-stroke\"/></g>",
        outline.placement.to_svg_transform(),
        escape_xml(outline.id.as_str()),
        outline.width,
        outline.height,
    );
}

/// `name="#rrggbb"`, plus `name-opacity` when the color is translucent.
fn write_paint(svg: &mut String, name: &str, color: Color) {
    let _ = write!(svg, " {name}=\"{}\"", color.to_hex_rgb());
    if color.a < u8::MAX {
        let _ = write!(svg, " {name}-opacity=\"{}\"", color.alpha_f32());
    }
}

/// Escape text for XML content and attribute values.
pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
