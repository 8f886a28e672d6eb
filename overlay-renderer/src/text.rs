//! Text to vector path, laid out the way the SVG writer asks a viewer to:
//! centered horizontally on the origin, baseline at `+0.35em`.

use ab_glyph::{Font, FontArc, GlyphId, OutlineCurve, Point};
use tiny_skia::{Path, PathBuilder};

use crate::placement::baseline_offset;

/// A laid-out single line of text in the element's local frame.
#[derive(Debug, Clone)]
pub struct TextPath {
    /// Glyph outlines; `None` when nothing is visible (empty or all spaces).
    pub path: Option<Path>,
    /// Total advance width in pixels.
    pub advance: f32,
}

/// Lay out `content` at `size_px`, centered on the local origin.
#[must_use]
pub fn layout_line(font: &FontArc, content: &str, size_px: f32) -> TextPath {
    let units_per_em = font.units_per_em().unwrap_or(1000.0);
    let px_per_unit = size_px / units_per_em;

    // Pen positions in font units, kerning applied between neighbours.
    let mut glyphs: Vec<(GlyphId, f32)> = Vec::with_capacity(content.len());
    let mut pen = 0.0_f32;
    let mut previous: Option<GlyphId> = None;
    for ch in content.chars().filter(|c| !c.is_control()) {
        let id = font.glyph_id(ch);
        if let Some(prev) = previous {
            pen += font.kern_unscaled(prev, id);
        }
        glyphs.push((id, pen));
        pen += font.h_advance_unscaled(id);
        previous = Some(id);
    }

    let advance = pen * px_per_unit;
    let origin_x = -advance / 2.0;
    let baseline = baseline_offset(size_px);

    let map = |p: Point, pen_x: f32| -> (f32, f32) {
        (
            origin_x + (pen_x + p.x) * px_per_unit,
            baseline - p.y * px_per_unit,
        )
    };

    let mut builder = PathBuilder::new();
    for (id, pen_x) in glyphs {
        let Some(outline) = font.outline(id) else {
            continue;
        };
        let mut cursor: Option<Point> = None;
        for curve in &outline.curves {
            let start = match curve {
                OutlineCurve::Line(a, _) | OutlineCurve::Quad(a, _, _) | OutlineCurve::Cubic(a, _, _, _) => *a,
            };
            let continues = cursor.is_some_and(|c| (c.x - start.x).abs() < 1e-3 && (c.y - start.y).abs() < 1e-3);
            if !continues {
                if cursor.is_some() {
                    builder.close();
                }
                let (x, y) = map(start, pen_x);
                builder.move_to(x, y);
            }
            let end = match curve {
                OutlineCurve::Line(_, b) => {
                    let (x, y) = map(*b, pen_x);
                    builder.line_to(x, y);
                    *b
                }
                OutlineCurve::Quad(_, c, b) => {
                    let (cx, cy) = map(*c, pen_x);
                    let (x, y) = map(*b, pen_x);
                    builder.quad_to(cx, cy, x, y);
                    *b
                }
                OutlineCurve::Cubic(_, c1, c2, b) => {
                    let (c1x, c1y) = map(*c1, pen_x);
                    let (c2x, c2y) = map(*c2, pen_x);
                    let (x, y) = map(*b, pen_x);
                    builder.cubic_to(c1x, c1y, c2x, c2y, x, y);
                    *b
                }
            };
            cursor = Some(end);
        }
        if cursor.is_some() {
            builder.close();
        }
    }

    TextPath {
        path: builder.finish(),
        advance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::FontBook;

    const TUFFY: &[u8] = include_bytes!("../tests/fonts/Tuffy.ttf");

    fn tuffy() -> FontArc {
        let mut book = FontBook::empty();
        book.register("Tuffy", "Tuffy.ttf", TUFFY.to_vec()).unwrap();
        book.resolve("Tuffy", "normal").unwrap()
    }

    #[test]
    fn test_line_is_centered() {
        let font = tuffy();
        let line = layout_line(&font, "HELLO", 48.0);
        assert!(line.advance > 0.0);
        let bounds = line.path.expect("visible glyphs").bounds();
        let center = (bounds.left() + bounds.right()) / 2.0;
        assert!(center.abs() < line.advance * 0.1, "center {center}");
        // Cap height sits above the baseline, which is below the anchor
        assert!(bounds.bottom() <= baseline_offset(48.0) + 1.0);
        assert!(bounds.top() < 0.0);
    }

    #[test]
    fn test_blank_text_has_no_path() {
        let font = tuffy();
        assert!(layout_line(&font, "", 48.0).path.is_none());
        let spaces = layout_line(&font, "   ", 48.0);
        assert!(spaces.path.is_none());
        assert!(spaces.advance > 0.0);
    }

    #[test]
    fn test_advance_scales_with_size() {
        let font = tuffy();
        let small = layout_line(&font, "Wide text", 10.0).advance;
        let big = layout_line(&font, "Wide text", 40.0).advance;
        assert!((big / small - 4.0).abs() < 1e-3);
    }
}
