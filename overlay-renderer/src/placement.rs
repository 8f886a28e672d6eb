//! Placement math shared by the preview, raster and vector paths.
//!
//! An element is drawn in its local frame with the content centered on the
//! origin, then placed with `translate(x, y) · rotate(deg) · scale(s)`.

use overlay_core::{Color, Element};
use serde::Serialize;

/// Vertical shift from the em-box middle to the alphabetic baseline, in em.
///
/// Written as `dy=".35em"` in SVG and applied to glyph outlines in raster
/// output, so both put the same baseline under the anchor.
pub const BASELINE_SHIFT_EM: f32 = 0.35;

/// Fill used when the scene has no background.
pub const FALLBACK_BACKGROUND: Color = Color::rgb(0x11, 0x11, 0x11);

/// Translate, rotate and scale of one element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    /// Anchor X.
    pub x: f32,
    /// Anchor Y.
    pub y: f32,
    /// Clockwise rotation in degrees.
    pub rotation_degrees: f32,
    /// Uniform scale.
    pub scale: f32,
}

impl Placement {
    /// Placement of an element.
    #[must_use]
    pub fn of(element: &Element) -> Self {
        Self {
            x: element.x,
            y: element.y,
            rotation_degrees: element.rotation_degrees,
            scale: element.scale,
        }
    }

    /// The local-to-scene transform for tiny-skia.
    #[must_use]
    pub fn to_transform(&self) -> tiny_skia::Transform {
        tiny_skia::Transform::from_translate(self.x, self.y)
            .pre_concat(tiny_skia::Transform::from_rotate(self.rotation_degrees))
            .pre_scale(self.scale, self.scale)
    }

    /// The same transform as an SVG `transform` attribute value.
    #[must_use]
    pub fn to_svg_transform(&self) -> String {
        format!(
            "translate({}, {}) rotate({}) scale({})",
            self.x, self.y, self.rotation_degrees, self.scale
        )
    }

    /// Map a local point into scene space.
    #[must_use]
    pub fn map_local(&self, lx: f32, ly: f32) -> (f32, f32) {
        let (sin, cos) = self.rotation_degrees.to_radians().sin_cos();
        let sx = lx * self.scale;
        let sy = ly * self.scale;
        (self.x + sx * cos - sy * sin, self.y + sx * sin + sy * cos)
    }
}

/// Top-left corner of a `width × height` box centered on the local origin.
#[must_use]
pub fn centered_origin(width: f32, height: f32) -> (f32, f32) {
    (-width / 2.0, -height / 2.0)
}

/// Baseline Y in the local frame for a given font size.
#[must_use]
pub fn baseline_offset(font_size_px: f32) -> f32 {
    font_size_px * BASELINE_SHIFT_EM
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(rotation: f32, scale: f32) -> Placement {
        Placement {
            x: 100.0,
            y: 50.0,
            rotation_degrees: rotation,
            scale,
        }
    }

    #[test]
    fn test_svg_transform_format() {
        assert_eq!(
            placement(0.0, 1.0).to_svg_transform(),
            "translate(100, 50) rotate(0) scale(1)"
        );
        assert_eq!(
            placement(45.0, 0.5).to_svg_transform(),
            "translate(100, 50) rotate(45) scale(0.5)"
        );
    }

    #[test]
    fn test_skia_transform_matches_map_local() {
        for (rotation, scale) in [(0.0, 1.0), (90.0, 2.0), (30.0, 0.75), (270.0, 3.0)] {
            let p = placement(rotation, scale);
            let ts = p.to_transform();
            let mut pt = [tiny_skia::Point::from_xy(10.0, -4.0)];
            ts.map_points(&mut pt);
            let (x, y) = p.map_local(10.0, -4.0);
            assert!((pt[0].x - x).abs() < 1e-3, "rotation {rotation}");
            assert!((pt[0].y - y).abs() < 1e-3, "rotation {rotation}");
        }
    }

    #[test]
    fn test_rotation_is_clockwise_on_screen() {
        // +x rotated 90 degrees points down (+y) in y-down space
        let (x, y) = placement(90.0, 1.0).map_local(10.0, 0.0);
        assert!((x - 100.0).abs() < 1e-3);
        assert!((y - 60.0).abs() < 1e-3);
    }

    #[test]
    fn test_centered_origin() {
        assert_eq!(centered_origin(64.0, 32.0), (-32.0, -16.0));
        assert!((baseline_offset(100.0) - 35.0).abs() < 1e-4);
    }
}
