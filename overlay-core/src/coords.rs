//! Viewport to scene coordinate mapping.
//!
//! The on-screen surface shows the scene scaled uniformly by `zoom` with its
//! top-left corner at the surface rectangle's origin. Layout can change
//! between frames (panels open and close), so the mapping reads the live
//! rectangle through [`SurfaceLayout`] on every call instead of caching it.

use serde::{Deserialize, Serialize};

use crate::{PointerSample, SceneError, SceneResult};

/// A point in scene space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenePoint {
    /// X in scene units.
    pub x: f32,
    /// Y in scene units.
    pub y: f32,
}

impl ScenePoint {
    /// Create a point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Bounding rectangle of the rendered scene surface, in viewport pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceRect {
    /// Left edge.
    pub left: f32,
    /// Top edge.
    pub top: f32,
    /// Rendered width.
    pub width: f32,
    /// Rendered height.
    pub height: f32,
}

/// Source of the current presentation transform.
///
/// Hosts implement this over their layout system; both values are read at
/// call time.
pub trait SurfaceLayout {
    /// Uniform zoom factor of the rendered surface.
    fn zoom(&self) -> f32;

    /// The surface's current bounding rectangle.
    fn surface_rect(&self) -> SurfaceRect;
}

/// A fixed layout, for tests and headless hosts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticLayout {
    /// Zoom factor.
    pub zoom: f32,
    /// Surface rectangle.
    pub rect: SurfaceRect,
}

impl StaticLayout {
    /// Layout with the surface at `(left, top)` and the given zoom.
    #[must_use]
    pub fn new(zoom: f32, left: f32, top: f32) -> Self {
        Self {
            zoom,
            rect: SurfaceRect {
                left,
                top,
                width: 0.0,
                height: 0.0,
            },
        }
    }
}

impl SurfaceLayout for StaticLayout {
    fn zoom(&self) -> f32 {
        self.zoom
    }

    fn surface_rect(&self) -> SurfaceRect {
        self.rect
    }
}

fn checked_zoom(layout: &dyn SurfaceLayout) -> SceneResult<f32> {
    let zoom = layout.zoom();
    if zoom.is_finite() && zoom > 0.0 {
        Ok(zoom)
    } else {
        Err(SceneError::InvalidGeometry(format!(
            "zoom must be > 0, got {zoom}"
        )))
    }
}

/// Map a viewport position to scene space.
///
/// # Errors
///
/// Returns [`SceneError::InvalidGeometry`] if the layout's zoom is not
/// positive.
pub fn viewport_to_scene(
    client_x: f32,
    client_y: f32,
    layout: &dyn SurfaceLayout,
) -> SceneResult<ScenePoint> {
    let zoom = checked_zoom(layout)?;
    let rect = layout.surface_rect();
    Ok(ScenePoint::new(
        (client_x - rect.left) / zoom,
        (client_y - rect.top) / zoom,
    ))
}

/// Map a normalized pointer sample to scene space.
///
/// # Errors
///
/// See [`viewport_to_scene`].
pub fn pointer_to_scene(
    sample: &PointerSample,
    layout: &dyn SurfaceLayout,
) -> SceneResult<ScenePoint> {
    viewport_to_scene(sample.client_x, sample.client_y, layout)
}

/// Map a scene point back to viewport pixels.
///
/// # Errors
///
/// See [`viewport_to_scene`].
pub fn scene_to_viewport(
    point: ScenePoint,
    layout: &dyn SurfaceLayout,
) -> SceneResult<(f32, f32)> {
    let zoom = checked_zoom(layout)?;
    let rect = layout.surface_rect();
    Ok((point.x * zoom + rect.left, point.y * zoom + rect.top))
}
