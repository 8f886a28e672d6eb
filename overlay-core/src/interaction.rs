//! Select and drag state machine.
//!
//! ```text
//!  Idle ──down(id)──▶ Selected(id) ──down(id)──▶ Dragging(id, offset)
//!   ▲                     ▲   │                        │   │
//!   │                     │   └─down(other)─▶ Selected(other)
//!   │                     └──────────── up / leave ────┘   │
//!   └──── down(empty canvas) / selected element deleted ───┘
//! ```
//!
//! The grab offset is computed once when the drag starts, so the element
//! keeps its position relative to the pointer instead of snapping its
//! center under it.

use crate::coords::{pointer_to_scene, ScenePoint, SurfaceLayout};
use crate::{Element, ElementId, PointerSample, Scene, SceneError, SceneResult};

/// Current interaction state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    /// Nothing selected.
    #[default]
    Idle,
    /// One element selected, not moving.
    Selected(ElementId),
    /// The selected element follows the pointer.
    Dragging {
        /// Element being dragged.
        id: ElementId,
        /// Pointer position minus element anchor at drag start.
        grab_offset: ScenePoint,
    },
}

/// Drives selection and dragging. Holds no scene data of its own.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    state: InteractionState,
}

impl InteractionController {
    /// Create a controller in the idle state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// The selected element, whether or not it is being dragged.
    #[must_use]
    pub fn selected(&self) -> Option<&ElementId> {
        match &self.state {
            InteractionState::Idle => None,
            InteractionState::Selected(id) | InteractionState::Dragging { id, .. } => Some(id),
        }
    }

    /// Whether a drag is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, InteractionState::Dragging { .. })
    }

    /// Select an element without starting a drag (e.g. right after adding it).
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::ElementNotFound`] if the element is missing.
    pub fn select(&mut self, scene: &Scene, id: &ElementId) -> SceneResult<()> {
        if scene.element(id).is_none() {
            return Err(SceneError::ElementNotFound(id.to_string()));
        }
        self.state = InteractionState::Selected(id.clone());
        Ok(())
    }

    /// Clear the selection, ending any drag.
    pub fn clear_selection(&mut self) {
        self.state = InteractionState::Idle;
    }

    /// Pointer pressed on an element.
    ///
    /// Selects an unselected element; pressing the selected element starts a
    /// drag. A press during another element's drag ends that drag first.
    /// Non-primary pointers are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::ElementNotFound`] if the element is missing, or
    /// [`SceneError::InvalidGeometry`] for a non-positive zoom. The state is
    /// unchanged on error.
    pub fn pointer_down_on_element(
        &mut self,
        scene: &Scene,
        id: &ElementId,
        sample: &PointerSample,
        layout: &dyn SurfaceLayout,
    ) -> SceneResult<()> {
        if !sample.is_primary {
            return Ok(());
        }
        let element = scene
            .element(id)
            .ok_or_else(|| SceneError::ElementNotFound(id.to_string()))?;
        let point = pointer_to_scene(sample, layout)?;

        // A press always lands on a settled state; any drag ends here.
        self.end_drag();

        self.state = match &self.state {
            InteractionState::Selected(current) if current == id => {
                let grab_offset = ScenePoint::new(point.x - element.x, point.y - element.y);
                tracing::debug!("Drag start: {} offset {:?}", id, grab_offset);
                InteractionState::Dragging {
                    id: id.clone(),
                    grab_offset,
                }
            }
            _ => {
                tracing::debug!("Selected: {}", id);
                InteractionState::Selected(id.clone())
            }
        };
        Ok(())
    }

    /// Pointer pressed on empty canvas: clears the selection.
    pub fn pointer_down_on_canvas(&mut self) {
        if self.state != InteractionState::Idle {
            tracing::debug!("Selection cleared");
        }
        self.state = InteractionState::Idle;
    }

    /// Pointer moved. While dragging, moves the element so that it keeps its
    /// grab offset, rounding to whole scene units.
    ///
    /// Returns `true` if the scene changed. Moves without an active drag are
    /// no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidGeometry`] for a non-positive zoom.
    pub fn pointer_move(
        &mut self,
        scene: &mut Scene,
        sample: &PointerSample,
        layout: &dyn SurfaceLayout,
    ) -> SceneResult<bool> {
        let InteractionState::Dragging { id, grab_offset } = &self.state else {
            return Ok(false);
        };
        if !sample.is_primary {
            return Ok(false);
        }
        let Some(element) = scene.element(id) else {
            tracing::debug!("Dragged element {} vanished, going idle", id);
            self.state = InteractionState::Idle;
            return Ok(false);
        };

        let point = pointer_to_scene(sample, layout)?;
        let x = (point.x - grab_offset.x).round();
        let y = (point.y - grab_offset.y).round();
        if (element.x - x).abs() < f32::EPSILON && (element.y - y).abs() < f32::EPSILON {
            return Ok(false);
        }
        scene.set_position(id, x, y)?;
        Ok(true)
    }

    /// Pointer released: ends the drag, keeping the selection.
    pub fn pointer_up(&mut self) {
        self.end_drag();
    }

    /// Pointer left the surface: same as release.
    pub fn pointer_leave(&mut self) {
        self.end_drag();
    }

    /// Delete the selected element from the scene and go idle.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::ElementNotFound`] if the selection refers to an
    /// element that is no longer in the scene (the controller still goes
    /// idle).
    pub fn delete_selected(&mut self, scene: &mut Scene) -> SceneResult<Option<Element>> {
        let Some(id) = self.selected().cloned() else {
            return Ok(None);
        };
        self.state = InteractionState::Idle;
        scene.remove_element(&id).map(Some)
    }

    /// Notify the controller that an element was removed from the scene.
    pub fn element_removed(&mut self, id: &ElementId) {
        if self.selected() == Some(id) {
            tracing::debug!("Selected element {} removed, going idle", id);
            self.state = InteractionState::Idle;
        }
    }

    /// Drop the selection if its element is no longer in `scene`.
    pub fn reconcile(&mut self, scene: &Scene) {
        if let Some(id) = self.selected() {
            if scene.element(id).is_none() {
                let id = id.clone();
                self.element_removed(&id);
            }
        }
    }

    fn end_drag(&mut self) {
        if let InteractionState::Dragging { id, .. } = &self.state {
            tracing::debug!("Drag end: {}", id);
            self.state = InteractionState::Selected(id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::StaticLayout;
    use crate::ElementPatch;

    fn scene_with_two() -> (Scene, ElementId, ElementId) {
        let mut scene = Scene::new(800, 600).unwrap();
        let a = scene.add_text("A").unwrap();
        let b = scene.add_text("B").unwrap();
        scene.set_position(&a, 100.0, 100.0).unwrap();
        scene.set_position(&b, 300.0, 300.0).unwrap();
        (scene, a, b)
    }

    #[test]
    fn test_select_then_drag_then_release() {
        let (mut scene, a, _) = scene_with_two();
        let layout = StaticLayout::new(1.0, 0.0, 0.0);
        let mut ctl = InteractionController::new();

        let p0 = PointerSample::primary(110.0, 95.0);
        ctl.pointer_down_on_element(&scene, &a, &p0, &layout).unwrap();
        assert_eq!(ctl.state(), &InteractionState::Selected(a.clone()));

        ctl.pointer_down_on_element(&scene, &a, &p0, &layout).unwrap();
        assert!(ctl.is_dragging());

        let p1 = PointerSample::primary(150.0, 175.0);
        assert!(ctl.pointer_move(&mut scene, &p1, &layout).unwrap());
        let el = scene.element(&a).unwrap();
        assert_eq!((el.x, el.y), (140.0, 180.0));

        ctl.pointer_up();
        assert_eq!(ctl.state(), &InteractionState::Selected(a));
    }

    #[test]
    fn test_drag_offset_invariance_with_zoom() {
        let (mut scene, a, _) = scene_with_two();
        let layout = StaticLayout::new(0.5, 20.0, 10.0);
        let mut ctl = InteractionController::new();
        ctl.select(&scene, &a).unwrap();

        // viewport (80, 60) is scene (120, 100)
        let p0 = PointerSample::primary(80.0, 60.0);
        ctl.pointer_down_on_element(&scene, &a, &p0, &layout).unwrap();
        // viewport (101, 40) is scene (162, 60)
        let p1 = PointerSample::primary(101.0, 40.0);
        ctl.pointer_move(&mut scene, &p1, &layout).unwrap();

        let el = scene.element(&a).unwrap();
        assert_eq!((el.x, el.y), (100.0 + 42.0, 100.0 - 40.0));
    }

    #[test]
    fn test_move_rounds_to_integer_units() {
        let (mut scene, a, _) = scene_with_two();
        let layout = StaticLayout::new(3.0, 0.0, 0.0);
        let mut ctl = InteractionController::new();
        ctl.select(&scene, &a).unwrap();
        ctl.pointer_down_on_element(&scene, &a, &PointerSample::primary(300.0, 300.0), &layout)
            .unwrap();
        ctl.pointer_move(&mut scene, &PointerSample::primary(302.0, 301.0), &layout)
            .unwrap();
        let el = scene.element(&a).unwrap();
        assert_eq!((el.x, el.y), (101.0, 100.0));
    }

    #[test]
    fn test_move_without_drag_is_noop() {
        let (mut scene, a, _) = scene_with_two();
        let layout = StaticLayout::new(1.0, 0.0, 0.0);
        let mut ctl = InteractionController::new();
        let before = scene.clone();
        assert!(!ctl
            .pointer_move(&mut scene, &PointerSample::primary(5.0, 5.0), &layout)
            .unwrap());
        ctl.select(&scene, &a).unwrap();
        assert!(!ctl
            .pointer_move(&mut scene, &PointerSample::primary(5.0, 5.0), &layout)
            .unwrap());
        assert_eq!(scene, before);
    }

    #[test]
    fn test_canvas_press_clears_from_any_state() {
        let (scene, a, _) = scene_with_two();
        let layout = StaticLayout::new(1.0, 0.0, 0.0);
        let mut ctl = InteractionController::new();
        ctl.select(&scene, &a).unwrap();
        ctl.pointer_down_on_element(&scene, &a, &PointerSample::primary(100.0, 100.0), &layout)
            .unwrap();
        assert!(ctl.is_dragging());
        ctl.pointer_down_on_canvas();
        assert_eq!(ctl.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_press_on_other_element_ends_drag_first() {
        let (mut scene, a, b) = scene_with_two();
        let layout = StaticLayout::new(1.0, 0.0, 0.0);
        let mut ctl = InteractionController::new();
        ctl.select(&scene, &a).unwrap();
        ctl.pointer_down_on_element(&scene, &a, &PointerSample::primary(100.0, 100.0), &layout)
            .unwrap();

        ctl.pointer_down_on_element(&scene, &b, &PointerSample::primary(300.0, 300.0), &layout)
            .unwrap();
        assert_eq!(ctl.state(), &InteractionState::Selected(b.clone()));

        // Further moves touch nobody until b is pressed again
        assert!(!ctl
            .pointer_move(&mut scene, &PointerSample::primary(0.0, 0.0), &layout)
            .unwrap());
        assert_eq!(scene.element(&a).unwrap().x, 100.0);
        assert_eq!(scene.element(&b).unwrap().x, 300.0);
    }

    #[test]
    fn test_delete_selected_goes_idle() {
        let mut scene = Scene::new(800, 450).unwrap();
        let only = scene.add_text("HELLO").unwrap();
        let mut ctl = InteractionController::new();
        ctl.select(&scene, &only).unwrap();

        let removed = ctl.delete_selected(&mut scene).unwrap();
        assert_eq!(removed.map(|e| e.id), Some(only));
        assert_eq!(ctl.state(), &InteractionState::Idle);
        assert!(scene.is_empty());
        assert!(ctl.delete_selected(&mut scene).unwrap().is_none());
    }

    #[test]
    fn test_reconcile_after_external_removal() {
        let (mut scene, a, _) = scene_with_two();
        let mut ctl = InteractionController::new();
        ctl.select(&scene, &a).unwrap();
        scene.remove_element(&a).unwrap();
        ctl.reconcile(&scene);
        assert_eq!(ctl.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_non_primary_pointer_ignored() {
        let (scene, a, _) = scene_with_two();
        let layout = StaticLayout::new(1.0, 0.0, 0.0);
        let mut ctl = InteractionController::new();
        let secondary = PointerSample {
            client_x: 1.0,
            client_y: 1.0,
            is_primary: false,
        };
        ctl.pointer_down_on_element(&scene, &a, &secondary, &layout)
            .unwrap();
        assert_eq!(ctl.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_failed_move_keeps_scene() {
        let (mut scene, a, _) = scene_with_two();
        let mut ctl = InteractionController::new();
        let ok = StaticLayout::new(1.0, 0.0, 0.0);
        ctl.select(&scene, &a).unwrap();
        ctl.pointer_down_on_element(&scene, &a, &PointerSample::primary(100.0, 100.0), &ok)
            .unwrap();
        let before = scene.clone();
        let broken = StaticLayout::new(0.0, 0.0, 0.0);
        assert!(ctl
            .pointer_move(&mut scene, &PointerSample::primary(1.0, 1.0), &broken)
            .is_err());
        assert_eq!(scene, before);
        // rotation patches while dragging do not disturb the gesture
        scene
            .update_element(
                &a,
                &ElementPatch {
                    rotation_degrees: Some(30.0),
                    ..ElementPatch::default()
                },
            )
            .unwrap();
        assert!(ctl
            .pointer_move(&mut scene, &PointerSample::primary(110.0, 100.0), &ok)
            .unwrap());
        assert_eq!(scene.element(&a).unwrap().x, 110.0);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_drag_keeps_grab_offset(
                zoom in 0.25_f32..4.0,
                left in -200.0_f32..200.0,
                top in -200.0_f32..200.0,
                press in (0.0_f32..1000.0, 0.0_f32..1000.0),
                release in (0.0_f32..1000.0, 0.0_f32..1000.0),
            ) {
                let (mut scene, a, _) = scene_with_two();
                let layout = StaticLayout::new(zoom, left, top);
                let mut ctl = InteractionController::new();
                ctl.select(&scene, &a).unwrap();

                let p0 = PointerSample::primary(press.0, press.1);
                ctl.pointer_down_on_element(&scene, &a, &p0, &layout).unwrap();
                prop_assert!(ctl.is_dragging());
                let p1 = PointerSample::primary(release.0, release.1);
                ctl.pointer_move(&mut scene, &p1, &layout).unwrap();

                // moved by the pointer delta in scene units, rounded
                let expected_x = 100.0 + (release.0 - press.0) / zoom;
                let expected_y = 100.0 + (release.1 - press.1) / zoom;
                let el = scene.element(&a).unwrap();
                prop_assert!((el.x - expected_x).abs() <= 0.5 + 1e-2, "x: {} vs {}", el.x, expected_x);
                prop_assert!((el.y - expected_y).abs() <= 0.5 + 1e-2, "y: {} vs {}", el.y, expected_y);
                prop_assert_eq!(el.x, el.x.round());
                prop_assert_eq!(el.y, el.y.round());
            }
        }
    }
}
