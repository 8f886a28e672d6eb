//! Editing session: the live scene, its interaction state and change
//! subscribers.
//!
//! The scene sits behind an [`Arc`]. Mutations go through
//! [`Arc::make_mut`], so a snapshot taken for an export keeps seeing the
//! scene as it was when the export started.

use std::sync::Arc;

use crate::coords::SurfaceLayout;
use crate::{
    Asset, AssetId, Background, Element, ElementId, ElementPatch, InteractionController,
    LayerMove, LoadReport, PointerSample, ProjectDocument, Scene, SceneResult,
};

/// Handle returned by [`Editor::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&Scene)>;

/// A single-user editing session.
pub struct Editor {
    scene: Arc<Scene>,
    controller: InteractionController,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("scene", &self.scene)
            .field("controller", &self.controller)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(Scene::default())
    }
}

impl Editor {
    /// Start a session on `scene`.
    #[must_use]
    pub fn new(scene: Scene) -> Self {
        Self {
            scene: Arc::new(scene),
            controller: InteractionController::new(),
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// The current scene.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// A stable copy of the current scene for rendering or export.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Scene> {
        Arc::clone(&self.scene)
    }

    /// The interaction controller.
    #[must_use]
    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    /// The selected element, if any.
    #[must_use]
    pub fn selected(&self) -> Option<&ElementId> {
        self.controller.selected()
    }

    /// Register a callback run after every committed mutation.
    pub fn subscribe(&mut self, callback: impl FnMut(&Scene) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a callback. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Run a mutation against the scene, notifying subscribers if it
    /// committed anything.
    ///
    /// # Errors
    ///
    /// Propagates the mutation's error; the scene is unchanged in that case.
    pub fn mutate<T>(&mut self, f: impl FnOnce(&mut Scene) -> SceneResult<T>) -> SceneResult<T> {
        let before = self.scene.revision();
        let result = f(Arc::make_mut(&mut self.scene));
        if self.scene.revision() != before {
            self.controller.reconcile(&self.scene);
            self.notify();
        }
        result
    }

    fn notify(&mut self) {
        tracing::trace!(
            "Notifying {} subscriber(s) at revision {}",
            self.subscribers.len(),
            self.scene.revision()
        );
        let scene = Arc::clone(&self.scene);
        for (_, callback) in &mut self.subscribers {
            callback(&scene);
        }
    }

    // ------------------------------------------------------------------
    // Scene edits
    // ------------------------------------------------------------------

    /// Add a default-styled text element at the canvas center and select it.
    ///
    /// # Errors
    ///
    /// See [`Scene::add_text`].
    pub fn add_text(&mut self, content: impl Into<String>) -> SceneResult<ElementId> {
        let id = self.mutate(|scene| scene.add_text(content))?;
        self.controller.select(&self.scene, &id)?;
        Ok(id)
    }

    /// Place an asset at the canvas center and select it.
    ///
    /// # Errors
    ///
    /// See [`Scene::add_image`].
    pub fn add_image(&mut self, asset_id: &AssetId) -> SceneResult<ElementId> {
        let id = self.mutate(|scene| scene.add_image(asset_id))?;
        self.controller.select(&self.scene, &id)?;
        Ok(id)
    }

    /// Add an asset to the table.
    ///
    /// # Errors
    ///
    /// See [`Scene::add_asset`].
    pub fn add_asset(&mut self, asset: Asset) -> SceneResult<AssetId> {
        self.mutate(|scene| scene.add_asset(asset))
    }

    /// Remove an asset and cascade to its elements, dropping the selection
    /// if it was one of them.
    ///
    /// # Errors
    ///
    /// See [`Scene::remove_asset`].
    pub fn remove_asset(&mut self, id: &AssetId) -> SceneResult<Vec<Element>> {
        self.mutate(|scene| scene.remove_asset(id))
    }

    /// Patch an element.
    ///
    /// # Errors
    ///
    /// See [`Scene::update_element`].
    pub fn update_element(&mut self, id: &ElementId, patch: &ElementPatch) -> SceneResult<()> {
        self.mutate(|scene| scene.update_element(id, patch))
    }

    /// Remove an element.
    ///
    /// # Errors
    ///
    /// See [`Scene::remove_element`].
    pub fn remove_element(&mut self, id: &ElementId) -> SceneResult<Element> {
        self.mutate(|scene| scene.remove_element(id))
    }

    /// Remove the selected element, if any.
    ///
    /// # Errors
    ///
    /// See [`Scene::remove_element`].
    pub fn delete_selected(&mut self) -> SceneResult<Option<Element>> {
        let Some(id) = self.controller.selected().cloned() else {
            return Ok(None);
        };
        self.controller.clear_selection();
        self.remove_element(&id).map(Some)
    }

    /// Reorder an element. Returns `true` if the order changed.
    pub fn reorder(&mut self, id: &ElementId, op: LayerMove) -> bool {
        self.mutate(|scene| Ok(scene.reorder(id, op))).unwrap_or(false)
    }

    /// Set the background image.
    ///
    /// # Errors
    ///
    /// See [`Scene::set_background`].
    pub fn set_background(&mut self, background: Background) -> SceneResult<()> {
        self.mutate(|scene| scene.set_background(background))
    }

    /// Remove the background.
    pub fn clear_background(&mut self) {
        // clear_background cannot fail
        let _ = self.mutate(|scene| {
            scene.clear_background();
            Ok(())
        });
    }

    // ------------------------------------------------------------------
    // Pointer input
    // ------------------------------------------------------------------

    /// Select an element programmatically.
    ///
    /// # Errors
    ///
    /// See [`InteractionController::select`].
    pub fn select(&mut self, id: &ElementId) -> SceneResult<()> {
        self.controller.select(&self.scene, id)
    }

    /// Pointer pressed on an element.
    ///
    /// # Errors
    ///
    /// See [`InteractionController::pointer_down_on_element`].
    pub fn pointer_down_on_element(
        &mut self,
        id: &ElementId,
        sample: &PointerSample,
        layout: &dyn SurfaceLayout,
    ) -> SceneResult<()> {
        self.controller
            .pointer_down_on_element(&self.scene, id, sample, layout)
    }

    /// Pointer pressed on empty canvas.
    pub fn pointer_down_on_canvas(&mut self) {
        self.controller.pointer_down_on_canvas();
    }

    /// Pointer moved; drags the selected element when a drag is active.
    ///
    /// # Errors
    ///
    /// See [`InteractionController::pointer_move`].
    pub fn pointer_move(
        &mut self,
        sample: &PointerSample,
        layout: &dyn SurfaceLayout,
    ) -> SceneResult<bool> {
        if !self.controller.is_dragging() {
            return Ok(false);
        }
        let before = self.scene.revision();
        let changed =
            self.controller
                .pointer_move(Arc::make_mut(&mut self.scene), sample, layout)?;
        if self.scene.revision() != before {
            self.notify();
        }
        Ok(changed)
    }

    /// Pointer released.
    pub fn pointer_up(&mut self) {
        self.controller.pointer_up();
    }

    /// Pointer left the surface.
    pub fn pointer_leave(&mut self) {
        self.controller.pointer_leave();
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Replace the scene wholesale and reset interaction state.
    pub fn replace_scene(&mut self, scene: Scene) {
        self.scene = Arc::new(scene);
        self.controller = InteractionController::new();
        self.notify();
    }

    /// Load a project document, replacing the current scene.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SceneError::MalformedProjectDocument`] for unusable
    /// input; the session is left untouched.
    pub fn load_json(&mut self, json: &str) -> SceneResult<LoadReport> {
        let (scene, report) = ProjectDocument::from_json(json)?.into_scene()?;
        tracing::info!(
            "Loaded project {:?} ({} element(s))",
            scene.name(),
            scene.element_count()
        );
        self.replace_scene(scene);
        Ok(report)
    }

    /// Serialize the current scene.
    ///
    /// # Errors
    ///
    /// See [`Scene::to_json`].
    pub fn save_json(&self) -> SceneResult<String> {
        self.scene.to_json()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::coords::StaticLayout;
    use crate::{InteractionState, SceneError};

    fn counting_editor() -> (Editor, Rc<RefCell<Vec<u64>>>) {
        let mut editor = Editor::new(Scene::new(800, 450).unwrap());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        editor.subscribe(move |scene| sink.borrow_mut().push(scene.revision()));
        (editor, seen)
    }

    #[test]
    fn test_notifies_on_commit_only() {
        let (mut editor, seen) = counting_editor();
        let id = editor.add_text("HELLO").unwrap();
        assert_eq!(seen.borrow().len(), 1);

        let bad = ElementPatch {
            scale: Some(0.0),
            ..ElementPatch::default()
        };
        assert!(editor.update_element(&id, &bad).is_err());
        assert!(!editor.reorder(&id, LayerMove::ToFront));
        assert_eq!(seen.borrow().len(), 1);

        editor.add_text("second").unwrap();
        assert!(editor.reorder(&id, LayerMove::ToFront));
        assert_eq!(seen.borrow().len(), 3);
    }

    #[test]
    fn test_unsubscribe() {
        let (mut editor, seen) = counting_editor();
        let extra = editor.subscribe(|_| {});
        assert!(editor.unsubscribe(extra));
        assert!(!editor.unsubscribe(extra));
        editor.add_text("a").unwrap();
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_snapshot_is_stable() {
        let mut editor = Editor::default();
        let id = editor.add_text("a").unwrap();
        let snapshot = editor.snapshot();
        editor
            .update_element(&id, &ElementPatch::position(1.0, 2.0))
            .unwrap();
        let before = snapshot.element(&id).unwrap();
        assert!((before.x - 960.0).abs() < f32::EPSILON);
        assert!((editor.scene().element(&id).unwrap().x - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_drag_through_editor_notifies() {
        let (mut editor, seen) = counting_editor();
        let id = editor.add_text("a").unwrap();
        let layout = StaticLayout::new(1.0, 0.0, 0.0);
        let grab = PointerSample::primary(400.0, 225.0);
        editor.pointer_down_on_element(&id, &grab, &layout).unwrap();
        assert!(editor.controller().is_dragging());
        assert!(editor
            .pointer_move(&PointerSample::primary(410.0, 230.0), &layout)
            .unwrap());
        editor.pointer_up();
        let el = editor.scene().element(&id).unwrap();
        assert!((el.x - 410.0).abs() < f32::EPSILON);
        assert!((el.y - 230.0).abs() < f32::EPSILON);
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(editor.controller().state(), &InteractionState::Selected(id));
    }

    #[test]
    fn test_remove_asset_clears_dependent_selection() {
        let mut editor = Editor::default();
        let asset = editor
            .add_asset(Asset::image("a.png", "data:image/png;base64,AAAA", 10.0, 10.0))
            .unwrap();
        editor.add_image(&asset).unwrap();
        assert!(editor.selected().is_some());
        let removed = editor.remove_asset(&asset).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(editor.controller().state(), &InteractionState::Idle);
    }

    #[test]
    fn test_failed_load_keeps_session() {
        let mut editor = Editor::default();
        let id = editor.add_text("keep me").unwrap();
        assert!(matches!(
            editor.load_json("{ nope"),
            Err(SceneError::MalformedProjectDocument(_))
        ));
        assert!(editor.scene().element(&id).is_some());
        assert_eq!(editor.selected(), Some(&id));

        let json = editor.save_json().unwrap();
        let report = editor.load_json(&json).unwrap();
        assert!(report.is_clean());
        assert_eq!(editor.selected(), None);
        assert!(editor.scene().element(&id).is_some());
    }

    #[test]
    fn test_delete_selected() {
        let mut editor = Editor::default();
        let id = editor.add_text("bye").unwrap();
        let removed = editor.delete_selected().unwrap().unwrap();
        assert_eq!(removed.id, id);
        assert!(editor.scene().is_empty());
        assert!(editor.delete_selected().unwrap().is_none());
    }
}
