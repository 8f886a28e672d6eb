//! Editing Session Integration Tests
//!
//! Drives a scene the way a host application does:
//! - Loading a project saved by the browser editor
//! - Select / drag with zoom and a moving surface
//! - Layer order and asset removal
//! - Save and reload

use overlay_core::coords::viewport_to_scene;
use overlay_core::{
    Editor, ElementId, ElementKind, IconPaint, InputEvent, InteractionState, LayerMove,
    PointerSample, ProjectDocument, SceneError, StaticLayout, TouchEvent, TouchPhase, TouchPoint,
};

/// A document as written by the browser editor's JSON export.
const LEGACY_PROJECT: &str = r##"{
  "name": "Nuovo Progetto",
  "background": { "src": "data:image/png;base64,AAAA", "width": 800, "height": 450 },
  "assets": [
    { "id": "a1", "name": "logo.png", "src": "data:image/png;base64,AAAA", "type": "icon", "width": 120, "height": 80 },
    { "id": "f1", "name": "Brand.ttf", "family": "CustomFont_x1", "type": "font" }
  ],
  "elements": [
    { "id": "logo", "type": "icon", "assetId": "a1", "src": "data:image/png;base64,AAAA",
      "width": 120, "height": 80, "x": 100, "y": 100, "scale": 1, "rotation": 0, "zIndex": 1 },
    { "id": "title", "type": "text", "content": "HELLO", "x": 400, "y": 225, "scale": 1,
      "rotation": -90, "zIndex": 0, "fontSize": 48, "color": "#ffffff",
      "fontFamily": "CustomFont_x1", "fontWeight": "bold", "strokeWidth": 2, "strokeColor": "#000000" },
    { "id": "ghost", "type": "icon", "assetId": "deleted", "width": 10, "height": 10, "zIndex": 2 }
  ],
  "canvasWidth": 800,
  "canvasHeight": 450
}"##;

fn touch(phase: TouchPhase, x: f32, y: f32) -> InputEvent {
    InputEvent::Touch(TouchEvent::new(
        phase,
        vec![TouchPoint {
            id: 0,
            client_x: x,
            client_y: y,
        }],
    ))
}

fn id(s: &str) -> ElementId {
    ElementId::from_string(s)
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_legacy_project_loads() {
    let mut editor = Editor::default();
    let report = editor.load_json(LEGACY_PROJECT).unwrap();
    let scene = editor.scene();

    assert_eq!(scene.name(), "Nuovo Progetto");
    assert_eq!(scene.canvas_size(), (800, 450));
    assert_eq!(report.dropped_elements, vec![id("ghost")]);

    let order: Vec<_> = scene.elements().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(order, vec!["title", "logo"]);

    let title = scene.element(&id("title")).unwrap();
    assert!((title.rotation_degrees - 270.0).abs() < 1e-4);
    match &title.kind {
        ElementKind::Text(text) => {
            assert_eq!(text.font_family, "CustomFont_x1");
            assert!(text.has_stroke());
        }
        ElementKind::Image(_) => panic!("expected text"),
    }

    let logo = scene.element(&id("logo")).unwrap();
    match &logo.kind {
        ElementKind::Image(image) => assert_eq!(image.fill_override, IconPaint::InheritOriginal),
        ElementKind::Text(_) => panic!("expected image"),
    }
    assert!(scene.custom_font_families().any(|f| f == "CustomFont_x1"));
}

#[test]
fn test_malformed_project_rejected() {
    let broken = LEGACY_PROJECT.replace("\"fontSize\": 48", "\"fontSize\": 0");
    assert!(matches!(
        ProjectDocument::from_json(&broken).and_then(ProjectDocument::into_scene),
        Err(SceneError::MalformedProjectDocument(_))
    ));
}

// ============================================================================
// Pointer Workflow
// ============================================================================

#[test]
fn test_touch_drag_at_preview_zoom() {
    let mut editor = Editor::default();
    editor.load_json(LEGACY_PROJECT).unwrap();
    let logo = id("logo");
    // Preview at 0.4 zoom, surface offset by the side panel
    let layout = StaticLayout::new(0.4, 320.0, 64.0);

    let start = viewport_to_scene(360.0, 104.0, &layout).unwrap();
    assert!((start.x - 100.0).abs() < 1e-3 && (start.y - 100.0).abs() < 1e-3);

    let down = PointerSample::from_event(&touch(TouchPhase::Start, 362.0, 104.0)).unwrap();
    editor.pointer_down_on_element(&logo, &down, &layout).unwrap();
    editor.pointer_down_on_element(&logo, &down, &layout).unwrap();
    assert!(editor.controller().is_dragging());

    let moved = PointerSample::from_event(&touch(TouchPhase::Move, 402.0, 84.0)).unwrap();
    assert!(editor.pointer_move(&moved, &layout).unwrap());
    editor.pointer_leave();

    let el = editor.scene().element(&logo).unwrap();
    assert!((el.x - 200.0).abs() < f32::EPSILON);
    assert!((el.y - 50.0).abs() < f32::EPSILON);
    assert_eq!(editor.controller().state(), &InteractionState::Selected(logo));
}

#[test]
fn test_canvas_press_then_move_changes_nothing() {
    let mut editor = Editor::default();
    editor.load_json(LEGACY_PROJECT).unwrap();
    let before = editor.snapshot();
    let layout = StaticLayout::new(1.0, 0.0, 0.0);

    editor.pointer_down_on_canvas();
    assert!(!editor
        .pointer_move(&PointerSample::primary(10.0, 10.0), &layout)
        .unwrap());
    assert_eq!(editor.scene(), before.as_ref());
}

// ============================================================================
// Layers and Assets
// ============================================================================

#[test]
fn test_reorder_then_save_and_reload() {
    let mut editor = Editor::default();
    editor.load_json(LEGACY_PROJECT).unwrap();
    assert!(editor.reorder(&id("title"), LayerMove::ToFront));

    let json = editor.save_json().unwrap();
    let mut reloaded = Editor::default();
    let report = reloaded.load_json(&json).unwrap();
    assert!(report.is_clean());
    let order: Vec<_> = reloaded
        .scene()
        .elements()
        .iter()
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(order, vec!["logo", "title"]);
    assert_eq!(reloaded.scene().canvas_size(), (800, 450));
}

#[test]
fn test_removing_asset_cascades_to_selection() {
    let mut editor = Editor::default();
    editor.load_json(LEGACY_PROJECT).unwrap();
    editor.select(&id("logo")).unwrap();

    let removed = editor
        .remove_asset(&overlay_core::AssetId::from_string("a1"))
        .unwrap();
    assert_eq!(removed.len(), 1);
    assert!(editor.scene().element(&id("logo")).is_none());
    assert_eq!(editor.selected(), None);
}
