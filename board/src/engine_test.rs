#![allow(clippy::float_cmp)]

use super::*;
use crate::input::{Button, InputState, WheelDelta};

// =============================================================
// Helpers
// =============================================================

const ONE_IMAGE: &str = r#"{
  "gridState": { "scale": 1, "panX": 0, "panY": 0, "gridHeight": 1500 },
  "images": [
    { "id": "img_0", "filename": "img_0_a.png", "originalName": "a.png",
      "description": "shot on film https://example.com/roll-7", "x": 100, "y": 100 }
  ]
}"#;

const TWO_IMAGES: &str = r#"{
  "images": [
    { "id": "img_0", "filename": "img_0_a.png", "x": 0, "y": 400 },
    { "id": "img_1", "filename": "img_1_b.png", "x": 500, "y": 900 }
  ]
}"#;

fn doc(json: &str) -> LayoutDocument {
    LayoutDocument::from_json(json).unwrap()
}

/// One settled 400x200 item at (100, 100) under the identity transform.
fn core_with_item() -> (EngineCore, ItemId) {
    let mut core = EngineCore::new();
    core.set_viewport(1200.0, 800.0, 1.0);
    let requests = core.restore(&doc(ONE_IMAGE));
    let id = requests[0].id.clone();
    core.finalize_geometry(&id, 800.0, 400.0);
    assert!(core.is_settled());
    (core, id)
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn has_settled(actions: &[Action]) -> bool {
    actions.contains(&Action::LayoutSettled)
}

fn drag(core: &mut EngineCore, from: Point, to: Point, up_ms: f64) -> Vec<Action> {
    core.on_pointer_down(from, Button::Primary);
    core.on_pointer_move(to);
    core.on_pointer_up(to, Button::Primary, up_ms)
}

// =============================================================
// Panning and zooming
// =============================================================

#[test]
fn background_drag_pans_by_screen_delta() {
    let (mut core, _) = core_with_item();
    let actions = core.on_pointer_down(pt(50.0, 50.0), Button::Primary);
    assert_eq!(actions, vec![Action::SetCursor { cursor: "grabbing" }]);
    assert!(matches!(core.input, InputState::Panning { .. }));

    core.on_pointer_move(pt(80.0, 70.0));
    core.on_pointer_move(pt(90.0, 75.0));
    assert_eq!((core.transform.pan_x, core.transform.pan_y), (40.0, 25.0));

    let actions = core.on_pointer_up(pt(90.0, 75.0), Button::Primary, 0.0);
    assert_eq!(actions, vec![Action::SetCursor { cursor: "default" }]);
    assert!(core.input.is_idle());
}

#[test]
fn panning_does_not_move_items() {
    let (mut core, id) = core_with_item();
    core.on_pointer_down(pt(50.0, 50.0), Button::Primary);
    core.on_pointer_move(pt(300.0, 300.0));
    core.on_pointer_up(pt(300.0, 300.0), Button::Primary, 0.0);
    let item = core.store.get(&id).unwrap();
    assert_eq!((item.x, item.y), (100.0, 100.0));
}

#[test]
fn wheel_zooms_toward_cursor() {
    let (mut core, _) = core_with_item();
    let cursor = pt(300.0, 200.0);
    let before = core.transform.screen_to_canvas(cursor);

    assert_eq!(core.on_wheel(cursor, WheelDelta { dx: 0.0, dy: -100.0 }), vec![Action::RenderNeeded]);
    assert!((core.transform.scale() - 1.1).abs() < 1e-12);

    let after = core.transform.screen_to_canvas(cursor);
    assert!(before.distance_to(after) < 1e-9);
}

#[test]
fn wheel_down_zooms_out() {
    let (mut core, _) = core_with_item();
    core.on_wheel(pt(0.0, 0.0), WheelDelta { dx: 0.0, dy: 120.0 });
    assert!((core.transform.scale() - 0.9).abs() < 1e-12);
}

#[test]
fn drag_uses_canvas_units_when_zoomed() {
    let (mut core, id) = core_with_item();
    core.transform = CanvasTransform::new(0.0, 0.0, 2.0);
    // Item covers screen (200..1000, 200..600) at 2x.
    drag(&mut core, pt(300.0, 300.0), pt(500.0, 400.0), 0.0);
    let item = core.store.get(&id).unwrap();
    assert_eq!((item.x, item.y), (200.0, 150.0));
}

// =============================================================
// Drag versus click
// =============================================================

#[test]
fn long_drag_moves_item_and_swallows_click() {
    let (mut core, id) = core_with_item();
    let actions = drag(&mut core, pt(150.0, 150.0), pt(250.0, 190.0), 1000.0);
    assert!(actions.contains(&Action::ItemMoved { id: id.clone(), x: 200.0, y: 140.0 }));

    assert!(core.on_click(pt(250.0, 190.0), 1020.0).is_empty());
    assert!(!core.store.get(&id).unwrap().info_visible);
}

#[test]
fn short_drag_counts_as_click() {
    let (mut core, id) = core_with_item();
    drag(&mut core, pt(150.0, 150.0), pt(152.0, 151.0), 1000.0);
    assert_eq!(core.ui.suppressed_click, None);

    let actions = core.on_click(pt(152.0, 151.0), 1001.0);
    assert!(actions.contains(&Action::InfoToggled { id: id.clone(), visible: true }));
    assert!(core.store.get(&id).unwrap().info_visible);
}

#[test]
fn click_after_suppression_window_is_honoured() {
    let (mut core, id) = core_with_item();
    drag(&mut core, pt(150.0, 150.0), pt(250.0, 190.0), 1000.0);
    let actions = core.on_click(pt(250.0, 190.0), 1100.0);
    assert!(actions.contains(&Action::InfoToggled { id, visible: true }));
}

#[test]
fn drag_brings_item_to_front() {
    let mut core = EngineCore::new();
    let requests = core.restore(&doc(TWO_IMAGES));
    for r in &requests {
        core.finalize_geometry(&r.id, 400.0, 400.0);
    }
    let back = core.store.sorted_items()[0].id.clone();
    let (x, y) = {
        let item = core.store.get(&back).unwrap();
        (item.x + 10.0, item.y + 10.0)
    };
    core.on_pointer_down(pt(x, y), Button::Primary);
    assert_eq!(core.store.sorted_items().last().unwrap().id, back);
}

#[test]
fn pointer_down_during_gesture_is_ignored() {
    let (mut core, _) = core_with_item();
    core.on_pointer_down(pt(150.0, 150.0), Button::Primary);
    assert!(core.on_pointer_down(pt(20.0, 20.0), Button::Secondary).is_empty());
    assert!(matches!(core.input, InputState::DraggingItem { .. }));
}

#[test]
fn middle_button_does_nothing() {
    let (mut core, _) = core_with_item();
    assert!(core.on_pointer_down(pt(50.0, 50.0), Button::Middle).is_empty());
    assert!(core.input.is_idle());
}

// =============================================================
// Context menu, overlay, links
// =============================================================

#[test]
fn secondary_button_requests_context_menu() {
    let (mut core, id) = core_with_item();
    let on_item = core.on_pointer_down(pt(150.0, 150.0), Button::Secondary);
    assert_eq!(on_item, vec![Action::ContextMenuRequested { screen: pt(150.0, 150.0), item: Some(id) }]);

    let on_background = core.on_pointer_down(pt(900.0, 700.0), Button::Secondary);
    assert_eq!(on_background, vec![Action::ContextMenuRequested { screen: pt(900.0, 700.0), item: None }]);
    assert!(core.input.is_idle());
}

#[test]
fn pointer_down_on_overlay_starts_nothing() {
    let (mut core, _) = core_with_item();
    core.on_click(pt(150.0, 150.0), 0.0);
    // Overlay band is y in [228, 300].
    assert!(core.on_pointer_down(pt(150.0, 250.0), Button::Primary).is_empty());
    assert!(core.input.is_idle());
}

#[test]
fn click_on_overlay_hides_it() {
    let (mut core, id) = core_with_item();
    core.on_click(pt(150.0, 150.0), 0.0);
    let actions = core.on_click(pt(150.0, 250.0), 10.0);
    assert!(actions.contains(&Action::InfoToggled { id, visible: false }));
}

#[test]
fn click_on_link_row_opens_link() {
    let (mut core, id) = core_with_item();
    core.on_click(pt(150.0, 150.0), 0.0);
    let actions = core.on_click(pt(150.0, 290.0), 10.0);
    assert_eq!(actions, vec![Action::OpenLink { url: "https://example.com/roll-7".into() }]);
    assert!(core.store.get(&id).unwrap().info_visible);
}

// =============================================================
// Restore and the decode barrier
// =============================================================

#[test]
fn restore_applies_saved_transform_and_height() {
    let mut core = EngineCore::new();
    core.restore(&doc(r#"{"gridState":{"scale":2,"panX":-10,"panY":5,"gridHeight":2400}}"#));
    assert_eq!(core.transform, CanvasTransform::new(-10.0, 5.0, 2.0));
    assert_eq!(core.geometry.canvas_height(), 2400.0);
}

#[test]
fn settle_waits_for_every_restore_decode() {
    let mut core = EngineCore::new();
    let requests = core.restore(&doc(TWO_IMAGES));
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].src, "images/img_1_b.png");
    assert!(!core.is_settled());

    assert!(!has_settled(&core.finalize_geometry(&requests[1].id, 400.0, 200.0)));
    assert!(!core.is_settled());
    assert!(has_settled(&core.finalize_geometry(&requests[0].id, 400.0, 200.0)));
    assert!(core.is_settled());

    // Baselines come from restored positions.
    let b = core.store.get(&requests[1].id).unwrap();
    assert_eq!(b.y, 900.0);
    assert_eq!(b.distance_from_bottom, Some(400.0));
}

#[test]
fn settle_runs_once() {
    let mut core = EngineCore::new();
    let requests = core.restore(&doc(TWO_IMAGES));
    core.finalize_geometry(&requests[0].id, 400.0, 200.0);
    core.finalize_geometry(&requests[1].id, 400.0, 200.0);
    assert!(!has_settled(&core.finalize_geometry(&requests[1].id, 400.0, 200.0)));
    assert!(!has_settled(&core.abandon_decode(&requests[0].id)));
}

#[test]
fn empty_restore_settles_immediately() {
    let mut core = EngineCore::new();
    assert!(core.restore(&doc("{}")).is_empty());
    assert!(core.is_settled());

    let mut fresh = EngineCore::new();
    fresh.restore_empty();
    assert!(fresh.is_settled());
}

#[test]
fn failed_decode_still_releases_barrier() {
    let mut core = EngineCore::new();
    let requests = core.restore(&doc(TWO_IMAGES));
    core.finalize_geometry(&requests[0].id, 400.0, 200.0);
    assert!(has_settled(&core.abandon_decode(&requests[1].id)));
    assert_eq!(core.store.get(&requests[1].id).unwrap().display.height, 0.0);
}

#[test]
fn deleting_pending_item_releases_barrier() {
    let mut core = EngineCore::new();
    let requests = core.restore(&doc(TWO_IMAGES));
    core.finalize_geometry(&requests[0].id, 400.0, 200.0);

    let actions = core.delete_item(&requests[1].id).unwrap();
    assert!(actions.contains(&Action::ItemRemoved { id: requests[1].id.clone() }));
    assert!(has_settled(&actions));
    assert_eq!(core.store.len(), 1);

    // A late decode for the deleted item is harmless.
    assert!(!has_settled(&core.finalize_geometry(&requests[1].id, 400.0, 200.0)));
}

#[test]
fn fixed_items_keep_restored_position() {
    let mut core = EngineCore::new();
    let requests = core.restore(&doc(
        r#"{"images":[
            {"id":"img_0","filename":"a.png","x":0,"y":0,"fixedToTop":true},
            {"id":"img_1","filename":"b.png","x":0,"y":50}
        ]}"#,
    ));
    core.finalize_geometry(&requests[0].id, 800.0, 600.0);
    core.finalize_geometry(&requests[1].id, 400.0, 400.0);

    assert_eq!(core.geometry.fixed_content_height(), 300.0);
    let fixed = core.store.get(&requests[0].id).unwrap();
    assert_eq!((fixed.x, fixed.y), (0.0, 0.0));
    // The dynamic item is pushed below the fixed block.
    assert_eq!(core.store.get(&requests[1].id).unwrap().y, 300.0);
}

// =============================================================
// Adding images
// =============================================================

#[test]
fn added_image_never_reuses_restored_ids() {
    let (mut core, _) = core_with_item();
    let id = core.add_image("cat.jpg");
    assert_eq!(id, ItemId::numbered(1));
    let item = core.store.get(&id).unwrap();
    assert_eq!(item.filename, "img_1_cat.jpg");
    assert_eq!(item.title, "cat.jpg");
}

#[test]
fn added_image_pushes_dynamic_items_down() {
    let (mut core, old) = core_with_item();
    let id = core.add_image("cat.jpg");
    let actions = core.finalize_geometry(&id, 800.0, 400.0);
    assert!(!has_settled(&actions));

    let new = core.store.get(&id).unwrap();
    assert_eq!((new.y, new.display.height), (20.0, 200.0));
    assert_eq!(core.store.get(&old).unwrap().y, 320.0);
}

#[test]
fn add_before_restore_keeps_both_items() {
    let mut core = EngineCore::new();
    let mine = core.add_image("mine.png");
    core.finalize_geometry(&mine, 800.0, 400.0);

    let requests = core.restore(&doc(TWO_IMAGES));
    assert_eq!(core.store.len(), 3);
    assert_eq!(core.store.get(&mine).unwrap().filename, "img_0_mine.png");

    let restored: Vec<ItemId> = requests.iter().map(|r| r.id.clone()).collect();
    assert_eq!(restored, vec![ItemId::numbered(2), ItemId::numbered(1)]);
    assert_eq!(core.store.get(&restored[0]).unwrap().filename, "img_0_a.png");
    assert_eq!(core.add_image("later.png"), ItemId::numbered(3));

    // The user's own decode is not part of the restore batch.
    assert!(!has_settled(&core.finalize_geometry(&mine, 800.0, 400.0)));
    core.finalize_geometry(&restored[0], 400.0, 400.0);
    assert!(has_settled(&core.finalize_geometry(&restored[1], 400.0, 400.0)));
}

#[test]
fn decode_for_deleted_item_changes_nothing() {
    let (mut core, old) = core_with_item();
    let id = core.add_image("cat.jpg");
    core.delete_item(&id).unwrap();

    let actions = core.finalize_geometry(&id, 800.0, 400.0);
    assert_eq!(actions, vec![Action::RenderNeeded]);
    assert!(core.store.get(&id).is_none());
    assert_eq!(core.store.get(&old).unwrap().y, 100.0);
}

// =============================================================
// Context menu commands
// =============================================================

#[test]
fn canvas_height_below_minimum_is_rejected() {
    let (mut core, _) = core_with_item();
    assert_eq!(
        core.set_canvas_height(50.0),
        Err(BoardError::InvalidHeight { requested: 50.0, minimum: 100.0 })
    );
    assert!(core.set_canvas_height(f64::NAN).is_err());
    assert_eq!(core.geometry.canvas_height(), 1500.0);
}

#[test]
fn canvas_height_change_keeps_bottom_gaps() {
    let (mut core, id) = core_with_item();
    let actions = core.set_canvas_height(2000.0).unwrap();
    assert_eq!(actions, vec![Action::CanvasResized { height: 2000.0 }, Action::RenderNeeded]);
    let item = core.store.get(&id).unwrap();
    assert_eq!(item.y, 600.0);
    assert_eq!(item.distance_from_bottom, Some(1200.0));
}

#[test]
fn item_scale_out_of_range_is_rejected() {
    let (mut core, id) = core_with_item();
    assert_eq!(core.set_item_scale(&id, 20.0), Err(BoardError::InvalidScale { requested: 20.0 }));
    assert_eq!(core.set_item_scale(&id, 0.05), Err(BoardError::InvalidScale { requested: 0.05 }));
    assert_eq!(core.store.get(&id).unwrap().scale_factor, 1.0);
}

#[test]
fn item_scale_resizes_display() {
    let (mut core, id) = core_with_item();
    core.set_item_scale(&id, 2.0).unwrap();
    let item = core.store.get(&id).unwrap();
    assert_eq!((item.display.width, item.display.height), (800.0, 400.0));
    assert_eq!((item.x, item.y), (100.0, 100.0));
}

#[test]
fn unknown_item_commands_fail() {
    let (mut core, _) = core_with_item();
    let ghost = ItemId::from("img_99");
    assert_eq!(core.set_item_scale(&ghost, 2.0), Err(BoardError::UnknownItem(ghost.clone())));
    assert_eq!(core.delete_item(&ghost), Err(BoardError::UnknownItem(ghost)));
}

#[test]
fn deleting_dragged_item_ends_gesture() {
    let (mut core, id) = core_with_item();
    core.on_pointer_down(pt(150.0, 150.0), Button::Primary);
    core.delete_item(&id).unwrap();
    assert!(core.input.is_idle());
    assert!(core.on_pointer_up(pt(150.0, 150.0), Button::Primary, 0.0).is_empty());
}

// =============================================================
// Rulers
// =============================================================

#[test]
fn hover_reports_ruler_readout_when_enabled() {
    let (mut core, id) = core_with_item();
    assert!(core.toggle_rulers());

    let actions = core.on_pointer_move(pt(150.0, 150.0));
    assert_eq!(actions[0], Action::SetCursor { cursor: "grab" });
    let readout = core.readout(&id).unwrap();
    assert!(actions.contains(&Action::RulerChanged { readout: Some(readout.clone()) }));
    assert_eq!(readout.x_label(), "X: 100px, Width: 400px");

    let actions = core.on_pointer_move(pt(1000.0, 700.0));
    assert!(actions.contains(&Action::RulerChanged { readout: None }));
    assert_eq!(core.ui.hovered, None);
}

#[test]
fn hover_without_rulers_only_changes_cursor() {
    let (mut core, _) = core_with_item();
    let actions = core.on_pointer_move(pt(150.0, 150.0));
    assert_eq!(actions, vec![Action::SetCursor { cursor: "grab" }]);
    assert!(core.on_pointer_move(pt(160.0, 150.0)).is_empty());
}

#[test]
fn ruler_follows_dragged_item() {
    let (mut core, id) = core_with_item();
    core.toggle_rulers();
    core.on_pointer_down(pt(150.0, 150.0), Button::Primary);
    let actions = core.on_pointer_move(pt(170.0, 160.0));
    let Some(Action::RulerChanged { readout: Some(readout) }) = actions.last() else {
        panic!("expected a ruler readout, got {actions:?}");
    };
    assert_eq!((readout.id.clone(), readout.x, readout.y), (id, 120.0, 110.0));
}

// =============================================================
// Export
// =============================================================

#[test]
fn export_reflects_moves_and_transform() {
    let (mut core, id) = core_with_item();
    drag(&mut core, pt(150.0, 150.0), pt(250.0, 190.0), 0.0);
    core.on_wheel(pt(0.0, 0.0), WheelDelta { dx: 0.0, dy: -1.0 });

    let exported = core.export_layout();
    let state = exported.grid_state.unwrap();
    assert!((state.scale.unwrap() - 1.1).abs() < 1e-12);
    assert_eq!(exported.images[0].id, id);
    assert_eq!((exported.images[0].x, exported.images[0].y), (Some(200.0), Some(140.0)));
    assert_eq!(exported.images[0].description.as_deref(), Some("shot on film https://example.com/roll-7"));
}

#[test]
fn actions_serialize_with_type_tag() {
    let json = serde_json::to_value(Action::CanvasResized { height: 1800.0 }).unwrap();
    assert_eq!(json, serde_json::json!({ "type": "canvas_resized", "height": 1800.0 }));
    let json = serde_json::to_value(Action::SetCursor { cursor: "grab" }).unwrap();
    assert_eq!(json["type"], "set_cursor");
}
