use crate::model::{ImageSize, LotRegion, Point};
use eframe::egui;

use super::session::{MapCommand, MapEvent, MapSession, Mode, SessionConfig};
use super::viewport::Viewport;

fn at(x: f32, y: f32) -> egui::Pos2 {
    egui::pos2(x, y)
}

fn editor_session(scale: f32) -> MapSession {
    let mut session = MapSession::with_viewport(Viewport::with_scale(scale));
    session.handle(MapEvent::ToggleMode);
    assert_eq!(session.mode(), Mode::Editor);
    session
}

fn click_all(session: &mut MapSession, points: &[(f32, f32)]) {
    for &(x, y) in points {
        session.handle(MapEvent::Click(at(x, y)));
    }
}

fn square_region(lot: &str, size: f32) -> LotRegion {
    LotRegion::polygon(
        lot.to_string(),
        vec![
            Point::new(0.0, 0.0),
            Point::new(size, 0.0),
            Point::new(size, size),
            Point::new(0.0, size),
        ],
        Point::new(size / 2.0, size / 2.0),
    )
}

#[test]
fn test_draw_square_at_scale_two() {
    let mut session = editor_session(2.0);
    session.handle(MapEvent::RegionsLoaded(Vec::new()));
    click_all(&mut session, &[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)]);
    assert_eq!(session.draft().map(<[Point]>::len), Some(4));

    let cmd = session.handle(MapEvent::DoubleClick(at(0.0, 100.0)));
    assert_eq!(cmd, Some(MapCommand::RequestLotNumber));
    assert!(session.awaiting_lot_number());

    session.handle(MapEvent::LotNumberSubmitted("14".to_string()));
    assert!(!session.awaiting_lot_number());
    assert!(session.draft().is_none());
    assert_eq!(session.store().len(), 1);

    let region = session.store().get(0).unwrap();
    assert_eq!(region.lot_number, "14");
    assert_eq!(
        region.coordinates,
        vec![
            Point::new(0.0, 0.0),
            Point::new(50.0, 0.0),
            Point::new(50.0, 50.0),
            Point::new(0.0, 50.0),
        ]
    );
    assert_eq!(region.label_anchor(), Some(Point::new(25.0, 25.0)));
}

#[test]
fn test_hit_survives_zoom_change() {
    let mut session = editor_session(2.0);
    click_all(&mut session, &[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)]);
    session.handle(MapEvent::DoubleClick(at(0.0, 100.0)));
    session.handle(MapEvent::LotNumberSubmitted("14".to_string()));

    session.handle(MapEvent::ToggleMode);
    session.handle(MapEvent::Zoom(1.5));
    assert_eq!(session.viewport().unwrap().scale, 3.0);

    // Image point (25, 25) is canvas point (75, 75) at scale 3.
    session.handle(MapEvent::Click(at(75.0, 75.0)));
    assert_eq!(session.selected(), Some(0));
    let panel = session.panel().unwrap();
    assert_eq!(panel.lot_number, "14");
    assert_eq!(panel.label_x, "25");
}

#[test]
fn test_finish_with_three_points_labels_at_mean() {
    let mut session = editor_session(2.0);
    click_all(&mut session, &[(0.0, 0.0), (60.0, 0.0), (0.0, 30.0)]);
    assert_eq!(
        session.handle(MapEvent::DoubleClick(at(0.0, 30.0))),
        Some(MapCommand::RequestLotNumber)
    );
    session.handle(MapEvent::LotNumberSubmitted("  7B ".to_string()));

    assert_eq!(session.store().len(), 1);
    let region = session.store().get(0).unwrap();
    assert_eq!(region.lot_number, "7B");
    assert_eq!(region.coordinates.len(), 3);
    assert_eq!(region.label_anchor(), Some(Point::new(10.0, 5.0)));
}

#[test]
fn test_finish_with_two_points_is_noop() {
    let mut session = editor_session(1.0);
    click_all(&mut session, &[(10.0, 10.0), (20.0, 20.0)]);
    let before = session.draft().map(<[Point]>::to_vec);

    assert_eq!(session.handle(MapEvent::DoubleClick(at(20.0, 20.0))), None);
    assert!(!session.awaiting_lot_number());
    assert_eq!(session.store().len(), 0);
    assert_eq!(session.draft().map(<[Point]>::to_vec), before);

    // Still drawing: the next click extends the same draft.
    session.handle(MapEvent::Click(at(10.0, 30.0)));
    assert_eq!(session.draft().map(<[Point]>::len), Some(3));
}

#[test]
fn test_double_click_without_draft_is_noop() {
    let mut session = editor_session(1.0);
    assert_eq!(session.handle(MapEvent::DoubleClick(at(5.0, 5.0))), None);
    assert!(session.draft().is_none());
}

#[test]
fn test_empty_or_cancelled_lot_number_discards_draft() {
    for resolution in [
        MapEvent::LotNumberSubmitted(String::new()),
        MapEvent::LotNumberSubmitted("   ".to_string()),
        MapEvent::LotNumberCancelled,
    ] {
        let mut session = editor_session(1.0);
        click_all(&mut session, &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        session.handle(MapEvent::DoubleClick(at(10.0, 10.0)));
        session.handle(resolution);
        assert_eq!(session.store().len(), 0);
        assert!(session.draft().is_none());
        assert!(!session.awaiting_lot_number());
        assert_eq!(session.mode(), Mode::Editor);
    }
}

#[test]
fn test_clicks_ignored_while_awaiting_lot_number() {
    let mut session = editor_session(1.0);
    click_all(&mut session, &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
    session.handle(MapEvent::DoubleClick(at(10.0, 10.0)));
    session.handle(MapEvent::Click(at(50.0, 50.0)));
    assert_eq!(session.handle(MapEvent::DoubleClick(at(50.0, 50.0))), None);
    assert_eq!(session.draft().map(<[Point]>::len), Some(3));
}

#[test]
fn test_toggle_twice_clears_draft_and_selection() {
    let mut session = MapSession::with_viewport(Viewport::with_scale(1.0));
    session.handle(MapEvent::RegionsLoaded(vec![square_region("1", 10.0)]));
    session.handle(MapEvent::Click(at(5.0, 5.0)));
    assert_eq!(session.selected(), Some(0));

    session.handle(MapEvent::ToggleMode);
    assert_eq!(session.mode(), Mode::Editor);
    assert!(session.selected().is_none());
    assert!(session.panel().is_none());
    assert!(session.draft().is_none());

    click_all(&mut session, &[(1.0, 1.0), (2.0, 2.0)]);
    assert!(session.draft().is_some());

    session.handle(MapEvent::ToggleMode);
    assert_eq!(session.mode(), Mode::View);
    assert!(session.draft().is_none());
    assert!(session.selected().is_none());
}

#[test]
fn test_toggle_while_awaiting_lot_number_drops_request() {
    let mut session = editor_session(1.0);
    click_all(&mut session, &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
    session.handle(MapEvent::DoubleClick(at(10.0, 10.0)));
    session.handle(MapEvent::ToggleMode);
    assert!(!session.awaiting_lot_number());
    session.handle(MapEvent::LotNumberSubmitted("late".to_string()));
    assert_eq!(session.store().len(), 0);
}

#[test]
fn test_editor_clicks_do_not_hit_test() {
    let mut session = editor_session(1.0);
    session.handle(MapEvent::RegionsLoaded(vec![square_region("1", 10.0)]));
    session.handle(MapEvent::Click(at(5.0, 5.0)));
    assert!(session.selected().is_none());
    assert_eq!(session.draft(), Some(&[Point::new(5.0, 5.0)][..]));
}

#[test]
fn test_background_click_clears_selection() {
    let mut session = MapSession::with_viewport(Viewport::with_scale(1.0));
    session.handle(MapEvent::RegionsLoaded(vec![square_region("1", 10.0)]));
    session.handle(MapEvent::Click(at(5.0, 5.0)));
    assert!(session.panel().is_some());
    session.handle(MapEvent::Click(at(50.0, 50.0)));
    assert!(session.selected().is_none());
    assert!(session.panel().is_none());
}

#[test]
fn test_overlapping_regions_select_earlier() {
    let mut session = MapSession::with_viewport(Viewport::with_scale(1.0));
    let mut later = square_region("2", 10.0);
    for p in &mut later.coordinates {
        p.x += 5.0;
    }
    session.handle(MapEvent::RegionsLoaded(vec![square_region("1", 10.0), later]));
    session.handle(MapEvent::Click(at(7.0, 5.0)));
    assert_eq!(session.selected(), Some(0));
    session.handle(MapEvent::Click(at(12.0, 5.0)));
    assert_eq!(session.selected(), Some(1));
}

#[test]
fn test_pan_only_in_view_mode() {
    let mut session = MapSession::with_viewport(Viewport::with_scale(1.0));
    session.handle(MapEvent::PointerDown(at(100.0, 100.0)));
    assert!(session.is_panning());
    session.handle(MapEvent::PointerMove(at(130.0, 90.0)));
    session.handle(MapEvent::PointerUp);
    assert!(!session.is_panning());
    assert_eq!(session.viewport().unwrap().offset, egui::vec2(30.0, -10.0));

    // A second drag continues from the current offset.
    session.handle(MapEvent::PointerDown(at(0.0, 0.0)));
    session.handle(MapEvent::PointerMove(at(5.0, 5.0)));
    session.handle(MapEvent::PointerUp);
    assert_eq!(session.viewport().unwrap().offset, egui::vec2(35.0, -5.0));

    session.handle(MapEvent::ToggleMode);
    session.handle(MapEvent::PointerDown(at(0.0, 0.0)));
    session.handle(MapEvent::PointerMove(at(50.0, 50.0)));
    assert!(!session.is_panning());
    assert_eq!(session.viewport().unwrap().offset, egui::vec2(35.0, -5.0));
}

#[test]
fn test_keyboard_pan_moves_canvas_in_view_mode() {
    let mut session = MapSession::with_viewport(Viewport::with_scale(1.0));
    session.handle(MapEvent::Pan(egui::vec2(20.0, 0.0)));
    session.handle(MapEvent::Pan(egui::vec2(0.0, -80.0)));
    assert_eq!(session.viewport().unwrap().offset, egui::vec2(20.0, -80.0));

    session.handle(MapEvent::ToggleMode);
    session.handle(MapEvent::Pan(egui::vec2(20.0, 0.0)));
    assert_eq!(session.viewport().unwrap().offset, egui::vec2(20.0, -80.0));
}

#[test]
fn test_click_after_pan_hits_through_offset() {
    let mut session = MapSession::with_viewport(Viewport::with_scale(1.0));
    session.handle(MapEvent::RegionsLoaded(vec![square_region("1", 10.0)]));
    session.handle(MapEvent::PointerDown(at(0.0, 0.0)));
    session.handle(MapEvent::PointerMove(at(100.0, 0.0)));
    session.handle(MapEvent::PointerUp);
    session.handle(MapEvent::Click(at(5.0, 5.0)));
    assert!(session.selected().is_none());
    session.handle(MapEvent::Click(at(105.0, 5.0)));
    assert_eq!(session.selected(), Some(0));
}

#[test]
fn test_save_region_mutates_in_place_and_emits_upsert() {
    let mut session = MapSession::with_viewport(Viewport::with_scale(1.0));
    session.handle(MapEvent::RegionsLoaded(vec![square_region("1", 10.0)]));
    session.handle(MapEvent::Click(at(5.0, 5.0)));
    {
        let form = session.panel_mut().unwrap();
        form.owner_name = "  Nguyen ".to_string();
        form.label_x = "3.5".to_string();
        form.label_y = "abc".to_string();
    }
    let payload = match session.handle(MapEvent::SaveRegion) {
        Some(MapCommand::Upsert(payload)) => payload,
        other => panic!("expected upsert, got {other:?}"),
    };
    assert_eq!(payload.lot_number, "1");
    assert_eq!(payload.owner_name, "Nguyen");
    assert_eq!((payload.label_x, payload.label_y), (3.5, 0.0));
    assert_eq!(payload.coordinates.len(), 4);

    let region = session.store().get(0).unwrap();
    assert_eq!(region.owner_name.as_deref(), Some("Nguyen"));
    assert_eq!(region.label_anchor(), Some(Point::new(3.5, 0.0)));
    // Still selected until the backend confirms.
    assert_eq!(session.selected(), Some(0));

    session.handle(MapEvent::RegionSaved {
        lot_number: "1".to_string(),
    });
    assert!(session.selected().is_none());
    assert!(session.panel().is_none());
}

#[test]
fn test_save_confirmation_for_other_lot_keeps_selection() {
    let mut session = MapSession::with_viewport(Viewport::with_scale(1.0));
    session.handle(MapEvent::RegionsLoaded(vec![square_region("1", 10.0)]));
    session.handle(MapEvent::Click(at(5.0, 5.0)));
    session.handle(MapEvent::RegionSaved {
        lot_number: "99".to_string(),
    });
    assert_eq!(session.selected(), Some(0));
}

#[test]
fn test_save_without_selection_does_nothing() {
    let mut session = MapSession::with_viewport(Viewport::with_scale(1.0));
    assert_eq!(session.handle(MapEvent::SaveRegion), None);
}

#[test]
fn test_missing_viewport_makes_pointer_events_noops() {
    let mut session = MapSession::new(SessionConfig::default());
    session.handle(MapEvent::RegionsLoaded(vec![square_region("1", 10.0)]));
    session.handle(MapEvent::Click(at(5.0, 5.0)));
    session.handle(MapEvent::PointerDown(at(5.0, 5.0)));
    session.handle(MapEvent::ZoomIn);
    assert!(session.selected().is_none());
    assert!(!session.is_panning());
    session.handle(MapEvent::ToggleMode);
    session.handle(MapEvent::Click(at(5.0, 5.0)));
    assert!(session.draft().is_none());
    assert_eq!(session.handle(MapEvent::DoubleClick(at(5.0, 5.0))), None);
}

#[test]
fn test_image_and_container_fit_viewport() {
    let mut session = MapSession::new(SessionConfig::default());
    let container = egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(1040.0, 540.0));
    session.handle(MapEvent::ContainerResized(container));
    assert!(session.viewport().is_none());
    session.handle(MapEvent::ImageReady(ImageSize {
        width: 2000.0,
        height: 1000.0,
    }));
    let vp = *session.viewport().unwrap();
    assert_eq!(vp.scale, 0.5);

    session.handle(MapEvent::ZoomIn);
    // Same container again: no refit, zoom survives.
    session.handle(MapEvent::ContainerResized(container));
    assert!((session.viewport().unwrap().scale - 0.6).abs() < 1e-6);

    session.handle(MapEvent::ResetZoom);
    assert_eq!(session.viewport().unwrap().scale, 0.5);
}

#[test]
fn test_zoom_while_drawing_keeps_draft_on_image() {
    let mut session = editor_session(1.0);
    click_all(&mut session, &[(10.0, 10.0), (20.0, 10.0)]);
    session.handle(MapEvent::Zoom(2.0));
    session.handle(MapEvent::Click(at(40.0, 40.0)));
    assert_eq!(
        session.draft(),
        Some(&[Point::new(20.0, 20.0), Point::new(40.0, 20.0), Point::new(40.0, 40.0)][..])
    );
    session.handle(MapEvent::DoubleClick(at(40.0, 40.0)));
    session.handle(MapEvent::LotNumberSubmitted("5".to_string()));
    assert_eq!(
        session.store().get(0).unwrap().coordinates,
        vec![Point::new(10.0, 10.0), Point::new(20.0, 10.0), Point::new(20.0, 20.0)]
    );
}

#[test]
fn test_escape_cancels_per_mode() {
    let mut session = MapSession::with_viewport(Viewport::with_scale(1.0));
    session.handle(MapEvent::RegionsLoaded(vec![square_region("1", 10.0)]));
    session.handle(MapEvent::Click(at(5.0, 5.0)));
    session.handle(MapEvent::Cancel);
    assert!(session.selected().is_none());

    session.handle(MapEvent::ToggleMode);
    click_all(&mut session, &[(1.0, 1.0), (2.0, 1.0), (2.0, 2.0)]);
    session.handle(MapEvent::Cancel);
    assert!(session.draft().is_none());
    assert_eq!(session.mode(), Mode::Editor);
}

#[test]
fn test_select_lot_only_in_view_mode() {
    let mut session = MapSession::with_viewport(Viewport::with_scale(1.0));
    session.handle(MapEvent::RegionsLoaded(vec![square_region("1", 10.0), square_region("2", 4.0)]));
    session.handle(MapEvent::SelectLot(1));
    assert_eq!(session.panel().map(|p| p.lot_number.as_str()), Some("2"));
    session.handle(MapEvent::SelectLot(7));
    assert_eq!(session.selected(), Some(1));

    session.handle(MapEvent::ToggleMode);
    session.handle(MapEvent::SelectLot(0));
    assert!(session.selected().is_none());
}

#[test]
fn test_refresh_replaces_entry_and_updates_open_panel() {
    let mut session = MapSession::with_viewport(Viewport::with_scale(1.0));
    session.handle(MapEvent::RegionsLoaded(vec![square_region("1", 10.0)]));
    session.handle(MapEvent::Click(at(5.0, 5.0)));

    let mut fresh = square_region("1", 10.0);
    fresh.owner_name = Some("Haddad".to_string());
    session.handle(MapEvent::RegionRefreshed(fresh));
    assert_eq!(session.store().len(), 1);
    assert_eq!(session.panel().unwrap().owner_name, "Haddad");

    session.handle(MapEvent::RegionRefreshed(square_region("2", 3.0)));
    assert_eq!(session.store().len(), 2);
}

#[test]
fn test_reload_clears_stale_selection() {
    let mut session = MapSession::with_viewport(Viewport::with_scale(1.0));
    session.handle(MapEvent::RegionsLoaded(vec![square_region("1", 10.0)]));
    session.handle(MapEvent::Click(at(5.0, 5.0)));
    session.handle(MapEvent::RegionsLoaded(Vec::new()));
    assert!(session.selected().is_none());
    assert!(session.panel().is_none());
    assert_eq!(session.store().len(), 0);
}

#[test]
fn test_drag_from_press_origin_follows_cursor() {
    let mut session = MapSession::with_viewport(Viewport::with_scale(1.0));
    // The drag is reported once the cursor is 6px past the press.
    session.handle(MapEvent::PointerDown(at(100.0, 100.0)));
    session.handle(MapEvent::PointerMove(at(106.0, 100.0)));
    assert_eq!(session.viewport().unwrap().offset, egui::vec2(6.0, 0.0));
    session.handle(MapEvent::PointerMove(at(140.0, 120.0)));
    session.handle(MapEvent::PointerUp);
    assert_eq!(session.viewport().unwrap().offset, egui::vec2(40.0, 20.0));
}

#[test]
fn test_refresh_uses_stored_lot_number_not_form_edit() {
    let mut session = MapSession::with_viewport(Viewport::with_scale(1.0));
    session.handle(MapEvent::RegionsLoaded(vec![square_region("1", 10.0)]));
    session.handle(MapEvent::Click(at(5.0, 5.0)));
    session.panel_mut().unwrap().lot_number = "99".to_string();
    assert_eq!(session.selected_lot_number(), Some("1"));

    let mut fresh = square_region("1", 10.0);
    fresh.owner_name = Some("Okafor".to_string());
    session.handle(MapEvent::RegionRefreshed(fresh));
    assert_eq!(session.store().len(), 1);
    assert_eq!(session.store().get(0).unwrap().owner_name.as_deref(), Some("Okafor"));
}

#[test]
fn test_container_below_margin_drops_viewport() {
    let mut session = MapSession::new(SessionConfig::default());
    session.handle(MapEvent::ImageReady(ImageSize {
        width: 2000.0,
        height: 1000.0,
    }));
    session.handle(MapEvent::ContainerResized(egui::Rect::from_min_size(
        egui::pos2(0.0, 0.0),
        egui::vec2(1040.0, 540.0),
    )));
    session.handle(MapEvent::RegionsLoaded(vec![square_region("1", 40.0)]));
    assert!(session.viewport().is_some());

    session.handle(MapEvent::ContainerResized(egui::Rect::from_min_size(
        egui::pos2(0.0, 0.0),
        egui::vec2(30.0, 30.0),
    )));
    assert!(session.viewport().is_none());
    session.handle(MapEvent::Click(at(5.0, 5.0)));
    assert!(session.selected().is_none());

    session.handle(MapEvent::ContainerResized(egui::Rect::from_min_size(
        egui::pos2(0.0, 0.0),
        egui::vec2(1040.0, 540.0),
    )));
    assert_eq!(session.viewport().unwrap().scale, 0.5);
}
