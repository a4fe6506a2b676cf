use pixelpad::brush_engine::settings::Tool;
use pixelpad::canvas::viewport::WheelInput;
use pixelpad::utils::color::Color;
use pixelpad::utils::exporter::{ExportBackground, ExportFormat, ExportRequest};
use pixelpad::utils::vector::Vec2;
use pixelpad::{Session, SessionConfig};

fn session(width: f32, height: f32) -> Session {
    Session::new(SessionConfig {
        viewport_width: width,
        viewport_height: height,
        spray_seed: Some(42),
        ..SessionConfig::default()
    })
    .unwrap()
}

fn drag(session: &mut Session, points: &[(f32, f32)]) -> bool {
    let (first, rest) = points.split_first().unwrap();
    session.pointer_down(Vec2::new(first.0, first.1));
    for &(x, y) in rest {
        session.pointer_move(Vec2::new(x, y));
        session.frame();
    }
    session.pointer_up(None)
}

fn opaque(session: &Session, x: f32, y: f32) -> bool {
    session.surface().pixel(x, y).is_some_and(|c| c.a > 128)
}

fn painted(session: &Session, x: f32, y: f32) -> bool {
    session.surface().pixel(x, y).is_some_and(|c| c.a > 0)
}

#[test]
fn test_vertical_stroke_inside_document() {
    let mut session = session(500.0, 500.0);
    session.settings_mut().set_color_hex("#000000").unwrap();
    let before = session.history().len();

    assert!(drag(&mut session, &[(10.0, 10.0), (10.0, 400.0)]));

    assert_eq!(session.surface().width(), 500);
    assert_eq!(session.surface().height(), 500);
    assert_eq!(session.history().len(), before + 1);

    let covered = (0..40)
        .filter(|&x| opaque(&session, x as f32 + 0.5, 200.5))
        .count();
    assert!((9..=11).contains(&covered), "stroke is {covered}px wide");
    assert!(opaque(&session, 10.5, 200.5));
    assert!(!painted(&session, 10.5, 450.5));
}

#[test]
fn test_stroke_past_left_edge_expands_document() {
    let mut session = session(500.0, 500.0);

    session.pointer_down(Vec2::new(100.0, 50.0));
    session.pointer_move(Vec2::new(50.0, 50.0));
    session.pointer_move(Vec2::new(-20.0, 50.0));

    // overshoot of 25 (20 past the edge plus the 5px brush radius) plus the margin
    assert_eq!(session.surface().width(), 589);
    assert_eq!(session.surface().height(), 500);
    assert_eq!(session.view().offset_x, -89.0);
    let points: Vec<f32> = session.engine().points().unwrap().iter().map(|p| p.x).collect();
    assert_eq!(points, vec![189.0, 139.0, 69.0]);

    assert!(session.pointer_up(None));
    assert!(!painted(&session, 60.5, 50.5));
    assert!(opaque(&session, 66.5, 50.5));
    assert!(opaque(&session, 120.5, 50.5));
    assert!(opaque(&session, 192.5, 50.5));
    assert!(!painted(&session, 195.5, 50.5));
    assert!(!painted(&session, 120.5, 60.5));
}

#[test]
fn test_undo_across_expansion_keeps_the_view_anchored() {
    let mut session = session(300.0, 300.0);
    drag(&mut session, &[(100.0, 100.0), (150.0, 100.0)]);
    let on_screen = session.view().content_to_screen(Vec2::new(100.0, 100.0));

    drag(&mut session, &[(50.0, 150.0), (-30.0, 150.0)]);
    assert!(session.surface().width() > 300);

    assert!(session.undo());
    assert_eq!(session.surface().width(), 300);
    assert_eq!(session.view().content_to_screen(Vec2::new(100.0, 100.0)), on_screen);
    assert!(opaque(&session, 125.5, 100.5));

    assert!(session.redo());
    assert!(session.surface().width() > 300);
    let shifted = session.surface().origin().0 as f32;
    assert_eq!(
        session.view().content_to_screen(Vec2::new(100.0 + shifted, 100.0)),
        on_screen
    );
}

#[test]
fn test_jpeg_export_fills_transparency_with_white() {
    let mut session = session(120.0, 80.0);
    drag(&mut session, &[(20.0, 40.0), (60.0, 40.0)]);

    let exported = session
        .export(&ExportRequest {
            format: ExportFormat::Jpeg,
            filename_stem: "sketch".to_string(),
            background: ExportBackground::Transparent,
            ..ExportRequest::default()
        })
        .unwrap();

    assert_eq!(exported.filename, "sketch.jpg");
    assert_eq!(exported.mime, "image/jpeg");
    let decoded = image::load_from_memory(&exported.bytes).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (120, 80));
    let corner = decoded.get_pixel(110, 5);
    assert!(corner.0.iter().all(|&c| c >= 245), "corner is {corner:?}");
}

#[test]
fn test_symmetry_mirrors_every_tool() {
    for tool in [Tool::Brush, Tool::Calligraphy, Tool::Rect, Tool::Circle] {
        let mut session = session(400.0, 300.0);
        session.set_tool(tool);
        session.toggle_symmetry();
        session.toggle_fill();
        drag(&mut session, &[(60.0, 100.0), (90.0, 130.0)]);

        assert!(painted(&session, 75.5, 115.5), "{tool:?} original");
        assert!(painted(&session, 400.0 - 75.5, 115.5), "{tool:?} mirror");
        assert!(!painted(&session, 200.5, 115.5), "{tool:?} center");
    }

    let mut session = session(400.0, 300.0);
    session.set_tool(Tool::Spray);
    session.toggle_symmetry();
    session.settings_mut().set_spray_strength(200);
    drag(&mut session, &[(60.0, 100.0), (60.0, 101.0)]);
    let left = (40..80).filter(|&x| painted(&session, x as f32 + 0.5, 100.5)).count();
    let right = (320..360).filter(|&x| painted(&session, x as f32 + 0.5, 100.5)).count();
    assert!(left > 0);
    assert!(right > 0);
}

#[test]
fn test_eraser_clears_paint() {
    let mut session = session(200.0, 200.0);
    drag(&mut session, &[(20.0, 50.0), (180.0, 50.0)]);
    assert!(opaque(&session, 100.5, 50.5));

    session.set_tool(Tool::Eraser);
    session.settings_mut().set_brush_size(30.0);
    drag(&mut session, &[(100.0, 20.0), (100.0, 80.0)]);

    assert!(!painted(&session, 100.5, 50.5));
    assert!(opaque(&session, 40.5, 50.5));
}

#[test]
fn test_wheel_pans_and_ctrl_wheel_zooms() {
    let mut session = session(400.0, 400.0);
    session.wheel(WheelInput {
        position: Vec2::new(200.0, 200.0),
        delta_x: 0.0,
        delta_y: 50.0,
        zoom: false,
    });
    assert_eq!(session.view().offset_y, -50.0);

    session.reset_view();
    session.wheel(WheelInput {
        position: Vec2::new(200.0, 200.0),
        delta_x: 0.0,
        delta_y: -100.0,
        zoom: true,
    });
    assert!((session.view().scale - 1.1).abs() < 1e-5);
    let pinned = session.view().screen_to_content(Vec2::new(200.0, 200.0));
    assert!((pinned.x - 200.0).abs() < 1e-3);
    assert!((pinned.y - 200.0).abs() < 1e-3);
}

#[test]
fn test_strokes_drawn_while_zoomed_land_in_content_space() {
    let mut session = session(400.0, 400.0);
    session.wheel(WheelInput {
        position: Vec2::ZERO,
        delta_x: 0.0,
        delta_y: -727.0,
        zoom: true,
    });
    let scale = session.view().scale;
    assert!(scale > 1.9);

    drag(&mut session, &[(100.0 * scale, 100.0 * scale), (150.0 * scale, 100.0 * scale)]);
    assert!(opaque(&session, 125.5, 100.5));
    assert_eq!(session.surface().width(), 400);
}

#[test]
fn test_saved_session_restores_in_a_new_one() {
    let mut first = session(300.0, 200.0);
    first.set_tool(Tool::Rect);
    first.toggle_fill();
    first.settings_mut().color = Color::rgb(0, 128, 255);
    drag(&mut first, &[(20.0, 20.0), (80.0, 60.0)]);
    first.pan(12.0, -8.0);

    let json = first.persisted_settings().to_json().unwrap();
    let png = first.encode_document().unwrap();

    let mut second = session(640.0, 480.0);
    second.restore(Some(&json), Some(&png)).unwrap();

    assert_eq!(second.settings().active_tool, Tool::Rect);
    assert!(second.settings().shape_filled);
    assert_eq!(second.settings().color, Color::rgb(0, 128, 255));
    assert_eq!(second.surface().width(), 300);
    assert_eq!(second.surface().height(), 200);
    assert_eq!(second.view().offset_x, 12.0);
    assert_eq!(second.history().len(), 1);
    let restored = second.surface().pixel(50.5, 40.5).unwrap();
    assert_eq!(restored.a, 255);
    assert!(restored.b >= 254 && restored.g.abs_diff(128) <= 1);
}

#[test]
fn test_clear_resets_to_viewport_size() {
    let mut session = session(300.0, 300.0);
    drag(&mut session, &[(50.0, 50.0), (-40.0, 50.0)]);
    assert!(session.surface().width() > 300);

    session.resize_viewport(320.0, 240.0);
    session.clear().unwrap();

    assert_eq!(session.surface().width(), 320);
    assert_eq!(session.surface().height(), 240);
    assert_eq!(session.view().offset_x, 0.0);
    assert!(!painted(&session, 10.5, 50.5));
    assert!(session.undo());
    assert!(session.surface().width() > 300);
}

#[test]
fn test_repeated_expansion_at_fractional_pixel_ratio_keeps_strokes_in_place() {
    let mut session = Session::new(SessionConfig {
        viewport_width: 300.0,
        viewport_height: 300.0,
        device_pixel_ratio: 1.5,
        spray_seed: Some(42),
        ..SessionConfig::default()
    })
    .unwrap();
    drag(&mut session, &[(100.0, 100.0), (150.0, 100.0)]);
    let on_screen = session.view().content_to_screen(Vec2::new(125.0, 100.0));

    drag(&mut session, &[(50.0, 200.0), (-30.0, 200.0)]);
    drag(&mut session, &[(-150.0, 250.0), (-260.0, 250.0)]);

    let shift = session.surface().origin().0;
    assert!(shift > 100);
    assert_eq!((shift as f32 * 1.5).fract(), 0.0);
    let x = 125.5 + shift as f32;
    assert_eq!(session.view().content_to_screen(Vec2::new(125.0 + shift as f32, 100.0)), on_screen);
    assert_eq!(session.surface().pixel(x, 100.5).unwrap().a, 255);
    assert_eq!(session.surface().pixel(x, 103.5).unwrap().a, 255);
    assert!(!painted(&session, x, 106.5));
    assert!(!painted(&session, x, 93.5));
}
