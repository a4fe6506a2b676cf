use super::painter::PainterApp;
use crate::brush_engine::settings::Tool;
use crate::canvas::viewport::WheelInput;
use crate::ui::export_modal::save_dialog;
use crate::session::Session;
use crate::utils::vector::Vec2;
use eframe::egui;

/// Points per wheel "line" when the platform reports line deltas.
const LINE_HEIGHT: f32 = 40.0;

/// Translate this frame's egui events into session calls.
pub fn handle_input(
    app: &mut PainterApp,
    ctx: &egui::Context,
    rect: egui::Rect,
    response: &egui::Response,
) {
    let local = |pos: egui::Pos2| Vec2::new(pos.x - rect.min.x, pos.y - rect.min.y);

    if response.double_clicked() {
        app.session.reset_view();
    }

    let events = ctx.input(|i| i.events.clone());
    let space_down = ctx.input(|i| i.key_down(egui::Key::Space));
    let keyboard_busy = ctx.wants_keyboard_input();

    for event in events {
        match event {
            egui::Event::PointerButton {
                pos,
                button,
                pressed,
                ..
            } => {
                match (button, pressed) {
                    (egui::PointerButton::Secondary, true) if rect.contains(pos) => {
                        app.is_panning = true;
                    }
                    (egui::PointerButton::Primary, true) if rect.contains(pos) => {
                        if space_down {
                            app.is_panning = true;
                        } else if response.hovered() {
                            app.session.pointer_down(local(pos));
                        }
                    }
                    (egui::PointerButton::Primary, false) => {
                        if app.session.pointer_up(Some(local(pos))) {
                            app.persist();
                        }
                        app.is_panning = false;
                    }
                    (egui::PointerButton::Secondary, false) => app.is_panning = false,
                    _ => {}
                }
                app.last_pointer = Some(pos);
            }

            egui::Event::PointerMoved(pos) => {
                if app.is_panning {
                    if let Some(last) = app.last_pointer {
                        let delta = pos - last;
                        app.session.pan(delta.x, delta.y);
                    }
                } else if app.session.is_drawing()
                    && drawing_move(&mut app.session, local(pos), rect.contains(pos))
                {
                    app.persist();
                }
                app.last_pointer = Some(pos);
            }

            egui::Event::PointerGone => {
                if app.session.pointer_leave() {
                    app.persist();
                }
                app.is_panning = false;
                app.last_pointer = None;
            }

            egui::Event::MouseWheel {
                unit,
                delta,
                modifiers,
            } => {
                let Some(pos) = app.last_pointer.filter(|p| rect.contains(*p)) else {
                    continue;
                };
                let step = match unit {
                    egui::MouseWheelUnit::Point => 1.0,
                    egui::MouseWheelUnit::Line => LINE_HEIGHT,
                    egui::MouseWheelUnit::Page => rect.height(),
                };
                // egui reports "content moves down" as positive
                app.session.wheel(WheelInput {
                    position: local(pos),
                    delta_x: -delta.x * step,
                    delta_y: -delta.y * step,
                    zoom: modifiers.ctrl || modifiers.command,
                });
            }

            egui::Event::Zoom(factor) => {
                if let Some(pos) = app.last_pointer.filter(|p| rect.contains(*p)) {
                    app.session.zoom_at(local(pos), factor);
                }
            }

            egui::Event::Key {
                key,
                pressed: true,
                modifiers,
                ..
            } if !keyboard_busy => handle_key(app, key, modifiers),

            _ => {}
        }
    }
}

fn handle_key(app: &mut PainterApp, key: egui::Key, modifiers: egui::Modifiers) {
    if modifiers.command {
        match key {
            egui::Key::Z if modifiers.shift => {
                app.session.redo();
            }
            egui::Key::Z => {
                app.session.undo();
            }
            egui::Key::Y => {
                app.session.redo();
            }
            egui::Key::S => save_dialog(app),
            _ => {}
        }
        return;
    }

    match key {
        egui::Key::M => {
            let on = app.session.toggle_symmetry();
            log::debug!("symmetry {}", if on { "on" } else { "off" });
        }
        egui::Key::F => {
            app.session.toggle_fill();
        }
        _ => {
            if let Some(tool) = shortcut(key).and_then(Tool::from_shortcut) {
                app.session.set_tool(tool);
            }
        }
    }
}

fn shortcut(key: egui::Key) -> Option<char> {
    Some(match key {
        egui::Key::B => 'b',
        egui::Key::N => 'n',
        egui::Key::V => 'v',
        egui::Key::E => 'e',
        egui::Key::R => 'r',
        egui::Key::O => 'o',
        _ => return None,
    })
}

/// Move the active stroke, or commit it once the pointer leaves the canvas.
/// Returns true when a stroke was committed.
fn drawing_move(session: &mut Session, pos: Vec2, inside: bool) -> bool {
    if inside {
        session.pointer_move(pos);
        false
    } else {
        session.pointer_leave()
    }
}
