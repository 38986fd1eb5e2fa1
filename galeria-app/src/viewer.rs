//! Full-window viewers: a plain image viewer and the video viewer with its
//! transport overlay.

use crate::clock_player::ClockBackend;
use crate::platform::WindowChrome;
use eframe::egui::{self, Align2, Color32, RichText};
use galeria_core::media::{format_time, MediaRecord};
use galeria_core::playback::{PlaybackController, PlaybackRate, PlaybackSession, PlayerState};

pub type VideoController = PlaybackController<ClockBackend, WindowChrome>;

const OVERLAY: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 170);
const ACCENT: Color32 = Color32::from_rgb(80, 140, 200);

fn icon_button(ui: &mut egui::Ui, icon: &str, size: f32) -> egui::Response {
    ui.add(
        egui::Button::new(RichText::new(icon).size(size).color(Color32::WHITE))
            .fill(Color32::TRANSPARENT),
    )
}

// ============================================================================
// Image viewer
// ============================================================================

/// Returns true when the user asked to close.
pub fn image_viewer(ctx: &egui::Context, record: &MediaRecord) -> bool {
    let mut close = ctx.input(|i| i.key_pressed(egui::Key::Escape));

    egui::CentralPanel::default()
        .frame(egui::Frame::none().fill(Color32::BLACK))
        .show(ctx, |ui| {
            let rect = ui.max_rect();
            ui.put(
                rect.shrink(16.0),
                egui::Image::new(format!("file://{}", record.uri()))
                    .maintain_aspect_ratio(true)
                    .shrink_to_fit(),
            );

            let header = egui::Rect::from_min_size(rect.min, egui::vec2(rect.width(), 40.0));
            ui.allocate_new_ui(egui::UiBuilder::new().max_rect(header), |ui| {
                ui.horizontal(|ui| {
                    if icon_button(ui, "✕", 20.0).clicked() {
                        close = true;
                    }
                    ui.label(RichText::new(&record.filename).color(Color32::WHITE));
                });
            });
        });

    close
}

// ============================================================================
// Video viewer
// ============================================================================

/// Renders the bound session and forwards input to the controller.
/// Returns true when the user asked to close.
pub fn video_viewer(ctx: &egui::Context, controller: &mut VideoController) -> bool {
    let session = controller.session().clone();
    let mut close = false;

    handle_keys(ctx, controller, &session, &mut close);

    egui::CentralPanel::default()
        .frame(egui::Frame::none().fill(Color32::BLACK))
        .show(ctx, |ui| {
            let rect = ui.max_rect();

            // Tapping the picture toggles the overlay.
            let surface = ui.interact(rect, ui.id().with("surface"), egui::Sense::click());
            if surface.clicked() {
                controller.toggle_controls_visibility();
            }

            paint_poster(ui, rect, &session);

            match session.player_state {
                PlayerState::Loading => {
                    ui.put(
                        egui::Rect::from_center_size(rect.center(), egui::vec2(48.0, 48.0)),
                        egui::Spinner::new().size(40.0).color(Color32::WHITE),
                    );
                }
                PlayerState::Error => error_panel(ui, rect, controller, &session),
                _ => {}
            }

            if session.controls_visible {
                if top_bar(ui, rect, controller, &session) {
                    close = true;
                }
                if session.player_state.has_clock() {
                    center_controls(ui, rect, controller, &session);
                    bottom_bar(ui, rect, controller, &session);
                }
            }

            if session.volume_indicator_visible {
                volume_indicator(ui, rect, &session);
            }
        });

    close
}

struct Keys {
    play_pause: bool,
    forward: bool,
    backward: bool,
    louder: bool,
    quieter: bool,
    mute: bool,
    fullscreen: bool,
    escape: bool,
}

/// Keys are read first and applied after the input lock is released, since
/// fullscreen sends viewport commands.
fn handle_keys(
    ctx: &egui::Context,
    controller: &mut VideoController,
    session: &PlaybackSession,
    close: &mut bool,
) {
    let keys = ctx.input(|i| Keys {
        play_pause: i.key_pressed(egui::Key::Space),
        forward: i.key_pressed(egui::Key::ArrowRight),
        backward: i.key_pressed(egui::Key::ArrowLeft),
        louder: i.key_pressed(egui::Key::ArrowUp),
        quieter: i.key_pressed(egui::Key::ArrowDown),
        mute: i.key_pressed(egui::Key::M),
        fullscreen: i.key_pressed(egui::Key::F),
        escape: i.key_pressed(egui::Key::Escape),
    });

    if keys.play_pause {
        controller.toggle_play_pause();
    }
    if keys.forward {
        controller.skip_forward();
    }
    if keys.backward {
        controller.skip_backward();
    }
    if keys.louder {
        controller.set_volume(session.volume + 0.1);
    }
    if keys.quieter {
        controller.set_volume(session.volume - 0.1);
    }
    if keys.mute {
        controller.toggle_mute();
    }
    if keys.fullscreen {
        controller.toggle_fullscreen();
    }
    if keys.escape {
        if session.fullscreen {
            controller.toggle_fullscreen();
        } else {
            *close = true;
        }
    }
}

fn paint_poster(ui: &egui::Ui, rect: egui::Rect, session: &PlaybackSession) {
    let Some(media) = &session.bound_media else {
        return;
    };
    ui.painter().text(
        rect.center() + egui::vec2(0.0, 60.0),
        Align2::CENTER_CENTER,
        &media.filename,
        egui::FontId::proportional(16.0),
        Color32::from_gray(120),
    );
}

fn error_panel(
    ui: &mut egui::Ui,
    rect: egui::Rect,
    controller: &mut VideoController,
    session: &PlaybackSession,
) {
    let panel = egui::Rect::from_center_size(rect.center(), egui::vec2(320.0, 120.0));
    ui.allocate_new_ui(egui::UiBuilder::new().max_rect(panel), |ui| {
        ui.vertical_centered(|ui| {
            ui.label(
                RichText::new("The video could not be played")
                    .size(18.0)
                    .color(Color32::WHITE),
            );
            if let Some(message) = &session.error {
                ui.label(RichText::new(message).color(Color32::from_gray(160)));
            }
            ui.add_space(8.0);
            if ui.button("Retry").clicked() {
                controller.retry();
            }
        });
    });
}

/// Close button, file name and fullscreen toggle. True when close was
/// clicked.
fn top_bar(
    ui: &mut egui::Ui,
    rect: egui::Rect,
    controller: &mut VideoController,
    session: &PlaybackSession,
) -> bool {
    let bar = egui::Rect::from_min_size(rect.min, egui::vec2(rect.width(), 44.0));
    ui.painter().rect_filled(bar, 0.0, OVERLAY);

    let mut close = false;
    ui.allocate_new_ui(egui::UiBuilder::new().max_rect(bar.shrink(6.0)), |ui| {
        ui.horizontal_centered(|ui| {
            if icon_button(ui, "✕", 20.0).clicked() {
                close = true;
            }
            if let Some(media) = &session.bound_media {
                ui.label(RichText::new(&media.filename).color(Color32::WHITE));
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let icon = if session.fullscreen { "🗗" } else { "⛶" };
                if icon_button(ui, icon, 18.0).clicked() {
                    controller.toggle_fullscreen();
                }
            });
        });
    });
    close
}

fn center_controls(
    ui: &mut egui::Ui,
    rect: egui::Rect,
    controller: &mut VideoController,
    session: &PlaybackSession,
) {
    let area = egui::Rect::from_center_size(rect.center(), egui::vec2(260.0, 72.0));
    ui.allocate_new_ui(egui::UiBuilder::new().max_rect(area), |ui| {
        ui.horizontal_centered(|ui| {
            ui.spacing_mut().item_spacing.x = 24.0;
            if icon_button(ui, "⏪", 28.0).clicked() {
                controller.skip_backward();
            }

            if session.at_end() {
                if icon_button(ui, "⟲", 40.0).clicked() {
                    controller.replay();
                }
            } else {
                let icon = if session.is_playing() { "⏸" } else { "▶" };
                if icon_button(ui, icon, 40.0).clicked() {
                    controller.toggle_play_pause();
                }
            }

            if icon_button(ui, "⏩", 28.0).clicked() {
                controller.skip_forward();
            }
        });
    });
}

fn bottom_bar(
    ui: &mut egui::Ui,
    rect: egui::Rect,
    controller: &mut VideoController,
    session: &PlaybackSession,
) {
    let height = if session.speed_menu_open { 96.0 } else { 64.0 };
    let bar = egui::Rect::from_min_max(
        egui::pos2(rect.min.x, rect.max.y - height),
        rect.max,
    );
    ui.painter().rect_filled(bar, 0.0, OVERLAY);

    ui.allocate_new_ui(egui::UiBuilder::new().max_rect(bar.shrink2(egui::vec2(16.0, 6.0))), |ui| {
        ui.style_mut().visuals.selection.bg_fill = ACCENT;

        // Seek bar
        let mut position = session.position_ms as f64;
        let max = session.duration_ms.max(1) as f64;
        ui.spacing_mut().slider_width = ui.available_width();
        let slider = egui::Slider::new(&mut position, 0.0..=max).show_value(false);
        let response = ui.add_enabled(session.can_seek(), slider);
        if response.changed() {
            controller.seek(position as i64);
        }

        ui.horizontal(|ui| {
            ui.label(
                RichText::new(format!(
                    "{} / {}",
                    format_time(session.position_ms),
                    format_time(session.duration_ms)
                ))
                .size(13.0)
                .color(Color32::from_gray(200)),
            );

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if icon_button(ui, &session.rate.to_string(), 14.0).clicked() {
                    controller.toggle_speed_menu();
                }

                let mut volume = session.volume;
                ui.spacing_mut().slider_width = 90.0;
                if ui
                    .add(egui::Slider::new(&mut volume, 0.0..=1.0).show_value(false))
                    .changed()
                {
                    controller.set_volume(volume);
                }

                let icon = if session.muted || session.volume == 0.0 {
                    "🔇"
                } else if session.volume < 0.5 {
                    "🔉"
                } else {
                    "🔊"
                };
                if icon_button(ui, icon, 16.0).clicked() {
                    controller.toggle_mute();
                }
            });
        });

        if session.speed_menu_open {
            ui.horizontal(|ui| {
                for rate in PlaybackRate::ALL {
                    let selected = rate == session.rate;
                    if ui.selectable_label(selected, rate.to_string()).clicked() {
                        controller.set_rate(rate);
                    }
                }
            });
        }
    });
}

fn volume_indicator(ui: &egui::Ui, rect: egui::Rect, session: &PlaybackSession) {
    let text = if session.muted {
        "Muted".to_string()
    } else {
        format!("Volume {:.0}%", session.volume * 100.0)
    };
    let pill = egui::Rect::from_center_size(
        egui::pos2(rect.center().x, rect.min.y + 80.0),
        egui::vec2(140.0, 32.0),
    );
    ui.painter().rect_filled(pill, 16.0, OVERLAY);
    ui.painter().text(
        pill.center(),
        Align2::CENTER_CENTER,
        text,
        egui::FontId::proportional(14.0),
        Color32::WHITE,
    );
}
