//! Gallery window: header with stats and search, grid/list/date layouts,
//! add/delete/share actions, and the viewers.

use crate::clock_player::ClockBackend;
use crate::platform::{DialogPicker, RevealShare, WindowChrome};
use crate::viewer::{self, VideoController};
use chrono::Local;
use eframe::egui::{self, Color32, RichText};
use galeria_core::config::AppConfig;
use galeria_core::error::StoreError;
use galeria_core::gallery::{self, ViewMode, ViewerTarget};
use galeria_core::library::{AppState, Library};
use galeria_core::media::{format_file_size, format_time, MediaRecord};
use galeria_core::notice::{Notice, Severity};
use galeria_core::picker::pick_media;
use galeria_core::playback::{event_channel, EventReceiver};
use galeria_core::store::MediaStore;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const TILE: f32 = 132.0;
const TOAST_TTL: Duration = Duration::from_secs(4);
const PLAYING_REPAINT: Duration = Duration::from_millis(100);

type SaveResult = Result<Vec<MediaRecord>, StoreError>;

/// Background copy job; the worker drops its result into the slot.
struct AddJob {
    slot: Arc<Mutex<Option<SaveResult>>>,
}

enum Viewer {
    Image(MediaRecord),
    Video,
}

pub struct GaleriaApp {
    library: Library,
    picker: DialogPicker,
    share: RevealShare,

    // Playback
    player: VideoController,
    player_events: EventReceiver,
    viewer: Option<Viewer>,

    // Gallery UI state
    view_mode: ViewMode,
    query: String,
    confirm_delete: Option<MediaRecord>,
    add_job: Option<AddJob>,
    toasts: Vec<(Notice, Instant)>,
    focused: bool,
}

impl GaleriaApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let mut visuals = egui::Visuals::dark();
        visuals.panel_fill = Color32::from_rgb(18, 18, 18);
        visuals.window_fill = Color32::from_rgb(24, 24, 24);
        visuals.selection.bg_fill = Color32::from_rgb(50, 100, 150);
        visuals.window_rounding = egui::Rounding::same(8.0);
        cc.egui_ctx.set_visuals(visuals);

        let mut library = Library::new(MediaStore::new(config.store));
        library.init();

        let (tx, rx) = event_channel();
        let player = VideoController::new(
            ClockBackend,
            WindowChrome::new(cc.egui_ctx.clone()),
            config.playback,
            tx,
        );

        let mut app = Self {
            library,
            picker: DialogPicker::default(),
            share: RevealShare,
            player,
            player_events: rx,
            viewer: None,
            view_mode: ViewMode::default(),
            query: String::new(),
            confirm_delete: None,
            add_job: None,
            toasts: Vec::new(),
            focused: true,
        };
        app.collect_notices();
        app
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    fn start_add(&mut self) {
        if self.add_job.is_some() {
            return;
        }

        let assets = match pick_media(&mut self.picker, self.library.notices()) {
            Ok(Some(assets)) => assets,
            Ok(None) => return,
            Err(e) => {
                self.library.report_pick_error(e);
                return;
            }
        };

        let slot = Arc::new(Mutex::new(None));
        let store = self.library.store().clone();
        let worker_slot = slot.clone();
        let spawned = thread::Builder::new()
            .name("media-save".into())
            .spawn(move || {
                let result = store.save(&assets);
                *worker_slot.lock() = Some(result);
            });

        match spawned {
            Ok(_) => self.add_job = Some(AddJob { slot }),
            Err(e) => {
                tracing::error!("Could not start save worker: {}", e);
                self.library
                    .notices()
                    .push(Notice::error("Error", "The files could not be added"));
            }
        }
    }

    fn poll_add_job(&mut self) {
        let Some(job) = &self.add_job else {
            return;
        };
        let Some(result) = job.slot.lock().take() else {
            return;
        };
        self.add_job = None;
        self.library.finish_add(result);
    }

    fn open(&mut self, record: &MediaRecord) {
        match gallery::open_target(record) {
            ViewerTarget::Video(video) => {
                self.player.bind(video.clone());
                self.viewer = Some(Viewer::Video);
            }
            ViewerTarget::Image(image) => {
                self.viewer = Some(Viewer::Image(image.clone()));
            }
        }
    }

    fn close_viewer(&mut self) {
        if matches!(self.viewer, Some(Viewer::Video)) {
            self.player.close();
        }
        self.viewer = None;
    }

    fn delete(&mut self, record: &MediaRecord) {
        let bound = self
            .player
            .session()
            .bound_media
            .as_ref()
            .is_some_and(|m| m.id == record.id);
        if bound {
            self.close_viewer();
        }
        if self.library.delete(&record.id) {
            self.library
                .notices()
                .push(Notice::info("Deleted", format!("{} was removed", record.filename)));
        }
    }

    fn share(&mut self, record: &MediaRecord) {
        self.library.share(&mut self.share, &record.id);
    }

    // ------------------------------------------------------------------
    // Per-frame plumbing
    // ------------------------------------------------------------------

    fn pump_player(&mut self) {
        while let Ok(event) = self.player_events.try_recv() {
            self.player.handle_event(event);
        }
        self.player.fire_due_timers();
    }

    fn collect_notices(&mut self) {
        let now = Instant::now();
        let fresh = self
            .library
            .take_notices()
            .into_iter()
            .chain(self.player.take_notices());
        self.toasts.extend(fresh.map(|notice| (notice, now)));
        self.toasts.retain(|(_, shown)| now.duration_since(*shown) < TOAST_TTL);
    }

    fn track_focus(&mut self, ctx: &egui::Context) {
        let focused = ctx.input(|i| i.focused);
        if focused == self.focused {
            return;
        }
        self.focused = focused;
        let state = if focused {
            AppState::Active
        } else {
            AppState::Inactive
        };
        self.library.on_app_state(state);
    }

    fn schedule_repaint(&self, ctx: &egui::Context) {
        if self.player.session().is_playing() || self.add_job.is_some() {
            ctx.request_repaint_after(PLAYING_REPAINT);
        }
        if let Some(deadline) = self.player.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(Instant::now()));
        }
        if !self.toasts.is_empty() {
            ctx.request_repaint_after(Duration::from_millis(500));
        }
    }

    // ------------------------------------------------------------------
    // Gallery rendering
    // ------------------------------------------------------------------

    fn header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header")
            .frame(
                egui::Frame::none()
                    .fill(Color32::from_rgb(25, 25, 28))
                    .inner_margin(egui::Margin::symmetric(12.0, 8.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Galeria");

                    let stats = self.library.stats();
                    ui.label(
                        RichText::new(format!(
                            "{} items • {} videos • {} photos • {}",
                            stats.total,
                            stats.videos,
                            stats.images,
                            format_file_size(stats.total_size)
                        ))
                        .color(Color32::from_gray(160)),
                    );

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let adding = self.add_job.is_some();
                        if ui
                            .add_enabled(!adding, egui::Button::new("＋ Add"))
                            .clicked()
                        {
                            self.start_add();
                        }
                        if adding {
                            ui.spinner();
                        }

                        ui.separator();
                        ui.selectable_value(&mut self.view_mode, ViewMode::Date, "By date");
                        ui.selectable_value(&mut self.view_mode, ViewMode::List, "List");
                        ui.selectable_value(&mut self.view_mode, ViewMode::Grid, "Grid");
                        ui.separator();

                        ui.add(
                            egui::TextEdit::singleline(&mut self.query)
                                .hint_text("Search by name or date")
                                .desired_width(220.0),
                        );
                    });
                });
            });
    }

    fn body(&mut self, ctx: &egui::Context) {
        let mut opened: Option<MediaRecord> = None;
        let mut action: Option<(TileAction, MediaRecord)> = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            let items = gallery::filter(self.library.items(), &self.query, &Local);

            if items.is_empty() {
                ui.centered_and_justified(|ui| {
                    let text = if self.library.items().is_empty() {
                        "Your gallery is empty\nUse ＋ Add to import photos and videos"
                    } else {
                        "No results"
                    };
                    ui.heading(RichText::new(text).color(Color32::GRAY));
                });
                return;
            }

            egui::ScrollArea::vertical().show(ui, |ui| match self.view_mode {
                ViewMode::Grid => {
                    tile_grid(ui, &items, &mut opened, &mut action);
                }
                ViewMode::List => {
                    for item in &items {
                        list_row(ui, item, &mut opened, &mut action);
                    }
                }
                ViewMode::Date => {
                    let today = Local::now().date_naive();
                    for section in gallery::group_by_date(&items, today, &Local) {
                        ui.add_space(8.0);
                        ui.label(RichText::new(section.label.to_string()).strong().size(16.0));
                        tile_grid(ui, &section.items, &mut opened, &mut action);
                    }
                }
            });
        });

        if let Some(record) = opened {
            self.open(&record);
        }
        match action {
            Some((TileAction::Share, record)) => self.share(&record),
            Some((TileAction::Delete, record)) => self.confirm_delete = Some(record),
            None => {}
        }
    }

    fn delete_dialog(&mut self, ctx: &egui::Context) {
        let Some(record) = self.confirm_delete.clone() else {
            return;
        };

        let mut decision = None;
        egui::Window::new("Delete file")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(format!(
                    "Are you sure you want to delete {}?",
                    record.filename
                ));
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        decision = Some(false);
                    }
                    let delete = egui::Button::new(RichText::new("Delete").color(Color32::WHITE))
                        .fill(Color32::from_rgb(170, 50, 50));
                    if ui.add(delete).clicked() {
                        decision = Some(true);
                    }
                });
            });

        match decision {
            Some(true) => {
                self.confirm_delete = None;
                self.delete(&record);
            }
            Some(false) => self.confirm_delete = None,
            None => {}
        }
    }

    fn toasts(&self, ctx: &egui::Context) {
        if self.toasts.is_empty() {
            return;
        }
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-16.0, -16.0))
            .show(ctx, |ui| {
                for (notice, _) in &self.toasts {
                    let accent = match notice.severity {
                        Severity::Info => Color32::from_rgb(80, 140, 200),
                        Severity::Warning => Color32::from_rgb(210, 160, 60),
                        Severity::Error => Color32::from_rgb(200, 70, 70),
                    };
                    egui::Frame::popup(ui.style())
                        .stroke(egui::Stroke::new(1.0, accent))
                        .show(ui, |ui| {
                            ui.label(RichText::new(&notice.title).strong().color(accent));
                            ui.label(notice.message.as_str());
                        });
                }
            });
    }
}

impl eframe::App for GaleriaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.track_focus(ctx);
        self.poll_add_job();
        self.pump_player();

        match &self.viewer {
            Some(Viewer::Image(record)) => {
                if viewer::image_viewer(ctx, record) {
                    self.close_viewer();
                }
            }
            Some(Viewer::Video) => {
                if viewer::video_viewer(ctx, &mut self.player) {
                    self.close_viewer();
                }
            }
            None => {
                self.header(ctx);
                self.body(ctx);
                self.delete_dialog(ctx);
            }
        }

        self.collect_notices();
        self.toasts(ctx);
        self.schedule_repaint(ctx);
    }
}

// ============================================================================
// Tiles and rows
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum TileAction {
    Share,
    Delete,
}

fn context_menu(
    response: &egui::Response,
    record: &MediaRecord,
    action: &mut Option<(TileAction, MediaRecord)>,
) {
    response.context_menu(|ui| {
        if ui.button("Share").clicked() {
            *action = Some((TileAction::Share, record.clone()));
            ui.close_menu();
        }
        if ui.button("Delete").clicked() {
            *action = Some((TileAction::Delete, record.clone()));
            ui.close_menu();
        }
    });
}

fn tile_grid(
    ui: &mut egui::Ui,
    items: &[&MediaRecord],
    opened: &mut Option<MediaRecord>,
    action: &mut Option<(TileAction, MediaRecord)>,
) {
    ui.horizontal_wrapped(|ui| {
        for item in items {
            let response = tile(ui, item);
            if response.clicked() {
                *opened = Some((*item).clone());
            }
            context_menu(&response, item, action);
        }
    });
}

fn tile(ui: &mut egui::Ui, record: &MediaRecord) -> egui::Response {
    let size = egui::vec2(TILE, TILE);
    let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click());
    ui.painter()
        .rect_filled(rect, 6.0, Color32::from_rgb(35, 35, 38));

    if record.is_video() {
        ui.painter().text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            "▶",
            egui::FontId::proportional(36.0),
            Color32::from_gray(200),
        );
        if let Some(duration) = record.duration_ms {
            ui.painter().text(
                rect.right_bottom() - egui::vec2(6.0, 6.0),
                egui::Align2::RIGHT_BOTTOM,
                format_time(duration),
                egui::FontId::proportional(12.0),
                Color32::WHITE,
            );
        }
    } else {
        egui::Image::new(format!("file://{}", record.uri()))
            .rounding(6.0)
            .fit_to_exact_size(size)
            .paint_at(ui, rect);
    }

    if response.hovered() {
        ui.painter()
            .rect_stroke(rect, 6.0, egui::Stroke::new(2.0, Color32::from_rgb(80, 140, 200)));
    }
    response.on_hover_text(record.filename.as_str())
}

fn list_row(
    ui: &mut egui::Ui,
    record: &MediaRecord,
    opened: &mut Option<MediaRecord>,
    action: &mut Option<(TileAction, MediaRecord)>,
) {
    let row = ui.horizontal(|ui| {
        let icon = if record.is_video() { "🎞" } else { "🖼" };
        ui.label(RichText::new(icon).size(22.0));
        ui.vertical(|ui| {
            ui.label(RichText::new(&record.filename).strong());
            ui.label(
                RichText::new(gallery::list_subtitle(record, &Local))
                    .small()
                    .color(Color32::from_gray(150)),
            );
        });
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("🗑").on_hover_text("Delete").clicked() {
                *action = Some((TileAction::Delete, record.clone()));
            }
            if ui.button("↗").on_hover_text("Share").clicked() {
                *action = Some((TileAction::Share, record.clone()));
            }
            ui.label(format_file_size(record.file_size));
        });
    });

    let response = row.response.interact(egui::Sense::click());
    if response.clicked() {
        *opened = Some(record.clone());
    }
    ui.separator();
}
