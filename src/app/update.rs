use eframe::egui;
use std::time::Instant;

use super::LotMapApp;
use super::notice::NoticeLevel;
use super::render::{MapScene, draw_map};
use super::session::{MapEvent, Mode};

const PAN_STEP: f32 = 20.0;
const PAN_STEP_FAST: f32 = 80.0;
const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(220, 80, 60);

impl eframe::App for LotMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        for event in self.net.drain() {
            self.handle_net_event(ctx, event);
        }
        if self.notices.expire(Instant::now(), self.settings.notice_ttl()) {
            ctx.request_repaint_after(std::time::Duration::from_millis(250));
        }

        self.handle_shortcuts(ctx);
        self.top_bar(ctx);
        self.status_bar(ctx);
        self.region_panel(ctx);
        self.canvas(ctx);
        self.lot_prompt_window(ctx);

        if let Some(index) = self.finder.ui(ctx, self.session.store().regions()) {
            self.dispatch(MapEvent::SelectLot(index));
        }
        super::help::draw_help_window(ctx, &mut self.show_help);
    }
}

impl LotMapApp {
    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let skip_shortcuts =
            ctx.wants_keyboard_input() || self.finder.open || self.lot_prompt.is_some();
        let mut events = Vec::new();
        ctx.input_mut(|i| {
            if i.consume_key(egui::Modifiers::NONE, egui::Key::F1) {
                self.show_help = true;
            }
            if skip_shortcuts {
                return;
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::F) {
                if self.session.mode() == Mode::View {
                    self.finder.open();
                }
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::E) {
                events.push(MapEvent::ToggleMode);
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::Plus)
                || i.consume_key(egui::Modifiers::NONE, egui::Key::Equals)
            {
                events.push(MapEvent::ZoomIn);
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::Minus) {
                events.push(MapEvent::ZoomOut);
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::Num0) {
                events.push(MapEvent::ResetZoom);
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::Escape) {
                events.push(MapEvent::Cancel);
            }
            let step = if i.modifiers.shift { PAN_STEP_FAST } else { PAN_STEP };
            for (key, delta) in [
                (egui::Key::ArrowLeft, egui::vec2(step, 0.0)),
                (egui::Key::ArrowRight, egui::vec2(-step, 0.0)),
                (egui::Key::ArrowUp, egui::vec2(0.0, step)),
                (egui::Key::ArrowDown, egui::vec2(0.0, -step)),
            ] {
                if i.consume_key(egui::Modifiers::NONE, key)
                    || i.consume_key(egui::Modifiers::SHIFT, key)
                {
                    events.push(MapEvent::Pan(delta));
                }
            }
        });
        for event in events {
            self.dispatch(event);
        }
    }

    fn top_bar(&mut self, ctx: &egui::Context) {
        let mut events = Vec::new();
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("Map", |ui| {
                    if ui.button("Reload regions").clicked() {
                        self.reload_regions();
                        ui.close_menu();
                    }
                    if ui.button("Open background image...").clicked() {
                        self.open_background_dialog(ctx);
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(
                            self.settings.local_background.is_some(),
                            egui::Button::new("Use server background"),
                        )
                        .clicked()
                    {
                        self.settings.local_background = None;
                        self.load_background(ctx);
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Reload settings").clicked() {
                        self.reload_settings(ctx);
                        ui.close_menu();
                    }
                    if ui.button("Save settings").clicked() {
                        self.persist_settings();
                        ui.close_menu();
                    }
                });
                ui.menu_button("View", |ui| {
                    if ui.button("Zoom in (+)").clicked() {
                        events.push(MapEvent::ZoomIn);
                        ui.close_menu();
                    }
                    if ui.button("Zoom out (-)").clicked() {
                        events.push(MapEvent::ZoomOut);
                        ui.close_menu();
                    }
                    if ui.button("Reset zoom (0)").clicked() {
                        events.push(MapEvent::ResetZoom);
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui
                        .add_enabled(
                            self.session.mode() == Mode::View,
                            egui::Button::new("Find lot... (⌘F)"),
                        )
                        .clicked()
                    {
                        self.finder.open();
                        ui.close_menu();
                    }
                });
                ui.menu_button("Help", |ui| {
                    if ui.button("Controls (F1)").clicked() {
                        self.show_help = true;
                        ui.close_menu();
                    }
                });

                ui.separator();
                let editing = self.session.mode() == Mode::Editor;
                let label = if editing { "Editor mode" } else { "View mode" };
                if ui
                    .selectable_label(editing, label)
                    .on_hover_text("Toggle editor mode (E)")
                    .clicked()
                {
                    events.push(MapEvent::ToggleMode);
                }
                if self.net.in_flight() > 0 {
                    ui.spinner();
                }

                ui.separator();
                let mut dismissed = None;
                for (idx, notice) in self.notices.items().iter().enumerate() {
                    match notice.level {
                        NoticeLevel::Info => {
                            ui.label(&notice.message);
                        }
                        NoticeLevel::Error => {
                            ui.colored_label(ERROR_COLOR, &notice.message);
                            if ui.small_button("✕").clicked() {
                                dismissed = Some(idx);
                            }
                        }
                    }
                }
                if let Some(idx) = dismissed {
                    self.notices.dismiss(idx);
                }
            });
        });
        for event in events {
            self.dispatch(event);
        }
    }

    fn status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let hint = match self.session.mode() {
                    Mode::Editor if self.session.awaiting_lot_number() => "Enter a lot number for the new region",
                    Mode::Editor => "Click to add points, double-click to finish the region",
                    Mode::View => "Click a lot to edit it, drag to pan",
                };
                ui.label(hint);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if let Some(vp) = self.session.viewport() {
                        ui.label(format!("Scale: {:.2}", vp.scale));
                        ui.separator();
                    }
                    ui.label(format!("Lots: {}", self.session.store().len()));
                    if let Some(points) = self.session.draft() {
                        ui.separator();
                        ui.label(format!("Points: {}", points.len()));
                    }
                });
            });
        });
    }

    /// Always shown so opening a lot does not resize the canvas and refit
    /// the map.
    fn region_panel(&mut self, ctx: &egui::Context) {
        let mut save = false;
        let mut refresh = false;
        let mut close = false;
        egui::SidePanel::right("right_panel")
            .resizable(true)
            .min_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Lot details");
                ui.separator();
                let hint = match self.session.mode() {
                    Mode::View => "Select a lot on the map or press ⌘F to find one.",
                    Mode::Editor => "Switch to view mode to edit lot details.",
                };
                let Some(form) = self.session.panel_mut() else {
                    ui.weak(hint);
                    return;
                };
                egui::Grid::new("region_form")
                    .num_columns(2)
                    .spacing([8.0, 6.0])
                    .show(ui, |ui| {
                        ui.label("Lot number");
                        ui.text_edit_singleline(&mut form.lot_number);
                        ui.end_row();
                        ui.label("Owner");
                        ui.text_edit_singleline(&mut form.owner_name);
                        ui.end_row();
                        ui.label("Label X");
                        ui.text_edit_singleline(&mut form.label_x);
                        ui.end_row();
                        ui.label("Label Y");
                        ui.text_edit_singleline(&mut form.label_y);
                        ui.end_row();
                    });
                ui.separator();
                ui.horizontal(|ui| {
                    save = ui.button("Save").clicked();
                    refresh = ui
                        .button("Refresh")
                        .on_hover_text("Reload this lot from the server")
                        .clicked();
                    close = ui.button("Cancel").clicked();
                });
            });
        if save {
            self.dispatch(MapEvent::SaveRegion);
        }
        if refresh {
            self.refresh_selected();
        }
        if close {
            self.dispatch(MapEvent::CloseEditor);
        }
    }

    fn canvas(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let (rect, response) =
                    ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
                self.dispatch(MapEvent::ContainerResized(rect));

                let scroll_delta = ctx.input(|i| i.raw_scroll_delta.y);
                if scroll_delta.abs() > 0.0 && self.session.mode() == Mode::View {
                    if let Some(hover_pos) = ctx.input(|i| i.pointer.hover_pos()) {
                        if rect.contains(hover_pos) {
                            let cfg = self.settings.session_config();
                            let factor = (1.0 + scroll_delta * 0.001)
                                .clamp(cfg.zoom_out_factor.min(1.0), cfg.zoom_in_factor.max(1.0));
                            self.dispatch(MapEvent::Zoom(factor));
                        }
                    }
                }

                let pointer = response.interact_pointer_pos();
                if response.drag_started() {
                    // Anchor at the press, not where the drag threshold was crossed.
                    let origin = ctx.input(|i| i.pointer.press_origin()).or(pointer);
                    if let Some(pos) = origin {
                        self.dispatch(MapEvent::PointerDown(pos));
                    }
                }
                if response.dragged() {
                    if let Some(pos) = pointer {
                        self.dispatch(MapEvent::PointerMove(pos));
                    }
                }
                if response.drag_stopped() {
                    self.dispatch(MapEvent::PointerUp);
                }
                // The second press of a double-click only finishes the polygon.
                if response.double_clicked() {
                    if let Some(pos) = pointer {
                        self.dispatch(MapEvent::DoubleClick(pos));
                    }
                } else if response.clicked() {
                    if let Some(pos) = pointer {
                        self.dispatch(MapEvent::Click(pos));
                    }
                }

                let painter = ui.painter_at(rect);
                draw_map(
                    &painter,
                    rect,
                    &MapScene {
                        viewport: self.session.viewport(),
                        image_size: self.session.image_size(),
                        background: self.background.as_ref(),
                        regions: self.session.store().regions(),
                        selected: self.session.selected(),
                        draft: self.session.draft(),
                    },
                );

                let cursor = match self.session.mode() {
                    Mode::Editor => egui::CursorIcon::Crosshair,
                    Mode::View if self.session.is_panning() => egui::CursorIcon::Grabbing,
                    Mode::View => egui::CursorIcon::Grab,
                };
                if response.hovered() {
                    ctx.set_cursor_icon(cursor);
                }
            });
    }

    fn lot_prompt_window(&mut self, ctx: &egui::Context) {
        let Some(prompt) = self.lot_prompt.as_mut() else {
            return;
        };
        let mut submit = false;
        let mut cancel = ctx.input(|i| i.key_pressed(egui::Key::Escape));
        egui::Window::new("New lot region")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label("Lot number for this region:");
                let resp = ui.add(
                    egui::TextEdit::singleline(&mut prompt.input)
                        .desired_width(200.0)
                        .hint_text("e.g. 42"),
                );
                if !prompt.focused {
                    resp.request_focus();
                    prompt.focused = true;
                }
                if resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    submit = true;
                }
                ui.horizontal(|ui| {
                    submit |= ui.button("OK").clicked();
                    cancel |= ui.button("Cancel").clicked();
                });
            });
        if submit {
            self.submit_lot_number();
        } else if cancel {
            self.cancel_lot_number();
        }
    }
}
