use eframe::egui;

pub(super) fn draw_help_window(ctx: &egui::Context, open: &mut bool) {
    egui::Window::new("Lot Map Controls")
        .open(open)
        .resizable(true)
        .default_width(520.0)
        .default_height(420.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Keyboard Shortcuts");
                ui.separator();

                help_row(ui, "E", "Toggle view / editor mode");
                help_row(ui, "+ / =", "Zoom in");
                help_row(ui, "-", "Zoom out");
                help_row(ui, "0", "Reset zoom and pan");
                help_row(ui, "Escape", "Discard the drawing (editor) or close the lot (view)");
                help_row(ui, "⌘F", "Find a lot by number or owner");
                help_row(ui, "F1", "Show this window");

                ui.add_space(10.0);
                ui.heading("View Mode");
                ui.separator();
                help_row(ui, "Click", "Select a lot and open its details");
                help_row(ui, "Drag", "Pan the map");
                help_row(ui, "Arrow keys", "Pan the map (Shift for larger steps)");
                help_row(ui, "Scroll wheel", "Zoom in/out");

                ui.add_space(10.0);
                ui.heading("Editor Mode");
                ui.separator();
                help_row(ui, "Click", "Add a boundary point");
                help_row(ui, "Double-click", "Finish the region (3+ points)");
                ui.label("After finishing, enter the lot number. Leaving it empty discards the drawing.");

                ui.add_space(20.0);
                ui.heading("Settings");
                ui.separator();
                ui.label("Settings are read from ~/.config/lotmap.toml or settings.toml:");
                ui.add_space(5.0);
                ui.code(r##"api_base_url = "http://127.0.0.1:5000"
background_path = "/static/img/lot_map_bg.jpg"
zoom_in_factor = 1.2
zoom_out_factor = 0.8
canvas_margin = [40.0, 40.0]
notice_seconds = 4.0
log_level = "info""##);
                ui.add_space(5.0);
                ui.label("Set local_background to a file path to skip downloading the map image.");
            });
        });
}

fn help_row(ui: &mut egui::Ui, shortcut: &str, description: &str) {
    ui.horizontal(|ui| {
        ui.add_sized([100.0, 16.0], egui::Label::new(
            egui::RichText::new(shortcut).monospace().strong()
        ));
        ui.label(description);
    });
}
