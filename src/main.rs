mod api;
mod app;
mod model;

use app::settings;

fn main() -> eframe::Result<()> {
    let settings_path = settings::config_path().unwrap_or_else(|| "settings.toml".to_string());
    let map_settings = settings::load_settings(&settings_path)
        .or_else(|| settings::load_settings("settings.json"))
        .unwrap_or_default();

    let _ = tracing_subscriber::fmt()
        .with_max_level(map_settings.log_level())
        .try_init();
    tracing::info!(path = %settings_path, api = %map_settings.api_base_url, "starting lot map");

    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_title("Lot Map"),
        ..Default::default()
    };
    eframe::run_native(
        "Lot Map",
        native_options,
        Box::new(|cc| Ok(Box::new(app::LotMapApp::new(cc, settings_path, map_settings)))),
    )
}
