use crate::api;
use eframe::egui;
use std::sync::Arc;
use tracing::warn;

mod actions;
mod find_lot;
mod geometry;
mod help;
mod net;
mod notice;
mod render;
mod session;
pub(crate) mod settings;
mod store;
mod update;
mod viewport;

#[cfg(test)]
mod tests_session;

/// Input buffer of the lot-number prompt shown after a polygon is finished.
#[derive(Default)]
struct LotPrompt {
    input: String,
    focused: bool,
}

pub struct LotMapApp {
    session: session::MapSession,
    settings: settings::MapSettings,
    settings_path: String,
    net: net::NetWorker,
    background: Option<egui::TextureHandle>,
    notices: notice::Notices,
    lot_prompt: Option<LotPrompt>,
    finder: find_lot::LotFinder,
    show_help: bool,
}

impl LotMapApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        settings_path: String,
        settings: settings::MapSettings,
    ) -> Self {
        let mut notices = notice::Notices::default();
        let backend: Arc<dyn api::RegionBackend> = match actions::build_backend(&settings) {
            Ok(backend) => backend,
            Err(e) => {
                warn!("error building API client: {e}");
                notices.error(format!("Error configuring API client: {e}"));
                Arc::new(api::Unconfigured::new(e.to_string()))
            }
        };
        let mut net = net::NetWorker::new(backend);
        net.set_repaint(cc.egui_ctx.clone());

        let mut app = Self {
            session: session::MapSession::new(settings.session_config()),
            settings,
            settings_path,
            net,
            background: None,
            notices,
            lot_prompt: None,
            finder: find_lot::LotFinder::default(),
            show_help: false,
        };
        app.reload_regions();
        app.load_background(&cc.egui_ctx);
        app
    }
}
