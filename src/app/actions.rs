use crate::api::{self, ApiClient, ApiError, RegionBackend};
use crate::model::ImageSize;
use eframe::egui;
use std::sync::Arc;
use tracing::{info, warn};

use super::net::{NetEvent, NetJob};
use super::session::{MapCommand, MapEvent, MapSession};
use super::{LotMapApp, LotPrompt, settings};

pub(super) fn build_backend(
    settings: &settings::MapSettings,
) -> Result<Arc<dyn RegionBackend>, ApiError> {
    let client = ApiClient::new(
        &settings.api_base_url,
        &settings.background_path,
        settings.request_timeout(),
    )?;
    Ok(Arc::new(client))
}

/// The prompt only lives while the session still waits for a lot number.
fn sync_lot_prompt(prompt: &mut Option<LotPrompt>, session: &MapSession) {
    if !session.awaiting_lot_number() {
        *prompt = None;
    }
}

impl LotMapApp {
    /// Feeds one event to the session and carries out whatever it asks for.
    pub(super) fn dispatch(&mut self, event: MapEvent) {
        if let Some(command) = self.session.handle(event) {
            self.apply_command(command);
        }
        sync_lot_prompt(&mut self.lot_prompt, &self.session);
    }

    fn apply_command(&mut self, command: MapCommand) {
        match command {
            MapCommand::RequestLotNumber => self.lot_prompt = Some(LotPrompt::default()),
            MapCommand::Upsert(payload) => {
                self.notices.info(format!("Saving lot {}…", payload.lot_number));
                self.net.spawn(NetJob::Upsert(payload));
            }
        }
    }

    pub(super) fn handle_net_event(&mut self, ctx: &egui::Context, event: NetEvent) {
        match event {
            NetEvent::RegionsLoaded(Ok(regions)) => {
                self.notices.info(format!("Loaded {} lot region(s)", regions.len()));
                self.dispatch(MapEvent::RegionsLoaded(regions));
            }
            NetEvent::RegionsLoaded(Err(e)) => {
                self.notices.error(format!("Error loading lot regions: {e}"));
            }
            NetEvent::RegionSaved {
                lot_number,
                result: Ok(()),
            } => {
                self.notices.info(format!("Lot {lot_number} saved"));
                self.dispatch(MapEvent::RegionSaved { lot_number });
            }
            NetEvent::RegionSaved {
                lot_number,
                result: Err(e),
            } => {
                self.notices.error(format!("Error saving lot {lot_number}: {e}"));
            }
            NetEvent::RegionRefreshed {
                result: Ok(Some(region)),
                ..
            } => {
                self.notices.info(format!("Lot {} refreshed", region.lot_number));
                self.dispatch(MapEvent::RegionRefreshed(region));
            }
            NetEvent::RegionRefreshed {
                lot_number,
                result: Ok(None),
            } => {
                self.notices.error(format!("Lot {lot_number} not found on the server"));
            }
            NetEvent::RegionRefreshed {
                lot_number,
                result: Err(e),
            } => {
                self.notices.error(format!("Error refreshing lot {lot_number}: {e}"));
            }
            NetEvent::BackgroundLoaded(Ok(image)) => self.install_background(ctx, image),
            NetEvent::BackgroundLoaded(Err(e)) => {
                self.notices.error(format!("Error loading background image: {e}"));
            }
        }
    }

    fn install_background(&mut self, ctx: &egui::Context, image: egui::ColorImage) {
        let size = ImageSize {
            width: image.size[0] as f32,
            height: image.size[1] as f32,
        };
        if !size.is_valid() {
            self.notices.error("Background image is empty");
            return;
        }
        self.background = Some(ctx.load_texture(
            "lot_map_background",
            image,
            egui::TextureOptions::LINEAR,
        ));
        self.dispatch(MapEvent::ImageReady(size));
    }

    pub(super) fn load_background(&mut self, ctx: &egui::Context) {
        match self.settings.local_background.clone() {
            Some(path) => self.load_local_background(ctx, &path),
            None => self.net.spawn(NetJob::FetchBackground),
        }
    }

    fn load_local_background(&mut self, ctx: &egui::Context, path: &str) {
        let decoded = std::fs::read(path)
            .map_err(ApiError::from)
            .and_then(|bytes| api::decode_background(&bytes));
        match decoded {
            Ok(image) => {
                info!(path, "background loaded from disk");
                self.install_background(ctx, image);
            }
            Err(e) => {
                warn!(path, "error loading local background: {e}");
                self.notices.error(format!("Error loading {path}: {e}"));
            }
        }
    }

    pub(super) fn open_background_dialog(&mut self, ctx: &egui::Context) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg"])
            .pick_file()
        {
            let path_str = path.display().to_string();
            self.settings.local_background = Some(path_str.clone());
            self.load_local_background(ctx, &path_str);
        }
    }

    pub(super) fn reload_regions(&mut self) {
        self.net.spawn(NetJob::LoadRegions);
    }

    pub(super) fn refresh_selected(&mut self) {
        if let Some(lot_number) = self.session.selected_lot_number() {
            let lot_number = lot_number.trim().to_string();
            if !lot_number.is_empty() {
                self.net.spawn(NetJob::RefreshRegion(lot_number));
            }
        }
    }

    pub(super) fn submit_lot_number(&mut self) {
        if let Some(prompt) = self.lot_prompt.take() {
            self.dispatch(MapEvent::LotNumberSubmitted(prompt.input));
        }
    }

    pub(super) fn cancel_lot_number(&mut self) {
        if self.lot_prompt.take().is_some() {
            self.dispatch(MapEvent::LotNumberCancelled);
        }
    }

    pub(super) fn persist_settings(&mut self) {
        match settings::save_settings(&self.settings_path, &self.settings) {
            Ok(()) => self.notices.info(format!("Saved {}", self.settings_path)),
            Err(e) => self.notices.error(format!("Settings save failed: {e}")),
        }
    }

    pub(super) fn reload_settings(&mut self, ctx: &egui::Context) {
        let settings = settings::load_settings(&self.settings_path)
            .or_else(|| settings::load_settings("settings.json"))
            .unwrap_or_default();
        let background_changed = settings.local_background != self.settings.local_background
            || settings.background_path != self.settings.background_path;
        self.session.set_config(settings.session_config());
        match build_backend(&settings) {
            Ok(backend) => self.net.set_backend(backend),
            Err(e) => {
                self.notices.error(format!("Error configuring API client: {e}"));
                self.net.set_backend(Arc::new(api::Unconfigured::new(e.to_string())));
            }
        }
        self.settings = settings;
        self.notices.info("Settings reloaded");
        self.reload_regions();
        if background_changed {
            self.load_background(ctx);
        }
    }
}
