use eframe::egui;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::session::SessionConfig;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    pub api_base_url: String,
    pub background_path: String,
    pub local_background: Option<String>,
    pub zoom_in_factor: f32,
    pub zoom_out_factor: f32,
    pub canvas_margin: [f32; 2],
    pub request_timeout_secs: u64,
    pub notice_seconds: f32,
    pub log_level: String,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000".to_string(),
            background_path: "/static/img/lot_map_bg.jpg".to_string(),
            local_background: None,
            zoom_in_factor: 1.2,
            zoom_out_factor: 0.8,
            canvas_margin: [40.0, 40.0],
            request_timeout_secs: 10,
            notice_seconds: 4.0,
            log_level: "info".to_string(),
        }
    }
}

impl MapSettings {
    pub fn session_config(&self) -> SessionConfig {
        let defaults = SessionConfig::default();
        SessionConfig {
            margin: egui::vec2(self.canvas_margin[0].max(0.0), self.canvas_margin[1].max(0.0)),
            zoom_in_factor: positive_or(self.zoom_in_factor, defaults.zoom_in_factor),
            zoom_out_factor: positive_or(self.zoom_out_factor, defaults.zoom_out_factor),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::try_from_secs_f32(positive_or(self.notice_seconds, 4.0))
            .unwrap_or(Duration::from_secs(4))
    }

    pub fn log_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

fn positive_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

pub(crate) fn config_path() -> Option<String> {
    if let Some(home) = std::env::var_os("HOME") {
        let path = std::path::PathBuf::from(home).join(".config").join("lotmap.toml");
        if path.exists() {
            return Some(path.display().to_string());
        }
    }
    if std::path::Path::new("settings.toml").exists() {
        return Some("settings.toml".to_string());
    }
    None
}

pub(crate) fn load_settings(path: &str) -> Option<MapSettings> {
    let s = std::fs::read_to_string(path).ok()?;
    parse_settings(path, &s)
}

fn parse_settings(path: &str, s: &str) -> Option<MapSettings> {
    if path.ends_with(".toml") {
        toml::from_str::<MapSettings>(s)
            .ok()
            .or_else(|| serde_json::from_str::<MapSettings>(s).ok())
    } else {
        serde_json::from_str::<MapSettings>(s)
            .ok()
            .or_else(|| toml::from_str::<MapSettings>(s).ok())
    }
}

pub(crate) fn save_settings(path: &str, settings: &MapSettings) -> Result<(), String> {
    if path.ends_with(".toml") {
        let toml = toml::to_string_pretty(settings).map_err(|e| e.to_string())?;
        std::fs::write(path, toml).map_err(|e| e.to_string())
    } else {
        let json = serde_json::to_string_pretty(settings).map_err(|e| e.to_string())?;
        std::fs::write(path, json).map_err(|e| e.to_string())
    }
}
