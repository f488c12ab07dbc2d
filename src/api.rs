use crate::model::{LotRegion, RegionPayload, SaveResponse};
use eframe::egui;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use std::time::Duration;
use thiserror::Error;

const REGIONS_PATH: &str = "/api/lot-map/regions";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server responded with {status}: {message}")]
    Status { status: u16, message: String },
    #[error("server rejected the request: {0}")]
    Rejected(String),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("API client unavailable: {0}")]
    Unconfigured(String),
}

/// The REST collaborator that owns lot regions durably.
pub trait RegionBackend: Send + Sync {
    fn list_regions(&self) -> Result<Vec<LotRegion>, ApiError>;
    fn upsert_region(&self, payload: &RegionPayload) -> Result<(), ApiError>;
    fn fetch_region(&self, lot_number: &str) -> Result<Option<LotRegion>, ApiError>;
    fn fetch_background(&self) -> Result<Vec<u8>, ApiError>;
}

pub struct ApiClient {
    client: Client,
    base_url: String,
    background_path: String,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        background_path: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            background_path: background_path.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

impl RegionBackend for ApiClient {
    fn list_regions(&self) -> Result<Vec<LotRegion>, ApiError> {
        let response = self.client.get(self.url(REGIONS_PATH)).send()?;
        let body = ensure_success(response)?.text()?;
        Ok(serde_json::from_str(&body)?)
    }

    fn upsert_region(&self, payload: &RegionPayload) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url(REGIONS_PATH))
            .json(payload)
            .send()?;
        let body = ensure_success(response)?.text()?;
        check_envelope(&body)
    }

    fn fetch_region(&self, lot_number: &str) -> Result<Option<LotRegion>, ApiError> {
        let path = format!("{}/{}", REGIONS_PATH, encode_path_segment(lot_number));
        let response = self.client.get(self.url(&path)).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = ensure_success(response)?.text()?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    fn fetch_background(&self) -> Result<Vec<u8>, ApiError> {
        let response = self.client.get(self.url(&self.background_path)).send()?;
        Ok(ensure_success(response)?.bytes()?.to_vec())
    }
}

/// Stands in when the HTTP client could not be built, so every call fails
/// with the original reason instead of the app refusing to start.
pub struct Unconfigured {
    reason: String,
}

impl Unconfigured {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn fail<T>(&self) -> Result<T, ApiError> {
        Err(ApiError::Unconfigured(self.reason.clone()))
    }
}

impl RegionBackend for Unconfigured {
    fn list_regions(&self) -> Result<Vec<LotRegion>, ApiError> {
        self.fail()
    }

    fn upsert_region(&self, _payload: &RegionPayload) -> Result<(), ApiError> {
        self.fail()
    }

    fn fetch_region(&self, _lot_number: &str) -> Result<Option<LotRegion>, ApiError> {
        self.fail()
    }

    fn fetch_background(&self) -> Result<Vec<u8>, ApiError> {
        self.fail()
    }
}

fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        message: error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("An error occurred")
                .to_string()
        }),
    })
}

/// Pulls the human readable message out of an error body, if it has one.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let envelope: SaveResponse = serde_json::from_str(body).ok()?;
    envelope.message.or(envelope.error).filter(|m| !m.is_empty())
}

pub(crate) fn check_envelope(body: &str) -> Result<(), ApiError> {
    let envelope: SaveResponse = serde_json::from_str(body)?;
    if envelope.success {
        Ok(())
    } else {
        Err(ApiError::Rejected(
            envelope
                .message
                .or(envelope.error)
                .unwrap_or_else(|| "save was not acknowledged".to_string()),
        ))
    }
}

fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for b in segment.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

pub fn decode_background(bytes: &[u8]) -> Result<egui::ColorImage, ApiError> {
    let rgba = image::load_from_memory(bytes)?.into_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}
