use crate::api::{self, ApiError, RegionBackend};
use crate::model::{LotRegion, RegionPayload};
use eframe::egui;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use tracing::{debug, info, warn};

#[derive(Clone, Debug)]
pub(super) enum NetJob {
    LoadRegions,
    Upsert(RegionPayload),
    RefreshRegion(String),
    FetchBackground,
}

#[derive(Debug)]
pub(super) enum NetEvent {
    RegionsLoaded(Result<Vec<LotRegion>, ApiError>),
    RegionSaved {
        lot_number: String,
        result: Result<(), ApiError>,
    },
    RegionRefreshed {
        lot_number: String,
        result: Result<Option<LotRegion>, ApiError>,
    },
    BackgroundLoaded(Result<egui::ColorImage, ApiError>),
}

/// Runs backend calls off the UI thread and hands results back through a
/// channel drained once per frame. There is no queue: concurrent saves race
/// and the last response wins.
pub(super) struct NetWorker {
    backend: Arc<dyn RegionBackend>,
    tx: Sender<NetEvent>,
    rx: Receiver<NetEvent>,
    repaint: Option<egui::Context>,
    in_flight: usize,
}

impl NetWorker {
    pub fn new(backend: Arc<dyn RegionBackend>) -> Self {
        let (tx, rx) = channel();
        Self {
            backend,
            tx,
            rx,
            repaint: None,
            in_flight: 0,
        }
    }

    pub fn set_backend(&mut self, backend: Arc<dyn RegionBackend>) {
        self.backend = backend;
    }

    pub fn set_repaint(&mut self, ctx: egui::Context) {
        self.repaint = Some(ctx);
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn spawn(&mut self, job: NetJob) {
        debug!(?job, "spawning network job");
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        let repaint = self.repaint.clone();
        self.in_flight += 1;
        std::thread::spawn(move || {
            let event = run(backend.as_ref(), job);
            // The receiver only goes away when the app is shutting down.
            let _ = tx.send(event);
            if let Some(ctx) = repaint {
                ctx.request_repaint();
            }
        });
    }

    pub fn drain(&mut self) -> Vec<NetEvent> {
        let events: Vec<NetEvent> = self.rx.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(events.len());
        events
    }

    #[cfg(test)]
    pub fn wait(&mut self, timeout: std::time::Duration) -> Option<NetEvent> {
        let event = self.rx.recv_timeout(timeout).ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(event)
    }
}

pub(super) fn run(backend: &dyn RegionBackend, job: NetJob) -> NetEvent {
    match job {
        NetJob::LoadRegions => {
            let result = backend.list_regions();
            match &result {
                Ok(regions) => info!(count = regions.len(), "loaded lot regions"),
                Err(err) => warn!("error loading lot regions: {err}"),
            }
            NetEvent::RegionsLoaded(result)
        }
        NetJob::Upsert(payload) => {
            let result = backend.upsert_region(&payload);
            match &result {
                Ok(()) => info!(lot = %payload.lot_number, "lot region saved"),
                Err(err) => warn!(lot = %payload.lot_number, "error saving region: {err}"),
            }
            NetEvent::RegionSaved {
                lot_number: payload.lot_number,
                result,
            }
        }
        NetJob::RefreshRegion(lot_number) => {
            let result = backend.fetch_region(&lot_number);
            if let Err(err) = &result {
                warn!(lot = %lot_number, "error refreshing region: {err}");
            }
            NetEvent::RegionRefreshed { lot_number, result }
        }
        NetJob::FetchBackground => {
            let result = backend
                .fetch_background()
                .and_then(|bytes| api::decode_background(&bytes));
            match &result {
                Ok(image) => info!(width = image.size[0], height = image.size[1], "background loaded"),
                Err(err) => warn!("error loading background image: {err}"),
            }
            NetEvent::BackgroundLoaded(result)
        }
    }
}
