use crate::model::{ImageSize, LotRegion, Point, RegionPayload};
use eframe::egui;
use tracing::debug;

use super::geometry::{centroid, screen_to_image};
use super::store::RegionStore;
use super::viewport::Viewport;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Mode {
    View,
    Editor,
}

/// Everything the map reacts to. Pointer positions are window coordinates;
/// the session converts them through its viewport.
#[derive(Clone, Debug)]
pub(super) enum MapEvent {
    ImageReady(ImageSize),
    ContainerResized(egui::Rect),
    RegionsLoaded(Vec<LotRegion>),
    RegionRefreshed(LotRegion),
    RegionSaved { lot_number: String },
    PointerDown(egui::Pos2),
    PointerMove(egui::Pos2),
    PointerUp,
    /// Keyboard pan by a window-space delta.
    Pan(egui::Vec2),
    /// A press and release that did not turn into a drag.
    Click(egui::Pos2),
    DoubleClick(egui::Pos2),
    ToggleMode,
    ZoomIn,
    ZoomOut,
    Zoom(f32),
    ResetZoom,
    Cancel,
    LotNumberSubmitted(String),
    LotNumberCancelled,
    SelectLot(usize),
    SaveRegion,
    CloseEditor,
}

/// Side effects the session asks its host to carry out.
#[derive(Clone, Debug, PartialEq)]
pub(super) enum MapCommand {
    RequestLotNumber,
    Upsert(RegionPayload),
}

/// Editable copy of the selected region, as shown in the side panel.
#[derive(Clone, Debug, PartialEq)]
pub(super) struct RegionForm {
    pub index: usize,
    pub lot_number: String,
    pub owner_name: String,
    pub label_x: String,
    pub label_y: String,
}

impl RegionForm {
    fn from_region(index: usize, region: &LotRegion) -> Self {
        Self {
            index,
            lot_number: region.lot_number.clone(),
            owner_name: region.owner().to_string(),
            label_x: region.label_x.unwrap_or(0.0).to_string(),
            label_y: region.label_y.unwrap_or(0.0).to_string(),
        }
    }

    fn parse_coord(raw: &str) -> f32 {
        raw.trim()
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    fn apply_to(&self, region: &mut LotRegion) {
        let lot_number = self.lot_number.trim();
        if !lot_number.is_empty() {
            region.lot_number = lot_number.to_string();
        }
        let owner = self.owner_name.trim();
        region.owner_name = (!owner.is_empty()).then(|| owner.to_string());
        region.label_x = Some(Self::parse_coord(&self.label_x));
        region.label_y = Some(Self::parse_coord(&self.label_y));
    }
}

#[derive(Clone, Debug)]
struct PendingRegion {
    coordinates: Vec<Point>,
    label: Point,
}

#[derive(Clone, Copy, Debug)]
struct PanDrag {
    start: egui::Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct SessionConfig {
    pub margin: egui::Vec2,
    pub zoom_in_factor: f32,
    pub zoom_out_factor: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            margin: egui::vec2(40.0, 40.0),
            zoom_in_factor: 1.2,
            zoom_out_factor: 0.8,
        }
    }
}

/// All interaction state of the lot map: mode, draft polygon, selection,
/// viewport and the regions themselves.
pub(super) struct MapSession {
    store: RegionStore,
    config: SessionConfig,
    viewport: Option<Viewport>,
    image_size: Option<ImageSize>,
    container: Option<egui::Rect>,
    mode: Mode,
    draft: Option<Vec<Point>>,
    pending: Option<PendingRegion>,
    selected: Option<usize>,
    panel: Option<RegionForm>,
    drag: Option<PanDrag>,
}

impl MapSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            store: RegionStore::default(),
            config,
            viewport: None,
            image_size: None,
            container: None,
            mode: Mode::View,
            draft: None,
            pending: None,
            selected: None,
            panel: None,
            drag: None,
        }
    }

    #[cfg(test)]
    pub fn with_viewport(viewport: Viewport) -> Self {
        let mut session = Self::new(SessionConfig::default());
        session.viewport = Some(viewport);
        session
    }

    pub fn set_config(&mut self, config: SessionConfig) {
        self.config = config;
        self.container = None;
    }

    pub fn store(&self) -> &RegionStore {
        &self.store
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    pub fn image_size(&self) -> Option<ImageSize> {
        self.image_size
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn draft(&self) -> Option<&[Point]> {
        self.draft.as_deref()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn panel(&self) -> Option<&RegionForm> {
        self.panel.as_ref()
    }

    pub fn panel_mut(&mut self) -> Option<&mut RegionForm> {
        self.panel.as_mut()
    }

    /// Stored lot number of the selected region, ignoring unsaved form edits.
    pub fn selected_lot_number(&self) -> Option<&str> {
        let region = self.store.get(self.selected?)?;
        Some(region.lot_number.as_str())
    }

    pub fn awaiting_lot_number(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_panning(&self) -> bool {
        self.drag.is_some()
    }

    pub fn handle(&mut self, event: MapEvent) -> Option<MapCommand> {
        match event {
            MapEvent::ImageReady(size) => {
                self.image_size = Some(size);
                self.refit();
                None
            }
            MapEvent::ContainerResized(rect) => {
                if self.container != Some(rect) {
                    self.container = Some(rect);
                    self.refit();
                }
                None
            }
            MapEvent::RegionsLoaded(regions) => {
                debug!(count = regions.len(), "regions replaced");
                self.store.load(regions);
                self.clear_selection();
                None
            }
            MapEvent::RegionRefreshed(region) => {
                let index = match self.store.index_of(&region.lot_number) {
                    Some(index) => {
                        self.store.replace(index, region);
                        index
                    }
                    None => self.store.add(region),
                };
                if self.selected == Some(index) {
                    self.open_panel(index);
                }
                None
            }
            MapEvent::RegionSaved { lot_number } => {
                let saved_is_selected = self
                    .selected
                    .and_then(|i| self.store.get(i))
                    .is_some_and(|r| r.lot_number == lot_number);
                if saved_is_selected {
                    self.clear_selection();
                }
                None
            }
            MapEvent::PointerDown(pos) => {
                if self.mode == Mode::View {
                    if let Some(vp) = &self.viewport {
                        self.drag = Some(PanDrag {
                            start: pos.to_vec2() - vp.offset,
                        });
                    }
                }
                None
            }
            MapEvent::PointerMove(pos) => {
                if self.mode == Mode::View {
                    if let (Some(drag), Some(vp)) = (self.drag, self.viewport.as_mut()) {
                        vp.pan_to(pos.to_vec2() - drag.start);
                    }
                }
                None
            }
            MapEvent::PointerUp => {
                self.drag = None;
                None
            }
            MapEvent::Pan(delta) => {
                if self.mode == Mode::View {
                    if let Some(vp) = self.viewport.as_mut() {
                        vp.pan(delta);
                    }
                }
                None
            }
            MapEvent::Click(pos) => {
                self.click(pos);
                None
            }
            MapEvent::DoubleClick(_) => self.finish_polygon(),
            MapEvent::ToggleMode => {
                self.toggle_mode();
                None
            }
            MapEvent::ZoomIn => {
                self.zoom(self.config.zoom_in_factor);
                None
            }
            MapEvent::ZoomOut => {
                self.zoom(self.config.zoom_out_factor);
                None
            }
            MapEvent::Zoom(factor) => {
                self.zoom(factor);
                None
            }
            MapEvent::ResetZoom => {
                if let Some(vp) = self.viewport.as_mut() {
                    let old = vp.scale;
                    vp.reset_zoom();
                    let new = vp.scale;
                    self.rescale_draft(old, new);
                }
                None
            }
            MapEvent::Cancel => {
                match self.mode {
                    Mode::Editor => {
                        self.draft = None;
                        self.pending = None;
                    }
                    Mode::View => self.clear_selection(),
                }
                None
            }
            MapEvent::LotNumberSubmitted(lot_number) => {
                self.resolve_lot_number(Some(lot_number));
                None
            }
            MapEvent::LotNumberCancelled => {
                self.resolve_lot_number(None);
                None
            }
            MapEvent::SelectLot(index) => {
                if self.mode == Mode::View && index < self.store.len() {
                    self.select(index);
                }
                None
            }
            MapEvent::SaveRegion => self.save_region(),
            MapEvent::CloseEditor => {
                self.clear_selection();
                None
            }
        }
    }

    fn refit(&mut self) {
        let (Some(image), Some(container)) = (self.image_size, self.container) else {
            return;
        };
        let old = self.viewport.map(|vp| vp.scale);
        match self.viewport.as_mut() {
            Some(vp) => {
                if !vp.refit(image, container, self.config.margin) {
                    debug!("container too small for the map, dropping viewport");
                    self.viewport = None;
                    self.drag = None;
                }
            }
            None => {
                self.viewport = Viewport::fit_to_container(image, container, self.config.margin);
            }
        }
        if let (Some(old), Some(vp)) = (old, self.viewport) {
            self.rescale_draft(old, vp.scale);
        }
    }

    fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            Mode::View => Mode::Editor,
            Mode::Editor => Mode::View,
        };
        self.draft = None;
        self.pending = None;
        self.drag = None;
        self.clear_selection();
        debug!(mode = ?self.mode, "map mode toggled");
    }

    fn zoom(&mut self, factor: f32) {
        if let Some(vp) = self.viewport.as_mut() {
            let old = vp.scale;
            vp.zoom(factor);
            let new = vp.scale;
            self.rescale_draft(old, new);
        }
    }

    /// Keeps draft vertices over the same image spot when the scale changes.
    fn rescale_draft(&mut self, old: f32, new: f32) {
        if old == new || old <= 0.0 {
            return;
        }
        if let Some(draft) = self.draft.as_mut() {
            let k = new / old;
            for p in draft.iter_mut() {
                *p = Point::new(p.x * k, p.y * k);
            }
        }
    }

    fn click(&mut self, pos: egui::Pos2) {
        let Some(vp) = self.viewport else {
            return;
        };
        match self.mode {
            Mode::View => match self.store.find_at(vp.window_to_image(pos)) {
                Some(index) => self.select(index),
                None => self.clear_selection(),
            },
            Mode::Editor => {
                if self.pending.is_some() {
                    return;
                }
                self.draft
                    .get_or_insert_with(Vec::new)
                    .push(vp.to_canvas(pos));
            }
        }
    }

    fn finish_polygon(&mut self) -> Option<MapCommand> {
        if self.mode != Mode::Editor || self.pending.is_some() {
            return None;
        }
        let scale = self.viewport.as_ref()?.scale;
        let draft = self.draft.as_ref()?;
        if draft.len() < 3 {
            return None;
        }
        let coordinates: Vec<Point> = draft.iter().map(|p| screen_to_image(*p, scale)).collect();
        let label = centroid(&coordinates);
        debug!(points = coordinates.len(), "polygon finished, awaiting lot number");
        self.pending = Some(PendingRegion { coordinates, label });
        Some(MapCommand::RequestLotNumber)
    }

    fn resolve_lot_number(&mut self, lot_number: Option<String>) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        self.draft = None;
        let lot_number = lot_number.map(|s| s.trim().to_string()).unwrap_or_default();
        if lot_number.is_empty() {
            debug!("lot number not given, draft discarded");
            return;
        }
        debug!(lot = %lot_number, "region drawn");
        self.store
            .add(LotRegion::polygon(lot_number, pending.coordinates, pending.label));
    }

    fn save_region(&mut self) -> Option<MapCommand> {
        let form = self.panel.clone()?;
        if self.selected != Some(form.index) {
            return None;
        }
        let region = self.store.get_mut(form.index)?;
        form.apply_to(region);
        self.store.upsert(form.index).map(MapCommand::Upsert)
    }

    fn select(&mut self, index: usize) {
        self.selected = Some(index);
        self.open_panel(index);
    }

    fn open_panel(&mut self, index: usize) {
        self.panel = self
            .store
            .get(index)
            .map(|r| RegionForm::from_region(index, r));
    }

    fn clear_selection(&mut self) {
        self.selected = None;
        self.panel = None;
    }
}
