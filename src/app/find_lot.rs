use crate::model::LotRegion;
use eframe::egui;
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

const MAX_ROWS: usize = 24;

/// Fuzzy search over lot numbers and owner names. Picking a row selects that
/// lot on the map.
#[derive(Default)]
pub(super) struct LotFinder {
    pub open: bool,
    pub query: String,
    pub selected: usize,
    request_focus: bool,
}

impl LotFinder {
    pub fn open(&mut self) {
        self.open = true;
        self.query.clear();
        self.selected = 0;
        self.request_focus = true;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.query.clear();
        self.selected = 0;
        self.request_focus = false;
    }

    /// Store indices matching the query, best score first. An empty query
    /// lists every lot in store order.
    pub(super) fn filtered(regions: &[LotRegion], query: &str) -> Vec<(usize, i64)> {
        let q = query.trim();
        if q.is_empty() {
            return (0..regions.len()).map(|i| (i, 0)).collect();
        }
        let matcher = SkimMatcherV2::default();
        let mut out = Vec::new();
        for (idx, region) in regions.iter().enumerate() {
            let haystack = format!("{} {}", region.lot_number, region.owner());
            if let Some(score) = matcher.fuzzy_match(&haystack, q) {
                out.push((idx, score));
            }
        }
        out.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| regions[a.0].lot_number.cmp(&regions[b.0].lot_number))
        });
        out
    }

    pub fn ui(&mut self, ctx: &egui::Context, regions: &[LotRegion]) -> Option<usize> {
        if !self.open {
            return None;
        }
        let matches = Self::filtered(regions, &self.query);
        if self.selected >= matches.len() {
            self.selected = matches.len().saturating_sub(1);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.close();
            return None;
        }
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowDown)) && !matches.is_empty() {
            self.selected = (self.selected + 1).min(matches.len() - 1);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowUp)) && !matches.is_empty() {
            self.selected = self.selected.saturating_sub(1);
        }
        let mut pick = ctx.input(|i| i.key_pressed(egui::Key::Enter));

        let screen = ctx.content_rect();
        let width = 420.0;
        let height = 300.0;
        let pos = egui::pos2(screen.center().x - width * 0.5, screen.top() + 48.0);
        egui::Area::new(egui::Id::new("lot_finder"))
            .fixed_pos(pos)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                let frame = egui::Frame::new()
                    .fill(egui::Color32::from_rgba_unmultiplied(20, 28, 16, 240))
                    .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(107, 158, 62)))
                    .inner_margin(10.0)
                    .corner_radius(egui::CornerRadius::same(8));
                frame.show(ui, |ui| {
                    ui.set_min_size(egui::vec2(width, height));
                    let resp = ui.add(
                        egui::TextEdit::singleline(&mut self.query)
                            .desired_width(f32::INFINITY)
                            .hint_text("Lot number or owner"),
                    );
                    if self.request_focus {
                        resp.request_focus();
                        self.request_focus = false;
                    }
                    ui.separator();
                    if matches.is_empty() {
                        ui.weak("No matching lots");
                    }
                    egui::ScrollArea::vertical().max_height(height - 64.0).show(ui, |ui| {
                        for (row, (index, _score)) in matches.iter().take(MAX_ROWS).enumerate() {
                            let region = &regions[*index];
                            let text = if region.owner().is_empty() {
                                format!("Lot {}", region.lot_number)
                            } else {
                                format!("Lot {}  ·  {}", region.lot_number, region.owner())
                            };
                            let resp = ui.add(egui::Button::new(text).selected(row == self.selected));
                            if resp.clicked() {
                                self.selected = row;
                                pick = true;
                            }
                        }
                    });
                });
            });

        if pick {
            if let Some((index, _)) = matches.get(self.selected) {
                let index = *index;
                self.close();
                return Some(index);
            }
        }
        None
    }
}
