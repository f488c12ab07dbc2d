use crate::model::{self, ImageSize, LotRegion, Point};
use eframe::egui;

use super::geometry::image_to_screen;
use super::viewport::Viewport;

// Premultiplied: #6b9e3e at 20% and #2d5016 at 30%.
const REGION_FILL: egui::Color32 = egui::Color32::from_rgba_premultiplied(21, 32, 12, 51);
const REGION_FILL_SELECTED: egui::Color32 = egui::Color32::from_rgba_premultiplied(14, 24, 7, 77);
const REGION_STROKE: egui::Color32 = egui::Color32::from_rgb(107, 158, 62);
const DARK_GREEN: egui::Color32 = egui::Color32::from_rgb(45, 80, 22);
const LABEL_BOX: egui::Color32 = egui::Color32::from_rgba_premultiplied(230, 230, 230, 230);
const LABEL_LINE_HEIGHT: f32 = 15.0;
const LABEL_PADDING: f32 = 5.0;
const VERTEX_RADIUS: f32 = 5.0;

/// What a frame of the map needs. Borrowed from the session, never mutated.
pub(super) struct MapScene<'a> {
    pub viewport: Option<&'a Viewport>,
    pub image_size: Option<ImageSize>,
    pub background: Option<&'a egui::TextureHandle>,
    pub regions: &'a [LotRegion],
    pub selected: Option<usize>,
    pub draft: Option<&'a [Point]>,
}

pub(super) fn draw_map(painter: &egui::Painter, rect: egui::Rect, scene: &MapScene<'_>) {
    let bg = painter.ctx().style().visuals.extreme_bg_color;
    painter.rect_filled(rect, 0.0, bg);

    let (Some(vp), Some(image)) = (scene.viewport, scene.image_size) else {
        let message = if scene.image_size.is_none() {
            "Loading lot map…"
        } else {
            "Window too small for the lot map"
        };
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            message,
            egui::FontId::proportional(16.0),
            painter.ctx().style().visuals.weak_text_color(),
        );
        return;
    };

    if let Some(texture) = scene.background {
        painter.image(
            texture.id(),
            vp.image_rect(image),
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );
    }

    for (idx, region) in scene.regions.iter().enumerate() {
        draw_region(painter, vp, region, scene.selected == Some(idx));
    }

    if let Some(draft) = scene.draft {
        draw_draft(painter, vp, draft);
    }
}

fn draw_region(painter: &egui::Painter, vp: &Viewport, region: &LotRegion, is_selected: bool) {
    if region.region_type != model::RegionType::Polygon || region.coordinates.len() < 2 {
        return;
    }
    let points: Vec<egui::Pos2> = region
        .coordinates
        .iter()
        .map(|p| vp.to_window(image_to_screen(*p, vp.scale)))
        .collect();
    let (fill, stroke) = if is_selected {
        (REGION_FILL_SELECTED, egui::Stroke::new(3.0, DARK_GREEN))
    } else {
        (REGION_FILL, egui::Stroke::new(2.0, REGION_STROKE))
    };
    if let Some(mesh) = fill_mesh(&points, fill) {
        painter.add(egui::Shape::mesh(mesh));
    }
    painter.add(egui::Shape::closed_line(points, stroke));

    if let Some(anchor) = region.label_anchor() {
        let anchor = vp.to_window(image_to_screen(anchor, vp.scale));
        draw_label(painter, anchor, &label_lines(region));
    }
}

/// Text lines of a region's label box: the lot number, then the owner when
/// one is recorded.
pub(super) fn label_lines(region: &LotRegion) -> Vec<String> {
    let mut lines = vec![format!("Lot {}", region.lot_number)];
    if !region.owner().is_empty() {
        lines.push(region.owner().to_string());
    }
    lines
}

fn draw_label(painter: &egui::Painter, anchor: egui::Pos2, lines: &[String]) {
    let font_id = egui::FontId::proportional(12.0);
    let galleys: Vec<_> = lines
        .iter()
        .map(|line| painter.layout_no_wrap(line.clone(), font_id.clone(), DARK_GREEN))
        .collect();
    let width = galleys.iter().map(|g| g.size().x).fold(0.0, f32::max);
    let first_height = galleys.first().map(|g| g.size().y).unwrap_or(0.0);
    let height = LABEL_LINE_HEIGHT * (lines.len().saturating_sub(1)) as f32 + first_height;

    // The anchor is the baseline of the first line.
    let top_left = anchor - egui::vec2(LABEL_PADDING, first_height + LABEL_PADDING * 0.5);
    let boxed = egui::Rect::from_min_size(
        top_left,
        egui::vec2(width + LABEL_PADDING * 2.0, height + LABEL_PADDING),
    );
    painter.rect_filled(boxed, 2.0, LABEL_BOX);
    for (i, galley) in galleys.into_iter().enumerate() {
        let pos = egui::pos2(anchor.x, anchor.y - first_height + LABEL_LINE_HEIGHT * i as f32);
        painter.galley(pos, galley, DARK_GREEN);
    }
}

fn draw_draft(painter: &egui::Painter, vp: &Viewport, draft: &[Point]) {
    let points: Vec<egui::Pos2> = draft.iter().map(|p| vp.to_window(*p)).collect();
    if points.len() > 1 {
        painter.add(egui::Shape::line(points.clone(), egui::Stroke::new(2.0, DARK_GREEN)));
    }
    for p in points {
        painter.circle_filled(p, VERTEX_RADIUS, DARK_GREEN);
    }
}

/// Triangle indices covering a simple polygon, concave ones included.
/// `None` when the ring is degenerate.
pub(super) fn triangulate(points: &[egui::Pos2]) -> Option<Vec<usize>> {
    if points.len() < 3 || ring_area(points).abs() <= f32::EPSILON {
        return None;
    }
    let flat: Vec<f64> = points
        .iter()
        .flat_map(|p| [p.x as f64, p.y as f64])
        .collect();
    let indices = earcutr::earcut(&flat, &[], 2).ok()?;
    (!indices.is_empty()).then_some(indices)
}

fn ring_area(points: &[egui::Pos2]) -> f32 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let (a, b) = (points[i], points[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum::<f32>()
        * 0.5
}

fn fill_mesh(points: &[egui::Pos2], color: egui::Color32) -> Option<egui::Mesh> {
    let indices = triangulate(points)?;
    let mut mesh = egui::Mesh::default();
    for p in points {
        mesh.colored_vertex(*p, color);
    }
    for tri in indices.chunks_exact(3) {
        mesh.add_triangle(tri[0] as u32, tri[1] as u32, tri[2] as u32);
    }
    Some(mesh)
}
