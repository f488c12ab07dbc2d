use crate::model::{ImageSize, Point};
use eframe::egui;

use super::geometry::screen_to_image;

/// Scale and placement of the background image inside the canvas area.
///
/// `origin` is where the canvas sits in window coordinates before panning;
/// `offset` is the pan translation applied on top of it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Viewport {
    pub scale: f32,
    pub offset: egui::Vec2,
    pub canvas_size: egui::Vec2,
    pub origin: egui::Pos2,
    fit_scale: f32,
}

impl Viewport {
    /// A bare viewport at `scale` with the canvas at the window origin.
    pub fn with_scale(scale: f32) -> Self {
        Self {
            scale,
            offset: egui::Vec2::ZERO,
            canvas_size: egui::Vec2::ZERO,
            origin: egui::Pos2::ZERO,
            fit_scale: scale,
        }
    }

    /// Fits `image` into `container` minus `margin`, keeping the aspect ratio.
    /// Returns `None` when either size is degenerate.
    pub fn fit_to_container(
        image: ImageSize,
        container: egui::Rect,
        margin: egui::Vec2,
    ) -> Option<Self> {
        if !image.is_valid() {
            return None;
        }
        let max_width = container.width() - margin.x;
        let max_height = container.height() - margin.y;
        if max_width <= 0.0 || max_height <= 0.0 {
            return None;
        }
        let canvas_size = if image.aspect() > max_width / max_height {
            egui::vec2(max_width, max_width / image.aspect())
        } else {
            egui::vec2(max_height * image.aspect(), max_height)
        };
        let scale = canvas_size.x / image.width;
        let origin = container.min + (container.size() - canvas_size) * 0.5;
        Some(Self {
            scale,
            offset: egui::Vec2::ZERO,
            canvas_size,
            origin,
            fit_scale: scale,
        })
    }

    /// Refit after a container change, keeping the current pan.
    pub fn refit(&mut self, image: ImageSize, container: egui::Rect, margin: egui::Vec2) -> bool {
        let Some(fitted) = Self::fit_to_container(image, container, margin) else {
            return false;
        };
        let offset = self.offset;
        *self = Self { offset, ..fitted };
        true
    }

    pub fn pan_to(&mut self, offset: egui::Vec2) {
        self.offset = offset;
    }

    pub fn pan(&mut self, delta: egui::Vec2) {
        self.offset += delta;
    }

    pub fn zoom(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.scale *= factor;
        }
    }

    pub fn reset_zoom(&mut self) {
        self.scale = self.fit_scale;
        self.offset = egui::Vec2::ZERO;
    }

    /// Top-left of the canvas in window coordinates, pan included.
    pub fn canvas_origin(&self) -> egui::Pos2 {
        self.origin + self.offset
    }

    /// Window position to canvas-local (screen space) position.
    pub fn to_canvas(&self, window: egui::Pos2) -> Point {
        Point::from_pos2((window - self.canvas_origin()).to_pos2())
    }

    /// Canvas-local position back to window coordinates.
    pub fn to_window(&self, canvas: Point) -> egui::Pos2 {
        self.canvas_origin() + canvas.to_pos2().to_vec2()
    }

    pub fn window_to_image(&self, window: egui::Pos2) -> Point {
        screen_to_image(self.to_canvas(window), self.scale)
    }

    /// Rectangle the scaled background image covers, in window coordinates.
    pub fn image_rect(&self, image: ImageSize) -> egui::Rect {
        egui::Rect::from_min_size(
            self.canvas_origin(),
            egui::vec2(image.width * self.scale, image.height * self.scale),
        )
    }
}
