//! Pan/zoom transform between screen space and canvas-local space.

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;

use serde::Serialize;

use crate::consts::{MAX_SCALE, MIN_SCALE, ZOOM_IN_FACTOR, ZOOM_OUT_FACTOR};

/// A point in either screen or canvas-local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Pan offset and zoom applied to the whole canvas.
///
/// `pan_x` / `pan_y` are in screen pixels and unbounded.
/// `scale` always lies in `[MIN_SCALE, MAX_SCALE]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasTransform {
    pub pan_x: f64,
    pub pan_y: f64,
    scale: f64,
}

impl Default for CanvasTransform {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, scale: 1.0 }
    }
}

impl CanvasTransform {
    /// Build a transform, clamping `scale` into bounds.
    #[must_use]
    pub fn new(pan_x: f64, pan_y: f64, scale: f64) -> Self {
        Self { pan_x, pan_y, scale: clamp_scale(scale) }
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Convert a screen-space point to canvas-local coordinates.
    #[must_use]
    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.pan_x) / self.scale,
            y: (screen.y - self.pan_y) / self.scale,
        }
    }

    /// Convert a canvas-local point to screen coordinates.
    #[must_use]
    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        Point {
            x: canvas.x * self.scale + self.pan_x,
            y: canvas.y * self.scale + self.pan_y,
        }
    }

    /// Shift the pan offset by a raw screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Zoom one wheel step while keeping the canvas point under `screen` fixed.
    ///
    /// A positive `direction` (wheel moved down) zooms out, anything else zooms in.
    pub fn zoom_at(&mut self, screen: Point, direction: f64) {
        let factor = if direction > 0.0 { ZOOM_OUT_FACTOR } else { ZOOM_IN_FACTOR };
        let new_scale = clamp_scale(self.scale * factor);
        let anchor = self.screen_to_canvas(screen);

        self.pan_x = screen.x - anchor.x * new_scale;
        self.pan_y = screen.y - anchor.y * new_scale;
        self.scale = new_scale;
    }
}

fn clamp_scale(scale: f64) -> f64 {
    if scale.is_nan() {
        return 1.0;
    }
    scale.clamp(MIN_SCALE, MAX_SCALE)
}
