//! Pan bounds for a zoomed image
//!
//! The image is centred in the viewport; at zoom `z` it may be pushed at most
//! half of its overflow in either direction.

use std::ops::{Add, Sub};

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 3.0;

/// A point or offset in screen pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Vec2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Unscaled size of an image measured while displayed at `zoom`.
    #[must_use]
    pub fn unscaled(self, zoom: f64) -> Size {
        let factor = zoom.max(MIN_ZOOM);
        Size::new(self.width / factor, self.height / factor)
    }
}

#[must_use]
pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        return MIN_ZOOM;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Bound `pan` so the zoomed image never uncovers the viewport more than
/// centring would.
#[must_use]
pub fn clamp_pan(pan: Vec2, zoom: f64, base: Size, viewport: Size) -> Vec2 {
    if zoom <= MIN_ZOOM {
        return Vec2::ZERO;
    }

    let max_x = ((base.width * zoom - viewport.width) / 2.0).max(0.0);
    let max_y = ((base.height * zoom - viewport.height) / 2.0).max(0.0);

    Vec2::new(pan.x.clamp(-max_x, max_x), pan.y.clamp(-max_y, max_y))
}
