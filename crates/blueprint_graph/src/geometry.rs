// SPDX-License-Identifier: MIT OR Apache-2.0
//! World/screen coordinate transforms and viewport math.
//!
//! World space is where node positions live. Screen space is the canvas
//! pixel space the pointer reports in. The two are related by
//! `screen = world * zoom + pan`.

use serde::{Deserialize, Serialize};

/// Smallest zoom factor the viewport accepts
pub const MIN_ZOOM: f64 = 0.2;
/// Largest zoom factor the viewport accepts
pub const MAX_ZOOM: f64 = 2.5;

/// A point in either screen or world space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Return this point shifted by `(dx, dy)`
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Whether both coordinates are finite
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Width and height of a node rectangle in world units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Size {
    /// Create a new size
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether both extents are finite
    pub fn is_finite(self) -> bool {
        self.width.is_finite() && self.height.is_finite()
    }
}

/// Axis-aligned bounding box in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    /// Left edge
    pub min_x: f64,
    /// Top edge
    pub min_y: f64,
    /// Right edge
    pub max_x: f64,
    /// Bottom edge
    pub max_y: f64,
}

impl Bounds {
    /// Bounds of a single rectangle
    pub fn of_rect(origin: Point, size: Size) -> Self {
        Self {
            min_x: origin.x,
            min_y: origin.y,
            max_x: origin.x + size.width,
            max_y: origin.y + size.height,
        }
    }

    /// Smallest box enclosing every rectangle, or `None` for an empty input
    pub fn enclosing(rects: impl IntoIterator<Item = (Point, Size)>) -> Option<Self> {
        rects
            .into_iter()
            .map(|(origin, size)| Self::of_rect(origin, size))
            .reduce(|a, b| a.union(b))
    }

    /// Union of two boxes
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Center point
    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Width of the box
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the box
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Clamp a zoom factor into `[MIN_ZOOM, MAX_ZOOM]`.
///
/// Non-finite input falls back to `1.0`.
pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_finite() {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    } else {
        1.0
    }
}

/// Pan offset (screen pixels) and zoom factor of the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    /// Horizontal pan in screen pixels
    pub pan_x: f64,
    /// Vertical pan in screen pixels
    pub pan_y: f64,
    /// Zoom factor, always within `[MIN_ZOOM, MAX_ZOOM]`
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan_x: 0.0,
            pan_y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    /// Create a viewport, clamping the zoom
    pub fn new(pan_x: f64, pan_y: f64, zoom: f64) -> Self {
        Self {
            pan_x,
            pan_y,
            zoom: clamp_zoom(zoom),
        }
    }

    /// Convert a screen-space point to world coordinates
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.pan_x) / self.zoom,
            (screen.y - self.pan_y) / self.zoom,
        )
    }

    /// Convert a world-space point to screen coordinates
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point::new(
            world.x * self.zoom + self.pan_x,
            world.y * self.zoom + self.pan_y,
        )
    }

    /// Same viewport with its pan shifted by `(dx, dy)` screen pixels
    #[must_use]
    pub fn panned(self, dx: f64, dy: f64) -> Self {
        Self {
            pan_x: self.pan_x + dx,
            pan_y: self.pan_y + dy,
            zoom: self.zoom,
        }
    }

    /// Copy of this viewport with the zoom clamped and non-finite pans reset
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            pan_x: if self.pan_x.is_finite() { self.pan_x } else { 0.0 },
            pan_y: if self.pan_y.is_finite() { self.pan_y } else { 0.0 },
            zoom: clamp_zoom(self.zoom),
        }
    }

    /// Zoom by `factor` while keeping the world point under `cursor` fixed.
    ///
    /// The anchor is computed with the old viewport, then pan is re-solved
    /// against the clamped new zoom. A non-positive or non-finite factor
    /// leaves the viewport unchanged.
    #[must_use]
    pub fn zoom_at_point(self, cursor: Point, factor: f64) -> Self {
        if !factor.is_finite() || factor <= 0.0 {
            return self;
        }
        let anchor = self.screen_to_world(cursor);
        let zoom = clamp_zoom(self.zoom * factor);
        Self {
            pan_x: cursor.x - anchor.x * zoom,
            pan_y: cursor.y - anchor.y * zoom,
            zoom,
        }
    }
}
