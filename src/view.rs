use serde::{Deserialize, Serialize};

use crate::types::{CoordSys, LabelFormat, Point, WorldPoint};

/// Snapshot of the view the overlay is computed for. The engine holds no
/// state of its own; everything it needs arrives here and in the converter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewDescriptor {
    /// Viewport size in device pixels.
    pub width: f64,
    pub height: f64,
    /// Full screen width, the upper bound on line-tracing resolution.
    pub screen_width: f64,
    pub zoom_factor: f64,
    pub csys: CoordSys,
    pub label_format: LabelFormat,
    /// Unbounded all-sky mosaic rather than a bounded image.
    pub is_full_sky: bool,
    /// Field of view across the longer viewport side, degrees.
    pub fov_deg: f64,
    /// World point at the projection center.
    pub center: WorldPoint,
}

impl ViewDescriptor {
    pub fn bounds(&self) -> Bounds {
        Bounds {
            x: 0.0,
            y: 0.0,
            width: self.width,
            height: self.height,
        }
    }
}

impl Default for ViewDescriptor {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 800.0,
            screen_width: 800.0,
            zoom_factor: 1.0,
            csys: CoordSys::EqJ2000,
            label_format: LabelFormat::Hms,
            is_full_sky: false,
            fov_deg: 40.0,
            center: WorldPoint::new(0.0, 0.0, CoordSys::EqJ2000),
        }
    }
}

/// Device-space clip rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    /// Exact bounds test, zero margin.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x - self.x < self.width && p.y >= self.y && p.y - self.y < self.height
    }
}
