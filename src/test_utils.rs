use std::cell::Cell;

use crate::converter::CoordinateConverter;
use crate::types::{CoordSys, Point, WorldPoint, angular_sep_deg, fold_lon};

// Check that the error between a and b is close enough
pub fn approx(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

/// Linear lon/lat to pixel mapping over a bounded window: deterministic,
/// distortion-free, ideal for exercising walks and clipping exactly.
pub struct FlatConverter {
    lon0: f64,
    lat0: f64,
    deg_per_px: f64,
    width: f64,
    height: f64,
}

impl FlatConverter {
    pub fn new(lon0: f64, lat0: f64, deg_per_px: f64, width: f64, height: f64) -> Self {
        Self {
            lon0,
            lat0,
            deg_per_px,
            width,
            height,
        }
    }
}

impl CoordinateConverter for FlatConverter {
    fn world_to_device(&self, wp: WorldPoint) -> Option<Point> {
        let mut dlon = wp.lon - self.lon0;
        while dlon < -180.0 {
            dlon += 360.0;
        }
        while dlon >= 180.0 {
            dlon -= 360.0;
        }
        Some(Point {
            x: dlon / self.deg_per_px,
            y: (wp.lat - self.lat0) / self.deg_per_px,
        })
    }

    fn device_to_world(&self, dp: Point, csys: CoordSys) -> Option<WorldPoint> {
        Some(WorldPoint::new(
            fold_lon(self.lon0 + dp.x * self.deg_per_px),
            self.lat0 + dp.y * self.deg_per_px,
            csys,
        ))
    }

    fn is_point_visible(&self, wp: WorldPoint) -> bool {
        match self.world_to_device(wp) {
            Some(p) => p.x >= 0.0 && p.x < self.width && p.y >= 0.0 && p.y < self.height,
            None => false,
        }
    }
}

/// Visibility-only converter: a spherical cap around a center point.
pub struct CapConverter {
    lon: f64,
    lat: f64,
    radius_deg: f64,
}

impl CapConverter {
    pub fn new(lon: f64, lat: f64, radius_deg: f64) -> Self {
        Self {
            lon,
            lat,
            radius_deg,
        }
    }
}

impl CoordinateConverter for CapConverter {
    fn world_to_device(&self, _wp: WorldPoint) -> Option<Point> {
        None
    }

    fn device_to_world(&self, _dp: Point, _csys: CoordSys) -> Option<WorldPoint> {
        None
    }

    fn is_point_visible(&self, wp: WorldPoint) -> bool {
        angular_sep_deg(self.lon, self.lat, wp.lon, wp.lat) <= self.radius_deg
    }
}

/// Converter that never resolves anything.
pub struct BlindConverter;

impl CoordinateConverter for BlindConverter {
    fn world_to_device(&self, _wp: WorldPoint) -> Option<Point> {
        None
    }

    fn device_to_world(&self, _dp: Point, _csys: CoordSys) -> Option<WorldPoint> {
        None
    }

    fn is_point_visible(&self, _wp: WorldPoint) -> bool {
        false
    }
}

/// Wrapper counting converter traffic.
pub struct CountingConverter<C> {
    inner: C,
    d2w_calls: Cell<usize>,
}

impl<C> CountingConverter<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            d2w_calls: Cell::new(0),
        }
    }

    pub fn device_to_world_calls(&self) -> usize {
        self.d2w_calls.get()
    }
}

impl<C: CoordinateConverter> CoordinateConverter for CountingConverter<C> {
    fn world_to_device(&self, wp: WorldPoint) -> Option<Point> {
        self.inner.world_to_device(wp)
    }

    fn device_to_world(&self, dp: Point, csys: CoordSys) -> Option<WorldPoint> {
        self.d2w_calls.set(self.d2w_calls.get() + 1);
        self.inner.device_to_world(dp, csys)
    }

    fn is_point_visible(&self, wp: WorldPoint) -> bool {
        self.inner.is_point_visible(wp)
    }
}
