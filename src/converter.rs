use crate::types::{CoordSys, Point, WorldPoint};

/// Projection capability the engine borrows from its host.
///
/// Every method may report "no answer" for any input — points off the
/// projection, outside the valid hemisphere, or beyond the viewport. The
/// engine treats that as routine, never as an error.
pub trait CoordinateConverter {
    /// Map a world point to device pixels, if the projection defines it.
    fn world_to_device(&self, wp: WorldPoint) -> Option<Point>;

    /// Map a device point back to world coordinates in `csys`.
    fn device_to_world(&self, dp: Point, csys: CoordSys) -> Option<WorldPoint>;

    /// Whether the world point lands inside the current viewport.
    fn is_point_visible(&self, wp: WorldPoint) -> bool;
}
