use std::f64::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

use crate::converter::CoordinateConverter;
use crate::precess::rotate_between;
use crate::types::{CoordSys, Point, WorldPoint, fold_lon};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Projection {
    Gnomonic,
    Stereographic,
    Orthographic,
    Equidistant,
}

impl Projection {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "gnomonic" => Some(Self::Gnomonic),
            "stereographic" => Some(Self::Stereographic),
            "orthographic" => Some(Self::Orthographic),
            "equidistant" => Some(Self::Equidistant),
            _ => None,
        }
    }

    /// Largest zenith distance the projection resolves; beyond it the point
    /// is on the unusable side of the sphere.
    fn max_zenith(self) -> f64 {
        match self {
            Self::Gnomonic | Self::Orthographic => FRAC_PI_2,
            Self::Stereographic | Self::Equidistant => PI,
        }
    }

    /// Radial mapping r(zenith) on the tangent plane.
    fn radial(self, zenith: f64) -> f64 {
        match self {
            Self::Gnomonic => zenith.tan(),
            Self::Stereographic => (zenith / 2.0).tan(),
            Self::Orthographic => zenith.sin(),
            Self::Equidistant => zenith / FRAC_PI_2,
        }
    }

    /// Inverse radial mapping, `None` outside the projection's disc.
    fn zenith(self, r: f64) -> Option<f64> {
        match self {
            Self::Gnomonic => Some(r.atan()),
            Self::Stereographic => Some(2.0 * r.atan()),
            Self::Orthographic => (r <= 1.0).then(|| r.asin()),
            Self::Equidistant => {
                let z = r * FRAC_PI_2;
                (z <= PI).then_some(z)
            }
        }
    }
}

/// Azimuthal sphere projection over a pixel viewport. This is the concrete
/// converter behind the demo binary and the integration tests; the engine
/// itself only ever sees it through the `CoordinateConverter` trait.
#[derive(Debug, Clone)]
pub struct SphereProjection {
    center: WorldPoint,
    projection: Projection,
    position_angle_deg: f64,
    width: f64,
    height: f64,
    scale: f64,
}

impl SphereProjection {
    pub fn new(
        center: WorldPoint,
        projection: Projection,
        position_angle_deg: f64,
        fov_deg: f64,
        width: f64,
        height: f64,
    ) -> Self {
        // pixels per tangent-plane unit so the field of view spans the
        // shorter viewport side
        let half_fov = (fov_deg / 2.0).to_radians().min(projection.max_zenith());
        let rho_max = projection.radial(half_fov);
        let scale = (width.min(height) / 2.0) / rho_max;
        Self {
            center,
            projection,
            position_angle_deg,
            width,
            height,
            scale,
        }
    }

    fn center_px(&self) -> Point {
        Point {
            x: self.width / 2.0,
            y: self.height / 2.0,
        }
    }

    // Project onto the tangent plane relative to the center.
    // Returns `None` when the point is past the projection's usable zenith.
    fn project(&self, lon_deg: f64, lat_deg: f64) -> Option<Point> {
        let ra = lon_deg.to_radians();
        let dec = lat_deg.to_radians();
        let cra = self.center.lon.to_radians();
        let cde = self.center.lat.to_radians();

        let d_ra = ra - cra;

        // Spherical law of cosines: cos(zenith)
        let cos_z = (cde.sin() * dec.sin() + cde.cos() * dec.cos() * d_ra.cos()).clamp(-1.0, 1.0);
        let zenith = cos_z.acos();
        if zenith > self.projection.max_zenith() {
            return None;
        }

        // Azimuth (bearing from the center), minus the position angle
        let y = d_ra.sin() * dec.cos();
        let x = cde.cos() * dec.sin() - cde.sin() * dec.cos() * d_ra.cos();
        let az = y.atan2(x) - self.position_angle_deg.to_radians();

        let r = self.projection.radial(zenith);
        Some(Point {
            x: -r * az.sin(),
            y: r * az.cos(),
        })
    }

    // Invert the tangent-plane mapping back to lon/lat in the center's
    // system: bearing plus distance from the center, navigation style.
    fn unproject(&self, tp: Point) -> Option<(f64, f64)> {
        let r = (tp.x * tp.x + tp.y * tp.y).sqrt();
        let zenith = self.projection.zenith(r)?;
        let az = (-tp.x).atan2(tp.y) + self.position_angle_deg.to_radians();

        let cra = self.center.lon.to_radians();
        let cde = self.center.lat.to_radians();

        let lat = (cde.sin() * zenith.cos() + cde.cos() * zenith.sin() * az.cos())
            .clamp(-1.0, 1.0)
            .asin();
        // this form stays well-conditioned when the center sits on a pole
        let d_ra = (az.sin() * zenith.sin())
            .atan2(zenith.cos() * cde.cos() - zenith.sin() * cde.sin() * az.cos());
        let lon = cra + d_ra;

        Some((fold_lon(lon.to_degrees()), lat.to_degrees()))
    }

    fn to_pixels(&self, tp: Point) -> Point {
        let c = self.center_px();
        Point {
            x: c.x + tp.x * self.scale,
            y: c.y - tp.y * self.scale,
        }
    }

    fn from_pixels(&self, p: Point) -> Point {
        let c = self.center_px();
        Point {
            x: (p.x - c.x) / self.scale,
            y: (c.y - p.y) / self.scale,
        }
    }
}

impl CoordinateConverter for SphereProjection {
    fn world_to_device(&self, wp: WorldPoint) -> Option<Point> {
        let wp = rotate_between(wp, self.center.csys);
        let tp = self.project(wp.lon, wp.lat)?;
        Some(self.to_pixels(tp))
    }

    fn device_to_world(&self, dp: Point, csys: CoordSys) -> Option<WorldPoint> {
        let (lon, lat) = self.unproject(self.from_pixels(dp))?;
        Some(rotate_between(
            WorldPoint::new(lon, lat, self.center.csys),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::approx;

    fn proj(projection: Projection, fov: f64) -> SphereProjection {
        SphereProjection::new(
            WorldPoint::new(0.0, 0.0, CoordSys::EqJ2000),
            projection,
            0.0,
            fov,
            800.0,
            800.0,
        )
    }

    #[test]
    fn center_projects_to_the_viewport_center() {
        let p = proj(Projection::Gnomonic, 40.0);
        let d = p
            .world_to_device(WorldPoint::new(0.0, 0.0, CoordSys::EqJ2000))
            .unwrap();
        assert!(approx(d.x, 400.0, 1e-9));
        assert!(approx(d.y, 400.0, 1e-9));
    }

    #[test]
    fn small_offset_gnomonic_east_is_negative_x() {
        // 1 deg east from an equatorial center: (x, y) = (-tan 1 deg, 0)
        let p = proj(Projection::Gnomonic, 40.0);
        let tp = p.project(1.0, 0.0).unwrap();
        assert!(approx(tp.x, -(1.0_f64.to_radians().tan()), 1e-12));
        assert!(approx(tp.y, 0.0, 1e-12));
    }

    #[test]
    fn position_angle_rotates_counterclockwise() {
        let p = SphereProjection::new(
            WorldPoint::new(0.0, 0.0, CoordSys::EqJ2000),
            Projection::Gnomonic,
            90.0,
            40.0,
            800.0,
            800.0,
        );
        let tp = p.project(1.0, 0.0).unwrap();
        assert!(approx(tp.x, 0.0, 1e-12));
        assert!(approx(tp.y, 1.0_f64.to_radians().tan(), 1e-12));
    }

    #[test]
    fn gnomonic_drops_backside_but_stereographic_keeps_it() {
        // 120 deg away on the equator: zenith > 90 deg
        assert!(proj(Projection::Gnomonic, 40.0).project(120.0, 0.0).is_none());
        let tp = proj(Projection::Stereographic, 40.0)
            .project(120.0, 0.0)
            .unwrap();
        assert!(approx(tp.x, -(60.0_f64.to_radians().tan()), 1e-12));
        assert!(approx(tp.y, 0.0, 1e-12));
    }

    #[test]
    fn world_device_round_trip_across_projections() {
        let cases = [
            (Projection::Gnomonic, 40.0),
            (Projection::Stereographic, 90.0),
            (Projection::Orthographic, 60.0),
            (Projection::Equidistant, 180.0),
        ];
        for (projection, fov) in cases {
            let p = proj(projection, fov);
            for &(lon, lat) in &[(0.0, 0.0), (5.0, 3.0), (352.0, -8.0), (10.0, 15.0)] {
                let wp = WorldPoint::new(lon, lat, CoordSys::EqJ2000);
                let d = p.world_to_device(wp).expect("frontside point projects");
                let back = p
                    .device_to_world(d, CoordSys::EqJ2000)
                    .expect("device point resolves");
                assert!(
                    approx(back.lon, lon, 1e-8),
                    "{projection:?} lon {} vs {lon}",
                    back.lon
                );
                assert!(
                    approx(back.lat, lat, 1e-8),
                    "{projection:?} lat {} vs {lat}",
                    back.lat
                );
            }
        }
    }

    #[test]
    fn seam_equivalent_offsets_project_identically() {
        // center 359, point 1: same 2 deg separation as center 1, point 3
        let a = SphereProjection::new(
            WorldPoint::new(359.0, 0.0, CoordSys::EqJ2000),
            Projection::Gnomonic,
            0.0,
            40.0,
            800.0,
            800.0,
        );
        let b = SphereProjection::new(
            WorldPoint::new(1.0, 0.0, CoordSys::EqJ2000),
            Projection::Gnomonic,
            0.0,
            40.0,
            800.0,
            800.0,
        );
        let pa = a.project(1.0, 0.0).unwrap();
        let pb = b.project(3.0, 0.0).unwrap();
        assert!(approx(pa.x, pb.x, 1e-12));
        assert!(approx(pa.y, pb.y, 1e-12));
    }

    #[test]
    fn visibility_is_the_viewport_bounds_test() {
        let p = proj(Projection::Gnomonic, 40.0);
        assert!(p.is_point_visible(WorldPoint::new(0.0, 0.0, CoordSys::EqJ2000)));
        assert!(p.is_point_visible(WorldPoint::new(15.0, 10.0, CoordSys::EqJ2000)));
        // off the frame but still on the frontside
        assert!(!p.is_point_visible(WorldPoint::new(40.0, 0.0, CoordSys::EqJ2000)));
        // backside
        assert!(!p.is_point_visible(WorldPoint::new(180.0, 0.0, CoordSys::EqJ2000)));
    }

    #[test]
    fn orthographic_device_plane_is_bounded() {
        let p = proj(Projection::Orthographic, 120.0);
        // the device corner falls outside the projection disc
        assert!(p.device_to_world(Point { x: 1.0, y: 1.0 }, CoordSys::EqJ2000).is_none());
        // the center resolves
        assert!(
            p.device_to_world(Point { x: 400.0, y: 400.0 }, CoordSys::EqJ2000)
                .is_some()
        );
    }

    #[test]
    fn cross_system_requests_are_rotated() {
        let p = proj(Projection::Stereographic, 90.0);
        // the same physical point expressed in galactic coordinates
        let eq = WorldPoint::new(10.0, 5.0, CoordSys::EqJ2000);
        let gal = crate::precess::rotate_between(eq, CoordSys::Galactic);
        let d_eq = p.world_to_device(eq).unwrap();
        let d_gal = p.world_to_device(gal).unwrap();
        assert!(approx(d_eq.x, d_gal.x, 1e-6));
        assert!(approx(d_eq.y, d_gal.y, 1e-6));
    }

    #[test]
    fn polar_center_sees_the_pole() {
        let p = SphereProjection::new(
            WorldPoint::new(0.0, 90.0, CoordSys::EqJ2000),
            Projection::Equidistant,
            0.0,
            60.0,
            512.0,
            512.0,
        );
        assert!(p.is_point_visible(WorldPoint::new(0.0, 90.0, CoordSys::EqJ2000)));
        assert!(!p.is_point_visible(WorldPoint::new(0.0, -90.0, CoordSys::EqJ2000)));
        // a ring at 70 deg latitude is inside the 30 deg radius field
        assert!(p.is_point_visible(WorldPoint::new(123.0, 70.0, CoordSys::EqJ2000)));
    }
}
