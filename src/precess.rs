//! Rotations between the supported coordinate systems.
//!
//! All conversions route through J2000 equatorial. The B1950 precession is
//! the rotation-only FK4->FK5 matrix; E-terms of aberration are below label
//! precision and are not applied.

use crate::types::{CoordSys, WorldPoint, fold_lon};

pub(crate) type Mat3 = [[f64; 3]; 3];

const IDENTITY: Mat3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// J2000 equatorial -> galactic (IAU 1958 pole in the J2000 frame).
const EQ_TO_GAL: Mat3 = [
    [-0.054875539, -0.873437105, -0.483834992],
    [0.494109454, -0.444829594, 0.746982249],
    [-0.867666136, -0.198076390, 0.455983795],
];

/// FK4 B1950 -> FK5 J2000 precession.
const B1950_TO_J2000: Mat3 = [
    [0.9999256782, -0.0111820611, -0.0048579477],
    [0.0111820610, 0.9999374784, -0.0000271765],
    [0.0048579479, -0.0000271474, 0.9999881997],
];

/// Mean obliquity of the ecliptic at J2000, degrees.
const OBLIQUITY_J2000_DEG: f64 = 23.439291111;

fn unit_vector(lon_deg: f64, lat_deg: f64) -> [f64; 3] {
    let (l, b) = (lon_deg.to_radians(), lat_deg.to_radians());
    [b.cos() * l.cos(), b.cos() * l.sin(), b.sin()]
}

fn lon_lat(v: [f64; 3]) -> (f64, f64) {
    let lat = v[2].clamp(-1.0, 1.0).asin().to_degrees();
    let lon = fold_lon(v[1].atan2(v[0]).to_degrees());
    (lon, lat)
}

fn mat_vec(m: &Mat3, v: [f64; 3]) -> [f64; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

fn transpose(m: &Mat3) -> Mat3 {
    let mut t = IDENTITY;
    for (i, row) in m.iter().enumerate() {
        for (j, &val) in row.iter().enumerate() {
            t[j][i] = val;
        }
    }
    t
}

fn mat_mul(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut out = IDENTITY;
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
        }
    }
    out
}

fn eq_to_ecl() -> Mat3 {
    let e = OBLIQUITY_J2000_DEG.to_radians();
    [
        [1.0, 0.0, 0.0],
        [0.0, e.cos(), e.sin()],
        [0.0, -e.sin(), e.cos()],
    ]
}

fn from_j2000(csys: CoordSys) -> Mat3 {
    match csys {
        CoordSys::EqJ2000 => IDENTITY,
        CoordSys::EqB1950 => transpose(&B1950_TO_J2000),
        CoordSys::Galactic => EQ_TO_GAL,
        CoordSys::Ecliptic => eq_to_ecl(),
    }
}

/// Rotation matrix taking unit vectors from `from` to `to`.
pub(crate) fn rotation(from: CoordSys, to: CoordSys) -> Mat3 {
    // rotations are orthogonal, so to-J2000 is the transpose of from-J2000
    mat_mul(&from_j2000(to), &transpose(&from_j2000(from)))
}

/// Express a world point in another coordinate system.
pub fn rotate_between(wp: WorldPoint, to: CoordSys) -> WorldPoint {
    if wp.csys == to {
        return wp;
    }
    let m = rotation(wp.csys, to);
    let (lon, lat) = lon_lat(mat_vec(&m, unit_vector(wp.lon, wp.lat)));
    WorldPoint::new(lon, lat, to)
}

/// Caller-owned memo for repeated conversions over one system pair. The
/// rotation is rebuilt only when the pair changes; the cache never escapes
/// the scope that created it, so repeated computations stay reproducible
/// from their declared inputs.
#[derive(Debug, Clone)]
pub struct PrecessionCache {
    key: Option<(CoordSys, CoordSys)>,
    matrix: Mat3,
}

impl Default for PrecessionCache {
    fn default() -> Self {
        Self {
            key: None,
            matrix: IDENTITY,
        }
    }
}

impl PrecessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn convert(&mut self, wp: WorldPoint, to: CoordSys) -> WorldPoint {
        if wp.csys == to {
            return wp;
        }
        if self.key != Some((wp.csys, to)) {
            self.matrix = rotation(wp.csys, to);
            self.key = Some((wp.csys, to));
        }
        let (lon, lat) = lon_lat(mat_vec(&self.matrix, unit_vector(wp.lon, wp.lat)));
        WorldPoint::new(lon, lat, to)
    }
}
