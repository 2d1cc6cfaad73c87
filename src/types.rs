use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Longitude/latitude in degrees, tagged with the system they are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    pub lon: f64,
    pub lat: f64,
    pub csys: CoordSys,
}

impl WorldPoint {
    pub fn new(lon: f64, lat: f64, csys: CoordSys) -> Self {
        Self { lon, lat, csys }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordSys {
    EqJ2000,
    EqB1950,
    Galactic,
    Ecliptic,
}

impl CoordSys {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "j2000" => Some(Self::EqJ2000),
            "b1950" => Some(Self::EqB1950),
            "galactic" => Some(Self::Galactic),
            "ecliptic" => Some(Self::Ecliptic),
            _ => None,
        }
    }

    /// Equatorial systems get sexagesimal labels; the rest decimal degrees.
    pub fn is_equatorial(self) -> bool {
        matches!(self, Self::EqJ2000 | Self::EqB1950)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelFormat {
    Hms,
    Decimal,
}

/// Grid axis: longitude lines run "vertical-ish", latitude lines
/// "horizontal-ish".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Lon,
    Lat,
}

/// Which coordinate poles fall inside the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoleState {
    None,
    North,
    South,
    Both,
}

impl PoleState {
    pub fn any(self) -> bool {
        self != Self::None
    }

    pub fn with_north(self) -> Self {
        match self {
            Self::None | Self::North => Self::North,
            Self::South | Self::Both => Self::Both,
        }
    }

    pub fn with_south(self) -> Self {
        match self {
            Self::None | Self::South => Self::South,
            Self::North | Self::Both => Self::Both,
        }
    }
}

/// Wraparound state of the view across the 0/360 longitude seam.
///
/// `Undetermined` is a probing state used during range discovery: an edge
/// sample only counts when the converter confirms it visible (or the system
/// is equatorial, where the seam behaves).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrap {
    Wrapped,
    NotWrapped,
    Undetermined,
}

/// Rectangular world-coordinate extent in degrees.
///
/// `lon[0] > lon[1]` encodes an interval wrapped through the 0/360 seam;
/// range discovery constructs that form explicitly, never by accident.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub lon: [f64; 2],
    pub lat: [f64; 2],
}

impl Range {
    pub const FULL_SKY: Range = Range {
        lon: [0.0, 360.0],
        lat: [-90.0, 90.0],
    };

    pub fn axis(&self, axis: Axis) -> [f64; 2] {
        match axis {
            Axis::Lon => self.lon,
            Axis::Lat => self.lat,
        }
    }

    /// Longitude span, unwrapped through the seam when `lon[0] > lon[1]`.
    pub fn lon_span(&self) -> f64 {
        let d = self.lon[1] - self.lon[0];
        if d < 0.0 { d + 360.0 } else { d }
    }

    pub fn lat_span(&self) -> f64 {
        self.lat[1] - self.lat[0]
    }
}

/// Fold a longitude into [0, 360).
pub fn fold_lon(deg: f64) -> f64 {
    if deg >= 360.0 {
        deg - 360.0
    } else if deg < 0.0 {
        deg + 360.0
    } else {
        deg
    }
}

/// Fold a latitude overshooting a pole back into [-90, 90], crossing to the
/// opposite meridian the way a traced line does.
pub fn fold_lat(deg: f64) -> f64 {
    if deg > 90.0 {
        deg - 180.0
    } else if deg < -90.0 {
        deg + 180.0
    } else {
        deg
    }
}

/// Great-circle separation between two points, in degrees.
pub fn angular_sep_deg(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (l1, b1) = (lon1.to_radians(), lat1.to_radians());
    let (l2, b2) = (lon2.to_radians(), lat2.to_radians());
    let cos_d = (b1.sin() * b2.sin() + b1.cos() * b2.cos() * (l1 - l2).cos()).clamp(-1.0, 1.0);
    cos_d.acos().to_degrees()
}

pub fn hours_to_degrees(hours: f64) -> f64 {
    hours * 15.0
}

pub fn sexagesimal_hms_to_hours(h: f64, m: f64, s: f64) -> f64 {
    h + (m * 60.0 + s) / 3600.0
}

pub fn sexagesimal_dms_to_degrees(d: f64, m: f64, s: f64) -> f64 {
    let sign = if d.is_sign_negative() { -1.0 } else { 1.0 };
    let ad = d.abs();
    sign * (ad + (m * 60.0 + s) / 3600.0)
}

pub fn parse_or<T: std::str::FromStr>(s: &str, default: T) -> T {
    s.parse::<T>().unwrap_or(default)
}

fn parse_triplet(s: &str) -> Option<(f64, f64, f64)> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 3 {
        return None;
    }
    Some((
        parse_or(parts[0], 0.0),
        parse_or(parts[1], 0.0),
        parse_or(parts[2], 0.0),
    ))
}

pub fn parse_hms(s: &str) -> Option<(f64, f64, f64)> {
    parse_triplet(s)
}

pub fn parse_dms(s: &str) -> Option<(f64, f64, f64)> {
    parse_triplet(s)
}

/// Render a longitude as hours:minutes:seconds, e.g. `05:35:17.3`.
pub fn format_lon_hms(deg: f64) -> String {
    let hours = fold_lon(deg) / 15.0;
    let h = hours.floor();
    let m = ((hours - h) * 60.0).floor();
    let s = (hours - h) * 3600.0 - m * 60.0;
    // rounding to one decimal may carry the seconds into the next minute
    let (h, m, s) = carry_sexagesimal(h, m, s, 59.95, 24.0);
    format!("{:02}:{:02}:{:04.1}", h as u32 % 24, m as u32, s)
}

/// Render a latitude as signed degrees:minutes:seconds, e.g. `-05:23:28`.
pub fn format_lat_dms(deg: f64) -> String {
    let sign = if deg < 0.0 { "-" } else { "+" };
    let ad = deg.abs();
    let d = ad.floor();
    let m = ((ad - d) * 60.0).floor();
    let s = (ad - d) * 3600.0 - m * 60.0;
    let (d, m, s) = carry_sexagesimal(d, m, s, 59.5, 91.0);
    format!("{sign}{:02}:{:02}:{:02.0}", d as u32, m as u32, s.round())
}

fn carry_sexagesimal(
    mut big: f64,
    mut mid: f64,
    mut small: f64,
    carry_at: f64,
    modulus: f64,
) -> (f64, f64, f64) {
    if small >= carry_at {
        small = 0.0;
        mid += 1.0;
    }
    if mid >= 60.0 {
        mid = 0.0;
        big += 1.0;
    }
    if big >= modulus {
        big = 0.0;
    }
    (big, mid, small)
}

/// Decimal-degree label text at label precision.
pub fn format_decimal(deg: f64) -> String {
    format!("{deg:.3}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::approx;

    #[test]
    fn coord_sys_from_str_recognizes_known_values() {
        assert_eq!(CoordSys::from_str("j2000"), Some(CoordSys::EqJ2000));
        assert_eq!(CoordSys::from_str("b1950"), Some(CoordSys::EqB1950));
        assert_eq!(CoordSys::from_str("galactic"), Some(CoordSys::Galactic));
        assert_eq!(CoordSys::from_str("ecliptic"), Some(CoordSys::Ecliptic));
        assert_eq!(CoordSys::from_str("supergalactic"), None);
    }

    #[test]
    fn pole_state_accumulates() {
        assert_eq!(PoleState::None.with_north(), PoleState::North);
        assert_eq!(PoleState::North.with_south(), PoleState::Both);
        assert_eq!(PoleState::South.with_north(), PoleState::Both);
        assert!(!PoleState::None.any());
        assert!(PoleState::South.any());
    }

    #[test]
    fn range_spans_handle_the_seam() {
        let r = Range {
            lon: [350.0, 10.0],
            lat: [-5.0, 5.0],
        };
        assert!(approx(r.lon_span(), 20.0, 1e-12));
        assert!(approx(r.lat_span(), 10.0, 1e-12));

        let plain = Range {
            lon: [10.0, 12.0],
            lat: [40.0, 42.0],
        };
        assert!(approx(plain.lon_span(), 2.0, 1e-12));
    }

    #[test]
    fn fold_lon_wraps_both_ways() {
        assert!(approx(fold_lon(361.0), 1.0, 1e-12));
        assert!(approx(fold_lon(-1.0), 359.0, 1e-12));
        assert!(approx(fold_lon(359.0), 359.0, 1e-12));
        assert!(approx(fold_lon(360.0), 0.0, 1e-12));
    }

    #[test]
    fn fold_lat_reflects_through_the_pole() {
        assert!(approx(fold_lat(91.0), -89.0, 1e-12));
        assert!(approx(fold_lat(-91.0), 89.0, 1e-12));
        assert!(approx(fold_lat(45.0), 45.0, 1e-12));
    }

    #[test]
    fn angular_sep_on_equator_and_meridian() {
        assert!(approx(angular_sep_deg(0.0, 0.0, 90.0, 0.0), 90.0, 1e-9));
        assert!(approx(angular_sep_deg(10.0, -45.0, 10.0, 45.0), 90.0, 1e-9));
        assert!(approx(angular_sep_deg(123.0, 17.0, 123.0, 17.0), 0.0, 1e-9));
    }

    #[test]
    fn hms_round_trips_through_the_parser() {
        let s = format_lon_hms(83.82208333333332);
        let (h, m, sec) = parse_hms(&s).unwrap();
        let back = hours_to_degrees(sexagesimal_hms_to_hours(h, m, sec));
        assert!(approx(back, 83.82208333333332, 0.05 * 15.0 / 3600.0));
    }

    #[test]
    fn hms_formats_known_values() {
        assert_eq!(format_lon_hms(0.0), "00:00:00.0");
        assert_eq!(format_lon_hms(15.0), "01:00:00.0");
        // 359.9999999 rounds up to 24h and wraps back to 0h
        assert_eq!(format_lon_hms(359.9999999), "00:00:00.0");
    }

    #[test]
    fn dms_formats_with_sign() {
        assert_eq!(format_lat_dms(10.5), "+10:30:00");
        assert_eq!(format_lat_dms(-5.391111), "-05:23:28");
        assert_eq!(format_lat_dms(90.0), "+90:00:00");
    }

    #[test]
    fn decimal_labels_carry_three_places() {
        assert_eq!(format_decimal(12.3), "12.300");
        assert_eq!(format_decimal(-0.5), "-0.500");
    }

    #[test]
    fn parse_hms_ok_and_wrong_lengths() {
        let (h, m, s) = parse_hms("12:34:56.7").expect("should parse");
        assert!(approx(h, 12.0, 1e-12));
        assert!(approx(m, 34.0, 1e-12));
        assert!(approx(s, 56.7, 1e-12));

        assert!(parse_hms("12:34").is_none());
        assert!(parse_hms("12:34:56:78").is_none());
        assert!(parse_hms("").is_none());
    }

    #[test]
    fn dms_to_degrees_positive_and_negative() {
        assert!(approx(
            sexagesimal_dms_to_degrees(10.0, 30.0, 0.0),
            10.5,
            1e-12
        ));
        assert!(approx(
            sexagesimal_dms_to_degrees(-10.0, 30.0, 0.0),
            -10.5,
            1e-12
        ));
        // -0 degrees keeps its sign
        assert!(approx(
            sexagesimal_dms_to_degrees(-0.0, 30.0, 0.0),
            -0.5,
            1e-12
        ));
    }
}
