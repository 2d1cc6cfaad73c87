use log::debug;

use crate::options::GridOptions;
use crate::types::{Axis, PoleState, Range, fold_lon};

/// Fixed latitude ladder used when the view already spans pole to pole.
const LAT_LADDER: [f64; 11] = [
    -75.0, -60.0, -45.0, -30.0, -15.0, 0.0, 15.0, 30.0, 45.0, 60.0, 75.0,
];

/// The grid line positions chosen for one overlay, one sorted, deduplicated
/// sequence per axis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelSet {
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
}

impl LevelSet {
    pub fn axis(&self, axis: Axis) -> &[f64] {
        match axis {
            Axis::Lon => &self.lon,
            Axis::Lat => &self.lat,
        }
    }

    pub fn set(&mut self, axis: Axis, vals: Vec<f64>) {
        match axis {
            Axis::Lon => self.lon = vals,
            Axis::Lat => self.lat = vals,
        }
    }

    pub fn len(&self) -> usize {
        self.lon.len() + self.lat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lon.is_empty() && self.lat.is_empty()
    }
}

/// Choose grid line positions for the discovered range.
pub fn select(range: &Range, zoom_factor: f64, opts: &GridOptions, full_sky: bool) -> LevelSet {
    // Full-sky level sets are densified harder because visibility filtering
    // discards many of them afterwards.
    let target = if full_sky {
        2 * opts.min_line_count
    } else {
        opts.min_line_count
    };

    let mut lon = axis_levels(range.lon, Axis::Lon, zoom_factor, opts);
    let mut lat = axis_levels(range.lat, Axis::Lat, zoom_factor, opts);
    if lon.len() < target {
        lon = regrid(&lon, target);
    }
    if lat.len() < target {
        lat = regrid(&lat, target);
    }

    // Wrap longitudes only after regridding; the resample needs monotone input.
    for v in &mut lon {
        *v = fold_lon(*v);
    }
    sort_dedup(&mut lon);
    sort_dedup(&mut lat);

    debug!("levels selected: {} lon, {} lat", lon.len(), lat.len());
    LevelSet { lon, lat }
}

fn axis_levels(bounds: [f64; 2], axis: Axis, factor: f64, opts: &GridOptions) -> Vec<f64> {
    let [min, max] = bounds;
    if min == max {
        return Vec::new();
    }
    if axis == Axis::Lat && (min + 90.0).abs() < 0.1 && (max - 90.0).abs() < 0.1 {
        // both poles captured already; the ladder stops short of them
        return LAT_LADDER.to_vec();
    }

    let mut delta = calculate_delta(min, max, factor, opts.user_delta_limits);
    let span = {
        let d = max - min;
        if d < 0.0 { d + 360.0 } else { d }
    };
    let mut count = (span / delta).ceil() as usize;
    if count <= 2 {
        // a 1-2 line grid reads as noise
        delta /= 2.0;
        count *= 2;
    }
    (0..count).map(|j| min + j as f64 * delta).collect()
}

/// "Nice" level spacing for a span of `max - min` degrees.
pub(crate) fn calculate_delta(
    min: f64,
    max: f64,
    factor: f64,
    user_limits: Option<(f64, f64)>,
) -> f64 {
    let delta = {
        let d = max - min;
        if d < 0.0 { d + 360.0 } else { d }
    };

    let mut q = if delta > 1.0 {
        lookup(delta, factor)
    } else if 60.0 * delta > 1.0 {
        lookup(60.0 * delta, factor) / 60.0
    } else if 3600.0 * delta > 1.0 {
        lookup(3600.0 * delta, factor) / 3600.0
    } else {
        10f64.powf((3600.0 * delta).log10().floor())
    };

    if let Some((lo, hi)) = user_limits
        && !(lo < q && q < hi)
    {
        q = if (lo - q).abs() < (hi - q).abs() { lo } else { hi };
    }
    q
}

fn lookup(val: f64, factor: f64) -> f64 {
    let mut step = if val <= 3.0 {
        0.5
    } else if val <= 6.0 {
        1.0
    } else if val <= 18.0 {
        2.0
    } else if val <= 23.0 {
        5.0
    } else if val <= 30.0 {
        6.0
    } else if val <= 60.0 {
        10.0
    } else if val <= 90.0 {
        20.0
    } else {
        30.0
    };
    if factor >= 4.0 {
        // high magnification wants a denser grid
        step /= 2.0;
    }
    step
}

/// Monotone linear resample of `values` up to `n` entries. Returns the input
/// unchanged when it is already dense enough or too short to interpolate.
pub(crate) fn regrid(values: &[f64], n: usize) -> Vec<f64> {
    if values.len() < 2 || values.len() >= n {
        return values.to_vec();
    }
    let last = values.len() - 1;
    (0..n)
        .map(|k| {
            let t = k as f64 * last as f64 / (n as f64 - 1.0);
            let i = (t.floor() as usize).min(last - 1);
            values[i] + (values[i + 1] - values[i]) * (t - i as f64)
        })
        .collect()
}

fn sort_dedup(v: &mut Vec<f64>) {
    v.sort_by(f64::total_cmp);
    v.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
}

/// Drop levels outside the corner-derived border range (full-sky views).
///
/// An axis whose border equals the discovered range needs no filtering. With
/// a pole inside the viewport the longitude border straddles the
/// discontinuity, so levels survive in either flanking sub-range. When an
/// axis falls under two lines the pre-filter set is regridded denser and the
/// pass retried, up to four passes.
pub fn filter(levels: &LevelSet, border: &Range, range: &Range, poles: PoleState) -> LevelSet {
    let mut current = levels.clone();
    let mut out = LevelSet::default();
    let mut pass = 1usize;

    while pass < 4 && (out.lon.len() < 2 || out.lat.len() < 2) {
        out = LevelSet::default();
        for axis in [Axis::Lon, Axis::Lat] {
            let vals = current.axis(axis);
            let b = border.axis(axis);
            let r = range.axis(axis);
            if b == r {
                out.set(axis, vals.to_vec());
                continue;
            }
            if vals.is_empty() {
                continue;
            }
            let kept = vals
                .iter()
                .copied()
                .filter(|&v| {
                    if axis == Axis::Lon && poles.any() {
                        (v >= r[0] && v <= b[0]) || (v <= r[1] && v >= b[1])
                    } else {
                        v >= b[0] && v <= b[1]
                    }
                })
                .collect();
            out.set(axis, kept);
        }
        pass += 1;
        current = LevelSet {
            lon: regrid(&current.lon, pass * current.lon.len()),
            lat: regrid(&current.lat, pass * current.lat.len()),
        };
    }

    debug!(
        "levels filtered to {} lon, {} lat after {} pass(es)",
        out.lon.len(),
        out.lat.len(),
        pass - 1
    );
    out
}
