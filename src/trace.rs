use log::trace;

use crate::converter::CoordinateConverter;
use crate::types::{Axis, Point, Range, WorldPoint, fold_lat, fold_lon};
use crate::view::ViewDescriptor;

/// Fixed out-of-range device pair marking "no projection at this sample".
pub const SENTINEL: f64 = -10000.0;

/// Raw marker assigned during sampling, normalized to `SENTINEL` afterwards.
pub(crate) const RAW_SENTINEL: f64 = 1.0e20;

/// Any device coordinate at or beyond this magnitude is treated as unresolved.
const SENTINEL_LIMIT: f64 = 1.0e10;

/// Orthogonal-axis step used to size the initial sampling of wide spans.
const COARSE_STEP_DEG: f64 = 10.0;
const BASE_INTERVALS: usize = 4;
const MAX_DOUBLINGS: usize = 10;

/// One grid line sampled into device space. `xs`/`ys` are parallel; a
/// sentinel entry means the sample did not resolve and must never be joined
/// into a segment.
#[derive(Debug, Clone)]
pub struct TracedLine {
    pub axis: Axis,
    pub value: f64,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

impl TracedLine {
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn is_sentinel(&self, i: usize) -> bool {
        self.xs[i] == SENTINEL && self.ys[i] == SENTINEL
    }

    pub fn point(&self, i: usize) -> Point {
        Point {
            x: self.xs[i],
            y: self.ys[i],
        }
    }
}

#[derive(Debug, Clone)]
struct SampleBuf {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

/// Trace one grid line, refining the sampling only while the polyline still
/// bends visibly. The refinement is capped by the screen width (one sample
/// per column at most) and a hard doubling limit.
pub fn trace_line(
    cc: &dyn CoordinateConverter,
    view: &ViewDescriptor,
    axis: Axis,
    value: f64,
    range: &Range,
) -> TracedLine {
    let ortho_span = match axis {
        Axis::Lon => range.lat_span(),
        Axis::Lat => range.lon_span(),
    };
    let n0 = if ortho_span > COARSE_STEP_DEG {
        (ortho_span / COARSE_STEP_DEG) as usize
    } else {
        BASE_INTERVALS
    };

    let (x0, y0, mut dx, mut dy) = match axis {
        Axis::Lon => (value, range.lat[0], 0.0, range.lat_span() / n0 as f64),
        Axis::Lat => (range.lon[0], value, range.lon_span() / n0 as f64, 0.0),
    };

    let mut prev = sample(cc, view, n0, x0, y0, dx, dy, None);
    let mut straight = is_straight(&prev);
    let mut next = prev.clone();
    let mut intervals = 2 * n0;
    let mut count = 1;
    while (intervals as f64) < view.screen_width && count < MAX_DOUBLINGS {
        dx /= 2.0;
        dy /= 2.0;
        next = sample(cc, view, intervals, x0, y0, dx, dy, Some(&prev));
        let nstraight = is_straight(&next);
        if straight && nstraight {
            break;
        }
        straight = nstraight;
        prev = next.clone();
        intervals *= 2;
        count += 1;
    }
    trace!(
        "traced {:?} line at {:.3}: {} samples after {} pass(es)",
        axis,
        value,
        next.xs.len(),
        count
    );

    fix_points(next, axis, value)
}

/// Sample `intervals + 1` parametric positions along the line. When `prev`
/// is given its samples land at the even indices of the new buffer and only
/// the odd ones are converted fresh.
#[allow(clippy::too_many_arguments)]
fn sample(
    cc: &dyn CoordinateConverter,
    view: &ViewDescriptor,
    intervals: usize,
    x0: f64,
    y0: f64,
    dx: f64,
    dy: f64,
    prev: Option<&SampleBuf>,
) -> SampleBuf {
    let len = intervals + 1;
    let mut xs = vec![0.0; len];
    let mut ys = vec![0.0; len];

    let (start, step) = match prev {
        Some(p) => {
            for i in (0..len).step_by(2) {
                xs[i] = p.xs[i / 2];
                ys[i] = p.ys[i / 2];
            }
            (1, 2)
        }
        None => (0, 1),
    };

    let mut i = start;
    while i < len {
        let lon = fold_lon(x0 + i as f64 * dx);
        let lat = fold_lat(y0 + i as f64 * dy);
        match cc.world_to_device(WorldPoint::new(lon, lat, view.csys)) {
            Some(p) => {
                xs[i] = p.x;
                ys[i] = p.y;
            }
            None => {
                xs[i] = RAW_SENTINEL;
                ys[i] = RAW_SENTINEL;
            }
        }
        i += step;
    }
    SampleBuf { xs, ys }
}

/// Whether the polyline bends slowly enough to draw as-is: at every interior
/// vertex, tan²(turn) · (len0 + len1) must stay at or below one. Degenerate
/// and sentinel-adjacent segments are skipped.
fn is_straight(pts: &SampleBuf) -> bool {
    let len = pts.xs.len();
    if len < 3 {
        return true;
    }

    let mut dx1 = pts.xs[1] - pts.xs[0];
    let mut dy1 = pts.ys[1] - pts.ys[0];
    let mut len1 = dx1 * dx1 + dy1 * dy1;

    for i in 1..len - 1 {
        let dx0 = dx1;
        let dy0 = dy1;
        let len0 = len1;
        dx1 = pts.xs[i + 1] - pts.xs[i];
        dy1 = pts.ys[i + 1] - pts.ys[i];
        if dx1 >= RAW_SENTINEL || dy1 >= RAW_SENTINEL {
            continue;
        }
        len1 = dx1 * dx1 + dy1 * dy1;
        if len0 == 0.0 || len1 == 0.0 {
            continue;
        }
        let crossp = dx0 * dx1 + dy0 * dy1;
        let cos_sq = (crossp * crossp) / (len0 * len1);
        if cos_sq == 0.0 {
            return false;
        }
        if cos_sq >= 1.0 {
            continue;
        }
        let tan_sq = (1.0 - cos_sq) / cos_sq;
        if tan_sq * (len0 + len1) > 1.0 {
            return false;
        }
    }
    true
}

/// Force every unresolved or absurdly distant sample to the fixed sentinel
/// pair so segment emission can skip them with a plain comparison.
fn fix_points(pts: SampleBuf, axis: Axis, value: f64) -> TracedLine {
    let SampleBuf { mut xs, mut ys } = pts;
    for i in 0..xs.len() {
        if xs[i].abs() < SENTINEL_LIMIT && ys[i].abs() < SENTINEL_LIMIT {
            continue;
        }
        xs[i] = SENTINEL;
        ys[i] = SENTINEL;
    }
    TracedLine {
        axis,
        value,
        xs,
        ys,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::CoordinateConverter;
    use crate::test_utils::{FlatConverter, approx};
    use crate::types::CoordSys;

    fn buf(points: &[(f64, f64)]) -> SampleBuf {
        SampleBuf {
            xs: points.iter().map(|p| p.0).collect(),
            ys: points.iter().map(|p| p.1).collect(),
        }
    }

    #[test]
    fn straight_horizontal_run_passes_immediately() {
        // three collinear samples, slope 0 across 100 screen pixels
        assert!(is_straight(&buf(&[(0.0, 0.0), (50.0, 0.0), (100.0, 0.0)])));
    }

    #[test]
    fn right_angle_turn_fails() {
        assert!(!is_straight(&buf(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)])));
    }

    #[test]
    fn gentle_bend_passes_sharp_bend_fails() {
        // tiny deviation over short segments
        assert!(is_straight(&buf(&[(0.0, 0.0), (10.0, 0.01), (20.0, 0.0)])));
        // same deviation ratio over long segments exceeds the tolerance
        assert!(!is_straight(&buf(&[
            (0.0, 0.0),
            (100.0, 1.0),
            (200.0, 0.0)
        ])));
    }

    #[test]
    fn sentinel_adjacent_and_degenerate_segments_are_skipped() {
        assert!(is_straight(&buf(&[
            (0.0, 0.0),
            (RAW_SENTINEL, RAW_SENTINEL),
            (10.0, 0.0),
            (10.0, 0.0),
        ])));
        assert!(is_straight(&buf(&[(5.0, 5.0), (5.0, 5.0)])));
    }

    #[test]
    fn linear_projection_stops_after_one_doubling() {
        let cc = FlatConverter::new(10.0, 40.0, 2.0 / 512.0, 512.0, 512.0);
        let view = ViewDescriptor {
            width: 512.0,
            height: 512.0,
            screen_width: 512.0,
            ..ViewDescriptor::default()
        };
        let range = Range {
            lon: [10.0, 12.0],
            lat: [40.0, 42.0],
        };
        let line = trace_line(&cc, &view, Axis::Lon, 11.0, &range);
        // initial 4 intervals, one confirmation doubling, then stop
        assert_eq!(line.len(), 9);
        for i in 0..line.len() {
            assert!(!line.is_sentinel(i));
        }
        // longitude lines are vertical under this mapping
        let x0 = line.xs[0];
        for &x in &line.xs {
            assert!(approx(x, x0, 1e-9));
        }
    }

    #[test]
    fn bent_projection_keeps_refining() {
        // a V-shaped device mapping: the straightness test can never pass
        struct Kink;
        impl CoordinateConverter for Kink {
            fn world_to_device(&self, wp: WorldPoint) -> Option<Point> {
                Some(Point {
                    x: wp.lat * 50.0,
                    y: (wp.lat - 41.0).abs() * 50.0,
                })
            }
            fn device_to_world(&self, _dp: Point, _csys: CoordSys) -> Option<WorldPoint> {
                None
            }
            fn is_point_visible(&self, _wp: WorldPoint) -> bool {
                true
            }
        }

        let view = ViewDescriptor {
            width: 512.0,
            height: 512.0,
            screen_width: 800.0,
            ..ViewDescriptor::default()
        };
        let range = Range {
            lon: [10.0, 12.0],
            lat: [40.0, 42.0],
        };
        let line = trace_line(&Kink, &view, Axis::Lon, 11.0, &range);
        assert!(line.len() >= 65, "kinked line stayed at {}", line.len());
    }

    #[test]
    fn unresolved_samples_become_the_fixed_sentinel() {
        // resolves only the northern half of the line
        struct HalfBlind;
        impl CoordinateConverter for HalfBlind {
            fn world_to_device(&self, wp: WorldPoint) -> Option<Point> {
                (wp.lat >= 41.0).then_some(Point {
                    x: wp.lon,
                    y: wp.lat,
                })
            }
            fn device_to_world(&self, _dp: Point, _csys: CoordSys) -> Option<WorldPoint> {
                None
            }
            fn is_point_visible(&self, _wp: WorldPoint) -> bool {
                false
            }
        }

        let view = ViewDescriptor::default();
        let range = Range {
            lon: [10.0, 12.0],
            lat: [40.0, 42.0],
        };
        let line = trace_line(&HalfBlind, &view, Axis::Lon, 11.0, &range);
        let sentinels = (0..line.len()).filter(|&i| line.is_sentinel(i)).count();
        assert!(sentinels > 0);
        for i in 0..line.len() {
            if line.is_sentinel(i) {
                assert_eq!(line.xs[i], SENTINEL);
                assert_eq!(line.ys[i], SENTINEL);
            } else {
                assert!(line.ys[i] >= 41.0);
            }
        }
    }

    #[test]
    fn latitude_line_walks_the_wrapped_longitude_span() {
        let cc = FlatConverter::new(350.0, -10.0, 20.0 / 512.0, 512.0, 512.0);
        let view = ViewDescriptor {
            width: 512.0,
            height: 512.0,
            screen_width: 512.0,
            ..ViewDescriptor::default()
        };
        let range = Range {
            lon: [350.0, 10.0],
            lat: [-10.0, 10.0],
        };
        let line = trace_line(&cc, &view, Axis::Lat, 0.0, &range);
        assert!(!line.is_empty());
        // the device x sweep covers the window without a seam jump
        let first = line.xs[0];
        let last = *line.xs.last().unwrap();
        assert!(first < last);
        assert!(approx(last - first, 512.0, 1.0));
    }
}
