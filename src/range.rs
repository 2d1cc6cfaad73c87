use log::debug;

use crate::converter::CoordinateConverter;
use crate::types::{CoordSys, PoleState, Point, Range, WorldPoint, Wrap, angular_sep_deg, fold_lon};
use crate::view::ViewDescriptor;

/// An axis is stable once a finer edge walk grows its span by less than 2%.
pub(crate) const RANGE_THRESHOLD: f64 = 1.02;

const POLE_LON_MIN: f64 = -179.999;
const POLE_LON_MAX: f64 = 179.999;
const BOUNDARY_PROBE_STEPS: usize = 10;
const CORNER_SEARCH_INTERVALS: usize = 100;

/// Result of range discovery.
#[derive(Debug, Clone, Copy)]
pub struct Discovery {
    pub range: Range,
    pub poles: PoleState,
    pub wrap: Wrap,
}

/// Working extent indexed [axis][min,max], lon = 0, lat = 1.
type Extent = [[f64; 2]; 2];

const EMPTY_EXTENT: Extent = [[1.0e20, -1.0e20], [1.0e20, -1.0e20]];

fn walked(v: f64) -> Option<f64> {
    (v.abs() < 1.0e19).then_some(v)
}

fn extent_to_range(e: Extent) -> Range {
    Range {
        lon: e[0],
        lat: e[1],
    }
}

/// Determine the world-coordinate extent visible in the viewport.
pub fn discover(cc: &dyn CoordinateConverter, view: &ViewDescriptor) -> Discovery {
    let d = if view.is_full_sky {
        discover_full_sky(cc, view)
    } else {
        discover_image(cc, view)
    };
    debug!(
        "range discovered: lon {:?} lat {:?} poles {:?} wrap {:?}",
        d.range.lon, d.range.lat, d.poles, d.wrap
    );
    d
}

fn discover_image(cc: &dyn CoordinateConverter, view: &ViewDescriptor) -> Discovery {
    let csys = view.csys;
    let mut range = Range {
        lon: [0.0, 0.0],
        lat: [0.0, 0.0],
    };
    let mut poles = PoleState::None;
    let mut wrap = Wrap::NotWrapped;

    // A visible pole fixes that half of the latitude range, widens the
    // longitude range to the full wrapped interval, and forces wraparound.
    // The converter's own visibility test decides membership.
    if cc.is_point_visible(WorldPoint::new(0.0, 90.0, csys)) {
        range.lon = [POLE_LON_MIN, POLE_LON_MAX];
        range.lat[1] = 90.0;
        poles = poles.with_north();
        wrap = Wrap::Wrapped;
    }
    if cc.is_point_visible(WorldPoint::new(0.0, -90.0, csys)) {
        range.lon = [POLE_LON_MIN, POLE_LON_MAX];
        range.lat[0] = -90.0;
        poles = poles.with_south();
        wrap = Wrap::Wrapped;
    }
    if poles == PoleState::Both {
        return Discovery { range, poles, wrap };
    }

    let mut trange = edge_vals(cc, view, 1, wrap);
    if wrap == Wrap::NotWrapped {
        // No pole in the frame, but the image may still straddle the 0/360
        // seam. Probe the seam meridian at the mean walked latitude.
        let mean_lat = (trange[1][0] + trange[1][1]) / 2.0;
        if cc.is_point_visible(WorldPoint::new(0.0, mean_lat, csys)) {
            wrap = Wrap::Wrapped;
            trange = edge_vals(cc, view, 1, wrap);
        } else if csys == CoordSys::Galactic {
            // Secondary check for Galactic views: re-walk with membership
            // left to the converter, then probe the seam again.
            trange = edge_vals(cc, view, 1, Wrap::Undetermined);
            let mean_lat = (trange[1][0] + trange[1][1]) / 2.0;
            if cc.is_point_visible(WorldPoint::new(0.0, mean_lat, csys)) {
                wrap = Wrap::Wrapped;
                trange = edge_vals(cc, view, 1, wrap);
            }
        }
    }

    // Refine with doubling interval counts until the measured extent stops
    // growing. Capped by the viewport width, so a hostile converter cannot
    // stall the loop.
    let mut xrange = trange;
    let mut intervals = 2usize;
    while (intervals as f64) < view.width {
        xrange = edge_vals(cc, view, intervals, wrap);
        if test_edge(&mut xrange, &trange) {
            break;
        }
        trange = xrange;
        intervals *= 2;
    }
    debug!("edge walk stabilized at {intervals} intervals");

    match poles {
        PoleState::None => {
            if walked(xrange[0][0]).is_none() {
                // Converter resolved nothing anywhere: empty extent, empty grid.
                return Discovery {
                    range: Range {
                        lon: [0.0, 0.0],
                        lat: [0.0, 0.0],
                    },
                    poles,
                    wrap,
                };
            }
            if wrap == Wrap::Wrapped {
                // Encode the seam crossing as lon.min > lon.max.
                xrange[0][0] += 360.0;
            }
            Discovery {
                range: extent_to_range(xrange),
                poles,
                wrap,
            }
        }
        PoleState::North => {
            // Only the walked hemisphere bound is trusted; the other stays ±90.
            if let Some(lat_min) = walked(xrange[1][0]) {
                range.lat[0] = lat_min;
            }
            Discovery { range, poles, wrap }
        }
        PoleState::South => {
            if let Some(lat_max) = walked(xrange[1][1]) {
                range.lat[1] = lat_max;
            }
            Discovery { range, poles, wrap }
        }
        PoleState::Both => Discovery { range, poles, wrap },
    }
}

/// Walk the four viewport edges plus an interior diagonal, accumulating
/// world-coordinate extrema.
fn edge_vals(
    cc: &dyn CoordinateConverter,
    view: &ViewDescriptor,
    intervals: usize,
    wrap: Wrap,
) -> Extent {
    let mut extent = EMPTY_EXTENT;
    let (width, height) = (view.width, view.height);
    let xdelta = width / intervals as f64 - 1.0;
    let ydelta = height / intervals as f64 - 1.0;

    // Top: left to right.
    edge_run(cc, view, intervals, 0.0, height, xdelta, 0.0, wrap, &mut extent);
    // Bottom: right to left.
    edge_run(cc, view, intervals, width, 0.0, -xdelta, 0.0, wrap, &mut extent);
    // Left: bottom to top.
    edge_run(cc, view, intervals, 0.0, 0.0, 0.0, ydelta, wrap, &mut extent);
    // Right: top to bottom.
    edge_run(cc, view, intervals, width, height, 0.0, -ydelta, wrap, &mut extent);
    // Interior diagonal sweep.
    edge_run(cc, view, intervals, 0.0, 0.0, xdelta, ydelta, wrap, &mut extent);

    extent
}

#[allow(clippy::too_many_arguments)]
fn edge_run(
    cc: &dyn CoordinateConverter,
    view: &ViewDescriptor,
    intervals: usize,
    x0: f64,
    y0: f64,
    dx: f64,
    dy: f64,
    wrap: Wrap,
    extent: &mut Extent,
) {
    let csys = view.csys;
    let mut x = x0;
    let mut y = y0;
    for _ in 0..=intervals {
        // Samples that fail to convert contribute no extrema.
        if let Some(wp) = cc.device_to_world(Point { x, y }, csys) {
            let mut lon = wp.lon;
            let lat = wp.lat;
            if wrap == Wrap::Wrapped && lon > 180.0 {
                lon -= 360.0;
            }
            let accept = match wrap {
                Wrap::Wrapped | Wrap::NotWrapped => true,
                Wrap::Undetermined => {
                    csys.is_equatorial() || cc.is_point_visible(WorldPoint::new(lon, lat, csys))
                }
            };
            if accept {
                if lon < extent[0][0] {
                    extent[0][0] = lon;
                }
                if lon > extent[0][1] {
                    extent[0][1] = lon;
                }
                if lat < extent[1][0] {
                    extent[1][0] = lat;
                }
                if lat > extent[1][1] {
                    extent[1][1] = lat;
                }
            }
        }
        x += dx;
        y += dy;
    }
}

/// Compare a finer walk against the previous one. `xrange` absorbs the most
/// extreme bounds seen so far. Stable when every axis with a previous span
/// grew by no more than `RANGE_THRESHOLD`; a span going zero to nonzero is
/// an immediate instability unless both spans are zero.
fn test_edge(xrange: &mut Extent, trange: &Extent) -> bool {
    let deltas = [
        (trange[0][1] - trange[0][0]).abs(),
        (trange[1][1] - trange[1][0]).abs(),
    ];

    for i in 0..2 {
        let ndelta = (xrange[i][1] - xrange[i][0]).abs();
        if ndelta <= 0.0 && deltas[i] <= 0.0 {
            continue;
        }
        if xrange[i][0] > trange[i][0] {
            xrange[i][0] = trange[i][0];
        }
        if xrange[i][1] < trange[i][1] {
            xrange[i][1] = trange[i][1];
        }
        if deltas[i] == 0.0 {
            return false;
        }
        if (xrange[i][1] - xrange[i][0]).abs() / deltas[i] > RANGE_THRESHOLD {
            return false;
        }
    }
    true
}

/// Full-sky discovery never walks edges: a hemisphere-or-larger field is the
/// whole sphere; anything smaller is bounded by the visible sky cells.
fn discover_full_sky(cc: &dyn CoordinateConverter, view: &ViewDescriptor) -> Discovery {
    let csys = view.csys;
    if view.fov_deg >= 180.0 {
        return Discovery {
            range: Range::FULL_SKY,
            poles: PoleState::Both,
            wrap: Wrap::Wrapped,
        };
    }

    let mut poles = PoleState::None;
    if cc.is_point_visible(WorldPoint::new(0.0, 90.0, csys)) {
        poles = poles.with_north();
    }
    if cc.is_point_visible(WorldPoint::new(0.0, -90.0, csys)) {
        poles = poles.with_south();
    }
    let wrap = if poles.any() {
        Wrap::Wrapped
    } else {
        Wrap::NotWrapped
    };

    let center = view.center;
    let cell = cell_size_deg(view.fov_deg);
    let corners = visible_cell_corners(center.lon, center.lat, view.fov_deg, cell);

    let mut lon_min = f64::MAX;
    let mut lon_max = f64::MIN;
    let mut lat_min = f64::MAX;
    let mut lat_max = f64::MIN;
    for &(lon, lat) in &corners {
        lon_min = lon_min.min(lon);
        lon_max = lon_max.max(lon);
        lat_min = lat_min.min(lat);
        lat_max = lat_max.max(lat);
    }

    // The tessellation is coarse; a short linear probe in each direction
    // catches boundary cells it missed. Ten steps, no bisection.
    let n = BOUNDARY_PROBE_STEPS as f64;
    if lon_max < 360.0 {
        let base = lon_max;
        let delta = (360.0 - base) / n;
        for i in 0..BOUNDARY_PROBE_STEPS {
            let x = base + (i as f64 + 1.0) * delta;
            if cc.is_point_visible(WorldPoint::new(fold_lon(x), center.lat, csys)) && x > lon_max {
                lon_max = x;
            }
        }
    }
    if lon_min > 0.0 {
        let base = lon_min;
        let delta = base / n;
        for i in 0..BOUNDARY_PROBE_STEPS {
            let x = base - (i as f64 + 1.0) * delta;
            if cc.is_point_visible(WorldPoint::new(fold_lon(x), center.lat, csys)) && x < lon_min {
                lon_min = x;
            }
        }
    }
    if lat_max < 90.0 {
        let base = lat_max;
        let delta = (90.0 - base) / n;
        for i in 0..BOUNDARY_PROBE_STEPS {
            let y = base + (i as f64 + 1.0) * delta;
            if cc.is_point_visible(WorldPoint::new(center.lon, y, csys)) && y > lat_max {
                lat_max = y;
            }
        }
    }
    if lat_min > -90.0 {
        let base = lat_min;
        let delta = (base + 90.0) / n;
        for i in 0..BOUNDARY_PROBE_STEPS {
            let y = base - (i as f64 + 1.0) * delta;
            if cc.is_point_visible(WorldPoint::new(center.lon, y, csys)) && y < lat_min {
                lat_min = y;
            }
        }
    }

    Discovery {
        range: Range {
            lon: [lon_min.max(0.0), lon_max.min(360.0)],
            lat: [lat_min.max(-90.0), lat_max.min(90.0)],
        },
        poles,
        wrap,
    }
}

fn cell_size_deg(fov: f64) -> f64 {
    // roughly eight cells across the field
    (fov / 8.0).clamp(0.5, 16.0)
}

/// Corner points of the tessellation cells overlapping the view cap.
fn visible_cell_corners(clon: f64, clat: f64, fov: f64, cell: f64) -> Vec<(f64, f64)> {
    let radius = fov / 2.0;
    let pad = cell * std::f64::consts::SQRT_2;
    let mut corners = Vec::new();

    let mut lat = (((clat - radius) / cell).floor() * cell - cell).max(-90.0);
    let lat_hi = (((clat + radius) / cell).ceil() * cell + cell).min(90.0);
    while lat < lat_hi {
        let lat_top = (lat + cell).min(90.0);
        let mut lon = 0.0;
        while lon < 360.0 {
            let mid_lat = ((lat + lat_top) / 2.0).clamp(-90.0, 90.0);
            if angular_sep_deg(clon, clat, lon + cell / 2.0, mid_lat) <= radius + pad {
                corners.push((lon, lat));
                corners.push((lon + cell, lat));
                corners.push((lon, lat_top));
                corners.push((lon + cell, lat_top));
            }
            lon += cell;
        }
        lat += cell;
    }
    corners
}

/// World extent of the four viewport corners, searched inward along the
/// edges until the converter resolves a point. `None` when any corner stays
/// unresolved — the view covers more than the projected sphere, so level
/// filtering is skipped.
pub fn view_border(cc: &dyn CoordinateConverter, view: &ViewDescriptor) -> Option<Range> {
    let (w, h) = (view.width, view.height);
    let n = CORNER_SEARCH_INTERVALS;
    let dx = w / n as f64 - 1.0;
    let dy = h / n as f64 - 1.0;

    let corners = [
        corner_search(cc, view, Point { x: 0.0, y: h }, dx, 0.0, n)?,
        corner_search(cc, view, Point { x: w, y: 0.0 }, -dx, 0.0, n)?,
        corner_search(cc, view, Point { x: 0.0, y: 0.0 }, 0.0, dy, n)?,
        corner_search(cc, view, Point { x: w, y: h }, 0.0, -dy, n)?,
    ];

    let mut lon = [f64::MAX, f64::MIN];
    let mut lat = [f64::MAX, f64::MIN];
    for c in corners {
        lon[0] = lon[0].min(c.lon);
        lon[1] = lon[1].max(c.lon);
        lat[0] = lat[0].min(c.lat);
        lat[1] = lat[1].max(c.lat);
    }
    Some(Range { lon, lat })
}

fn corner_search(
    cc: &dyn CoordinateConverter,
    view: &ViewDescriptor,
    start: Point,
    dx: f64,
    dy: f64,
    intervals: usize,
) -> Option<WorldPoint> {
    let mut x = start.x;
    let mut y = start.y;
    for _ in 0..=intervals {
        if let Some(wp) = cc.device_to_world(Point { x, y }, view.csys) {
            return Some(wp);
        }
        x += dx;
        y += dy;
    }
    None
}
