use log::debug;
use thiserror::Error;

use crate::converter::CoordinateConverter;
use crate::emit::{self, GridOverlay};
use crate::levels;
use crate::options::GridOptions;
use crate::range;
use crate::trace::{self, TracedLine};
use crate::types::{Axis, Point};
use crate::view::ViewDescriptor;

/// Precondition violations. "No data" conditions never land here; they
/// produce an empty overlay instead.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("degenerate viewport {width}x{height}")]
    DegenerateViewport { width: f64, height: f64 },
}

/// Compute the grid overlay for one view snapshot.
///
/// Pure and deterministic: identical inputs give identical output, every
/// internal loop is iteration-capped, and nothing outlives the call. Safe to
/// run on every pan/zoom frame.
pub fn compute_grid(
    cc: &dyn CoordinateConverter,
    view: &ViewDescriptor,
    opts: &GridOptions,
) -> Result<GridOverlay, GridError> {
    if view.width <= 0.0 || view.height <= 0.0 {
        return Err(GridError::DegenerateViewport {
            width: view.width,
            height: view.height,
        });
    }

    // An all-sky image projection leaves the device corner unresolved; its
    // seam jumps need suppression during emission.
    let aitoff = !view.is_full_sky
        && cc
            .device_to_world(Point { x: 1.0, y: 1.0 }, view.csys)
            .is_none();

    let discovery = range::discover(cc, view);
    let zoom = if view.zoom_factor < 1.0 {
        1.0
    } else {
        view.zoom_factor
    };
    let mut levels = levels::select(&discovery.range, zoom, opts, view.is_full_sky);

    // On full-sky views with all four corners on the sphere, levels outside
    // the corner border are off screen; drop them and trace over the border.
    let mut trace_range = discovery.range;
    if view.is_full_sky
        && let Some(border) = range::view_border(cc, view)
    {
        levels = levels::filter(&levels, &border, &discovery.range, discovery.poles);
        trace_range = border;
    }

    let mut lines: Vec<TracedLine> = Vec::with_capacity(levels.len());
    for &value in &levels.lon {
        lines.push(trace::trace_line(cc, view, Axis::Lon, value, &trace_range));
    }
    for &value in &levels.lat {
        lines.push(trace::trace_line(cc, view, Axis::Lat, value, &trace_range));
    }

    let overlay = emit::emit(&lines, view, opts.use_labels, aitoff);
    debug!(
        "grid overlay done: {} lines -> {} segments, {} labels",
        lines.len(),
        overlay.segments.len(),
        overlay.labels.len()
    );
    Ok(overlay)
}
