use log::debug;
use serde::{Deserialize, Serialize};

use crate::trace::TracedLine;
use crate::types::{
    Axis, CoordSys, LabelFormat, Point, format_decimal, format_lat_dms, format_lon_hms,
};
use crate::view::{Bounds, ViewDescriptor};

/// One drawable line primitive in device space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub a: Point,
    pub b: Point,
}

/// Rotated text attached to one traced line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub text: String,
    pub anchor: Point,
    pub angle_deg: f64,
}

/// Engine output: everything a renderer needs to draw the grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridOverlay {
    pub segments: Vec<Segment>,
    pub labels: Vec<Label>,
}

/// Clip traced lines to the viewport and emit drawables.
pub fn emit(
    lines: &[TracedLine],
    view: &ViewDescriptor,
    use_labels: bool,
    aitoff: bool,
) -> GridOverlay {
    let bounds = view.bounds();
    let mut overlay = GridOverlay::default();
    for line in lines {
        emit_line(line, view, &bounds, use_labels, aitoff, &mut overlay);
    }
    debug!(
        "emitted {} segments, {} labels from {} lines",
        overlay.segments.len(),
        overlay.labels.len(),
        lines.len()
    );
    overlay
}

fn emit_line(
    line: &TracedLine,
    view: &ViewDescriptor,
    bounds: &Bounds,
    use_labels: bool,
    aitoff: bool,
    out: &mut GridOverlay,
) {
    if line.len() < 2 {
        return;
    }
    let mid = (line.len() as f64 / 2.0).round() as usize - 1;
    let mut label: Option<Label> = None;

    for i in 0..line.len() - 1 {
        if line.is_sentinel(i) || line.is_sentinel(i + 1) {
            continue;
        }
        let a = line.point(i);
        let b = line.point(i + 1);
        if !bounds.contains(a) && !bounds.contains(b) {
            continue;
        }
        // Aitoff-style bounded images place the two seam halves side by
        // side; a pair jumping most of the screen is the seam, not a stroke.
        if aitoff && !view.is_full_sky && (b.x - a.x).abs() >= view.screen_width / 8.0 {
            continue;
        }
        out.segments.push(Segment { a, b });

        if !use_labels {
            continue;
        }
        // Bounded images label at the polyline midpoint. Full-sky longitude
        // lines label at the first valid pair instead; their midpoint tends
        // to sit on the occluded back hemisphere.
        let take = if view.is_full_sky && line.axis == Axis::Lon {
            label.is_none()
        } else {
            i == mid
        };
        if take {
            label = Some(Label {
                text: level_text(line.axis, line.value, view.csys, view.label_format),
                anchor: a,
                angle_deg: slope_angle_deg(a, b, line.axis),
            });
        }
    }

    if let Some(label) = label {
        out.labels.push(label);
    }
}

/// Rotation for a label sitting on the segment `a -> b`, degrees. Longitude
/// lines normalize into [0, 180), latitude lines into [-90, 90].
fn slope_angle_deg(a: Point, b: Point, axis: Axis) -> f64 {
    if a == b {
        return 0.0;
    }
    let mut angle = ((b.y - a.y) / (b.x - a.x)).atan().to_degrees();
    match axis {
        Axis::Lon => {
            if angle < 0.0 {
                angle += 180.0;
            }
        }
        Axis::Lat => {
            if angle > 90.0 {
                angle = 180.0 - angle;
            } else if angle < -90.0 {
                angle = 180.0 + angle;
            }
        }
    }
    angle
}

/// Label text for one level value.
pub(crate) fn level_text(axis: Axis, value: f64, csys: CoordSys, format: LabelFormat) -> String {
    if csys.is_equatorial() && format == LabelFormat::Hms {
        match axis {
            Axis::Lon => format_lon_hms(value),
            Axis::Lat => format_lat_dms(value),
        }
    } else {
        format_decimal(value)
    }
}
