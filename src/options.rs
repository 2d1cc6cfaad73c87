use serde::{Deserialize, Serialize};

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridOptions {
    /// Minimum number of grid lines per axis; sparse level sets are
    /// regridded up to this count (doubled on full-sky views, where
    /// visibility filtering discards many lines afterwards).
    pub min_line_count: usize,
    /// Emit one rotated label per traced line.
    pub use_labels: bool,
    /// Optional clamp on the chosen level spacing, in degrees. When the
    /// "nice" delta falls outside these limits it snaps to the nearer bound.
    pub user_delta_limits: Option<(f64, f64)>,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            min_line_count: 11,
            use_labels: true,
            user_delta_limits: None,
        }
    }
}
