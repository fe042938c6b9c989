//! Color-scale derivation for the heatmap view.

use serde::Serialize;

use super::AlignedTable;

/// Hue returned when the range is degenerate (max == min): the midpoint of
/// the 240°→0° scale, so single-valued tables render a defined color.
pub const NEUTRAL_HUE: f64 = 120.0;

/// Numeric bounds over the selected models' cells. Recomputed whenever the
/// input set changes; never mutated in place.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn is_degenerate(&self) -> bool {
        self.max == self.min
    }
}

/// Scan only the cells belonging to `selected_ids`, ignoring absent fields.
/// No numeric values at all yields the degenerate `{0, 0}`.
pub fn color_range(table: &AlignedTable, selected_ids: &[&str]) -> ValueRange {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for row in &table.rows {
        for id in selected_ids {
            if let Some(v) = row.value(id) {
                if v.is_finite() {
                    min = min.min(v);
                    max = max.max(v);
                }
            }
        }
    }

    if min > max {
        return ValueRange { min: 0.0, max: 0.0 };
    }
    ValueRange { min, max }
}

/// Map a value to a hue: low values toward blue (240°), high toward red (0°).
pub fn normalize_hue(value: f64, range: ValueRange) -> f64 {
    if range.is_degenerate() {
        return NEUTRAL_HUE;
    }
    let t = (value - range.min) / (range.max - range.min);
    (1.0 - t.clamp(0.0, 1.0)) * 240.0
}
