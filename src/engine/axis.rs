//! Value-axis bounds and the gridline markers for both axes.

use crate::engine::unit::AggregationUnit;
use crate::types::bounds::{Viewport, YearRange};
use serde::{Deserialize, Serialize};

// Vertical pixels per value gridline.
const VALUE_MARKER_SPACING: f64 = 20.0;
// Horizontal pixels per year gridline.
const YEAR_MARKER_SPACING: f64 = 60.0;

/// Displayed bounds of the value axis. Both ends are whole numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub minimum: f64,
    pub maximum: f64,
}

impl AxisRange {
    /// Bounds covering `min..=max` with a 10% margin on both sides, at least 1
    /// unit, rounded outwards.
    ///
    /// # Examples
    ///
    /// ```
    /// use meteochart::AxisRange;
    ///
    /// let axis = AxisRange::from_observed(-5.0, 15.0);
    /// assert_eq!((axis.minimum, axis.maximum), (-7.0, 17.0));
    ///
    /// let flat = AxisRange::from_observed(10.0, 10.0);
    /// assert_eq!((flat.minimum, flat.maximum), (9.0, 11.0));
    /// ```
    pub fn from_observed(min: f64, max: f64) -> Self {
        let reserve = ((max - min) * 0.1).max(1.0);
        Self {
            minimum: (min - reserve).floor(),
            maximum: (max + reserve).ceil(),
        }
    }

    /// True if every value in `min..=max` can be drawn inside these bounds.
    pub fn covers(&self, min: f64, max: f64) -> bool {
        min >= self.minimum && max <= self.maximum
    }

    /// Vertical pixel position of `value` on a surface `height` pixels tall.
    pub fn y_for(&self, value: f64, height: u32) -> f64 {
        (self.maximum - value) * height as f64 / (self.maximum - self.minimum)
    }
}

/// One gridline with its label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "axis", rename_all = "lowercase")]
pub enum AxisMarker {
    /// Horizontal line at `y` labelled with a value.
    Value { value: i64, y: f64 },
    /// Vertical line at `x` labelled with a year.
    Year { year: i32, x: f64 },
}

/// Gridlines for the value axis followed by those for the year axis.
pub fn axis_markers(
    axis: &AxisRange,
    range: YearRange,
    unit: AggregationUnit,
    viewport: Viewport,
) -> Vec<AxisMarker> {
    let mut markers = value_markers(axis, viewport.height);
    markers.extend(year_markers(range, unit, viewport.width));
    markers
}

fn value_markers(axis: &AxisRange, height: u32) -> Vec<AxisMarker> {
    let minimum = axis.minimum as i64;
    let maximum = axis.maximum as i64;
    let count = (height as f64 / VALUE_MARKER_SPACING).ceil().max(1.0) as i64;
    let step = ((maximum - minimum) as f64 / count as f64).ceil().max(1.0) as i64;

    let mut markers = Vec::new();
    let mut value = minimum + step;
    while value <= maximum {
        markers.push(AxisMarker::Value {
            value,
            y: axis.y_for(value as f64, height),
        });
        value += step;
    }
    markers
}

fn year_markers(range: YearRange, unit: AggregationUnit, width: u32) -> Vec<AxisMarker> {
    let year_count = range.year_count() as i32;
    let count = ((width as f64 / YEAR_MARKER_SPACING).ceil() as i32)
        .min(year_count)
        .max(1);
    let step = (year_count + count - 1) / count;

    // A yearly point sits on the year itself; finer units spread a year over
    // a span, so its label belongs at the end of that span.
    let offset = if unit == AggregationUnit::Year { 0 } else { 1 };
    let span = (range.to - range.from + offset).max(1);
    let year_width = width as f64 / span as f64;

    let mut markers = Vec::new();
    let lowest = range.from + step / 2;
    let mut year = range.to;
    while year >= lowest {
        markers.push(AxisMarker::Year {
            year,
            x: (year - range.from + offset) as f64 * year_width,
        });
        year -= step;
    }
    markers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_markers_step_through_axis() {
        let axis = AxisRange {
            minimum: 0.0,
            maximum: 20.0,
        };
        // 100px tall -> 5 gridlines, step 4
        let markers = value_markers(&axis, 100);
        let values: Vec<i64> = markers
            .iter()
            .map(|m| match m {
                AxisMarker::Value { value, .. } => *value,
                other => panic!("unexpected marker {:?}", other),
            })
            .collect();
        assert_eq!(values, vec![4, 8, 12, 16, 20]);
        assert_eq!(markers[4], AxisMarker::Value { value: 20, y: 0.0 });
    }

    #[test]
    fn test_year_markers_for_yearly_points() {
        let range = YearRange {
            from: 1900,
            to: 1909,
        };
        // 120px -> 2 gridlines, step 5, walking down from 1909 while >= 1902
        let markers = year_markers(range, AggregationUnit::Year, 120);
        assert_eq!(
            markers,
            vec![
                AxisMarker::Year {
                    year: 1909,
                    x: 120.0
                },
                AxisMarker::Year {
                    year: 1904,
                    x: 4.0 * 120.0 / 9.0
                },
            ]
        );
    }

    #[test]
    fn test_year_markers_for_single_year_span() {
        let range = YearRange {
            from: 2000,
            to: 2000,
        };
        let markers = year_markers(range, AggregationUnit::Day, 800);
        assert_eq!(markers, vec![AxisMarker::Year { year: 2000, x: 800.0 }]);

        let markers = year_markers(range, AggregationUnit::Year, 800);
        assert_eq!(markers, vec![AxisMarker::Year { year: 2000, x: 0.0 }]);
    }

    #[test]
    fn test_covers_is_inclusive() {
        let axis = AxisRange::from_observed(0.0, 10.0);
        assert!(axis.covers(-1.0, 11.0));
        assert!(!axis.covers(-1.5, 5.0));
        assert!(!axis.covers(0.0, 11.01));
    }
}
