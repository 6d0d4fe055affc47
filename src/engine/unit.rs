//! Picks how many days make up one chart point for a given request.

use crate::types::bounds::YearRange;
use crate::types::dataset::Dataset;
use crate::utils::is_leap_year;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Temporal granularity of one chart point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationUnit {
    Day,
    Week,
    Month,
    Year,
}

impl fmt::Display for AggregationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AggregationUnit::Day => "day",
            AggregationUnit::Week => "week",
            AggregationUnit::Month => "month",
            AggregationUnit::Year => "year",
        };
        write!(f, "{}", name)
    }
}

/// The chosen unit together with the horizontal spacing of its points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupLayout {
    pub unit: AggregationUnit,
    /// Number of groups the whole range will produce.
    pub total_groups: u64,
    /// Horizontal distance in pixels between two neighbouring groups.
    pub group_width: f64,
}

impl GroupLayout {
    /// Chooses the unit for drawing `range` of `dataset` across `width` pixels.
    ///
    /// Precipitation is summed per year and always drawn yearly. Temperature is
    /// averaged, so it is drawn as finely as the width allows: a day needs one
    /// pixel, so 365 pixels per year give daily points, 52 weekly, 12 monthly,
    /// anything less yearly.
    ///
    /// # Examples
    ///
    /// ```
    /// use meteochart::{AggregationUnit, Dataset, GroupLayout, YearRange};
    ///
    /// let full = YearRange { from: 1881, to: 2006 };
    /// let layout = GroupLayout::choose(Dataset::Temperature, full, 1000);
    /// assert_eq!(layout.unit, AggregationUnit::Year);
    /// assert_eq!(layout.total_groups, 126);
    /// ```
    pub fn choose(dataset: Dataset, range: YearRange, width: u32) -> Self {
        let years = range.year_count() as u64;
        let unit = match dataset {
            Dataset::Precipitation => AggregationUnit::Year,
            Dataset::Temperature => {
                let pixels_per_year = width as f64 / years as f64;
                if pixels_per_year >= 365.0 {
                    AggregationUnit::Day
                } else if pixels_per_year >= 52.0 {
                    AggregationUnit::Week
                } else if pixels_per_year >= 12.0 {
                    AggregationUnit::Month
                } else {
                    AggregationUnit::Year
                }
            }
        };

        let total_groups = match unit {
            AggregationUnit::Day => {
                let leap_years = range.years().filter(|y| is_leap_year(*y)).count() as u64;
                years * 365 + leap_years
            }
            AggregationUnit::Week => years * 52,
            AggregationUnit::Month => years * 12,
            AggregationUnit::Year => years,
        };
        // a lone group still spans the full width
        let divisor = total_groups.saturating_sub(1).max(1);

        Self {
            unit,
            total_groups,
            group_width: width as f64 / divisor as f64,
        }
    }
}
