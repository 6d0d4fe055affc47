//! Fixed dataset bounds, requested year ranges and the chart viewport.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// First year covered by the bundled datasets.
pub const MIN_YEAR: i32 = 1881;
/// Last year covered by the bundled datasets.
pub const MAX_YEAR: i32 = 2006;

/// The fixed span of years a dataset covers.
///
/// This is configuration, not state: one value is handed to the store, the
/// availability checker, the engine and the request validator, and it never
/// changes for the lifetime of those components.
///
/// # Examples
///
/// ```
/// use meteochart::YearBounds;
///
/// let bounds = YearBounds::default();
/// assert_eq!(bounds.min_year(), 1881);
/// assert_eq!(bounds.max_year(), 2006);
/// assert_eq!(bounds.years().count(), 126);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearBounds {
    min_year: i32,
    max_year: i32,
}

impl YearBounds {
    /// Creates bounds spanning `min_year..=max_year`.
    ///
    /// Returns `None` when `min_year > max_year`.
    pub fn new(min_year: i32, max_year: i32) -> Option<Self> {
        (min_year <= max_year).then_some(Self { min_year, max_year })
    }

    pub fn min_year(&self) -> i32 {
        self.min_year
    }

    pub fn max_year(&self) -> i32 {
        self.max_year
    }

    /// Every selectable year, ascending. Both year selectors list exactly these.
    pub fn years(&self) -> RangeInclusive<i32> {
        self.min_year..=self.max_year
    }

    /// The full span as a [`YearRange`].
    pub fn full_range(&self) -> YearRange {
        YearRange {
            from: self.min_year,
            to: self.max_year,
        }
    }

    /// True if `from..=to` shares at least one year with these bounds.
    pub fn intersects(&self, from: i32, to: i32) -> bool {
        from <= self.max_year && to >= self.min_year
    }

    /// Clamps `from..=to` into the bounds. Callers check [`Self::intersects`] first.
    pub fn clamp(&self, from: i32, to: i32) -> YearRange {
        YearRange {
            from: from.max(self.min_year),
            to: to.min(self.max_year),
        }
    }
}

impl Default for YearBounds {
    fn default() -> Self {
        Self {
            min_year: MIN_YEAR,
            max_year: MAX_YEAR,
        }
    }
}

/// An inclusive range of years with `from <= to`, already clamped to the dataset bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearRange {
    pub from: i32,
    pub to: i32,
}

impl YearRange {
    /// Number of years in the range, counting both ends.
    pub fn year_count(&self) -> u32 {
        (self.to - self.from + 1) as u32
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.from..=self.to
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}..={:04}", self.from, self.to)
    }
}

/// Pixel size of the chart surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const MIN_WIDTH: u32 = 400;
    pub const MAX_WIDTH: u32 = 1000;
    pub const MIN_HEIGHT: u32 = 150;
    pub const MAX_HEIGHT: u32 = 300;

    // Room left around the chart for the selectors and headings.
    const HORIZONTAL_CHROME: u32 = 250;
    const VERTICAL_CHROME: u32 = 160;

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Sizes the chart to fit a window of the given size.
    ///
    /// Computed once at startup; window resizes afterwards are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use meteochart::Viewport;
    ///
    /// assert_eq!(Viewport::fit_window(1920, 1080), Viewport::new(1000, 300));
    /// assert_eq!(Viewport::fit_window(500, 200), Viewport::new(400, 150));
    /// assert_eq!(Viewport::fit_window(1050, 400), Viewport::new(800, 240));
    /// ```
    pub fn fit_window(window_width: u32, window_height: u32) -> Self {
        Self {
            width: window_width
                .saturating_sub(Self::HORIZONTAL_CHROME)
                .clamp(Self::MIN_WIDTH, Self::MAX_WIDTH),
            height: window_height
                .saturating_sub(Self::VERTICAL_CHROME)
                .clamp(Self::MIN_HEIGHT, Self::MAX_HEIGHT),
        }
    }
}
