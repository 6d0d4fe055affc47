//! Incremental grouping and drawing of one chart.
//!
//! The engine walks the requested years in ascending order, folds each day's
//! value into the current group and, at every year end, streams the points
//! completed since the previous emission. The first emission waits for five
//! years of data (or the whole range if shorter) so the value axis is not
//! built from a handful of points. If a later group falls outside that axis,
//! the drawing is cleared and every group so far is redrawn on a new axis
//! derived from the updated minimum and maximum.

use crate::engine::axis::{axis_markers, AxisRange};
use crate::engine::error::EngineError;
use crate::engine::unit::{AggregationUnit, GroupLayout};
use crate::store::series_store::SeriesStore;
use crate::types::bounds::{Viewport, YearRange};
use crate::types::dataset::Dataset;
use crate::types::partition::PartitionKey;
use crate::worker::protocol::WorkerMessage;
use tokio::sync::mpsc::UnboundedSender;

// Years processed before the axis is built (the fifth year triggers it).
const AXIS_WARMUP_YEARS: i32 = 4;
const DAYS_PER_WEEK: usize = 7;

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub unit: AggregationUnit,
    /// Every group value, in drawing order.
    pub groups: Vec<f64>,
    /// How often the axis had to be rebuilt after the first emission.
    pub rescales: u32,
    /// The axis in use when the run finished. `None` if no group had any data.
    pub axis: Option<AxisRange>,
}

pub struct AggregationEngine<'a> {
    store: &'a SeriesStore,
    dataset: Dataset,
    range: YearRange,
    viewport: Viewport,
    layout: GroupLayout,
    messages: UnboundedSender<WorkerMessage>,

    groups: Vec<f64>,
    observed: Option<(f64, f64)>,
    axis: Option<AxisRange>,
    last_drawn: Option<usize>,
    rescales: u32,
}

impl<'a> AggregationEngine<'a> {
    /// Prepares a run over `range` of the store's dataset. The aggregation unit
    /// is fixed here, before any data is read.
    pub fn new(
        store: &'a SeriesStore,
        range: YearRange,
        viewport: Viewport,
        messages: UnboundedSender<WorkerMessage>,
    ) -> Self {
        let dataset = store.dataset();
        let layout = GroupLayout::choose(dataset, range, viewport.width);
        log::debug!(
            "Drawing {} {} by {} ({} groups, {:.3}px apart)",
            dataset,
            range,
            layout.unit,
            layout.total_groups,
            layout.group_width
        );
        Self {
            store,
            dataset,
            range,
            viewport,
            layout,
            messages,
            groups: Vec::new(),
            observed: None,
            axis: None,
            last_drawn: None,
            rescales: 0,
        }
    }

    pub fn layout(&self) -> GroupLayout {
        self.layout
    }

    /// Processes every year of the range, streaming drawing messages as it goes,
    /// and finishes with exactly one [`WorkerMessage::DrawFinish`].
    ///
    /// # Errors
    ///
    /// Fails if a partition cannot be read or the receiver of the messages is gone.
    pub async fn run(mut self) -> Result<RunSummary, EngineError> {
        for year in self.range.years() {
            self.process_year(year).await?;
            self.draw_groups(year)?;
        }
        self.send(WorkerMessage::DrawFinish)?;

        Ok(RunSummary {
            unit: self.layout.unit,
            groups: self.groups,
            rescales: self.rescales,
            axis: self.axis,
        })
    }

    async fn process_year(&mut self, year: i32) -> Result<(), EngineError> {
        let unit = self.layout.unit;
        let year_start = self.groups.len();
        let mut pending: Vec<f64> = Vec::with_capacity(DAYS_PER_WEEK);

        for key in PartitionKey::months_of(year) {
            let partition = self.store.read_partition(key).await?;
            for day in 1..=key.days() {
                // days without a value contribute nothing
                let Some(value) = partition.get(day) else {
                    continue;
                };
                match unit {
                    AggregationUnit::Day => self.push_group(&[value]),
                    AggregationUnit::Week => {
                        pending.push(value);
                        if pending.len() == DAYS_PER_WEEK {
                            self.push_group(&pending);
                            pending.clear();
                        }
                    }
                    AggregationUnit::Month | AggregationUnit::Year => pending.push(value),
                }
            }
            if unit == AggregationUnit::Month {
                self.push_group(&pending);
                pending.clear();
            }
        }

        match unit {
            AggregationUnit::Year => self.push_group(&pending),
            AggregationUnit::Week if !pending.is_empty() => {
                if self.groups.len() > year_start {
                    self.merge_into_last_week(&pending);
                } else {
                    self.push_group(&pending);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn push_group(&mut self, values: &[f64]) {
        if let Some(value) = self.dataset.combine(values) {
            self.groups.push(value);
            self.observe(value);
        }
    }

    /// A year is 52 weeks and one or two days. The leftover days are folded
    /// into the last full week instead of forming a group of their own.
    ///
    /// Only temperature is ever grouped by week, so the merge is a weighted mean.
    fn merge_into_last_week(&mut self, remainder: &[f64]) {
        let Some(last) = self.groups.pop() else {
            return;
        };
        let weight = DAYS_PER_WEEK as f64;
        let merged =
            (last * weight + remainder.iter().sum::<f64>()) / (weight + remainder.len() as f64);
        self.groups.push(merged);
        self.observe(merged);
    }

    fn observe(&mut self, value: f64) {
        self.observed = Some(match self.observed {
            None => (value, value),
            Some((min, max)) => (min.min(value), max.max(value)),
        });
    }

    fn draw_groups(&mut self, year: i32) -> Result<(), EngineError> {
        if year - self.range.from < AXIS_WARMUP_YEARS && year < self.range.to {
            return Ok(());
        }
        let Some((min, max)) = self.observed else {
            return Ok(());
        };

        if let Some(axis) = self.axis {
            if !axis.covers(min, max) {
                log::debug!(
                    "Values {:.2}..{:.2} left axis {:.0}..{:.0} in {}, redrawing",
                    min,
                    max,
                    axis.minimum,
                    axis.maximum,
                    year
                );
                self.send(WorkerMessage::Clear)?;
                self.last_drawn = None;
                self.rescales += 1;
            }
        }

        let first_new = self.last_drawn.map_or(0, |index| index + 1);
        if first_new >= self.groups.len() {
            return Ok(());
        }

        let mut points = Vec::with_capacity((self.groups.len() - first_new + 2) * 2);
        let axis = match (self.last_drawn, self.axis) {
            (Some(previous), Some(axis)) => {
                // continue the polyline from the last point already on screen
                self.push_point(&mut points, &axis, previous);
                axis
            }
            _ => {
                let axis = AxisRange::from_observed(min, max);
                self.axis = Some(axis);
                self.send(WorkerMessage::DrawAxis(axis_markers(
                    &axis,
                    self.range,
                    self.layout.unit,
                    self.viewport,
                )))?;
                axis
            }
        };

        for index in first_new..self.groups.len() {
            self.push_point(&mut points, &axis, index);
        }

        // a single yearly point cannot form a line, so stretch it across the width
        if self.dataset == Dataset::Precipitation && self.range.from == self.range.to {
            let y = points[1];
            points.push(self.layout.group_width);
            points.push(y);
        }

        self.last_drawn = Some(self.groups.len() - 1);
        self.send(WorkerMessage::Draw(points))
    }

    fn push_point(&self, points: &mut Vec<f64>, axis: &AxisRange, index: usize) {
        points.push(self.layout.group_width * index as f64);
        points.push(axis.y_for(self.groups[index], self.viewport.height));
    }

    fn send(&self, message: WorkerMessage) -> Result<(), EngineError> {
        self.messages
            .send(message)
            .map_err(|_| EngineError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series_data::error::PopulateError;
    use crate::series_data::fetcher::tests::GeneratedSource;
    use crate::series_data::fetcher::SeriesFetcher;
    use crate::types::bounds::YearBounds;
    use chrono::{Datelike, NaiveDate};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error(transparent)]
        Store(#[from] crate::store::error::StoreError),
        #[error(transparent)]
        Populate(#[from] PopulateError),
        #[error(transparent)]
        Engine(#[from] EngineError),
    }

    async fn populated_store(
        dataset: Dataset,
        first_year: i32,
        last_year: i32,
        value_of: fn(NaiveDate) -> f64,
    ) -> Result<(TempDir, SeriesStore), TestError> {
        let root = tempfile::tempdir().unwrap();
        let bounds = YearBounds::new(first_year, last_year).unwrap();
        let store = SeriesStore::open(root.path(), dataset, bounds).await?;
        let source = Arc::new(GeneratedSource::new(first_year, last_year, value_of));
        SeriesFetcher::new(source).fetch_and_populate(&store).await?;
        Ok((root, store))
    }

    async fn run_engine(
        store: &SeriesStore,
        range: YearRange,
        viewport: Viewport,
    ) -> Result<(RunSummary, Vec<WorkerMessage>), TestError> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let summary = AggregationEngine::new(store, range, viewport, tx).run().await?;
        let mut messages = Vec::new();
        while let Ok(message) = rx.try_recv() {
            messages.push(message);
        }
        Ok((summary, messages))
    }

    fn kinds(messages: &[WorkerMessage]) -> Vec<&'static str> {
        messages
            .iter()
            .map(|m| match m {
                WorkerMessage::BaseOk => "base-ok",
                WorkerMessage::Clear => "clear",
                WorkerMessage::Draw(_) => "draw",
                WorkerMessage::DrawAxis(_) => "draw-axis",
                WorkerMessage::DrawFinish => "draw-finish",
                WorkerMessage::Failed(_) => "failed",
            })
            .collect()
    }

    #[tokio::test]
    async fn test_single_precipitation_year_is_flat_segment() -> Result<(), TestError> {
        let (_root, store) = populated_store(Dataset::Precipitation, 2000, 2000, |_| 1.0).await?;
        let range = YearRange { from: 2000, to: 2000 };
        let (summary, messages) = run_engine(&store, range, Viewport::new(800, 200)).await?;

        assert_eq!(summary.unit, AggregationUnit::Year);
        // leap year, summed
        assert_eq!(summary.groups, vec![366.0]);
        assert_eq!(kinds(&messages), vec!["draw-axis", "draw", "draw-finish"]);
        // axis 365..367, so the sum sits halfway down
        assert_eq!(
            messages[1],
            WorkerMessage::Draw(vec![0.0, 100.0, 800.0, 100.0])
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_week_remainder_merges_into_last_week() -> Result<(), TestError> {
        let (_root, store) =
            populated_store(Dataset::Temperature, 1900, 1901, |d| d.ordinal() as f64).await?;
        let range = YearRange { from: 1900, to: 1901 };
        let (summary, messages) = run_engine(&store, range, Viewport::new(400, 200)).await?;

        assert_eq!(summary.unit, AggregationUnit::Week);
        assert_eq!(summary.groups.len(), 104);
        assert_eq!(summary.groups[0], 4.0);
        // days 358..=364 average 361, then day 365 is folded in
        assert_eq!(summary.groups[51], (361.0 * 7.0 + 365.0) / 8.0);
        assert_eq!(summary.groups[52], 4.0);

        // two years is shorter than the warm-up, so everything is drawn at the end
        assert_eq!(kinds(&messages), vec!["draw-axis", "draw", "draw-finish"]);
        let WorkerMessage::Draw(points) = &messages[1] else {
            panic!("expected a draw message");
        };
        assert_eq!(points.len(), 208);
        assert!((points[206] - 400.0).abs() < 1e-9);
        Ok(())
    }

    #[tokio::test]
    async fn test_month_groups_are_monthly_means() -> Result<(), TestError> {
        let (_root, store) = populated_store(Dataset::Temperature, 1990, 1999, |d| {
            d.month() as f64 + d.day() as f64 / 100.0
        })
        .await?;
        let range = YearRange { from: 1990, to: 1999 };
        let (summary, messages) = run_engine(&store, range, Viewport::new(400, 200)).await?;

        assert_eq!(summary.unit, AggregationUnit::Month);
        assert_eq!(summary.groups.len(), 120);
        let close = |a: f64, b: f64| (a - b).abs() < 1e-9;
        // January 1990: days 1..=31 average 16
        assert!(close(summary.groups[0], 1.16));
        assert!(close(summary.groups[1], 2.145));
        assert!(close(summary.groups[11], 12.16));
        // February 1992 has a 29th day
        assert!(close(summary.groups[25], 2.15));

        // one draw for the first five years, then one per year
        let draws = kinds(&messages).iter().filter(|k| **k == "draw").count();
        assert_eq!(draws, 6);
        Ok(())
    }

    #[tokio::test]
    async fn test_full_range_draws_one_group_per_year() -> Result<(), TestError> {
        let (_root, store) =
            populated_store(Dataset::Temperature, 1881, 2006, |d| (d.year() % 10) as f64).await?;
        let range = YearRange { from: 1881, to: 2006 };
        let (summary, messages) = run_engine(&store, range, Viewport::new(1000, 300)).await?;

        assert_eq!(summary.unit, AggregationUnit::Year);
        assert_eq!(summary.groups.len(), 126);
        assert_eq!(summary.groups[0], 1.0);
        assert_eq!(summary.groups[125], 6.0);
        // 1887 and 1889 exceed the axis; zero first shows up in 1890 and fits
        assert_eq!(summary.rescales, 2);
        assert_eq!(
            summary.axis,
            Some(AxisRange {
                minimum: 0.0,
                maximum: 10.0
            })
        );
        assert_eq!(kinds(&messages).last(), Some(&"draw-finish"));
        Ok(())
    }

    #[tokio::test]
    async fn test_outlier_triggers_clear_and_full_redraw() -> Result<(), TestError> {
        let (_root, store) = populated_store(Dataset::Temperature, 1900, 1905, |d| {
            if d.year() == 1905 {
                50.0
            } else {
                10.0
            }
        })
        .await?;
        let range = YearRange { from: 1900, to: 1905 };
        let (summary, messages) = run_engine(&store, range, Viewport::new(60, 100)).await?;

        assert_eq!(summary.unit, AggregationUnit::Year);
        assert_eq!(summary.rescales, 1);
        assert_eq!(
            kinds(&messages),
            vec!["draw-axis", "draw", "clear", "draw-axis", "draw", "draw-finish"]
        );
        // first five years drawn against 9..11
        assert_eq!(
            messages[1],
            WorkerMessage::Draw(vec![0.0, 50.0, 12.0, 50.0, 24.0, 50.0, 36.0, 50.0, 48.0, 50.0])
        );
        let WorkerMessage::Draw(redrawn) = &messages[4] else {
            panic!("expected a draw message");
        };
        // all six groups from scratch
        assert_eq!(redrawn.len(), 12);
        assert_eq!(
            summary.axis,
            Some(AxisRange {
                minimum: 6.0,
                maximum: 54.0
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_later_years_continue_previous_polyline() -> Result<(), TestError> {
        let (_root, store) =
            populated_store(Dataset::Temperature, 1900, 1905, |d| (d.year() % 2) as f64).await?;
        let range = YearRange { from: 1900, to: 1905 };
        let (_, messages) = run_engine(&store, range, Viewport::new(60, 100)).await?;

        assert_eq!(kinds(&messages), vec!["draw-axis", "draw", "draw", "draw-finish"]);
        let WorkerMessage::Draw(continued) = &messages[2] else {
            panic!("expected a draw message");
        };
        // previous point (1904) then the new one (1905)
        assert_eq!(continued.len(), 4);
        assert_eq!(continued[0], 48.0);
        assert_eq!(continued[2], 60.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_days_are_skipped() -> Result<(), TestError> {
        let root = tempfile::tempdir().unwrap();
        let bounds = YearBounds::new(2000, 2000).unwrap();
        let store = SeriesStore::open(root.path(), Dataset::Temperature, bounds).await?;
        let jan = PartitionKey::new(2000, 1).unwrap();
        store
            .populate_if_empty(jan, &[(1, 1.0), (2, 2.0), (4, 4.0)])
            .await?;

        let range = YearRange { from: 2000, to: 2000 };
        let (summary, messages) = run_engine(&store, range, Viewport::new(800, 200)).await?;
        assert_eq!(summary.unit, AggregationUnit::Day);
        assert_eq!(summary.groups, vec![1.0, 2.0, 4.0]);
        assert_eq!(kinds(&messages).last(), Some(&"draw-finish"));
        Ok(())
    }

    #[tokio::test]
    async fn test_closed_receiver_stops_run() -> Result<(), TestError> {
        let (_root, store) = populated_store(Dataset::Precipitation, 2000, 2000, |_| 1.0).await?;
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let range = YearRange { from: 2000, to: 2000 };
        let result = AggregationEngine::new(&store, range, Viewport::new(800, 200), tx)
            .run()
            .await;
        assert!(matches!(result, Err(EngineError::ChannelClosed)));
        Ok(())
    }
}
