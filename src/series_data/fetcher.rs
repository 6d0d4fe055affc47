use crate::series_data::error::PopulateError;
use crate::series_data::source::SeriesSource;
use crate::store::series_store::SeriesStore;
use crate::types::partition::PartitionKey;
use futures_util::{stream, StreamExt, TryStreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;

// Partition transactions in flight at once while populating.
const POPULATE_CONCURRENCY: usize = 16;

/// Outcome of one fetch-and-populate pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulateReport {
    /// Partitions that were empty and got written.
    pub populated: usize,
    /// Partitions that already held data and were left untouched.
    pub skipped: usize,
    /// Records dated outside the store's year bounds.
    pub out_of_bounds: usize,
}

/// Pulls a dataset's records from a [`SeriesSource`] and writes them into the
/// store, one partition per (year, month).
///
/// A partition that already has entries is never written again, so calling
/// this repeatedly is harmless apart from the download.
#[derive(Clone)]
pub struct SeriesFetcher {
    source: Arc<dyn SeriesSource>,
}

impl SeriesFetcher {
    pub fn new(source: Arc<dyn SeriesSource>) -> Self {
        Self { source }
    }

    pub async fn fetch_and_populate(
        &self,
        store: &SeriesStore,
    ) -> Result<PopulateReport, PopulateError> {
        let dataset = store.dataset();
        let records = self.source.fetch(dataset).await?;
        log::info!("Fetched {} {} records", records.len(), dataset);

        let bounds = store.bounds();
        let mut report = PopulateReport::default();
        let mut groups: BTreeMap<PartitionKey, Vec<(u32, f64)>> = BTreeMap::new();
        for record in records {
            let key = record.partition_key();
            if !bounds.years().contains(&key.year()) {
                report.out_of_bounds += 1;
                continue;
            }
            groups
                .entry(key)
                .or_default()
                .push((record.day(), record.value));
        }

        let written: Vec<bool> = stream::iter(groups)
            .map(|(key, days)| async move { store.populate_if_empty(key, &days).await })
            .buffer_unordered(POPULATE_CONCURRENCY)
            .try_collect()
            .await?;

        report.populated = written.iter().filter(|w| **w).count();
        report.skipped = written.len() - report.populated;
        log::info!(
            "Populated {} store: {} partitions written, {} already present, {} records out of bounds",
            dataset,
            report.populated,
            report.skipped,
            report.out_of_bounds
        );
        Ok(report)
    }
}
