use crate::series_data::error::PopulateError;
use crate::series_data::fetcher::{PopulateReport, SeriesFetcher};
use crate::store::series_store::SeriesStore;
use crate::types::bounds::YearRange;
use crate::types::partition::PartitionKey;
use futures_util::future::try_join_all;

/// What [`CacheAvailabilityChecker::ensure`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// Every month in the range was already cached.
    Cached,
    /// At least one month was missing, so the whole dataset was fetched.
    Populated(PopulateReport),
}

/// Makes sure every month of a year range is cached before drawing starts.
///
/// The source only serves whole datasets, so a single missing month triggers
/// a full fetch-and-populate; months already present are skipped by the fetcher.
#[derive(Clone)]
pub struct CacheAvailabilityChecker {
    fetcher: SeriesFetcher,
}

impl CacheAvailabilityChecker {
    pub fn new(fetcher: SeriesFetcher) -> Self {
        Self { fetcher }
    }

    pub async fn ensure(
        &self,
        store: &SeriesStore,
        range: YearRange,
    ) -> Result<Availability, PopulateError> {
        let keys: Vec<PartitionKey> = range.years().flat_map(PartitionKey::months_of).collect();
        let counts = try_join_all(keys.into_iter().map(|key| async move {
            store.count_entries(key).await.map(|count| (key, count))
        }))
        .await?;

        match counts.iter().find(|(_, count)| *count == 0) {
            None => {
                log::info!("Cache hit for {} {}", store.dataset(), range);
                Ok(Availability::Cached)
            }
            Some((missing, _)) => {
                log::warn!(
                    "Cache miss for {} {} (first empty partition {}). Fetching the full dataset.",
                    store.dataset(),
                    range,
                    missing
                );
                let report = self.fetcher.fetch_and_populate(store).await?;
                Ok(Availability::Populated(report))
            }
        }
    }
}
