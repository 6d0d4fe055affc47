use crate::store::error::StoreError;
use crate::store::series_store::SeriesStore;
use crate::types::bounds::YearBounds;
use crate::types::dataset::Dataset;
use std::collections::{hash_map::Entry, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Opens each dataset's store on first use and hands out shared handles to it.
pub struct StoreRegistry {
    cache_root: PathBuf,
    bounds: YearBounds,
    stores: Mutex<HashMap<Dataset, Arc<SeriesStore>>>,
}

impl StoreRegistry {
    pub fn new(cache_root: &Path, bounds: YearBounds) -> Self {
        Self {
            cache_root: cache_root.to_path_buf(),
            bounds,
            stores: Mutex::new(HashMap::new()),
        }
    }

    pub fn bounds(&self) -> YearBounds {
        self.bounds
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub async fn get(&self, dataset: Dataset) -> Result<Arc<SeriesStore>, StoreError> {
        {
            let stores = self.stores.lock().await;
            if let Some(store) = stores.get(&dataset) {
                return Ok(Arc::clone(store));
            }
        }

        // Opening may lay out the partitions, so it runs without the lock held.
        let opened = Arc::new(SeriesStore::open(&self.cache_root, dataset, self.bounds).await?);

        let mut stores = self.stores.lock().await;
        match stores.entry(dataset) {
            // Another caller opened it meanwhile. Keep theirs so writes share one lock.
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                entry.insert(Arc::clone(&opened));
                Ok(opened)
            }
        }
    }
}
