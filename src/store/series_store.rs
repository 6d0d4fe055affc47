//! On-disk cache of one dataset's daily values, split into one partition per
//! (year, month).
//!
//! Every partition is a small bincode file mapping day-of-month to value.
//! Files are replaced atomically (written to a temp file beside the target and
//! persisted over it), so a reader either sees a partition's previous contents
//! or its complete new contents, never a half-written one. That matters because
//! "populated" is detected purely by a partition having entries.

use crate::store::error::StoreError;
use crate::types::bounds::YearBounds;
use crate::types::dataset::Dataset;
use crate::types::partition::PartitionKey;
use bincode::config::{Configuration, Fixint, LittleEndian};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

const SCHEMA_FILE_NAME: &str = "schema.bin";
const PARTITION_EXTENSION: &str = "bin";
const SCHEMA_VERSION: u32 = 1;
const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct SchemaMarker {
    version: u32,
    bounds: YearBounds,
}

/// A read snapshot of one partition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    days: BTreeMap<u32, f64>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn get(&self, day: u32) -> Option<f64> {
        self.days.get(&day).copied()
    }
}

/// Persistent, write-once store of daily values for a single [`Dataset`].
///
/// Opening a store lays out one empty partition for every month in its
/// [`YearBounds`]. That layout happens once per storage directory; later opens
/// find the schema marker and skip it.
///
/// Write transactions ([`SeriesStore::put_value`] and
/// [`SeriesStore::populate_if_empty`]) are serialised per store instance. Values
/// are never overwritten.
#[derive(Debug)]
pub struct SeriesStore {
    dataset: Dataset,
    bounds: YearBounds,
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl SeriesStore {
    /// Opens (and on first use initialises) the store for `dataset` under `cache_root`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the directory cannot be created or the
    /// schema marker and partition files cannot be read or written.
    pub async fn open(
        cache_root: &Path,
        dataset: Dataset,
        bounds: YearBounds,
    ) -> Result<Self, StoreError> {
        let dir = cache_root.join(dataset.path_segment());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::DirCreation(dir.clone(), e))?;

        let store = Self {
            dataset,
            bounds,
            dir,
            write_lock: Mutex::new(()),
        };
        store.initialise().await?;
        Ok(store)
    }

    pub fn dataset(&self) -> Dataset {
        self.dataset
    }

    pub fn bounds(&self) -> YearBounds {
        self.bounds
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lays out the partitions unless the schema marker says it was already done.
    ///
    /// Existing partition files are left alone, so re-running after an
    /// interrupted initialisation keeps whatever was populated before.
    async fn initialise(&self) -> Result<(), StoreError> {
        let marker_path = self.dir.join(SCHEMA_FILE_NAME);
        let expected = SchemaMarker {
            version: SCHEMA_VERSION,
            bounds: self.bounds,
        };

        if let Some(marker) = self.read_marker(&marker_path).await? {
            if marker == expected {
                log::debug!("Store for {} is up to date at {:?}", self.dataset, self.dir);
                return Ok(());
            }
            log::info!(
                "Store for {} has schema {:?}, upgrading to {:?}",
                self.dataset,
                marker,
                expected
            );
        }

        let mut created = 0usize;
        for year in self.bounds.years() {
            for key in PartitionKey::months_of(year) {
                let path = self.partition_path(key);
                if tokio::fs::try_exists(&path)
                    .await
                    .map_err(|e| StoreError::PartitionRead(path.clone(), e))?
                {
                    continue;
                }
                self.write_partition(key, &BTreeMap::new()).await?;
                created += 1;
            }
        }

        let bytes = bincode::serde::encode_to_vec(expected, BINCODE_CONFIG)
            .map_err(|e| StoreError::Encode(Box::new(e)))?;
        tokio::fs::write(&marker_path, bytes)
            .await
            .map_err(|e| StoreError::SchemaWrite(marker_path.clone(), e))?;
        log::info!(
            "Initialised store for {} at {:?}: {} partitions created",
            self.dataset,
            self.dir,
            created
        );
        Ok(())
    }

    async fn read_marker(&self, path: &Path) -> Result<Option<SchemaMarker>, StoreError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::SchemaRead(path.to_path_buf(), e)),
        };
        match bincode::serde::decode_from_slice::<SchemaMarker, _>(&bytes, BINCODE_CONFIG) {
            Ok((marker, _)) => Ok(Some(marker)),
            Err(e) => {
                // An unreadable marker is treated like an old schema.
                log::warn!("Ignoring unreadable schema marker {:?}: {}", path, e);
                Ok(None)
            }
        }
    }

    fn partition_path(&self, key: PartitionKey) -> PathBuf {
        self.dir.join(format!("{}.{}", key, PARTITION_EXTENSION))
    }

    fn check_key(&self, key: PartitionKey) -> Result<(), StoreError> {
        if self.bounds.years().contains(&key.year()) {
            Ok(())
        } else {
            Err(StoreError::UnknownPartition(key.to_string()))
        }
    }

    /// Reads a snapshot of the partition for `key`.
    pub async fn read_partition(&self, key: PartitionKey) -> Result<Partition, StoreError> {
        self.check_key(key)?;
        let path = self.partition_path(key);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| StoreError::PartitionRead(path.clone(), e))?;
        let (days, _) =
            bincode::serde::decode_from_slice::<BTreeMap<u32, f64>, _>(&bytes, BINCODE_CONFIG)
                .map_err(|e| StoreError::Decode(path, Box::new(e)))?;
        Ok(Partition { days })
    }

    async fn write_partition(
        &self,
        key: PartitionKey,
        days: &BTreeMap<u32, f64>,
    ) -> Result<(), StoreError> {
        let bytes = bincode::serde::encode_to_vec(days, BINCODE_CONFIG)
            .map_err(|e| StoreError::Encode(Box::new(e)))?;
        let dir = self.dir.clone();
        let path = self.partition_path(key);
        tokio::task::spawn_blocking(move || {
            let mut temp_file = NamedTempFile::new_in(&dir)
                .map_err(|e| StoreError::PartitionWrite(path.clone(), e))?;
            temp_file
                .write_all(&bytes)
                .map_err(|e| StoreError::PartitionWrite(path.clone(), e))?;
            temp_file
                .flush()
                .map_err(|e| StoreError::PartitionWrite(path.clone(), e))?;
            temp_file
                .persist(&path)
                .map_err(|e| StoreError::PartitionWrite(path.clone(), e.error))?;
            Ok::<(), StoreError>(())
        })
        .await??;
        Ok(())
    }

    /// Number of days stored in the partition for `key`.
    pub async fn count_entries(&self, key: PartitionKey) -> Result<usize, StoreError> {
        Ok(self.read_partition(key).await?.len())
    }

    /// Value stored for `day` in partition `key`, if any.
    pub async fn get_value(&self, key: PartitionKey, day: u32) -> Result<Option<f64>, StoreError> {
        Ok(self.read_partition(key).await?.get(day))
    }

    /// Stores `value` for `day` unless that day already holds a value.
    ///
    /// Returns `true` if the value was written.
    pub async fn put_value(
        &self,
        key: PartitionKey,
        day: u32,
        value: f64,
    ) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut days = self.read_partition(key).await?.days;
        if days.contains_key(&day) {
            return Ok(false);
        }
        days.insert(day, value);
        self.write_partition(key, &days).await?;
        Ok(true)
    }

    /// Writes every `(day, value)` into partition `key` if, and only if, the
    /// partition is currently empty. The emptiness check and the write happen
    /// in one transaction.
    ///
    /// Returns `true` if the partition was populated by this call.
    pub async fn populate_if_empty(
        &self,
        key: PartitionKey,
        values: &[(u32, f64)],
    ) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        if !self.read_partition(key).await?.is_empty() {
            return Ok(false);
        }
        if values.is_empty() {
            return Ok(false);
        }
        let days: BTreeMap<u32, f64> = values.iter().copied().collect();
        self.write_partition(key, &days).await?;
        Ok(true)
    }
}
