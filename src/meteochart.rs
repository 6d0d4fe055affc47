//! This module provides the main entry point: a client that owns the per-dataset
//! caches and hands out workers, controllers and UI sessions drawing from them.

use crate::engine::aggregation::AggregationEngine;
use crate::error::ChartError;
use crate::render::renderer::ChartRenderer;
use crate::render::selection::ChartSelection;
use crate::series_data::availability::{Availability, CacheAvailabilityChecker};
use crate::series_data::fetcher::SeriesFetcher;
use crate::series_data::source::{HttpSeriesSource, SeriesSource};
use crate::store::registry::StoreRegistry;
use crate::store::series_store::SeriesStore;
use crate::types::bounds::{YearBounds, YearRange};
use crate::types::dataset::Dataset;
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use crate::worker::context::WorkerEnv;
use crate::worker::controller::WorkerController;
use crate::worker::protocol::{ComputeRequest, WorkerMessage};
use crate::worker::session::ChartSession;
use bon::bon;
use plotters::prelude::DrawingBackend;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

/// The main client for drawing charts of the historical series.
///
/// It manages one on-disk store per dataset, filled from a [`SeriesSource`]
/// the first time a year range is requested that the cache cannot serve.
///
/// Create an instance with [`MeteoChart::new()`] (HTTP source, default cache
/// directory), [`MeteoChart::with_cache_folder()`] for a custom cache location,
/// or [`MeteoChart::open()`] to configure every part.
///
/// # Examples
///
/// ```rust
/// # use meteochart::{ChartError, MeteoChart};
/// # async fn run() -> Result<(), ChartError> {
/// let client = MeteoChart::new("http://localhost:8080").await?;
/// assert_eq!(client.bounds().min_year(), 1881);
/// # Ok(())
/// # }
/// ```
pub struct MeteoChart {
    cache_folder: PathBuf,
    stores: Arc<StoreRegistry>,
    checker: CacheAvailabilityChecker,
}

#[bon]
impl MeteoChart {
    /// Creates a client from its parts.
    ///
    /// # Arguments
    ///
    /// * `.source(Arc<dyn SeriesSource>)`: **Required.** Where the raw records come from.
    /// * `.cache_folder(PathBuf)`: Optional. Root of the stores. Defaults to the
    ///   system cache directory (e.g. `~/.cache/meteochart_cache` on Linux).
    /// * `.bounds(YearBounds)`: Optional. Years the stores cover. Defaults to 1881..=2006.
    ///
    /// # Errors
    ///
    /// Returns [`ChartError::CacheDirResolution`] if no default cache directory
    /// exists and [`ChartError::CacheDirCreation`] if the folder cannot be created.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use meteochart::{ChartError, FileSeriesSource, MeteoChart, YearBounds};
    /// # use std::sync::Arc;
    /// # async fn run() -> Result<(), ChartError> {
    /// let client = MeteoChart::open()
    ///     .source(Arc::new(FileSeriesSource::new("data")))
    ///     .cache_folder("/tmp/meteochart".into())
    ///     .bounds(YearBounds::new(1950, 2000).unwrap())
    ///     .call()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn open(
        source: Arc<dyn SeriesSource>,
        cache_folder: Option<PathBuf>,
        bounds: Option<YearBounds>,
    ) -> Result<Self, ChartError> {
        let cache_folder = match cache_folder {
            Some(folder) => folder,
            None => get_cache_dir().map_err(ChartError::CacheDirResolution)?,
        };
        ensure_cache_dir_exists(&cache_folder)
            .await
            .map_err(|e| ChartError::CacheDirCreation(cache_folder.clone(), e))?;

        let bounds = bounds.unwrap_or_default();
        Ok(Self {
            stores: Arc::new(StoreRegistry::new(&cache_folder, bounds)),
            checker: CacheAvailabilityChecker::new(SeriesFetcher::new(source)),
            cache_folder,
        })
    }

    /// Creates a client fetching `{base_url}/{dataset}.json`, cached in the
    /// default cache directory.
    pub async fn new(base_url: impl Into<String>) -> Result<Self, ChartError> {
        Self::open()
            .source(Arc::new(HttpSeriesSource::new(base_url)))
            .call()
            .await
    }

    /// Like [`MeteoChart::new`], caching in `cache_folder` instead.
    pub async fn with_cache_folder(
        base_url: impl Into<String>,
        cache_folder: PathBuf,
    ) -> Result<Self, ChartError> {
        Self::open()
            .source(Arc::new(HttpSeriesSource::new(base_url)))
            .cache_folder(cache_folder)
            .call()
            .await
    }

    pub fn bounds(&self) -> YearBounds {
        self.stores.bounds()
    }

    pub fn cache_folder(&self) -> &Path {
        &self.cache_folder
    }

    /// The store of `dataset`, opened (and laid out) on first use.
    pub async fn store(&self, dataset: Dataset) -> Result<Arc<SeriesStore>, ChartError> {
        Ok(self.stores.get(dataset).await?)
    }

    /// Makes sure every month of `range` is cached, fetching the dataset if not.
    pub async fn ensure(
        &self,
        dataset: Dataset,
        range: YearRange,
    ) -> Result<Availability, ChartError> {
        let store = self.store(dataset).await?;
        Ok(self.checker.ensure(&store, range).await?)
    }

    /// Runs `request` to completion in the calling task and returns every
    /// message a worker would have sent for it.
    ///
    /// # Errors
    ///
    /// Unlike a worker, which drops invalid requests, this returns
    /// [`ChartError::Validation`] for them.
    pub async fn transcript(
        &self,
        request: &ComputeRequest,
    ) -> Result<Vec<WorkerMessage>, ChartError> {
        let valid = request.validate(self.bounds())?;
        let store = self.store(valid.dataset).await?;
        self.checker.ensure(&store, valid.range).await?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(WorkerMessage::BaseOk)
            .map_err(|_| ChartError::ChannelClosed)?;
        AggregationEngine::new(&store, valid.range, valid.viewport, tx)
            .run()
            .await?;

        let mut messages = Vec::new();
        while let Some(message) = rx.recv().await {
            messages.push(message);
        }
        Ok(messages)
    }

    pub fn worker_env(&self) -> WorkerEnv {
        WorkerEnv::new(Arc::clone(&self.stores), self.checker.clone())
    }

    /// A lifecycle controller painting onto `renderer`.
    pub fn controller<DB: DrawingBackend>(
        &self,
        renderer: ChartRenderer<DB>,
    ) -> WorkerController<DB> {
        WorkerController::new(self.worker_env(), renderer)
    }

    /// A UI session starting from the default selection (temperature, all years).
    pub fn session<DB: DrawingBackend>(&self, renderer: ChartRenderer<DB>) -> ChartSession<DB> {
        ChartSession::new(self.controller(renderer), ChartSelection::new(self.bounds()))
    }

    /// Draws `request` onto `renderer` through a worker and returns the renderer
    /// once drawing has finished.
    pub async fn render<DB: DrawingBackend>(
        &self,
        request: ComputeRequest,
        renderer: ChartRenderer<DB>,
    ) -> Result<ChartRenderer<DB>, ChartError> {
        let mut controller = self.controller(renderer);
        controller.request_start(request)?;
        controller.run_until_finished().await?;
        Ok(controller.into_renderer())
    }
}
