//! The worker context: a spawned task that serves compute requests one at a
//! time and streams [`WorkerMessage`]s back.
//!
//! A worker is only ever stopped by aborting its task. Partition writes are
//! atomic renames, so an abort can lose a fill in progress but never leave a
//! partition that looks populated without being complete.

use crate::engine::aggregation::AggregationEngine;
use crate::engine::error::EngineError;
use crate::error::ChartError;
use crate::series_data::availability::CacheAvailabilityChecker;
use crate::store::registry::StoreRegistry;
use crate::types::bounds::YearBounds;
use crate::worker::protocol::{ComputeRequest, FailureKind, WorkerFailure, WorkerMessage};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

static NEXT_WORKER_ID: AtomicU64 = AtomicU64::new(1);

/// Everything a worker needs, shared by all workers of one client.
#[derive(Clone)]
pub struct WorkerEnv {
    stores: Arc<StoreRegistry>,
    checker: CacheAvailabilityChecker,
}

impl WorkerEnv {
    pub fn new(stores: Arc<StoreRegistry>, checker: CacheAvailabilityChecker) -> Self {
        Self { stores, checker }
    }

    pub fn bounds(&self) -> YearBounds {
        self.stores.bounds()
    }

    /// Serves one request: validate, make sure the range is cached, then draw.
    async fn compute(
        &self,
        request: &ComputeRequest,
        messages: &UnboundedSender<WorkerMessage>,
    ) -> Result<(), ChartError> {
        let valid = match request.validate(self.bounds()) {
            Ok(valid) => valid,
            Err(e) => {
                log::warn!("Dropping compute request {:?}: {}", request, e);
                return Ok(());
            }
        };

        let store = self.stores.get(valid.dataset).await?;
        self.checker.ensure(&store, valid.range).await?;
        messages
            .send(WorkerMessage::BaseOk)
            .map_err(|_| ChartError::ChannelClosed)?;

        let summary = AggregationEngine::new(&store, valid.range, valid.viewport, messages.clone())
            .run()
            .await?;
        log::debug!(
            "Finished {} {}: {} {} groups, {} rescales",
            valid.dataset,
            valid.range,
            summary.groups.len(),
            summary.unit,
            summary.rescales
        );
        Ok(())
    }
}

/// Maps a failed request to the message shown to the user. `None` means the
/// UI side is gone and the worker should stop.
fn failure_of(error: &ChartError) -> Option<WorkerFailure> {
    let kind = match error {
        ChartError::ChannelClosed | ChartError::Engine(EngineError::ChannelClosed) => return None,
        ChartError::Fetch(_) => FailureKind::FetchFailed,
        _ => FailureKind::StoreUnavailable,
    };
    Some(WorkerFailure {
        kind,
        message: error.to_string(),
    })
}

async fn serve(
    id: u64,
    env: WorkerEnv,
    mut requests: UnboundedReceiver<ComputeRequest>,
    messages: UnboundedSender<WorkerMessage>,
) {
    while let Some(request) = requests.recv().await {
        let Err(error) = env.compute(&request, &messages).await else {
            continue;
        };
        let Some(failure) = failure_of(&error) else {
            break;
        };
        log::error!("Worker {} failed: {}", id, failure.message);
        if messages.send(WorkerMessage::Failed(failure)).is_err() {
            break;
        }
    }
    log::debug!("Worker {} stopped", id);
}

/// The UI side's handle on one worker context.
///
/// Dropping the handle aborts the worker.
pub struct WorkerHandle {
    id: u64,
    requests: UnboundedSender<ComputeRequest>,
    messages: UnboundedReceiver<WorkerMessage>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn spawn(env: WorkerEnv) -> Self {
        let id = NEXT_WORKER_ID.fetch_add(1, Ordering::Relaxed);
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(serve(id, env, request_rx, message_tx));
        log::debug!("Spawned worker {}", id);
        Self {
            id,
            requests: request_tx,
            messages: message_rx,
            task,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn send(&self, request: ComputeRequest) -> Result<(), ChartError> {
        self.requests
            .send(request)
            .map_err(|_| ChartError::ChannelClosed)
    }

    /// Next message from the worker, or `None` once the worker has stopped.
    pub async fn recv(&mut self) -> Option<WorkerMessage> {
        self.messages.recv().await
    }

    /// Stops the worker immediately, abandoning whatever it was doing.
    pub fn terminate(self) {
        log::debug!("Terminating worker {}", self.id);
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series_data::fetcher::tests::GeneratedSource;
    use crate::series_data::fetcher::SeriesFetcher;
    use crate::types::bounds::Viewport;
    use crate::types::dataset::Dataset;

    fn env(root: &std::path::Path, source: Arc<GeneratedSource>) -> WorkerEnv {
        let bounds = YearBounds::new(1900, 1905).unwrap();
        WorkerEnv::new(
            Arc::new(StoreRegistry::new(root, bounds)),
            CacheAvailabilityChecker::new(SeriesFetcher::new(source)),
        )
    }

    #[tokio::test]
    async fn test_worker_serves_request_then_waits() -> Result<(), ChartError> {
        let root = tempfile::tempdir().unwrap();
        let source = Arc::new(GeneratedSource::new(1900, 1905, |_| 3.0));
        let mut worker = WorkerHandle::spawn(env(root.path(), source.clone()));

        let viewport = Viewport::new(400, 200);
        worker.send(ComputeRequest::new(Dataset::Temperature, 1900, 1905, viewport))?;
        assert_eq!(worker.recv().await, Some(WorkerMessage::BaseOk));
        let mut last = None;
        while let Some(message) = worker.recv().await {
            let done = message == WorkerMessage::DrawFinish;
            last = Some(message);
            if done {
                break;
            }
        }
        assert_eq!(last, Some(WorkerMessage::DrawFinish));

        // the same worker takes a second request, served from the cache
        worker.send(ComputeRequest::new(Dataset::Temperature, 1901, 1901, viewport))?;
        assert_eq!(worker.recv().await, Some(WorkerMessage::BaseOk));
        assert_eq!(source.fetch_count(), 1);
        worker.terminate();
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_request_produces_no_messages() -> Result<(), ChartError> {
        let root = tempfile::tempdir().unwrap();
        let source = Arc::new(GeneratedSource::new(1900, 1905, |_| 3.0));
        let mut worker = WorkerHandle::spawn(env(root.path(), source.clone()));

        let viewport = Viewport::new(400, 200);
        worker.send(ComputeRequest::new(Dataset::Temperature, 2010, 2020, viewport))?;
        worker.send(ComputeRequest::new(Dataset::Precipitation, 1905, 1905, viewport))?;
        // the dropped request leaves no trace; the next one answers first
        assert_eq!(worker.recv().await, Some(WorkerMessage::BaseOk));
        Ok(())
    }

    #[test]
    fn test_failure_kinds() {
        let fetch = ChartError::Fetch(crate::series_data::error::FetchError::JsonParse(
            "temperature.json".to_string(),
            serde_json::from_str::<u32>("x").unwrap_err(),
        ));
        assert_eq!(failure_of(&fetch).unwrap().kind, FailureKind::FetchFailed);

        let store = ChartError::Store(crate::store::error::StoreError::UnknownPartition(
            "1950_01".to_string(),
        ));
        assert_eq!(failure_of(&store).unwrap().kind, FailureKind::StoreUnavailable);
        assert!(failure_of(&ChartError::ChannelClosed).is_none());
    }
}
