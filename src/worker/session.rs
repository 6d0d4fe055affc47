use crate::error::ChartError;
use crate::render::renderer::ChartRenderer;
use crate::render::selection::{ChartSelection, UiEvent};
use crate::worker::controller::WorkerController;
use plotters::prelude::DrawingBackend;
use tokio::sync::mpsc::UnboundedReceiver;

/// The UI loop: turns selection changes into start requests and feeds worker
/// messages to the renderer, until [`UiEvent::Shutdown`] or the event channel
/// closes.
pub struct ChartSession<DB: DrawingBackend> {
    controller: WorkerController<DB>,
    selection: ChartSelection,
}

impl<DB: DrawingBackend> ChartSession<DB> {
    pub fn new(controller: WorkerController<DB>, selection: ChartSelection) -> Self {
        Self {
            controller,
            selection,
        }
    }

    /// Draws the initial selection, then reacts to `events`. Returns the
    /// controller so the final state of the chart can be inspected.
    pub async fn run(
        mut self,
        mut events: UnboundedReceiver<UiEvent>,
    ) -> Result<WorkerController<DB>, ChartError> {
        let viewport = self.controller.renderer().viewport();
        self.controller
            .request_start(self.selection.to_request(viewport))?;

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    None | Some(UiEvent::Shutdown) => break,
                    Some(event) => {
                        if self.selection.apply(event) {
                            self.controller
                                .request_start(self.selection.to_request(viewport))?;
                        }
                    }
                },
                message = self.controller.next_message() => {
                    self.controller.handle_message(message)?;
                }
            }
        }
        Ok(self.controller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series_data::availability::CacheAvailabilityChecker;
    use crate::series_data::fetcher::tests::GeneratedSource;
    use crate::series_data::fetcher::SeriesFetcher;
    use crate::store::registry::StoreRegistry;
    use crate::types::bounds::YearBounds;
    use crate::types::dataset::Dataset;
    use crate::worker::context::WorkerEnv;
    use crate::worker::controller::WorkerRunState;
    use plotters::prelude::SVGBackend;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_session_follows_selection() -> Result<(), ChartError> {
        let root = tempfile::tempdir().unwrap();
        let bounds = YearBounds::new(1900, 1904).unwrap();
        let source = Arc::new(GeneratedSource::new(1900, 1904, |_| 2.0));
        let env = WorkerEnv::new(
            Arc::new(StoreRegistry::new(root.path(), bounds)),
            CacheAvailabilityChecker::new(SeriesFetcher::new(source)),
        );

        let mut svg = String::new();
        let renderer = ChartRenderer::new(SVGBackend::with_string(&mut svg, (400, 200)));
        let controller = WorkerController::new(env, renderer);
        let session = ChartSession::new(controller, ChartSelection::new(bounds));

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(UiEvent::SelectDataset(Dataset::Precipitation)).unwrap();
        tx.send(UiEvent::SelectFrom("1903".to_string())).unwrap();
        tx.send(UiEvent::SelectFrom("1903".to_string())).unwrap();
        tx.send(UiEvent::Shutdown).unwrap();

        let mut controller = session.run(rx).await?;
        controller.run_until_finished().await?;
        assert_eq!(controller.state(), WorkerRunState::Finished);
        assert!(controller.renderer().stats().clears >= 2);
        assert!(controller.renderer().stats().polylines >= 1);
        Ok(())
    }
}
