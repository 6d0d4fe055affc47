//! Owns the single active worker and decides, for every start request and
//! every worker message, what happens to it.
//!
//! | state            | event       | action                                | next             |
//! |------------------|-------------|---------------------------------------|------------------|
//! | New              | start       | spawn worker, send request            | Started          |
//! | Finished         | start       | send request to the existing worker   | Started          |
//! | Drawing          | start       | terminate, spawn a new worker, send   | Started          |
//! | Started          | start       | remember the request                  | WaitingTerminate |
//! | WaitingTerminate | start       | replace the remembered request        | WaitingTerminate |
//! | Started          | base-ok     |                                       | Drawing          |
//! | WaitingTerminate | base-ok     | terminate, spawn, send latest request | Started          |
//! | WaitingTerminate | failed      | terminate, spawn, send latest request | Started          |
//! | other            | failed      | show "Data unavailable"               | Finished         |
//! | any              | draw-finish |                                       | Finished         |
//!
//! A worker in `Started` is still checking or filling the cache. It is left
//! to finish so the fill completes; only drawing is ever cut short.

use crate::error::ChartError;
use crate::render::renderer::ChartRenderer;
use crate::worker::context::{WorkerEnv, WorkerHandle};
use crate::worker::protocol::{ComputeRequest, WorkerMessage};
use plotters::prelude::DrawingBackend;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerRunState {
    New,
    Started,
    Drawing,
    Finished,
    WaitingTerminate,
}

impl fmt::Display for WorkerRunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerRunState::New => "new",
            WorkerRunState::Started => "started",
            WorkerRunState::Drawing => "drawing",
            WorkerRunState::Finished => "finished",
            WorkerRunState::WaitingTerminate => "waiting-terminate",
        };
        write!(f, "{}", name)
    }
}

pub struct WorkerController<DB: DrawingBackend> {
    env: WorkerEnv,
    state: WorkerRunState,
    worker: Option<WorkerHandle>,
    pending: Option<ComputeRequest>,
    renderer: ChartRenderer<DB>,
}

impl<DB: DrawingBackend> WorkerController<DB> {
    pub fn new(env: WorkerEnv, renderer: ChartRenderer<DB>) -> Self {
        Self {
            env,
            state: WorkerRunState::New,
            worker: None,
            pending: None,
            renderer,
        }
    }

    pub fn state(&self) -> WorkerRunState {
        self.state
    }

    pub fn renderer(&self) -> &ChartRenderer<DB> {
        &self.renderer
    }

    pub fn into_renderer(self) -> ChartRenderer<DB> {
        self.renderer
    }

    /// Id of the live worker, if there is one.
    pub fn worker_id(&self) -> Option<u64> {
        self.worker.as_ref().map(WorkerHandle::id)
    }

    /// Asks for `request` to be drawn, replacing whatever is on screen.
    pub fn request_start(&mut self, request: ComputeRequest) -> Result<(), ChartError> {
        self.pending = Some(request);
        match self.state {
            WorkerRunState::New | WorkerRunState::Finished => self.start_worker(),
            WorkerRunState::Drawing => self.restart(),
            WorkerRunState::Started => {
                self.transition(WorkerRunState::WaitingTerminate);
                Ok(())
            }
            WorkerRunState::WaitingTerminate => Ok(()),
        }
    }

    /// Applies one message from the current worker.
    pub fn handle_message(&mut self, message: WorkerMessage) -> Result<(), ChartError> {
        match message {
            WorkerMessage::Clear => self.renderer.clear_all(),
            WorkerMessage::Draw(points) => self.renderer.draw_polyline(&points),
            WorkerMessage::DrawAxis(markers) => self.renderer.draw_axis(&markers),
            WorkerMessage::DrawFinish => {
                self.transition(WorkerRunState::Finished);
                self.renderer.present();
            }
            WorkerMessage::BaseOk => {
                if self.state == WorkerRunState::WaitingTerminate {
                    return self.restart();
                }
                self.transition(WorkerRunState::Drawing);
            }
            WorkerMessage::Failed(failure) => {
                if self.state == WorkerRunState::WaitingTerminate {
                    return self.restart();
                }
                log::error!("{:?}: {}", failure.kind, failure.message);
                self.renderer.show_failure(&failure.message);
                self.transition(WorkerRunState::Finished);
            }
        }
        Ok(())
    }

    /// Waits for the next message of the current worker. Never resolves while
    /// there is no worker.
    pub async fn next_message(&mut self) -> WorkerMessage {
        loop {
            let Some(worker) = self.worker.as_mut() else {
                return std::future::pending().await;
            };
            if let Some(message) = worker.recv().await {
                return message;
            }
            log::error!("Worker {} exited unexpectedly", worker.id());
            self.worker = None;
            self.renderer.show_failure("worker stopped");
            self.transition(WorkerRunState::New);
        }
    }

    /// Handles messages until the current request has finished drawing, or
    /// until nothing more can arrive.
    pub async fn run_until_finished(&mut self) -> Result<(), ChartError> {
        while self.state != WorkerRunState::Finished && self.worker.is_some() {
            let message = self.next_message().await;
            self.handle_message(message)?;
        }
        Ok(())
    }

    fn restart(&mut self) -> Result<(), ChartError> {
        if let Some(worker) = self.worker.take() {
            worker.terminate();
        }
        self.transition(WorkerRunState::New);
        self.start_worker()
    }

    /// Sends the pending request, or shows the empty state if it cannot be drawn.
    fn start_worker(&mut self) -> Result<(), ChartError> {
        let Some(request) = self.pending.take() else {
            return Ok(());
        };
        self.renderer.clear_all();

        if let Err(e) = request.validate(self.env.bounds()) {
            log::warn!("Not starting {:?}: {}", request, e);
            self.renderer.show_no_data();
            return Ok(());
        }

        let worker = self
            .worker
            .get_or_insert_with(|| WorkerHandle::spawn(self.env.clone()));
        worker.send(request)?;
        self.renderer.show_loading();
        self.transition(WorkerRunState::Started);
        Ok(())
    }

    fn transition(&mut self, next: WorkerRunState) {
        if self.state != next {
            log::debug!("Worker state {} -> {}", self.state, next);
            self.state = next;
        }
    }
}
