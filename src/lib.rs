mod engine;
mod error;
mod meteochart;
mod render;
mod series_data;
mod store;
mod types;
mod utils;
mod worker;

pub use error::ChartError;
pub use meteochart::*;

pub use types::bounds::*;
pub use types::dataset::{Dataset, UnknownDataset};
pub use types::partition::PartitionKey;
pub use types::record::RawRecord;

pub use store::error::StoreError;
pub use store::registry::StoreRegistry;
pub use store::series_store::{Partition, SeriesStore};

pub use series_data::availability::{Availability, CacheAvailabilityChecker};
pub use series_data::error::{FetchError, PopulateError};
pub use series_data::fetcher::{PopulateReport, SeriesFetcher};
pub use series_data::source::{FileSeriesSource, HttpSeriesSource, SeriesSource};

pub use engine::aggregation::{AggregationEngine, RunSummary};
pub use engine::axis::{axis_markers, AxisMarker, AxisRange};
pub use engine::error::EngineError;
pub use engine::unit::{AggregationUnit, GroupLayout};

pub use worker::context::{WorkerEnv, WorkerHandle};
pub use worker::controller::{WorkerController, WorkerRunState};
pub use worker::error::ValidationError;
pub use worker::protocol::*;
pub use worker::session::ChartSession;

pub use render::renderer::{ChartRenderer, RenderStats, ViewState};
pub use render::selection::{ChartSelection, UiEvent};
