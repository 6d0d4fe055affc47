//! demos/render_chart.rs
//!
//! Draws a chart into an SVG file and prints the worker protocol transcript.
//!
//! The series are fetched from `$METEOCHART_BASE_URL` when it is set, otherwise
//! read from `temperature.json` / `precipitation.json` in `$METEOCHART_DATA_DIR`
//! (default `./data`).
//!
//! To run this example:
//! RUST_LOG=debug cargo run --example render_chart -- precipitation 1950 1980

use meteochart::{
    ChartRenderer, ComputeRequest, Dataset, FileSeriesSource, HttpSeriesSource, MeteoChart,
    SeriesSource, Viewport,
};
use plotters::prelude::SVGBackend;
use std::env;
use std::error::Error;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let dataset: Dataset = args.next().as_deref().unwrap_or("temperature").parse()?;
    let from = args.next().unwrap_or_else(|| "1881".to_string());
    let to = args.next().unwrap_or_else(|| "2006".to_string());

    let source: Arc<dyn SeriesSource> = match env::var("METEOCHART_BASE_URL") {
        Ok(url) => Arc::new(HttpSeriesSource::new(url)),
        Err(_) => Arc::new(FileSeriesSource::new(
            env::var("METEOCHART_DATA_DIR").unwrap_or_else(|_| "data".to_string()),
        )),
    };
    let client = MeteoChart::open().source(source).call().await?;
    println!("Caching in {}", client.cache_folder().display());

    // a 1280x720 window
    let viewport = Viewport::fit_window(1280, 720);
    let request = ComputeRequest {
        dataset: dataset.to_string(),
        year_from: from,
        year_to: to,
        width: viewport.width,
        height: viewport.height,
    };

    for message in client.transcript(&request).await? {
        let line = message.to_line();
        // long draw messages are cut for readability
        println!("{}", line.chars().take(120).collect::<String>());
    }

    let output = format!("{}_{}_{}.svg", dataset, request.year_from, request.year_to);
    {
        let backend = SVGBackend::new(&output, (viewport.width, viewport.height));
        let renderer = client.render(request, ChartRenderer::new(backend)).await?;
        println!("{:?}", renderer.stats());
    }
    println!("Chart written to {}", output);

    Ok(())
}
