//! Paints worker messages onto a plotters drawing area.
//!
//! The renderer is the only owner of what the user sees: the chart itself
//! and the loading, empty and failure indicators. Painting errors are logged
//! and otherwise ignored, the same way a browser canvas never reports them.

use crate::engine::axis::AxisMarker;
use crate::types::bounds::Viewport;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

const GRIDLINE: RGBColor = RGBColor(0xcc, 0xcc, 0xcc);
const FONT_FAMILY: &str = "sans-serif";
const LABEL_SIZE: u32 = 10;
const MESSAGE_SIZE: u32 = 16;

/// The indicator currently shown over the chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Idle,
    /// A request was sent and nothing has been drawn for it yet.
    Loading,
    /// The current selection cannot be drawn.
    NoData,
    /// The worker reported a store or fetch failure.
    Failed(String),
}

/// Counters of what was painted since the renderer was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub clears: usize,
    pub polylines: usize,
    pub points: usize,
    pub axis_markers: usize,
}

pub struct ChartRenderer<DB: DrawingBackend> {
    area: DrawingArea<DB, Shift>,
    viewport: Viewport,
    view: ViewState,
    stats: RenderStats,
}

impl<DB: DrawingBackend> ChartRenderer<DB> {
    pub fn new(backend: DB) -> Self {
        let area = backend.into_drawing_area();
        let (width, height) = area.dim_in_pixel();
        Self {
            area,
            viewport: Viewport::new(width, height),
            view: ViewState::Idle,
            stats: RenderStats::default(),
        }
    }

    /// Size of the drawing surface. Compute requests are sized from this.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Wipes the surface and hides every indicator.
    pub fn clear_all(&mut self) {
        self.stats.clears += 1;
        self.view = ViewState::Idle;
        if let Err(e) = self.area.fill(&WHITE) {
            log::error!("Failed to clear chart surface: {:?}", e);
        }
    }

    /// Erases the loading notice before the first chart content is painted.
    fn dismiss_loading(&mut self) {
        if self.view != ViewState::Loading {
            return;
        }
        self.view = ViewState::Idle;
        if let Err(e) = self.area.fill(&WHITE) {
            log::error!("Failed to erase loading notice: {:?}", e);
        }
    }

    /// Draws a flat `x, y, x, y, ...` sequence as one black polyline.
    pub fn draw_polyline(&mut self, coordinates: &[f64]) {
        self.dismiss_loading();
        let points: Vec<(i32, i32)> = coordinates
            .chunks_exact(2)
            .map(|pair| (pair[0].round() as i32, pair[1].round() as i32))
            .collect();
        if points.is_empty() {
            return;
        }
        self.stats.polylines += 1;
        self.stats.points += points.len();
        if let Err(e) = self
            .area
            .draw(&PathElement::new(points, BLACK.stroke_width(1)))
        {
            log::error!("Failed to draw polyline: {:?}", e);
        }
    }

    /// Draws gridlines: value markers as horizontal lines labelled at their
    /// left end, year markers as vertical lines labelled at the bottom.
    pub fn draw_axis(&mut self, markers: &[AxisMarker]) {
        self.dismiss_loading();
        let width = self.viewport.width as i32;
        let height = self.viewport.height as i32;
        let label_style = (FONT_FAMILY, LABEL_SIZE).into_font().color(&GRIDLINE);

        for marker in markers {
            let (line, label, anchor, label_at) = match *marker {
                AxisMarker::Value { value, y } => {
                    let y = y.round() as i32;
                    (
                        vec![(0, y), (width, y)],
                        value.to_string(),
                        Pos::new(HPos::Left, VPos::Bottom),
                        (1, y - 1),
                    )
                }
                AxisMarker::Year { year, x } => {
                    let x = x.round() as i32;
                    (
                        vec![(x, 0), (x, height)],
                        year.to_string(),
                        Pos::new(HPos::Right, VPos::Bottom),
                        (x - 1, height - 1),
                    )
                }
            };
            let drawn = self
                .area
                .draw(&PathElement::new(line, GRIDLINE.stroke_width(1)))
                .and_then(|_| {
                    self.area
                        .draw(&Text::new(label, label_at, label_style.pos(anchor)))
                });
            if let Err(e) = drawn {
                log::error!("Failed to draw axis marker {:?}: {:?}", marker, e);
            }
        }
        self.stats.axis_markers += markers.len();
    }

    pub fn show_loading(&mut self) {
        self.view = ViewState::Loading;
        self.paint_message("Loading...");
    }

    pub fn show_no_data(&mut self) {
        self.view = ViewState::NoData;
        self.paint_message("No data");
    }

    /// Replaces the chart with a "data unavailable" notice.
    pub fn show_failure(&mut self, reason: &str) {
        self.clear_all();
        self.view = ViewState::Failed(reason.to_string());
        self.paint_message("Data unavailable");
    }

    fn paint_message(&mut self, text: &str) {
        let center = (
            self.viewport.width as i32 / 2,
            self.viewport.height as i32 / 2,
        );
        let style = (FONT_FAMILY, MESSAGE_SIZE)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        if let Err(e) = self.area.draw(&Text::new(text, center, style)) {
            log::error!("Failed to paint '{}': {:?}", text, e);
        }
    }

    /// Flushes pending output to the backend.
    pub fn present(&self) {
        if let Err(e) = self.area.present() {
            log::error!("Failed to present chart: {:?}", e);
        }
    }
}
