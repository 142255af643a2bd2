//! Distributions of population rates and CVs.
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

use crate::core::statistics::PopulationStatistics;
use crate::error::PipelineError;
use crate::plot::histogram::Histogram;
use crate::plot::{render, DrawResult};

/// Fraction of a bin covered by its bar.
const BAR_WIDTH: f64 = 0.9;

/// Size of the two-panel figure, in pixels.
const STATISTICS_FIGURE_SIZE: (u32, u32) = (600, 400);

/// Plot side-by-side histograms of the rates and CVs of all populations.
pub fn statistics_plot<P: AsRef<Path>>(
    path: P,
    statistics: &[PopulationStatistics],
) -> Result<(), PipelineError> {
    let rates: Vec<f64> = statistics.iter().map(|s| s.rate).collect();
    let cvs: Vec<f64> = statistics.iter().map(|s| s.cv).collect();
    render(path, |path| draw(path, &rates, &cvs))
}

fn draw(path: &Path, rates: &[f64], cvs: &[f64]) -> DrawResult {
    let root = SVGBackend::new(path, STATISTICS_FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((1, 2));
    draw_histogram(&panels[0], &Histogram::auto(rates), "rate histogram", "ν [spks/s]")?;
    draw_histogram(&panels[1], &Histogram::auto(cvs), "CV histogram", "CV")?;
    root.present()?;
    Ok(())
}

fn draw_histogram(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    histogram: &Histogram,
    title: &str,
    x_desc: &str,
) -> DrawResult {
    let x_min = histogram.edges[0];
    let x_max = histogram.edges[histogram.num_bins()];
    let y_max = histogram.max_count().max(1) as f64 * 1.05;

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 16))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(35)
        .build_cartesian_2d(x_min..x_max, 0.0..y_max)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(5)
        .x_desc(x_desc)
        .draw()?;

    let margin = (1.0 - BAR_WIDTH) / 2.0;
    chart.draw_series(histogram.bins().map(|(left, right, count)| {
        let width = right - left;
        Rectangle::new(
            [(left + margin * width, 0.0), (right - margin * width, count as f64)],
            BLUE.mix(0.8).filled(),
        )
    }))?;
    Ok(())
}
