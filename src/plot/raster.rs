//! Raster plot of recorded spikes.
use plotters::prelude::*;
use std::path::Path;

use crate::error::PipelineError;
use crate::plot::{check_range, render, DrawResult, FIGURE_SIZE};

/// Plot spike times (x axis, restricted to `time_range`) against sender ids.
pub fn raster_plot<P: AsRef<Path>>(
    path: P,
    ids: &[u64],
    times: &[f64],
    time_range: (f64, f64),
) -> Result<(), PipelineError> {
    check_range("raster time", time_range)?;
    if ids.len() != times.len() {
        return Err(PipelineError::ShapeMismatch(format!(
            "{} ids but {} times",
            ids.len(),
            times.len()
        )));
    }
    render(path, |path| draw(path, ids, times, time_range))
}

fn draw(path: &Path, ids: &[u64], times: &[f64], (t_min, t_max): (f64, f64)) -> DrawResult {
    let root = SVGBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let id_min = ids.iter().copied().min().unwrap_or(0) as f64;
    let id_max = ids.iter().copied().max().unwrap_or(1) as f64;
    let mut chart = ChartBuilder::on(&root)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(t_min..t_max, (id_min - 1.0)..(id_max + 1.0))?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Time (ms)")
        .y_desc("Neuron id")
        .draw()?;

    chart.draw_series(
        ids.iter()
            .zip(times)
            .filter(|&(_, &t)| t >= t_min && t <= t_max)
            .map(|(&id, &t)| Circle::new((t, id as f64), 2, BLUE.filled())),
    )?;

    root.present()?;
    Ok(())
}
