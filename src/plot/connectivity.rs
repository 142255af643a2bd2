//! Connectivity matrix of a multi-area network.
use nalgebra::DMatrix;
use plotters::prelude::*;
use std::path::Path;

use crate::error::PipelineError;
use crate::plot::colormap::{normalize, viridis};
use crate::plot::{draw_colorbar, render, DrawResult, FIGURE_SIZE};

/// The recurrent part of a `P x (P + 1)` synapse matrix.
pub fn recurrent_synapses(synapses: &DMatrix<f64>) -> Result<DMatrix<f64>, PipelineError> {
    let num_populations = synapses.nrows();
    if synapses.ncols() != num_populations + 1 {
        return Err(PipelineError::ShapeMismatch(format!(
            "expected a P x (P + 1) synapse matrix, found {} x {}",
            synapses.nrows(),
            synapses.ncols()
        )));
    }
    Ok(synapses.columns(0, num_populations).into_owned())
}

/// Plot `log10` of the recurrent synapse counts, target populations as rows and sources as
/// columns. Entries without synapses are left blank.
pub fn connectivity_plot<P: AsRef<Path>>(
    path: P,
    synapses: &DMatrix<f64>,
) -> Result<(), PipelineError> {
    let recurrent = recurrent_synapses(synapses)?;
    if recurrent.iter().any(|&count| count < 0.0 || count.is_nan()) {
        return Err(PipelineError::InvalidParameter(
            "synapse counts must be non-negative".to_string(),
        ));
    }
    let log_counts = recurrent.map(|count| if count > 0.0 { count.log10() } else { f64::NAN });
    render(path, |path| draw(path, &log_counts))
}

fn draw(path: &Path, log_counts: &DMatrix<f64>) -> DrawResult {
    let root = SVGBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let (plot_area, colorbar_area) = root.split_horizontally(FIGURE_SIZE.0 - 130);

    let n = log_counts.nrows() as f64;
    let mut chart = ChartBuilder::on(&plot_area)
        .caption("connectivity matrix", ("sans-serif", 20))
        .margin(20)
        .build_cartesian_2d(0.0..n.max(1.0), 0.0..n.max(1.0))?;

    let finite = log_counts.iter().copied().filter(|x| x.is_finite());
    let min = finite.clone().fold(f64::INFINITY, f64::min);
    let max = finite.fold(f64::NEG_INFINITY, f64::max);
    let (min, max) = match (min.is_finite(), min < max) {
        (true, true) => (min, max),
        (true, false) => (min - 0.5, min + 0.5),
        _ => (0.0, 1.0),
    };

    chart.draw_series(
        log_counts
            .row_iter()
            .enumerate()
            .flat_map(|(i, row)| {
                row.iter()
                    .copied()
                    .enumerate()
                    .map(move |(j, value)| (i, j, value))
                    .collect::<Vec<_>>()
            })
            .filter(|(_, _, value)| value.is_finite())
            .map(|(i, j, value)| {
                // row 0 at the top
                let y = n - 1.0 - i as f64;
                let x = j as f64;
                Rectangle::new(
                    [(x, y), (x + 1.0, y + 1.0)],
                    viridis(normalize(value, min, max)).filled(),
                )
            }),
    )?;

    draw_colorbar(&colorbar_area, (min, max), "log10( number of synapses )")?;
    root.present()?;
    Ok(())
}
