//! Diagnostic plots, rendered as SVG files.
//!
//! - [`raster`]: spike times against neuron ids
//! - [`phase_diagram`]: CV of Brunel runs over the `(g, nu_ex)` plane
//! - [`connectivity`]: logarithm of the recurrent synapse counts of a multi-area network
//! - [`statistics`]: histograms of population rates and CVs
pub mod colormap;
pub mod connectivity;
pub mod histogram;
pub mod phase_diagram;
pub mod raster;
pub mod statistics;

use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;
use std::path::Path;

use crate::error::PipelineError;
use crate::io::ensure_extension;
use colormap::viridis;

/// Result of the drawing routines, whose backend errors are converted into [`PipelineError::Plot`].
type DrawResult = Result<(), Box<dyn Error>>;

/// Size of single-panel figures, in pixels.
pub const FIGURE_SIZE: (u32, u32) = (640, 480);

/// Number of colour steps of a colour bar.
const COLORBAR_STEPS: usize = 128;

/// Check the output path and run a drawing routine, converting backend errors.
fn render<P, F>(path: P, draw: F) -> Result<(), PipelineError>
where
    P: AsRef<Path>,
    F: FnOnce(&Path) -> DrawResult,
{
    let path = path.as_ref();
    ensure_extension(path, "svg")?;
    draw(path).map_err(|e| PipelineError::Plot(format!("{}: {}", path.display(), e)))?;
    log::info!("Plot written to {}", path.display());
    Ok(())
}

/// Check that a plotting range is finite and not empty.
fn check_range(name: &str, (min, max): (f64, f64)) -> Result<(), PipelineError> {
    if !(min.is_finite() && max.is_finite() && min < max) {
        return Err(PipelineError::InvalidParameter(format!(
            "{} range [{}, {}] is empty",
            name, min, max
        )));
    }
    Ok(())
}

/// Draw a vertical viridis colour bar spanning `[min, max]`.
fn draw_colorbar(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    (min, max): (f64, f64),
    label: &str,
) -> DrawResult {
    let mut bar = ChartBuilder::on(area)
        .margin_top(40)
        .margin_bottom(40)
        .margin_right(10)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..1.0, min..max)?;
    bar.configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(0)
        .y_desc(label)
        .draw()?;

    let step = (max - min) / COLORBAR_STEPS as f64;
    bar.draw_series((0..COLORBAR_STEPS).map(|i| {
        let y0 = min + i as f64 * step;
        let t = (i as f64 + 0.5) / COLORBAR_STEPS as f64;
        Rectangle::new([(0.0, y0), (1.0, y0 + step)], viridis(t).filled())
    }))?;
    Ok(())
}
