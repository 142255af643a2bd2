//! Phase diagram of the Brunel network.
//!
//! Every Brunel run contributes one square marker at `(g, nu_ex)`, coloured by the average CV
//! of its recorded neurons.
use plotters::prelude::*;
use std::path::Path;

use crate::config::metadata::resolve_drive;
use crate::core::statistics::mean_cv_of_active;
use crate::error::PipelineError;
use crate::io::load_spike_array;
use crate::plot::colormap::{normalize, viridis};
use crate::plot::{check_range, draw_colorbar, render, DrawResult, FIGURE_SIZE};

/// The CV of one run, located in the `(g, nu_ex)` plane.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct PhasePoint {
    pub g: f64,
    pub nu_ex: f64,
    pub cv: f64,
}

impl PhasePoint {
    /// Read a Brunel spike file and the parameters of its run.
    pub fn from_spike_file<P: AsRef<Path>>(spike_file: P) -> Result<Self, PipelineError> {
        let spike_file = spike_file.as_ref();
        let (g, nu_ex) = resolve_drive(spike_file)?;
        let (ids, times) = load_spike_array(spike_file)?;
        let cv = mean_cv_of_active(&ids, &times)?;
        log::debug!("{}: g = {}, nu_ex = {}, CV = {}", spike_file.display(), g, nu_ex, cv);
        Ok(PhasePoint { g, nu_ex, cv })
    }
}

/// Axis ranges, colour scale and marker size of the phase diagram.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct PhaseDiagramOptions {
    pub g_range: (f64, f64),
    pub nu_ex_range: (f64, f64),
    /// CVs outside this range get the colour of the closest bound.
    pub cv_range: (f64, f64),
    /// Marker area in square points.
    pub markersize: f64,
}

impl Default for PhaseDiagramOptions {
    fn default() -> Self {
        PhaseDiagramOptions {
            g_range: (1.0, 8.0),
            nu_ex_range: (0.0, 4.0),
            cv_range: (0.0, 1.0),
            markersize: 500.0,
        }
    }
}

/// Plot the phase diagram of a collection of runs.
pub fn phase_diagram_plot<P: AsRef<Path>>(
    path: P,
    points: &[PhasePoint],
    options: &PhaseDiagramOptions,
) -> Result<(), PipelineError> {
    check_range("g", options.g_range)?;
    check_range("nu_ex", options.nu_ex_range)?;
    check_range("CV", options.cv_range)?;
    if !(options.markersize.is_finite() && options.markersize > 0.0) {
        return Err(PipelineError::InvalidParameter(format!(
            "markersize must be positive, got {}",
            options.markersize
        )));
    }
    render(path, |path| draw(path, points, options))
}

fn draw(path: &Path, points: &[PhasePoint], options: &PhaseDiagramOptions) -> DrawResult {
    let root = SVGBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let (plot_area, colorbar_area) = root.split_horizontally(FIGURE_SIZE.0 - 110);

    let (g_min, g_max) = options.g_range;
    let (nu_min, nu_max) = options.nu_ex_range;
    let mut chart = ChartBuilder::on(&plot_area)
        .caption("Coefficient of Variation", ("sans-serif", 20))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(g_min..g_max, nu_min..nu_max)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("g")
        .y_desc("ν_ext / ν_thr")
        .draw()?;

    // the marker side in pixels, taking one point as one pixel
    let half_side = (options.markersize.sqrt() / 2.0).round() as i32;
    let (cv_min, cv_max) = options.cv_range;
    chart.draw_series(points.iter().map(|point| {
        let color = viridis(normalize(point.cv, cv_min, cv_max));
        EmptyElement::at((point.g, point.nu_ex))
            + Rectangle::new([(-half_side, -half_side), (half_side, half_side)], color.filled())
    }))?;

    draw_colorbar(&colorbar_area, options.cv_range, "CV")?;
    root.present()?;
    Ok(())
}
