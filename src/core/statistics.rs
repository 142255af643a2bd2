//! Firing rate and coefficient of variation of recorded spike trains.
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::core::spikes::PopulationSpikes;
use crate::core::MIN_ISI_COUNT;
use crate::error::PipelineError;

/// Rate and CV of one population.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PopulationStatistics {
    /// The population name.
    pub population: String,
    /// The average firing rate in spikes per second.
    pub rate: f64,
    /// The average coefficient of variation of the inter-spike intervals.
    pub cv: f64,
}

/// Average firing rate (in Hz) of `num_neurons` neurons emitting `num_spikes` spikes in `simtime` ms.
pub fn firing_rate(num_spikes: usize, simtime: f64, num_neurons: usize) -> f64 {
    1e3 * num_spikes as f64 / simtime / num_neurons as f64
}

/// Coefficient of variation of a sequence of (sorted) firing times.
///
/// Returns `None` when fewer than two inter-spike intervals exist or when their mean is not positive.
pub fn coefficient_of_variation(firing_times: &[f64]) -> Option<f64> {
    let isis: Vec<f64> = firing_times
        .iter()
        .tuple_windows()
        .map(|(t1, t2)| t2 - t1)
        .collect();
    if isis.len() < MIN_ISI_COUNT {
        return None;
    }

    let n = isis.len() as f64;
    let mean = isis.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return None;
    }
    let var = isis.iter().map(|isi| (isi - mean).powi(2)).sum::<f64>() / n;
    Some(var.sqrt() / mean)
}

/// Sum of the per-neuron CVs and number of distinct neurons in a collection of spikes.
/// Neurons without a valid CV contribute zero to the sum.
fn cv_sum(ids: &[u64], times: &[f64]) -> (f64, usize) {
    let mut spikes: Vec<(u64, f64)> = ids.iter().copied().zip(times.iter().copied()).collect();
    spikes.sort_by(|(id1, t1), (id2, t2)| id1.cmp(id2).then(t1.total_cmp(t2)));

    let mut sum = 0.0;
    let mut num_neurons = 0;
    for (id, group) in &spikes.iter().chunk_by(|(id, _)| *id) {
        let firing_times: Vec<f64> = group.map(|(_, t)| *t).collect();
        num_neurons += 1;
        match coefficient_of_variation(&firing_times) {
            Some(cv) => sum += cv,
            None if firing_times.len() > MIN_ISI_COUNT => {
                log::warn!(
                    "Neuron {} has {} spikes with non-positive mean ISI, its CV counts as zero",
                    id,
                    firing_times.len()
                );
            }
            None => {}
        }
    }
    (sum, num_neurons)
}

impl PopulationSpikes {
    /// Computes the average firing rate and CV of the population over a simulation of `simtime` ms.
    ///
    /// The CV is averaged over the full population size: neurons with fewer than three spikes
    /// count as zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use approx::assert_relative_eq;
    /// use snn_pipeline::core::spikes::PopulationSpikes;
    ///
    /// let ids = vec![1; 200];
    /// let times = (0..200).map(|i| i as f64 * 2.5).collect();
    /// let spikes = PopulationSpikes::build("E", 1, 10, ids, times).unwrap();
    /// let stats = spikes.statistics(500.0).unwrap();
    ///
    /// assert_relative_eq!(stats.rate, 40.0);
    /// assert_relative_eq!(stats.cv, 0.0);
    /// ```
    pub fn statistics(&self, simtime: f64) -> Result<PopulationStatistics, PipelineError> {
        if !(simtime.is_finite() && simtime > 0.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "simulation time must be positive, got {}",
                simtime
            )));
        }

        let num_neurons = self.size();
        let rate = firing_rate(self.num_spikes(), simtime, num_neurons);
        let (cv_sum, _) = cv_sum(self.ids(), self.times());
        let cv = cv_sum / num_neurons as f64;

        log::debug!(
            "Population {}: {} neurons, {} spikes, rate {:.3} Hz, CV {:.3}",
            self.population(),
            num_neurons,
            self.num_spikes(),
            rate,
            cv
        );

        Ok(PopulationStatistics {
            population: self.population().to_string(),
            rate,
            cv,
        })
    }
}

/// Computes the statistics of every population in parallel, preserving their order.
pub fn calculate_statistics(
    spikes: &[PopulationSpikes],
    simtime: f64,
) -> Result<Vec<PopulationStatistics>, PipelineError> {
    spikes
        .par_iter()
        .map(|population| population.statistics(simtime))
        .collect()
}

/// Average CV over the neurons that emitted at least one spike.
///
/// This is the measure of the phase diagram: the denominator is the number of distinct
/// senders, not a population size. Returns zero when there are no spikes.
pub fn mean_cv_of_active(ids: &[u64], times: &[f64]) -> Result<f64, PipelineError> {
    if ids.len() != times.len() {
        return Err(PipelineError::ShapeMismatch(format!(
            "{} ids but {} times",
            ids.len(),
            times.len()
        )));
    }
    let (sum, num_neurons) = cv_sum(ids, times);
    match num_neurons {
        0 => Ok(0.0),
        n => Ok(sum / n as f64),
    }
}

/// Save statistics to a JSON file.
pub fn save_statistics<P: AsRef<Path>>(
    statistics: &[PopulationStatistics],
    path: P,
) -> Result<(), PipelineError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, statistics)?;
    writer.flush()?;
    Ok(())
}

/// Load statistics from a JSON file.
pub fn load_statistics<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<PopulationStatistics>, PipelineError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}
