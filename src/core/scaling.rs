//! Down-scaling of population sizes, synapse counts and weights.
//!
//! Every count is rounded half to even after multiplication, so that population and
//! connectivity arrays scaled in different places stay consistent.
use nalgebra::{DMatrix, DVector};

use crate::error::PipelineError;

/// Round a non-negative count to the nearest integer, ties to even.
pub fn round_to_count(x: f64) -> Result<u64, PipelineError> {
    let rounded = x.round_ties_even();
    if !rounded.is_finite() || rounded < 0.0 {
        return Err(PipelineError::InvalidParameter(format!(
            "{} cannot be rounded to a non-negative count",
            x
        )));
    }
    Ok(rounded as u64)
}

/// Independent scale factors for the number of neurons and for the indegree.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct ScaleFactors {
    n_scale: f64,
    k_scale: f64,
}

impl ScaleFactors {
    /// Create scale factors, both must be finite and positive.
    pub fn build(n_scale: f64, k_scale: f64) -> Result<Self, PipelineError> {
        for (name, value) in [("N_scale", n_scale), ("K_scale", k_scale)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(PipelineError::InvalidParameter(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        Ok(ScaleFactors { n_scale, k_scale })
    }

    /// Factors leaving every count and weight unchanged.
    pub fn identity() -> Self {
        ScaleFactors {
            n_scale: 1.0,
            k_scale: 1.0,
        }
    }

    pub fn n_scale(&self) -> f64 {
        self.n_scale
    }

    pub fn k_scale(&self) -> f64 {
        self.k_scale
    }

    /// Scale a number of neurons.
    pub fn scale_neurons(&self, num_neurons: f64) -> Result<u64, PipelineError> {
        round_to_count(self.n_scale * num_neurons)
    }

    /// Scale a vector of population sizes.
    pub fn scale_population_sizes(
        &self,
        sizes: &DVector<f64>,
    ) -> Result<DVector<u64>, PipelineError> {
        let scaled = sizes
            .iter()
            .map(|&size| self.scale_neurons(size))
            .collect::<Result<Vec<u64>, _>>()?;
        Ok(DVector::from_vec(scaled))
    }

    /// Scale a matrix of synapse counts.
    /// Both the number of targets and the indegree shrink, so counts are multiplied by `K_scale * N_scale`.
    pub fn scale_synapses(&self, synapses: &DMatrix<f64>) -> Result<DMatrix<u64>, PipelineError> {
        let factor = self.k_scale * self.n_scale;
        let scaled = synapses
            .iter()
            .map(|&count| round_to_count(factor * count))
            .collect::<Result<Vec<u64>, _>>()?;
        Ok(DMatrix::from_vec(synapses.nrows(), synapses.ncols(), scaled))
    }

    /// Scale a matrix of weights, dividing by `K_scale` to preserve the total input.
    pub fn scale_weights(&self, weights: &DMatrix<f64>) -> DMatrix<f64> {
        weights / self.k_scale
    }
}
