//! Inputs of the multi-area network.
//!
//! A network with `P` populations is described by four arrays:
//! - the population names (`P` strings),
//! - the population sizes (`P` numbers),
//! - the synapse counts (`P x (P + 1)`, entry `[i, j]` counts synapses from population `j`
//!   onto population `i`, the last column counts external synapses),
//! - the mean weights, with the same layout as the synapse counts.
use nalgebra::{DMatrix, DVector};
use std::path::Path;

use crate::core::scaling::{round_to_count, ScaleFactors};
use crate::error::PipelineError;
use crate::io::npy::NpyArray;

/// The unscaled arrays, as read from disk.
#[derive(Debug, PartialEq, Clone)]
pub struct MultiAreaInputs {
    pub structure: Vec<String>,
    pub neurons: DVector<f64>,
    pub synapses: DMatrix<f64>,
    pub weights: DMatrix<f64>,
}

impl MultiAreaInputs {
    /// Read the four `.npy` arrays.
    pub fn load<P: AsRef<Path>>(
        structure_file: P,
        neuron_file: P,
        synapse_file: P,
        weight_file: P,
    ) -> Result<Self, PipelineError> {
        let structure = NpyArray::load(structure_file)?.to_strings()?;
        let neurons = NpyArray::load(neuron_file)?.to_vector()?;
        let synapses = NpyArray::load(synapse_file)?.to_matrix()?;
        let weights = NpyArray::load(weight_file)?.to_matrix()?;
        Ok(MultiAreaInputs {
            structure,
            neurons,
            synapses,
            weights,
        })
    }

    /// Scale sizes, synapse counts and weights, then check that the arrays fit together.
    pub fn scaled(&self, factors: &ScaleFactors) -> Result<MultiAreaNetwork, PipelineError> {
        MultiAreaNetwork::build(
            self.structure.clone(),
            factors.scale_population_sizes(&self.neurons)?,
            factors.scale_synapses(&self.synapses)?,
            factors.scale_weights(&self.weights),
        )
    }
}

/// A scaled multi-area network whose arrays have consistent shapes.
#[derive(Debug, PartialEq, Clone)]
pub struct MultiAreaNetwork {
    structure: Vec<String>,
    sizes: DVector<u64>,
    synapses: DMatrix<u64>,
    weights: DMatrix<f64>,
}

impl MultiAreaNetwork {
    /// Create a network from scaled arrays.
    /// The function returns an error if the shapes disagree or a population is empty.
    pub fn build(
        structure: Vec<String>,
        sizes: DVector<u64>,
        synapses: DMatrix<u64>,
        weights: DMatrix<f64>,
    ) -> Result<Self, PipelineError> {
        let num_populations = structure.len();
        let checks = [
            ("population sizes", sizes.len()),
            ("synapse rows", synapses.nrows()),
            ("synapse columns - 1", synapses.ncols().saturating_sub(1)),
            ("weight rows", weights.nrows()),
            ("weight columns - 1", weights.ncols().saturating_sub(1)),
        ];
        for (name, value) in checks {
            if value != num_populations {
                return Err(PipelineError::ShapeMismatch(format!(
                    "{} populations in the structure but {} = {}",
                    num_populations, name, value
                )));
            }
        }
        if synapses.ncols() == 0 || weights.ncols() == 0 {
            return Err(PipelineError::ShapeMismatch(
                "synapse and weight arrays need an external column".to_string(),
            ));
        }

        if let Some(i) = sizes.iter().position(|&size| size == 0) {
            return Err(PipelineError::InvalidParameter(format!(
                "population {} has no neurons after scaling",
                structure[i]
            )));
        }

        Ok(MultiAreaNetwork {
            structure,
            sizes,
            synapses,
            weights,
        })
    }

    pub fn num_populations(&self) -> usize {
        self.structure.len()
    }

    pub fn structure(&self) -> &[String] {
        &self.structure
    }

    pub fn population_size(&self, i: usize) -> u64 {
        self.sizes[i]
    }

    /// Number of synapses from population `j` onto population `i`.
    pub fn recurrent_synapses(&self, i: usize, j: usize) -> u64 {
        self.synapses[(i, j)]
    }

    pub fn recurrent_weight(&self, i: usize, j: usize) -> f64 {
        self.weights[(i, j)]
    }

    pub fn external_weight(&self, i: usize) -> f64 {
        self.weights[(i, self.num_populations())]
    }

    /// Number of external synapses per neuron of population `i`, rounded half to even.
    pub fn external_indegree(&self, i: usize) -> Result<u64, PipelineError> {
        let external = self.synapses[(i, self.num_populations())] as f64;
        round_to_count(external / self.sizes[i] as f64)
    }

    /// The recurrent part of the synapse counts, `P x P`.
    pub fn recurrent_synapse_matrix(&self) -> DMatrix<u64> {
        self.synapses.columns(0, self.num_populations()).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn inputs() -> MultiAreaInputs {
        MultiAreaInputs {
            structure: vec!["V1_L23E".to_string(), "V1_L23I".to_string()],
            neurons: DVector::from_vec(vec![20_000.0, 5_000.0]),
            synapses: DMatrix::from_row_slice(
                2,
                3,
                &[4e7, 1e7, 4e7, 1e7, 2.5e6, 1.05e7],
            ),
            weights: DMatrix::from_row_slice(2, 3, &[0.1, -0.4, 0.1, 0.1, -0.4, 0.1]),
        }
    }

    #[test]
    fn test_scaled() {
        let factors = ScaleFactors::build(0.01, 0.1).unwrap();
        let network = inputs().scaled(&factors).unwrap();

        assert_eq!(network.num_populations(), 2);
        assert_eq!(network.population_size(0), 200);
        assert_eq!(network.population_size(1), 50);
        assert_eq!(network.recurrent_synapses(0, 1), 10_000);
        assert_eq!(network.recurrent_synapses(1, 1), 2_500);
        assert_relative_eq!(network.recurrent_weight(0, 1), -4.0, epsilon = 1e-12);
        assert_relative_eq!(network.external_weight(1), 1.0, epsilon = 1e-12);

        // 40_000 external synapses onto 200 neurons and 10_500 onto 50 neurons
        assert_eq!(network.external_indegree(0), Ok(200));
        assert_eq!(network.external_indegree(1), Ok(210));

        assert_eq!(
            network.recurrent_synapse_matrix(),
            DMatrix::from_row_slice(2, 2, &[40_000, 10_000, 10_000, 2_500])
        );
    }

    #[test]
    fn test_identity_scaling() {
        let inputs = inputs();
        let network = inputs.scaled(&ScaleFactors::identity()).unwrap();
        assert_eq!(network.population_size(0), 20_000);
        assert_eq!(network.recurrent_synapses(0, 0), 40_000_000);
        assert_eq!(network.external_weight(0), 0.1);
    }

    #[test]
    fn test_shape_mismatch() {
        let mut inputs = inputs();
        inputs.weights = DMatrix::from_row_slice(2, 2, &[0.1, -0.4, 0.1, -0.4]);
        assert!(matches!(
            inputs.scaled(&ScaleFactors::identity()),
            Err(PipelineError::ShapeMismatch(_))
        ));

        let mut inputs = self::inputs();
        inputs.structure.push("V2_L23E".to_string());
        assert!(matches!(
            inputs.scaled(&ScaleFactors::identity()),
            Err(PipelineError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_empty_population() {
        let factors = ScaleFactors::build(1e-5, 1.0).unwrap();
        assert!(matches!(
            inputs().scaled(&factors),
            Err(PipelineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_load() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = inputs();
        NpyArray::from_strings(inputs.structure.clone())
            .save(dir.path().join("structure.npy"))
            .unwrap();
        NpyArray::from_floats(inputs.neurons.as_slice().to_vec())
            .save(dir.path().join("neurons.npy"))
            .unwrap();
        NpyArray::from_matrix(&inputs.synapses)
            .save(dir.path().join("synapses.npy"))
            .unwrap();
        NpyArray::from_matrix(&inputs.weights)
            .save(dir.path().join("weights.npy"))
            .unwrap();

        let loaded = MultiAreaInputs::load(
            dir.path().join("structure.npy"),
            dir.path().join("neurons.npy"),
            dir.path().join("synapses.npy"),
            dir.path().join("weights.npy"),
        )
        .unwrap();
        assert_eq!(loaded, inputs);
    }
}
