//! Multi-area network of `iaf_psc_exp` neurons.
use crate::config::multiarea::MultiAreaNetwork;
use crate::engine::{ConnectionRule, Engine, Model, NeuronParameters, NodeCollection, SynapseSpec};
use crate::error::PipelineError;

/// The nodes of one population of a multi-area network.
#[derive(Debug, PartialEq, Clone)]
pub struct PopulationNodes {
    pub name: String,
    pub generator: NodeCollection,
    pub neurons: NodeCollection,
    pub recorder: NodeCollection,
}

/// Declare a multi-area network on the engine, returning the nodes of every population in
/// structure order.
///
/// Each population gets its own Poisson generator firing at `K_ext * nu_ext`, where `K_ext`
/// is its external indegree. Recurrent connections from population `j` onto population `i`
/// use the fixed total number rule with `synapses[i, j]` synapses of weight `weights[i, j]`.
pub fn build_multiarea<E: Engine + ?Sized>(
    engine: &mut E,
    network: &MultiAreaNetwork,
    neuron_parameters: &NeuronParameters,
    nu_ext: f64,
) -> Result<Vec<PopulationNodes>, PipelineError> {
    if !(nu_ext.is_finite() && nu_ext >= 0.0) {
        return Err(PipelineError::InvalidParameter(format!(
            "external rate must be non-negative, got {}",
            nu_ext
        )));
    }

    let mut populations = Vec::with_capacity(network.num_populations());
    for (i, name) in network.structure().iter().enumerate() {
        let rate = network.external_indegree(i)? as f64 * nu_ext;
        let generator = engine.create_poisson_generator(rate)?;
        let neurons = engine.create_neurons(
            Model::IafPscExp,
            network.population_size(i) as usize,
            neuron_parameters,
        )?;
        let recorder = engine.create_spike_recorder()?;
        log::debug!(
            "Population {}: neurons {}..={}, external rate {} Hz",
            name,
            neurons.first(),
            neurons.last(),
            rate
        );
        populations.push(PopulationNodes {
            name: name.clone(),
            generator,
            neurons,
            recorder,
        });
    }

    for (i, target) in populations.iter().enumerate() {
        for (j, source) in populations.iter().enumerate() {
            let rule = ConnectionRule::FixedTotalNumber {
                n: network.recurrent_synapses(i, j),
            };
            let synapse = SynapseSpec::new(network.recurrent_weight(i, j));
            engine.connect(&source.neurons, &target.neurons, rule, synapse)?;
        }
    }

    for (i, population) in populations.iter().enumerate() {
        engine.connect(
            &population.generator,
            &population.neurons,
            ConnectionRule::AllToAll,
            SynapseSpec::new(network.external_weight(i)),
        )?;
        engine.connect(
            &population.neurons,
            &population.recorder,
            ConnectionRule::AllToAll,
            SynapseSpec::new(1.0),
        )?;
    }

    Ok(populations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::surrogate::SurrogateEngine;
    use nalgebra::{DMatrix, DVector};

    fn network() -> MultiAreaNetwork {
        MultiAreaNetwork::build(
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            DVector::from_vec(vec![10, 4, 6]),
            DMatrix::from_row_slice(3, 4, &[5, 2, 0, 100, 1, 3, 2, 10, 0, 4, 6, 30]),
            DMatrix::from_row_slice(
                3,
                4,
                &[0.1, -0.2, 0.1, 0.5, 0.1, -0.2, 0.1, 0.5, 0.1, -0.2, 0.1, 0.5],
            ),
        )
        .unwrap()
    }

    #[test]
    fn test_build_multiarea() {
        let mut engine = SurrogateEngine::default();
        let populations =
            build_multiarea(&mut engine, &network(), &NeuronParameters::new(), 5.0).unwrap();

        assert_eq!(populations.len(), 3);
        assert_eq!(populations[0].name, "A");
        assert_eq!(populations[0].generator.first(), 1);
        assert_eq!((populations[0].neurons.first(), populations[0].neurons.last()), (2, 11));
        assert_eq!(populations[0].recorder.first(), 12);
        assert_eq!((populations[1].neurons.first(), populations[1].neurons.last()), (14, 17));
        assert_eq!((populations[2].neurons.first(), populations[2].neurons.last()), (20, 25));

        // every population keeps its scaled size
        for (i, population) in populations.iter().enumerate() {
            let size = population.neurons.last() - population.neurons.first() + 1;
            assert_eq!(size, network().population_size(i));
        }

        // external indegrees: 100 / 10 = 10, 10 / 4 = 2.5 -> 2, 30 / 6 = 5
        assert_eq!(engine.generator_rate(1), Some(50.0));
        assert_eq!(engine.generator_rate(13), Some(10.0));
        assert_eq!(engine.generator_rate(19), Some(25.0));

        let recurrent: u64 = 5 + 2 + 1 + 3 + 2 + 4 + 6;
        assert_eq!(engine.num_connections(), recurrent + 2 * (10 + 4 + 6));
    }

    #[test]
    fn test_negative_external_rate() {
        let mut engine = SurrogateEngine::default();
        assert!(matches!(
            build_multiarea(&mut engine, &network(), &NeuronParameters::new(), -1.0),
            Err(PipelineError::InvalidParameter(_))
        ));
    }
}
