//! Brunel network of `iaf_psc_delta` neurons.
use crate::config::brunel::BrunelConfig;
use crate::engine::{ConnectionRule, Engine, Model, NodeCollection, SynapseSpec};
use crate::error::PipelineError;

/// The nodes of a Brunel network.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct BrunelNodes {
    pub generator: NodeCollection,
    pub excitatory: NodeCollection,
    pub inhibitory: NodeCollection,
    /// Records the first `N_rec` excitatory neurons.
    pub recorder_e: NodeCollection,
    /// Records the first `N_rec` inhibitory neurons.
    pub recorder_i: NodeCollection,
}

/// Declare a Brunel network on the engine.
///
/// Both populations receive `CE` excitatory inputs of weight `w` and `CI` inhibitory inputs of
/// weight `-g * w`, all with delay `d`, as well as the output of one Poisson generator firing at
/// `1000 * nu_ex * V_th / (w * tau_m)` spikes per second.
pub fn build_brunel<E: Engine + ?Sized>(
    engine: &mut E,
    config: &BrunelConfig,
) -> Result<BrunelNodes, PipelineError> {
    config.validate()?;
    let rate = config.external_rate()?;

    let excitatory = engine.create_neurons(Model::IafPscDelta, config.ne, &config.neuron_params)?;
    let inhibitory = engine.create_neurons(Model::IafPscDelta, config.ni, &config.neuron_params)?;
    let generator = engine.create_poisson_generator(rate)?;
    let recorder_e = engine.create_spike_recorder()?;
    let recorder_i = engine.create_spike_recorder()?;

    let syn_exc = SynapseSpec::new(config.w).with_delay(config.d);
    let conn_exc = ConnectionRule::FixedIndegree {
        indegree: config.ce as u64,
    };
    engine.connect(&excitatory, &excitatory, conn_exc, syn_exc)?;
    engine.connect(&excitatory, &inhibitory, conn_exc, syn_exc)?;

    let syn_inh = SynapseSpec::new(-config.g * config.w).with_delay(config.d);
    let conn_inh = ConnectionRule::FixedIndegree {
        indegree: config.ci as u64,
    };
    engine.connect(&inhibitory, &excitatory, conn_inh, syn_inh)?;
    engine.connect(&inhibitory, &inhibitory, conn_inh, syn_inh)?;

    engine.connect(&generator, &inhibitory, ConnectionRule::AllToAll, syn_exc)?;
    engine.connect(&generator, &excitatory, ConnectionRule::AllToAll, syn_exc)?;

    if config.n_rec > 0 {
        let recorded_e = excitatory.take(config.n_rec)?;
        let recorded_i = inhibitory.take(config.n_rec)?;
        engine.connect(&recorded_e, &recorder_e, ConnectionRule::AllToAll, SynapseSpec::new(1.0))?;
        engine.connect(&recorded_i, &recorder_i, ConnectionRule::AllToAll, SynapseSpec::new(1.0))?;
    }

    log::debug!(
        "Brunel network: {} excitatory, {} inhibitory neurons, external rate {} Hz",
        excitatory.len(),
        inhibitory.len(),
        rate
    );

    Ok(BrunelNodes {
        generator,
        excitatory,
        inhibitory,
        recorder_e,
        recorder_i,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::surrogate::SurrogateEngine;
    use crate::engine::{Declaration, NeuronParameters};

    fn config() -> BrunelConfig {
        BrunelConfig {
            n_rec: 5,
            ne: 40,
            ni: 10,
            ce: 4,
            ci: 1,
            w: 0.1,
            g: 5.0,
            d: 1.5,
            neuron_params: NeuronParameters::from([
                ("V_th".to_string(), 20.0),
                ("tau_m".to_string(), 20.0),
                ("V_m".to_string(), 0.0),
            ]),
            nu_ex: 2.0,
        }
    }

    #[test]
    fn test_build_brunel() {
        let mut engine = SurrogateEngine::default();
        let nodes = build_brunel(&mut engine, &config()).unwrap();

        assert_eq!((nodes.excitatory.first(), nodes.excitatory.last()), (1, 40));
        assert_eq!((nodes.inhibitory.first(), nodes.inhibitory.last()), (41, 50));
        assert_eq!(nodes.generator.first(), 51);
        assert_eq!(nodes.recorder_e.first(), 52);
        assert_eq!(nodes.recorder_i.first(), 53);

        // nu_th = 20 / (0.1 * 20) = 10 spikes per ms
        assert_eq!(engine.generator_rate(51), Some(20_000.0));
        // E->E, E->I, I->E, I->I, generator, recorders
        assert_eq!(
            engine.num_connections(),
            4 * 40 + 4 * 10 + 40 + 10 + 10 + 40 + 5 + 5
        );

        let inhibitory_weights: Vec<f64> = engine
            .declarations()
            .iter()
            .filter_map(|declaration| match declaration {
                Declaration::Connect {
                    source, synapse, ..
                } if *source == nodes.inhibitory => Some(synapse.weight),
                _ => None,
            })
            .collect();
        assert_eq!(inhibitory_weights.len(), 2);
        assert!(inhibitory_weights.iter().all(|&w| (w + 0.5).abs() < 1e-12));
    }

    #[test]
    fn test_missing_parameter() {
        let mut config = config();
        config.neuron_params.remove("V_th");
        let mut engine = SurrogateEngine::default();
        assert_eq!(
            build_brunel(&mut engine, &config),
            Err(PipelineError::MissingParameter("neuron_params.V_th".to_string()))
        );
        assert_eq!(engine.num_nodes(), 0);
    }

    #[test]
    fn test_too_many_recorded_neurons() {
        let mut config = config();
        config.n_rec = 11;
        let mut engine = SurrogateEngine::default();
        assert!(matches!(
            build_brunel(&mut engine, &config),
            Err(PipelineError::InvalidParameter(_))
        ));
    }
}
