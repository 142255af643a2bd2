//! Driver of the Brunel network.
use crate::config::brunel::BrunelConfig;
use crate::config::simulation::SimulationConfig;
use crate::engine::{Engine, SpikeEvents};
use crate::error::PipelineError;
use crate::network::brunel::build_brunel;
use crate::simulation::prepare_kernel;

/// Spikes of the recorded neurons of both populations.
#[derive(Debug, PartialEq, Clone)]
pub struct BrunelSpikes {
    pub excitatory: SpikeEvents,
    pub inhibitory: SpikeEvents,
}

/// Build a Brunel network and simulate it for `simulation.simtime` ms.
///
/// The initial membrane potentials are the ones given in the neuron parameters.
pub fn simulate_brunel<E: Engine + ?Sized>(
    engine: &mut E,
    config: &BrunelConfig,
    simulation: &SimulationConfig,
) -> Result<BrunelSpikes, PipelineError> {
    prepare_kernel(engine, simulation, true)?;
    let nodes = build_brunel(engine, config)?;

    log::info!("Simulating the Brunel network for {} ms", simulation.simtime);
    engine.simulate(simulation.simtime)?;

    let excitatory = engine.events(&nodes.recorder_e)?;
    let inhibitory = engine.events(&nodes.recorder_i)?;
    log::info!(
        "Recorded {} excitatory and {} inhibitory spikes",
        excitatory.len(),
        inhibitory.len()
    );
    Ok(BrunelSpikes {
        excitatory,
        inhibitory,
    })
}
