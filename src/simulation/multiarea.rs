//! Driver of the multi-area network.
use rand_distr::{Distribution, Normal};

use crate::config::multiarea::MultiAreaNetwork;
use crate::config::simulation::SimulationConfig;
use crate::core::spikes::PopulationSpikes;
use crate::engine::{Engine, Model, NeuronParameters};
use crate::error::PipelineError;
use crate::network::multiarea::build_multiarea;
use crate::simulation::prepare_kernel;

/// Build a multi-area network, draw the initial membrane potentials and simulate it.
///
/// The potentials of the neurons living on virtual process `vp` are drawn, in increasing id order,
/// from `Normal(V0_mean, V0_std)` with the host generator of `vp`. Returns the spikes of every
/// population in structure order, bounded by the ids of the population.
pub fn simulate_multiarea<E: Engine + ?Sized>(
    engine: &mut E,
    network: &MultiAreaNetwork,
    neuron_parameters: &NeuronParameters,
    nu_ext: f64,
    simulation: &SimulationConfig,
) -> Result<Vec<PopulationSpikes>, PipelineError> {
    let (plan, mut rngs) = prepare_kernel(engine, simulation, false)?;
    let populations = build_multiarea(engine, network, neuron_parameters, nu_ext)?;

    let normal = Normal::new(simulation.v0_mean, simulation.v0_std).map_err(|e| {
        PipelineError::InvalidParameter(format!("invalid initial potential distribution: {}", e))
    })?;
    for (vp, rng) in rngs.iter_mut().enumerate().take(plan.num_virtual_procs()) {
        let local_nodes = engine.local_neurons(Model::IafPscExp, vp);
        let potentials: Vec<f64> = normal.sample_iter(&mut *rng).take(local_nodes.len()).collect();
        engine.set_membrane_potentials(&local_nodes, &potentials)?;
        log::info!("Number of local nodes on virtual process {}: {}", vp, local_nodes.len());
    }

    log::info!("Simulating the multi-area network for {} ms", simulation.simtime);
    engine.simulate(simulation.simtime)?;

    populations
        .iter()
        .map(|population| {
            let events = engine.events(&population.recorder)?;
            log::debug!("Population {}: {} spikes", population.name, events.len());
            events.into_population(population.name.as_str(), &population.neurons)
        })
        .collect()
}
