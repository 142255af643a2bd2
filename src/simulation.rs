//! Simulation drivers.
//!
//! A driver runs one network on an engine from a clean state:
//! reset, configure, seed, build, (optionally) randomize the initial membrane potentials,
//! simulate and read out the recorders.
//!
//! # Example
//! ```rust
//! use snn_pipeline::config::simulation::SimulationConfig;
//! use snn_pipeline::engine::surrogate::SurrogateEngine;
//! use snn_pipeline::simulation::prepare_kernel;
//! use snn_pipeline::engine::Engine;
//!
//! let mut engine = SurrogateEngine::default();
//! let simulation = SimulationConfig { num_threads: 2, master_seed: 10, ..Default::default() };
//! let (plan, _rngs) = prepare_kernel(&mut engine, &simulation, false).unwrap();
//!
//! assert_eq!(engine.num_virtual_procs(), 2);
//! assert_eq!(plan.grng_seed(), 12);
//! assert_eq!(engine.rng_seeds(), &[13, 14]);
//! ```
pub mod brunel;
pub mod multiarea;

use rand_chacha::ChaCha8Rng;

use crate::config::simulation::SimulationConfig;
use crate::engine::seeding::SeedPlan;
use crate::engine::{Engine, KernelConfig};
use crate::error::PipelineError;

/// Reset and configure the kernel, then seed every generator from the master seed.
///
/// Returns the seed plan and the host generators, one per virtual process.
pub fn prepare_kernel<E: Engine + ?Sized>(
    engine: &mut E,
    simulation: &SimulationConfig,
    print_time: bool,
) -> Result<(SeedPlan, Vec<ChaCha8Rng>), PipelineError> {
    simulation.validate()?;

    engine.reset();
    engine.configure(KernelConfig {
        resolution: simulation.dt,
        local_num_threads: simulation.num_threads,
        print_time,
    })?;

    let plan = SeedPlan::build(simulation.master_seed, engine.num_virtual_procs())?;
    log::info!("Master seed: {}", plan.master_seed());
    log::info!("Total number of virtual processes: {}", plan.num_virtual_procs());
    plan.apply(engine)?;

    Ok((plan, plan.host_generators()))
}
