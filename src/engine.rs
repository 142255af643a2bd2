//! Boundary to the simulation engine.
//!
//! The pipeline never integrates neuron dynamics itself. Network builders and drivers talk to
//! an [`Engine`] through declarative calls (create nodes, connect them, seed the random number
//! generators, simulate, read out recorders), mirroring the kernel interface of common
//! spiking network simulators. Node ids are 1-based and every creation call returns a
//! contiguous [`NodeCollection`].
//!
//! The crate ships one implementation, the [`surrogate::SurrogateEngine`], which honours
//! every declaration but emits independent Poisson spike trains.
pub mod seeding;
pub mod surrogate;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::spikes::PopulationSpikes;
use crate::error::PipelineError;

/// Model parameters keyed by name, e.g., `V_th` or `tau_m`.
pub type NeuronParameters = BTreeMap<String, f64>;

/// A contiguous range of node ids, `first..=last`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct NodeCollection {
    first: u64,
    len: usize,
}

impl NodeCollection {
    /// Create a collection of `len` nodes starting at id `first` (ids start at 1).
    pub fn new(first: u64, len: usize) -> Result<Self, PipelineError> {
        if first == 0 {
            return Err(PipelineError::InvalidParameter(
                "node ids start at 1".to_string(),
            ));
        }
        Ok(NodeCollection { first, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The id of the first node.
    pub fn first(&self) -> u64 {
        self.first
    }

    /// The id of the last node, i.e., `first - 1` for an empty collection.
    pub fn last(&self) -> u64 {
        self.first + self.len as u64 - 1
    }

    pub fn contains(&self, id: u64) -> bool {
        id >= self.first && id < self.first + self.len as u64
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> {
        self.first..self.first + self.len as u64
    }

    /// The first `n` nodes of the collection.
    pub fn take(&self, n: usize) -> Result<Self, PipelineError> {
        if n > self.len {
            return Err(PipelineError::InvalidParameter(format!(
                "cannot take {} nodes from a collection of {}",
                n, self.len
            )));
        }
        Ok(NodeCollection {
            first: self.first,
            len: n,
        })
    }
}

/// Neuron models known to the pipeline.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Model {
    /// Leaky integrate-and-fire neuron with delta-shaped post-synaptic currents.
    IafPscDelta,
    /// Leaky integrate-and-fire neuron with exponential post-synaptic currents.
    IafPscExp,
}

impl Model {
    pub fn name(&self) -> &'static str {
        match self {
            Model::IafPscDelta => "iaf_psc_delta",
            Model::IafPscExp => "iaf_psc_exp",
        }
    }
}

/// How sources are drawn when connecting two collections.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ConnectionRule {
    /// Every source onto every target.
    AllToAll,
    /// Each target receives `indegree` connections from randomly drawn sources.
    FixedIndegree { indegree: u64 },
    /// `n` connections between randomly drawn pairs.
    FixedTotalNumber { n: u64 },
}

impl ConnectionRule {
    /// The number of connections created between `num_sources` and `num_targets` nodes.
    pub fn num_connections(&self, num_sources: usize, num_targets: usize) -> u64 {
        match self {
            ConnectionRule::AllToAll => num_sources as u64 * num_targets as u64,
            ConnectionRule::FixedIndegree { indegree } => indegree * num_targets as u64,
            ConnectionRule::FixedTotalNumber { n } => *n,
        }
    }
}

/// A static synapse, the delay defaults to the resolution of the engine.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct SynapseSpec {
    pub weight: f64,
    pub delay: Option<f64>,
}

impl SynapseSpec {
    pub fn new(weight: f64) -> Self {
        SynapseSpec {
            weight,
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Kernel settings applied before any node is created.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Time resolution in ms.
    pub resolution: f64,
    /// Number of threads per process.
    pub local_num_threads: usize,
    /// Whether the engine reports its progress.
    pub print_time: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        KernelConfig {
            resolution: 0.1,
            local_num_threads: 1,
            print_time: false,
        }
    }
}

/// Spikes collected by a recorder, as parallel arrays of senders and times (ms).
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct SpikeEvents {
    pub senders: Vec<u64>,
    pub times: Vec<f64>,
}

impl SpikeEvents {
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    /// Attach the events to the population they were recorded from.
    pub fn into_population(
        self,
        population: impl Into<String>,
        neurons: &NodeCollection,
    ) -> Result<PopulationSpikes, PipelineError> {
        PopulationSpikes::build(
            population,
            neurons.first(),
            neurons.last(),
            self.senders,
            self.times,
        )
    }
}

/// A declarative call made on an engine, in the order it was made.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum Declaration {
    Reset,
    Configure {
        config: KernelConfig,
    },
    Seed {
        grng_seed: u64,
        rng_seeds: Vec<u64>,
    },
    CreateNeurons {
        model: Model,
        nodes: NodeCollection,
        params: NeuronParameters,
    },
    CreatePoissonGenerator {
        node: NodeCollection,
        rate: f64,
    },
    CreateSpikeRecorder {
        node: NodeCollection,
    },
    Connect {
        source: NodeCollection,
        target: NodeCollection,
        rule: ConnectionRule,
        synapse: SynapseSpec,
    },
    SetMembranePotentials {
        num_neurons: usize,
    },
    Simulate {
        duration: f64,
    },
}

/// The kernel interface used by network builders and simulation drivers.
pub trait Engine {
    /// Forget every node, connection and recorded event.
    fn reset(&mut self);

    /// Set the resolution and number of threads. Must be called before any node is created.
    fn configure(&mut self, config: KernelConfig) -> Result<(), PipelineError>;

    /// The total number of virtual processes, i.e., threads times processes.
    fn num_virtual_procs(&self) -> usize;

    /// Seed the global generator and one generator per virtual process.
    fn seed(&mut self, grng_seed: u64, rng_seeds: &[u64]) -> Result<(), PipelineError>;

    /// Create `n` neurons of the given model.
    fn create_neurons(
        &mut self,
        model: Model,
        n: usize,
        params: &NeuronParameters,
    ) -> Result<NodeCollection, PipelineError>;

    /// Create a Poisson generator firing at `rate` spikes per second.
    fn create_poisson_generator(&mut self, rate: f64) -> Result<NodeCollection, PipelineError>;

    /// Create a recorder storing spike times and senders in memory.
    fn create_spike_recorder(&mut self) -> Result<NodeCollection, PipelineError>;

    /// Connect two collections.
    fn connect(
        &mut self,
        source: &NodeCollection,
        target: &NodeCollection,
        rule: ConnectionRule,
        synapse: SynapseSpec,
    ) -> Result<(), PipelineError>;

    /// The ids of the neurons of the given model living on virtual process `vp`, in increasing order.
    fn local_neurons(&self, model: Model, vp: usize) -> Vec<u64>;

    /// Set the membrane potential of the given neurons, one value per neuron.
    fn set_membrane_potentials(&mut self, ids: &[u64], values: &[f64]) -> Result<(), PipelineError>;

    /// Advance the simulation by `duration` ms.
    fn simulate(&mut self, duration: f64) -> Result<(), PipelineError>;

    /// The events collected by a recorder so far.
    fn events(&self, recorder: &NodeCollection) -> Result<SpikeEvents, PipelineError>;
}
