//! Poisson surrogate of a spiking network simulator.
//!
//! The surrogate accepts the same declarations as a full engine (nodes, connections, seeds,
//! recorders, initial membrane potentials) and checks them, but every neuron fires as an
//! independent Poisson process at a fixed rate. Connections are only counted.
//!
//! Spike times lie on the time grid of the kernel: a spike drawn at time `t` is emitted at the
//! end of the step containing `t`, and a neuron emits at most one spike per step. Neuron `id`
//! lives on virtual process `id % num_virtual_procs` and draws its spikes from the generator
//! of that process, so the output only depends on the seeds and the number of virtual processes.
use derivative::Derivative;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::engine::{
    ConnectionRule, Declaration, Engine, KernelConfig, Model, NeuronParameters, NodeCollection,
    SpikeEvents, SynapseSpec,
};
use crate::error::PipelineError;

/// Default firing rate of the surrogate neurons, in spikes per second.
pub const DEFAULT_SURROGATE_RATE: f64 = 10.0;

/// Relative tolerance when checking that a duration is a multiple of the resolution.
const STEP_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone)]
enum Node {
    Neuron {
        model: Model,
        v_m: f64,
        recorders: Vec<u64>,
    },
    PoissonGenerator {
        rate: f64,
    },
    SpikeRecorder {
        events: SpikeEvents,
    },
}

#[derive(Debug, PartialEq, Clone, Copy)]
enum Role {
    Neuron,
    PoissonGenerator,
    SpikeRecorder,
}

impl Node {
    fn role(&self) -> Role {
        match self {
            Node::Neuron { .. } => Role::Neuron,
            Node::PoissonGenerator { .. } => Role::PoissonGenerator,
            Node::SpikeRecorder { .. } => Role::SpikeRecorder,
        }
    }
}

/// An engine emitting independent Poisson spike trains.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct SurrogateEngine {
    rate: f64,
    num_processes: usize,
    config: KernelConfig,
    #[derivative(Debug = "ignore")]
    nodes: Vec<Node>,
    num_connections: u64,
    /// Number of elapsed time steps.
    steps: u64,
    grng_seed: u64,
    rng_seeds: Vec<u64>,
    #[derivative(Debug = "ignore")]
    rngs: Vec<ChaCha8Rng>,
    #[derivative(Debug = "ignore")]
    declarations: Vec<Declaration>,
}

impl Default for SurrogateEngine {
    fn default() -> Self {
        let mut engine = SurrogateEngine {
            rate: DEFAULT_SURROGATE_RATE,
            num_processes: 1,
            config: KernelConfig::default(),
            nodes: vec![],
            num_connections: 0,
            steps: 0,
            grng_seed: 0,
            rng_seeds: vec![],
            rngs: vec![],
            declarations: vec![],
        };
        engine.default_seeds();
        engine
    }
}

impl SurrogateEngine {
    /// Create a surrogate whose neurons fire at `rate` spikes per second.
    pub fn new(rate: f64) -> Result<Self, PipelineError> {
        if !(rate.is_finite() && rate >= 0.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "surrogate rate must be non-negative, got {}",
                rate
            )));
        }
        Ok(SurrogateEngine {
            rate,
            ..Default::default()
        })
    }

    /// Emulate a run distributed over `num_processes` processes.
    pub fn with_num_processes(mut self, num_processes: usize) -> Result<Self, PipelineError> {
        if num_processes == 0 {
            return Err(PipelineError::InvalidParameter(
                "at least one process is required".to_string(),
            ));
        }
        self.num_processes = num_processes;
        self.default_seeds();
        Ok(self)
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// The number of connections declared so far.
    pub fn num_connections(&self) -> u64 {
        self.num_connections
    }

    /// The current simulation time in ms.
    pub fn time(&self) -> f64 {
        self.steps as f64 * self.config.resolution
    }

    pub fn grng_seed(&self) -> u64 {
        self.grng_seed
    }

    pub fn rng_seeds(&self) -> &[u64] {
        &self.rng_seeds
    }

    /// The membrane potential of a neuron, `None` if the node is not a neuron.
    pub fn membrane_potential(&self, id: u64) -> Option<f64> {
        match self.node(id) {
            Some(Node::Neuron { v_m, .. }) => Some(*v_m),
            _ => None,
        }
    }

    /// The rate of a Poisson generator, `None` if the node is not a generator.
    pub fn generator_rate(&self, id: u64) -> Option<f64> {
        match self.node(id) {
            Some(Node::PoissonGenerator { rate }) => Some(*rate),
            _ => None,
        }
    }

    /// Every call made since the last reset.
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Write the declarations made since the last reset to a JSON file.
    pub fn save_plan<P: AsRef<Path>>(&self, path: P) -> Result<(), PipelineError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.declarations)?;
        writer.flush()?;
        Ok(())
    }

    fn default_seeds(&mut self) {
        let n_vp = self.num_virtual_procs() as u64;
        self.grng_seed = 0;
        self.rng_seeds = (1..=n_vp).collect();
        self.rngs = self
            .rng_seeds
            .iter()
            .map(|&seed| ChaCha8Rng::seed_from_u64(seed))
            .collect();
    }

    fn node(&self, id: u64) -> Option<&Node> {
        if id == 0 {
            return None;
        }
        self.nodes.get((id - 1) as usize)
    }

    fn node_mut(&mut self, id: u64) -> Option<&mut Node> {
        if id == 0 {
            return None;
        }
        self.nodes.get_mut((id - 1) as usize)
    }

    fn add_nodes(&mut self, nodes: Vec<Node>) -> Result<NodeCollection, PipelineError> {
        let collection = NodeCollection::new(self.nodes.len() as u64 + 1, nodes.len())?;
        self.nodes.extend(nodes);
        Ok(collection)
    }

    /// The common role of the nodes of a collection.
    fn role(&self, collection: &NodeCollection) -> Result<Role, PipelineError> {
        if collection.is_empty() {
            return Err(PipelineError::Engine(
                "cannot connect an empty collection".to_string(),
            ));
        }
        let role = self
            .node(collection.first())
            .map(Node::role)
            .ok_or_else(|| unknown_node(collection.first()))?;
        for id in collection.iter() {
            match self.node(id) {
                Some(node) if node.role() == role => {}
                Some(_) => {
                    return Err(PipelineError::Engine(format!(
                        "nodes {}..={} mix different node types",
                        collection.first(),
                        collection.last()
                    )))
                }
                None => return Err(unknown_node(id)),
            }
        }
        Ok(role)
    }

    /// The number of steps covered by a duration, which must be a multiple of the resolution.
    fn num_steps(&self, duration: f64) -> Result<u64, PipelineError> {
        let resolution = self.config.resolution;
        let steps = (duration / resolution).round_ties_even();
        if !(duration.is_finite() && duration >= 0.0)
            || (steps * resolution - duration).abs() > STEP_TOLERANCE * resolution.max(duration)
        {
            return Err(PipelineError::InvalidParameter(format!(
                "simulation time {} ms is not a non-negative multiple of the resolution {} ms",
                duration, resolution
            )));
        }
        Ok(steps as u64)
    }

    /// The steps, in `(start, start + num_steps]`, at which a neuron fires.
    fn draw_spike_steps(
        exp: &Exp<f64>,
        rng: &mut ChaCha8Rng,
        resolution: f64,
        start: u64,
        num_steps: u64,
    ) -> Vec<u64> {
        let duration = num_steps as f64 * resolution;
        let mut steps = vec![];
        let mut t = 0.0;
        loop {
            t += exp.sample(rng);
            if t > duration {
                break;
            }
            let step = start + ((t / resolution).ceil() as u64).clamp(1, num_steps);
            if steps.last() != Some(&step) {
                steps.push(step);
            }
        }
        steps
    }
}

fn unknown_node(id: u64) -> PipelineError {
    PipelineError::Engine(format!("node {} does not exist", id))
}

impl Engine for SurrogateEngine {
    fn reset(&mut self) {
        self.config = KernelConfig::default();
        self.nodes.clear();
        self.num_connections = 0;
        self.steps = 0;
        self.default_seeds();
        self.declarations.clear();
        self.declarations.push(Declaration::Reset);
    }

    fn configure(&mut self, config: KernelConfig) -> Result<(), PipelineError> {
        if !self.nodes.is_empty() {
            return Err(PipelineError::Engine(
                "the kernel must be configured before any node is created".to_string(),
            ));
        }
        if !(config.resolution.is_finite() && config.resolution > 0.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "resolution must be positive, got {}",
                config.resolution
            )));
        }
        if config.local_num_threads == 0 {
            return Err(PipelineError::InvalidParameter(
                "at least one thread is required".to_string(),
            ));
        }
        self.config = config;
        self.default_seeds();
        self.declarations.push(Declaration::Configure { config });
        Ok(())
    }

    fn num_virtual_procs(&self) -> usize {
        self.config.local_num_threads * self.num_processes
    }

    fn seed(&mut self, grng_seed: u64, rng_seeds: &[u64]) -> Result<(), PipelineError> {
        if rng_seeds.len() != self.num_virtual_procs() {
            return Err(PipelineError::Engine(format!(
                "expected {} seeds, one per virtual process, got {}",
                self.num_virtual_procs(),
                rng_seeds.len()
            )));
        }
        self.grng_seed = grng_seed;
        self.rng_seeds = rng_seeds.to_vec();
        self.rngs = rng_seeds
            .iter()
            .map(|&seed| ChaCha8Rng::seed_from_u64(seed))
            .collect();
        self.declarations.push(Declaration::Seed {
            grng_seed,
            rng_seeds: rng_seeds.to_vec(),
        });
        Ok(())
    }

    fn create_neurons(
        &mut self,
        model: Model,
        n: usize,
        params: &NeuronParameters,
    ) -> Result<NodeCollection, PipelineError> {
        if n == 0 {
            return Err(PipelineError::InvalidParameter(format!(
                "cannot create zero {} neurons",
                model.name()
            )));
        }
        if let Some((name, value)) = params.iter().find(|(_, value)| !value.is_finite()) {
            return Err(PipelineError::InvalidParameter(format!(
                "{} parameter {} is not finite: {}",
                model.name(),
                name,
                value
            )));
        }
        let v_m = params.get("V_m").copied().unwrap_or(0.0);
        let nodes = self.add_nodes(vec![
            Node::Neuron {
                model,
                v_m,
                recorders: vec![],
            };
            n
        ])?;
        self.declarations.push(Declaration::CreateNeurons {
            model,
            nodes,
            params: params.clone(),
        });
        Ok(nodes)
    }

    fn create_poisson_generator(&mut self, rate: f64) -> Result<NodeCollection, PipelineError> {
        if !(rate.is_finite() && rate >= 0.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "Poisson rate must be non-negative, got {}",
                rate
            )));
        }
        let node = self.add_nodes(vec![Node::PoissonGenerator { rate }])?;
        self.declarations
            .push(Declaration::CreatePoissonGenerator { node, rate });
        Ok(node)
    }

    fn create_spike_recorder(&mut self) -> Result<NodeCollection, PipelineError> {
        let node = self.add_nodes(vec![Node::SpikeRecorder {
            events: SpikeEvents::default(),
        }])?;
        self.declarations
            .push(Declaration::CreateSpikeRecorder { node });
        Ok(node)
    }

    fn connect(
        &mut self,
        source: &NodeCollection,
        target: &NodeCollection,
        rule: ConnectionRule,
        synapse: SynapseSpec,
    ) -> Result<(), PipelineError> {
        if !synapse.weight.is_finite() {
            return Err(PipelineError::InvalidParameter(format!(
                "synaptic weight is not finite: {}",
                synapse.weight
            )));
        }
        if let Some(delay) = synapse.delay {
            if !(delay.is_finite() && delay >= self.config.resolution) {
                return Err(PipelineError::InvalidParameter(format!(
                    "delay {} ms is shorter than the resolution {} ms",
                    delay, self.config.resolution
                )));
            }
        }

        match (self.role(source)?, self.role(target)?) {
            (Role::Neuron, Role::Neuron) | (Role::PoissonGenerator, Role::Neuron) => {}
            (Role::Neuron, Role::SpikeRecorder) => {
                if rule != ConnectionRule::AllToAll {
                    return Err(PipelineError::Engine(
                        "recorders can only be connected all to all".to_string(),
                    ));
                }
                for recorder in target.iter() {
                    for id in source.iter() {
                        if let Some(Node::Neuron { recorders, .. }) = self.node_mut(id) {
                            if !recorders.contains(&recorder) {
                                recorders.push(recorder);
                            }
                        }
                    }
                }
            }
            (source_role, target_role) => {
                return Err(PipelineError::Engine(format!(
                    "cannot connect {:?} nodes to {:?} nodes",
                    source_role, target_role
                )))
            }
        }

        self.num_connections += rule.num_connections(source.len(), target.len());
        self.declarations.push(Declaration::Connect {
            source: *source,
            target: *target,
            rule,
            synapse,
        });
        Ok(())
    }

    fn local_neurons(&self, model: Model, vp: usize) -> Vec<u64> {
        let n_vp = self.num_virtual_procs() as u64;
        self.nodes
            .iter()
            .zip(1u64..)
            .filter(|(node, id)| {
                matches!(node, Node::Neuron { model: m, .. } if *m == model) && id % n_vp == vp as u64
            })
            .map(|(_, id)| id)
            .collect()
    }

    fn set_membrane_potentials(&mut self, ids: &[u64], values: &[f64]) -> Result<(), PipelineError> {
        if ids.len() != values.len() {
            return Err(PipelineError::ShapeMismatch(format!(
                "{} neurons but {} membrane potentials",
                ids.len(),
                values.len()
            )));
        }
        for (&id, &value) in ids.iter().zip(values) {
            match self.node_mut(id) {
                Some(Node::Neuron { v_m, .. }) => *v_m = value,
                Some(_) => {
                    return Err(PipelineError::Engine(format!(
                        "node {} has no membrane potential",
                        id
                    )))
                }
                None => return Err(unknown_node(id)),
            }
        }
        self.declarations.push(Declaration::SetMembranePotentials {
            num_neurons: ids.len(),
        });
        Ok(())
    }

    fn simulate(&mut self, duration: f64) -> Result<(), PipelineError> {
        let num_steps = self.num_steps(duration)?;
        let resolution = self.config.resolution;
        let n_vp = self.num_virtual_procs();
        let start = self.steps;

        if self.rate > 0.0 && num_steps > 0 {
            let exp = Exp::new(self.rate / 1e3).map_err(|e| {
                PipelineError::InvalidParameter(format!("invalid surrogate rate: {}", e))
            })?;

            let mut batches: Vec<Vec<(f64, u64)>> = vec![vec![]; self.nodes.len()];
            for vp in 0..n_vp {
                let rng = &mut self.rngs[vp];
                for (node, id) in self.nodes.iter().zip(1u64..) {
                    if id % n_vp as u64 != vp as u64 {
                        continue;
                    }
                    if let Node::Neuron { recorders, .. } = node {
                        let steps =
                            Self::draw_spike_steps(&exp, rng, resolution, start, num_steps);
                        for &recorder in recorders {
                            batches[(recorder - 1) as usize].extend(
                                steps.iter().map(|&step| (step as f64 * resolution, id)),
                            );
                        }
                    }
                }
            }

            for (node, mut batch) in self.nodes.iter_mut().zip(batches) {
                if let Node::SpikeRecorder { events } = node {
                    batch.sort_by(|(t1, id1), (t2, id2)| t1.total_cmp(t2).then(id1.cmp(id2)));
                    for (time, sender) in batch {
                        events.senders.push(sender);
                        events.times.push(time);
                    }
                }
            }
        }

        self.steps += num_steps;
        if self.config.print_time {
            log::info!("Simulated {} ms, now at {} ms", duration, self.time());
        }
        self.declarations.push(Declaration::Simulate { duration });
        Ok(())
    }

    fn events(&self, recorder: &NodeCollection) -> Result<SpikeEvents, PipelineError> {
        if recorder.len() != 1 {
            return Err(PipelineError::Engine(format!(
                "expected a single recorder, got {} nodes",
                recorder.len()
            )));
        }
        match self.node(recorder.first()) {
            Some(Node::SpikeRecorder { events }) => Ok(events.clone()),
            Some(_) => Err(PipelineError::Engine(format!(
                "node {} is not a spike recorder",
                recorder.first()
            ))),
            None => Err(unknown_node(recorder.first())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorded_engine(rate: f64, num_threads: usize, n: usize) -> (SurrogateEngine, NodeCollection) {
        let mut engine = SurrogateEngine::new(rate).unwrap();
        engine.reset();
        engine
            .configure(KernelConfig {
                resolution: 0.1,
                local_num_threads: num_threads,
                print_time: false,
            })
            .unwrap();
        let neurons = engine
            .create_neurons(Model::IafPscDelta, n, &NeuronParameters::new())
            .unwrap();
        let recorder = engine.create_spike_recorder().unwrap();
        engine
            .connect(&neurons, &recorder, ConnectionRule::AllToAll, SynapseSpec::new(1.0))
            .unwrap();
        (engine, recorder)
    }

    #[test]
    fn test_node_ids() {
        let mut engine = SurrogateEngine::default();
        let neurons = engine
            .create_neurons(Model::IafPscExp, 10, &NeuronParameters::new())
            .unwrap();
        let generator = engine.create_poisson_generator(100.0).unwrap();
        let recorder = engine.create_spike_recorder().unwrap();
        assert_eq!((neurons.first(), neurons.last()), (1, 10));
        assert_eq!(generator.first(), 11);
        assert_eq!(recorder.first(), 12);
        assert_eq!(engine.num_nodes(), 12);
        assert_eq!(engine.generator_rate(11), Some(100.0));
        assert_eq!(engine.generator_rate(12), None);
    }

    #[test]
    fn test_configure_after_creation() {
        let mut engine = SurrogateEngine::default();
        engine
            .create_neurons(Model::IafPscExp, 1, &NeuronParameters::new())
            .unwrap();
        assert!(matches!(
            engine.configure(KernelConfig::default()),
            Err(PipelineError::Engine(_))
        ));
        engine.reset();
        assert!(engine.configure(KernelConfig::default()).is_ok());
    }

    #[test]
    fn test_virtual_processes() {
        let mut engine = SurrogateEngine::default().with_num_processes(2).unwrap();
        engine
            .configure(KernelConfig {
                local_num_threads: 3,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(engine.num_virtual_procs(), 6);
        assert!(engine.seed(10, &[1, 2, 3]).is_err());
        engine.seed(10, &[11, 12, 13, 14, 15, 16]).unwrap();
        assert_eq!(engine.grng_seed(), 10);
        assert_eq!(engine.rng_seeds(), &[11, 12, 13, 14, 15, 16]);

        engine
            .create_neurons(Model::IafPscExp, 14, &NeuronParameters::new())
            .unwrap();
        engine.create_spike_recorder().unwrap();
        assert_eq!(engine.local_neurons(Model::IafPscExp, 0), vec![6, 12]);
        assert_eq!(engine.local_neurons(Model::IafPscExp, 2), vec![2, 8, 14]);
        assert!(engine.local_neurons(Model::IafPscDelta, 2).is_empty());
    }

    #[test]
    fn test_connect_rules() {
        let mut engine = SurrogateEngine::default();
        let e = engine
            .create_neurons(Model::IafPscDelta, 8, &NeuronParameters::new())
            .unwrap();
        let i = engine
            .create_neurons(Model::IafPscDelta, 2, &NeuronParameters::new())
            .unwrap();
        let generator = engine.create_poisson_generator(10.0).unwrap();
        let recorder = engine.create_spike_recorder().unwrap();

        let synapse = SynapseSpec::new(0.1).with_delay(1.5);
        engine
            .connect(&e, &i, ConnectionRule::FixedIndegree { indegree: 3 }, synapse)
            .unwrap();
        engine
            .connect(&i, &e, ConnectionRule::FixedTotalNumber { n: 5 }, synapse)
            .unwrap();
        engine
            .connect(&generator, &e, ConnectionRule::AllToAll, synapse)
            .unwrap();
        assert_eq!(engine.num_connections(), 6 + 5 + 8);

        // recorders only accept neurons, all to all
        assert!(engine
            .connect(&generator, &recorder, ConnectionRule::AllToAll, synapse)
            .is_err());
        assert!(engine
            .connect(&e, &recorder, ConnectionRule::FixedTotalNumber { n: 1 }, synapse)
            .is_err());
        assert!(engine
            .connect(&e, &generator, ConnectionRule::AllToAll, synapse)
            .is_err());

        // delays shorter than the resolution
        assert!(matches!(
            engine.connect(&e, &i, ConnectionRule::AllToAll, SynapseSpec::new(0.1).with_delay(0.01)),
            Err(PipelineError::InvalidParameter(_))
        ));
        // ids beyond the last node
        let ghost = NodeCollection::new(20, 2).unwrap();
        assert!(engine
            .connect(&ghost, &e, ConnectionRule::AllToAll, synapse)
            .is_err());
        // collection spanning two node types
        let mixed = NodeCollection::new(8, 4).unwrap();
        assert!(engine
            .connect(&mixed, &e, ConnectionRule::AllToAll, synapse)
            .is_err());
    }

    #[test]
    fn test_membrane_potentials() {
        let mut engine = SurrogateEngine::default();
        let params = NeuronParameters::from([("V_m".to_string(), -65.0)]);
        let neurons = engine.create_neurons(Model::IafPscExp, 3, &params).unwrap();
        let recorder = engine.create_spike_recorder().unwrap();
        assert_eq!(engine.membrane_potential(2), Some(-65.0));

        engine
            .set_membrane_potentials(&[1, 3], &[-50.0, -70.0])
            .unwrap();
        assert_eq!(engine.membrane_potential(1), Some(-50.0));
        assert_eq!(engine.membrane_potential(2), Some(-65.0));
        assert_eq!(engine.membrane_potential(3), Some(-70.0));
        assert_eq!(engine.membrane_potential(recorder.first()), None);

        assert!(matches!(
            engine.set_membrane_potentials(&[1, 2], &[0.0]),
            Err(PipelineError::ShapeMismatch(_))
        ));
        assert!(engine
            .set_membrane_potentials(&[recorder.first()], &[0.0])
            .is_err());
        assert_eq!(neurons.len(), 3);
    }

    #[test]
    fn test_spikes_on_grid() {
        let (mut engine, recorder) = recorded_engine(200.0, 2, 20);
        engine.simulate(100.0).unwrap();
        let events = engine.events(&recorder).unwrap();

        assert!(!events.is_empty());
        for (&sender, &time) in events.senders.iter().zip(&events.times) {
            assert!((1..=20).contains(&sender));
            assert!(time > 0.0 && time <= 100.0 + 1e-9);
            let steps = time / 0.1;
            assert!((steps - steps.round()).abs() < 1e-6);
        }
        // sorted by time then sender
        let pairs: Vec<(f64, u64)> = events.times.iter().copied().zip(events.senders.iter().copied()).collect();
        assert!(pairs
            .windows(2)
            .all(|w| w[0].0 < w[1].0 || (w[0].0 == w[1].0 && w[0].1 < w[1].1)));
    }

    #[test]
    fn test_rate() {
        let (mut engine, recorder) = recorded_engine(50.0, 1, 100);
        engine.simulate(2000.0).unwrap();
        let events = engine.events(&recorder).unwrap();
        // 100 neurons at 50 Hz for 2 s
        let rate = events.len() as f64 / 100.0 / 2.0;
        assert!((rate - 50.0).abs() < 5.0, "rate = {}", rate);
    }

    #[test]
    fn test_determinism() {
        let run = |seed: u64| {
            let (mut engine, recorder) = recorded_engine(20.0, 2, 30);
            engine.seed(seed, &[seed + 1, seed + 2]).unwrap();
            engine.simulate(500.0).unwrap();
            engine.events(&recorder).unwrap()
        };
        assert_eq!(run(4), run(4));
        assert_ne!(run(4), run(5));
    }

    #[test]
    fn test_successive_simulations() {
        let (mut engine, recorder) = recorded_engine(100.0, 1, 10);
        engine.simulate(50.0).unwrap();
        let first = engine.events(&recorder).unwrap().len();
        engine.simulate(50.0).unwrap();
        let events = engine.events(&recorder).unwrap();
        assert!((engine.time() - 100.0).abs() < 1e-9);
        assert!(events.times[first..].iter().all(|&t| t > 50.0 - 1e-9));
        assert!(matches!(
            engine.simulate(0.05),
            Err(PipelineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_silent_surrogate() {
        let (mut engine, recorder) = recorded_engine(0.0, 1, 10);
        engine.simulate(100.0).unwrap();
        assert!(engine.events(&recorder).unwrap().is_empty());
        assert!(SurrogateEngine::new(-1.0).is_err());
    }

    #[test]
    fn test_plan() {
        let (mut engine, _) = recorded_engine(10.0, 1, 5);
        engine.simulate(10.0).unwrap();
        let calls = engine.declarations();
        assert_eq!(calls.len(), 6);
        assert_eq!(calls[0], Declaration::Reset);
        assert_eq!(calls[5], Declaration::Simulate { duration: 10.0 });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        engine.save_plan(&path).unwrap();
        let parsed: Vec<Declaration> =
            serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        assert_eq!(parsed, calls);
    }
}
