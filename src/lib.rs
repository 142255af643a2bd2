//! This crate configures, runs and post-processes simulations of spiking neural networks:
//! a two-population Brunel network and a multi-area cortical network.
//!
//! Simulations are delegated to an [`engine::Engine`]. The pipeline only declares nodes and
//! connections, seeds the engine from a master seed, and harvests the recorded spikes, which
//! are then reduced to firing rates and coefficients of variation and plotted.
//!
//! # Scaling a Network
//!
//! ```rust
//! use nalgebra::{DMatrix, DVector};
//! use snn_pipeline::config::multiarea::MultiAreaInputs;
//! use snn_pipeline::core::scaling::ScaleFactors;
//!
//! let inputs = MultiAreaInputs {
//!     structure: vec!["E".to_string(), "I".to_string()],
//!     neurons: DVector::from_vec(vec![8000.0, 2000.0]),
//!     synapses: DMatrix::from_row_slice(2, 3, &[6.4e6, 4.0e5, 1.6e7, 1.6e6, 1.0e5, 4.0e6]),
//!     weights: DMatrix::from_row_slice(2, 3, &[0.1, -0.5, 0.1, 0.1, -0.5, 0.1]),
//! };
//!
//! // 1% of the neurons and 1% of the indegree
//! let network = inputs.scaled(&ScaleFactors::build(0.01, 0.01).unwrap()).unwrap();
//! assert_eq!(network.population_size(0), 80);
//! assert_eq!(network.recurrent_synapses(0, 0), 640);
//! assert_eq!(network.external_indegree(0).unwrap(), 20);
//! ```
//!
//! # Simulating a Network
//!
//! ```rust
//! use nalgebra::{DMatrix, DVector};
//! use snn_pipeline::config::multiarea::MultiAreaNetwork;
//! use snn_pipeline::config::simulation::SimulationConfig;
//! use snn_pipeline::core::statistics::calculate_statistics;
//! use snn_pipeline::engine::surrogate::SurrogateEngine;
//! use snn_pipeline::engine::NeuronParameters;
//! use snn_pipeline::simulation::multiarea::simulate_multiarea;
//!
//! let network = MultiAreaNetwork::build(
//!     vec!["E".to_string(), "I".to_string()],
//!     DVector::from_vec(vec![80, 20]),
//!     DMatrix::from_row_slice(2, 3, &[640, 40, 1600, 160, 10, 400]),
//!     DMatrix::from_row_slice(2, 3, &[10.0, -50.0, 10.0, 10.0, -50.0, 10.0]),
//! )
//! .unwrap();
//!
//! // The surrogate engine fires every neuron as a Poisson process at 10 Hz
//! let mut engine = SurrogateEngine::default();
//! let simulation = SimulationConfig::default();
//! let spikes = simulate_multiarea(&mut engine, &network, &NeuronParameters::new(), 5.0, &simulation).unwrap();
//!
//! let statistics = calculate_statistics(&spikes, simulation.simtime).unwrap();
//! assert_eq!(statistics.len(), 2);
//! assert_eq!(statistics[0].population, "E");
//! ```
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod io;
pub mod network;
pub mod plot;
pub mod simulation;
