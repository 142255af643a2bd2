//! Core module with the numerical building blocks of the pipeline.
//!
//! - [`spikes`]: recorded spikes of a population (ids and times)
//! - [`statistics`]: firing rate and coefficient of variation
//! - [`scaling`]: down-scaling of population sizes, synapse counts and weights
//!
//! # Examples
//!
//! ```
//! use snn_pipeline::core::spikes::PopulationSpikes;
//! use snn_pipeline::core::statistics::calculate_statistics;
//!
//! let spikes = vec![
//!     PopulationSpikes::build("E", 1, 4, vec![1, 2, 1, 1], vec![1.0, 2.0, 3.0, 7.0]).unwrap(),
//!     PopulationSpikes::build("I", 5, 6, vec![], vec![]).unwrap(),
//! ];
//!
//! let stats = calculate_statistics(&spikes, 1000.0).unwrap();
//! assert_eq!(stats[0].rate, 1.0);
//! assert_eq!(stats[1].rate, 0.0);
//! assert_eq!(stats[1].cv, 0.0);
//! ```
pub mod scaling;
pub mod spikes;
pub mod statistics;

/// Minimum number of inter-spike intervals for a neuron to have a CV.
pub const MIN_ISI_COUNT: usize = 2;
