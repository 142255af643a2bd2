//! Network builders.
//!
//! A builder turns a validated configuration into declarative calls on an
//! [`Engine`](crate::engine::Engine) and returns the node collections it created.
//! - [`brunel`]: one excitatory and one inhibitory population driven by a shared Poisson generator
//! - [`multiarea`]: one population per entry of the structure, connected by fixed total numbers of synapses
pub mod brunel;
pub mod multiarea;
