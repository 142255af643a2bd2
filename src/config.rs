//! Configuration files of the pipeline.
//!
//! - [`brunel`]: YAML network configuration of the Brunel network
//! - [`multiarea`]: population structure, sizes, synapse and weight arrays of the multi-area network
//! - [`simulation`]: kernel and initial-state settings, persisted next to the spikes
//! - [`metadata`]: run parameters stored in a sidecar next to a Brunel spike file
pub mod brunel;
pub mod metadata;
pub mod multiarea;
pub mod simulation;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::engine::NeuronParameters;
use crate::error::PipelineError;

/// Load a YAML document.
pub fn load_yaml<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, PipelineError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| PipelineError::IOError(format!("cannot open {}: {}", path.display(), e)))?;
    let reader = BufReader::new(file);
    serde_yml::from_reader(reader).map_err(|e| {
        PipelineError::Serialization(format!("cannot parse {}: {}", path.display(), e))
    })
}

/// Save a YAML document.
pub fn save_yaml<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<(), PipelineError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_yml::to_writer(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// Load a flat YAML mapping of neuron parameters, e.g., `{V_th: -50.0, tau_m: 10.0}`.
pub fn load_neuron_parameters<P: AsRef<Path>>(path: P) -> Result<NeuronParameters, PipelineError> {
    load_yaml(path)
}
