//! File formats shared by the pipeline steps.
//!
//! Input matrices and Brunel spike files use the NumPy [`npy`] format so that existing
//! result corpora stay readable. Spikes of multi-area runs, statistics and metadata are
//! JSON documents (see [`crate::core::spikes`], [`crate::core::statistics`] and
//! [`crate::config::metadata`]).
pub mod npy;

use std::path::Path;

use crate::error::PipelineError;
use npy::{NpyArray, NpyData};

/// Check that an output path has the expected extension (case insensitive).
pub fn ensure_extension<P: AsRef<Path>>(path: P, extension: &str) -> Result<(), PipelineError> {
    let path = path.as_ref();
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case(extension) => Ok(()),
        _ => Err(PipelineError::InvalidParameter(format!(
            "{} must have a .{} extension",
            path.display(),
            extension
        ))),
    }
}

/// Save spikes as a `2 x S` float array whose rows are the sender ids and the spike times.
pub fn save_spike_array<P: AsRef<Path>>(
    path: P,
    ids: &[u64],
    times: &[f64],
) -> Result<(), PipelineError> {
    if ids.len() != times.len() {
        return Err(PipelineError::ShapeMismatch(format!(
            "{} ids but {} times",
            ids.len(),
            times.len()
        )));
    }
    let data = ids
        .iter()
        .map(|&id| id as f64)
        .chain(times.iter().copied())
        .collect();
    NpyArray::build(vec![2, ids.len()], NpyData::Float(data))?.save(path)
}

/// Load spikes saved by [`save_spike_array`], returning the sender ids and the spike times.
pub fn load_spike_array<P: AsRef<Path>>(path: P) -> Result<(Vec<u64>, Vec<f64>), PipelineError> {
    let path = path.as_ref();
    let array = NpyArray::load(path)?;
    let num_spikes = match array.shape() {
        [2, n] => *n,
        shape => {
            return Err(PipelineError::ShapeMismatch(format!(
                "{} holds an array of shape {:?}, expected (2, number of spikes)",
                path.display(),
                shape
            )))
        }
    };
    let mut values = array.to_floats()?;
    let times = values.split_off(num_spikes);
    let ids = values
        .into_iter()
        .map(|id| {
            if id >= 0.0 && id.fract() == 0.0 {
                Ok(id as u64)
            } else {
                Err(PipelineError::MalformedArray(format!(
                    "{} holds the invalid neuron id {}",
                    path.display(),
                    id
                )))
            }
        })
        .collect::<Result<Vec<u64>, _>>()?;
    Ok((ids, times))
}
