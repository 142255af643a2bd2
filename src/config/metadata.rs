//! Run parameters of a Brunel spike file.
//!
//! Every spike file written by the Brunel driver gets a JSON sidecar named after the full file
//! name, e.g., `spikes.npy.meta.json`.
//! Older result corpora only encode `g` and `nu_ex` in the file name (`spikes_{g}_{nu_ex}.npy`),
//! which is still understood when no sidecar exists.
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// Parameters describing how a Brunel spike file was produced.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub g: f64,
    pub nu_ex: f64,
    #[serde(rename = "N_scale")]
    pub n_scale: f64,
    pub simtime: f64,
    pub dt: f64,
    pub master_seed: u64,
}

impl RunMetadata {
    /// The sidecar path associated with a spike file, `<file name>.meta.json` in the same directory.
    pub fn sidecar_path<P: AsRef<Path>>(spike_file: P) -> PathBuf {
        let mut path = spike_file.as_ref().as_os_str().to_owned();
        path.push(".meta.json");
        PathBuf::from(path)
    }

    /// Write the sidecar of a spike file.
    pub fn save_for<P: AsRef<Path>>(&self, spike_file: P) -> Result<(), PipelineError> {
        let file = File::create(Self::sidecar_path(spike_file))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Read the sidecar of a spike file, if there is one.
    pub fn load_for<P: AsRef<Path>>(spike_file: P) -> Result<Option<Self>, PipelineError> {
        let path = Self::sidecar_path(spike_file);
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(&path)?;
        let reader = BufReader::new(file);
        Ok(Some(serde_json::from_reader(reader)?))
    }
}

/// Extract `(g, nu_ex)` from a legacy file name such as `spikes_5.0_2.0.npy`.
///
/// The stem is split on `_` and the second and third fields are parsed, whatever the prefix.
pub fn parse_legacy_filename<P: AsRef<Path>>(spike_file: P) -> Result<(f64, f64), PipelineError> {
    let path = spike_file.as_ref();
    let error = || PipelineError::FilenameParameters(path.display().to_string());

    let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(error)?;
    let fields: Vec<&str> = stem.split('_').collect();
    match fields[..] {
        [_, g, nu_ex, ..] => {
            let g = g.parse::<f64>().map_err(|_| error())?;
            let nu_ex = nu_ex.parse::<f64>().map_err(|_| error())?;
            Ok((g, nu_ex))
        }
        _ => Err(error()),
    }
}

/// The `(g, nu_ex)` of a spike file: from its sidecar when present, from its name otherwise.
pub fn resolve_drive<P: AsRef<Path>>(spike_file: P) -> Result<(f64, f64), PipelineError> {
    let spike_file = spike_file.as_ref();
    match RunMetadata::load_for(spike_file)? {
        Some(metadata) => Ok((metadata.g, metadata.nu_ex)),
        None => {
            log::warn!(
                "No metadata sidecar for {}, reading parameters from the file name",
                spike_file.display()
            );
            parse_legacy_filename(spike_file)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidecar_path() {
        assert_eq!(
            RunMetadata::sidecar_path("data/spikes_5.0_2.0.npy"),
            PathBuf::from("data/spikes_5.0_2.0.npy.meta.json")
        );
        // names differing after the last dot keep distinct sidecars
        assert_ne!(
            RunMetadata::sidecar_path("out/spikes_5.0_2.0"),
            RunMetadata::sidecar_path("out/spikes_5.0_2.5")
        );
    }

    #[test]
    fn test_parse_legacy_filename() {
        assert_eq!(
            parse_legacy_filename("out/spikes_5.0_2.0.npy"),
            Ok((5.0, 2.0))
        );
        assert_eq!(parse_legacy_filename("run_3_1.5.npy"), Ok((3.0, 1.5)));
        assert_eq!(parse_legacy_filename("spikes_4_0.5_extra.npy"), Ok((4.0, 0.5)));
        assert!(matches!(
            parse_legacy_filename("spikes.npy"),
            Err(PipelineError::FilenameParameters(_))
        ));
        assert!(matches!(
            parse_legacy_filename("spikes_high_low.npy"),
            Err(PipelineError::FilenameParameters(_))
        ));
    }

    #[test]
    fn test_sidecar_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let spike_file = dir.path().join("spikes_5.0_2.0.npy");
        assert_eq!(resolve_drive(&spike_file), Ok((5.0, 2.0)));

        let metadata = RunMetadata {
            g: 6.5,
            nu_ex: 1.25,
            n_scale: 0.5,
            simtime: 500.0,
            dt: 0.1,
            master_seed: 0,
        };
        metadata.save_for(&spike_file).unwrap();
        assert_eq!(RunMetadata::load_for(&spike_file), Ok(Some(metadata)));
        assert_eq!(resolve_drive(&spike_file), Ok((6.5, 1.25)));
    }
}
