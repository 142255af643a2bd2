//! Simulation settings shared by the drivers.
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::{load_yaml, save_yaml};
use crate::error::PipelineError;

/// Kernel and initial-state settings of a single run.
///
/// The field names of the YAML document match the command-line options
/// (`simtime`, `dt`, `V0_mean`, `V0_std`, `master_seed`, `num_threads`).
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Simulated time in ms.
    pub simtime: f64,
    /// Time resolution in ms.
    pub dt: f64,
    /// Mean of the initial membrane potentials (mV).
    #[serde(rename = "V0_mean")]
    pub v0_mean: f64,
    /// Standard deviation of the initial membrane potentials (mV).
    #[serde(rename = "V0_std")]
    pub v0_std: f64,
    /// Seed from which every random number generator is derived.
    pub master_seed: u64,
    /// Number of threads per process.
    pub num_threads: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            simtime: 500.0,
            dt: 0.1,
            v0_mean: -58.0,
            v0_std: 10.0,
            master_seed: 0,
            num_threads: 1,
        }
    }
}

impl SimulationConfig {
    /// Check that times are positive, the spread of initial potentials is non-negative and
    /// at least one thread is used.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(self.simtime.is_finite() && self.simtime > 0.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "simtime must be positive, got {}",
                self.simtime
            )));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "dt must be positive, got {}",
                self.dt
            )));
        }
        if !(self.v0_mean.is_finite() && self.v0_std.is_finite() && self.v0_std >= 0.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "invalid initial potential distribution N({}, {})",
                self.v0_mean, self.v0_std
            )));
        }
        if self.num_threads == 0 {
            return Err(PipelineError::InvalidParameter(
                "at least one thread is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let config: SimulationConfig = load_yaml(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), PipelineError> {
        save_yaml(self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(SimulationConfig::default().validate().is_ok());

        let config = SimulationConfig {
            simtime: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SimulationConfig {
            dt: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SimulationConfig {
            v0_std: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SimulationConfig {
            num_threads: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("simconfig.yaml");
        let config = SimulationConfig {
            simtime: 1000.0,
            master_seed: 12,
            num_threads: 4,
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("V0_mean"));
        assert!(text.contains("master_seed: 12"));

        assert_eq!(SimulationConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_legacy_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("simconfig.yaml");
        std::fs::write(
            &path,
            "V0_mean: -58.0\nV0_std: 10.0\ndt: 0.1\nmaster_seed: 0\nnum_threads: 1\nsimtime: 500.0\n",
        )
        .unwrap();
        assert_eq!(
            SimulationConfig::load(&path).unwrap(),
            SimulationConfig::default()
        );
    }
}
