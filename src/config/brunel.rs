//! Configuration of the Brunel network.
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::load_yaml;
use crate::core::scaling::ScaleFactors;
use crate::engine::NeuronParameters;
use crate::error::PipelineError;

fn default_g() -> f64 {
    5.0
}

fn default_nu_ex() -> f64 {
    2.0
}

/// Parameters of a Brunel network with one excitatory and one inhibitory population.
///
/// The YAML keys are the usual symbols of the model (`N_rec`, `NE`, `NI`, `CE`, `CI`, `w`,
/// `g`, `d`, `neuron_params`, `nu_ex`).
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BrunelConfig {
    /// Number of recorded neurons per population.
    #[serde(rename = "N_rec")]
    pub n_rec: usize,
    /// Number of excitatory neurons.
    #[serde(rename = "NE")]
    pub ne: usize,
    /// Number of inhibitory neurons.
    #[serde(rename = "NI")]
    pub ni: usize,
    /// Indegree from excitatory neurons.
    #[serde(rename = "CE")]
    pub ce: usize,
    /// Indegree from inhibitory neurons.
    #[serde(rename = "CI")]
    pub ci: usize,
    /// Excitatory synaptic weight (mV).
    pub w: f64,
    /// Relative inhibitory weight, i.e., `w_I = -g * w`.
    #[serde(default = "default_g")]
    pub g: f64,
    /// Synaptic transmission delay (ms).
    pub d: f64,
    /// Parameters of the `iaf_psc_delta` neurons.
    pub neuron_params: NeuronParameters,
    /// External rate relative to the threshold rate.
    #[serde(default = "default_nu_ex")]
    pub nu_ex: f64,
}

impl BrunelConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        load_yaml(path)
    }

    /// Returns the configuration with `g` and `nu_ex` replaced.
    pub fn with_drive(mut self, g: f64, nu_ex: f64) -> Self {
        self.g = g;
        self.nu_ex = nu_ex;
        self
    }

    /// Returns the configuration with both population sizes scaled; indegrees are kept.
    pub fn scaled(mut self, factors: &ScaleFactors) -> Result<Self, PipelineError> {
        self.ne = factors.scale_neurons(self.ne as f64)? as usize;
        self.ni = factors.scale_neurons(self.ni as f64)? as usize;
        Ok(self)
    }

    fn neuron_param(&self, name: &str) -> Result<f64, PipelineError> {
        self.neuron_params
            .get(name)
            .copied()
            .ok_or_else(|| PipelineError::MissingParameter(format!("neuron_params.{}", name)))
    }

    /// The external rate (in spikes per ms) needed to bring a neuron to threshold, `V_th / (w * tau_m)`.
    pub fn threshold_rate(&self) -> Result<f64, PipelineError> {
        let v_th = self.neuron_param("V_th")?;
        let tau_m = self.neuron_param("tau_m")?;
        let nu_th = v_th / (self.w * tau_m);
        if !nu_th.is_finite() {
            return Err(PipelineError::InvalidParameter(format!(
                "threshold rate V_th / (w * tau_m) = {} / ({} * {}) is not finite",
                v_th, self.w, tau_m
            )));
        }
        Ok(nu_th)
    }

    /// The rate (in spikes per s) of the external Poisson generator.
    pub fn external_rate(&self) -> Result<f64, PipelineError> {
        Ok(1e3 * self.nu_ex * self.threshold_rate()?)
    }

    /// Check that the recorded neurons exist and the delay is non-negative.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.ne == 0 || self.ni == 0 {
            return Err(PipelineError::InvalidParameter(format!(
                "both populations must be non-empty, got NE = {} and NI = {}",
                self.ne, self.ni
            )));
        }
        if self.n_rec > self.ne.min(self.ni) {
            return Err(PipelineError::InvalidParameter(format!(
                "cannot record {} neurons from populations of {} and {} neurons",
                self.n_rec, self.ne, self.ni
            )));
        }
        if !(self.d.is_finite() && self.d >= 0.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "delay must be non-negative, got {}",
                self.d
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const NETWORK_YAML: &str = "
N_rec: 50
NE: 10000
NI: 2500
CE: 1000
CI: 250
w: 0.1
d: 1.5
neuron_params:
  C_m: 1.0
  tau_m: 20.0
  t_ref: 2.0
  E_L: 0.0
  V_reset: 10.0
  V_m: 0.0
  V_th: 20.0
";

    fn config() -> BrunelConfig {
        serde_yml::from_str(NETWORK_YAML).unwrap()
    }

    #[test]
    fn test_parse_defaults() {
        let config = config();
        assert_eq!(config.ne, 10000);
        assert_eq!(config.ci, 250);
        assert_eq!(config.g, 5.0);
        assert_eq!(config.nu_ex, 2.0);
        assert_eq!(config.neuron_params["V_th"], 20.0);
    }

    #[test]
    fn test_external_rate() {
        let config = config().with_drive(4.0, 3.0);
        assert_relative_eq!(config.threshold_rate().unwrap(), 10.0, epsilon = 1e-12);
        assert_relative_eq!(config.external_rate().unwrap(), 30_000.0, epsilon = 1e-9);

        let mut config = config;
        config.neuron_params.remove("tau_m");
        assert_eq!(
            config.threshold_rate(),
            Err(PipelineError::MissingParameter("neuron_params.tau_m".to_string()))
        );
    }

    #[test]
    fn test_scaled() {
        let factors = ScaleFactors::build(0.5, 1.0).unwrap();
        let config = config().scaled(&factors).unwrap();
        assert_eq!(config.ne, 5000);
        assert_eq!(config.ni, 1250);
        assert_eq!(config.ce, 1000);

        // 1250 * 0.0001 rounds to zero inhibitory neurons
        let factors = ScaleFactors::build(0.0001, 1.0).unwrap();
        let config = config.scaled(&factors).unwrap();
        assert_eq!(config.ni, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate() {
        assert!(config().validate().is_ok());

        let mut config = config();
        config.n_rec = 3000;
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidParameter(_))
        ));
    }
}
