//! Error module for the pipeline.
use thiserror::Error;

/// Error types for the library.
#[derive(Debug, PartialEq, Error)]
pub enum PipelineError {
    /// Error for I/O operations, e.g., a missing input file.
    #[error("I/O error: {0}")]
    IOError(String),
    /// Error for invalid parameters, e.g., a non-positive simulation time.
    #[error("Invalid parameters: {0}")]
    InvalidParameter(String),
    /// Error for a parameter required by a builder but absent from the configuration.
    #[error("Missing parameter: {0}")]
    MissingParameter(String),
    /// Error for inconsistent shapes between structure, population, synapse and weight arrays.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
    /// Error for array files that cannot be decoded.
    #[error("Malformed array file: {0}")]
    MalformedArray(String),
    /// Error for neuron ids outside the bounds of their population.
    #[error("Index out of bounds: {0}")]
    OutOfBounds(String),
    /// Error while (de)serializing YAML or JSON documents.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Any failure reported by the simulation engine.
    #[error("Engine error: {0}")]
    Engine(String),
    /// Error while rendering a plot.
    #[error("Plotting error: {0}")]
    Plot(String),
    /// Error for spike files whose name does not encode the run parameters.
    #[error("Cannot extract parameters from file name: {0}")]
    FilenameParameters(String),
}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        PipelineError::IOError(e.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(e: serde_json::Error) -> Self {
        PipelineError::Serialization(e.to_string())
    }
}

impl From<serde_yml::Error> for PipelineError {
    fn from(e: serde_yml::Error) -> Self {
        PipelineError::Serialization(e.to_string())
    }
}
