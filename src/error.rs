//! Error types for the fission simulation.

use thiserror::Error;

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors surfaced by the simulation core.
///
/// Probability draws, timer fires and state transitions never fail; only
/// configuration, addressing and command ordering can.
#[derive(Error, Debug)]
pub enum SimError {
    /// Rejected layout or tuning values. The assembly is left empty.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A rod or coolant command was issued before any fuel assembly exists.
    #[error("No fuel assembly present, ignoring {0}")]
    EmptyAssembly(&'static str),

    /// Flattened fuel-rod index out of range.
    #[error("Index {index} out of bounds for {len} fuel rods")]
    InvalidIndex { index: usize, len: usize },

    /// JSON configuration could not be decoded.
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl SimError {
    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Whether the caller should treat this as a failure rather than a no-op.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::EmptyAssembly(_))
    }
}
