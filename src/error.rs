//! Particle subsystem error handling
//!
//! The simulation and packing hot paths never fail; these errors cover the
//! administrative surface (configuration, registration, thread lifecycle).

use std::path::PathBuf;

/// Type alias for particle subsystem results
pub type ParticleResult<T> = Result<T, ParticleError>;

#[derive(Debug, thiserror::Error)]
pub enum ParticleError {
    #[error("Failed to read particle config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse particle config: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("Invalid particle config: {0}")]
    InvalidConfig(String),
    #[error("Particle kind '{0}' is already registered")]
    DuplicateKind(&'static str),
    #[error("Particle simulation is already running")]
    AlreadyRunning,
    #[error("Failed to spawn particle simulation thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),
    #[error("Particle simulation thread panicked")]
    SimulationPanicked,
}

/// Create an invalid config error
pub fn invalid_config(reason: impl std::fmt::Display) -> ParticleError {
    ParticleError::InvalidConfig(reason.to_string())
}
