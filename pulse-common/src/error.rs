//! Common error types for NeuroPulse

use thiserror::Error;

/// Common result type for NeuroPulse operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across NeuroPulse crates
///
/// The fusion core itself never returns these: fusion, weighting and stress
/// scoring are total. Errors only arise while loading or validating
/// configuration.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
