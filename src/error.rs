// src/error.rs
use thiserror::Error;

/// Errors raised while building or running a simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SdeError {
    /// A numeric input outside its domain
    #[error("Invalid parameter '{parameter}' = {value}: {constraint}")]
    InvalidParameters {
        parameter: String,
        value: f64,
        constraint: String,
    },

    #[error("Numerical instability in {method}: {reason}")]
    NumericalInstability { method: String, reason: String },

    /// Structural problem with the setup (path count, worker count, files)
    #[error("Invalid configuration for '{field}': {reason}")]
    InvalidConfiguration { field: String, reason: String },

    /// Engine operation attempted in the wrong lifecycle state
    #[error("Cannot {action} while the engine is {state}")]
    InvalidState { action: String, state: String },

    /// Monte Carlo simulation error
    #[error("Monte Carlo simulation error with {paths} paths: {reason}")]
    MonteCarloError { paths: usize, reason: String },

    /// Instrument definition that cannot produce a payoff
    #[error("Invalid {payoff_type} instrument: {reason}")]
    PayoffError { payoff_type: String, reason: String },

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),
}

impl From<toml::de::Error> for SdeError {
    fn from(err: toml::de::Error) -> Self {
        SdeError::ConfigParse(err.to_string())
    }
}

pub type SdeResult<T> = Result<T, SdeError>;

/// Input checks shared by the constructors. All of them reject NaN.
pub mod validation {
    use super::{SdeError, SdeResult};

    /// Upper bound on NSim.
    pub const MAX_PATHS: usize = 1_000_000_000;

    fn reject(name: &str, value: f64, constraint: &str) -> SdeResult<()> {
        Err(SdeError::InvalidParameters {
            parameter: name.to_string(),
            value,
            constraint: constraint.to_string(),
        })
    }

    pub fn validate_positive(name: &str, value: f64) -> SdeResult<()> {
        if value > 0.0 {
            Ok(())
        } else {
            reject(name, value, "must be positive (> 0)")
        }
    }

    pub fn validate_non_negative(name: &str, value: f64) -> SdeResult<()> {
        if value >= 0.0 {
            Ok(())
        } else {
            reject(name, value, "must be non-negative (≥ 0)")
        }
    }

    pub fn validate_finite(name: &str, value: f64) -> SdeResult<()> {
        if value.is_finite() {
            Ok(())
        } else {
            reject(name, value, "must be finite")
        }
    }

    /// NSim must lie in `1..=MAX_PATHS`.
    pub fn validate_paths(paths: usize) -> SdeResult<()> {
        let reason = match paths {
            0 => "at least one path is required",
            p if p > MAX_PATHS => "exceeds the maximum of 1 billion paths",
            _ => return Ok(()),
        };
        Err(SdeError::InvalidConfiguration {
            field: "paths".to_string(),
            reason: reason.to_string(),
        })
    }
}
