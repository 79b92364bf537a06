//! Unified error types for the ERIN engine.
//!
//! This module provides a common error type [`ErinError`] used at the
//! boundaries of the core crate: model assembly, propagation, and
//! reconciliation. I/O and TOML-parsing errors belong to `erin-io`; this
//! crate only needs to describe failures that are intrinsic to the engine
//! itself.

use thiserror::Error;

/// Unified error type for all ERIN core operations.
#[derive(Error, Debug)]
pub enum ErinError {
    /// A component or connection references a tag, port, or flow type that
    /// was never declared (cycle in the engine's sense, per §7).
    #[error("model-build error: {0}")]
    ModelBuild(String),

    /// A value outside its documented domain was supplied to a constructor
    /// (e.g. efficiency outside `(0, 1]`, `chargeThreshold >= capacity`).
    #[error("validation error: {0}")]
    Validation(String),

    /// A runtime invariant was violated (SOC left `[0, capacity]`,
    /// propagation failed to reach a fixed point, …). These indicate a bug
    /// in this code, not bad input.
    #[error("invariant violation: {0}")]
    Invariant(String),

    /// Generic error for wrapping lower-level failures at the core boundary.
    #[error("{0}")]
    Other(String),
}

pub type ErinResult<T> = Result<T, ErinError>;

impl From<String> for ErinError {
    fn from(s: String) -> Self {
        ErinError::Other(s)
    }
}

impl From<&str> for ErinError {
    fn from(s: &str) -> Self {
        ErinError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ErinError::Invariant("soc out of range".into());
        assert!(err.to_string().contains("invariant violation"));
    }

    #[test]
    fn question_mark_operator() {
        fn inner() -> ErinResult<()> {
            Err(ErinError::Validation("bad field".into()))
        }
        fn outer() -> ErinResult<()> {
            inner()?;
            Ok(())
        }
        assert!(outer().is_err());
    }
}
