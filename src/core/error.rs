use thiserror::Error;

/// Failure taxonomy for the simulation core.
///
/// `Validation` covers malformed or out-of-domain input and is raised once at
/// the engine boundary, before any month is processed. `Computation` is
/// reserved for arithmetic failures that indicate a programming defect (e.g.
/// a date pushed past the supported calendar range) and should abort loudly.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("computation failed: {0}")]
    Computation(String),
}

impl SimError {
    pub fn validation(msg: impl Into<String>) -> Self {
        SimError::Validation(msg.into())
    }

    pub fn computation(msg: impl Into<String>) -> Self {
        SimError::Computation(msg.into())
    }
}
