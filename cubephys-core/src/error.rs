use thiserror::Error;

/// Errors raised while setting up a simulation.
///
/// Stepping the physics never fails; only configuration and scenario
/// loading can.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid config field '{field}': {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("malformed scenario: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SimError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = SimError> = std::result::Result<T, E>;
