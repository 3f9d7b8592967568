use kimi_async::KimiError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Fatal pipeline errors. Per-node service failures are not represented
/// here; they degrade the affected node and are recorded in the tree.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(String),

    #[error("Kimi client error: {0}")]
    Kimi(#[from] KimiError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outcome classification for a single reasoning-service call.
///
/// `Degraded` failures stay local to the node being processed (the caller
/// applies a safe default and records the error); `Fatal` failures abort
/// the whole run.
#[derive(Debug)]
pub enum CallFailure {
    /// Recoverable at the node level; carries a human-readable reason
    Degraded(String),
    /// Aborts the run (misconfiguration, missing credentials)
    Fatal(KimiError),
}

impl From<KimiError> for CallFailure {
    fn from(e: KimiError) -> Self {
        match e {
            KimiError::Config(_) => Self::Fatal(e),
            other => Self::Degraded(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_are_fatal() {
        let f = CallFailure::from(KimiError::Config("no key".into()));
        assert!(matches!(f, CallFailure::Fatal(_)));
    }

    #[test]
    fn api_errors_degrade() {
        let f = CallFailure::from(KimiError::Serde("bad body".into()));
        match f {
            CallFailure::Degraded(msg) => assert!(msg.contains("bad body")),
            CallFailure::Fatal(_) => panic!("Serde errors must degrade, not abort"),
        }
    }
}
