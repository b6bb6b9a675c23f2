//! Error taxonomy for the analysis pipeline.
//!
//! Three failure domains, kept deliberately separate because they recover
//! differently:
//!   * `ValidationError` — bad user input, rejected before any request is sent
//!   * `AnalysisError`   — transport/remote failure while classifying
//!   * `SchemaError`     — the remote answered, but the payload violates the
//!     contract; logged distinctly since it signals a contract mismatch rather
//!     than a transient outage
//!
//! Nothing here is fatal: every error resolves the session back to idle.

use thiserror::Error;

/// User-input rejection. No request is sent when one of these fires.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("no URL provided")]
    Empty,

    #[error("unsupported URL scheme: {scheme} (expected http or https)")]
    UnsupportedScheme { scheme: String },

    #[error("URL has no recognizable host")]
    MissingHost,

    #[error("host does not look like a public hostname: {host}")]
    UnrecognizedHost { host: String },

    #[error("not a valid URL: {0}")]
    Malformed(#[from] url::ParseError),
}

/// Network or remote-classifier failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("analysis request timed out")]
    Timeout,

    #[error("classifier returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("could not reach classifier: {message}")]
    Transport { message: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl AnalysisError {
    /// Whether a bounded automatic retry is reasonable. Only the idempotent
    /// read endpoints consult this; `analyze` is never retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            AnalysisError::Timeout => true,
            AnalysisError::Transport { .. } => true,
            AnalysisError::Http { status, .. } => *status >= 500,
            AnalysisError::Schema(_) => false,
        }
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AnalysisError::Timeout
        } else if let Some(status) = e.status() {
            AnalysisError::Http {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            AnalysisError::Transport {
                message: e.to_string(),
            }
        }
    }
}

/// Contract violation in an otherwise well-delivered response.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("response does not match any known result shape: {0}")]
    Shape(String),

    #[error("{field} out of range: {value} (expected {expected})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("class probabilities sum to {sum:.4}, expected 1.0 within 0.001")]
    ProbabilitySum { sum: f64 },
}

/// Either side of a submission failure, for callers that drive a whole
/// submission in one call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(AnalysisError::Timeout.is_retryable());
        assert!(AnalysisError::Transport {
            message: "connection refused".into()
        }
        .is_retryable());
        assert!(AnalysisError::Http {
            status: 503,
            message: "unavailable".into()
        }
        .is_retryable());
        assert!(!AnalysisError::Http {
            status: 404,
            message: "not found".into()
        }
        .is_retryable());
        assert!(!AnalysisError::Schema(SchemaError::ProbabilitySum { sum: 0.5 }).is_retryable());
    }
}
