use thiserror::Error;

/// Failure of a single endpoint attempt. Always recovered by moving on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("http status {0}")]
    Status(u16),
    #[error("invalid json body: {0}")]
    Decode(String),
    #[error("timed out after {0}ms")]
    Timeout(u64),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointFailure {
    pub endpoint: String,
    pub error: TransportError,
}

impl std::fmt::Display for EndpointFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.endpoint, self.error)
    }
}

/// Failures that make a resolution fall back to synthesized data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("all {} endpoints failed: {}", .failures.len(), join_failures(.failures))]
    ResolutionExhausted { failures: Vec<EndpointFailure> },
    #[error("unrecognized payload shape: {reason}")]
    ShapeUnrecognized { reason: String },
}

impl ResolveError {
    pub fn shape(reason: impl Into<String>) -> Self {
        ResolveError::ShapeUnrecognized {
            reason: reason.into(),
        }
    }

    /// Short tag used in logs and notifications.
    pub fn cause(&self) -> &'static str {
        match self {
            ResolveError::ResolutionExhausted { .. } => "resolution_exhausted",
            ResolveError::ShapeUnrecognized { .. } => "shape_unrecognized",
        }
    }
}

fn join_failures(failures: &[EndpointFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
