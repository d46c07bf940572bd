use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::endpoints::Endpoint;
use crate::error::{EndpointFailure, ResolveError, TransportError};
use crate::logging::{log_attempt, log_attempt_failed, log_resolved, v_str, ProfileScope};
use crate::transport::Transport;

/// A payload plus the endpoint that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub payload: Value,
    pub endpoint_used: String,
}

/// Tries candidate endpoints strictly in order and returns the first usable
/// JSON payload.
///
/// Attempts are sequential: worst-case latency is the sum of every attempt.
/// Nothing is cached between calls, so each resolution starts again at the
/// first candidate.
#[derive(Clone)]
pub struct EndpointResolver {
    transport: Arc<dyn Transport>,
    attempt_timeout: Option<Duration>,
}

impl EndpointResolver {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            attempt_timeout: None,
        }
    }

    pub fn with_attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub async fn resolve(
        &self,
        resource: &str,
        endpoints: &[Endpoint],
    ) -> Result<Resolved, ResolveError> {
        let _scope = ProfileScope::with_context("resolve", &[("resource", v_str(resource))]);
        let mut failures = Vec::with_capacity(endpoints.len());

        for (i, endpoint) in endpoints.iter().enumerate() {
            let label = endpoint.label();
            log_attempt(resource, &label, i + 1);

            match self.attempt(endpoint).await {
                Ok(payload) => {
                    log_resolved(resource, &label, i + 1);
                    return Ok(Resolved {
                        payload,
                        endpoint_used: label,
                    });
                }
                Err(error) => {
                    log_attempt_failed(resource, &label, &error.to_string());
                    failures.push(EndpointFailure {
                        endpoint: label,
                        error,
                    });
                }
            }
        }

        Err(ResolveError::ResolutionExhausted { failures })
    }

    async fn attempt(&self, endpoint: &Endpoint) -> Result<Value, TransportError> {
        match self.attempt_timeout {
            Some(limit) => tokio::time::timeout(limit, self.transport.get_json(endpoint))
                .await
                .map_err(|_| TransportError::Timeout(limit.as_millis() as u64))?,
            None => self.transport.get_json(endpoint).await,
        }
    }
}
