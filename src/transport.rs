use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::endpoints::Endpoint;
use crate::error::TransportError;
use crate::state::Config;

/// A single GET returning parsed JSON.
///
/// Any non-success outcome (network, status, body) is a `TransportError`;
/// the resolver treats them all the same way.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, endpoint: &Endpoint) -> Result<Value, TransportError>;
}

/// `reqwest`-backed transport rooted at the configured API base.
pub struct HttpTransport {
    client: Client,
    base: Url,
    timeout_ms: Option<u64>,
}

impl HttpTransport {
    pub fn new(cfg: &Config) -> Result<Self, TransportError> {
        let base = Url::parse(&cfg.api_base)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", cfg.api_base, e)))?;
        let mut builder = Client::builder().user_agent(cfg.user_agent.clone());
        if let Some(ms) = cfg.request_timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base,
            timeout_ms: cfg.request_timeout_ms,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        match self.timeout_ms {
            Some(ms) if err.is_timeout() => TransportError::Timeout(ms),
            _ => TransportError::Network(err.to_string()),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, endpoint: &Endpoint) -> Result<Value, TransportError> {
        let url = endpoint.url(&self.base)?;
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let body = resp.bytes().await.map_err(|e| self.classify(e))?;
        serde_json::from_slice(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparseable_base() {
        let cfg = Config {
            api_base: "not a url".to_string(),
            ..Config::default()
        };
        assert!(matches!(HttpTransport::new(&cfg), Err(TransportError::InvalidUrl(_))));
    }

    #[test]
    fn builds_with_timeout() {
        let cfg = Config {
            request_timeout_ms: Some(250),
            ..Config::default()
        };
        let t = HttpTransport::new(&cfg).unwrap();
        assert_eq!(t.base().as_str(), "http://127.0.0.1:5000/");
    }

    #[tokio::test]
    async fn connection_refused_is_network_error() {
        // Port 9 (discard) is closed on test machines.
        let cfg = Config {
            api_base: "http://127.0.0.1:9".to_string(),
            request_timeout_ms: Some(2000),
            ..Config::default()
        };
        let t = HttpTransport::new(&cfg).unwrap();
        let err = t
            .get_json(&Endpoint::expand("/api/countries", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Network(_) | TransportError::Timeout(_)));
    }
}
