//! reqwest-backed transport

use async_trait::async_trait;
use platypus_core::{Envelope, TransportError};
use std::time::Duration;
use tracing::trace;

use crate::transport::{Method, Params, Transport};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP transport posting form-encoded bodies and decoding JSON envelopes
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for `base_url` (e.g. `http://127.0.0.1:5000`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Http {
                url: base_url.clone(),
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        params: Params<'_>,
    ) -> Result<Envelope, TransportError> {
        let url = self.url(path);
        trace!(method = %method, url = %url, params = params.len(), "Sending registry request");

        let builder = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url).form(params),
            Method::Delete => self.client.delete(&url),
        };

        let response = builder.send().await.map_err(|e| TransportError::Http {
            url: url.clone(),
            message: e.to_string(),
        })?;

        // The registry reports failures in the envelope, so the HTTP status
        // only matters when the body cannot be decoded.
        let code = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| TransportError::Http {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let envelope: Envelope =
            serde_json::from_slice(&body).map_err(|e| TransportError::Decode {
                url: url.clone(),
                code,
                message: e.to_string(),
            })?;

        trace!(url = %url, code = code, status = envelope.status, "Received registry response");
        Ok(envelope)
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
