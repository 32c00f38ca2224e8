//! Production transport over the allowlisted reqwest client.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use gravida_common::sandbox::SandboxClient;
use gravida_common::GravidaError;

use super::{HttpTransport, RequestIdentity, TransportError, TransportResponse};

pub struct ReqwestTransport {
    client: SandboxClient,
}

impl ReqwestTransport {
    /// `timeout` bounds each request end to end.
    pub fn new(timeout: Duration, max_idle_per_host: usize) -> Result<Self, GravidaError> {
        Ok(Self {
            client: SandboxClient::new(timeout, max_idle_per_host)?,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        identity: &RequestIdentity,
    ) -> Result<TransportResponse, TransportError> {
        let mut request = self
            .client
            .get(url)
            .map_err(|e| TransportError::HostNotAllowed(e.to_string()))?;
        for (name, value) in identity.headers() {
            request = request.header(name, value);
        }

        let resp = request.send().await.map_err(classify)?;
        let status = resp.status().as_u16();
        let final_url = resp.url().to_string();
        let body = resp.text().await.map_err(classify)?;
        debug!(url, status, final_url = %final_url, "HTTP response");

        Ok(TransportResponse {
            status,
            final_url,
            body,
        })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else {
        TransportError::Connection(err.to_string())
    }
}
