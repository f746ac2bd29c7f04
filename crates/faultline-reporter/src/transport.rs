//! HTTP delivery of finalized payloads
//!
//! One POST per report, fire-and-forget from the caller's perspective.
//! There is no retry, backoff or queueing: a dropped report is simply
//! lost, because the host application's reliability outranks telemetry.

use std::io::Write;
use std::time::Duration;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::endpoint::Endpoint;

/// Upper bound on one delivery attempt, so a slow tracking service can
/// never stall the host's error handling indefinitely.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("reporting endpoint is disabled")]
    Disabled,
    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to compress payload: {0}")]
    Compress(#[from] std::io::Error),
    #[error("failed to reach reporting endpoint: {0}")]
    Request(#[from] reqwest::Error),
    #[error("reporting endpoint rejected the payload with HTTP {0}")]
    Rejected(u16),
}

/// HTTP transport for error reports.
pub struct Transport {
    client: reqwest::Client,
}

impl Transport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Send a payload to the endpoint. Production targets receive a
    /// deflate-compressed body, debug override targets plain JSON.
    pub async fn send(&self, endpoint: &Endpoint, payload: &Value) -> Result<(), TransportError> {
        let url = match endpoint {
            Endpoint::Disabled => return Err(TransportError::Disabled),
            Endpoint::Production { url } | Endpoint::DebugOverride { url } => url.as_str(),
        };

        let body = serde_json::to_vec(payload)?;
        let request = self
            .client
            .post(url)
            .timeout(SEND_TIMEOUT)
            .header(CONTENT_TYPE, "application/json");

        let request = if endpoint.compressed() {
            request
                .header(CONTENT_ENCODING, "deflate")
                .body(deflate(&body)?)
        } else {
            request.body(body)
        };

        let response = request.send().await?;
        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(TransportError::Rejected(status.as_u16()));
        }

        debug!(status = status.as_u16(), url, "Delivered error report");
        Ok(())
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

/// zlib-wrapped deflate at the fastest level; reports are small and the
/// encoder runs inline on the request's error path.
fn deflate(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(bytes)?;
    encoder.finish()
}
