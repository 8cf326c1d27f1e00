//! HTTP transport for the streaming endpoint.
//!
//! `StreamTransport` is the seam the coordinator talks through; the real
//! implementation wraps `reqwest`, the tests script chunk sequences by hand.
//! Status classification happens at `open` time, before any body bytes are
//! consumed: throttling and auth failures never reach the decoder.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use lariat_core::{AuthSession, ClientError};
use lariat_wire::StreamRequest;
use tracing::debug;

const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Decoded text chunks of the response body, in arrival order.
pub type ChunkStream = BoxStream<'static, Result<String, ClientError>>;

/// Opens one streaming request against the backend.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    async fn open(
        &self,
        request: &StreamRequest,
        auth: &AuthSession,
    ) -> Result<ChunkStream, ClientError>;
}

/// The `reqwest`-backed transport.
pub struct HttpTransport {
    endpoint: String,
    cookie: Option<String>,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for the given streaming endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            cookie: None,
            client,
        }
    }

    /// Override the whole-request timeout. Long replies stream for a while.
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        self
    }

    /// Send this session cookie with every request.
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }
}

#[async_trait]
impl StreamTransport for HttpTransport {
    async fn open(
        &self,
        request: &StreamRequest,
        auth: &AuthSession,
    ) -> Result<ChunkStream, ClientError> {
        let form = request
            .form_pairs(&auth.token)
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        debug!(request_id = %request.request_id, endpoint = %self.endpoint, "Opening stream request");

        let mut builder = self
            .client
            .post(&self.endpoint)
            .query(&[("bl", auth.bl.as_str()), ("rt", "c")])
            .form(&form);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(reqwest::header::COOKIE, cookie);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ClientError::RateLimited);
        }
        if status == 401 || status == 403 {
            return Err(ClientError::AuthExpired);
        }
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Transport(format!(
                "unexpected status {status}: {body}"
            )));
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| match chunk {
                Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
                Err(e) => Err(ClientError::Transport(e.to_string())),
            })
            .boxed();

        Ok(stream)
    }
}
