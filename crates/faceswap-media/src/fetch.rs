//! Downloads of private platform files.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{MediaError, Result};

const USER_AGENT: &str = concat!("faceswapbot/", env!("CARGO_PKG_VERSION"));

/// Source of the raw bytes behind a file-share URL.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Bearer-authenticated HTTP GET with a hard timeout and size cap. No retries.
pub struct HttpFetcher {
    client: reqwest::Client,
    token: String,
    max_bytes: u64,
}

impl HttpFetcher {
    pub fn new(token: impl Into<String>, timeout: Duration, max_bytes: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| MediaError::Fetch(format!("build HTTP client: {e}")))?;
        Ok(Self {
            client,
            token: token.into(),
            max_bytes,
        })
    }
}

#[async_trait]
impl FileFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| MediaError::Fetch(format!("request: {e}")))?
            .error_for_status()
            .map_err(|e| MediaError::Fetch(format!("status: {e}")))?;

        if let Some(len) = resp.content_length() {
            if len > self.max_bytes {
                return Err(MediaError::Fetch(format!(
                    "file is {len} bytes, limit is {}",
                    self.max_bytes
                )));
            }
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| MediaError::Fetch(format!("body: {e}")))?;

        if bytes.len() as u64 > self.max_bytes {
            return Err(MediaError::Fetch(format!(
                "file is {} bytes, limit is {}",
                bytes.len(),
                self.max_bytes
            )));
        }

        debug!(bytes = bytes.len(), "downloaded file");
        Ok(bytes.to_vec())
    }
}
