//! Release notes page download.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, instrument};
use url::Url;

use releasebot_shared::{ReleaseBotError, Result};

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Maximum response size we accept (10 MB).
const MAX_RESPONSE_SIZE: u64 = 10 * 1024 * 1024;

/// User-Agent string for page requests.
const USER_AGENT: &str = concat!("releasebot/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the release notes page.
pub struct PageFetcher {
    client: Client,
    max_bytes: u64,
}

impl PageFetcher {
    /// Create a fetcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()
            .map_err(|e| ReleaseBotError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_bytes: MAX_RESPONSE_SIZE,
        })
    }

    /// Override the body size limit.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// GET the page at `url` and return its body as text.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch(&self, url: &Url) -> Result<String> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ReleaseBotError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReleaseBotError::Network(format!("{url}: HTTP {status}")));
        }

        // Limit applies to bytes read, with or without Content-Length.
        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ReleaseBotError::Network(format!("{url}: failed to read body: {e}")))?
        {
            if (bytes.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(ReleaseBotError::validation(format!(
                    "{url}: response too large (over {} bytes)",
                    self.max_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        let body = String::from_utf8_lossy(&bytes).into_owned();

        debug!(bytes = body.len(), "page body read");
        info!("fetched release notes page");
        Ok(body)
    }
}
