// # HTTP Image Source
//
// This crate provides the HTTP-based image source for imgwatch.
//
// ## Architecture
//
// One GET per `fetch()` call, with a bounded client timeout. The raw bytes
// are digested into an `ImageSnapshot` by the core; this crate owns only
// the transport.
//
// No retries here: a failed fetch aborts the current poll cycle and the
// engine tries again on the next tick.

use std::time::Duration;

use imgwatch_core::traits::ImageSource;
use imgwatch_core::{Error, ImageSnapshot, Result};

/// Default timeout for image retrievals
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP-based image source
///
/// # Example
///
/// ```rust,no_run
/// use imgwatch_fetch_http::HttpImageSource;
/// use imgwatch_core::traits::ImageSource;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let source = HttpImageSource::new("https://example.com/image.png");
///     let snapshot = source.fetch().await?;
///     println!("digest: {}", snapshot.digest);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    /// URL to fetch the image from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpImageSource {
    /// Create a new HTTP image source with the default 30s timeout
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_timeout(url, DEFAULT_FETCH_TIMEOUT)
    }

    /// Create with a custom request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// The URL this source fetches from
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self) -> Result<ImageSnapshot> {
        tracing::debug!("fetching image from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::fetch_transport(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch_status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::fetch_transport(format!("failed to read body: {}", e)))?;

        tracing::debug!("fetched {} bytes", bytes.len());
        Ok(ImageSnapshot::from_bytes(&bytes, &self.url))
    }
}
