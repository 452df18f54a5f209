//! HTTP fetcher for pages and images.
//!
//! [`HttpFetcher::fetch`] issues a single GET and returns as soon as the
//! headers arrive. The body stays on the wire inside [`FetchedResponse`]
//! until the caller reads it as text or streams it to disk, so a filtered
//! or duplicate image never has its bytes downloaded.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::content::ContentDescriptor;
use super::error::{FetchError, PersistError};
use crate::user_agent;

/// HTTP client shared by every worker.
///
/// Cheap to clone; clones share one connection pool.
///
/// # Example
///
/// ```no_run
/// use picgrab::download::HttpFetcher;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = HttpFetcher::new()?;
/// let response = fetcher.fetch("https://blog.example/12").await?;
/// let html = response.text().await?;
/// println!("{} bytes of markup", html.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

/// A successful response whose body has not been read yet.
#[derive(Debug)]
pub struct FetchedResponse {
    url: String,
    content: ContentDescriptor,
    response: reqwest::Response,
}

impl HttpFetcher {
    /// Creates a fetcher with the default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Request timeout: 5 minutes
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a fetcher with explicit timeout values in seconds.
    ///
    /// No compression is negotiated: a decoded body loses its
    /// `Content-Length`, which the size screen and duplicate check rely on.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend cannot be initialised.
    #[instrument(level = "debug")]
    pub fn new_with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .user_agent(user_agent::default_user_agent())
            .build()?;
        Ok(Self { client })
    }

    /// Sends one GET request for `url`.
    ///
    /// No retries: a failure is returned to the caller, which decides
    /// whether to record it.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if:
    /// - The URL is invalid or not http(s)
    /// - The request fails (DNS, connect, TLS, timeout)
    /// - The server returns a non-success status
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &str) -> Result<FetchedResponse, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::invalid_url(url));
        }

        debug!("fetching");
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        let content = ContentDescriptor::from_headers(response.headers());
        debug!(
            status = status.as_u16(),
            content_type = content.content_type.as_deref().unwrap_or("-"),
            content_length = content.content_length,
            "received headers"
        );

        Ok(FetchedResponse {
            url: url.to_string(),
            content,
            response,
        })
    }
}

impl FetchedResponse {
    /// The URL that was requested.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Header snapshot used for filtering and naming.
    #[must_use]
    pub fn content(&self) -> &ContentDescriptor {
        &self.content
    }

    /// Reads the whole body as text (page markup).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] if the body stream fails.
    pub async fn text(self) -> Result<String, FetchError> {
        let url = self.url;
        self.response
            .text()
            .await
            .map_err(|e| FetchError::network(url, e))
    }

    /// Streams the body into a new file at `path`, creating parent folders.
    ///
    /// A partially written file is removed before an error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::Io`] for filesystem failures and
    /// [`PersistError::Body`] if the body stream breaks off.
    #[instrument(skip(self), fields(url = %self.url, path = %path.display()))]
    pub async fn save_to(self, path: &Path) -> Result<u64, PersistError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PersistError::io(parent, e))?;
        }

        let mut file = File::create(path)
            .await
            .map_err(|e| PersistError::io(path, e))?;

        let result = stream_to_file(&mut file, self.response, &self.url, path).await;
        if result.is_err() {
            debug!("cleaning up partial file after error");
            drop(file);
            let _ = tokio::fs::remove_file(path).await;
        }
        result
    }
}

/// Streams response body to file.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, PersistError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| PersistError::body(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| PersistError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| PersistError::io(file_path, e))?;

    Ok(bytes_written)
}
