//! Mirror access: directory listings and streaming installer downloads.
//!
//! The mirror exposes nothing but HTML index pages and files, so the client
//! surface is two calls. Everything above this module talks to
//! [`MirrorClient`] so tests can substitute an in-memory mirror.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::Reporter;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A mirror that can serve a directory listing and individual files.
#[async_trait]
pub trait MirrorClient: Send + Sync {
    /// Fetch the raw listing page at `url`.
    async fn fetch_listing(&self, url: &str) -> Result<String, DownloadError>;

    /// Stream `url` into `dest` (created or truncated), returning the number
    /// of bytes written.
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        reporter: &dyn Reporter,
    ) -> Result<u64, DownloadError>;
}

/// Network limits for mirror requests. A request that runs into any of them
/// fails like a transport error, so the resolver moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Establishing the TCP/TLS connection.
    pub connect: Duration,
    /// Longest silence between two reads, headers included.
    pub read: Duration,
    /// Whole request, body included.
    pub total: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(15),
            read: Duration::from_secs(30),
            total: Duration::from_secs(600),
        }
    }
}

/// [`MirrorClient`] over plain HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpMirror {
    client: Client,
}

impl HttpMirror {
    /// Build a client with the pyboot user agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, DownloadError> {
        Self::with_timeouts(Timeouts::default())
    }

    /// Build a client with explicit network limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn with_timeouts(timeouts: Timeouts) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .connect_timeout(timeouts.connect)
            .read_timeout(timeouts.read)
            .timeout(timeouts.total)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MirrorClient for HttpMirror {
    async fn fetch_listing(&self, url: &str) -> Result<String, DownloadError> {
        let text = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }

    async fn download(
        &self,
        url: &str,
        dest: &Path,
        reporter: &dyn Reporter,
    ) -> Result<u64, DownloadError> {
        let response = self.client.get(url).send().await?.error_for_status()?;

        let total_size = response.content_length();
        let file_name = crate::paths::filename_from_url(url);

        let mut file = File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        reporter.downloading(file_name, 0, total_size);

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            reporter.downloading(file_name, downloaded, total_size);
        }

        file.flush().await?;
        Ok(downloaded)
    }
}
