use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::core::error::{RealizerError, RealizerResult};
use crate::core::http::build_http_client;

/// Transfers the bytes behind a URL to a file.
///
/// Implementations never inspect content; verification happens afterwards.
/// A failed fetch may leave a partial file at `dest`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Write the body of `url` to `dest`, creating parent directories.
    /// Returns the number of bytes written.
    async fn fetch(&self, url: &str, dest: &Path) -> RealizerResult<u64>;
}

/// Run a single fetch under a deadline; expiry is reported as `FetchTimeout`.
pub async fn fetch_with_deadline(
    fetcher: &dyn Fetcher,
    url: &str,
    dest: &Path,
    deadline: Duration,
) -> RealizerResult<u64> {
    match tokio::time::timeout(deadline, fetcher.fetch(url, dest)).await {
        Ok(result) => result,
        Err(_) => Err(RealizerError::FetchTimeout {
            url: url.to_string(),
            secs: deadline.as_secs(),
        }),
    }
}

/// Streaming HTTP fetcher.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn with_connect_timeout(connect_timeout: Duration) -> RealizerResult<Self> {
        Ok(Self::new(build_http_client(connect_timeout)?))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> RealizerResult<u64> {
        // Ensure parent dir exists
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RealizerError::io(parent, e))?;
        }

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RealizerError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut written = 0u64;
        // Scoped so the handle is closed before anyone re-opens the file to hash it
        {
            let mut file = tokio::fs::File::create(dest)
                .await
                .map_err(|e| RealizerError::io(dest, e))?;
            let mut body = response.bytes_stream();
            while let Some(chunk) = body.next().await {
                let chunk = chunk?;
                file.write_all(&chunk)
                    .await
                    .map_err(|e| RealizerError::io(dest, e))?;
                written += chunk.len() as u64;
            }
            file.flush().await.map_err(|e| RealizerError::io(dest, e))?;
        }

        debug!("Downloaded: {} -> {:?} ({} bytes)", url, dest, written);
        Ok(written)
    }
}
