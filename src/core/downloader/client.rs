// ─── File fetcher ───
// Streams one URL to disk. Content goes to a `.part` sibling first and is
// renamed into place on success, so an interrupted transfer never leaves a
// plausible-looking file behind.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use indicatif::ProgressBar;
use reqwest::{Client, Url};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::error::{FetchError, FetchResult};
use crate::core::http::RateLimiter;

/// Streaming HTTP fetcher shared by all workers.
pub struct FileFetcher {
    client: Client,
    /// When set, content downloads queue behind the same limiter as API
    /// metadata calls. Bandwidth is unbounded otherwise.
    limiter: Option<Arc<RateLimiter>>,
}

impl FileFetcher {
    pub fn new(client: Client, limiter: Option<Arc<RateLimiter>>) -> Self {
        Self { client, limiter }
    }

    /// Stream `url` into `dest`, reporting byte progress on `bar`.
    ///
    /// Creates parent directories as needed. The `.part` file is removed on
    /// any failure, including cancellation.
    pub async fn fetch(
        &self,
        url: &Url,
        dest: &Path,
        bar: &ProgressBar,
        cancel: &CancellationToken,
    ) -> FetchResult<()> {
        if let Some(limiter) = &self.limiter {
            limiter.acquire().await;
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FetchError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            response = self.client.get(url.clone()).send() => response?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::TransferFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(total) = response.content_length() {
            bar.set_length(total);
        }
        bar.set_position(0);

        let part = part_path(dest);
        if let Err(err) = self.stream_to(response, &part, bar, cancel).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(err);
        }

        if let Err(err) = tokio::fs::rename(&part, dest).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(FetchError::Io {
                path: dest.to_path_buf(),
                source: err,
            });
        }

        debug!("Downloaded {} -> {:?}", url, dest);
        Ok(())
    }

    async fn stream_to(
        &self,
        response: reqwest::Response,
        part: &Path,
        bar: &ProgressBar,
        cancel: &CancellationToken,
    ) -> FetchResult<()> {
        // Closed before the rename; rename-over-open fails on Windows.
        let mut file = tokio::fs::File::create(part)
            .await
            .map_err(|e| FetchError::Io {
                path: part.to_path_buf(),
                source: e,
            })?;

        let mut stream = response.bytes_stream();
        loop {
            let chunk = tokio::select! {
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                chunk = stream.next() => chunk,
            };
            let Some(chunk) = chunk else { break };

            let bytes = chunk?;
            file.write_all(&bytes).await.map_err(|e| FetchError::Io {
                path: part.to_path_buf(),
                source: e,
            })?;
            bar.inc(bytes.len() as u64);
        }

        file.flush().await.map_err(|e| FetchError::Io {
            path: part.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }
}

/// `foo.jar` downloads as `foo.jar.part`. Appending keeps the real
/// extension visible while the transfer runs.
fn part_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    dest.with_file_name(format!("{name}.part"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_path_keeps_the_original_extension() {
        let part = part_path(Path::new("/out/mods/foo.jar"));
        assert_eq!(part, Path::new("/out/mods/foo.jar.part"));
    }
}
