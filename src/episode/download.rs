// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::DownloadError;
use crate::feed::{Enclosure, Episode};
use crate::http::HttpClient;
use crate::progress::{ProgressEvent, SharedProgressReporter};
use crate::retry::{RetryPolicy, retry_with_policy};

/// Size of the pieces the response body is written in
pub const WRITE_CHUNK_SIZE: usize = 1024;

const PARTIAL_SUFFIX: &str = ".partial";

/// Where an episode sits in the batch, for progress reporting
#[derive(Debug, Clone)]
pub struct DownloadContext {
    /// Position of this episode in the feed (0-based)
    pub episode_index: usize,
    /// Total number of episodes in the feed
    pub total_episodes: usize,
}

/// Path an attempt writes to before it is moved over the destination
pub fn partial_path(destination: &Path) -> PathBuf {
    let mut name = OsString::from(destination.as_os_str());
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// Download an episode's enclosure to `destination`, retrying transient failures.
///
/// Returns the number of bytes written. On failure the partial file of the
/// last attempt is removed; the destination itself is only ever created by a
/// complete attempt.
pub async fn download_episode<C: HttpClient + ?Sized>(
    client: &C,
    episode: &Episode,
    destination: &Path,
    policy: &RetryPolicy,
    context: &DownloadContext,
    reporter: &SharedProgressReporter,
) -> Result<u64, DownloadError> {
    let enclosure = episode
        .enclosure
        .as_ref()
        .ok_or_else(|| DownloadError::MissingEnclosure {
            title: episode.title.clone(),
        })?;

    let title = episode.title.as_str();
    let max_attempts = policy.max_attempts.max(1);

    let result = retry_with_policy(
        policy,
        |attempt, error: &DownloadError| {
            reporter.report(ProgressEvent::RetryScheduled {
                episode_index: context.episode_index,
                episode_title: title.to_string(),
                attempt,
                max_attempts,
                error: error.to_string(),
            });
        },
        move |attempt| {
            download_attempt(client, enclosure, title, destination, attempt, context, reporter)
        },
    )
    .await;

    match result {
        Ok(bytes_downloaded) => {
            reporter.report(ProgressEvent::DownloadCompleted {
                episode_index: context.episode_index,
                episode_title: title.to_string(),
                bytes_downloaded,
            });
            Ok(bytes_downloaded)
        }
        Err(e) => {
            let partial = partial_path(destination);
            if tokio::fs::remove_file(&partial).await.is_ok() {
                tracing::debug!(path = %partial.display(), "Removed partial download");
            }
            Err(e)
        }
    }
}

/// Perform a single download attempt.
///
/// The body is streamed into a fresh partial file, then renamed over the
/// destination once everything has been flushed. Progress totals come from
/// the `Content-Length` header, or the length the feed declared when the
/// server sends none.
pub async fn download_attempt<C: HttpClient + ?Sized>(
    client: &C,
    enclosure: &Enclosure,
    title: &str,
    destination: &Path,
    attempt: u32,
    context: &DownloadContext,
    reporter: &SharedProgressReporter,
) -> Result<u64, DownloadError> {
    let url_str = enclosure.url.as_str();
    tracing::debug!(url = url_str, attempt, "Requesting episode");

    let response = client
        .get_stream(url_str)
        .await
        .map_err(|e| DownloadError::HttpFailed {
            url: url_str.to_string(),
            source: e,
        })?;

    if response.status >= 400 {
        return Err(DownloadError::HttpStatus {
            url: url_str.to_string(),
            status: response.status,
        });
    }

    // A zero length is as good as none
    let total_bytes = response
        .content_length
        .filter(|&len| len > 0)
        .or(enclosure.length.filter(|&len| len > 0));

    reporter.report(ProgressEvent::DownloadStarting {
        episode_index: context.episode_index,
        total_episodes: context.total_episodes,
        episode_title: title.to_string(),
        attempt,
        content_length: total_bytes,
    });

    let partial = partial_path(destination);
    let mut file = File::create(&partial)
        .await
        .map_err(|e| DownloadError::FileCreateFailed {
            path: partial.clone(),
            source: e,
        })?;

    let mut bytes_downloaded: u64 = 0;
    let mut stream = response.body;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::StreamFailed {
            url: url_str.to_string(),
            source: e,
        })?;

        for piece in chunk.chunks(WRITE_CHUNK_SIZE) {
            file.write_all(piece)
                .await
                .map_err(|e| DownloadError::FileWriteFailed {
                    path: partial.clone(),
                    source: e,
                })?;

            bytes_downloaded += piece.len() as u64;

            reporter.report(ProgressEvent::DownloadProgress {
                episode_index: context.episode_index,
                bytes_downloaded,
                total_bytes,
            });
        }
    }

    file.flush()
        .await
        .map_err(|e| DownloadError::FileWriteFailed {
            path: partial.clone(),
            source: e,
        })?;
    drop(file);

    tokio::fs::rename(&partial, destination)
        .await
        .map_err(|e| DownloadError::FinalizeFailed {
            path: destination.to_path_buf(),
            source: e,
        })?;

    tracing::debug!(
        path = %destination.display(),
        bytes = bytes_downloaded,
        "Episode written"
    );

    Ok(bytes_downloaded)
}
