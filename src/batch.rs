// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use crate::episode::{DownloadContext, download_episode, episode_filename};
use crate::error::{BatchError, DownloadError};
use crate::feed::{Episode, Feed};
use crate::http::HttpClient;
use crate::progress::{ProgressEvent, SharedProgressReporter};
use crate::retry::RetryPolicy;

/// Directory episodes are saved to when nothing else is configured
pub const DEFAULT_OUTPUT_DIR: &str = "bulkpod-downloads";

/// Options for a batch download
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Directory the episode files are written to
    pub output_dir: PathBuf,
    /// Retry policy applied to each episode
    pub retry: RetryPolicy,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            retry: RetryPolicy::default(),
        }
    }
}

/// What happened to a single episode
#[derive(Debug)]
pub enum DownloadOutcome {
    /// A file for this episode was already present
    Skipped,
    /// The episode was downloaded
    Succeeded { bytes: u64 },
    /// The episode could not be downloaded
    Failed { error: DownloadError },
}

/// Result of a batch download
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Number of episodes downloaded in this run
    pub succeeded: usize,
    /// Number of episodes skipped because their file already existed
    pub skipped: usize,
    /// Titles of the episodes that failed, in feed order
    pub failed: Vec<String>,
    /// Bytes written by the episodes downloaded in this run
    pub bytes_downloaded: u64,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, title: &str, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Skipped => self.skipped += 1,
            DownloadOutcome::Succeeded { bytes } => {
                self.succeeded += 1;
                self.bytes_downloaded += bytes;
            }
            DownloadOutcome::Failed { .. } => self.failed.push(title.to_string()),
        }
    }
}

/// Download every episode of a feed into the output directory.
///
/// Episodes are processed one at a time in feed order. An episode whose file
/// already exists is skipped without any request; an episode that fails is
/// recorded and the batch moves on. Only a missing, uncreatable output
/// directory stops the batch, and it does so before any episode is touched.
pub async fn download_all<C: HttpClient + ?Sized>(
    client: &C,
    feed: &Feed,
    options: &DownloadOptions,
    reporter: SharedProgressReporter,
) -> Result<BatchReport, BatchError> {
    let output_dir = options.output_dir.as_path();

    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| BatchError::CreateOutputDir {
            path: output_dir.to_path_buf(),
            source: e,
        })?;

    let total_episodes = feed.episode_count();

    tracing::info!(
        feed = %feed.title,
        episodes = total_episodes,
        output_dir = %output_dir.display(),
        "Starting batch download"
    );

    reporter.report(ProgressEvent::BatchStarting {
        feed_title: feed.title.clone(),
        total_episodes,
    });

    let mut report = BatchReport::default();

    for (episode_index, episode) in feed.episodes.iter().enumerate() {
        let context = DownloadContext {
            episode_index,
            total_episodes,
        };

        let outcome =
            process_episode(client, episode, output_dir, &options.retry, &context, &reporter)
                .await;

        report.record(&episode.title, &outcome);
    }

    tracing::info!(
        succeeded = report.succeeded,
        skipped = report.skipped,
        failed = report.failed.len(),
        bytes = report.bytes_downloaded,
        "Batch download finished"
    );

    reporter.report(ProgressEvent::BatchCompleted {
        succeeded: report.succeeded,
        skipped: report.skipped,
        failed: report.failed.len(),
    });

    Ok(report)
}

async fn process_episode<C: HttpClient + ?Sized>(
    client: &C,
    episode: &Episode,
    output_dir: &Path,
    policy: &RetryPolicy,
    context: &DownloadContext,
    reporter: &SharedProgressReporter,
) -> DownloadOutcome {
    let destination = output_dir.join(episode_filename(&episode.title));

    // The file itself is the only record of a finished download
    if tokio::fs::try_exists(&destination).await.unwrap_or(false) {
        tracing::debug!(
            episode = %episode.title,
            path = %destination.display(),
            "Already downloaded, skipping"
        );
        reporter.report(ProgressEvent::EpisodeSkipped {
            episode_index: context.episode_index,
            episode_title: episode.title.clone(),
        });
        return DownloadOutcome::Skipped;
    }

    match download_episode(client, episode, &destination, policy, context, reporter).await {
        Ok(bytes) => DownloadOutcome::Succeeded { bytes },
        Err(error) => {
            tracing::error!(episode = %episode.title, error = %error, "Episode failed");
            reporter.report(ProgressEvent::DownloadFailed {
                episode_index: context.episode_index,
                episode_title: episode.title.clone(),
                error: error.to_string(),
            });
            DownloadOutcome::Failed { error }
        }
    }
}
