// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

/// Events emitted while downloading a feed's episodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Batch is starting
    BatchStarting {
        feed_title: String,
        total_episodes: usize,
    },

    /// Episode file already exists in the output directory
    EpisodeSkipped {
        episode_index: usize,
        episode_title: String,
    },

    /// A download attempt received its response and is starting to write
    DownloadStarting {
        /// Position of this episode in the feed (0-based)
        episode_index: usize,
        total_episodes: usize,
        episode_title: String,
        /// 1-based attempt number
        attempt: u32,
        /// Declared content length in bytes; `None` when absent or zero
        content_length: Option<u64>,
    },

    /// Download progress update
    DownloadProgress {
        episode_index: usize,
        bytes_downloaded: u64,
        total_bytes: Option<u64>,
    },

    /// An attempt failed and another one will follow after the retry delay
    RetryScheduled {
        episode_index: usize,
        episode_title: String,
        attempt: u32,
        max_attempts: u32,
        error: String,
    },

    /// A download completed successfully
    DownloadCompleted {
        episode_index: usize,
        episode_title: String,
        bytes_downloaded: u64,
    },

    /// A download failed for good
    DownloadFailed {
        episode_index: usize,
        episode_title: String,
        error: String,
    },

    /// All episodes have been processed
    BatchCompleted {
        succeeded: usize,
        skipped: usize,
        failed: usize,
    },
}

/// Trait for reporting progress events during a batch download.
///
/// Implementations can use this to display progress bars, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {}
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}
