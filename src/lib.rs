// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod batch;
pub mod episode;
pub mod error;
pub mod feed;
pub mod http;
pub mod logging;
pub mod progress;
pub mod retry;
pub mod session;

// Re-export main types for convenience
pub use batch::{BatchReport, DEFAULT_OUTPUT_DIR, DownloadOptions, DownloadOutcome, download_all};
pub use episode::{DownloadContext, download_episode, episode_filename, sanitize_title};
pub use error::{BatchError, DownloadError, FeedError};
pub use feed::{Enclosure, Episode, Feed, is_url, load_feed, parse_feed};
pub use http::{HttpClient, HttpResponse, REQUEST_TIMEOUT, ReqwestClient};
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter};
pub use retry::{IsRetryable, RetryPolicy};
pub use session::Session;
