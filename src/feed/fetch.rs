// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

use bytes::Bytes;
use url::Url;

use crate::error::FeedError;
use crate::http::HttpClient;

use super::parse::{Feed, parse_feed};

/// Fetch raw feed bytes from a URL (without parsing)
pub async fn fetch_feed_bytes<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
) -> Result<Bytes, FeedError> {
    client
        .get_bytes(url)
        .await
        .map_err(|e| FeedError::FetchFailed {
            url: url.to_string(),
            source: e,
        })
}

/// Read raw feed bytes from a local file (without parsing)
pub fn read_feed_file(path: &Path) -> Result<Vec<u8>, FeedError> {
    std::fs::read(path).map_err(|e| FeedError::FileReadFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Construct a file:// URL for a local file path, if it can be made absolute
pub fn file_path_to_url(path: &Path) -> Option<Url> {
    std::path::absolute(path)
        .ok()
        .and_then(|abs| Url::from_file_path(abs).ok())
}

/// Determine if a string is a URL or a file path
pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Load a feed from an HTTP(S) URL or a local file path.
///
/// A single attempt: unreachable hosts, error statuses and malformed
/// documents all come back as a [`FeedError`].
pub async fn load_feed<C: HttpClient + ?Sized>(client: &C, source: &str) -> Result<Feed, FeedError> {
    let source = source.trim();

    let feed = if is_url(source) {
        let feed_url = Url::parse(source)?;
        let bytes = fetch_feed_bytes(client, source).await?;
        parse_feed(&bytes, Some(&feed_url), source)?
    } else {
        let path = Path::new(source);
        let bytes = read_feed_file(path)?;
        parse_feed(&bytes, file_path_to_url(path).as_ref(), source)?
    };

    tracing::info!(
        source,
        title = %feed.title,
        episodes = feed.episode_count(),
        "Feed loaded"
    );

    Ok(feed)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::http::HttpResponse;

    struct StaticFeedClient {
        body: &'static str,
        calls: AtomicUsize,
    }

    impl StaticFeedClient {
        fn new(body: &'static str) -> Self {
            Self {
                body,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl HttpClient for StaticFeedClient {
        async fn get_bytes(&self, _url: &str) -> Result<Bytes, reqwest::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Bytes::from_static(self.body.as_bytes()))
        }

        async fn get_stream(&self, _url: &str) -> Result<HttpResponse, reqwest::Error> {
            unreachable!("feed loading never streams")
        }
    }

    const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Loaded Show</title>
    <item>
      <title>One</title>
      <enclosure url="https://example.com/one.mp3" length="3" type="audio/mpeg"/>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn is_url_detects_http() {
        assert!(is_url("http://example.com/feed.xml"));
        assert!(is_url("https://example.com/feed.xml"));
    }

    #[test]
    fn is_url_rejects_file_paths() {
        assert!(!is_url("/path/to/feed.xml"));
        assert!(!is_url("./feed.xml"));
        assert!(!is_url("feed.xml"));
    }

    #[tokio::test]
    async fn load_feed_fetches_urls_once() {
        let client = StaticFeedClient::new(FEED);

        let feed = load_feed(&client, "  https://example.com/feed.xml ")
            .await
            .unwrap();

        assert_eq!(feed.title, "Loaded Show");
        assert_eq!(feed.source, "https://example.com/feed.xml");
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn load_feed_reads_local_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FEED.as_bytes()).unwrap();

        let client = StaticFeedClient::new("");
        let feed = load_feed(&client, file.path().to_str().unwrap())
            .await
            .unwrap();

        assert_eq!(feed.episode_count(), 1);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn load_feed_reports_missing_files() {
        let client = StaticFeedClient::new("");
        let err = load_feed(&client, "/definitely/not/here.xml")
            .await
            .unwrap_err();

        assert!(matches!(err, FeedError::FileReadFailed { .. }));
    }

    #[tokio::test]
    async fn load_feed_reports_malformed_documents() {
        let client = StaticFeedClient::new("<html>oops</html>");
        let err = load_feed(&client, "https://example.com/feed.xml")
            .await
            .unwrap_err();

        assert!(matches!(err, FeedError::ParseFailed { .. }));
    }
}
