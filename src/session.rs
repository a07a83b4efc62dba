// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::error::FeedError;
use crate::feed::{Feed, load_feed};
use crate::http::HttpClient;

/// The feed the user is currently working with.
///
/// `None` means nothing has been loaded yet, which is different from a
/// loaded feed that happens to have no episodes.
#[derive(Debug, Default)]
pub struct Session {
    feed: Option<Feed>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a feed and make it the current one.
    ///
    /// On error the previously loaded feed, if any, stays in place.
    pub async fn load<C: HttpClient + ?Sized>(
        &mut self,
        client: &C,
        source: &str,
    ) -> Result<&Feed, FeedError> {
        let feed = load_feed(client, source).await?;
        Ok(self.replace(feed))
    }

    /// Make `feed` the current feed, dropping the old one
    pub fn replace(&mut self, feed: Feed) -> &Feed {
        self.feed.insert(feed)
    }

    pub fn clear(&mut self) {
        self.feed = None;
    }

    pub fn feed(&self) -> Option<&Feed> {
        self.feed.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.feed.is_some()
    }

    /// Episodes in the current feed, 0 when nothing is loaded
    pub fn episode_count(&self) -> usize {
        self.feed.as_ref().map_or(0, Feed::episode_count)
    }

    /// One-line description of the session for the main menu
    pub fn summary_line(&self) -> String {
        match &self.feed {
            Some(feed) => format!("{} ({} episodes)", feed.title, feed.episode_count()),
            None => "No RSS feed loaded.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::{Reply, ScriptedClient};

    const GOOD_URL: &str = "https://example.com/good.xml";
    const BAD_URL: &str = "https://example.com/bad.xml";
    const DOWN_URL: &str = "https://down.example.com/feed.xml";

    const GOOD_FEED: &[u8] = br#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Good Show</title>
    <item>
      <title>One</title>
      <enclosure url="https://example.com/one.mp3" length="3" type="audio/mpeg"/>
    </item>
    <item>
      <title>Two</title>
      <enclosure url="https://example.com/two.mp3" length="3" type="audio/mpeg"/>
    </item>
  </channel>
</rss>"#;

    const EMPTY_FEED: &[u8] = br#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Quiet Show</title></channel></rss>"#;

    fn client() -> ScriptedClient {
        ScriptedClient::new()
            .route(GOOD_URL, vec![Reply::ok(GOOD_FEED)])
            .route(BAD_URL, vec![Reply::ok(b"<html><body>Not a feed</body></html>")])
            .route("https://example.com/empty.xml", vec![Reply::ok(EMPTY_FEED)])
    }

    #[test]
    fn new_session_has_nothing_loaded() {
        let session = Session::new();

        assert!(!session.is_loaded());
        assert_eq!(session.episode_count(), 0);
        assert_eq!(session.summary_line(), "No RSS feed loaded.");
    }

    #[tokio::test]
    async fn load_replaces_current_feed() {
        let client = client();
        let mut session = Session::new();

        let feed = session.load(&client, GOOD_URL).await.unwrap();
        assert_eq!(feed.title, "Good Show");

        assert_eq!(session.episode_count(), 2);
        assert_eq!(session.summary_line(), "Good Show (2 episodes)");
    }

    #[tokio::test]
    async fn malformed_feed_leaves_session_untouched() {
        let client = client();
        let mut session = Session::new();

        assert!(session.load(&client, BAD_URL).await.is_err());
        assert!(!session.is_loaded());
        assert_eq!(session.episode_count(), 0);

        session.load(&client, GOOD_URL).await.unwrap();
        assert!(session.load(&client, BAD_URL).await.is_err());
        assert!(session.load(&client, DOWN_URL).await.is_err());

        assert_eq!(session.feed().map(|f| f.title.as_str()), Some("Good Show"));
        assert_eq!(session.episode_count(), 2);
    }

    #[tokio::test]
    async fn empty_feed_is_loaded_not_absent() {
        let client = client();
        let mut session = Session::new();

        session
            .load(&client, "https://example.com/empty.xml")
            .await
            .unwrap();

        assert!(session.is_loaded());
        assert_eq!(session.episode_count(), 0);
        assert_eq!(session.summary_line(), "Quiet Show (0 episodes)");
    }

    #[tokio::test]
    async fn clear_drops_the_feed() {
        let client = client();
        let mut session = Session::new();
        session.load(&client, GOOD_URL).await.unwrap();

        session.clear();

        assert!(session.feed().is_none());
    }
}
