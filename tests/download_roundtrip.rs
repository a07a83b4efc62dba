// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::time::Duration;

use bulkpod::{
    DownloadOptions, FeedError, NoopReporter, ReqwestClient, RetryPolicy, Session, download_all,
};
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn feed_xml(base: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Integration Show</title>
    <description>Served by a mock server</description>
    <item>
      <title>Episode 1: Hello?</title>
      <enclosure url="{base}/audio/ep1.mp3" length="5000" type="audio/mpeg"/>
    </item>
    <item>
      <title>Episode 2</title>
      <enclosure url="/audio/ep2.mp3" type="audio/mpeg"/>
    </item>
  </channel>
</rss>"#
    )
}

fn audio(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 256) as u8).collect()
}

fn quick_retries(dir: &std::path::Path) -> DownloadOptions {
    DownloadOptions {
        output_dir: dir.to_path_buf(),
        retry: RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(10),
        },
    }
}

async fn serve_feed(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed_xml(&server.uri())))
        .mount(server)
        .await;
}

#[tokio::test]
async fn downloads_are_byte_for_byte_copies() {
    let server = MockServer::start().await;
    let ep1 = audio(5000);
    let ep2 = audio(1);

    serve_feed(&server).await;
    Mock::given(method("GET"))
        .and(path("/audio/ep1.mp3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(ep1.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/audio/ep2.mp3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(ep2.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let client = ReqwestClient::new();
    let mut session = Session::new();
    session
        .load(&client, &format!("{}/feed.xml", server.uri()))
        .await
        .unwrap();

    let dir = tempdir().unwrap();
    let feed = session.feed().unwrap();
    let report = download_all(&client, feed, &quick_retries(dir.path()), NoopReporter::shared())
        .await
        .unwrap();

    assert_eq!(report.succeeded, 2);
    assert!(report.failed.is_empty());
    assert_eq!(
        std::fs::read(dir.path().join("Episode 1_ Hello_.mp3")).unwrap(),
        ep1
    );
    assert_eq!(std::fs::read(dir.path().join("Episode 2.mp3")).unwrap(), ep2);
}

#[tokio::test]
async fn server_errors_are_retried_then_reported() {
    let server = MockServer::start().await;

    serve_feed(&server).await;
    Mock::given(method("GET"))
        .and(path("/audio/ep1.mp3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(audio(64)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/audio/ep2.mp3"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let client = ReqwestClient::new();
    let mut session = Session::new();
    let feed = session
        .load(&client, &format!("{}/feed.xml", server.uri()))
        .await
        .unwrap();

    let dir = tempdir().unwrap();
    let report = download_all(&client, feed, &quick_retries(dir.path()), NoopReporter::shared())
        .await
        .unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, vec!["Episode 2".to_string()]);
    assert!(!dir.path().join("Episode 2.mp3").exists());
}

#[tokio::test]
async fn second_run_skips_everything() {
    let server = MockServer::start().await;

    serve_feed(&server).await;
    Mock::given(method("GET"))
        .and(path("/audio/ep1.mp3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(audio(10)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/audio/ep2.mp3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(audio(20)))
        .expect(1)
        .mount(&server)
        .await;

    let client = ReqwestClient::new();
    let mut session = Session::new();
    session
        .load(&client, &format!("{}/feed.xml", server.uri()))
        .await
        .unwrap();
    let feed = session.feed().unwrap();
    let dir = tempdir().unwrap();
    let options = quick_retries(dir.path());

    let first = download_all(&client, feed, &options, NoopReporter::shared())
        .await
        .unwrap();
    let second = download_all(&client, feed, &options, NoopReporter::shared())
        .await
        .unwrap();

    assert_eq!(first.succeeded, 2);
    assert_eq!(second.succeeded, 0);
    assert_eq!(second.skipped, 2);
    assert!(second.failed.is_empty());
}

#[tokio::test]
async fn missing_feed_is_rejected_without_touching_the_session() {
    let server = MockServer::start().await;
    serve_feed(&server).await;
    Mock::given(method("GET"))
        .and(path("/gone.xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = ReqwestClient::new();
    let mut session = Session::new();
    session
        .load(&client, &format!("{}/feed.xml", server.uri()))
        .await
        .unwrap();

    let err = session
        .load(&client, &format!("{}/gone.xml", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, FeedError::FetchFailed { .. }));
    assert_eq!(session.summary_line(), "Integration Show (2 episodes)");
}
