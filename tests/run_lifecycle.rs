//! Integration tests for a full check: load feeds, fetch over HTTP,
//! reconcile, persist, and check again.
//!
//! Each test gets its own temp directory for the feeds file and its own
//! mock servers, so tests are isolated and can run in parallel.

use std::path::PathBuf;
use std::time::Duration;

use pretty_assertions::assert_eq;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use vigil::feed;
use vigil::reconcile::{self, FaultKind, Watermark};
use vigil::store::{self, FeedConfig, FeedList};

const TIMEOUT: Duration = Duration::from_secs(30);

fn test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("vigil_lifecycle_{name}"));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn dated_rss() -> &'static str {
    r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Dated Blog</title>
    <link>https://dated.example.com</link>
    <item><title>Post3</title><pubDate>Wed, 03 Jan 2024 00:00:00 GMT</pubDate></item>
    <item><title>Post2</title><pubDate>Tue, 02 Jan 2024 00:00:00 GMT</pubDate></item>
    <item><title>Post1</title><pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate></item>
</channel></rss>"#
}

fn undated_rss() -> &'static str {
    r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Undated Comic</title>
    <item><title>Post4</title></item>
    <item><title>Post3</title></item>
    <item><title>Post2</title></item>
    <item><title>Post1</title></item>
</channel></rss>"#
}

async fn serve(body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body.to_string())
                .insert_header("Content-Type", "application/xml"),
        )
        .mount(&server)
        .await;
    server
}

async fn serve_status(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

// ============================================================================
// Full check lifecycle
// ============================================================================

#[tokio::test]
async fn test_check_reconciles_fetches_and_persists() {
    let dir = test_dir("full_check");
    let path = dir.join("feeds.json");

    let dated = serve(dated_rss()).await;
    let undated = serve(undated_rss()).await;
    let broken = serve_status(404).await;

    let stuck = Watermark::Title("stuck".into());
    let list = FeedList {
        feeds: vec![
            FeedConfig {
                watermark: Watermark::Timestamp("2024-01-01T00:00:00Z".parse().unwrap()),
                ..FeedConfig::new(format!("{}/feed", dated.uri()))
            },
            FeedConfig {
                watermark: Watermark::Title("Post2".into()),
                ..FeedConfig::new(format!("{}/feed", undated.uri()))
            },
            FeedConfig {
                watermark: stuck.clone(),
                ..FeedConfig::new(format!("{}/feed", broken.uri()))
            },
        ],
        last_check: None,
    };
    store::save(&path, &list).unwrap();

    // A check, end to end: load, fetch, reconcile, persist.
    let mut list = store::load(&path).unwrap();
    let client = reqwest::Client::new();
    let fetched = feed::fetch_all(&client, &list.feeds, 4, TIMEOUT).await;
    let result = reconcile::run(&mut list.feeds, fetched, 10);

    // Dated feed: Post3 and Post2 are past the watermark. Undated feed:
    // Post4 and Post3 precede the remembered title.
    assert_eq!(result.total_new, 4);
    assert_eq!(result.heading, "There are 4 new entries in all your feeds.");
    assert_eq!(
        result.summaries,
        vec![
            " } 2 new entries in Dated Blog.",
            " } 2 new entries in Undated Comic.",
        ]
    );
    assert_eq!(result.entry_lists[0], "Dated Blog\n  Post3\n  Post2");

    // The broken feed faulted without polluting the report.
    assert_eq!(result.faults.len(), 1);
    assert_eq!(result.faults[0].feed_index, 2);
    assert_eq!(result.faults[0].kind, FaultKind::FetchFailed);

    store::save(&path, &list).unwrap();

    // Reload: watermarks advanced for the healthy feeds only.
    let reloaded = store::load(&path).unwrap();
    assert_eq!(
        reloaded.feeds[0].watermark,
        Watermark::Timestamp("2024-01-03T00:00:00Z".parse().unwrap())
    );
    assert_eq!(reloaded.feeds[1].watermark, Watermark::Title("Post4".into()));
    assert_eq!(reloaded.feeds[2].watermark, stuck);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_second_check_is_quiet() {
    let dir = test_dir("second_check");
    let path = dir.join("feeds.json");

    let server = serve(dated_rss()).await;

    let list = FeedList {
        feeds: vec![FeedConfig::new(format!("{}/feed", server.uri()))],
        last_check: None,
    };
    store::save(&path, &list).unwrap();

    let client = reqwest::Client::new();

    // First check: everything is new.
    let mut list = store::load(&path).unwrap();
    let fetched = feed::fetch_all(&client, &list.feeds, 4, TIMEOUT).await;
    let first = reconcile::run(&mut list.feeds, fetched, 10);
    assert_eq!(first.total_new, 3);
    store::save(&path, &list).unwrap();

    // Second check against an unchanged feed: nothing to report.
    let mut list = store::load(&path).unwrap();
    let fetched = feed::fetch_all(&client, &list.feeds, 4, TIMEOUT).await;
    let second = reconcile::run(&mut list.feeds, fetched, 10);

    assert_eq!(second.total_new, 0);
    assert_eq!(
        second.heading,
        "There are no new entries in any of your feeds."
    );
    assert!(second.summaries.is_empty());
    assert!(second.entry_lists.is_empty());

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_metadata_refresh_round_trips() {
    let dir = test_dir("metadata");
    let path = dir.join("feeds.json");

    let server = serve(dated_rss()).await;

    // A bare URL with no cached title or home page.
    let list = FeedList {
        feeds: vec![FeedConfig::new(format!("{}/feed", server.uri()))],
        last_check: None,
    };
    store::save(&path, &list).unwrap();

    let client = reqwest::Client::new();
    let mut list = store::load(&path).unwrap();
    let fetched = feed::fetch_all(&client, &list.feeds, 4, TIMEOUT).await;
    reconcile::run(&mut list.feeds, fetched, 10);
    store::save(&path, &list).unwrap();

    let reloaded = store::load(&path).unwrap();
    assert_eq!(reloaded.feeds[0].title, "Dated Blog");
    assert_eq!(
        reloaded.feeds[0].home_url.as_deref(),
        Some("https://dated.example.com")
    );

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_cap_overflow_in_report() {
    let dir = test_dir("cap_overflow");
    let path = dir.join("feeds.json");

    let server = serve(undated_rss()).await;

    let list = FeedList {
        feeds: vec![FeedConfig::new(format!("{}/feed", server.uri()))],
        last_check: None,
    };
    store::save(&path, &list).unwrap();

    let client = reqwest::Client::new();
    let mut list = store::load(&path).unwrap();
    let fetched = feed::fetch_all(&client, &list.feeds, 4, TIMEOUT).await;
    let result = reconcile::run(&mut list.feeds, fetched, 2);

    // All four entries counted, only two shown.
    assert_eq!(result.total_new, 4);
    assert_eq!(
        result.entry_lists,
        vec!["Undated Comic\n  Post4\n  Post3\n  ...and 2 more."]
    );

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_malformed_feed_is_isolated() {
    let dir = test_dir("malformed");
    let path = dir.join("feeds.json");

    let good = serve(dated_rss()).await;
    let bad = serve("<html>definitely not a feed</html>").await;

    let list = FeedList {
        feeds: vec![
            FeedConfig::new(format!("{}/feed", bad.uri())),
            FeedConfig::new(format!("{}/feed", good.uri())),
        ],
        last_check: None,
    };
    store::save(&path, &list).unwrap();

    let client = reqwest::Client::new();
    let mut list = store::load(&path).unwrap();
    let fetched = feed::fetch_all(&client, &list.feeds, 4, TIMEOUT).await;
    let result = reconcile::run(&mut list.feeds, fetched, 10);

    assert_eq!(result.faults.len(), 1);
    assert_eq!(result.faults[0].feed_index, 0);
    assert_eq!(result.faults[0].kind, FaultKind::NotAFeed);

    // The healthy feed still reconciled in full.
    assert_eq!(result.total_new, 3);
    assert_eq!(list.feeds[0].watermark, Watermark::None);
    assert_eq!(
        list.feeds[1].watermark,
        Watermark::Timestamp("2024-01-03T00:00:00Z".parse().unwrap())
    );

    std::fs::remove_dir_all(&dir).ok();
}
