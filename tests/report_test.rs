//! Upload and trigger collaborators

use redirect_recorder::crawl_events::CrawlEvent;
use redirect_recorder::report::{self, FsObjectStore, ReportError, Trigger, TriggerPayload};
use std::time::Duration;

mod common;

fn sample_log() -> Vec<CrawlEvent> {
    vec![
        CrawlEvent::Navigation {
            timestamp: 1_700_000_000_000,
            frame_id: 1,
            requested_url: "https://seed.com/".to_string(),
            resolved_url: None,
            domain: Some("seed.com".to_string()),
        },
        CrawlEvent::Request {
            timestamp: 1_700_000_000_010,
            frame_id: 1,
            url: "https://seed.com/".to_string(),
            is_i_frame: false,
            is_redirect_continuation: false,
            domain: Some("seed.com".to_string()),
        },
    ]
}

#[tokio::test]
async fn test_record_stores_log_under_domain_key() {
    let dir = common::create_test_dir().unwrap();
    let store = FsObjectStore::new(dir.path());

    let key = report::record(&store, "https://www.seed.com/path", "research", sample_log())
        .await
        .unwrap();
    assert!(key.starts_with("seed.com_"), "{key}");
    assert!(key.ends_with(".json"));

    let stored = tokio::fs::read_to_string(dir.path().join("research").join(&key))
        .await
        .unwrap();
    let events: Vec<CrawlEvent> = serde_json::from_str(&stored).unwrap();
    assert_eq!(events, sample_log());

    let raw: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(raw[0]["kind"], "navigation");
    assert!(raw[0].get("resolvedUrl").is_none());
    assert_eq!(raw[1]["isIFrame"], false);
    assert_eq!(raw[1]["isRedirectContinuation"], false);
}

#[tokio::test]
async fn test_keys_are_unique_per_upload() {
    let dir = common::create_test_dir().unwrap();
    let store = FsObjectStore::new(dir.path());
    let first = report::record(&store, "https://seed.com/", "b", Vec::new())
        .await
        .unwrap();
    let second = report::record(&store, "https://seed.com/", "b", Vec::new())
        .await
        .unwrap();
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_url_without_domain_is_rejected() {
    let dir = common::create_test_dir().unwrap();
    let store = FsObjectStore::new(dir.path());
    let err = report::record(&store, "about:blank", "b", sample_log())
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::NoDomain(_)));
}

#[tokio::test]
async fn test_trigger_posts_key_and_debug_flag() {
    let mut server = common::setup_mock_server().await.unwrap();
    let mock = server
        .mock("POST", "/process")
        .match_body(mockito::Matcher::Json(serde_json::json!({
            "key": "seed.com_1234.json",
            "debug": true
        })))
        .with_status(202)
        .create_async()
        .await;

    let trigger = Trigger::new(common::test_url(&server, "/process"))
        .with_timeout(Duration::from_secs(5));
    trigger
        .send(&TriggerPayload {
            key: "seed.com_1234.json".to_string(),
            debug: true,
        })
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_fire_and_forget_swallows_failures() {
    let mut server = common::setup_mock_server().await.unwrap();
    let mock = server
        .mock("POST", "/process")
        .with_status(500)
        .create_async()
        .await;

    let trigger = Trigger::new(common::test_url(&server, "/process"));
    let handle = trigger.fire("seed.com_1.json".to_string(), false);
    handle.await.unwrap();
    mock.assert_async().await;

    let err = trigger
        .send(&TriggerPayload {
            key: "seed.com_1.json".to_string(),
            debug: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::TriggerStatus(500)));
}
