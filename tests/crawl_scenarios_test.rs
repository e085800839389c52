//! End-to-end crawls against local fixtures
//!
//! These drive a real headless Chrome and are ignored by default:
//! `cargo test -- --ignored` with Chrome installed (or `CHROMIUM_PATH` set).

use redirect_recorder::crawl_events::CrawlEvent;
use redirect_recorder::{Crawler, RedirectCrawler};

mod common;
use common::{
    create_html_mock, create_redirect_mock, create_test_config, create_test_html,
    setup_mock_server, summarize, test_url,
};

async fn crawl(start_url: &str, seconds: u64) -> Vec<CrawlEvent> {
    let config = create_test_config(start_url, seconds);
    RedirectCrawler::new(config)
        .crawl()
        .await
        .expect("crawl should deliver a log")
}

#[tokio::test]
#[ignore = "needs a local Chrome"]
async fn test_iframe_without_redirect() {
    assert!(common::browser_available(), "no Chrome/Chromium found");
    let mut server = setup_mock_server().await.unwrap();
    let seed = test_url(&server, "/seed");
    let frame = test_url(&server, "/frame");

    let _seed = create_html_mock(
        &mut server,
        "/seed",
        &create_test_html("seed", "", r#"<iframe src="/frame"></iframe>"#),
    );
    let _frame = create_html_mock(
        &mut server,
        "/frame",
        &create_test_html("frame", "", "<p>framed</p>"),
    );

    let events = crawl(&seed, 20).await;
    let log = summarize(&events);

    assert_eq!(log.len(), 3, "{log:?}");
    assert_eq!(log[0], ("navigation", seed.clone(), 1));
    assert_eq!(log[1], ("request", seed.clone(), 1));
    assert_eq!(log[2].0, "request");
    assert_eq!(log[2].1, frame);
    assert_ne!(log[2].2, 1, "the iframe gets its own frame id");

    match &events[2] {
        CrawlEvent::Request { is_i_frame, .. } => assert!(is_i_frame),
        other => panic!("expected a request, got {other:?}"),
    }
}

#[tokio::test]
#[ignore = "needs a local Chrome"]
async fn test_server_redirect_chain() {
    assert!(common::browser_available(), "no Chrome/Chromium found");
    let mut server = setup_mock_server().await.unwrap();
    let url1 = test_url(&server, "/one");
    let url2 = test_url(&server, "/two");
    let url3 = test_url(&server, "/three");

    let _one = create_redirect_mock(&mut server, "/one", &url2);
    let _two = create_redirect_mock(&mut server, "/two", &url3);
    let _three = create_html_mock(&mut server, "/three", &create_test_html("end", "", "done"));

    let events = crawl(&url1, 20).await;
    let log = summarize(&events);

    assert_eq!(
        log,
        vec![
            ("navigation", url1.clone(), 1),
            ("request", url1, 1),
            ("request", url2, 1),
            ("request", url3, 1),
        ]
    );

    let continuations: Vec<bool> = events
        .iter()
        .filter_map(|event| match event {
            CrawlEvent::Request {
                is_redirect_continuation,
                ..
            } => Some(*is_redirect_continuation),
            CrawlEvent::Navigation { .. } => None,
        })
        .collect();
    assert_eq!(continuations, vec![false, true, true]);
}

#[tokio::test]
#[ignore = "needs a local Chrome"]
async fn test_manual_link_click() {
    assert!(common::browser_available(), "no Chrome/Chromium found");
    let mut server = setup_mock_server().await.unwrap();
    let seed = test_url(&server, "/seed");
    let next = test_url(&server, "/next");

    let _seed = create_html_mock(
        &mut server,
        "/seed",
        &create_test_html("seed", "", r#"<a href="/next" target="_blank">continue</a>"#),
    );
    let _next = create_html_mock(&mut server, "/next", &create_test_html("next", "", "end"));

    let events = crawl(&seed, 30).await;
    let log = summarize(&events);

    assert_eq!(
        log,
        vec![
            ("navigation", seed.clone(), 1),
            ("request", seed, 1),
            ("navigation", next.clone(), 1),
            ("request", next, 1),
        ]
    );
}

#[tokio::test]
#[ignore = "needs a local Chrome"]
async fn test_rewritten_link_records_resolved_url() {
    assert!(common::browser_available(), "no Chrome/Chromium found");
    let mut server = setup_mock_server().await.unwrap();
    let seed = test_url(&server, "/seed");
    let shown = test_url(&server, "/shown");
    let actual = test_url(&server, "/actual");

    let script = r#"<script>
        document.addEventListener("click", (e) => {
            const a = e.target.closest("a");
            if (a) { e.preventDefault(); location.href = "/actual"; }
        });
    </script>"#;
    let _seed = create_html_mock(
        &mut server,
        "/seed",
        &create_test_html("seed", script, r#"<a href="/shown">go</a>"#),
    );
    let _actual = create_html_mock(&mut server, "/actual", &create_test_html("a", "", "end"));

    let events = crawl(&seed, 30).await;
    match &events[2] {
        CrawlEvent::Navigation {
            requested_url,
            resolved_url,
            ..
        } => {
            assert_eq!(*requested_url, shown);
            assert_eq!(resolved_url.as_deref(), Some(actual.as_str()));
        }
        other => panic!("expected the click navigation, got {other:?}"),
    }
    assert_eq!(events[3].url(), actual);
}

#[tokio::test]
#[ignore = "needs a local Chrome"]
async fn test_small_popup_is_closed_unlogged() {
    assert!(common::browser_available(), "no Chrome/Chromium found");
    let mut server = setup_mock_server().await.unwrap();
    let seed = test_url(&server, "/seed");

    let script = r#"<script>
        setTimeout(() => window.open("/popup", "popup", "width=300,height=200"), 300);
    </script>"#;
    let _seed = create_html_mock(&mut server, "/seed", &create_test_html("seed", script, ""));
    let _popup = create_html_mock(&mut server, "/popup", &create_test_html("popup", "", "ad"));

    let events = crawl(&seed, 20).await;
    assert_eq!(
        summarize(&events),
        vec![("navigation", seed.clone(), 1), ("request", seed, 1)]
    );
}

#[tokio::test]
#[ignore = "needs a local Chrome"]
async fn test_full_size_tab_is_merged_into_main_lineage() {
    assert!(common::browser_available(), "no Chrome/Chromium found");
    let mut server = setup_mock_server().await.unwrap();
    let seed = test_url(&server, "/seed");
    let tab = test_url(&server, "/tab");

    let script = r#"<script>
        setTimeout(() => window.open("/tab"), 300);
    </script>"#;
    let _seed = create_html_mock(&mut server, "/seed", &create_test_html("seed", script, ""));
    let _tab = create_html_mock(&mut server, "/tab", &create_test_html("tab", "", "landing"));

    let events = crawl(&seed, 20).await;
    let navigations: Vec<_> = events.iter().filter(|e| e.is_navigation()).collect();

    assert_eq!(navigations.len(), 2, "{:?}", summarize(&events));
    assert_eq!(navigations[1].url(), tab);
    assert_eq!(navigations[1].frame_id(), navigations[0].frame_id());
}

#[tokio::test]
#[ignore = "needs a local Chrome"]
async fn test_deadline_ends_a_busy_page() {
    assert!(common::browser_available(), "no Chrome/Chromium found");
    let mut server = setup_mock_server().await.unwrap();
    let seed = test_url(&server, "/seed");

    // Reloads faster than the settle window, so only the deadline can end the run
    let head = r#"<meta http-equiv="refresh" content="0.5">"#;
    let _seed = create_html_mock(&mut server, "/seed", &create_test_html("seed", head, ""));

    let started = std::time::Instant::now();
    let events = crawl(&seed, 3).await;
    assert!(started.elapsed() < std::time::Duration::from_secs(20));

    assert!(events[0].is_navigation());
    assert!(events.len() >= 3, "{:?}", summarize(&events));
    assert!(events[1..].iter().all(CrawlEvent::is_request));
}

#[tokio::test]
#[ignore = "needs a local Chrome"]
async fn test_link_to_unreachable_host_ends_the_run_early() {
    assert!(common::browser_available(), "no Chrome/Chromium found");
    let mut server = setup_mock_server().await.unwrap();
    let seed = test_url(&server, "/seed");
    let dead = "http://no-such-host.invalid/landing";

    let _seed = create_html_mock(
        &mut server,
        "/seed",
        &create_test_html("seed", "", &format!(r#"<a href="{dead}">gone</a>"#)),
    );

    let started = std::time::Instant::now();
    let events = crawl(&seed, 30).await;
    assert!(
        started.elapsed() < std::time::Duration::from_secs(20),
        "the error page should settle instead of idling until the deadline"
    );

    match &events[2] {
        CrawlEvent::Navigation {
            requested_url,
            resolved_url,
            ..
        } => {
            assert_eq!(requested_url.as_str(), dead);
            assert_eq!(*resolved_url, None);
        }
        other => panic!("expected the click navigation, got {other:?}"),
    }
    assert!(events.iter().all(|event| !event.url().starts_with("chrome-error:")));
}

#[tokio::test]
#[ignore = "needs a local Chrome"]
async fn test_slow_seed_does_not_end_the_run() {
    assert!(common::browser_available(), "no Chrome/Chromium found");
    // Slower than the click wait of the test config
    let seed = common::spawn_slow_seed_server(std::time::Duration::from_secs(5)).unwrap();
    let next = format!("{seed}next");

    let events = crawl(&seed, 30).await;
    let navigations: Vec<_> = events.iter().filter(|e| e.is_navigation()).collect();

    assert_eq!(navigations.len(), 2, "{:?}", summarize(&events));
    assert_eq!(navigations[0].url(), seed);
    assert_eq!(navigations[1].url(), next);
}
