//! Request admission and new-tab triage decisions

use chromiumoxide::cdp::browser_protocol::network::ResourceType;
use redirect_recorder::config::Viewport;
use redirect_recorder::crawl_engine::{Admission, NavigationProbe, TabDecision, admit, classify_tab};

const MAIN: Viewport = Viewport::new(1280, 2048);
const FULL_PAGE_MIN: Viewport = Viewport::new(800, 600);

#[test]
fn test_documents_are_the_only_logged_requests() {
    let url = "https://example.com/";
    assert_eq!(admit(url, &ResourceType::Document, false), Admission::Log);
    for resource in [
        ResourceType::Script,
        ResourceType::Stylesheet,
        ResourceType::Xhr,
        ResourceType::Fetch,
        ResourceType::Image,
        ResourceType::Media,
    ] {
        assert_eq!(admit(url, &resource, false), Admission::Continue, "{resource:?}");
    }
}

#[test]
fn test_decorative_resources_are_aborted() {
    let url = "https://fonts.example.com/a.woff2";
    assert_eq!(admit(url, &ResourceType::Font, false), Admission::Abort);
    assert_eq!(admit(url, &ResourceType::Image, true), Admission::Abort);
    assert_eq!(admit(url, &ResourceType::Image, false), Admission::Continue);
}

#[test]
fn test_non_http_requests_are_aborted_before_anything_else() {
    assert_eq!(
        admit("chrome-extension://abc/page.html", &ResourceType::Document, false),
        Admission::Abort
    );
    assert_eq!(
        admit("ws://example.com/socket", &ResourceType::WebSocket, false),
        Admission::Abort
    );
}

#[test]
fn test_tab_before_first_load_is_ignored() {
    assert_eq!(
        classify_tab(false, MAIN, Viewport::new(200, 100), FULL_PAGE_MIN),
        TabDecision::Ignore
    );
}

#[test]
fn test_full_size_tab_is_merged() {
    assert_eq!(classify_tab(true, MAIN, MAIN, FULL_PAGE_MIN), TabDecision::Merge);
    assert_eq!(
        classify_tab(true, MAIN, Viewport::new(800, 600), FULL_PAGE_MIN),
        TabDecision::Merge
    );
    assert_eq!(
        classify_tab(true, MAIN, Viewport::new(1920, 1080), FULL_PAGE_MIN),
        TabDecision::Merge
    );
}

#[test]
fn test_small_popup_is_closed() {
    assert_eq!(
        classify_tab(true, MAIN, Viewport::new(400, 300), FULL_PAGE_MIN),
        TabDecision::Close
    );
    // Wide but short is still a popup
    assert_eq!(
        classify_tab(true, MAIN, Viewport::new(1280, 599), FULL_PAGE_MIN),
        TabDecision::Close
    );
}

#[test]
fn test_click_probe_watches_the_host() {
    let probe = NavigationProbe::new("https://seed.com/landing", false);
    assert!(!probe.has_navigated("https://seed.com/landing#top"));
    assert!(!probe.has_navigated("https://seed.com/elsewhere"));
    assert!(probe.has_navigated("https://www.seed.com/landing"));
    assert!(probe.has_navigated("https://target.net/"));
}
