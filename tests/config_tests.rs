//! Tests for the type-safe configuration builder and the entry payload

use redirect_recorder::config::{CrawlArgs, CrawlConfig, ValidationError, Viewport};
use std::path::PathBuf;
use std::time::Duration;

mod common;

#[test]
fn test_builder_requires_start_url() {
    // This should not compile if uncommented - testing compile-time guarantees
    // let config = CrawlConfig::builder().build();

    // This SHOULD compile - the required field is provided
    let config = CrawlConfig::builder()
        .start_url("https://example.com")
        .build()
        .unwrap();

    assert_eq!(config.start_url(), "https://example.com");
}

#[test]
fn test_builder_optional_fields_have_defaults() {
    let config = CrawlConfig::builder()
        .start_url("https://example.com")
        .build()
        .unwrap();

    assert_eq!(config.seconds(), 240);
    assert_eq!(config.deadline(), Duration::from_secs(240));
    assert!(config.headless());
    assert!(!config.debug());
    assert_eq!(config.browser_executable_path(), None);
    assert_eq!(config.settle_window(), Duration::from_millis(3_000));
    assert_eq!(config.click_wait(), Duration::from_millis(6_000));
    assert_eq!(config.viewport(), Viewport::new(1280, 2048));
    assert_eq!(config.full_page_min(), Viewport::new(800, 600));
    assert!(!config.follow_local_links());
    assert!(!config.block_images());
    assert_eq!(config.bucket(), "com.brave.research.redirections");
    assert_eq!(config.trigger_endpoint(), None);
    assert!(config.chrome_data_dir().is_none());
}

#[test]
fn test_builder_with_all_optional_fields() {
    let config = CrawlConfig::builder()
        .start_url("https://example.com")
        .seconds(30)
        .debug(true)
        .browser_executable_path(Some("/usr/bin/chromium"))
        .settle_window_ms(500)
        .click_wait_ms(2_000)
        .click_poll_interval_ms(50)
        .shutdown_grace_ms(0)
        .viewport(1024, 768)
        .full_page_min(640, 480)
        .follow_local_links(true)
        .block_images(true)
        .bucket("test-bucket")
        .trigger_endpoint(Some("http://localhost:9000/trigger".to_string()))
        .build()
        .unwrap();

    assert_eq!(config.seconds(), 30);
    assert!(config.debug());
    assert!(!config.headless(), "debug mode shows the browser");
    assert_eq!(
        config.browser_executable_path(),
        Some(PathBuf::from("/usr/bin/chromium").as_path())
    );
    assert_eq!(config.settle_window(), Duration::from_millis(500));
    assert_eq!(config.click_wait(), Duration::from_secs(2));
    assert_eq!(config.click_poll_interval(), Duration::from_millis(50));
    assert_eq!(config.shutdown_grace(), Duration::ZERO);
    assert_eq!(config.viewport(), Viewport::new(1024, 768));
    assert_eq!(config.full_page_min(), Viewport::new(640, 480));
    assert!(config.follow_local_links());
    assert!(config.block_images());
    assert_eq!(config.bucket(), "test-bucket");
    assert_eq!(
        config.trigger_endpoint(),
        Some("http://localhost:9000/trigger")
    );
}

#[test]
fn test_start_url_without_scheme_defaults_to_https() {
    let config = CrawlConfig::builder()
        .start_url("example.com/landing")
        .build()
        .unwrap();
    assert_eq!(config.start_url(), "https://example.com/landing");

    let config = CrawlConfig::builder()
        .start_url("http://example.com")
        .build()
        .unwrap();
    assert_eq!(config.start_url(), "http://example.com");
}

#[test]
fn test_builder_rejects_out_of_range_seconds() {
    for seconds in [0, 301, 10_000] {
        let err = CrawlConfig::builder()
            .start_url("https://example.com")
            .seconds(seconds)
            .build()
            .unwrap_err();
        assert!(
            matches!(
                err.downcast_ref::<ValidationError>(),
                Some(ValidationError::SecondsOutOfRange(_))
            ),
            "seconds={seconds} gave {err:#}"
        );
    }

    assert!(
        CrawlConfig::builder()
            .start_url("https://example.com")
            .seconds(300)
            .build()
            .is_ok()
    );
}

#[test]
fn test_builder_rejects_blank_url() {
    let err = CrawlConfig::builder().start_url("   ").build().unwrap_err();
    assert_eq!(
        err.downcast_ref::<ValidationError>(),
        Some(&ValidationError::MissingUrl)
    );
}

#[test]
fn test_args_validation_contract() {
    assert_eq!(
        CrawlArgs::default().validate(),
        Err(ValidationError::MissingUrl)
    );
    assert_eq!(
        CrawlArgs::new("").validate(),
        Err(ValidationError::MissingUrl)
    );

    let mut args = CrawlArgs::new("https://example.com");
    assert_eq!(args.validate(), Ok(()));

    args.seconds = Some(0);
    assert_eq!(args.validate(), Err(ValidationError::SecondsOutOfRange(0)));
    args.seconds = Some(-5);
    assert_eq!(args.validate(), Err(ValidationError::SecondsOutOfRange(-5)));
    args.seconds = Some(301);
    assert_eq!(args.validate(), Err(ValidationError::SecondsOutOfRange(301)));
    args.seconds = Some(300);
    assert_eq!(args.validate(), Ok(()));
}

#[test]
fn test_args_into_config_carries_fields() {
    let args: CrawlArgs = serde_json::from_str(
        r#"{"url":"example.org","seconds":45,"debug":true,"bucket":"other"}"#,
    )
    .unwrap();
    let config = args.into_config().unwrap();

    assert_eq!(config.start_url(), "https://example.org");
    assert_eq!(config.seconds(), 45);
    assert!(config.debug());
    assert_eq!(config.bucket(), "other");
}

#[test]
fn test_args_carry_local_mode_and_trigger_options() {
    let args: CrawlArgs = serde_json::from_str(
        r#"{"url":"http://127.0.0.1:4000/","followLocalLinks":true,"blockImages":true,"triggerEndpoint":"http://127.0.0.1:9000/hook"}"#,
    )
    .unwrap();
    let config = args.into_config().unwrap();

    assert!(config.follow_local_links());
    assert!(config.block_images());
    assert_eq!(config.trigger_endpoint(), Some("http://127.0.0.1:9000/hook"));
}

#[test]
fn test_args_without_url_fail_before_launch() {
    let args: CrawlArgs = serde_json::from_str(r#"{"seconds":10}"#).unwrap();
    let err = args.into_config().unwrap_err();
    assert_eq!(
        err.downcast_ref::<ValidationError>(),
        Some(&ValidationError::MissingUrl)
    );
}

#[test]
fn test_chrome_data_dir_is_opt_in() {
    let dir = common::create_test_dir().unwrap();
    let config = CrawlConfig::builder()
        .start_url("https://example.com")
        .build()
        .unwrap()
        .with_chrome_data_dir(dir.path().to_path_buf());
    assert_eq!(config.chrome_data_dir(), Some(&dir.path().to_path_buf()));
}
