//! Test utilities and helper functions for the redirect recorder test suite

use anyhow::Result;
use mockito::{Mock, Server};
use redirect_recorder::config::CrawlConfig;
use redirect_recorder::crawl_events::CrawlEvent;
use tempfile::TempDir;

/// Creates a temporary directory for test output
#[allow(dead_code)]
pub fn create_test_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test HTML document with specified head extras and body
#[allow(dead_code)]
pub fn create_test_html(title: &str, head: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    {head}
</head>
<body>
    {body}
</body>
</html>"#
    )
}

/// Sets up a mock HTTP server with predefined responses
#[allow(dead_code)]
pub async fn setup_mock_server() -> Result<mockito::ServerGuard> {
    let server = Server::new_async().await;
    Ok(server)
}

/// Creates a mock endpoint that returns HTML content
#[allow(dead_code)]
pub fn create_html_mock(server: &mut Server, path: &str, html: &str) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(html)
        .create()
}

/// Creates a mock endpoint that returns a redirect
#[allow(dead_code)]
pub fn create_redirect_mock(server: &mut Server, from: &str, to: &str) -> Mock {
    server
        .mock("GET", from)
        .with_status(301)
        .with_header("location", to)
        .create()
}

/// Helper to create test URLs
#[allow(dead_code)]
pub fn test_url(server: &Server, path: &str) -> String {
    format!("{}{}", server.url(), path)
}

/// Whether a Chrome/Chromium binary can be found on this machine
#[allow(dead_code)]
pub fn browser_available() -> bool {
    redirect_recorder::find_browser_executable(None).is_ok()
}

/// Config for crawling local fixtures: short windows, local link mode
#[allow(dead_code)]
pub fn create_test_config(start_url: &str, seconds: u64) -> CrawlConfig {
    CrawlConfig::builder()
        .start_url(start_url)
        .seconds(seconds)
        .settle_window_ms(1_000)
        .click_wait_ms(3_000)
        .shutdown_grace_ms(200)
        .follow_local_links(true)
        .build()
        .expect("Failed to create test config")
}

/// (kind, url, frame id) triples, for compact log assertions
#[allow(dead_code)]
pub fn summarize(events: &[CrawlEvent]) -> Vec<(&'static str, String, u32)> {
    events
        .iter()
        .map(|event| {
            let kind = if event.is_navigation() {
                "navigation"
            } else {
                "request"
            };
            (kind, event.url().to_string(), event.frame_id())
        })
        .collect()
}

/// Serve `/` after `delay` with a page linking to `/next`, and `/next` at once
///
/// mockito answers immediately, so slow responses get a bare listener.
#[allow(dead_code)]
pub fn spawn_slow_seed_server(delay: std::time::Duration) -> Result<String> {
    use std::io::{BufRead, BufReader, Write};

    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let base = format!("http://{}", listener.local_addr()?);
    let next = format!("{base}/next");

    std::thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let next = next.clone();
            std::thread::spawn(move || {
                let mut reader = BufReader::new(&stream);
                let mut request_line = String::new();
                if reader.read_line(&mut request_line).is_err() {
                    return;
                }
                let mut header = String::new();
                while reader.read_line(&mut header).is_ok_and(|n| n > 2) {
                    header.clear();
                }

                let path = request_line.split_whitespace().nth(1).unwrap_or("/");
                let (status, body) = match path {
                    "/" => {
                        std::thread::sleep(delay);
                        let link = format!(r#"<a href="{next}">next</a>"#);
                        ("200 OK", create_test_html("slow", "", &link))
                    }
                    "/next" => ("200 OK", create_test_html("next", "", "end")),
                    _ => ("404 Not Found", String::new()),
                };
                let response = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: text/html\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = (&stream).write_all(response.as_bytes());
            });
        }
    });

    Ok(format!("{base}/"))
}
