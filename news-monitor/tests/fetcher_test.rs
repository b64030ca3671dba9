mod common;

use common::init_tracing;
use news_monitor::{FeedFetch, FeedSource, FetchConfig, FetchError, Fetcher};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const FEED: &str = r#"<?xml version="1.0"?><rss version="2.0"><channel><title>Local</title><link>http://localhost</link><description>d</description><item><title>Wagner leaves Bangui</title><link>http://localhost/a</link><guid>a</guid></item></channel></rss>"#;

fn small_config() -> FetchConfig {
    FetchConfig {
        timeout_seconds: 1,
        max_feed_size_mb: 1,
        ..FetchConfig::default()
    }
}

/// Answers a single request with `response`, then closes the connection.
async fn serve_once(response: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let _ = socket.write_all(&response).await;
            let _ = socket.shutdown().await;
        }
    });
    format!("http://{}/feed.xml", addr)
}

/// Accepts a connection and never answers.
async fn serve_nothing() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        }
    });
    format!("http://{}/feed.xml", addr)
}

fn response(status_line: &str, headers: &str, body: &[u8]) -> Vec<u8> {
    let mut out = format!("HTTP/1.1 {status_line}\r\n{headers}Connection: close\r\n\r\n").into_bytes();
    out.extend_from_slice(body);
    out
}

#[tokio::test]
async fn serves_entries_from_a_local_feed() {
    init_tracing();

    let body = FEED.as_bytes();
    let url = serve_once(response(
        "200 OK",
        &format!("Content-Type: application/rss+xml\r\nContent-Length: {}\r\n", body.len()),
        body,
    ))
    .await;

    let fetcher = Fetcher::new(small_config()).unwrap();
    let entries = fetcher.fetch(&FeedSource::new("local", url)).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title.as_deref(), Some("Wagner leaves Bangui"));
}

#[tokio::test]
async fn server_error_maps_to_status() {
    let url = serve_once(response("500 Internal Server Error", "Content-Length: 0\r\n", b"")).await;

    let fetcher = Fetcher::new(small_config()).unwrap();
    let result = fetcher.fetch_body(&url).await;
    assert!(
        matches!(result, Err(FetchError::Status { status: 500, .. })),
        "got {result:?}"
    );
}

#[tokio::test]
async fn declared_length_over_limit_is_too_large() {
    let size = 2 * 1024 * 1024;
    let body = vec![b'x'; size];
    let url = serve_once(response("200 OK", &format!("Content-Length: {size}\r\n"), &body)).await;

    let fetcher = Fetcher::new(small_config()).unwrap();
    match fetcher.fetch_body(&url).await {
        Err(FetchError::TooLarge { size_bytes, limit_bytes }) => {
            assert_eq!(size_bytes, size as u64);
            assert_eq!(limit_bytes, 1024 * 1024);
        }
        other => panic!("expected TooLarge, got {other:?}"),
    }
}

#[tokio::test]
async fn undeclared_body_over_limit_is_too_large() {
    let size = 1024 * 1024 + 512 * 1024;
    let body = vec![b'x'; size];
    let url = serve_once(response("200 OK", "", &body)).await;

    let fetcher = Fetcher::new(small_config()).unwrap();
    match fetcher.fetch_body(&url).await {
        Err(FetchError::TooLarge { size_bytes, limit_bytes }) => {
            assert_eq!(size_bytes, size as u64);
            assert_eq!(limit_bytes, 1024 * 1024);
        }
        other => panic!("expected TooLarge, got {other:?}"),
    }
}

#[tokio::test]
async fn silent_server_times_out() {
    let url = serve_nothing().await;

    let fetcher = Fetcher::new(small_config()).unwrap();
    let result = fetcher.fetch_body(&url).await;
    assert!(
        matches!(result, Err(FetchError::Timeout(d)) if d == Duration::from_secs(1)),
        "got {result:?}"
    );
}

#[tokio::test]
async fn non_http_endpoints_are_refused() {
    let fetcher = Fetcher::new(small_config()).unwrap();

    let result = fetcher.fetch_body("ftp://feeds.example.com/rss.xml").await;
    assert!(
        matches!(&result, Err(FetchError::UnsupportedScheme(scheme)) if scheme == "ftp"),
        "got {result:?}"
    );

    let result = fetcher.fetch_body("not a url").await;
    assert!(matches!(result, Err(FetchError::InvalidUrl(_))), "got {result:?}");
}
