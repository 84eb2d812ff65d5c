//! Fetcher tests against a mock HTTP server

use motto_harvest::crawler::{build_http_client, Charset, FetchError, Fetcher, RetryPolicy};
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DEFAULT_ORDER: [Charset; 3] = [Charset::Gb2312, Charset::Utf8, Charset::Gbk];

fn fetcher(attempts: u32) -> Fetcher {
    Fetcher::new(
        build_http_client("TestBot/1.0").unwrap(),
        DEFAULT_ORDER.to_vec(),
        RetryPolicy::new(attempts, Duration::from_millis(1)),
    )
}

fn gbk_bytes(text: &str) -> Vec<u8> {
    let (bytes, _, had_errors) = encoding_rs::GBK.encode(text);
    assert!(!had_errors);
    bytes.into_owned()
}

#[tokio::test]
async fn test_gb2312_page_is_decoded() {
    let server = MockServer::start().await;
    let html = r#"<div class="content"><p>一、前进</p></div>"#;

    Mock::given(method("GET"))
        .and(path("/lizhi/1.html"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(gbk_bytes(html))
                .insert_header("content-type", "text/html; charset=gb2312"),
        )
        .mount(&server)
        .await;

    let page = fetcher(1)
        .fetch(&format!("{}/lizhi/1.html", server.uri()))
        .await
        .unwrap();

    assert_eq!(page.html, html);
    assert_eq!(page.charset, Charset::Gb2312);
}

#[tokio::test]
async fn test_utf8_page_is_decoded() {
    let server = MockServer::start().await;
    let html = "<p>二、坚持</p>";

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(html.as_bytes().to_vec()))
        .mount(&server)
        .await;

    let page = fetcher(1)
        .fetch(&format!("{}/", server.uri()))
        .await
        .unwrap();

    assert_eq!(page.html, html);
    assert_eq!(page.charset, Charset::Utf8);
}

#[tokio::test]
async fn test_user_agent_header_is_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("user-agent", "TestBot/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    assert!(fetcher(1).fetch(&format!("{}/", server.uri())).await.is_ok());
}

#[tokio::test]
async fn test_non_200_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let err = fetcher(5)
        .fetch(&format!("{}/", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Http { status: 500, .. }));
}

#[tokio::test]
async fn test_undecodable_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xFE, 0xFF]))
        .mount(&server)
        .await;

    let err = fetcher(1)
        .fetch(&format!("{}/", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Decode { .. }));
}

#[tokio::test]
async fn test_connection_refused_is_retried_then_surfaced() {
    // Grab a free port and release it so nothing is listening there
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    // Three attempts with two 100ms pauses between them
    let fetcher = Fetcher::new(
        build_http_client("TestBot/1.0").unwrap(),
        DEFAULT_ORDER.to_vec(),
        RetryPolicy::new(3, Duration::from_millis(100)),
    );

    let started = Instant::now();
    let err = fetcher
        .fetch(&format!("http://127.0.0.1:{}/", port))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Network { .. }));
    assert!(
        started.elapsed() >= Duration::from_millis(200),
        "gave up after {:?}, before the retries ran",
        started.elapsed()
    );
}
