//! Integration tests for the raw socket transport
//!
//! These tests use wiremock to serve real HTTP over loopback and check that
//! the hand-rolled client frames, decodes and interprets what comes back.

use fakebook_crawler::config::Config;
use fakebook_crawler::crawler::{base_get, Fetcher};
use fakebook_crawler::http::{TcpTransport, Transport};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a plaintext transport aimed at the mock server
fn transport_for(server: &MockServer, chunk_size: usize) -> TcpTransport {
    let mut config = Config::default();
    config.server.host = server.address().ip().to_string();
    config.server.port = server.address().port();
    config.server.tls = false;
    config.crawler.read_chunk_size = chunk_size;
    TcpTransport::new(&config.server, &config.crawler).expect("Failed to build transport")
}

fn gzip(text: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

#[tokio::test]
async fn test_plain_response_framed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fakebook/"))
        .and(header("host", "localhost"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><p>home</p></html>"))
        .mount(&mock_server)
        .await;

    let transport = transport_for(&mock_server, 1000);
    let response = transport
        .send(&base_get("localhost", "/fakebook/"))
        .await
        .expect("send failed");

    assert_eq!(response.status(), 200);
    assert_eq!(response.body(), "<html><p>home</p></html>");
    assert_eq!(response.document(), "<html><p>home</p></html>");
}

#[tokio::test]
async fn test_body_larger_than_first_read() {
    let mock_server = MockServer::start().await;
    let body = format!("<html>{}</html>", "x".repeat(50_000));

    Mock::given(method("GET"))
        .and(path("/big/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.clone()))
        .mount(&mock_server)
        .await;

    let transport = transport_for(&mock_server, 64);
    let response = transport
        .send(&base_get("localhost", "/big/"))
        .await
        .expect("send failed");

    assert_eq!(response.body().len(), body.len());
    assert_eq!(response.body(), body);
}

#[tokio::test]
async fn test_gzip_body_decoded() {
    let mock_server = MockServer::start().await;
    let plain = "<html><h2 class='secret_flag'>FLAG: GZIPPED</h2></html>";

    Mock::given(method("GET"))
        .and(path("/zipped/"))
        .and(header("accept-encoding", "gzip"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-encoding", "gzip")
                .set_body_bytes(gzip(plain)),
        )
        .mount(&mock_server)
        .await;

    let transport = transport_for(&mock_server, 1000);
    let response = transport
        .send(&base_get("localhost", "/zipped/"))
        .await
        .expect("send failed");

    assert_eq!(response.body(), plain);
}

#[tokio::test]
async fn test_fetcher_suppresses_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new(Arc::new(transport_for(&mock_server, 1000)), 10, 0);
    let document = fetcher
        .fetch(&base_get("localhost", "/fakebook/404/"))
        .await
        .expect("fetch failed");

    assert_eq!(document, None);
}

#[tokio::test]
async fn test_fetcher_follows_redirect() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old/"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/new/"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>moved</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new(Arc::new(transport_for(&mock_server, 1000)), 10, 0);
    let document = fetcher
        .fetch(&base_get("localhost", "/old/"))
        .await
        .expect("fetch failed");

    assert_eq!(document.as_deref(), Some("<html>moved</html>"));
}

#[tokio::test]
async fn test_fetcher_retries_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/busy/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/busy/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ready</html>"))
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new(Arc::new(transport_for(&mock_server, 1000)), 10, 0);
    let document = fetcher
        .fetch(&base_get("localhost", "/busy/"))
        .await
        .expect("fetch failed");

    assert_eq!(document.as_deref(), Some("<html>ready</html>"));

    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received.len(), 3);
}
