//! Integration tests for the HTTP fetcher
//!
//! These tests run `HttpFetcher` against wiremock servers to check request
//! headers, status handling and the login cookie flow.

use sumi_trawl::config::UserAgentConfig;
use sumi_trawl::crawler::{Credentials, Fetcher, HttpFetcher};
use sumi_trawl::TrawlError;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_fetcher() -> HttpFetcher {
    let config = UserAgentConfig {
        crawler_name: "TestTrawler".to_string(),
        crawler_version: "1.0".to_string(),
        contact_url: "https://example.com/about".to_string(),
        contact_email: "admin@example.com".to_string(),
    };
    HttpFetcher::new(&config, 5).expect("Failed to build fetcher")
}

fn credentials() -> Credentials {
    Credentials {
        username: "bot".to_string(),
        password: "secret".to_string(),
        username_field: "user".to_string(),
        password_field: "pass".to_string(),
    }
}

#[tokio::test]
async fn test_fetch_returns_body_and_sends_user_agent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header(
            "user-agent",
            "TestTrawler/1.0 (+https://example.com/about; admin@example.com)",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>hello</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let body = test_fetcher()
        .fetch(&format!("{}/page", mock_server.uri()))
        .await
        .expect("Fetch should succeed");

    assert_eq!(body, b"<html>hello</html>".to_vec());
}

#[tokio::test]
async fn test_fetch_error_status_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let url = format!("{}/broken", mock_server.uri());
    let result = test_fetcher().fetch(&url).await;

    match result {
        Err(TrawlError::HttpStatus { url: failed, status }) => {
            assert_eq!(failed, url);
            assert_eq!(status, 500);
        }
        other => panic!("Expected HttpStatus error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_host_is_an_http_error() {
    // Nothing listens on port 9 of localhost
    let result = test_fetcher().fetch("http://127.0.0.1:9/").await;
    assert!(matches!(result, Err(TrawlError::Http { .. })));
}

#[tokio::test]
async fn test_content_type_uses_head() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/pic.png"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/png"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let content_type = test_fetcher()
        .content_type(&format!("{}/pic.png", mock_server.uri()))
        .await
        .expect("HEAD should succeed");

    assert_eq!(content_type.as_deref(), Some("image/png"));
}

#[tokio::test]
async fn test_head_size_of_missing_resource_fails() {
    let mock_server = MockServer::start().await;

    let result = test_fetcher()
        .head_size(&format!("{}/missing.png", mock_server.uri()))
        .await;

    assert!(matches!(
        result,
        Err(TrawlError::HttpStatus { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_fetch_to_file_creates_directories() {
    let mock_server = MockServer::start().await;
    let media = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/pic.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3, 4]))
        .mount(&mock_server)
        .await;

    let dest = media.path().join("nested").join("pic.png");
    test_fetcher()
        .fetch_to_file(&format!("{}/pic.png", mock_server.uri()), &dest)
        .await
        .expect("Download should succeed");

    assert_eq!(std::fs::read(&dest).unwrap(), vec![1u8, 2, 3, 4]);
}

#[tokio::test]
async fn test_login_session_cookie_is_reused() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_string_contains("user=bot"))
        .and(body_string_contains("pass=secret"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "session=abc123; Path=/"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/private"))
        .and(header("cookie", "session=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("members only"))
        .mount(&mock_server)
        .await;

    let fetcher = test_fetcher();
    let private_url = format!("{}/private", mock_server.uri());

    // Without the session the private page is not served
    assert!(fetcher.fetch(&private_url).await.is_err());

    fetcher
        .start_authenticated_session(&credentials(), &format!("{}/login", mock_server.uri()))
        .await
        .expect("Login should succeed");

    let body = fetcher.fetch(&private_url).await.expect("Session fetch");
    assert_eq!(body, b"members only".to_vec());
}

#[tokio::test]
async fn test_rejected_login_is_an_auth_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let result = test_fetcher()
        .start_authenticated_session(&credentials(), &format!("{}/login", mock_server.uri()))
        .await;

    assert!(matches!(result, Err(TrawlError::Auth(_))));
}
