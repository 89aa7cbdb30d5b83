//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end against a SQLite database on disk.

use std::path::Path;
use sumi_trawl::config::{
    AuthConfig, Config, CrawlerConfig, ImageConfig, OutputConfig, UserAgentConfig,
};
use sumi_trawl::crawler::{image_file_name, run_crawl};
use sumi_trawl::storage::{open_storage, PageStore, RunStatus};
use sumi_trawl::TrawlError;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling from the given seeds
fn create_test_config(seeds: Vec<String>, db_path: &Path, max_depth: u32) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_depth,
            batch_size: 0,
            max_fetch_attempts: 0,
            request_timeout: 5,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: db_path.to_string_lossy().into_owned(),
        },
        auth: None,
        images: None,
        seeds,
    }
}

fn html_page(title: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            title, body
        ))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, title: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(title, body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_records_depths_and_failures() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("trawl.db");

    mount_page(
        &mock_server,
        "/",
        "Home",
        r#"<a href="/a">Page A</a> <a href="/b">Page B</a> <a href="mailto:x@y.z">mail</a>"#,
    )
    .await;
    mount_page(&mock_server, "/a", "A", r#"<a href="/c#top">Page C</a>"#).await;
    mount_page(&mock_server, "/c", "C", "leaf").await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let config = create_test_config(vec![format!("{}/", base_url)], &db_path, 3);
    let report = run_crawl(&config, "test-hash").await.expect("Crawl failed");

    assert_eq!(report.rounds, 3);
    assert_eq!(report.pages_crawled, 3);
    assert_eq!(report.fetch_failures, 2);
    assert_eq!(report.links_inserted, 3);

    let store = open_storage(&db_path).unwrap();

    let home = store.get_by_url(&format!("{}/", base_url)).unwrap().unwrap();
    assert!(home.crawled);
    assert_eq!(home.depth, 0);
    assert_eq!(home.title.as_deref(), Some("Home"));
    assert!(home.crawled_at.is_some());

    let a = store.get_by_url(&format!("{}/a", base_url)).unwrap().unwrap();
    assert!(a.crawled);
    assert_eq!(a.depth, 1);
    assert_eq!(a.linked_from, Some(home.id));
    assert_eq!(a.title.as_deref(), Some("A"));

    let c = store.get_by_url(&format!("{}/c", base_url)).unwrap().unwrap();
    assert!(c.crawled);
    assert_eq!(c.depth, 2);
    assert_eq!(c.linked_from, Some(a.id));
    assert_eq!(c.body.as_deref(), Some("leaf"));

    let b = store.get_by_url(&format!("{}/b", base_url)).unwrap().unwrap();
    assert!(!b.crawled);
    assert_eq!(b.fetch_attempts, 2);
    assert_eq!(b.title.as_deref(), Some("Page B"));

    assert_eq!(store.count_total().unwrap(), 4);

    let run = store.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "test-hash");
    assert_eq!(run.max_depth, 3);
    assert_eq!(run.rounds, 3);
    assert_eq!(run.pages_crawled, 3);
    assert!(run.finished_at.is_some());
}

#[tokio::test]
async fn test_second_run_resumes_from_uncrawled_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("trawl.db");

    mount_page(&mock_server, "/", "Home", r#"<a href="/next">Next</a>"#).await;
    mount_page(&mock_server, "/next", "Next", "end").await;

    let config = create_test_config(vec![format!("{}/", base_url)], &db_path, 1);

    let first = run_crawl(&config, "hash").await.unwrap();
    assert_eq!(first.pages_crawled, 1);

    let second = run_crawl(&config, "hash").await.unwrap();
    assert_eq!(second.pages_crawled, 1);
    assert_eq!(second.links_inserted, 0);

    let store = open_storage(&db_path).unwrap();
    assert_eq!(store.count_by_crawled(true).unwrap(), 2);
    assert_eq!(store.count_by_crawled(false).unwrap(), 0);

    // Seeds are never re-inserted and nothing is fetched twice
    let home_fetches = mock_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/")
        .count();
    assert_eq!(home_fetches, 1);
}

#[tokio::test]
async fn test_crawl_captures_images() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("trawl.db");
    let media_dir = temp_dir.path().join("media");

    mount_page(
        &mock_server,
        "/",
        "Gallery",
        r#"<img src="/pic.png"> <img src="/notes.txt">"#,
    )
    .await;

    Mock::given(method("HEAD"))
        .and(path("/pic.png"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/png"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pic.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![137u8, 80, 78, 71]))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/notes.txt"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/plain"))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(vec![format!("{}/", base_url)], &db_path, 0);
    config.images = Some(ImageConfig {
        enabled: true,
        min_size: None,
        media_dir: media_dir.to_string_lossy().into_owned(),
    });

    let report = run_crawl(&config, "hash").await.unwrap();
    assert_eq!(report.images_saved, 1);

    let saved = media_dir.join(image_file_name(&format!("{}/pic.png", base_url), "png"));
    assert_eq!(std::fs::read(saved).unwrap(), vec![137u8, 80, 78, 71]);
    assert_eq!(std::fs::read_dir(&media_dir).unwrap().count(), 1);
}

#[tokio::test]
async fn test_authenticated_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("trawl.db");

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("set-cookie", "session=s3cret; Path=/")
                .insert_header("location", "/welcome"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/members"))
        .and(header("cookie", "session=s3cret"))
        .respond_with(html_page("Members", "welcome back"))
        .mount(&mock_server)
        .await;

    mount_page(&mock_server, "/welcome", "Welcome", "").await;

    let mut config = create_test_config(vec![format!("{}/members", base_url)], &db_path, 1);
    config.auth = Some(AuthConfig {
        enabled: true,
        login_endpoint: format!("{}/login", base_url),
        username: "bot".to_string(),
        password: "pw".to_string(),
        username_field: "username".to_string(),
        password_field: "password".to_string(),
    });

    let report = run_crawl(&config, "hash").await.unwrap();
    assert_eq!(report.pages_crawled, 1);

    let store = open_storage(&db_path).unwrap();
    let members = store
        .get_by_url(&format!("{}/members", base_url))
        .unwrap()
        .unwrap();
    assert!(members.crawled);
    assert_eq!(members.body.as_deref(), Some("welcome back"));
}

#[tokio::test]
async fn test_failed_login_aborts_before_crawling() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("trawl.db");

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(vec![format!("{}/", base_url)], &db_path, 1);
    config.auth = Some(AuthConfig {
        enabled: true,
        login_endpoint: format!("{}/login", base_url),
        username: "bot".to_string(),
        password: "wrong".to_string(),
        username_field: "username".to_string(),
        password_field: "password".to_string(),
    });

    let result = run_crawl(&config, "hash").await;
    assert!(matches!(result, Err(TrawlError::Auth(_))));

    let store = open_storage(&db_path).unwrap();
    assert_eq!(store.count_total().unwrap(), 0);
    assert!(store.get_latest_run().unwrap().is_none());
}
