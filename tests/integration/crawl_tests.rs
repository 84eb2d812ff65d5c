//! End-to-end crawl tests against a mock site

use crate::common::{create_test_config, detail_page, listing_page, mount_page};
use motto_harvest::crawler::{crawl, Coordinator, CrawlSummary};
use motto_harvest::storage::{DocumentStore, QueueStore, SqliteStorage};
use motto_harvest::Config;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn run_to_completion(config: Config, storage: Arc<SqliteStorage>) -> CrawlSummary {
    let coordinator = Coordinator::new(config, storage).expect("Failed to create coordinator");
    tokio::time::timeout(Duration::from_secs(30), coordinator.run())
        .await
        .expect("Crawl did not terminate")
        .expect("Crawl failed")
}

#[tokio::test]
async fn test_root_with_detail_and_pagination_links() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        listing_page(&["/lizhi/1.html", "list_1_2.html", "javascript:void(0)"]),
    )
    .await;
    mount_page(
        &server,
        "/lizhi/1.html",
        detail_page("励志格言", "关于坚持的格言", &["一、前进"]),
    )
    .await;
    mount_page(&server, "/list_1_2.html", listing_page(&[])).await;

    let storage = Arc::new(SqliteStorage::new_in_memory().unwrap());
    let config = create_test_config(&server, ":memory:");
    let root = config.site.root_url.clone();
    let summary = run_to_completion(config, Arc::clone(&storage)).await;

    assert_eq!(storage.count_records().unwrap(), 1);
    assert_eq!(summary.records_committed, 1);
    assert!(storage.set_len("visited_urls").unwrap() >= 2);
    assert!(storage.set_contains("visited_urls", &root).unwrap());

    let pagination = format!("{}list_1_2.html", root);
    assert!(storage.set_contains("visited_urls", &pagination).unwrap());
    assert_eq!(storage.queue_len("geyanw_task").unwrap(), 0);
}

#[tokio::test]
async fn test_detail_page_records_have_category_and_title() {
    let server = MockServer::start().await;

    mount_page(&server, "/", listing_page(&["/lizhi/1.html"])).await;
    mount_page(
        &server,
        "/lizhi/1.html",
        detail_page("励志格言", "关于坚持的格言", &["一、前进", "&nbsp;", "二、坚持"]),
    )
    .await;

    let storage = Arc::new(SqliteStorage::new_in_memory().unwrap());
    run_to_completion(create_test_config(&server, ":memory:"), Arc::clone(&storage)).await;

    assert_eq!(storage.count_records().unwrap(), 2);
    let record = storage
        .get_record(&motto_harvest::state::content_id("坚持"))
        .unwrap()
        .expect("record for 坚持");
    assert_eq!(record.kind, "励志格言");
    assert_eq!(record.title, "关于坚持的格言");
    assert_eq!(record.body, "坚持");
}

#[tokio::test]
async fn test_duplicate_content_stored_once() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        listing_page(&["/lizhi/1.html", "/renshen/2.html"]),
    )
    .await;
    mount_page(
        &server,
        "/lizhi/1.html",
        detail_page("励志格言", "页面一", &["一、天道酬勤"]),
    )
    .await;
    mount_page(
        &server,
        "/renshen/2.html",
        detail_page("人生格言", "页面二", &["五、天道酬勤"]),
    )
    .await;

    let storage = Arc::new(SqliteStorage::new_in_memory().unwrap());
    let summary =
        run_to_completion(create_test_config(&server, ":memory:"), Arc::clone(&storage)).await;

    assert_eq!(storage.count_records().unwrap(), 1);
    assert_eq!(summary.records_committed, 1);
    assert_eq!(summary.records_duplicate, 1);
}

#[tokio::test]
async fn test_failed_page_is_still_marked_visited() {
    let server = MockServer::start().await;

    mount_page(&server, "/", listing_page(&["/missing.html"])).await;
    Mock::given(method("GET"))
        .and(path("/missing.html"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let storage = Arc::new(SqliteStorage::new_in_memory().unwrap());
    let config = create_test_config(&server, ":memory:");
    let missing = format!("{}missing.html", config.site.root_url);
    let summary = run_to_completion(config, Arc::clone(&storage)).await;

    assert!(storage.set_contains("visited_urls", &missing).unwrap());
    assert_eq!(summary.pages_failed, 1);
    assert_eq!(storage.count_records().unwrap(), 0);
}

#[tokio::test]
async fn test_offsite_links_are_not_followed() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;

    mount_page(
        &server,
        "/",
        listing_page(&[&format!("{}/elsewhere.html", other.uri())]),
    )
    .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&other)
        .await;

    let storage = Arc::new(SqliteStorage::new_in_memory().unwrap());
    let summary =
        run_to_completion(create_test_config(&server, ":memory:"), Arc::clone(&storage)).await;

    assert_eq!(summary.links_enqueued, 0);
    assert_eq!(storage.set_len("visited_urls").unwrap(), 1);
}

#[tokio::test]
async fn test_malformed_paragraph_aborts_rest_of_page() {
    let server = MockServer::start().await;

    mount_page(&server, "/", listing_page(&["/lizhi/1.html"])).await;
    mount_page(
        &server,
        "/lizhi/1.html",
        detail_page("励志格言", "标题", &["一、前进", "没有编号", "二、坚持"]),
    )
    .await;

    let storage = Arc::new(SqliteStorage::new_in_memory().unwrap());
    run_to_completion(create_test_config(&server, ":memory:"), Arc::clone(&storage)).await;

    assert_eq!(storage.count_records().unwrap(), 1);
}

#[tokio::test]
async fn test_second_run_resumes_without_refetching() {
    let server = MockServer::start().await;
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("crawl.db");
    let db_path = db_path.to_str().unwrap();

    mount_page(&server, "/", listing_page(&["/lizhi/1.html"])).await;
    mount_page(
        &server,
        "/lizhi/1.html",
        detail_page("励志格言", "标题", &["一、前进"]),
    )
    .await;

    let config = create_test_config(&server, db_path);
    let first = tokio::time::timeout(Duration::from_secs(30), crawl(config.clone(), false))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.records_committed, 1);

    // Everything is visited: the re-seeded root is skipped
    let second = tokio::time::timeout(Duration::from_secs(30), crawl(config.clone(), false))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.pages_fetched, 0);
    assert_eq!(second.pages_skipped, 1);

    // A fresh run refetches, but the record is already stored
    let third = tokio::time::timeout(Duration::from_secs(30), crawl(config, true))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(third.records_committed, 0);
    assert_eq!(third.records_duplicate, 1);

    let storage = SqliteStorage::new(std::path::Path::new(db_path)).unwrap();
    assert_eq!(storage.count_records().unwrap(), 1);
}
