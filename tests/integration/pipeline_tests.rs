//! Integration tests for the harvest pipeline
//!
//! These tests use wiremock to stand in for vatican.va and run the full
//! resolve, index, parse and store cycle against a temporary database.

use std::path::Path;
use tempfile::TempDir;
use url::Url;
use vatican_speeches::config::{FetcherConfig, UserAgentConfig};
use vatican_speeches::crawler::{
    build_http_client, CancelFlag, Coordinator, Fetcher, RateLimiter, RetryPolicy, RunSummary,
};
use vatican_speeches::selector::SelectorSet;
use vatican_speeches::storage::{SqliteStorage, Storage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOMILY_DIR: &str = "/content/francesco/en/homilies/2020/documents";

fn doc_path(n: u32) -> String {
    format!("{}/papa-francesco_202004{:02}_omelia.html", HOMILY_DIR, n)
}

/// An index listing for homilies `numbers`, optionally linking to page 2
fn index_page(numbers: std::ops::RangeInclusive<u32>, link_page_two: bool) -> String {
    let mut html = String::from("<html><body><div class=\"documento\"><ul>");
    for n in numbers {
        html.push_str(&format!(
            "<li><h2><a href=\"{}\">Homily {}</a></h2><div class=\"data\">{} April 2020</div></li>",
            doc_path(n),
            n,
            n
        ));
    }
    html.push_str("</ul></div>");
    if link_page_two {
        html.push_str("<a href=\"2020.index.2.html\">2</a>");
    }
    html.push_str("</body></html>");
    html
}

fn speech_page(n: u32) -> String {
    format!(
        r#"<html><head><title>Homily {n} | Francis</title></head><body>
        <div class="documento">
          <h1>Homily {n}</h1>
          <div class="data">{n} April 2020</div>
          <div class="text"><p>Dear brothers and sisters, this is homily {n}.</p></div>
        </div>
        </body></html>"#
    )
}

/// Mounts a pope biography, an index of homilies 1-5 linking to a second
/// page with homilies 6-8, and the eight documents
async fn mount_francis_2020(server: &MockServer, page_two: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/content/francesco/en.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<div class="subtitle">266th Pope</div>
               <table class="sinottico">
                 <tr><td>Name</td><td>Jorge Mario Bergoglio</td></tr>
               </table>"#,
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/content/francesco/en/homilies/2020.index.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(index_page(1..=5, true)))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/content/francesco/en/homilies/2020.index.2.html"))
        .respond_with(page_two)
        .mount(server)
        .await;

    for n in 1..=8 {
        Mock::given(method("GET"))
            .and(path(doc_path(n)))
            .respond_with(ResponseTemplate::new(200).set_body_string(speech_page(n)))
            .mount(server)
            .await;
    }
}

fn test_fetcher() -> Fetcher {
    let client = build_http_client(&FetcherConfig::default(), &UserAgentConfig::default())
        .expect("Failed to build HTTP client");
    Fetcher::new(client, RateLimiter::unthrottled(), RetryPolicy::immediate(2))
}

fn coordinator(
    server: &MockServer,
    db_path: &Path,
    years: &str,
    max_speeches: usize,
) -> Coordinator<SqliteStorage> {
    let base_url = Url::parse(&format!("{}/", server.uri())).expect("Failed to parse base URL");
    let storage = SqliteStorage::new(db_path).expect("Failed to open storage");
    let selectors =
        SelectorSet::parse("Francis", "homilies", years, "EN").expect("Invalid selectors");
    Coordinator::new(test_fetcher(), storage, base_url, selectors, max_speeches)
}

async fn run(server: &MockServer, db_path: &Path, max_speeches: usize) -> RunSummary {
    coordinator(server, db_path, "2020", max_speeches).run().await
}

#[tokio::test]
async fn test_cap_limits_inserted_speeches() {
    let server = MockServer::start().await;
    mount_francis_2020(
        &server,
        ResponseTemplate::new(200).set_body_string(index_page(6..=8, false)),
    )
    .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("speeches.db");

    let summary = run(&server, &db_path, 5).await;

    assert_eq!(summary.inserted, 5);
    assert!(summary.cap_reached);
    assert!(!summary.interrupted);
    assert_eq!(summary.total_failures(), 0);
    assert_eq!(summary.popes_inserted, 1);

    let storage = SqliteStorage::new(&db_path).expect("Failed to reopen storage");
    assert_eq!(storage.count_speeches().unwrap(), 5);

    let speeches = storage.speeches_by_pope("Francis").unwrap();
    assert_eq!(speeches.len(), 5);
    for stored in &speeches {
        let speech = &stored.speech;
        assert_eq!(speech.pope_name, "Francis");
        assert_eq!(speech.section, "homilies");
        assert_eq!(speech.year, "2020");
        assert_eq!(speech.language, "EN");
        assert!(speech.date.starts_with("2020-04-"));
        assert!(speech.text.contains("this is homily"));
        assert!(!stored.entry_creation_date.is_empty());
    }

    let mut titles: Vec<&str> = speeches.iter().map(|s| s.speech.title.as_str()).collect();
    titles.sort();
    assert_eq!(
        titles,
        vec!["Homily 1", "Homily 2", "Homily 3", "Homily 4", "Homily 5"]
    );
}

#[tokio::test]
async fn test_speech_fields_are_extracted() {
    let server = MockServer::start().await;
    mount_francis_2020(
        &server,
        ResponseTemplate::new(200).set_body_string(index_page(6..=8, false)),
    )
    .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("speeches.db");
    run(&server, &db_path, 1).await;

    let storage = SqliteStorage::new(&db_path).expect("Failed to reopen storage");
    let speeches = storage.speeches_by_section("homilies").unwrap();
    assert_eq!(speeches.len(), 1);

    let speech = &speeches[0].speech;
    assert_eq!(speech.title, "Homily 1");
    assert_eq!(speech.date, "2020-04-01");
    assert_eq!(speech.text, "Dear brothers and sisters, this is homily 1.");
    assert_eq!(speech.url, format!("{}{}", server.uri(), doc_path(1)));

    let popes = storage.list_popes().unwrap();
    assert_eq!(popes.len(), 1);
    assert_eq!(popes[0].pope.pope_name, "Francis");
    assert_eq!(popes[0].pope.pope_slug, "francesco");
    assert_eq!(popes[0].pope.pope_number, "266");
    assert_eq!(popes[0].pope.secular_name, "Jorge Mario Bergoglio");
}

#[tokio::test]
async fn test_pagination_reaches_second_page() {
    let server = MockServer::start().await;
    mount_francis_2020(
        &server,
        ResponseTemplate::new(200).set_body_string(index_page(6..=8, false)),
    )
    .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("speeches.db");

    let summary = run(&server, &db_path, 100).await;

    assert_eq!(summary.inserted, 8);
    assert_eq!(summary.candidates_seen, 8);
    assert!(!summary.cap_reached);
    assert_eq!(summary.slices_crawled, 1);
    assert_eq!(summary.total_failures(), 0);
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let server = MockServer::start().await;
    mount_francis_2020(
        &server,
        ResponseTemplate::new(200).set_body_string(index_page(6..=8, false)),
    )
    .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("speeches.db");

    let first = run(&server, &db_path, 100).await;
    assert_eq!(first.inserted, 8);
    assert_eq!(first.popes_inserted, 1);

    let second = run(&server, &db_path, 100).await;
    assert_eq!(second.inserted, 0);
    assert_eq!(second.already_existing, 8);
    assert_eq!(second.popes_inserted, 0);

    let storage = SqliteStorage::new(&db_path).expect("Failed to reopen storage");
    assert_eq!(storage.count_speeches().unwrap(), 8);
    assert_eq!(storage.count_popes().unwrap(), 1);
}

#[tokio::test]
async fn test_capped_rerun_continues_where_it_stopped() {
    let server = MockServer::start().await;
    mount_francis_2020(
        &server,
        ResponseTemplate::new(200).set_body_string(index_page(6..=8, false)),
    )
    .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("speeches.db");

    assert_eq!(run(&server, &db_path, 5).await.inserted, 5);

    let second = run(&server, &db_path, 5).await;
    assert_eq!(second.inserted, 3);
    assert_eq!(second.already_existing, 5);

    let storage = SqliteStorage::new(&db_path).expect("Failed to reopen storage");
    assert_eq!(storage.count_speeches().unwrap(), 8);
}

#[tokio::test]
async fn test_failed_index_page_keeps_earlier_candidates() {
    let server = MockServer::start().await;
    mount_francis_2020(&server, ResponseTemplate::new(500)).await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("speeches.db");

    let summary = run(&server, &db_path, 100).await;

    assert_eq!(summary.inserted, 5);
    assert_eq!(summary.crawl_page_failures, 1);
    assert_eq!(summary.fetch_failures, 0);
    assert!(!summary.cap_reached);

    let storage = SqliteStorage::new(&db_path).expect("Failed to reopen storage");
    assert_eq!(storage.count_speeches().unwrap(), 5);
}

#[tokio::test]
async fn test_missing_year_is_an_empty_slice() {
    let server = MockServer::start().await;
    mount_francis_2020(
        &server,
        ResponseTemplate::new(200).set_body_string(index_page(6..=8, false)),
    )
    .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("speeches.db");

    // Nothing is mounted for 2019, the mock server answers 404
    let summary = coordinator(&server, &db_path, "2019-2020", 100)
        .run()
        .await;

    assert_eq!(summary.slices_crawled, 2);
    assert_eq!(summary.empty_slices, 1);
    assert_eq!(summary.inserted, 8);
    assert_eq!(summary.total_failures(), 0);
}

#[tokio::test]
async fn test_document_failures_are_counted_and_skipped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/content/francesco/en/homilies/2020.index.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(index_page(1..=3, false)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(doc_path(1)))
        .respond_with(ResponseTemplate::new(200).set_body_string(speech_page(1)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(doc_path(2)))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(doc_path(3)))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body><p>Moved</p></body></html>"),
        )
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("speeches.db");

    let summary = run(&server, &db_path, 100).await;

    assert_eq!(summary.candidates_seen, 3);
    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.fetch_failures, 1);
    assert_eq!(summary.parse_failures, 1);

    // The biography page is missing but the pope is still recorded
    let storage = SqliteStorage::new(&db_path).expect("Failed to reopen storage");
    assert_eq!(storage.count_popes().unwrap(), 1);
}

#[tokio::test]
async fn test_unknown_pope_is_skipped() {
    let server = MockServer::start().await;
    mount_francis_2020(
        &server,
        ResponseTemplate::new(200).set_body_string(index_page(6..=8, false)),
    )
    .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("speeches.db");
    let base_url = Url::parse(&format!("{}/", server.uri())).unwrap();
    let selectors = SelectorSet::parse("roman curia, Francis", "homilies", "2020", "EN").unwrap();
    let storage = SqliteStorage::new(&db_path).unwrap();

    let summary = Coordinator::new(test_fetcher(), storage, base_url, selectors, 100)
        .run()
        .await;

    assert_eq!(summary.resolution_failures, 1);
    assert_eq!(summary.inserted, 8);
}

#[tokio::test]
async fn test_cancelled_run_stops_before_crawling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("speeches.db");

    let cancel = CancelFlag::new();
    cancel.cancel();
    let summary = coordinator(&server, &db_path, "2020", 5)
        .with_cancel_flag(cancel)
        .run()
        .await;

    assert!(summary.interrupted);
    assert_eq!(summary.inserted, 0);
    assert_eq!(summary.slices_crawled, 0);
}

async fn run_for(server: &MockServer, db_path: &Path, popes: &str) -> RunSummary {
    let base_url = Url::parse(&format!("{}/", server.uri())).unwrap();
    let storage = SqliteStorage::new(db_path).unwrap();
    let selectors = SelectorSet::parse(popes, "homilies", "2020", "EN").unwrap();
    Coordinator::new(test_fetcher(), storage, base_url, selectors, 100)
        .run()
        .await
}

#[tokio::test]
async fn test_pope_recorded_once_when_biography_is_flaky() {
    // Nothing mounted: every page, the landing pages included, is a 404
    let without_biography = MockServer::start().await;

    let with_biography = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/content/pius-ix/en.html"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<div class="subtitle">255th Pope</div>"#),
        )
        .mount(&with_biography)
        .await;
    Mock::given(method("GET"))
        .and(path("/content/francesco/en.html"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<div class="subtitle">266th Pope</div>"#),
        )
        .mount(&with_biography)
        .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("speeches.db");

    let first = run_for(&without_biography, &db_path, "Pius IX, Francis").await;
    assert_eq!(first.popes_deferred, 1);
    assert_eq!(first.popes_inserted, 1);

    let second = run_for(&with_biography, &db_path, "Pius IX, Francis").await;
    assert_eq!(second.popes_deferred, 0);
    assert_eq!(second.popes_inserted, 1);

    let third = run_for(&without_biography, &db_path, "Pius IX, Francis").await;
    assert_eq!(third.popes_inserted, 0);

    let storage = SqliteStorage::new(&db_path).expect("Failed to reopen storage");
    let popes = storage.list_popes().unwrap();
    let numbers: Vec<(&str, &str)> = popes
        .iter()
        .map(|p| (p.pope.pope_name.as_str(), p.pope.pope_number.as_str()))
        .collect();
    assert_eq!(numbers, vec![("Pius IX", "255"), ("Francis", "266")]);
}
