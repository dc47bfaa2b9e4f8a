//! Integration tests for year index pagination
//!
//! These tests drive an `IndexCursor` against a wiremock server.

use url::Url;
use vatican_speeches::config::{FetcherConfig, UserAgentConfig};
use vatican_speeches::crawler::{
    build_http_client, FetchResult, Fetcher, IndexCursor, RateLimiter, RetryPolicy,
};
use vatican_speeches::selector::{Section, Selector};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FIRST_PAGE: &str = "/content/francesco/en/angelus/2021.index.html";
const SECOND_PAGE: &str = "/content/francesco/en/angelus/2021.index.2.html";

fn listing(docs: &[&str], next: Option<&str>) -> String {
    let mut html = String::from("<html><body><div class=\"documento\"><ul>");
    for doc in docs {
        html.push_str(&format!(
            "<li><h2><a href=\"/content/francesco/en/angelus/2021/documents/{}.html\">{}</a></h2></li>",
            doc, doc
        ));
    }
    html.push_str("</ul></div>");
    if let Some(next) = next {
        html.push_str(&format!("<a href=\"{}\">next</a>", next));
    }
    html.push_str("</body></html>");
    html
}

fn selector() -> Selector {
    Selector {
        pope: "Francis".to_string(),
        section: Section::Angelus,
        year: 2021,
        language: "EN".parse().unwrap(),
    }
}

fn fetcher() -> Fetcher {
    let client = build_http_client(&FetcherConfig::default(), &UserAgentConfig::default())
        .expect("Failed to build HTTP client");
    Fetcher::new(client, RateLimiter::unthrottled(), RetryPolicy::immediate(1))
}

fn base(server: &MockServer) -> Url {
    Url::parse(&format!("{}/", server.uri())).expect("Failed to parse base URL")
}

async fn drain(cursor: &mut IndexCursor<'_>) -> Vec<String> {
    let mut urls = Vec::new();
    while let Some(candidate) = cursor.next(usize::MAX).await {
        urls.push(candidate.url);
    }
    urls
}

#[tokio::test]
async fn test_single_page_without_next_link() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FIRST_PAGE))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&["a", "b"], None)))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher();
    let mut cursor = IndexCursor::new(&fetcher, &base(&server), "francesco", &selector()).unwrap();
    let urls = drain(&mut cursor).await;

    assert_eq!(urls.len(), 2);
    assert!(urls[0].ends_with("/documents/a.html"));
    assert!(urls[1].ends_with("/documents/b.html"));
    assert_eq!(cursor.pages_fetched(), 1);
    assert!(cursor.take_failure().is_none());
}

#[tokio::test]
async fn test_follows_numbered_pages_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FIRST_PAGE))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing(&["a", "b"], Some("2021.index.2.html"))),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SECOND_PAGE))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&["b", "c"], None)))
        .mount(&server)
        .await;

    let fetcher = fetcher();
    let mut cursor = IndexCursor::new(&fetcher, &base(&server), "francesco", &selector()).unwrap();
    let urls = drain(&mut cursor).await;

    // "b" is listed on both pages but yielded once
    let names: Vec<&str> = urls
        .iter()
        .filter_map(|u| u.rsplit('/').next())
        .collect();
    assert_eq!(names, vec!["a.html", "b.html", "c.html"]);
    assert_eq!(cursor.pages_fetched(), 2);
}

#[tokio::test]
async fn test_second_page_is_fetched_lazily() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FIRST_PAGE))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing(&["a"], Some("2021.index.2.html"))),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SECOND_PAGE))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&["b"], None)))
        .expect(0)
        .mount(&server)
        .await;

    let fetcher = fetcher();
    let mut cursor = IndexCursor::new(&fetcher, &base(&server), "francesco", &selector()).unwrap();

    assert!(cursor.next(1).await.is_some());
    assert_eq!(cursor.pages_fetched(), 1);
}

#[tokio::test]
async fn test_zero_budget_fetches_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let fetcher = fetcher();
    let mut cursor = IndexCursor::new(&fetcher, &base(&server), "francesco", &selector()).unwrap();

    assert!(cursor.next(0).await.is_none());
    assert_eq!(cursor.pages_fetched(), 0);
}

#[tokio::test]
async fn test_failed_page_ends_walk_with_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FIRST_PAGE))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing(&["a"], Some("2021.index.2.html"))),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SECOND_PAGE))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = fetcher();
    let mut cursor = IndexCursor::new(&fetcher, &base(&server), "francesco", &selector()).unwrap();
    let urls = drain(&mut cursor).await;

    assert_eq!(urls.len(), 1);
    let failure = cursor.take_failure().expect("page 2 failure is reported");
    assert_eq!(failure.page_number, 2);
    assert!(failure.url.ends_with(SECOND_PAGE));
    assert!(matches!(
        failure.result,
        FetchResult::FetchFailed { attempts: 1, .. }
    ));

    // Taken once
    assert!(cursor.take_failure().is_none());
}

#[tokio::test]
async fn test_missing_first_page_is_not_found() {
    let server = MockServer::start().await;

    let fetcher = fetcher();
    let mut cursor = IndexCursor::new(&fetcher, &base(&server), "francesco", &selector()).unwrap();

    assert!(cursor.next(10).await.is_none());
    let failure = cursor.take_failure().expect("missing page is reported");
    assert_eq!(failure.page_number, 1);
    assert!(failure.result.is_not_found());
}

#[tokio::test]
async fn test_next_link_back_to_visited_page_stops() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FIRST_PAGE))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing(&["a"], Some("2021.index.2.html"))),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SECOND_PAGE))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<html><head><link rel=\"next\" href=\"2021.index.html\"></head><body>{}</body></html>",
            listing(&["b"], None)
        )))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher();
    let mut cursor = IndexCursor::new(&fetcher, &base(&server), "francesco", &selector()).unwrap();
    let urls = drain(&mut cursor).await;

    assert_eq!(urls.len(), 2);
    assert_eq!(cursor.pages_fetched(), 2);
    assert!(cursor.take_failure().is_none());
}
