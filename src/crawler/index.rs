//! Year index pagination
//!
//! Each (pope, section, year, language) slice has a paginated listing at
//! `/content/<slug>/<lang>/<section>/<year>.index.html`, continued by
//! `<year>.index.2.html`, `<year>.index.3.html`, ... This module extracts the
//! document links from one listing page and walks the pages lazily.

use super::fetcher::{FetchResult, Fetcher};
use crate::selector::{Section, Selector};
use crate::text::{clean_text, normalize_date, repair_mojibake};
use scraper::{ElementRef, Html, Selector as Css};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// A document URL discovered on an index page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    /// Link text from the listing
    pub title_hint: Option<String>,
    /// Date text from the listing, as printed
    pub date_hint: Option<String>,
}

/// What one index page offers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexPage {
    pub candidates: Vec<Candidate>,
    pub next_page: Option<Url>,
}

/// An index page that could not be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPageFailure {
    pub url: String,
    /// 1 for the first page of the slice
    pub page_number: u32,
    pub result: FetchResult,
}

/// URL of the first index page of a slice
pub fn index_url(base: &Url, slug: &str, selector: &Selector) -> Result<Url, url::ParseError> {
    base.join(&format!(
        "content/{}/{}/{}/{}.index.html",
        slug,
        selector.language.path_segment(),
        selector.section,
        selector.year
    ))
}

fn css(selector: &str) -> Option<Css> {
    Css::parse(selector).ok()
}

fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&repair_mojibake(&element.text().collect::<Vec<_>>().join(" ")))
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Extracts candidates and the next-page link from one index page
///
/// # Arguments
///
/// * `html` - The page body
/// * `page_url` - URL the page was served from, for resolving relative links
/// * `slug` - The pope's slug; links outside `/content/<slug>/` are ignored
/// * `section` - Links outside `/<section>/` are ignored
/// * `year` - Links outside `/<year>/` are ignored; also used to recognise
///   numbered pagination links
/// * `page_number` - 1-based number of this page
pub fn parse_index_page(
    html: &str,
    page_url: &Url,
    slug: &str,
    section: Section,
    year: u16,
    page_number: u32,
) -> IndexPage {
    let document = Html::parse_document(html);
    let pope_segment = format!("/content/{}/", slug);
    let section_segment = format!("/{}/", section);
    let year_segment = format!("/{}/", year);

    let accepts = |url: &Url| {
        let path = url.path();
        path.contains(&pope_segment)
            && path.contains(&section_segment)
            && path.contains(&year_segment)
            && !path.contains(".index.")
    };

    let mut candidates: Vec<Candidate> = Vec::new();

    let (Some(items), Some(links), Some(dates)) =
        (css(".documento ul li"), css("h2 a[href]"), css(".data"))
    else {
        return IndexPage::default();
    };

    for item in document.select(&items) {
        for link in item.select(&links) {
            let Some(url) = link.value().attr("href").and_then(|h| page_url.join(h).ok()) else {
                continue;
            };
            if !accepts(&url) {
                continue;
            }

            let date_hint = item
                .select(&dates)
                .next()
                .map(element_text)
                .and_then(non_empty)
                .or_else(|| {
                    let text = element_text(item);
                    normalize_date(&text).map(|_| text)
                });

            push_unique(
                &mut candidates,
                Candidate {
                    url: url.to_string(),
                    title_hint: non_empty(element_text(link)),
                    date_hint,
                },
            );
        }
    }

    // Unknown layout: fall back to every link on the page
    if candidates.is_empty() {
        if let Some(anchors) = css("a[href]") {
            for link in document.select(&anchors) {
                let Some(url) = link.value().attr("href").and_then(|h| page_url.join(h).ok())
                else {
                    continue;
                };
                if accepts(&url) {
                    push_unique(
                        &mut candidates,
                        Candidate {
                            url: url.to_string(),
                            title_hint: non_empty(element_text(link)),
                            date_hint: None,
                        },
                    );
                }
            }
        }
    }

    IndexPage {
        candidates,
        next_page: find_next_page(&document, page_url, year, page_number),
    }
}

fn push_unique(candidates: &mut Vec<Candidate>, candidate: Candidate) {
    if candidates.iter().all(|c| c.url != candidate.url) {
        candidates.push(candidate);
    }
}

fn find_next_page(document: &Html, page_url: &Url, year: u16, page_number: u32) -> Option<Url> {
    if let Some(rel_next) = css("link[rel=next][href], a[rel=next][href]") {
        let next = document
            .select(&rel_next)
            .filter_map(|e| e.value().attr("href"))
            .find_map(|href| page_url.join(href).ok());
        if next.is_some() {
            return next;
        }
    }

    let wanted = format!("{}.index.{}.html", year, page_number + 1);
    let anchors = css("a[href]")?;
    document
        .select(&anchors)
        .filter_map(|e| e.value().attr("href"))
        .filter_map(|href| page_url.join(href).ok())
        .find(|url| url.path().ends_with(&wanted))
}

/// Lazy walk over the candidates of one slice
///
/// Pages are fetched only when the candidates of the previous page are
/// exhausted. A fresh cursor restarts the slice from its first page.
pub struct IndexCursor<'a> {
    fetcher: &'a Fetcher,
    slug: String,
    section: Section,
    year: u16,
    next_page: Option<Url>,
    pages_fetched: u32,
    pending: VecDeque<Candidate>,
    seen_urls: HashSet<String>,
    visited_pages: HashSet<String>,
    failure: Option<IndexPageFailure>,
}

impl<'a> IndexCursor<'a> {
    /// Creates a cursor positioned before the first index page of `selector`
    pub fn new(
        fetcher: &'a Fetcher,
        base: &Url,
        slug: &str,
        selector: &Selector,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            fetcher,
            slug: slug.to_string(),
            section: selector.section,
            year: selector.year,
            next_page: Some(index_url(base, slug, selector)?),
            pages_fetched: 0,
            pending: VecDeque::new(),
            seen_urls: HashSet::new(),
            visited_pages: HashSet::new(),
            failure: None,
        })
    }

    /// Yields the next candidate in listing order
    ///
    /// Returns `None` when `remaining_budget` is zero, when the listing has no
    /// further pages, or when a page could not be fetched (see
    /// [`IndexCursor::take_failure`]).
    pub async fn next(&mut self, remaining_budget: usize) -> Option<Candidate> {
        if remaining_budget == 0 {
            return None;
        }

        loop {
            if let Some(candidate) = self.pending.pop_front() {
                return Some(candidate);
            }

            let page_url = self.next_page.take()?;
            if !self.visited_pages.insert(page_url.to_string()) {
                tracing::debug!("Index page {} already visited, stopping", page_url);
                return None;
            }

            let page_number = self.pages_fetched + 1;
            match self.fetcher.fetch(page_url.as_str()).await {
                FetchResult::Success {
                    body, final_url, ..
                } => {
                    self.pages_fetched = page_number;
                    let served_from = Url::parse(&final_url).unwrap_or_else(|_| page_url.clone());
                    let page = parse_index_page(
                        &body,
                        &served_from,
                        &self.slug,
                        self.section,
                        self.year,
                        page_number,
                    );

                    tracing::debug!(
                        "Index page {} lists {} documents",
                        page_url,
                        page.candidates.len()
                    );

                    for candidate in page.candidates {
                        if self.seen_urls.insert(candidate.url.clone()) {
                            self.pending.push_back(candidate);
                        }
                    }
                    self.next_page = page.next_page;
                }
                result => {
                    self.failure = Some(IndexPageFailure {
                        url: page_url.to_string(),
                        page_number,
                        result,
                    });
                    return None;
                }
            }
        }
    }

    /// The page failure that ended the walk, if any
    pub fn take_failure(&mut self) -> Option<IndexPageFailure> {
        self.failure.take()
    }

    /// Number of index pages fetched so far
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }
}
