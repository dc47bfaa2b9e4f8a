//! Speech page parsing
//!
//! This module extracts a document's title, date, location and body text
//! from a speech page, following a translation link when the page is not
//! served in the requested language.

use super::fetcher::{FetchResult, Fetcher};
use super::index::Candidate;
use crate::selector::{Language, Section, Selector as CrawlSelector};
use crate::storage::SpeechRecord;
use crate::text::{clean_text, contains_year, normalize_date, repair_mojibake};
use scraper::{ElementRef, Html, Node, Selector};
use thiserror::Error;
use url::Url;

/// Provenance of a document, carried from the slice and its listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechContext {
    /// Canonical display name of the pope
    pub pope_name: String,
    pub section: Section,
    pub year: u16,
    /// Requested language
    pub language: Language,
    pub title_hint: Option<String>,
    pub date_hint: Option<String>,
}

impl SpeechContext {
    pub fn new(pope_name: &str, selector: &CrawlSelector, candidate: &Candidate) -> Self {
        Self {
            pope_name: pope_name.to_string(),
            section: selector.section,
            year: selector.year,
            language: selector.language.clone(),
            title_hint: candidate.title_hint.clone(),
            date_hint: candidate.date_hint.clone(),
        }
    }
}

/// Fields extracted from a document page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSpeech {
    pub title: String,
    /// ISO `YYYY-MM-DD` or empty
    pub date: String,
    pub location: String,
    pub text: String,
}

/// Why a fetched page did not yield a document
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("no document body found at {url}")]
    Malformed { url: String },

    #[error("document body is empty at {url}")]
    Empty { url: String },
}

/// Why a candidate did not yield a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFailure {
    Fetch(FetchResult),
    Parse(ParseFailure),
}

fn css(selector: &str) -> Option<Selector> {
    Selector::parse(selector).ok()
}

fn first<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    css(selector).and_then(|s| document.select(&s).next())
}

fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&repair_mojibake(&element.text().collect::<Vec<_>>().join(" ")))
}

/// Text nodes under `element`, one cleaned line each, blanks dropped
fn text_lines<'a>(nodes: impl Iterator<Item = &'a str>) -> Vec<String> {
    nodes
        .map(|t| clean_text(&repair_mojibake(t)))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Lines of an element as separated by `<br>`
fn lines_split_on_br(element: ElementRef<'_>) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => current.push_str(text),
            Node::Element(el) if el.name() == "br" => lines.push(std::mem::take(&mut current)),
            _ => {}
        }
    }
    lines.push(current);

    lines
        .iter()
        .map(|l| clean_text(&repair_mojibake(l)))
        .filter(|l| !l.is_empty())
        .collect()
}

fn is_multimedia_link(href: &str) -> bool {
    href.contains("/content/vaticanevents/")
}

fn has_multimedia_link(element: ElementRef<'_>) -> bool {
    css("a[href]").is_some_and(|anchors| {
        element
            .select(&anchors)
            .any(|a| a.value().attr("href").is_some_and(is_multimedia_link))
    })
}

/// Picks the element holding the document body
///
/// Among `div.text` blocks the one carrying the multimedia link wins, then
/// the longest. `.documento` and `article` are fallbacks for older layouts.
fn body_container(document: &Html) -> Option<ElementRef<'_>> {
    if let Some(blocks) = css("div.text") {
        let blocks: Vec<ElementRef<'_>> = document.select(&blocks).collect();
        if let Some(block) = blocks.iter().copied().find(|b| has_multimedia_link(*b)) {
            return Some(block);
        }
        if let Some(block) = blocks
            .iter()
            .copied()
            .max_by_key(|b| b.text().map(str::len).sum::<usize>())
        {
            return Some(block);
        }
    }

    first(document, ".documento").or_else(|| first(document, "article"))
}

/// Body text of a container, dropping everything up to the multimedia link
///
/// When nothing follows the link the whole container is used instead, minus
/// the link itself.
fn body_text(container: ElementRef<'_>) -> String {
    let children: Vec<ElementRef<'_>> = container.children().filter_map(ElementRef::wrap).collect();
    let marker = children.iter().position(|c| {
        has_multimedia_link(*c)
            || (c.value().name() == "a"
                && c.value().attr("href").is_some_and(is_multimedia_link))
    });

    let lines = match marker {
        Some(position) => {
            let marker_id = children[position].id();
            let after = container
                .children()
                .skip_while(|n| n.id() != marker_id)
                .skip(1);
            let mut lines = Vec::new();
            for node in after {
                match node.value() {
                    Node::Text(text) => lines.extend(text_lines(std::iter::once(&**text))),
                    Node::Element(_) => {
                        if let Some(el) = ElementRef::wrap(node) {
                            lines.extend(text_lines(el.text()));
                        }
                    }
                    _ => {}
                }
            }
            lines
        }
        None => Vec::new(),
    };

    // Marker nested in a wrapper, or placed after the body
    if lines.is_empty() {
        return lines_without_multimedia(container).join("\n");
    }

    lines.join("\n")
}

/// Every text line of a container except the multimedia link labels
fn lines_without_multimedia(container: ElementRef<'_>) -> Vec<String> {
    let texts = container.descendants().filter_map(|node| {
        let Node::Text(text) = node.value() else {
            return None;
        };
        let in_multimedia_link = node.ancestors().filter_map(ElementRef::wrap).any(|el| {
            el.value().name() == "a" && el.value().attr("href").is_some_and(is_multimedia_link)
        });
        if in_multimedia_link {
            None
        } else {
            Some(&**text)
        }
    });

    text_lines(texts)
}

fn title_from_document(document: &Html) -> String {
    if let Some(h1) = first(document, ".documento h1").or_else(|| first(document, "h1")) {
        let text = element_text(h1);
        if !text.is_empty() {
            return text;
        }
    }

    first(document, "title")
        .map(element_text)
        .map(|t| match t.split_once(" | ") {
            Some((head, _)) => head.trim().to_string(),
            None => t,
        })
        .unwrap_or_default()
}

fn is_reasonable_place(text: &str) -> bool {
    text.chars().filter(|c| c.is_alphabetic()).count() >= 3
        && text.chars().count() <= 120
        && !contains_year(text)
}

/// A place printed on the line above the date, e.g. `Saint Peter's Square<br>Sunday, 5 April 2020`
fn location_from_paragraphs<'a>(paragraphs: impl Iterator<Item = ElementRef<'a>>) -> Option<String> {
    paragraphs
        .map(lines_split_on_br)
        .filter(|lines| lines.len() >= 2 && contains_year(&lines[1]))
        .map(|lines| {
            lines[0]
                .trim_matches(|c: char| " ,;·:—–-".contains(c))
                .to_string()
        })
        .find(|place| is_reasonable_place(place))
}

fn location_from_document(document: &Html, container: ElementRef<'_>) -> String {
    let paragraphs = css("p");
    let from_abstract = first(document, ".abstract").and_then(|abs| {
        let p = paragraphs.as_ref()?;
        location_from_paragraphs(abs.select(p))
    });

    from_abstract
        .or_else(|| {
            let p = paragraphs.as_ref()?;
            location_from_paragraphs(container.select(p).skip(1).take(5))
        })
        .unwrap_or_default()
}

fn date_from_document(document: &Html, context: &SpeechContext) -> String {
    let data = first(document, ".data").map(element_text);
    let abstract_text = first(document, ".abstract").map(element_text);
    let description = first(document, "meta[name=description]")
        .and_then(|m| m.value().attr("content").map(str::to_string));

    [data, context.date_hint.clone(), abstract_text, description]
        .into_iter()
        .flatten()
        .find_map(|text| normalize_date(&text))
        .unwrap_or_default()
}

/// Extracts a document from a speech page
///
/// Only the body is required: a page without a body container is
/// `Malformed`, one whose body is blank is `Empty`. Title, date and location
/// are best effort and may come back empty.
pub fn parse_speech_html(
    html: &str,
    url: &str,
    context: &SpeechContext,
) -> Result<ParsedSpeech, ParseFailure> {
    let document = Html::parse_document(html);

    let Some(container) = body_container(&document) else {
        return Err(ParseFailure::Malformed {
            url: url.to_string(),
        });
    };

    let text = body_text(container);
    if text.trim().is_empty() {
        return Err(ParseFailure::Empty {
            url: url.to_string(),
        });
    }

    let title = context
        .title_hint
        .as_deref()
        .map(|hint| clean_text(&repair_mojibake(hint)))
        .filter(|hint| !hint.is_empty())
        .unwrap_or_else(|| title_from_document(&document));

    Ok(ParsedSpeech {
        title,
        date: date_from_document(&document, context),
        location: location_from_document(&document, container),
        text,
    })
}

/// Language code from a document URL: `/content/<slug>/<lang>/...`
pub fn served_language(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let segments: Vec<&str> = url.path_segments()?.collect();
    match segments.as_slice() {
        ["content", _, lang, ..]
            if lang.len() == 2 && lang.chars().all(|c| c.is_ascii_alphabetic()) =>
        {
            Some(lang.to_ascii_uppercase())
        }
        _ => None,
    }
}

/// Link to the page's translation into `language`, if the page offers one
pub fn find_translation_url(html: &str, page_url: &str, language: &Language) -> Option<String> {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok()?;
    let anchors = css(".translation a[href]")?;

    document
        .select(&anchors)
        .find(|a| element_text(*a).eq_ignore_ascii_case(language.code()))
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| base.join(href).ok())
        .map(|u| u.to_string())
}

/// Fetches and parses candidate documents
pub struct SpeechPageParser;

impl SpeechPageParser {
    /// Fetches a candidate and turns it into a record ready for the store
    ///
    /// When the page is served in another language than requested and lists
    /// a translation into it, the translation is fetched and parsed instead.
    /// A failed translation fetch falls back to the page as served.
    pub async fn parse(
        fetcher: &Fetcher,
        candidate: &Candidate,
        context: &SpeechContext,
    ) -> Result<SpeechRecord, PageFailure> {
        let (mut url, mut body) = match fetcher.fetch(&candidate.url).await {
            FetchResult::Success {
                final_url, body, ..
            } => (final_url, body),
            other => return Err(PageFailure::Fetch(other)),
        };

        let wanted = context.language.code();
        if served_language(&url).is_some_and(|served| served != wanted) {
            if let Some(translation) = find_translation_url(&body, &url, &context.language) {
                tracing::debug!("Following {} translation {}", wanted, translation);
                match fetcher.fetch(&translation).await {
                    FetchResult::Success {
                        final_url,
                        body: translated,
                        ..
                    } => {
                        url = final_url;
                        body = translated;
                    }
                    other => {
                        tracing::warn!(
                            "Translation {} unavailable ({}), keeping {}",
                            translation,
                            other,
                            url
                        );
                    }
                }
            }
        }

        let parsed = parse_speech_html(&body, &url, context).map_err(PageFailure::Parse)?;
        let language = served_language(&url).unwrap_or_else(|| wanted.to_string());

        Ok(SpeechRecord {
            pope_name: context.pope_name.clone(),
            section: context.section.as_str().to_string(),
            year: context.year.to_string(),
            date: parsed.date,
            location: parsed.location,
            title: parsed.title,
            language,
            url,
            text: parsed.text,
        })
    }
}
