//! Extraction from the site's pope pages
//!
//! Two page shapes are understood: the holy father index listing every pope
//! with a link to their landing page, and a pope's landing page carrying the
//! ordinal in `.subtitle` and a `.sinottico` summary table.

use super::names::{looks_like_pope_display, normalize_display_name};
use crate::text::{clean_text, repair_mojibake};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Biographical fields; each is empty when the page does not provide it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Biography {
    pub pope_number: String,
    pub pontificate_begin: String,
    pub pontificate_end: String,
    pub secular_name: String,
    pub place_of_birth: String,
}

/// One pope linked from the holy father index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub display_name: String,
    pub slug: String,
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&repair_mojibake(&element.text().collect::<Vec<_>>().join(" ")))
}

/// Parses a pope's landing page
pub fn parse_biography(html: &str) -> Biography {
    let document = Html::parse_document(html);
    let mut biography = Biography::default();

    if let Some(subtitle) = selector(".subtitle").and_then(|s| document.select(&s).next()) {
        let text = element_text(subtitle);
        biography.pope_number = first_integer(&text).unwrap_or(text);
    }

    let (Some(rows), Some(cells)) = (selector(".sinottico tr"), selector("td, th")) else {
        return biography;
    };

    let values: Vec<String> = document
        .select(&rows)
        .take(4)
        .map(|row| {
            row.select(&cells)
                .nth(1)
                .map(element_text)
                .unwrap_or_default()
        })
        .collect();

    let mut values = values.into_iter();
    biography.pontificate_begin = values.next().unwrap_or_default();
    biography.pontificate_end = values.next().unwrap_or_default();
    biography.secular_name = values.next().unwrap_or_default();
    biography.place_of_birth = values.next().unwrap_or_default();

    biography
}

fn first_integer(text: &str) -> Option<String> {
    text.split(|c: char| !c.is_ascii_digit())
        .find(|run| !run.is_empty())
        .map(str::to_string)
}

/// Extracts `/content/<slug>/en.html` links whose text looks like a pope name
///
/// Links inside `#corpo` are preferred; the whole page is scanned when that
/// container is missing. Entries are deduplicated by slug, first one wins.
pub fn parse_directory_listing(html: &str, page_url: &Url) -> Vec<DirectoryEntry> {
    let document = Html::parse_document(html);
    let Some(anchors) = selector("a[href]") else {
        return Vec::new();
    };

    let scoped: Vec<ElementRef<'_>> = selector("#corpo a[href]")
        .map(|s| document.select(&s).collect())
        .unwrap_or_default();
    let candidates: Vec<ElementRef<'_>> = if scoped.is_empty() {
        document.select(&anchors).collect()
    } else {
        scoped
    };

    let mut entries: Vec<DirectoryEntry> = Vec::new();
    for anchor in candidates {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(url) = page_url.join(href) else {
            continue;
        };
        let Some(slug) = landing_page_slug(&url) else {
            continue;
        };

        let display_name = normalize_display_name(&element_text(anchor));
        if !looks_like_pope_display(&display_name) {
            continue;
        }

        if entries.iter().all(|e| e.slug != slug) {
            entries.push(DirectoryEntry { display_name, slug });
        }
    }

    entries
}

/// `/content/<slug>/en.html` → `<slug>`
fn landing_page_slug(url: &Url) -> Option<String> {
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        ["content", slug, page] if *page == "en.html" || *page == "en.htm" => {
            Some(slug.to_string())
        }
        _ => None,
    }
}
