//! Crawl selectors
//!
//! A run is driven by the cross-product `{popes} × {sections} × {years} ×
//! {languages}`. This module parses each axis from its command-line form and
//! walks the product lazily, one [`Selector`] at a time.

mod section;
mod years;

pub use section::Section;
pub use years::parse_years;

use crate::SelectorError;
use std::fmt;
use std::str::FromStr;

/// A two-letter language code, stored uppercase (`EN`, `IT`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Language(String);

impl Language {
    /// The uppercase code, as stored in the `language` column
    pub fn code(&self) -> &str {
        &self.0
    }

    /// The lowercase code, as used in site paths (`/content/francesco/en/...`)
    pub fn path_segment(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl Default for Language {
    fn default() -> Self {
        Self("EN".to_string())
    }
}

impl FromStr for Language {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code.to_ascii_uppercase()))
        } else {
            Err(SelectorError::InvalidLanguage(code.to_string()))
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One crawl slice: a (pope, section, year, language) tuple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub pope: String,
    pub section: Section,
    pub year: u16,
    pub language: Language,
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.pope, self.section, self.year, self.language
        )
    }
}

/// The full set of selector axes for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorSet {
    pub popes: Vec<String>,
    pub sections: Vec<Section>,
    pub years: Vec<u16>,
    pub languages: Vec<Language>,
}

impl SelectorSet {
    /// Builds a selector set from the command-line text of each axis
    ///
    /// `popes`, `sections` and `languages` are comma-separated lists; `years`
    /// follows the grammar of [`parse_years`]. Duplicate entries are dropped
    /// while keeping the declared order.
    pub fn parse(
        popes: &str,
        sections: &str,
        years: &str,
        languages: &str,
    ) -> Result<Self, SelectorError> {
        let popes = dedup(
            popes
                .split(',')
                .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
                .filter(|p| !p.is_empty())
                .collect(),
        );
        if popes.is_empty() {
            return Err(SelectorError::NoPopes);
        }

        let sections = dedup(parse_list::<Section>(sections)?);
        if sections.is_empty() {
            return Err(SelectorError::Empty("sections"));
        }

        let languages = dedup(parse_list::<Language>(languages)?);
        if languages.is_empty() {
            return Err(SelectorError::Empty("languages"));
        }

        Ok(Self {
            popes,
            sections,
            years: parse_years(years)?,
            languages,
        })
    }

    /// Number of slices crawled for each pope
    pub fn slices_per_pope(&self) -> usize {
        self.sections.len() * self.years.len() * self.languages.len()
    }

    /// Total number of slices in the run
    pub fn total_slices(&self) -> usize {
        self.popes.len() * self.slices_per_pope()
    }

    /// Lazily walks sections × years × languages for one pope, in declared order
    pub fn selectors_for<'a>(&'a self, pope: &'a str) -> impl Iterator<Item = Selector> + 'a {
        self.sections.iter().flat_map(move |&section| {
            self.years.iter().flat_map(move |&year| {
                self.languages.iter().map(move |language| Selector {
                    pope: pope.to_string(),
                    section,
                    year,
                    language: language.clone(),
                })
            })
        })
    }
}

fn parse_list<T: FromStr<Err = SelectorError>>(text: &str) -> Result<Vec<T>, SelectorError> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect()
}

fn dedup<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
