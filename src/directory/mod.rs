//! Pope directory resolver
//!
//! Maps a human-readable pope name to the slug the site uses in its paths
//! (`Francis` → `francesco`) and enriches it with biographical metadata
//! from the pope's landing page.
//!
//! Resolution order:
//! 1. the built-in table of modern popes and their common aliases
//! 2. the site's holy father index, fetched once and cached
//! 3. a slug derived from the name, when the name looks like a pope's
//!
//! The directory never writes to the store; the coordinator does that.

mod biography;
mod names;

pub use biography::{parse_biography, parse_directory_listing, Biography, DirectoryEntry};
pub use names::{derive_slug, looks_like_pope_display, name_key, normalize_display_name};

use crate::crawler::{FetchResult, Fetcher};
use crate::storage::PopeRecord;
use thiserror::Error;
use url::Url;

/// No plausible slug could be found for a name
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot resolve pope '{name}': {reason}")]
pub struct ResolutionFailed {
    pub name: String,
    pub reason: String,
}

/// An entry of the built-in pope table
#[derive(Debug, Clone, Copy)]
pub struct KnownPope {
    pub display_name: &'static str,
    pub slug: &'static str,
    pub number: &'static str,
    pub aliases: &'static [&'static str],
}

/// Popes whose documents are published under `/content/<slug>/`
pub const KNOWN_POPES: &[KnownPope] = &[
    KnownPope {
        display_name: "Leo XIV",
        slug: "leo-xiv",
        number: "267",
        aliases: &["leone xiv", "leo pp xiv", "leon xiv"],
    },
    KnownPope {
        display_name: "Francis",
        slug: "francesco",
        number: "266",
        aliases: &["francesco", "franciscus", "francisco", "francois", "franziskus"],
    },
    KnownPope {
        display_name: "Benedict XVI",
        slug: "benedict-xvi",
        number: "265",
        aliases: &["benedetto xvi", "benedictus xvi", "benedicto xvi", "benoit xvi"],
    },
    KnownPope {
        display_name: "John Paul II",
        slug: "john-paul-ii",
        number: "264",
        aliases: &["giovanni paolo ii", "ioannes paulus ii", "juan pablo ii", "jean paul ii"],
    },
    KnownPope {
        display_name: "John Paul I",
        slug: "john-paul-i",
        number: "263",
        aliases: &["giovanni paolo i", "ioannes paulus i", "juan pablo i", "jean paul i"],
    },
    KnownPope {
        display_name: "Paul VI",
        slug: "paul-vi",
        number: "262",
        aliases: &["paolo vi", "paulus vi", "pablo vi"],
    },
    KnownPope {
        display_name: "John XXIII",
        slug: "john-xxiii",
        number: "261",
        aliases: &["giovanni xxiii", "ioannes xxiii", "juan xxiii", "jean xxiii"],
    },
    KnownPope {
        display_name: "Pius XII",
        slug: "pius-xii",
        number: "260",
        aliases: &["pio xii"],
    },
    KnownPope {
        display_name: "Pius XI",
        slug: "pius-xi",
        number: "259",
        aliases: &["pio xi"],
    },
    KnownPope {
        display_name: "Benedict XV",
        slug: "benedict-xv",
        number: "258",
        aliases: &["benedetto xv", "benedictus xv"],
    },
    KnownPope {
        display_name: "Pius X",
        slug: "pius-x",
        number: "257",
        aliases: &["pio x"],
    },
    KnownPope {
        display_name: "Leo XIII",
        slug: "leo-xiii",
        number: "256",
        aliases: &["leone xiii"],
    },
];

/// Looks a name up in the built-in table, aliases included
pub fn find_known(name: &str) -> Option<&'static KnownPope> {
    let key = name_key(name);
    KNOWN_POPES.iter().find(|pope| {
        name_key(pope.display_name) == key || pope.aliases.iter().any(|alias| *alias == key)
    })
}

/// Resolves pope names against the built-in table and the live site
pub struct PopeDirectory {
    base_url: Url,
    listing: Option<Vec<DirectoryEntry>>,
}

impl PopeDirectory {
    /// Creates a directory for the site rooted at `base_url`
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            listing: None,
        }
    }

    /// Resolves a display name to a pope record
    ///
    /// Biographical fields are best effort: a failed or unparseable landing
    /// page leaves them empty and is not an error. Only a name for which no
    /// slug can be found fails.
    ///
    /// The ordinal of a pope in the built-in table always comes from the
    /// table, so it does not depend on whether the landing page answered.
    /// Other popes take it from the landing page and may be left without one.
    pub async fn resolve(
        &mut self,
        fetcher: &Fetcher,
        name: &str,
    ) -> Result<PopeRecord, ResolutionFailed> {
        let display_name = normalize_display_name(name);
        if display_name.is_empty() {
            return Err(ResolutionFailed {
                name: name.to_string(),
                reason: "empty name".to_string(),
            });
        }

        let Some((pope_name, slug, known_number)) =
            self.lookup_slug(fetcher, &display_name).await
        else {
            return Err(ResolutionFailed {
                name: display_name,
                reason: "not in the pope table or the site index, and not shaped like a pope's name"
                    .to_string(),
            });
        };

        tracing::debug!("Resolved '{}' to slug '{}'", display_name, slug);

        let biography = self.fetch_biography(fetcher, &slug).await;
        let pope_number = if known_number.is_empty() {
            biography.pope_number
        } else {
            known_number
        };

        Ok(PopeRecord {
            pope_name,
            pope_slug: slug,
            pope_number,
            secular_name: biography.secular_name,
            place_of_birth: biography.place_of_birth,
            pontificate_begin: biography.pontificate_begin,
            pontificate_end: biography.pontificate_end,
        })
    }

    /// Returns (canonical display name, slug, ordinal from the table)
    async fn lookup_slug(
        &mut self,
        fetcher: &Fetcher,
        display_name: &str,
    ) -> Option<(String, String, String)> {
        if let Some(known) = find_known(display_name) {
            return Some((
                known.display_name.to_string(),
                known.slug.to_string(),
                known.number.to_string(),
            ));
        }

        let key = name_key(display_name);
        let listing = self.listing(fetcher).await;
        if let Some(entry) = listing.iter().find(|e| name_key(&e.display_name) == key) {
            return Some((entry.display_name.clone(), entry.slug.clone(), String::new()));
        }

        if looks_like_pope_display(display_name) {
            let slug = derive_slug(display_name);
            tracing::debug!("Deriving slug '{}' from the name '{}'", slug, display_name);
            return Some((display_name.to_string(), slug, String::new()));
        }

        None
    }

    /// The holy father index, fetched on first use
    async fn listing(&mut self, fetcher: &Fetcher) -> &[DirectoryEntry] {
        if self.listing.is_none() {
            let entries = match self.base_url.join("holy_father/index.htm") {
                Ok(url) => match fetcher.fetch(url.as_str()).await {
                    FetchResult::Success {
                        body, final_url, ..
                    } => {
                        let page_url = Url::parse(&final_url).unwrap_or(url);
                        parse_directory_listing(&body, &page_url)
                    }
                    other => {
                        tracing::warn!("Pope index {} unavailable: {}", url, other);
                        Vec::new()
                    }
                },
                Err(e) => {
                    tracing::warn!("Cannot build pope index URL: {}", e);
                    Vec::new()
                }
            };
            tracing::debug!("Pope index lists {} popes", entries.len());
            self.listing = Some(entries);
        }

        self.listing.as_deref().unwrap_or_default()
    }

    async fn fetch_biography(&self, fetcher: &Fetcher, slug: &str) -> Biography {
        let url = match self.base_url.join(&format!("content/{}/en.html", slug)) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Cannot build landing page URL for '{}': {}", slug, e);
                return Biography::default();
            }
        };

        match fetcher.fetch(url.as_str()).await {
            FetchResult::Success { body, .. } => parse_biography(&body),
            other => {
                tracing::warn!("Biography page {} unavailable: {}", url, other);
                Biography::default()
            }
        }
    }
}
