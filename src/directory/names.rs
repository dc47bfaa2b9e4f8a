//! Pope display-name handling

use crate::text::fold_diacritics;

/// Honorifics that may precede a name on the command line
const PREFIXES: [&str; 4] = ["pope ", "papa ", "pape ", "saint "];

/// Trims and collapses whitespace runs to single spaces
pub fn normalize_display_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Comparison key for a display name
///
/// Lowercase, diacritics folded, hyphens treated as spaces and a leading
/// honorific removed, so `"  Pope  François "`, `"francois"` and `"FRANCOIS"`
/// share a key.
pub fn name_key(name: &str) -> String {
    let folded = fold_diacritics(&name.replace('-', " "));
    let mut key = normalize_display_name(&folded);

    for prefix in PREFIXES {
        if let Some(rest) = key.strip_prefix(prefix) {
            key = rest.to_string();
            break;
        }
    }

    key
}

fn is_roman_numeral(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| matches!(c.to_ascii_uppercase(), 'I' | 'V' | 'X' | 'L' | 'C' | 'D' | 'M'))
}

fn is_title_case_word(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => {
            let rest: Vec<char> = chars.collect();
            !rest.is_empty() && rest.iter().all(|c| c.is_lowercase())
        }
        _ => false,
    }
}

/// True for names shaped like a pope's display name
///
/// Either a single Title-case word (`Francis`) or Title-case words followed
/// by a Roman numeral (`John Paul II`). Rejects headings such as
/// `ROMAN CURIA` that share the same link patterns on the site.
pub fn looks_like_pope_display(name: &str) -> bool {
    let name = normalize_display_name(name);
    let parts: Vec<&str> = name.split(' ').filter(|p| !p.is_empty()).collect();

    match parts.as_slice() {
        [] => false,
        [single] => is_title_case_word(single),
        [words @ .., numeral] => is_roman_numeral(numeral) && words.iter().all(|w| is_title_case_word(w)),
    }
}

/// Derives a slug from a display name: `John Paul II` → `john-paul-ii`
pub fn derive_slug(name: &str) -> String {
    fold_diacritics(&normalize_display_name(name))
        .split(' ')
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
