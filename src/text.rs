//! Text hygiene shared by the directory resolver and the page parser
//!
//! - whitespace cleanup (non-breaking spaces, runs of blanks)
//! - diacritic folding for name comparison
//! - repair of UTF-8 text that was decoded as Latin-1/Windows-1252
//! - date normalization to ISO `YYYY-MM-DD` across the site's languages

use chrono::NaiveDate;
use std::borrow::Cow;

/// Replaces non-breaking spaces, collapses whitespace runs and trims
pub fn clean_text(text: &str) -> String {
    text.replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercases and strips diacritics so that `François` and `francois` compare equal
pub fn fold_diacritics(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        match c {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => out.push('a'),
            'ç' | 'ć' | 'č' => out.push('c'),
            'ď' | 'đ' => out.push('d'),
            'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => out.push('e'),
            'ğ' => out.push('g'),
            'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' => out.push('i'),
            'ł' => out.push('l'),
            'ñ' | 'ń' | 'ň' => out.push('n'),
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => out.push('o'),
            'ř' => out.push('r'),
            'ś' | 'š' | 'ș' | 'ş' => out.push('s'),
            'ț' | 'ţ' | 'ť' => out.push('t'),
            'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => out.push('u'),
            'ý' | 'ÿ' => out.push('y'),
            'ź' | 'ż' | 'ž' => out.push('z'),
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'œ' => out.push_str("oe"),
            other => out.push(other),
        }
    }
    out
}

/// Re-decodes text that went through a UTF-8 → Latin-1 round trip
///
/// Only attempted when the text carries the usual markers (`Ã`, `Â`, `â`) and
/// every character maps back to a single byte; otherwise the input is
/// returned untouched.
pub fn repair_mojibake(text: &str) -> Cow<'_, str> {
    if !(text.contains('Ã') || text.contains('Â') || text.contains('â')) {
        return Cow::Borrowed(text);
    }

    let mut bytes = Vec::with_capacity(text.len());
    for c in text.chars() {
        match single_byte(c) {
            Some(b) => bytes.push(b),
            None => return Cow::Borrowed(text),
        }
    }

    match String::from_utf8(bytes) {
        Ok(repaired) => Cow::Owned(repaired),
        Err(_) => Cow::Borrowed(text),
    }
}

/// Maps a char to its Latin-1 byte, including the Windows-1252 0x80..0x9F block
fn single_byte(c: char) -> Option<u8> {
    let code = c as u32;
    if code <= 0xFF {
        return Some(code as u8);
    }
    let b = match c {
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(b)
}

/// True when the text contains a four-digit year between 1900 and 2099
pub fn contains_year(text: &str) -> bool {
    text.split(|c: char| !c.is_ascii_digit())
        .any(|run| run.len() == 4 && (run.starts_with("19") || run.starts_with("20")))
}

/// Month names as they appear on the site, diacritics folded
const MONTHS: [(&str, u32); 52] = [
    ("january", 1),
    ("gennaio", 1),
    ("enero", 1),
    ("janvier", 1),
    ("janeiro", 1),
    ("januar", 1),
    ("february", 2),
    ("febbraio", 2),
    ("febrero", 2),
    ("fevrier", 2),
    ("fevereiro", 2),
    ("februar", 2),
    ("march", 3),
    ("marzo", 3),
    ("mars", 3),
    ("marco", 3),
    ("marz", 3),
    ("april", 4),
    ("aprile", 4),
    ("abril", 4),
    ("avril", 4),
    ("may", 5),
    ("maggio", 5),
    ("mayo", 5),
    ("mai", 5),
    ("maio", 5),
    ("june", 6),
    ("giugno", 6),
    ("junio", 6),
    ("juin", 6),
    ("junho", 6),
    ("juni", 6),
    ("july", 7),
    ("luglio", 7),
    ("julio", 7),
    ("juillet", 7),
    ("julho", 7),
    ("juli", 7),
    ("august", 8),
    ("agosto", 8),
    ("aout", 8),
    ("september", 9),
    ("settembre", 9),
    ("septiembre", 9),
    ("septembre", 9),
    ("setembro", 9),
    ("october", 10),
    ("ottobre", 10),
    ("octubre", 10),
    ("octobre", 10),
    ("outubro", 10),
    ("oktober", 10),
];

const MONTHS_LATE: [(&str, u32); 10] = [
    ("november", 11),
    ("novembre", 11),
    ("noviembre", 11),
    ("novembro", 11),
    ("december", 12),
    ("dicembre", 12),
    ("diciembre", 12),
    ("decembre", 12),
    ("dezembro", 12),
    ("dezember", 12),
];

fn month_number(word: &str) -> Option<u32> {
    MONTHS
        .iter()
        .chain(MONTHS_LATE.iter())
        .find(|(name, _)| *name == word)
        .map(|(_, number)| *number)
}

/// Finds the first date in free text and renders it as `YYYY-MM-DD`
///
/// Understands numeric forms (`2025-04-13`, `13/04/2025`, `13.04.2025`) and
/// day-month-year or month-day-year phrases with English, Italian, Spanish,
/// French, Portuguese or German month names (`13 April 2025`,
/// `April 13, 2025`, `13 de abril de 2025`, `13. April 2025`, `1° maggio 2025`).
pub fn normalize_date(text: &str) -> Option<String> {
    let folded = fold_diacritics(&text.replace('\u{a0}', " "));

    for token in folded.split_whitespace() {
        let token = token.trim_matches(|c: char| !c.is_ascii_alphanumeric());
        for format in ["%Y-%m-%d", "%d/%m/%Y", "%d.%m.%Y"] {
            if let Ok(date) = NaiveDate::parse_from_str(token, format) {
                return Some(date.format("%Y-%m-%d").to_string());
            }
        }
    }

    let words: Vec<&str> = folded
        .split(|c: char| c.is_whitespace() || c == ',' || c == '.')
        .filter(|w| !w.is_empty())
        .collect();

    for (i, word) in words.iter().enumerate() {
        let Some(month) = month_number(word) else {
            continue;
        };

        // "13 April", "13 de abril", "April 13"
        let day = words[i.saturating_sub(2)..i]
            .iter()
            .rev()
            .find_map(|w| day_number(w))
            .or_else(|| words.get(i + 1).and_then(|w| day_number(w)));
        let year = words
            .iter()
            .skip(i + 1)
            .take(3)
            .find_map(|w| year_number(w));

        if let (Some(day), Some(year)) = (day, year) {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some(date.format("%Y-%m-%d").to_string());
            }
        }
    }

    None
}

/// Leading digits of a token as a day of month (`13`, `1°`, `2nd`, `1er`)
fn day_number(token: &str) -> Option<u32> {
    let digits: String = token.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() || digits.len() > 2 {
        return None;
    }
    digits.parse().ok().filter(|d| (1..=31).contains(d))
}

fn year_number(token: &str) -> Option<i32> {
    if token.len() == 4 && token.bytes().all(|b| b.is_ascii_digit()) {
        token.parse().ok()
    } else {
        None
    }
}
