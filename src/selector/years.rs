use crate::SelectorError;
use std::collections::BTreeSet;

const MIN_YEAR: u16 = 1000;
const MAX_YEAR: u16 = 9999;

/// Parses a year specification into a sorted, de-duplicated list
///
/// Accepts comma-separated parts, each either a single year (`2020`) or an
/// inclusive range (`1963-2026`). A reversed range is swapped rather than
/// rejected.
///
/// # Example
///
/// ```
/// use vatican_speeches::selector::parse_years;
///
/// assert_eq!(parse_years("2021-2019,2023").unwrap(), vec![2019, 2020, 2021, 2023]);
/// ```
pub fn parse_years(spec: &str) -> Result<Vec<u16>, SelectorError> {
    let invalid = || SelectorError::InvalidYears(spec.to_string());
    let mut years = BTreeSet::new();

    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((lo, hi)) => {
                let lo = parse_year(lo.trim()).ok_or_else(invalid)?;
                let hi = parse_year(hi.trim()).ok_or_else(invalid)?;
                let (lo, hi) = if lo > hi { (hi, lo) } else { (lo, hi) };
                years.extend(lo..=hi);
            }
            None => {
                years.insert(parse_year(part).ok_or_else(invalid)?);
            }
        }
    }

    if years.is_empty() {
        return Err(invalid());
    }

    Ok(years.into_iter().collect())
}

fn parse_year(text: &str) -> Option<u16> {
    if text.len() != 4 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<u16>()
        .ok()
        .filter(|y| (MIN_YEAR..=MAX_YEAR).contains(y))
}
