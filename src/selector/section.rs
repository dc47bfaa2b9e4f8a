use crate::SelectorError;
use std::fmt;
use std::str::FromStr;

/// A document category as laid out in the site's archive
///
/// The string form is the path segment the site uses, e.g.
/// `/content/francesco/en/homilies/2020.index.html`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Angelus,
    Audiences,
    Homilies,
    Speeches,
    Messages,
    Letters,
    Encyclicals,
    ApostolicExhortations,
    ApostolicLetters,
    ApostolicConstitutions,
    MotuProprio,
    Prayers,
    Travels,
    Cotidie,
}

impl Section {
    /// Every section, in the order they are listed on a pope's landing page
    pub const ALL: [Section; 14] = [
        Section::Angelus,
        Section::Audiences,
        Section::Homilies,
        Section::Speeches,
        Section::Messages,
        Section::Letters,
        Section::Encyclicals,
        Section::ApostolicExhortations,
        Section::ApostolicLetters,
        Section::ApostolicConstitutions,
        Section::MotuProprio,
        Section::Prayers,
        Section::Travels,
        Section::Cotidie,
    ];

    /// The path segment (and stored value) for this section
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Angelus => "angelus",
            Self::Audiences => "audiences",
            Self::Homilies => "homilies",
            Self::Speeches => "speeches",
            Self::Messages => "messages",
            Self::Letters => "letters",
            Self::Encyclicals => "encyclicals",
            Self::ApostolicExhortations => "apost_exhortations",
            Self::ApostolicLetters => "apost_letters",
            Self::ApostolicConstitutions => "apost_constitutions",
            Self::MotuProprio => "motu_proprio",
            Self::Prayers => "prayers",
            Self::Travels => "travels",
            Self::Cotidie => "cotidie",
        }
    }

    fn expected_list() -> String {
        Self::ALL
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|section| section.as_str() == wanted)
            .ok_or_else(|| SelectorError::UnknownSection {
                given: s.trim().to_string(),
                expected: Self::expected_list(),
            })
    }
}
