//! Legal status of an establishment and the two-tier classifier behind it.
//!
//! The FINESS registry records a numeric legal-status code on the parent
//! legal entity. Code ranges map to three categories; when no code can be
//! resolved for a site, a keyword scan over the establishment display name
//! is used as a heuristic of last resort. A name that matches nothing is
//! tagged [`LegalStatus::Unresolved`] - the classifier never guesses a
//! default.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Legal-status category of an establishment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LegalStatus {
    /// Public hospital (code 1-52)
    Public,
    /// Private non-profit (code 60-66): associations, foundations, mutuals
    PrivateNonProfit,
    /// Private commercial (code 67-95): clinics and corporate operators
    PrivateForProfit,
    /// No code and no conclusive name match
    #[default]
    Unresolved,
}

impl LegalStatus {
    /// French label used in the persisted fact table and the dashboard.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Public => "Public",
            Self::PrivateNonProfit => "Privé non lucratif",
            Self::PrivateForProfit => "Privé lucratif",
            Self::Unresolved => "Inconnu",
        }
    }

    /// Whether this is one of the two private categories.
    #[must_use]
    pub const fn is_private(self) -> bool {
        matches!(self, Self::PrivateNonProfit | Self::PrivateForProfit)
    }

    /// Whether any category was resolved at all.
    #[must_use]
    pub const fn is_resolved(self) -> bool {
        !matches!(self, Self::Unresolved)
    }
}

impl From<&str> for LegalStatus {
    fn from(label: &str) -> Self {
        match label {
            "Public" => Self::Public,
            "Privé non lucratif" => Self::PrivateNonProfit,
            "Privé lucratif" => Self::PrivateForProfit,
            _ => Self::Unresolved,
        }
    }
}

impl fmt::Display for LegalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Persisted as its French label so the Parquet column stays a plain string.
impl Serialize for LegalStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for LegalStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from(label.as_str()))
    }
}

/// How a row's status was resolved, reported in summary statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSource {
    /// Site resolved through the ET -> EJ correspondence chain
    Correspondence,
    /// The site identifier itself matched a parent-entity identifier
    ParentEntity,
    /// Keyword heuristic over the display name
    NameHeuristic,
    /// Nothing matched
    Unresolved,
}

impl StatusSource {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Correspondence => "correspondance ET-EJ",
            Self::ParentEntity => "entité juridique",
            Self::NameHeuristic => "heuristique nom",
            Self::Unresolved => "non résolu",
        }
    }
}

/// Classify a numeric legal-status code using the fixed range table.
///
/// Codes outside the known ranges - and missing codes - are unresolved,
/// never an error; the caller decides whether to fall back on the name
/// heuristic.
#[must_use]
pub fn classify_status_code(code: Option<i64>) -> LegalStatus {
    match code {
        Some(c) if (1..=52).contains(&c) => LegalStatus::Public,
        Some(c) if (60..=66).contains(&c) => LegalStatus::PrivateNonProfit,
        Some(c) if (67..=95).contains(&c) => LegalStatus::PrivateForProfit,
        _ => LegalStatus::Unresolved,
    }
}

// Private indicators are scanned before public ones: a "CLINIQUE DU CENTRE
// HOSPITALIER PRIVE" style name must not land in the public bucket.
const NONPROFIT_KEYWORDS: [&str; 4] = ["ASSOCIATION", "FONDATION", "CROIX ROUGE", "MUTUALISTE"];

const FOR_PROFIT_KEYWORDS: [&str; 9] = [
    "CLINIQUE",
    "POLYCLINIQUE",
    "CENTRE DE SANTE",
    "CABINET",
    "SOCIETE",
    "S.A.",
    "SAS",
    "SARL",
    "SELARL",
];

const PUBLIC_KEYWORDS: [&str; 12] = [
    "CHU",
    "HCL",
    "CENTRE HOSPITALIER",
    "HOPITAL",
    "HÔPITAL",
    "AP-HP",
    "APHP",
    "ASSISTANCE PUBLIQUE",
    "HOSPICES CIVILS",
    "ETABLISSEMENT PUBLIC",
    "EPSM",
    "EHPAD PUBLIC",
];

/// Classify an establishment by its display name.
///
/// Keyword scan is case-insensitive (names are uppercased first). Private
/// indicators win over public ones; a name matching neither list stays
/// [`LegalStatus::Unresolved`].
#[must_use]
pub fn classify_name(name: &str) -> LegalStatus {
    let name = name.to_uppercase();

    for keyword in NONPROFIT_KEYWORDS {
        if name.contains(keyword) {
            return LegalStatus::PrivateNonProfit;
        }
    }
    for keyword in FOR_PROFIT_KEYWORDS {
        if name.contains(keyword) {
            return LegalStatus::PrivateForProfit;
        }
    }

    for keyword in PUBLIC_KEYWORDS {
        if name.contains(keyword) {
            return LegalStatus::Public;
        }
    }
    // "CH" and "CHIC" only count as standalone words, otherwise they
    // fire inside ordinary words.
    let is_word = |word: &str| name.split_whitespace().any(|w| w == word);
    if is_word("CH") || is_word("CHIC") {
        return LegalStatus::Public;
    }

    LegalStatus::Unresolved
}
