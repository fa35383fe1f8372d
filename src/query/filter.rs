//! Boolean-mask filtering over the enriched fact table.
//!
//! A selection is a conjunction of independent predicates, so the result
//! set never depends on the order criteria are applied in. The normalized
//! key of a selection doubles as the cache key of its aggregates.

use crate::models::FactRow;

/// The active filter combination of a dashboard session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSelection {
    /// Restrict to one establishment; `None` means all
    pub establishment: Option<String>,
    /// Restrict to these years; empty means all
    pub years: Vec<u16>,
    /// Restrict to one activity domain
    pub activity_domain: Option<String>,
    /// Restrict to one classification code
    pub classification: Option<String>,
    /// Case-insensitive substring search over the GHM label
    pub search: Option<String>,
}

/// Normalized, hashable form of a selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterKey {
    establishment: Option<String>,
    years: Vec<u16>,
    activity_domain: Option<String>,
    classification: Option<String>,
    search: Option<String>,
}

impl FilterSelection {
    /// Normalized cache key: years sorted, search lowercased, blank
    /// search treated as absent.
    #[must_use]
    pub fn key(&self) -> FilterKey {
        let mut years = self.years.clone();
        years.sort_unstable();
        years.dedup();
        FilterKey {
            establishment: self.establishment.clone(),
            years,
            activity_domain: self.activity_domain.clone(),
            classification: self.classification.clone(),
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_lowercase),
        }
    }

    /// Whether a row passes every active predicate.
    #[must_use]
    pub fn matches(&self, row: &FactRow) -> bool {
        if let Some(finess) = &self.establishment
            && row.finess != *finess
        {
            return false;
        }
        if !self.years.is_empty() && !self.years.contains(&row.year) {
            return false;
        }
        if let Some(domain) = &self.activity_domain
            && row.activity_domain.as_deref() != Some(domain.as_str())
        {
            return false;
        }
        if let Some(classification) = &self.classification
            && row.classification.as_deref() != Some(classification.as_str())
        {
            return false;
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
            && !row.label.to_lowercase().contains(&search.to_lowercase())
        {
            return false;
        }
        true
    }
}

/// Indices of the rows passing the selection, in table order.
#[must_use]
pub fn filter_rows(rows: &[FactRow], selection: &FilterSelection) -> Vec<usize> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| selection.matches(row))
        .map(|(idx, _)| idx)
        .collect()
}
