//! The denormalized fact table: one row per establishment x year x GHM.

use serde::{Deserialize, Serialize};

use crate::models::status::LegalStatus;

/// One casemix fact row.
///
/// Identifier and measure fields come from the raw activity export; the
/// status and financial fields are filled by the enrichment passes and are
/// `None` / [`LegalStatus::Unresolved`] until then.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactRow {
    /// Site identifier (FINESS ET, sometimes already an EJ code)
    pub finess: String,
    /// Activity year
    pub year: u16,
    /// Procedure-group code
    pub ghm_code: String,
    /// GHM label from the activity export
    pub label: String,
    /// Patient count; always > 0 for retained rows
    pub patient_count: u32,
    /// Mean length-of-stay, days
    pub mean_stay: Option<f64>,
    /// Mean patient age, years
    pub mean_age: Option<f64>,
    /// Sex ratio, % male
    pub sex_ratio: Option<f64>,
    /// Death rate, %
    pub death_rate: Option<f64>,
    /// Activity domain (DA)
    pub activity_domain: Option<String>,
    /// Activity group (GP)
    pub activity_group: Option<String>,
    /// Procedure classification code
    pub classification: Option<String>,

    // Filled by the status enrichment pass
    /// Legal-status category of the establishment
    pub legal_status: LegalStatus,
    /// Detail behind the resolution (registry code or heuristic tag)
    pub status_detail: Option<String>,

    // Filled by the tariff enrichment pass
    /// Public-sector tariff for this GHM and year, EUR
    pub public_tariff: Option<f64>,
    /// Private-sector tariff for this GHM and year, EUR
    pub private_tariff: Option<f64>,
    /// Estimated public revenue = patient count x public tariff
    pub public_revenue: Option<f64>,
    /// Estimated private revenue = patient count x private tariff
    pub private_revenue: Option<f64>,
}

impl FactRow {
    /// Build an un-enriched row from ingestion fields.
    #[must_use]
    pub fn new(
        finess: impl Into<String>,
        year: u16,
        ghm_code: impl Into<String>,
        label: impl Into<String>,
        patient_count: u32,
    ) -> Self {
        Self {
            finess: finess.into(),
            year,
            ghm_code: ghm_code.into(),
            label: label.into(),
            patient_count,
            mean_stay: None,
            mean_age: None,
            sex_ratio: None,
            death_rate: None,
            activity_domain: None,
            activity_group: None,
            classification: None,
            legal_status: LegalStatus::Unresolved,
            status_detail: None,
            public_tariff: None,
            private_tariff: None,
            public_revenue: None,
            private_revenue: None,
        }
    }
}

/// Ingestion retention predicate.
///
/// A row survives only with a positive patient count and a non-empty label
/// that is not one of the exporter's "Total" aggregate lines.
#[must_use]
pub fn is_retainable(patient_count: Option<u32>, label: &str) -> bool {
    let Some(count) = patient_count else {
        return false;
    };
    if count == 0 || label.is_empty() {
        return false;
    }
    !label.to_lowercase().contains("total")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retention_predicate() {
        assert!(is_retainable(Some(3), "Arthroplastie du genou"));
        assert!(!is_retainable(Some(0), "Arthroplastie du genou"));
        assert!(!is_retainable(None, "Arthroplastie du genou"));
        assert!(!is_retainable(Some(3), ""));
        assert!(!is_retainable(Some(3), "Total général"));
        assert!(!is_retainable(Some(3), "TOTAL"));
    }

    #[test]
    fn test_new_row_is_unenriched() {
        let row = FactRow::new("750712184", 2023, "01C031", "Craniotomies", 12);
        assert_eq!(row.legal_status, LegalStatus::Unresolved);
        assert!(row.public_tariff.is_none());
        assert!(row.public_revenue.is_none());
    }
}
