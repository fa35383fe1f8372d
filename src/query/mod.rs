//! Read-only query layer backing the dashboard views.
//!
//! A [`QuerySession`] wraps the enriched fact table loaded once at
//! startup. Each filter change selects a [`FilteredView`] - a boolean
//! mask over the shared table plus lazily computed aggregates - cached
//! per normalized filter key so redrawing the same selection costs
//! nothing. An empty selection is a [`Selection::NoData`] outcome, not
//! an error.

pub mod aggregate;
pub mod cache;
pub mod filter;

use std::sync::Arc;

use chrono::Local;

use crate::error::{CasemixError, Result};
use crate::models::FactRow;
use crate::registry::names::EstablishmentDirectory;
use aggregate::{KeyFigures, LabelVariation, LabelVolume, YearPoint};
use cache::SingleSlotCache;
use filter::{FilterKey, FilterSelection, filter_rows};

/// Labels below this start-year volume are excluded from variation
/// rankings, their percentages are meaningless.
pub const MIN_VARIATION_START: u64 = 5;

/// Sortable columns of a CSV export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    /// Patient count, descending
    PatientCount,
    /// Estimated public revenue, descending, nulls last
    PublicRevenue,
    /// GHM label, ascending
    Label,
}

/// Outcome of applying a filter selection.
pub enum Selection<'a> {
    /// No row matches the selection
    NoData,
    /// At least one row matches
    View(&'a mut FilteredView),
}

/// The rows matching one filter combination, with memoized aggregates.
#[derive(Debug)]
pub struct FilteredView {
    base: Arc<Vec<FactRow>>,
    indices: Vec<usize>,
    figures: Option<KeyFigures>,
}

impl FilteredView {
    fn new(base: Arc<Vec<FactRow>>, indices: Vec<usize>) -> Self {
        Self {
            base,
            indices,
            figures: None,
        }
    }

    /// The matching rows, in table order.
    pub fn rows(&self) -> impl Iterator<Item = &FactRow> + Clone {
        self.indices.iter().map(|&idx| &self.base[idx])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Headline figures, computed once per view.
    pub fn key_figures(&mut self) -> &KeyFigures {
        if self.figures.is_none() {
            self.figures = Some(aggregate::key_figures(self.rows()));
        }
        match &self.figures {
            Some(figures) => figures,
            None => unreachable!(),
        }
    }

    /// Top-N GHM labels by patient volume.
    #[must_use]
    pub fn top_labels(&self, n: usize) -> Vec<LabelVolume> {
        aggregate::top_labels(self.rows(), n)
    }

    /// Yearly totals and weighted means, ascending.
    #[must_use]
    pub fn evolution(&self) -> Vec<YearPoint> {
        aggregate::evolution_by_year(self.rows())
    }

    /// Volume changes per label between the boundary years.
    #[must_use]
    pub fn variations(&self) -> Vec<LabelVariation> {
        aggregate::label_variations(self.rows(), MIN_VARIATION_START)
    }

    /// Top activity domains by volume.
    #[must_use]
    pub fn activity_domains(&self, n: usize) -> Vec<LabelVolume> {
        aggregate::classification_breakdown(self.rows(), |r| r.activity_domain.as_deref(), n)
    }

    /// Top classification codes by volume.
    #[must_use]
    pub fn classifications(&self, n: usize) -> Vec<LabelVolume> {
        aggregate::classification_breakdown(self.rows(), |r| r.classification.as_deref(), n)
    }

    /// Render the view as a semicolon-delimited CSV document.
    ///
    /// Missing measures export as empty cells, never as zeroes.
    pub fn export_csv(&self, sort: SortColumn, limit: Option<usize>) -> Result<String> {
        let mut sorted: Vec<&FactRow> = self.rows().collect();
        match sort {
            SortColumn::PatientCount => {
                sorted.sort_by(|a, b| b.patient_count.cmp(&a.patient_count));
            }
            SortColumn::PublicRevenue => sorted.sort_by(|a, b| {
                b.public_revenue
                    .partial_cmp(&a.public_revenue)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
            SortColumn::Label => sorted.sort_by(|a, b| a.label.cmp(&b.label)),
        }
        if let Some(limit) = limit {
            sorted.truncate(limit);
        }

        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .from_writer(Vec::new());
        writer.write_record([
            "finess",
            "annee",
            "ghm",
            "libelle",
            "effectif",
            "duree_moyenne",
            "age_moyen",
            "taux_deces",
            "statut_juridique",
            "tarif_public",
            "tarif_prive",
            "recette_publique",
            "recette_privee",
        ])?;
        let cell = |value: Option<f64>| value.map(|v| format!("{v:.2}")).unwrap_or_default();
        for row in sorted {
            writer.write_record([
                row.finess.clone(),
                row.year.to_string(),
                row.ghm_code.clone(),
                row.label.clone(),
                row.patient_count.to_string(),
                cell(row.mean_stay),
                cell(row.mean_age),
                cell(row.death_rate),
                row.legal_status.label().to_string(),
                cell(row.public_tariff),
                cell(row.private_tariff),
                cell(row.public_revenue),
                cell(row.private_revenue),
            ])?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| CasemixError::csv_error(format!("Failed to finalize CSV export: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|e| CasemixError::csv_error(format!("CSV export is not valid UTF-8: {e}")))
    }
}

/// Suggested filename for an export of the given establishment.
#[must_use]
pub fn export_filename(establishment: Option<&str>) -> String {
    let scope = establishment.unwrap_or("tous");
    format!("casemix_{scope}_{}.csv", Local::now().format("%Y%m%d"))
}

/// One dashboard session over an in-memory fact table.
pub struct QuerySession {
    base: Arc<Vec<FactRow>>,
    names: EstablishmentDirectory,
    cache: SingleSlotCache<FilterKey, FilteredView>,
}

impl QuerySession {
    #[must_use]
    pub fn new(rows: Vec<FactRow>) -> Self {
        Self::with_names(rows, EstablishmentDirectory::default())
    }

    /// Session with a display-name directory for establishment labelling.
    #[must_use]
    pub fn with_names(rows: Vec<FactRow>, names: EstablishmentDirectory) -> Self {
        Self {
            base: Arc::new(rows),
            names,
            cache: SingleSlotCache::new(),
        }
    }

    /// Display label for an establishment, "Inconnu" when unmapped.
    #[must_use]
    pub fn establishment_label(&self, finess: &str) -> &str {
        self.names.display_name(finess)
    }

    /// Total rows in the underlying table, before filtering.
    #[must_use]
    pub fn table_len(&self) -> usize {
        self.base.len()
    }

    /// Distinct establishments, sorted, for populating the filter widget.
    #[must_use]
    pub fn establishments(&self) -> Vec<String> {
        let mut finess: Vec<String> = self.base.iter().map(|r| r.finess.clone()).collect();
        finess.sort_unstable();
        finess.dedup();
        finess
    }

    /// Distinct activity years, sorted.
    #[must_use]
    pub fn years(&self) -> Vec<u16> {
        let mut years: Vec<u16> = self.base.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// Apply a filter selection, reusing the cached view when the
    /// normalized key is unchanged.
    pub fn select(&mut self, selection: &FilterSelection) -> Selection<'_> {
        let key = selection.key();
        let base = Arc::clone(&self.base);
        let view = self.cache.get_or_insert_with(key, || {
            let indices = filter_rows(&base, selection);
            FilteredView::new(base.clone(), indices)
        });
        if view.is_empty() {
            Selection::NoData
        } else {
            Selection::View(view)
        }
    }

    /// Drop the cached view, e.g. after the fact table was regenerated.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_fixture() -> QuerySession {
        let mut rows = vec![
            FactRow::new("750712184", 2022, "G1", "Arthroplastie du genou", 10),
            FactRow::new("750712184", 2023, "G1", "Arthroplastie du genou", 14),
            FactRow::new("750712184", 2023, "G2", "Pontage coronaire", 6),
            FactRow::new("690781810", 2023, "G1", "Arthroplastie du genou", 9),
        ];
        rows[0].mean_stay = Some(4.0);
        rows[1].mean_stay = Some(6.0);
        rows[1].public_revenue = Some(14_000.0);
        QuerySession::new(rows)
    }

    #[test]
    fn test_select_filters_and_aggregates() {
        let mut session = session_fixture();
        let selection = FilterSelection {
            establishment: Some("750712184".to_string()),
            ..FilterSelection::default()
        };
        let Selection::View(view) = session.select(&selection) else {
            panic!("expected a non-empty view");
        };
        assert_eq!(view.len(), 3);
        let figures = view.key_figures().clone();
        assert_eq!(figures.total_patients, 30);
        assert_eq!(figures.distinct_ghm, 2);
        // (10*4 + 14*6) / 24
        assert!((figures.mean_stay.unwrap() - 124.0 / 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_selection_is_no_data() {
        let mut session = session_fixture();
        let selection = FilterSelection {
            establishment: Some("000000000".to_string()),
            ..FilterSelection::default()
        };
        assert!(matches!(session.select(&selection), Selection::NoData));
    }

    #[test]
    fn test_cache_reuse_and_eviction() {
        let mut session = session_fixture();
        let all = FilterSelection::default();
        session.select(&all);
        assert_eq!(session.cache.cached_key(), Some(&all.key()));

        let narrowed = FilterSelection {
            years: vec![2023],
            ..FilterSelection::default()
        };
        session.select(&narrowed);
        assert_eq!(session.cache.cached_key(), Some(&narrowed.key()));

        // Equivalent selections share one slot.
        let narrowed_again = FilterSelection {
            years: vec![2023, 2023],
            ..FilterSelection::default()
        };
        assert_eq!(narrowed.key(), narrowed_again.key());
    }

    #[test]
    fn test_filter_widget_values() {
        let session = session_fixture();
        assert_eq!(session.establishments(), vec!["690781810", "750712184"]);
        assert_eq!(session.years(), vec![2022, 2023]);
    }

    #[test]
    fn test_export_csv_shape() {
        let mut session = session_fixture();
        let Selection::View(view) = session.select(&FilterSelection::default()) else {
            panic!("expected a view");
        };
        let csv = view.export_csv(SortColumn::PatientCount, Some(2)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3); // header + 2 rows
        assert!(lines[0].starts_with("finess;annee;ghm"));
        // Largest count first, missing revenue as empty cell.
        assert!(lines[1].starts_with("750712184;2023;G1"));
        assert!(lines[1].contains("14000.00"));
        assert!(lines[2].ends_with(";;;"));
    }

    #[test]
    fn test_establishment_labelling() {
        use crate::registry::ReferenceLoader;
        let names = crate::registry::names::NamesLoader
            .from_reader("Finess,Raison sociale\n750712184,AP-HP SAINT-LOUIS\n".as_bytes())
            .unwrap();
        let session = QuerySession::with_names(Vec::new(), names);
        assert_eq!(session.establishment_label("750712184"), "AP-HP SAINT-LOUIS");
        assert_eq!(session.establishment_label("000000000"), "Inconnu");
    }

    #[test]
    fn test_export_filename_scope() {
        let name = export_filename(Some("750712184"));
        assert!(name.starts_with("casemix_750712184_"));
        assert!(name.ends_with(".csv"));
        assert!(export_filename(None).starts_with("casemix_tous_"));
    }
}
