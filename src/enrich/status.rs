//! Legal-status resolution over the fact table.
//!
//! Resolution chain per row, first hit wins:
//! 1. site -> parent entity (correspondence) -> status registry;
//! 2. the site identifier itself treated as a parent-entity identifier,
//!    for exports that already carry an EJ code in the FINESS column;
//! 3. keyword heuristic over the establishment display name;
//! 4. the explicit `Inconnu` sentinel.
//!
//! A miss everywhere is a data-quality gap, not an error: it is counted
//! and reported, and the row stays in the table.

use serde::Serialize;

use crate::models::FactRow;
use crate::models::status::{LegalStatus, StatusSource, classify_name};
use crate::registry::correspondence::CorrespondenceTable;
use crate::registry::legal_status::LegalStatusRegistry;
use crate::registry::names::EstablishmentDirectory;

/// Outcome counts of one status-resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusResolutionStats {
    pub total_rows: usize,
    pub via_correspondence: usize,
    pub via_parent_entity: usize,
    pub via_name_heuristic: usize,
    pub unresolved: usize,
    /// Rows landing in either private category
    pub private_rows: usize,
}

impl StatusResolutionStats {
    /// Rows with a resolved category.
    #[must_use]
    pub fn resolved(&self) -> usize {
        self.via_correspondence + self.via_parent_entity + self.via_name_heuristic
    }

    /// Share of resolved rows, in percent.
    #[must_use]
    pub fn resolved_pct(&self) -> f64 {
        if self.total_rows == 0 {
            return 0.0;
        }
        self.resolved() as f64 / self.total_rows as f64 * 100.0
    }

    fn count(&mut self, source: StatusSource) {
        self.total_rows += 1;
        match source {
            StatusSource::Correspondence => self.via_correspondence += 1,
            StatusSource::ParentEntity => self.via_parent_entity += 1,
            StatusSource::NameHeuristic => self.via_name_heuristic += 1,
            StatusSource::Unresolved => self.unresolved += 1,
        }
    }
}

/// Resolve the status of a single site. Pure; exercised row by row.
///
/// The fallback paths only fire when every earlier path missed, so a
/// direct correspondence match can never be overwritten.
#[must_use]
pub fn resolve_one(
    finess: &str,
    display_name: &str,
    correspondence: &CorrespondenceTable,
    registry: &LegalStatusRegistry,
) -> (LegalStatus, StatusSource, Option<String>) {
    if let Some(parent) = correspondence.parent_of(finess)
        && let Some(entry) = registry.status_of(parent)
    {
        return (
            entry.status,
            StatusSource::Correspondence,
            Some(format!("EJ {parent}, code {}", entry.code)),
        );
    }

    if let Some(entry) = registry.status_of(finess) {
        return (
            entry.status,
            StatusSource::ParentEntity,
            Some(format!("code {}", entry.code)),
        );
    }

    let by_name = classify_name(display_name);
    if by_name.is_resolved() {
        return (
            by_name,
            StatusSource::NameHeuristic,
            Some(StatusSource::NameHeuristic.label().to_string()),
        );
    }

    (LegalStatus::Unresolved, StatusSource::Unresolved, None)
}

/// Resolve the legal status of every fact row in place.
pub fn resolve_statuses(
    rows: &mut [FactRow],
    correspondence: &CorrespondenceTable,
    registry: &LegalStatusRegistry,
    names: &EstablishmentDirectory,
) -> StatusResolutionStats {
    let mut stats = StatusResolutionStats::default();

    for row in rows.iter_mut() {
        let display_name = names.display_name(&row.finess);
        let (status, source, detail) =
            resolve_one(&row.finess, display_name, correspondence, registry);
        row.legal_status = status;
        row.status_detail = detail;
        stats.count(source);
        if status.is_private() {
            stats.private_rows += 1;
        }
    }

    log::info!(
        "Status resolution: {} correspondence, {} parent-entity, {} name heuristic, {} unresolved of {} rows ({:.1}% resolved)",
        stats.via_correspondence,
        stats.via_parent_entity,
        stats.via_name_heuristic,
        stats.unresolved,
        stats.total_rows,
        stats.resolved_pct()
    );
    log::info!(
        "Sector split: {} private rows, {} public rows",
        stats.private_rows,
        stats.resolved() - stats.private_rows
    );

    stats
}
