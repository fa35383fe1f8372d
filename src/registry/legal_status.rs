//! Legal-status registry loader.
//!
//! The FINESS extract mixes row types; legal entities are tagged
//! `structureej` in column 0, with the entity identifier, name and the
//! numeric legal-status code at fixed offsets. Entities whose code falls
//! outside the known ranges are dropped here, exactly like rows without a
//! code: downstream resolution treats both as "no registry answer".

use std::io::Read;

use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::models::status::{LegalStatus, classify_status_code};
use crate::registry::{ReferenceLoader, semicolon_reader};

/// Row-type tag of legal-entity rows in the FINESS extract.
const EJ_ROW_TAG: &str = "structureej";

/// Field offsets within a `structureej` row.
const FIELD_PARENT_ID: usize = 1;
const FIELD_NAME: usize = 2;
const FIELD_STATUS_CODE: usize = 16;

/// One resolved legal entity.
#[derive(Debug, Clone, PartialEq)]
pub struct LegalStatusEntry {
    /// Parent-entity identifier (FINESS EJ)
    pub parent_id: String,
    /// Entity name as recorded in the registry
    pub name: String,
    /// Raw numeric status code
    pub code: i64,
    /// Category derived from the code ranges
    pub status: LegalStatus,
}

/// Parent-entity id -> resolved status, first occurrence wins.
#[derive(Debug, Clone, Default)]
pub struct LegalStatusRegistry {
    by_parent: FxHashMap<String, LegalStatusEntry>,
}

impl LegalStatusRegistry {
    /// Look up the status chain entry for a parent-entity identifier.
    #[must_use]
    pub fn status_of(&self, parent_id: &str) -> Option<&LegalStatusEntry> {
        self.by_parent.get(parent_id)
    }

    /// Number of resolved entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_parent.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_parent.is_empty()
    }

    /// Count of entities per category, for the load summary.
    #[must_use]
    pub fn category_counts(&self) -> FxHashMap<LegalStatus, usize> {
        let mut counts = FxHashMap::default();
        for entry in self.by_parent.values() {
            *counts.entry(entry.status).or_insert(0) += 1;
        }
        counts
    }

    fn insert_first_wins(&mut self, entry: LegalStatusEntry) {
        self.by_parent.entry(entry.parent_id.clone()).or_insert(entry);
    }
}

/// Loader for the legal-status registry extract.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegalStatusLoader;

impl ReferenceLoader for LegalStatusLoader {
    type Output = LegalStatusRegistry;

    fn name(&self) -> &'static str {
        "legal-status registry"
    }

    fn from_reader<R: Read>(&self, reader: R) -> Result<Self::Output> {
        let mut csv_reader = semicolon_reader(reader);
        let mut registry = LegalStatusRegistry::default();
        let mut skipped_rows = 0usize;

        for record in csv_reader.records() {
            let record = record?;
            if record.get(0) != Some(EJ_ROW_TAG) {
                continue;
            }
            let (Some(parent_id), Some(name)) =
                (record.get(FIELD_PARENT_ID), record.get(FIELD_NAME))
            else {
                skipped_rows += 1;
                continue;
            };

            let code = record
                .get(FIELD_STATUS_CODE)
                .and_then(|raw| raw.trim().parse::<i64>().ok());
            let status = classify_status_code(code);
            if !status.is_resolved() {
                skipped_rows += 1;
                continue;
            }
            // classify_status_code only resolves when a code is present
            let Some(code) = code else { continue };

            registry.insert_first_wins(LegalStatusEntry {
                parent_id: parent_id.trim().to_string(),
                name: name.trim().to_string(),
                code,
                status,
            });
        }

        if skipped_rows > 0 {
            log::debug!("legal-status registry: {skipped_rows} entity rows without a usable code");
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ej_row(parent: &str, name: &str, code: &str) -> String {
        let mut fields = vec![""; 17];
        fields[0] = EJ_ROW_TAG;
        fields[FIELD_PARENT_ID] = parent;
        fields[FIELD_NAME] = name;
        fields[FIELD_STATUS_CODE] = code;
        fields.join(";")
    }

    #[test]
    fn test_parses_tagged_rows_only() {
        let data = format!(
            "en-tete du fichier\n{}\nstructureet;ET1;EJ1\n{}\n",
            ej_row("010008407", "CH DE BELLEY", "13"),
            ej_row("750712184", "CLINIQUE DES LILAS", "73"),
        );
        let registry = LegalStatusLoader.from_reader(data.as_bytes()).unwrap();
        assert_eq!(registry.len(), 2);
        let entry = registry.status_of("010008407").unwrap();
        assert_eq!(entry.status, LegalStatus::Public);
        assert_eq!(entry.code, 13);
        assert_eq!(
            registry.status_of("750712184").unwrap().status,
            LegalStatus::PrivateForProfit
        );
    }

    #[test]
    fn test_unusable_codes_are_dropped() {
        let data = format!(
            "{}\n{}\n{}\n",
            ej_row("EJ1", "SANS CODE", ""),
            ej_row("EJ2", "CODE HORS PLAGE", "99"),
            ej_row("EJ3", "ASSOCIATION X", "61"),
        );
        let registry = LegalStatusLoader.from_reader(data.as_bytes()).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.status_of("EJ3").unwrap().status,
            LegalStatus::PrivateNonProfit
        );
    }

    #[test]
    fn test_category_counts() {
        let data = format!(
            "{}\n{}\n{}\n",
            ej_row("EJ1", "CH A", "13"),
            ej_row("EJ2", "CH B", "14"),
            ej_row("EJ3", "CLINIQUE C", "73"),
        );
        let registry = LegalStatusLoader.from_reader(data.as_bytes()).unwrap();
        let counts = registry.category_counts();
        assert_eq!(counts.get(&LegalStatus::Public), Some(&2));
        assert_eq!(counts.get(&LegalStatus::PrivateForProfit), Some(&1));
        assert_eq!(counts.get(&LegalStatus::PrivateNonProfit), None);
    }

    #[test]
    fn test_duplicate_parent_first_wins() {
        let data = format!("{}\n{}\n", ej_row("EJ1", "A", "13"), ej_row("EJ1", "B", "73"));
        let registry = LegalStatusLoader.from_reader(data.as_bytes()).unwrap();
        assert_eq!(registry.status_of("EJ1").unwrap().name, "A");
        assert_eq!(registry.status_of("EJ1").unwrap().status, LegalStatus::Public);
    }
}
