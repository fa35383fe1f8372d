//! Site to parent-entity correspondence loader.
//!
//! `structureet` rows of the FINESS extract map each care site (FINESS ET)
//! to the legal entity that owns it (FINESS EJ). Many sites per entity;
//! one row per site after first-wins deduplication.

use std::io::Read;

use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::registry::{ReferenceLoader, semicolon_reader};

/// Row-type tag of site rows in the FINESS extract.
const ET_ROW_TAG: &str = "structureet";

const FIELD_SITE_ID: usize = 1;
const FIELD_PARENT_ID: usize = 2;

/// Site id -> parent-entity id.
#[derive(Debug, Clone, Default)]
pub struct CorrespondenceTable {
    by_site: FxHashMap<String, String>,
}

impl CorrespondenceTable {
    /// The parent entity owning a site, if the site is known.
    #[must_use]
    pub fn parent_of(&self, site_id: &str) -> Option<&str> {
        self.by_site.get(site_id).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_site.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_site.is_empty()
    }
}

/// Loader for the ET -> EJ correspondence rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrespondenceLoader;

impl ReferenceLoader for CorrespondenceLoader {
    type Output = CorrespondenceTable;

    fn name(&self) -> &'static str {
        "site correspondence registry"
    }

    fn from_reader<R: Read>(&self, reader: R) -> Result<Self::Output> {
        let mut csv_reader = semicolon_reader(reader);
        let mut table = CorrespondenceTable::default();

        for record in csv_reader.records() {
            let record = record?;
            if record.get(0) != Some(ET_ROW_TAG) {
                continue;
            }
            let (Some(site), Some(parent)) =
                (record.get(FIELD_SITE_ID), record.get(FIELD_PARENT_ID))
            else {
                continue;
            };
            let site = site.trim();
            let parent = parent.trim();
            if site.is_empty() || parent.is_empty() {
                continue;
            }
            table
                .by_site
                .entry(site.to_string())
                .or_insert_with(|| parent.to_string());
        }

        Ok(table)
    }
}
