//! Establishment display-name mapping loader.
//!
//! A comma-delimited file mapping FINESS identifiers to display names,
//! used for establishment labelling and as input to the name-based status
//! heuristic. Unknown identifiers render as "Inconnu".

use std::io::Read;

use rustc_hash::FxHashMap;

use crate::error::{CasemixError, Result};
use crate::registry::ReferenceLoader;

const FINESS_COLUMN: &str = "Finess";
const NAME_COLUMN: &str = "Raison sociale";

/// Display name shown when a FINESS has no mapping.
pub const UNKNOWN_NAME: &str = "Inconnu";

/// FINESS -> display name.
#[derive(Debug, Clone, Default)]
pub struct EstablishmentDirectory {
    by_finess: FxHashMap<String, String>,
}

impl EstablishmentDirectory {
    /// Display name for an identifier, defaulting to [`UNKNOWN_NAME`].
    #[must_use]
    pub fn display_name(&self, finess: &str) -> &str {
        self.by_finess
            .get(finess)
            .map_or(UNKNOWN_NAME, String::as_str)
    }

    /// The recorded name, without the unknown fallback.
    #[must_use]
    pub fn name_of(&self, finess: &str) -> Option<&str> {
        self.by_finess.get(finess).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_finess.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_finess.is_empty()
    }
}

/// Loader for the display-name mapping file.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamesLoader;

impl ReferenceLoader for NamesLoader {
    type Output = EstablishmentDirectory;

    fn name(&self) -> &'static str {
        "establishment name mapping"
    }

    fn from_reader<R: Read>(&self, reader: R) -> Result<Self::Output> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| {
                    CasemixError::schema_error(format!(
                        "required column '{name}' missing from name mapping"
                    ))
                })
        };
        let finess_idx = find(FINESS_COLUMN)?;
        let name_idx = find(NAME_COLUMN)?;

        let mut directory = EstablishmentDirectory::default();
        for record in csv_reader.records() {
            let record = record?;
            let (Some(finess), Some(name)) = (record.get(finess_idx), record.get(name_idx)) else {
                continue;
            };
            let finess = finess.trim();
            if finess.is_empty() {
                continue;
            }
            directory
                .by_finess
                .entry(finess.to_string())
                .or_insert_with(|| name.trim().to_string());
        }

        Ok(directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_fallback() {
        let data = "Finess,Raison sociale\n750712184,AP-HP HOPITAL SAINT-LOUIS\n690781810,HCL\n";
        let directory = NamesLoader.from_reader(data.as_bytes()).unwrap();
        assert_eq!(directory.len(), 2);
        assert_eq!(
            directory.display_name("750712184"),
            "AP-HP HOPITAL SAINT-LOUIS"
        );
        assert_eq!(directory.display_name("000000000"), UNKNOWN_NAME);
        assert_eq!(directory.name_of("000000000"), None);
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let data = "Finess,Nom\n750712184,X\n";
        let err = NamesLoader.from_reader(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Raison sociale"));
    }
}
