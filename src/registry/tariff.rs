//! Yearly GHS tariff table loader.
//!
//! One file per campaign year, semicolon-delimited, Latin-1 encoded, with
//! a header row. Tariff columns are free text ("1 234,56 €") and are
//! cleaned before parsing; unparsable amounts become `None`.

use std::io::Read;

use crate::error::Result;
use crate::models::tariff::{TariffEntry, YearTariffTable};
use crate::registry::ReferenceLoader;
use crate::utils::decode_latin1;
use crate::utils::numeric::clean_tariff;

const FIELD_CODE: usize = 0;
const FIELD_LABEL: usize = 1;
const FIELD_PUBLIC: usize = 2;
const FIELD_PRIVATE: usize = 3;

/// Loader for one campaign year of GHS tariffs.
#[derive(Debug, Clone, Copy)]
pub struct TariffTableLoader {
    pub year: u16,
}

impl TariffTableLoader {
    #[must_use]
    pub const fn new(year: u16) -> Self {
        Self { year }
    }
}

impl ReferenceLoader for TariffTableLoader {
    type Output = YearTariffTable;

    fn name(&self) -> &'static str {
        "yearly tariff table"
    }

    fn from_reader<R: Read>(&self, reader: R) -> Result<Self::Output> {
        // Byte records throughout: the extract is Latin-1, not UTF-8.
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut entries = Vec::new();
        for record in csv_reader.byte_records() {
            let record = record?;
            let Some(code) = record.get(FIELD_CODE) else {
                continue;
            };
            let code = decode_latin1(code).trim().to_string();
            if code.is_empty() {
                continue;
            }
            let label = record
                .get(FIELD_LABEL)
                .map(|raw| decode_latin1(raw).trim().to_string())
                .unwrap_or_default();
            let public = record
                .get(FIELD_PUBLIC)
                .and_then(|raw| clean_tariff(&decode_latin1(raw)));
            let private = record
                .get(FIELD_PRIVATE)
                .and_then(|raw| clean_tariff(&decode_latin1(raw)));

            entries.push(TariffEntry {
                ghm_code: code,
                label,
                public,
                private,
            });
        }

        Ok(YearTariffTable {
            year: self.year,
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_and_cleans_amounts() {
        let mut data = Vec::new();
        data.extend_from_slice(b"Code GHM;Libell\xe9;Tarif public;Tarif priv\xe9\n");
        data.extend_from_slice(b"01C031;Craniotomies \xe2ge > 17;5 332,90 \x80;4 120,00\n");
        data.extend_from_slice(b"02C051;Interventions;n/a;980,50\n");

        let table = TariffTableLoader::new(2023)
            .from_reader(data.as_slice())
            .unwrap();
        assert_eq!(table.year, 2023);
        assert_eq!(table.entries.len(), 2);
        assert_eq!(table.entries[0].ghm_code, "01C031");
        assert_eq!(table.entries[0].public, Some(5332.90));
        assert_eq!(table.entries[0].private, Some(4120.0));
        // Unparsable public tariff is None, never zero.
        assert_eq!(table.entries[1].public, None);
        assert_eq!(table.entries[1].private, Some(980.50));
    }

    #[test]
    fn test_blank_code_rows_skipped() {
        let data = b"Code;Libelle;Pub;Priv\n;;;\n01C031;x;1,0;2,0\n";
        let table = TariffTableLoader::new(2022)
            .from_reader(data.as_slice())
            .unwrap();
        assert_eq!(table.entries.len(), 1);
    }
}
