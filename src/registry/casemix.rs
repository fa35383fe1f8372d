//! Raw casemix activity export loader.
//!
//! The exporter produces one semicolon-delimited CSV covering all years,
//! with free-text numeric columns (decimal commas, percent signs) and
//! per-establishment "Total" aggregate lines mixed into the data. This
//! loader cleans the measures, drops non-retainable rows and produces the
//! typed fact rows the rest of the pipeline works on.

use std::io::Read;

use csv::StringRecord;

use crate::error::{CasemixError, Result};
use crate::models::fact::{FactRow, is_retainable};
use crate::registry::ReferenceLoader;
use crate::utils::numeric::{parse_count, parse_decimal};

const COL_FINESS: &str = "Finess";
const COL_YEAR: &str = "Annee";
const COL_CODE: &str = "Code";
const COL_LABEL: &str = "Libellé";
const COL_COUNT: &str = "Effectif";
const COL_MEAN_STAY: &str = "Durée moyennede séjour";
const COL_MEAN_AGE: &str = "Age moyen";
const COL_SEX_RATIO: &str = "Sexe ratio(% homme)";
const COL_DEATH_RATE: &str = "% décès";
const COL_ACTIVITY_DOMAIN: &str = "DA";
const COL_ACTIVITY_GROUP: &str = "GP";
const COL_CLASSIFICATION: &str = "Classif PKCS";

/// Outcome of one ingestion pass.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Rows read from the export, header excluded
    pub total_rows: usize,
    /// Rows retained after the validity filter
    pub retained_rows: usize,
    /// Rows dropped for zero/missing count, empty label or "Total" lines
    pub dropped_rows: usize,
}

/// Parsed export: fact rows plus the ingestion report.
#[derive(Debug, Clone)]
pub struct CasemixExtract {
    pub rows: Vec<FactRow>,
    pub report: IngestReport,
}

/// Column indices resolved once from the header row.
struct ColumnMap {
    finess: usize,
    year: usize,
    code: usize,
    label: usize,
    count: usize,
    mean_stay: Option<usize>,
    mean_age: Option<usize>,
    sex_ratio: Option<usize>,
    death_rate: Option<usize>,
    activity_domain: Option<usize>,
    activity_group: Option<usize>,
    classification: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);
        let required = |name: &str| {
            position(name).ok_or_else(|| {
                CasemixError::schema_error(format!(
                    "required column '{name}' missing from casemix export"
                ))
            })
        };

        Ok(Self {
            finess: required(COL_FINESS)?,
            year: required(COL_YEAR)?,
            code: required(COL_CODE)?,
            label: required(COL_LABEL)?,
            count: required(COL_COUNT)?,
            mean_stay: position(COL_MEAN_STAY),
            mean_age: position(COL_MEAN_AGE),
            sex_ratio: position(COL_SEX_RATIO),
            death_rate: position(COL_DEATH_RATE),
            activity_domain: position(COL_ACTIVITY_DOMAIN),
            activity_group: position(COL_ACTIVITY_GROUP),
            classification: position(COL_CLASSIFICATION),
        })
    }
}

fn text_at(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("").trim()
}

fn optional_text(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    let value = text_at(record, idx?);
    if value.is_empty() || value == crate::models::UNSPECIFIED {
        None
    } else {
        Some(value.to_string())
    }
}

fn optional_number(record: &StringRecord, idx: Option<usize>) -> Option<f64> {
    parse_decimal(text_at(record, idx?))
}

/// Loader for the raw casemix export.
#[derive(Debug, Clone, Copy, Default)]
pub struct CasemixLoader;

impl ReferenceLoader for CasemixLoader {
    type Output = CasemixExtract;

    fn name(&self) -> &'static str {
        "casemix activity export"
    }

    fn from_reader<R: Read>(&self, reader: R) -> Result<Self::Output> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns = ColumnMap::from_headers(csv_reader.headers()?)?;

        let mut rows = Vec::new();
        let mut report = IngestReport::default();

        for record in csv_reader.records() {
            let record = record?;
            report.total_rows += 1;

            let label = text_at(&record, columns.label);
            let count = parse_count(text_at(&record, columns.count));
            let year = text_at(&record, columns.year).parse::<u16>().ok();

            let (Some(count), Some(year)) = (count, year) else {
                report.dropped_rows += 1;
                continue;
            };
            if !is_retainable(Some(count), label) {
                report.dropped_rows += 1;
                continue;
            }

            let mut row = FactRow::new(
                text_at(&record, columns.finess),
                year,
                text_at(&record, columns.code),
                label,
                count,
            );
            row.mean_stay = optional_number(&record, columns.mean_stay);
            row.mean_age = optional_number(&record, columns.mean_age);
            row.sex_ratio = optional_number(&record, columns.sex_ratio);
            row.death_rate = optional_number(&record, columns.death_rate);
            row.activity_domain = optional_text(&record, columns.activity_domain);
            row.activity_group = optional_text(&record, columns.activity_group);
            row.classification = optional_text(&record, columns.classification);

            rows.push(row);
        }

        report.retained_rows = rows.len();
        Ok(CasemixExtract { rows, report })
    }
}
