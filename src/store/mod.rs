//! Parquet persistence for the fact table and the tariff reference.
//!
//! The fact table schema is declared explicitly here; the typed rows are
//! converted to and from Arrow batches with `serde_arrow`. Rewrites go
//! through a temporary sibling and a rename, with a one-generation
//! `.backup` copy taken before the first overwrite of a run.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use arrow::datatypes::{DataType, Field, FieldRef, Schema};
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::{Compression, GzipLevel};
use parquet::file::properties::WriterProperties;

use crate::error::Result;
use crate::error::util::safe_open_file;
use crate::models::FactRow;
use crate::models::tariff::TariffSchedule;
use crate::utils::logging::{log_rows_read, log_rows_written, log_step_start};

/// Arrow fields of the persisted fact table, in column order.
///
/// Must stay in sync with [`FactRow`]: `serde_arrow` matches columns to
/// struct fields by name.
#[must_use]
pub fn fact_table_fields() -> Vec<FieldRef> {
    vec![
        Arc::new(Field::new("finess", DataType::Utf8, false)),
        Arc::new(Field::new("year", DataType::UInt16, false)),
        Arc::new(Field::new("ghm_code", DataType::Utf8, false)),
        Arc::new(Field::new("label", DataType::Utf8, false)),
        Arc::new(Field::new("patient_count", DataType::UInt32, false)),
        Arc::new(Field::new("mean_stay", DataType::Float64, true)),
        Arc::new(Field::new("mean_age", DataType::Float64, true)),
        Arc::new(Field::new("sex_ratio", DataType::Float64, true)),
        Arc::new(Field::new("death_rate", DataType::Float64, true)),
        Arc::new(Field::new("activity_domain", DataType::Utf8, true)),
        Arc::new(Field::new("activity_group", DataType::Utf8, true)),
        Arc::new(Field::new("classification", DataType::Utf8, true)),
        Arc::new(Field::new("legal_status", DataType::Utf8, false)),
        Arc::new(Field::new("status_detail", DataType::Utf8, true)),
        Arc::new(Field::new("public_tariff", DataType::Float64, true)),
        Arc::new(Field::new("private_tariff", DataType::Float64, true)),
        Arc::new(Field::new("public_revenue", DataType::Float64, true)),
        Arc::new(Field::new("private_revenue", DataType::Float64, true)),
    ]
}

/// Read the persisted fact table into typed rows.
pub fn read_fact_table(path: &Path) -> Result<Vec<FactRow>> {
    log_step_start("Reading fact table from", path);
    let start = Instant::now();

    let file = safe_open_file(path, "reading the fact table")?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("Failed to open parquet file: {}", path.display()))?
        .build()
        .with_context(|| format!("Failed to build parquet reader for {}", path.display()))?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result
            .with_context(|| format!("Failed to read record batch from {}", path.display()))?;
        let mut batch_rows: Vec<FactRow> = serde_arrow::from_record_batch(&batch)?;
        rows.append(&mut batch_rows);
    }

    log_rows_read(path, rows.len(), Some(start.elapsed()));
    Ok(rows)
}

/// Write the fact table, replacing the previous artifact atomically.
pub fn write_fact_table(path: &Path, rows: &[FactRow]) -> Result<()> {
    log_step_start("Writing fact table to", path);
    let start = Instant::now();

    let fields = fact_table_fields();
    let batch = serde_arrow::to_record_batch(&fields, &rows)?;
    let schema = Arc::new(Schema::new(fields));

    let tmp_path = path.with_extension("parquet.tmp");
    {
        let file = fs::File::create(&tmp_path)
            .with_context(|| format!("Failed to create {}", tmp_path.display()))?;
        let props = WriterProperties::builder()
            .set_compression(Compression::GZIP(GzipLevel::default()))
            .build();
        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
        writer.write(&batch)?;
        writer.close()?;
    }
    fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to move fact table into place at {}", path.display()))?;

    log_rows_written(path, rows.len(), Some(start.elapsed()));
    Ok(())
}

/// Keep one prior generation of the fact table before overwriting it.
///
/// The copy is only taken when `backup` does not already exist, so reruns
/// within the same generation do not clobber it. Returns whether a backup
/// was created.
pub fn backup_fact_table(path: &Path, backup: &Path) -> Result<bool> {
    if !path.exists() || backup.exists() {
        return Ok(false);
    }
    fs::copy(path, backup)
        .with_context(|| format!("Failed to back up fact table to {}", backup.display()))?;
    log::info!("Backup created: {}", backup.display());
    Ok(true)
}

/// Persist the merged tariff reference as its own wide Parquet artifact.
///
/// One row per GHM code, year-qualified tariff columns, codes sorted for
/// deterministic output.
pub fn write_tariff_reference(path: &Path, schedule: &TariffSchedule) -> Result<()> {
    use arrow::array::{ArrayRef, Float64Builder, StringBuilder};

    log_step_start("Writing tariff reference to", path);

    let mut codes: Vec<&str> = schedule.iter().map(|(code, _)| code).collect();
    codes.sort_unstable();

    let mut fields: Vec<FieldRef> = vec![
        Arc::new(Field::new("ghm_code", DataType::Utf8, false)),
        Arc::new(Field::new("label", DataType::Utf8, false)),
    ];
    for year in &schedule.years {
        fields.push(Arc::new(Field::new(
            format!("public_tariff_{year}"),
            DataType::Float64,
            true,
        )));
        fields.push(Arc::new(Field::new(
            format!("private_tariff_{year}"),
            DataType::Float64,
            true,
        )));
    }

    let mut code_builder = StringBuilder::new();
    let mut label_builder = StringBuilder::new();
    let mut tariff_builders: Vec<Float64Builder> = schedule
        .years
        .iter()
        .flat_map(|_| [Float64Builder::new(), Float64Builder::new()])
        .collect();

    for code in &codes {
        code_builder.append_value(code);
        label_builder.append_value(schedule.label_of(code).unwrap_or_default());
        for (i, year) in schedule.years.iter().enumerate() {
            let pair = schedule.lookup(code, *year).unwrap_or_default();
            tariff_builders[2 * i].append_option(pair.public);
            tariff_builders[2 * i + 1].append_option(pair.private);
        }
    }

    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(code_builder.finish()),
        Arc::new(label_builder.finish()),
    ];
    for mut builder in tariff_builders {
        columns.push(Arc::new(builder.finish()));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = arrow::record_batch::RecordBatch::try_new(schema.clone(), columns)?;

    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::GZIP(GzipLevel::default()))
        .build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    log_rows_written(path, codes.len(), None);
    Ok(())
}
