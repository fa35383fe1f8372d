//! The enrichment driver: one linear batch run over the fact table.
//!
//! load -> resolve status -> attach tariffs -> backup -> rewrite. A failed
//! load aborts the whole run; per-row lookup misses are summarized, never
//! fatal. The run summary is persisted as JSON next to the fact table.

use std::fs;
use std::time::Instant;

use anyhow::Context;
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::enrich::status::{StatusResolutionStats, resolve_statuses};
use crate::enrich::tariff::{TariffMatchStats, apply_tariffs};
use crate::error::Result;
use crate::models::status::LegalStatus;
use crate::models::tariff::TariffSchedule;
use crate::registry::ReferenceLoader;
use crate::registry::casemix::{CasemixLoader, IngestReport};
use crate::registry::correspondence::CorrespondenceLoader;
use crate::registry::legal_status::LegalStatusLoader;
use crate::registry::names::{EstablishmentDirectory, NamesLoader};
use crate::store;

/// Persisted summary of one enrichment run.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentSummary {
    pub generated_at: String,
    pub row_count: usize,
    pub status: StatusResolutionStats,
    pub tariffs: TariffMatchStats,
}

/// Orchestrates the batch pipeline described by a [`PipelineConfig`].
pub struct EnrichmentDriver {
    config: PipelineConfig,
}

impl EnrichmentDriver {
    #[must_use]
    pub const fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Ingest the raw casemix export into the typed Parquet fact table.
    pub fn ingest(&self) -> Result<IngestReport> {
        let start = Instant::now();
        let extract = CasemixLoader.load(&self.config.raw_casemix)?;

        log::info!(
            "Ingestion: {} rows read, {} retained, {} dropped",
            extract.report.total_rows,
            extract.report.retained_rows,
            extract.report.dropped_rows
        );

        store::backup_fact_table(&self.config.fact_table, &self.config.backup_path())?;
        store::write_fact_table(&self.config.fact_table, &extract.rows)?;

        log::info!("Ingestion completed in {:?}", start.elapsed());
        Ok(extract.report)
    }

    /// Run the full enrichment pass over the persisted fact table.
    pub fn enrich(&self) -> Result<EnrichmentSummary> {
        let start = Instant::now();
        let steps = ProgressBar::new(5).with_style(
            ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        steps.set_message("loading fact table");
        let mut rows = store::read_fact_table(&self.config.fact_table)?;
        steps.inc(1);

        steps.set_message("loading reference registries");
        let registry = LegalStatusLoader.load(&self.config.legal_status_file)?;
        let correspondence = CorrespondenceLoader.load(&self.config.legal_status_file)?;
        let names = self.load_names();
        let categories = registry.category_counts();
        let of_category =
            |status: LegalStatus| categories.get(&status).copied().unwrap_or_default();
        log::info!(
            "References: {} legal entities ({} public, {} non lucratif, {} lucratif), {} site correspondences, {} display names",
            registry.len(),
            of_category(LegalStatus::Public),
            of_category(LegalStatus::PrivateNonProfit),
            of_category(LegalStatus::PrivateForProfit),
            correspondence.len(),
            names.len()
        );
        let schedule = self.load_schedule()?;
        steps.inc(1);

        steps.set_message("resolving legal status");
        let status = resolve_statuses(&mut rows, &correspondence, &registry, &names);
        steps.inc(1);

        steps.set_message("attaching tariffs");
        let tariffs = apply_tariffs(&mut rows, &schedule);
        steps.inc(1);

        steps.set_message("saving");
        store::backup_fact_table(&self.config.fact_table, &self.config.backup_path())?;
        store::write_fact_table(&self.config.fact_table, &rows)?;
        store::write_tariff_reference(&self.config.tariff_reference, &schedule)?;
        steps.inc(1);
        steps.finish_with_message("done");

        let summary = EnrichmentSummary {
            generated_at: Utc::now().to_rfc3339(),
            row_count: rows.len(),
            status,
            tariffs,
        };
        self.write_summary(&summary)?;

        log::info!("Enrichment completed in {:?}", start.elapsed());
        Ok(summary)
    }

    /// Load and merge the yearly tariff tables into the wide schedule.
    fn load_schedule(&self) -> Result<TariffSchedule> {
        let mut tables = Vec::with_capacity(self.config.tariff_files.len());
        for (year, path) in &self.config.tariff_files {
            let table = crate::registry::tariff::TariffTableLoader::new(*year).load(path)?;
            log::info!("Tariffs {year}: {} entries", table.entries.len());
            tables.push(table);
        }
        let schedule = TariffSchedule::merge(tables);
        log::info!("Merged tariff schedule: {} distinct codes", schedule.len());
        Ok(schedule)
    }

    /// The display-name mapping is an optional comfort input: a missing
    /// file degrades every name to "Inconnu" instead of aborting.
    fn load_names(&self) -> EstablishmentDirectory {
        match NamesLoader.load(&self.config.names_file) {
            Ok(directory) => directory,
            Err(e) => {
                log::warn!("Display-name mapping unavailable ({e}), names default to Inconnu");
                EstablishmentDirectory::default()
            }
        }
    }

    fn write_summary(&self, summary: &EnrichmentSummary) -> Result<()> {
        let file = fs::File::create(&self.config.summary_file).with_context(|| {
            format!(
                "Failed to create summary file {}",
                self.config.summary_file.display()
            )
        })?;
        serde_json::to_writer_pretty(file, summary)
            .with_context(|| "Failed to serialize enrichment summary")?;
        log::info!("Run summary written to {}", self.config.summary_file.display());
        Ok(())
    }
}
