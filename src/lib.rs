//! A Rust library for building and querying an enriched French hospital
//! casemix fact table: CSV ingestion, legal-status and tariff enrichment,
//! Parquet persistence, and the read-only query layer behind the dashboard.

pub mod config;
pub mod enrich;
pub mod error;
pub mod models;
pub mod query;
pub mod registry;
pub mod store;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::{DashboardConfig, PipelineConfig, TARIFF_YEARS};
pub use error::{CasemixError, Result};
pub use models::{FactRow, LegalStatus, TariffSchedule};

// Pipeline
pub use enrich::{EnrichmentDriver, EnrichmentSummary};

// Query layer
pub use query::{FilteredView, QuerySession, Selection, SortColumn};
pub use query::filter::FilterSelection;
