//! Enrichment passes over the fact table and the driver orchestrating
//! them.

pub mod driver;
pub mod status;
pub mod tariff;

pub use driver::{EnrichmentDriver, EnrichmentSummary};
pub use status::{StatusResolutionStats, resolve_one, resolve_statuses};
pub use tariff::{TariffMatchStats, apply_tariffs, estimated_revenue, select_tariff};
