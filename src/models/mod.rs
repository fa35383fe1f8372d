//! Typed records for the casemix domain.
//!
//! The source extracts are column-name soup; everything past the loaders
//! works on these structs instead.

pub mod fact;
pub mod status;
pub mod tariff;

pub use fact::FactRow;
pub use status::{LegalStatus, StatusSource, classify_name, classify_status_code};
pub use tariff::{TariffEntry, TariffPair, TariffSchedule, YearTariffTable};

/// Sentinel used by classification columns when the source left them blank.
pub const UNSPECIFIED: &str = "Non renseigné";
