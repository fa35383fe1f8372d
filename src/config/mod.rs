//! Configuration for the casemix pipeline and dashboard session.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{CasemixError, Result};

/// Years covered by the tariff campaign files.
pub const TARIFF_YEARS: [u16; 3] = [2022, 2023, 2024];

/// File locations for one enrichment run.
///
/// All inputs are flat-file extracts dropped into a single data directory;
/// the fact table is the only artifact the pipeline overwrites.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Raw casemix export (semicolon-delimited CSV)
    pub raw_casemix: PathBuf,
    /// Persisted wide fact table (Parquet), overwritten per run
    pub fact_table: PathBuf,
    /// FINESS legal-status registry extract (structureej rows)
    pub legal_status_file: PathBuf,
    /// Yearly GHS tariff tables, one per campaign year
    pub tariff_files: Vec<(u16, PathBuf)>,
    /// FINESS -> display name mapping
    pub names_file: PathBuf,
    /// Merged tariff reference artifact (Parquet)
    pub tariff_reference: PathBuf,
    /// Enrichment summary statistics (JSON)
    pub summary_file: PathBuf,
}

impl PipelineConfig {
    /// Build the standard layout rooted at a data directory.
    #[must_use]
    pub fn for_dir(dir: &Path) -> Self {
        Self {
            raw_casemix: dir.join("data_casemix_2022_2024.csv"),
            fact_table: dir.join("data_casemix_2022_2024.parquet"),
            legal_status_file: dir.join("statutjuridique-finessET.csv"),
            tariff_files: TARIFF_YEARS
                .iter()
                .map(|&year| (year, dir.join(format!("{year}GHMGHS.csv"))))
                .collect(),
            names_file: dir.join("etablissements_finess.csv"),
            tariff_reference: dir.join("referentiel_ghs_2022_2024.parquet"),
            summary_file: dir.join("enrichment_summary.json"),
        }
    }

    /// Sibling path holding the previous generation of the fact table.
    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        let mut os = self.fact_table.clone().into_os_string();
        os.push(".backup");
        PathBuf::from(os)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::for_dir(Path::new("."))
    }
}

/// Dashboard session configuration.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Access password, required from the process environment
    password: String,
}

impl DashboardConfig {
    /// Read the configuration from the environment.
    ///
    /// A missing `DASHBOARD_PASSWORD` is a hard startup failure with an
    /// operator-facing message, never a silent default.
    pub fn from_env() -> Result<Self> {
        match env::var("DASHBOARD_PASSWORD") {
            Ok(password) if !password.is_empty() => Ok(Self { password }),
            _ => Err(CasemixError::config_error(
                "DASHBOARD_PASSWORD is not set. Define it in the environment \
                 (or a .env file loaded by the launcher) before starting the dashboard",
            )),
        }
    }

    /// Compare a submitted password against the configured one.
    #[must_use]
    pub fn verify(&self, submitted: &str) -> bool {
        self.password == submitted
    }
}
