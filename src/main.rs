use std::env;
use std::path::Path;
use std::process::ExitCode;

use log::{error, info, warn};

use casemix::error::util::validate_directory;
use casemix::{EnrichmentDriver, PipelineConfig, Result};

fn usage(program: &str) {
    eprintln!("Usage: {program} <ingest|enrich|all> [data-dir]");
    eprintln!("  ingest   convert the raw casemix CSV export to the Parquet fact table");
    eprintln!("  enrich   resolve legal statuses and attach tariffs to the fact table");
    eprintln!("  all      run ingest then enrich");
    eprintln!("The data directory defaults to CASEMIX_DATA_DIR, then the current directory.");
}

fn run(command: &str, config: &PipelineConfig) -> Result<()> {
    let driver = EnrichmentDriver::new(config.clone());
    match command {
        "ingest" => {
            driver.ingest()?;
        }
        "enrich" => {
            let summary = driver.enrich()?;
            info!(
                "Enriched {} rows, {:.1}% with a resolved legal status",
                summary.row_count,
                summary.status.resolved_pct()
            );
        }
        "all" => {
            driver.ingest()?;
            let summary = driver.enrich()?;
            info!(
                "Enriched {} rows, {:.1}% with a resolved legal status",
                summary.row_count,
                summary.status.resolved_pct()
            );
        }
        _ => unreachable!("validated by the caller"),
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map_or("casemix", String::as_str);
    let Some(command) = args.get(1).map(String::as_str) else {
        usage(program);
        return ExitCode::FAILURE;
    };
    if !matches!(command, "ingest" | "enrich" | "all") {
        usage(program);
        return ExitCode::FAILURE;
    }

    let data_dir = args
        .get(2)
        .cloned()
        .or_else(|| env::var("CASEMIX_DATA_DIR").ok())
        .unwrap_or_else(|| ".".to_string());
    let data_dir = Path::new(&data_dir);
    if let Err(e) = validate_directory(data_dir, "the casemix data directory") {
        warn!("{e}");
        return ExitCode::FAILURE;
    }

    let config = PipelineConfig::for_dir(data_dir);
    info!("Running '{command}' against {}", data_dir.display());

    match run(command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
