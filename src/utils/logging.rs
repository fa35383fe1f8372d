//! Logging helpers so pipeline steps report row transfers in a
//! consistent format.

use std::path::Path;
use std::time::Duration;

/// Log the start of a file-bound step; `action` carries its own
/// preposition ("Reading fact table from", "Writing fact table to").
pub fn log_step_start(action: &str, path: &Path) {
    log::info!("{action} {}", path.display());
}

fn transfer_summary(
    verb: &str,
    rows: usize,
    direction: &str,
    path: &Path,
    elapsed: Option<Duration>,
) -> String {
    let mut line = format!("{verb} {rows} rows {direction} {}", path.display());
    if let Some(duration) = elapsed {
        line.push_str(&format!(" in {duration:?}"));
    }
    line
}

/// Log the completion of a read step.
pub fn log_rows_read(path: &Path, rows: usize, elapsed: Option<Duration>) {
    log::info!("{}", transfer_summary("Read", rows, "from", path, elapsed));
}

/// Log the completion of a write step.
pub fn log_rows_written(path: &Path, rows: usize, elapsed: Option<Duration>) {
    log::info!("{}", transfer_summary("Wrote", rows, "to", path, elapsed));
}
