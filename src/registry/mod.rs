//! Loaders for the source extracts feeding the casemix pipeline.
//!
//! Every input is a delimited flat file:
//! - the raw casemix activity export (semicolon, UTF-8 with BOM)
//! - the FINESS legal-status registry (semicolon, row-type tagged)
//! - the ET -> EJ correspondence rows of the same registry
//! - yearly GHS tariff tables (semicolon, Latin-1)
//! - the establishment display-name mapping (comma, UTF-8 with BOM)
//!
//! Loaders parse into the typed records of [`crate::models`]; per-row
//! data-quality gaps are tolerated and counted, structural problems
//! (missing file, missing required column) abort the run.

pub mod casemix;
pub mod correspondence;
pub mod legal_status;
pub mod names;
pub mod tariff;

use std::io::Read;
use std::path::Path;

use crate::error::Result;
use crate::error::util::safe_open_file;

/// Base trait for reference-extract loaders.
pub trait ReferenceLoader {
    /// Parsed output of this loader.
    type Output;

    /// Short name of the extract, for logging.
    fn name(&self) -> &'static str;

    /// Parse the extract from any byte source.
    fn from_reader<R: Read>(&self, reader: R) -> Result<Self::Output>;

    /// Open and parse the extract at `path`.
    fn load(&self, path: &Path) -> Result<Self::Output> {
        let file = safe_open_file(path, self.name())?;
        self.from_reader(file)
            .map_err(|e| e.with_path(path))
    }
}

/// Reader over a semicolon-delimited extract without a meaningful header
/// row. `flexible` because registry rows vary in width by row type.
pub(crate) fn semicolon_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(reader)
}
