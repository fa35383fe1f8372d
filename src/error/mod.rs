//! Error handling for the casemix pipeline.

pub mod util;

use std::path::{Path, PathBuf};
use std::{fmt, io};

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Specialized error type for casemix loading, enrichment and querying.
#[derive(Debug)]
pub enum CasemixError {
    /// Error opening or reading an input file
    Io {
        message: String,
        path: Option<PathBuf>,
        source: Option<io::Error>,
    },
    /// A delimited extract could not be parsed
    Csv {
        message: String,
        path: Option<PathBuf>,
        source: Option<csv::Error>,
    },
    /// A required column or row shape is missing from an input
    Schema {
        message: String,
        path: Option<PathBuf>,
    },
    /// Missing or invalid process configuration
    Config { message: String },
    /// Error reading or writing Parquet data
    Parquet(ParquetError),
    /// Error manipulating Arrow data
    Arrow(ArrowError),
    /// Error converting typed records to/from Arrow batches
    Convert(serde_arrow::Error),
    /// Contextual error from a lower-level operation
    Other(anyhow::Error),
}

impl CasemixError {
    /// Create an IO error with a message
    pub fn io_error(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: None,
            source: None,
        }
    }

    /// Create an IO error wrapping an underlying `io::Error`
    pub fn io_error_with_source(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            path: None,
            source: Some(source),
        }
    }

    /// Create a CSV parse error with a message
    pub fn csv_error(message: impl Into<String>) -> Self {
        Self::Csv {
            message: message.into(),
            path: None,
            source: None,
        }
    }

    /// Create a schema error (missing column, unexpected row shape)
    pub fn schema_error(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
            path: None,
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a generic error from a message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(anyhow::anyhow!(message.into()))
    }

    /// Attach the offending path to this error
    #[must_use]
    pub fn with_path(mut self, p: &Path) -> Self {
        match &mut self {
            Self::Io { path, .. } | Self::Csv { path, .. } | Self::Schema { path, .. } => {
                *path = Some(p.to_path_buf());
            }
            _ => {}
        }
        self
    }

    /// Append context to the error message
    #[must_use]
    pub fn context(mut self, ctx: impl Into<String>) -> Self {
        let ctx = ctx.into();
        match &mut self {
            Self::Io { message, .. }
            | Self::Csv { message, .. }
            | Self::Schema { message, .. }
            | Self::Config { message } => {
                message.push_str(" (");
                message.push_str(&ctx);
                message.push(')');
            }
            _ => {}
        }
        self
    }
}

impl fmt::Display for CasemixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_with_path =
            |f: &mut fmt::Formatter<'_>, kind: &str, message: &str, path: &Option<PathBuf>| {
                match path {
                    Some(p) => write!(f, "{kind}: {message} [{}]", p.display()),
                    None => write!(f, "{kind}: {message}"),
                }
            };
        match self {
            Self::Io { message, path, .. } => write_with_path(f, "IO error", message, path),
            Self::Csv { message, path, .. } => write_with_path(f, "CSV error", message, path),
            Self::Schema { message, path } => write_with_path(f, "Schema error", message, path),
            Self::Config { message } => write!(f, "Configuration error: {message}"),
            Self::Parquet(e) => write!(f, "Parquet error: {e}"),
            Self::Arrow(e) => write!(f, "Arrow error: {e}"),
            Self::Convert(e) => write!(f, "Record conversion error: {e}"),
            Self::Other(e) => write!(f, "{e:#}"),
        }
    }
}

impl std::error::Error for CasemixError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io {
                source: Some(e), ..
            } => Some(e),
            Self::Csv {
                source: Some(e), ..
            } => Some(e),
            Self::Parquet(e) => Some(e),
            Self::Arrow(e) => Some(e),
            Self::Convert(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CasemixError {
    fn from(error: io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
            path: None,
            source: Some(error),
        }
    }
}

impl From<csv::Error> for CasemixError {
    fn from(error: csv::Error) -> Self {
        Self::Csv {
            message: error.to_string(),
            path: None,
            source: Some(error),
        }
    }
}

impl From<ParquetError> for CasemixError {
    fn from(error: ParquetError) -> Self {
        Self::Parquet(error)
    }
}

impl From<ArrowError> for CasemixError {
    fn from(error: ArrowError) -> Self {
        Self::Arrow(error)
    }
}

impl From<serde_arrow::Error> for CasemixError {
    fn from(error: serde_arrow::Error) -> Self {
        Self::Convert(error)
    }
}

impl From<anyhow::Error> for CasemixError {
    fn from(error: anyhow::Error) -> Self {
        Self::Other(error)
    }
}

/// Result type for casemix operations
pub type Result<T> = std::result::Result<T, CasemixError>;
