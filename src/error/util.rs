//! Utility functions for error handling
//!
//! Rich, path-aware wrappers around common filesystem checks so that a
//! missing extract fails the run with an operator-facing message.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{CasemixError, Result};

/// Safely open a file with rich error information
///
/// # Arguments
/// * `path` - The path to the file to open
/// * `purpose` - Why the file is being opened (for error context)
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if !path.exists() {
        return Err(CasemixError::io_error("File not found")
            .with_path(path)
            .context(format!("needed for: {purpose}")));
    }

    if !path.is_file() {
        return Err(CasemixError::io_error("Path is not a file")
            .with_path(path)
            .context(format!("expected a file for: {purpose}")));
    }

    match fs::File::open(path) {
        Ok(file) => Ok(file),
        Err(e) => {
            let message = match e.kind() {
                io::ErrorKind::PermissionDenied => {
                    "Permission denied - check file permissions".to_string()
                }
                io::ErrorKind::NotFound => {
                    "File not found - it may have been deleted during operation".to_string()
                }
                _ => format!("Failed to open file for: {purpose}"),
            };
            Err(CasemixError::io_error_with_source(message, e).with_path(path))
        }
    }
}

/// Check that a directory exists and is readable, with rich error information
pub fn validate_directory(path: &Path, purpose: &str) -> Result<()> {
    if !path.exists() {
        return Err(CasemixError::io_error("Directory not found")
            .with_path(path)
            .context(format!("needed for: {purpose}")));
    }

    if !path.is_dir() {
        return Err(CasemixError::io_error("Path is not a directory")
            .with_path(path)
            .context(format!("expected a directory for: {purpose}")));
    }

    match fs::read_dir(path) {
        Ok(_) => Ok(()),
        Err(e) => {
            let message = match e.kind() {
                io::ErrorKind::PermissionDenied => {
                    "Permission denied - check directory permissions".to_string()
                }
                _ => format!("Failed to access directory for: {purpose}"),
            };
            Err(CasemixError::io_error_with_source(message, e).with_path(path))
        }
    }
}
