//! Utility functions for error handling
//!
//! Path-aware helpers so that file failures carry the offending path and the
//! reason the file was needed.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{PanelError, Result};

/// Safely open a file with rich error information
///
/// # Arguments
/// * `path` - The path to the file to open
/// * `purpose` - Why the file is being opened (for error context)
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if !path.exists() {
        return Err(PanelError::path_error(
            path,
            format!("File not found (needed for: {purpose})"),
        ));
    }

    if !path.is_file() {
        return Err(PanelError::path_error(
            path,
            format!("Path is not a file (expected a file for: {purpose})"),
        ));
    }

    fs::File::open(path).map_err(|e| {
        let context = match e.kind() {
            io::ErrorKind::PermissionDenied => {
                "Permission denied - check file permissions".to_string()
            }
            io::ErrorKind::NotFound => {
                "File not found - it may have been deleted during operation".to_string()
            }
            _ => format!("Failed to open file for: {purpose}"),
        };
        PanelError::path_error_with_source(path, context, e)
    })
}

/// Create the parent directory of an output file if it does not exist yet
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent.is_dir() {
        return Ok(());
    }

    fs::create_dir_all(parent).map_err(|e| {
        let context = match e.kind() {
            io::ErrorKind::PermissionDenied => {
                "Permission denied - check directory permissions".to_string()
            }
            _ => "Failed to create output directory".to_string(),
        };
        PanelError::path_error_with_source(parent, context, e)
    })
}
