//! Log lines for sources, artifacts and pipeline stages
//!
//! Every file the pipeline touches is logged once when work on it starts and
//! once when it is done, with the number of rows, cells or entities handled.

use std::fmt::Display;
use std::path::Path;
use std::time::Duration;

fn start_message(operation: &str, path: &Path) -> String {
    format!("{operation} {}", path.display())
}

fn completion_message(
    operation: &str,
    path: &Path,
    count: usize,
    unit: &str,
    elapsed: Option<Duration>,
) -> String {
    match elapsed {
        Some(duration) => format!("{}: {operation} {count} {unit} in {duration:?}", path.display()),
        None => format!("{}: {operation} {count} {unit}", path.display()),
    }
}

fn skipped_message(path: &Path, reason: Option<&dyn Display>) -> String {
    match reason {
        Some(reason) => format!("Skipping source {}: {reason}", path.display()),
        None => format!("Skipping source {}: file not found", path.display()),
    }
}

/// Log that work on a source or artifact has started
pub fn log_operation_start(operation: &str, path: &Path) {
    log::info!("{}", start_message(operation, path));
}

/// Log that a source or artifact is done
///
/// # Arguments
/// * `operation` - Past-tense verb, e.g. `aggregated` or `wrote`
/// * `count` - Number of `unit`s handled
/// * `unit` - What was counted: `rows`, `cells`, `entities`
pub fn log_operation_complete(
    operation: &str,
    path: &Path,
    count: usize,
    unit: &str,
    elapsed: Option<Duration>,
) {
    log::info!("{}", completion_message(operation, path, count, unit, elapsed));
}

/// Log the completion of an in-memory pipeline stage
pub fn log_stage(stage: &str, detail: &str, elapsed: Duration) {
    log::info!("{stage}: {detail} in {elapsed:?}");
}

/// Warn that a source is left out of the run
///
/// Without a reason the source is reported as missing.
pub fn log_skipped_source(path: &Path, reason: Option<&dyn Display>) {
    log::warn!("{}", skipped_message(path, reason));
}
