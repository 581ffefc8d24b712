//! Logging utilities for stage reporting and progress tracking

pub mod log;
pub mod progress;

pub use self::log::{log_operation_complete, log_operation_start, log_skipped_source, log_stage};
pub use progress::{create_main_progress_bar, create_spinner, finish_progress_bar};
