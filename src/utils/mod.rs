//! Shared I/O and logging helpers

pub mod io;
pub mod logging;
