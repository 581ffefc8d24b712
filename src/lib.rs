//! Balanced panel of entity flows.
//!
//! Flow events from delimited source extracts are filtered against an
//! inclusion set, classified into sector categories and counted as entries
//! and exits per (location, category, period). The consolidated aggregate is
//! expanded to a balanced grid, stocks are reconstructed from cumulative net
//! flow, and the result is stored as Parquet.

pub mod algorithm;
pub mod config;
pub mod error;
pub mod inclusion;
pub mod models;
pub mod pipeline;
pub mod utils;

// Core types
pub use config::PanelConfig;
pub use error::{PanelError, Result};
pub use pipeline::PanelPipeline;

// Domain types
pub use algorithm::{Merge, RunReport};
pub use inclusion::InclusionSet;
pub use models::{BalancedPanel, BalancedPanelRow, Category, FlowAggregate, FlowCounts, FlowKey, PeriodRange};

// Artifacts
pub use utils::io::{read_aggregate_parquet, read_panel_parquet, write_aggregate_parquet, write_panel_parquet};
