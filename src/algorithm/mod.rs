//! Panel construction stages
//!
//! Extraction turns chunks of raw records into partial aggregates, which are
//! merged per file and across files. The consolidated aggregate is totalized,
//! balanced onto the full grid, reconciled into stocks and log-transformed.

pub mod balance;
pub mod classify;
pub mod consolidate;
pub mod extract;
pub mod merge;
pub mod statistics;
pub mod stock;
pub mod totalize;
pub mod transform;

pub use balance::{BalancedGrid, OpeningStocks, attach_location_names, balance};
pub use classify::classify;
pub use consolidate::{consolidate_sources, extract_file, extract_reader};
pub use extract::{ChunkExtractor, PartialAggregate, parse_period_marker};
pub use merge::Merge;
pub use statistics::{BalanceStats, ExtractionStats, ReconciliationStats, RunReport};
pub use stock::reconcile_stock;
pub use totalize::totalize;
pub use transform::{apply_log_transform, log_stock};
