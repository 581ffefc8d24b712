//! Run statistics and summaries
//!
//! Counters are collected per chunk and merged with the same law as the flow
//! aggregates, so they are identical however the work was scheduled.

use std::fmt::Write as _;
use std::path::PathBuf;

use super::merge::Merge;
use crate::models::PeriodRange;

/// Sanity counters gathered during extraction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub files_processed: u64,
    /// Sources skipped because they were missing or unreadable, sorted
    pub skipped_sources: Vec<PathBuf>,
    pub chunks: u64,
    pub rows_read: u64,
    /// Rows without an entity id or location
    pub rows_malformed: u64,
    /// Rows whose entity is not in the inclusion set
    pub rows_excluded: u64,
    pub rows_matched: u64,
    pub entries_counted: u64,
    pub exits_counted: u64,
    /// Matched rows whose start marker did not resolve to a plausible year
    pub start_absent: u64,
    /// Matched rows whose end marker did not resolve to a plausible year
    pub end_absent: u64,
}

impl ExtractionStats {
    /// Statistics for a source that could not be read
    #[must_use]
    pub fn skipped(path: PathBuf) -> Self {
        Self {
            skipped_sources: vec![path],
            ..Default::default()
        }
    }
}

impl Merge for ExtractionStats {
    fn merge(self, other: Self) -> Self {
        let mut skipped_sources = self.skipped_sources;
        skipped_sources.extend(other.skipped_sources);
        skipped_sources.sort();

        Self {
            files_processed: self.files_processed + other.files_processed,
            skipped_sources,
            chunks: self.chunks + other.chunks,
            rows_read: self.rows_read + other.rows_read,
            rows_malformed: self.rows_malformed + other.rows_malformed,
            rows_excluded: self.rows_excluded + other.rows_excluded,
            rows_matched: self.rows_matched + other.rows_matched,
            entries_counted: self.entries_counted + other.entries_counted,
            exits_counted: self.exits_counted + other.exits_counted,
            start_absent: self.start_absent + other.start_absent,
            end_absent: self.end_absent + other.end_absent,
        }
    }
}

/// Counters produced by balancing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceStats {
    pub locations: usize,
    pub observed_cells: usize,
    pub synthesized_cells: usize,
    /// Aggregate cells dated before the period range
    pub cells_before_range: usize,
    /// Aggregate cells dated after the period range
    pub cells_after_range: usize,
}

/// Data-quality counters produced by stock reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconciliationStats {
    pub series: usize,
    /// Rows whose reconstructed stock is negative
    pub negative_rows: usize,
    /// Series with at least one negative stock
    pub negative_series: usize,
    pub min_stock: i64,
}

impl ReconciliationStats {
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.negative_rows == 0
    }
}

/// Everything a run reports besides the panel itself
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub extraction: ExtractionStats,
    pub balance: BalanceStats,
    pub reconciliation: ReconciliationStats,
    pub panel_rows: usize,
    pub periods: Option<PeriodRange>,
}

impl RunReport {
    /// Human-readable summary of a run
    #[must_use]
    pub fn summary(&self) -> String {
        let ex = &self.extraction;
        let mut summary = String::new();
        summary.push_str("Flow Panel Summary:\n");
        if let Some(periods) = self.periods {
            let _ = writeln!(summary, "  Periods: {periods}");
        }
        let _ = writeln!(
            summary,
            "  Sources: {} processed, {} skipped",
            ex.files_processed,
            ex.skipped_sources.len()
        );
        for path in &ex.skipped_sources {
            let _ = writeln!(summary, "    skipped: {}", path.display());
        }
        let _ = writeln!(summary, "  Chunks: {}", ex.chunks);
        let _ = writeln!(
            summary,
            "  Rows: {} read, {} matched, {} excluded, {} malformed",
            ex.rows_read, ex.rows_matched, ex.rows_excluded, ex.rows_malformed
        );
        let _ = writeln!(
            summary,
            "  Flows: {} entries, {} exits ({} without start year, {} without end year)",
            ex.entries_counted, ex.exits_counted, ex.start_absent, ex.end_absent
        );

        let bal = &self.balance;
        let _ = writeln!(
            summary,
            "  Grid: {} locations, {} observed cells, {} zero-filled",
            bal.locations, bal.observed_cells, bal.synthesized_cells
        );
        if bal.cells_before_range + bal.cells_after_range > 0 {
            let _ = writeln!(
                summary,
                "  Outside period range: {} cells before, {} after",
                bal.cells_before_range, bal.cells_after_range
            );
        }

        let rec = &self.reconciliation;
        let _ = writeln!(summary, "  Series: {}", rec.series);
        if rec.is_consistent() {
            summary.push_str("  Stock: no negative values\n");
        } else {
            let _ = writeln!(
                summary,
                "  Stock: {} negative rows in {} series (minimum {})",
                rec.negative_rows, rec.negative_series, rec.min_stock
            );
        }
        let _ = writeln!(summary, "  Panel rows: {}", self.panel_rows);
        summary
    }
}
