//! Balanced panel rows

use super::category::Category;
use super::flow::FlowCounts;
use super::period::{Period, PeriodRange};

/// One row of the balanced panel
#[derive(Debug, Clone, PartialEq)]
pub struct BalancedPanelRow {
    pub location: String,
    /// Display name reattached after balancing, if known
    pub location_name: Option<String>,
    pub category: Category,
    pub period: Period,
    pub entries: u64,
    pub exits: u64,
    /// Cumulative entries minus exits up to and including `period`
    pub stock: i64,
    /// `ln(1 + max(stock, 0))`
    pub log_stock: f64,
    /// False when the cell was synthesized by zero-fill
    pub observed: bool,
}

impl BalancedPanelRow {
    /// A row before stock reconciliation
    #[must_use]
    pub fn unreconciled(
        location: String,
        category: Category,
        period: Period,
        counts: FlowCounts,
        observed: bool,
    ) -> Self {
        Self {
            location,
            location_name: None,
            category,
            period,
            entries: counts.entries,
            exits: counts.exits,
            stock: 0,
            log_stock: 0.0,
            observed,
        }
    }

    #[must_use]
    pub const fn counts(&self) -> FlowCounts {
        FlowCounts::new(self.entries, self.exits)
    }

    /// True when both rows belong to the same (location, category) series
    #[must_use]
    pub fn same_series(&self, other: &Self) -> bool {
        self.category == other.category && self.location == other.location
    }
}

/// Complete (location × category × period) grid
#[derive(Debug, Clone, PartialEq)]
pub struct BalancedPanel {
    pub rows: Vec<BalancedPanelRow>,
    pub periods: PeriodRange,
    pub location_count: usize,
}

impl BalancedPanel {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row count the grid must have for its axes
    #[must_use]
    pub fn expected_len(&self) -> usize {
        self.location_count * Category::PANEL.len() * self.periods.len()
    }

    /// Sum of entries and exits over every row
    #[must_use]
    pub fn totals(&self) -> FlowCounts {
        self.rows.iter().map(BalancedPanelRow::counts).sum()
    }

    /// Sum of entries and exits over the semantic categories
    #[must_use]
    pub fn semantic_totals(&self) -> FlowCounts {
        self.rows
            .iter()
            .filter(|r| !r.category.is_total())
            .map(BalancedPanelRow::counts)
            .sum()
    }

    /// Rows of one series in period order
    #[must_use]
    pub fn series(&self, location: &str, category: Category) -> Vec<&BalancedPanelRow> {
        let mut rows: Vec<_> = self
            .rows
            .iter()
            .filter(|r| r.location == location && r.category == category)
            .collect();
        rows.sort_by_key(|r| r.period);
        rows
    }

    /// Stock values of one series in period order
    #[must_use]
    pub fn stock_series(&self, location: &str, category: Category) -> Vec<i64> {
        self.series(location, category).iter().map(|r| r.stock).collect()
    }
}
