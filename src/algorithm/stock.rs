//! Stock reconciliation
//!
//! Stock is the running sum of `entries - exits` over a series ordered by
//! period. The scan is strictly sequential inside a series: applying it out
//! of period order produces wrong stocks, so rows are sorted before scanning.
//! Series are independent and are scanned in parallel.
//!
//! Zero-filled periods contribute no change and carry the prior stock
//! forward, which is why balancing has to run first. Negative stocks are
//! counted but never clamped.

use rayon::prelude::*;

use super::balance::OpeningStocks;
use super::statistics::ReconciliationStats;
use crate::models::BalancedPanelRow;

/// Outcome of scanning one series
#[derive(Debug, Clone, Copy, Default)]
struct SeriesOutcome {
    negative_rows: usize,
    min_stock: Option<i64>,
}

/// Running stock over one series already in period order
fn scan_series(series: &mut [BalancedPanelRow], opening: i64) -> SeriesOutcome {
    let mut outcome = SeriesOutcome::default();
    let mut stock = opening;
    let mut previous_period = None;

    for row in series {
        debug_assert!(
            previous_period.is_none_or(|p| p < row.period),
            "series {} / {} is not in ascending period order",
            row.location,
            row.category
        );
        previous_period = Some(row.period);

        stock = stock.saturating_add(row.counts().net());
        row.stock = stock;
        if stock < 0 {
            outcome.negative_rows += 1;
        }
        outcome.min_stock = Some(outcome.min_stock.map_or(stock, |m| m.min(stock)));
    }
    outcome
}

/// Compute the stock column of every row
///
/// Rows are reordered to (location, category, period).
pub fn reconcile_stock(rows: &mut [BalancedPanelRow], opening: &OpeningStocks) -> ReconciliationStats {
    rows.par_sort_unstable_by(|a, b| {
        a.location
            .cmp(&b.location)
            .then(a.category.cmp(&b.category))
            .then(a.period.cmp(&b.period))
    });

    let series: Vec<&mut [BalancedPanelRow]> =
        rows.chunk_by_mut(BalancedPanelRow::same_series).collect();
    let series_count = series.len();

    let outcomes: Vec<SeriesOutcome> = series
        .into_par_iter()
        .map(|series| {
            let first = &series[0];
            let opening = opening
                .get(&(first.location.clone(), first.category))
                .copied()
                .unwrap_or(0);
            scan_series(series, opening)
        })
        .collect();

    let stats = ReconciliationStats {
        series: series_count,
        negative_rows: outcomes.iter().map(|o| o.negative_rows).sum(),
        negative_series: outcomes.iter().filter(|o| o.negative_rows > 0).count(),
        min_stock: outcomes.iter().filter_map(|o| o.min_stock).min().unwrap_or(0),
    };

    if !stats.is_consistent() {
        log::warn!(
            "Inconsistent flow data: {} rows in {} series have negative stock (minimum {})",
            stats.negative_rows,
            stats.negative_series,
            stats.min_stock
        );
    }
    stats
}
