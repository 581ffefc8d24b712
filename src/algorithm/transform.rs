//! Log transform of the stock column

use rayon::prelude::*;

use crate::models::BalancedPanelRow;

/// `ln(1 + max(stock, 0))`
///
/// Flooring negative stock at zero is a lossy modeling policy: every negative
/// stock maps to `log_stock = 0`, indistinguishable from an empty series.
/// Models fitted on `log_stock` must read negative stock, which signals
/// inconsistent flow data, from the raw `stock` column; reconciliation counts
/// those rows.
#[must_use]
pub fn log_stock(stock: i64) -> f64 {
    (stock.max(0) as f64).ln_1p()
}

/// Fill the `log_stock` column of every row
pub fn apply_log_transform(rows: &mut [BalancedPanelRow]) {
    rows.par_iter_mut().for_each(|row| row.log_stock = log_stock(row.stock));
}
