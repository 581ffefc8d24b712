//! Panel balancing
//!
//! Expands a sparse aggregate to the dense grid of observed locations × the
//! panel categories × the period range. Cells missing from the aggregate are
//! zero-filled and marked as not observed. Location names are reattached
//! afterwards by a left join on location.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use super::statistics::BalanceStats;
use crate::models::{
    BalancedPanelRow, Category, FlowAggregate, FlowCounts, FlowKey, LocationNames, PeriodRange,
};

/// Opening stock of each (location, category) series
pub type OpeningStocks = FxHashMap<(String, Category), i64>;

/// Balanced rows before stock reconciliation
#[derive(Debug, Clone, Default)]
pub struct BalancedGrid {
    /// Rows in (location, category, period) order
    pub rows: Vec<BalancedPanelRow>,
    /// Net flow dated before the range, when carried forward
    pub opening: OpeningStocks,
    pub stats: BalanceStats,
}

/// Expand an aggregate to the full grid
///
/// With `carry_prior_flows`, cells dated before the range seed the opening
/// stock of their series; otherwise they are dropped like cells dated after
/// the range. Either way they never appear as rows.
#[must_use]
pub fn balance(aggregate: &FlowAggregate, periods: PeriodRange, carry_prior_flows: bool) -> BalancedGrid {
    let locations: BTreeSet<&str> = aggregate.locations();
    let mut stats = BalanceStats {
        locations: locations.len(),
        ..Default::default()
    };

    let mut opening = OpeningStocks::default();
    for (key, counts) in aggregate.iter() {
        if key.period < periods.start {
            stats.cells_before_range += 1;
            if carry_prior_flows {
                let seed = opening.entry((key.location.clone(), key.category)).or_default();
                *seed = seed.saturating_add(counts.net());
            }
        } else if key.period > periods.end {
            stats.cells_after_range += 1;
        }
    }

    let mut rows =
        Vec::with_capacity(locations.len() * Category::PANEL.len() * periods.len());
    for location in locations {
        let mut key = FlowKey::new(location, Category::Agro, periods.start);
        for category in Category::PANEL {
            key.category = category;
            for period in periods.years() {
                key.period = period;
                let observed = aggregate.get(&key);
                if observed.is_some() {
                    stats.observed_cells += 1;
                } else {
                    stats.synthesized_cells += 1;
                }
                rows.push(BalancedPanelRow::unreconciled(
                    location.to_string(),
                    category,
                    period,
                    observed.unwrap_or_default(),
                    observed.is_some(),
                ));
            }
        }
    }

    BalancedGrid {
        rows,
        opening,
        stats,
    }
}

/// Left join location names onto balanced rows
///
/// Every row is kept exactly once; locations without a known name keep
/// `None`.
pub fn attach_location_names(rows: &mut [BalancedPanelRow], names: &LocationNames) {
    if names.is_empty() {
        return;
    }
    for row in rows {
        row.location_name = names.get(&row.location).map(str::to_string);
    }
}
