//! Derived `Total` category
//!
//! Adds, for every (location, period) with any flow, a `Total` cell holding
//! the sum over the semantic categories. Existing `Total` cells are discarded
//! first, so totalizing twice gives the same aggregate as totalizing once.

use rustc_hash::FxHashMap;

use crate::models::{Category, FlowAggregate, FlowCounts, FlowKey, Period};

/// Return the aggregate with a freshly derived `Total` category
#[must_use]
pub fn totalize(aggregate: FlowAggregate) -> FlowAggregate {
    let semantic = aggregate.without_category(Category::Total);

    let mut totals: FxHashMap<(&str, Period), FlowCounts> = FxHashMap::default();
    for (key, counts) in semantic.iter() {
        *totals.entry((key.location.as_str(), key.period)).or_default() += *counts;
    }

    let total_cells: Vec<(FlowKey, FlowCounts)> = totals
        .into_iter()
        .map(|((location, period), counts)| {
            (FlowKey::new(location, Category::Total, period), counts)
        })
        .collect();

    let mut result = semantic;
    for (key, counts) in total_cells {
        result.add(key, counts);
    }
    result
}
