//! Flow aggregates keyed by (location, category, period)

use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Add, AddAssign};

use rustc_hash::FxHashMap;

use super::category::Category;
use super::period::Period;

/// Identifier of a cell in the flow grid
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlowKey {
    pub location: String,
    pub category: Category,
    pub period: Period,
}

impl FlowKey {
    pub fn new(location: impl Into<String>, category: Category, period: Period) -> Self {
        Self {
            location: location.into(),
            category,
            period,
        }
    }
}

/// Entry and exit counts of one cell
///
/// Both counts are unsigned, so a cell can never hold negative flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowCounts {
    pub entries: u64,
    pub exits: u64,
}

impl FlowCounts {
    #[must_use]
    pub const fn new(entries: u64, exits: u64) -> Self {
        Self { entries, exits }
    }

    /// Net change in stock contributed by this cell
    ///
    /// Saturates at the `i64` bounds when the difference does not fit.
    #[must_use]
    pub fn net(self) -> i64 {
        let net = i128::from(self.entries) - i128::from(self.exits);
        i64::try_from(net).unwrap_or(if net > 0 { i64::MAX } else { i64::MIN })
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.entries == 0 && self.exits == 0
    }
}

impl Add for FlowCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            entries: self.entries + rhs.entries,
            exits: self.exits + rhs.exits,
        }
    }
}

impl AddAssign for FlowCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.entries += rhs.entries;
        self.exits += rhs.exits;
    }
}

impl std::iter::Sum for FlowCounts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Sparse flow aggregate; an absent key means zero flow
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowAggregate {
    cells: FxHashMap<FlowKey, FlowCounts>,
}

impl FlowAggregate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Add counts to a cell, creating it if needed
    pub fn add(&mut self, key: FlowKey, counts: FlowCounts) {
        *self.cells.entry(key).or_default() += counts;
    }

    /// Count one entry into a cell
    pub fn record_entry(&mut self, location: &str, category: Category, period: Period) {
        self.add(FlowKey::new(location, category, period), FlowCounts::new(1, 0));
    }

    /// Count one exit from a cell
    pub fn record_exit(&mut self, location: &str, category: Category, period: Period) {
        self.add(FlowKey::new(location, category, period), FlowCounts::new(0, 1));
    }

    #[must_use]
    pub fn get(&self, key: &FlowKey) -> Option<FlowCounts> {
        self.cells.get(key).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FlowKey, &FlowCounts)> {
        self.cells.iter()
    }

    /// Cells in (location, category, period) order
    #[must_use]
    pub fn sorted(&self) -> Vec<(&FlowKey, FlowCounts)> {
        let mut cells: Vec<_> = self.cells.iter().map(|(k, v)| (k, *v)).collect();
        cells.sort_unstable_by(|a, b| a.0.cmp(b.0));
        cells
    }

    /// Sum of all entries and exits
    #[must_use]
    pub fn totals(&self) -> FlowCounts {
        self.cells.values().copied().sum()
    }

    /// Sum of entries and exits restricted to the semantic categories
    #[must_use]
    pub fn semantic_totals(&self) -> FlowCounts {
        self.cells
            .iter()
            .filter(|(k, _)| !k.category.is_total())
            .map(|(_, v)| *v)
            .sum()
    }

    /// Distinct locations, sorted
    #[must_use]
    pub fn locations(&self) -> BTreeSet<&str> {
        self.cells.keys().map(|k| k.location.as_str()).collect()
    }

    #[must_use]
    pub fn contains_category(&self, category: Category) -> bool {
        self.cells.keys().any(|k| k.category == category)
    }

    /// Drop every cell of the given category
    #[must_use]
    pub fn without_category(mut self, category: Category) -> Self {
        self.cells.retain(|k, _| k.category != category);
        self
    }
}

impl FromIterator<(FlowKey, FlowCounts)> for FlowAggregate {
    fn from_iter<T: IntoIterator<Item = (FlowKey, FlowCounts)>>(iter: T) -> Self {
        let mut aggregate = Self::new();
        for (key, counts) in iter {
            aggregate.add(key, counts);
        }
        aggregate
    }
}

impl IntoIterator for FlowAggregate {
    type Item = (FlowKey, FlowCounts);
    type IntoIter = std::collections::hash_map::IntoIter<FlowKey, FlowCounts>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.into_iter()
    }
}

/// Deduplicated location → display name table
///
/// Conflicting names for one location resolve to the lexicographically
/// smallest, so the table is independent of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationNames {
    names: BTreeMap<String, String>,
}

impl LocationNames {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, location: &str, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        match self.names.get_mut(location) {
            Some(existing) if existing.as_str() <= name => {}
            Some(existing) => *existing = name.to_string(),
            None => {
                self.names.insert(location.to_string(), name.to_string());
            }
        }
    }

    #[must_use]
    pub fn get(&self, location: &str) -> Option<&str> {
        self.names.get(location).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
