//! Record classification by activity-code division
//!
//! The first two characters of an activity code form its division (`01`–`99`).
//! Divisions are mapped through one ordered range table; anything the table
//! does not cover, including malformed prefixes, falls into the catch-all.

use itertools::Itertools;

use crate::models::Category;

/// Inclusive division range mapped to a category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DivisionRange {
    pub first: u8,
    pub last: u8,
    pub category: Category,
}

impl DivisionRange {
    const fn new(first: u8, last: u8, category: Category) -> Self {
        Self {
            first,
            last,
            category,
        }
    }

    #[must_use]
    pub const fn contains(&self, division: u8) -> bool {
        division >= self.first && division <= self.last
    }

    const fn overlaps(&self, other: &Self) -> bool {
        self.first <= other.last && other.first <= self.last
    }
}

/// Canonical division table, matched in order
pub const CLASSIFICATION_TABLE: [DivisionRange; 3] = [
    DivisionRange::new(1, 3, Category::Agro),
    DivisionRange::new(5, 33, Category::Industry),
    DivisionRange::new(84, 84, Category::PublicSector),
];

/// Category for divisions outside the table and malformed codes
pub const CATCH_ALL: Category = Category::Services;

/// Parse the two-digit division prefix of an activity code
#[must_use]
pub fn division_of(code: &str) -> Option<u8> {
    let prefix = code.trim().as_bytes().get(..2)?;
    if !prefix.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some((prefix[0] - b'0') * 10 + (prefix[1] - b'0'))
}

/// Map an activity code to its semantic category
///
/// Total and side-effect free: never returns [`Category::Total`].
#[must_use]
pub fn classify(code: &str) -> Category {
    division_of(code).map_or(CATCH_ALL, classify_division)
}

/// Map a parsed division to its semantic category
#[must_use]
pub fn classify_division(division: u8) -> Category {
    CLASSIFICATION_TABLE
        .iter()
        .find(|range| range.contains(division))
        .map_or(CATCH_ALL, |range| range.category)
}

/// Check the table's structural invariants
///
/// Returns a description of every violation: overlapping ranges, inverted
/// bounds, ranges outside `00`–`99`, or mappings to a derived category.
#[must_use]
pub fn validate_table(table: &[DivisionRange]) -> Vec<String> {
    let mut issues = Vec::new();

    for (i, range) in table.iter().enumerate() {
        if range.first > range.last {
            issues.push(format!(
                "range {i} has inverted bounds {}..={}",
                range.first, range.last
            ));
        }
        if range.last > 99 {
            issues.push(format!("range {i} exceeds two-digit divisions"));
        }
        if !Category::SEMANTIC.contains(&range.category) {
            issues.push(format!("range {i} maps to derived category {}", range.category));
        }
    }

    for ((i, a), (j, b)) in table.iter().enumerate().tuple_combinations() {
        if a.overlaps(b) {
            issues.push(format!("ranges {i} and {j} overlap"));
        }
    }

    if !Category::SEMANTIC.contains(&CATCH_ALL) {
        issues.push(format!("catch-all {CATCH_ALL} is not a semantic category"));
    }

    issues
}
