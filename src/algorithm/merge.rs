//! Associative merge of partial results
//!
//! Chunk-level, file-level and dataset-level reduction all use the same law:
//! every implementation must be associative and commutative with
//! `Default::default()` as identity, so partial results can be combined in
//! any grouping and completion order.

use rayon::prelude::*;

use crate::models::{FlowAggregate, LocationNames};

/// A value that can be combined with another of its kind
pub trait Merge: Sized + Default {
    /// Combine two partial results, consuming both
    #[must_use]
    fn merge(self, other: Self) -> Self;
}

/// Sequential left fold over partial results
pub fn merge_all<T, I>(parts: I) -> T
where
    T: Merge,
    I: IntoIterator<Item = T>,
{
    parts.into_iter().fold(T::default(), T::merge)
}

/// Tree reduction over partial results on the rayon pool
pub fn par_merge_all<T>(parts: Vec<T>) -> T
where
    T: Merge + Send,
{
    parts.into_par_iter().reduce(T::default, T::merge)
}

impl Merge for FlowAggregate {
    /// Pointwise sum on shared keys, union otherwise
    fn merge(self, other: Self) -> Self {
        // Fold the smaller side into the larger one.
        let (mut larger, smaller) = if self.len() >= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        for (key, counts) in smaller {
            larger.add(key, counts);
        }
        larger
    }
}

impl Merge for LocationNames {
    fn merge(self, other: Self) -> Self {
        let (mut larger, smaller) = if self.len() >= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        for (location, name) in smaller.iter() {
            larger.insert(location, name);
        }
        larger
    }
}
