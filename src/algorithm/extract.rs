//! Chunk-level flow extraction
//!
//! Each chunk of raw records is reduced to an owned [`PartialAggregate`]:
//! rows outside the inclusion set are dropped, the rest are classified and
//! counted into `entries` at their start year and, independently, into
//! `exits` at their end year.

use chrono::{Datelike, NaiveDate};

use super::classify::classify;
use super::merge::Merge;
use super::statistics::ExtractionStats;
use crate::inclusion::InclusionSet;
use crate::models::{FlowAggregate, LocationNames, Period, RawRecord};

/// Resolve a period marker to a plausible calendar year
///
/// Accepts `YYYYMMDD`, `YYYYMM` and `YYYY` (optionally with a trailing `.0`
/// from float exports) and ISO dates. Anything else, and any year not
/// strictly greater than `min_year`, is treated as absent.
#[must_use]
pub fn parse_period_marker(raw: &str, min_year: i32) -> Option<Period> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_suffix(".0").unwrap_or(trimmed);

    let year = if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        let value: i64 = digits.parse().ok()?;
        match digits.len() {
            8 => value / 10_000,
            6 => value / 100,
            4 => value,
            _ => return None,
        }
    } else {
        i64::from(NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()?.year())
    };

    let year = Period::try_from(year).ok()?;
    (year > min_year).then_some(year)
}

/// Result of extracting one chunk, one file, or a whole dataset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialAggregate {
    pub flows: FlowAggregate,
    pub names: LocationNames,
    pub stats: ExtractionStats,
}

impl Merge for PartialAggregate {
    fn merge(self, other: Self) -> Self {
        Self {
            flows: self.flows.merge(other.flows),
            names: self.names.merge(other.names),
            stats: self.stats.merge(other.stats),
        }
    }
}

/// Turns chunks of raw records into partial aggregates
#[derive(Debug, Clone, Copy)]
pub struct ChunkExtractor<'a> {
    inclusion: &'a InclusionSet,
    min_plausible_year: i32,
}

impl<'a> ChunkExtractor<'a> {
    #[must_use]
    pub const fn new(inclusion: &'a InclusionSet, min_plausible_year: i32) -> Self {
        Self {
            inclusion,
            min_plausible_year,
        }
    }

    fn resolve_marker(&self, from_inclusion: Option<Period>, own: Option<&str>) -> Option<Period> {
        from_inclusion.or_else(|| own.and_then(|m| parse_period_marker(m, self.min_plausible_year)))
    }

    /// Aggregate one chunk of records
    #[must_use]
    pub fn extract_chunk(&self, records: &[RawRecord]) -> PartialAggregate {
        let mut flows = FlowAggregate::new();
        let mut names = LocationNames::new();
        let mut stats = ExtractionStats {
            chunks: 1,
            ..Default::default()
        };

        for record in records {
            stats.rows_read += 1;
            if record.is_malformed() {
                stats.rows_malformed += 1;
                continue;
            }
            let Some(entry) = self.inclusion.get(&record.entity_id) else {
                stats.rows_excluded += 1;
                continue;
            };
            stats.rows_matched += 1;

            let category = classify(&record.category_code);
            if let Some(name) = &record.location_name {
                names.insert(&record.location, name);
            }

            match self.resolve_marker(entry.start, record.start_marker.as_deref()) {
                Some(year) => {
                    flows.record_entry(&record.location, category, year);
                    stats.entries_counted += 1;
                }
                None => stats.start_absent += 1,
            }
            match self.resolve_marker(entry.end, record.end_marker.as_deref()) {
                Some(year) => {
                    flows.record_exit(&record.location, category, year);
                    stats.exits_counted += 1;
                }
                None => stats.end_absent += 1,
            }
        }

        PartialAggregate {
            flows,
            names,
            stats,
        }
    }
}
