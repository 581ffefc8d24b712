//! Inclusion set loading and lookup
//!
//! The inclusion source lists entities with an eligibility flag and the
//! dates on which they started and stopped being eligible. Only entities
//! flagged eligible enter the set; their dates become the period markers used
//! by flow extraction.

use std::io::Read;
use std::time::Instant;

use csv::{ByteRecord, Reader};
use rustc_hash::FxHashMap;

use crate::algorithm::extract::parse_period_marker;
use crate::config::InclusionConfig;
use crate::error::{PanelError, Result};
use crate::models::InclusionEntry;
use crate::models::record::normalize_entity_id;
use crate::utils::io::delimited::{latin1_field, non_empty_field, open_delimited};
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Eligible entities keyed by normalized identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InclusionSet {
    entries: FxHashMap<String, InclusionEntry>,
}

impl InclusionSet {
    #[must_use]
    pub fn get(&self, entity_id: &str) -> Option<&InclusionEntry> {
        self.entries.get(entity_id)
    }

    #[must_use]
    pub fn contains(&self, entity_id: &str) -> bool {
        self.entries.contains_key(entity_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, InclusionEntry)> for InclusionSet {
    /// The first occurrence of an identifier wins
    fn from_iter<T: IntoIterator<Item = (String, InclusionEntry)>>(iter: T) -> Self {
        let mut entries = FxHashMap::default();
        for (id, entry) in iter {
            entries.entry(id).or_insert(entry);
        }
        Self { entries }
    }
}

/// Counters gathered while loading the inclusion source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InclusionStats {
    pub rows_read: u64,
    pub eligible: u64,
    pub ineligible: u64,
    /// Eligible rows repeating an identifier already in the set
    pub duplicates: u64,
    pub start_absent: u64,
    pub end_absent: u64,
}

/// Read an inclusion source from any delimited reader
pub fn read_inclusion_set<R: Read>(
    mut reader: Reader<R>,
    config: &InclusionConfig,
    min_plausible_year: i32,
) -> Result<(InclusionSet, InclusionStats)> {
    let mut entries: FxHashMap<String, InclusionEntry> = FxHashMap::default();
    let mut stats = InclusionStats::default();
    let mut record = ByteRecord::new();

    while reader.read_byte_record(&mut record)? {
        stats.rows_read += 1;

        let eligible = config.flag_column.is_none_or(|column| {
            latin1_field(&record, column).is_some_and(|flag| config.is_eligible(&flag))
        });
        if !eligible {
            stats.ineligible += 1;
            continue;
        }

        let id = latin1_field(&record, config.entity_column)
            .map(|raw| normalize_entity_id(&raw))
            .unwrap_or_default();
        if id.is_empty() {
            stats.ineligible += 1;
            continue;
        }

        let marker = |column: Option<usize>| {
            column
                .and_then(|c| non_empty_field(&record, c))
                .and_then(|raw| parse_period_marker(&raw, min_plausible_year))
        };
        let entry = InclusionEntry {
            start: marker(config.start_column),
            end: marker(config.end_column),
        };

        if entries.contains_key(&id) {
            stats.duplicates += 1;
            continue;
        }
        stats.eligible += 1;
        stats.start_absent += u64::from(entry.start.is_none());
        stats.end_absent += u64::from(entry.end.is_none());
        entries.insert(id, entry);
    }

    Ok((InclusionSet { entries }, stats))
}

/// Load the inclusion set described by the configuration
///
/// A missing or empty inclusion source is fatal for the run.
pub fn load_inclusion_set(
    config: &InclusionConfig,
    min_plausible_year: i32,
) -> Result<(InclusionSet, InclusionStats)> {
    let path = config.path.as_path();
    if !path.is_file() {
        return Err(PanelError::MissingInclusionSet(path.to_path_buf()));
    }

    let start = Instant::now();
    log_operation_start("Loading inclusion set from", path);
    let reader = open_delimited(path, config.delimiter, config.has_headers, "inclusion set")?;
    let (set, stats) = read_inclusion_set(reader, config, min_plausible_year)?;

    if set.is_empty() {
        return Err(PanelError::EmptyInclusionSet(path.to_path_buf()));
    }
    if stats.duplicates > 0 {
        log::warn!(
            "Inclusion source {} repeats {} eligible identifiers; first occurrence kept",
            path.display(),
            stats.duplicates
        );
    }
    log::debug!(
        "Inclusion set: {} eligible, {} ineligible, {} without start year, {} without end year",
        stats.eligible,
        stats.ineligible,
        stats.start_absent,
        stats.end_absent
    );
    log_operation_complete("loaded", path, set.len(), "eligible entities", Some(start.elapsed()));
    Ok((set, stats))
}
