//! Configuration for a panel run.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::util::safe_open_file;
use crate::error::{PanelError, Result};
use crate::models::PeriodRange;

/// Default number of rows held in memory per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 2_000_000;

/// Default reasonableness floor for period markers
pub const DEFAULT_MIN_PLAUSIBLE_YEAR: i32 = 1900;

/// Environment variable overriding the chunk size
pub const CHUNK_SIZE_ENV: &str = "FLOW_PANEL_CHUNK_SIZE";

/// Helper function to get the chunk size from the environment
#[must_use]
pub fn get_chunk_size() -> Option<usize> {
    std::env::var(CHUNK_SIZE_ENV)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
}

/// Layout of the flow-event source extracts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Source files; missing ones are skipped at run time
    pub paths: Vec<PathBuf>,
    pub delimiter: char,
    pub has_headers: bool,
    pub entity_column: usize,
    pub category_column: usize,
    pub location_column: usize,
    /// Optional column with the location's display name
    pub name_column: Option<usize>,
    /// Optional start marker column, used when the inclusion entry has none
    pub start_column: Option<usize>,
    /// Optional end marker column, used when the inclusion entry has none
    pub end_column: Option<usize>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            delimiter: ';',
            has_headers: false,
            entity_column: 0,
            category_column: 11,
            location_column: 20,
            name_column: None,
            start_column: None,
            end_column: None,
        }
    }
}

/// Layout of the inclusion source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InclusionConfig {
    pub path: PathBuf,
    pub delimiter: char,
    pub has_headers: bool,
    pub entity_column: usize,
    /// Eligibility flag column; without one every row is eligible
    pub flag_column: Option<usize>,
    pub start_column: Option<usize>,
    pub end_column: Option<usize>,
    /// Flag values meaning "eligible", compared case-insensitively
    pub eligible_values: Vec<String>,
}

impl Default for InclusionConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            delimiter: ';',
            has_headers: false,
            entity_column: 0,
            flag_column: Some(4),
            start_column: Some(5),
            end_column: Some(6),
            eligible_values: vec!["S".to_string()],
        }
    }
}

impl InclusionConfig {
    /// Whether a flag value marks the entity as eligible
    #[must_use]
    pub fn is_eligible(&self, flag: &str) -> bool {
        let flag = flag.trim();
        self.eligible_values
            .iter()
            .any(|v| v.trim().eq_ignore_ascii_case(flag))
    }
}

/// Configuration for a complete panel run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub sources: SourceConfig,
    pub inclusion: InclusionConfig,
    /// Years of the balanced grid
    pub periods: PeriodRange,
    /// Rows per chunk; bounds peak memory, never changes the result
    pub chunk_size: usize,
    /// Markers resolving to this year or earlier are treated as absent
    pub min_plausible_year: i32,
    /// Seed each series' opening stock with the net flow dated before the range
    pub carry_prior_flows: bool,
    /// Balanced panel artifact
    pub output_path: PathBuf,
    /// Consolidated pre-balance aggregate artifact
    pub aggregate_path: Option<PathBuf>,
    /// Worker threads for per-file extraction; defaults to the CPU count
    pub threads: Option<usize>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            sources: SourceConfig::default(),
            inclusion: InclusionConfig::default(),
            periods: PeriodRange::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            min_plausible_year: DEFAULT_MIN_PLAUSIBLE_YEAR,
            carry_prior_flows: false,
            output_path: PathBuf::from("data/processed/flow_panel_balanced.parquet"),
            aggregate_path: None,
            threads: None,
        }
    }
}

impl PanelConfig {
    /// Load a configuration from a JSON file, apply environment overrides
    /// and validate it
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = safe_open_file(path, "panel configuration")?;
        let mut config: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override settings from the environment
    pub fn apply_env_overrides(&mut self) {
        if let Some(chunk_size) = get_chunk_size() {
            log::info!("Chunk size overridden by {CHUNK_SIZE_ENV}: {chunk_size}");
            self.chunk_size = chunk_size;
        }
    }

    /// Number of worker threads to use for extraction
    #[must_use]
    pub fn worker_threads(&self) -> usize {
        self.threads
            .filter(|&n| n > 0)
            .unwrap_or_else(num_cpus::get)
            .min(self.sources.paths.len().max(1))
    }

    /// Reject settings no run could succeed with
    pub fn validate(&self) -> Result<()> {
        if self.periods.is_empty() {
            return Err(PanelError::config(format!(
                "Period range {} is empty",
                self.periods
            )));
        }
        if self.chunk_size == 0 {
            return Err(PanelError::config("Chunk size must be positive"));
        }
        if self.inclusion.flag_column.is_some() && self.inclusion.eligible_values.is_empty() {
            return Err(PanelError::config(
                "Inclusion flag column set but no eligible values configured",
            ));
        }
        for (name, delimiter) in [
            ("sources", self.sources.delimiter),
            ("inclusion", self.inclusion.delimiter),
        ] {
            if !delimiter.is_ascii() {
                return Err(PanelError::config(format!(
                    "Delimiter for {name} must be a single ASCII character, got '{delimiter}'"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for PanelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Panel Configuration:")?;
        writeln!(f, "  Periods: {}", self.periods)?;
        writeln!(f, "  Sources: {}", self.sources.paths.len())?;
        writeln!(f, "  Inclusion Source: {}", self.inclusion.path.display())?;
        writeln!(f, "  Chunk Size: {}", self.chunk_size)?;
        writeln!(f, "  Plausible Years: > {}", self.min_plausible_year)?;
        writeln!(f, "  Carry Prior Flows: {}", self.carry_prior_flows)?;
        writeln!(f, "  Output: {}", self.output_path.display())?;
        if let Some(path) = &self.aggregate_path {
            writeln!(f, "  Aggregate Output: {}", path.display())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = PanelConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.periods, PeriodRange::new(2016, 2024));
        assert_eq!(config.sources.location_column, 20);
        assert_eq!(config.inclusion.flag_column, Some(4));
    }

    #[test]
    fn test_validate_rejects_empty_periods() {
        let config = PanelConfig {
            periods: PeriodRange::new(2020, 2019),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PanelError::ConfigError(_))));
    }

    #[test]
    fn test_validate_rejects_non_ascii_delimiter() {
        let mut config = PanelConfig::default();
        config.sources.delimiter = '§';
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "sources": {{ "paths": ["a.csv", "b.csv"], "location_column": 3 }},
                "inclusion": {{ "path": "simples.csv", "eligible_values": ["S", "Y"] }},
                "periods": {{ "start": 2018, "end": 2020 }},
                "carry_prior_flows": true
            }}"#
        )
        .unwrap();

        let config = PanelConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.sources.paths.len(), 2);
        assert_eq!(config.sources.location_column, 3);
        assert_eq!(config.sources.delimiter, ';');
        assert_eq!(config.periods.len(), 3);
        assert!(config.carry_prior_flows);
        assert!(config.inclusion.is_eligible(" y "));
        assert!(!config.inclusion.is_eligible("N"));
    }

    #[test]
    fn test_worker_threads_capped_by_sources() {
        let mut config = PanelConfig {
            threads: Some(16),
            ..Default::default()
        };
        config.sources.paths = vec![PathBuf::from("a"), PathBuf::from("b")];
        assert_eq!(config.worker_threads(), 2);
    }
}
