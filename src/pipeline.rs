//! End-to-end panel construction
//!
//! A run loads the inclusion set, consolidates every source into one flow
//! aggregate and turns that aggregate into the balanced, reconciled panel.
//! A balance-only run starts from a stored aggregate instead.

use std::path::Path;
use std::time::Instant;

use crate::algorithm::{
    BalanceStats, ExtractionStats, RunReport, apply_log_transform, attach_location_names,
    balance, consolidate_sources, reconcile_stock, totalize,
};
use crate::config::PanelConfig;
use crate::error::{PanelError, Result};
use crate::inclusion::load_inclusion_set;
use crate::models::{BalancedPanel, Category, FlowAggregate, LocationNames};
use crate::utils::io::{read_aggregate_parquet, write_aggregate_parquet, write_panel_parquet};
use crate::utils::logging::{create_spinner, finish_progress_bar, log_stage};

/// Runs the panel stages for one configuration
#[derive(Debug, Clone)]
pub struct PanelPipeline {
    config: PanelConfig,
}

impl PanelPipeline {
    #[must_use]
    pub const fn new(config: PanelConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// Build the panel from the configured sources and write it out
    pub fn run(&self) -> Result<(BalancedPanel, RunReport)> {
        self.config.validate()?;
        let start = Instant::now();
        log::info!("Starting flow panel construction");
        log::info!("Configuration: {}", self.config);

        log::info!("[Step 1/3] Loading inclusion set");
        let spinner = create_spinner(Some("Loading inclusion set"));
        let loaded = load_inclusion_set(&self.config.inclusion, self.config.min_plausible_year);
        finish_progress_bar(&spinner, None);
        let (inclusion, _) = loaded?;

        log::info!("[Step 2/3] Extracting and consolidating {} sources", self.config.sources.paths.len());
        let stage = Instant::now();
        let consolidated = consolidate_sources(&self.config, &inclusion)?;
        log_stage(
            "Consolidation",
            &format!(
                "{} cells from {} rows",
                consolidated.flows.len(),
                consolidated.stats.rows_read
            ),
            stage.elapsed(),
        );

        if let Some(path) = &self.config.aggregate_path {
            if !consolidated.flows.is_empty() {
                write_aggregate_parquet(&consolidated.flows, path)?;
            }
        }

        log::info!("[Step 3/3] Building balanced panel");
        let (panel, report) =
            self.build_panel(consolidated.flows, &consolidated.names, consolidated.stats)?;
        write_panel_parquet(&panel, &self.config.output_path)?;

        log_stage("Flow panel", &format!("{} rows", panel.len()), start.elapsed());
        Ok((panel, report))
    }

    /// Build the panel from a stored aggregate and write it out
    ///
    /// Location names are not part of the stored aggregate, so every row has
    /// `location_name` unset.
    pub fn run_from_aggregate(&self, path: &Path) -> Result<(BalancedPanel, RunReport)> {
        self.config.validate()?;
        let start = Instant::now();
        log::info!("Balancing stored aggregate {}", path.display());

        let aggregate = read_aggregate_parquet(path)?;
        let (panel, report) =
            self.build_panel(aggregate, &LocationNames::new(), ExtractionStats::default())?;
        write_panel_parquet(&panel, &self.config.output_path)?;

        log_stage("Flow panel", &format!("{} rows", panel.len()), start.elapsed());
        Ok((panel, report))
    }

    /// Balance the stored aggregate named by the configuration
    pub fn run_balance_only(&self) -> Result<(BalancedPanel, RunReport)> {
        let path = self.config.aggregate_path.as_deref().ok_or_else(|| {
            PanelError::config("A balance-only run needs `aggregate_path` to be set")
        })?;
        self.run_from_aggregate(path)
    }

    /// Turn a consolidated aggregate into the balanced panel
    ///
    /// Totalizes, balances onto the configured period range, reattaches
    /// location names, reconciles stocks and applies the log transform.
    /// Nothing is written. Fails with [`PanelError::EmptyAggregate`] when no
    /// flow falls inside the period range and none is carried into it.
    pub fn build_panel(
        &self,
        aggregate: FlowAggregate,
        names: &LocationNames,
        extraction: ExtractionStats,
    ) -> Result<(BalancedPanel, RunReport)> {
        self.config.validate()?;
        let aggregate = aggregate.without_category(Category::Total);
        if aggregate.is_empty() {
            return Err(PanelError::EmptyAggregate {
                rows_read: extraction.rows_read,
                rows_matched: extraction.rows_matched,
            });
        }
        let periods = self.config.periods;

        let stage = Instant::now();
        let aggregate = totalize(aggregate);
        let grid = balance(&aggregate, periods, self.config.carry_prior_flows);
        drop(aggregate);
        log_balance(&grid.stats);
        if grid.stats.observed_cells == 0 && grid.opening.is_empty() {
            return Err(PanelError::EmptyAggregate {
                rows_read: extraction.rows_read,
                rows_matched: extraction.rows_matched,
            });
        }

        let mut rows = grid.rows;
        attach_location_names(&mut rows, names);
        let reconciliation = reconcile_stock(&mut rows, &grid.opening);
        apply_log_transform(&mut rows);
        log_stage(
            "Balancing",
            &format!("{} series over {periods}", reconciliation.series),
            stage.elapsed(),
        );

        let panel = BalancedPanel {
            rows,
            periods,
            location_count: grid.stats.locations,
        };
        debug_assert_eq!(panel.len(), panel.expected_len());

        let report = RunReport {
            extraction,
            balance: grid.stats,
            reconciliation,
            panel_rows: panel.len(),
            periods: Some(periods),
        };
        log::info!("{}", report.summary());
        Ok((panel, report))
    }
}

fn log_balance(stats: &BalanceStats) {
    log::info!(
        "Balanced {} locations: {} observed cells, {} zero-filled",
        stats.locations,
        stats.observed_cells,
        stats.synthesized_cells
    );
    if stats.cells_before_range + stats.cells_after_range > 0 {
        log::warn!(
            "{} aggregate cells fall outside the period range ({} before, {} after)",
            stats.cells_before_range + stats.cells_after_range,
            stats.cells_before_range,
            stats.cells_after_range
        );
    }
}
