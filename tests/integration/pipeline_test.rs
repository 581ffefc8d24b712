use flow_panel::models::{Category, FlowCounts, PeriodRange};
use flow_panel::{PanelError, PanelPipeline, read_panel_parquet};

use crate::utils::{Fixture, inclusion_line, source_line};

fn inclusion() -> Vec<String> {
    vec![
        inclusion_line("00000001", "S", "20160310", "00000000"),
        inclusion_line("00000002", "S", "20170101", "20180630"),
        inclusion_line("00000003", "S", "20160101", "20200101"),
        inclusion_line("00000004", "N", "20160101", "00000000"),
        inclusion_line("00000005", "S", "18991231", "20190101"),
    ]
}

fn sources() -> Vec<Vec<String>> {
    vec![
        vec![
            source_line("00000001", "0111", "3550308", "São Paulo"),
            source_line("00000002", "2511", "3550308", "São Paulo"),
            source_line("00000004", "0111", "3550308", "São Paulo"),
        ],
        vec![
            source_line("00000003", "8411", "3304557.0", "Rio de Janeiro"),
            source_line("00000005", "4711", "3304557", "Rio de Janeiro"),
            source_line("00000009", "4711", "3304557", "Rio de Janeiro"),
        ],
    ]
}

#[test]
fn test_end_to_end_run() -> flow_panel::Result<()> {
    let fixture = Fixture::new(&sources(), &inclusion(), PeriodRange::new(2016, 2020));
    let (panel, report) = PanelPipeline::new(fixture.config.clone()).run()?;

    // 2 locations × 5 categories × 5 periods
    assert_eq!(panel.len(), 50);
    assert_eq!(panel.len(), panel.expected_len());
    assert_eq!(report.extraction.files_processed, 2);
    assert_eq!(report.extraction.rows_read, 6);
    assert_eq!(report.extraction.rows_excluded, 2);
    assert_eq!(report.extraction.start_absent, 1);

    assert_eq!(panel.stock_series("3550308", Category::Agro), vec![1, 1, 1, 1, 1]);
    assert_eq!(panel.stock_series("3550308", Category::Industry), vec![0, 1, 0, 0, 0]);
    assert_eq!(panel.stock_series("3304557", Category::PublicSector), vec![1, 1, 1, 1, 0]);
    assert_eq!(panel.stock_series("3304557", Category::Services), vec![0, 0, 0, -1, -1]);
    assert_eq!(panel.stock_series("3550308", Category::Total), vec![1, 2, 1, 1, 1]);
    assert_eq!(panel.stock_series("3304557", Category::Total), vec![1, 1, 1, 0, -1]);
    assert_eq!(report.reconciliation.negative_series, 2);

    let names: Vec<_> = panel
        .rows
        .iter()
        .filter(|r| r.location == "3550308")
        .map(|r| r.location_name.as_deref())
        .collect();
    assert!(names.iter().all(|n| *n == Some("São Paulo")));

    let stored = read_panel_parquet(&fixture.config.output_path)?;
    assert_eq!(stored, panel.rows);
    Ok(())
}

#[test]
fn test_semantic_flows_are_conserved() -> flow_panel::Result<()> {
    let fixture = Fixture::new(&sources(), &inclusion(), PeriodRange::new(2016, 2020));
    let (panel, report) = PanelPipeline::new(fixture.config.clone()).run()?;

    assert_eq!(
        panel.semantic_totals(),
        FlowCounts::new(
            report.extraction.entries_counted,
            report.extraction.exits_counted
        )
    );
    let total_rows: FlowCounts = panel
        .rows
        .iter()
        .filter(|r| r.category.is_total())
        .map(|r| r.counts())
        .sum();
    assert_eq!(total_rows, panel.semantic_totals());
    Ok(())
}

#[test]
fn test_result_does_not_depend_on_chunking_or_threads() -> flow_panel::Result<()> {
    let fixture = Fixture::new(&sources(), &inclusion(), PeriodRange::new(2016, 2020));
    let (reference, _) = PanelPipeline::new(fixture.config.clone()).run()?;

    let mut config = fixture.config.clone();
    config.chunk_size = 1;
    config.threads = Some(1);
    config.output_path = fixture.path("single.parquet");
    let (panel, _) = PanelPipeline::new(config).run()?;

    assert_eq!(panel.rows, reference.rows);
    Ok(())
}

#[test]
fn test_missing_source_is_skipped_and_reported() -> flow_panel::Result<()> {
    let fixture = Fixture::new(&sources(), &inclusion(), PeriodRange::new(2016, 2020));
    let mut config = fixture.config.clone();
    let missing = fixture.path("estab_part9.csv");
    config.sources.paths.push(missing.clone());

    let (panel, report) = PanelPipeline::new(config).run()?;
    assert_eq!(report.extraction.files_processed, 2);
    assert_eq!(report.extraction.skipped_sources, vec![missing]);
    assert_eq!(panel.len(), 50);
    assert!(report.summary().contains("1 skipped"));
    Ok(())
}

#[test]
fn test_run_without_matching_rows_fails() {
    let inclusion = vec![inclusion_line("00000077", "S", "20160101", "00000000")];
    let fixture = Fixture::new(&sources(), &inclusion, PeriodRange::new(2016, 2020));

    let result = PanelPipeline::new(fixture.config.clone()).run();
    assert!(matches!(
        result,
        Err(PanelError::EmptyAggregate { rows_read: 6, rows_matched: 0 })
    ));
    assert!(!fixture.config.output_path.exists());
}

#[test]
fn test_empty_inclusion_set_fails() {
    let inclusion = vec![inclusion_line("00000001", "N", "20160101", "00000000")];
    let fixture = Fixture::new(&sources(), &inclusion, PeriodRange::new(2016, 2020));

    let result = PanelPipeline::new(fixture.config.clone()).run();
    assert!(matches!(result, Err(PanelError::EmptyInclusionSet(_))));
}

#[test]
fn test_carry_prior_flows_seeds_opening_stock() -> flow_panel::Result<()> {
    let fixture = Fixture::new(&sources(), &inclusion(), PeriodRange::new(2018, 2020));

    let (dropped, report) = PanelPipeline::new(fixture.config.clone()).run()?;
    assert_eq!(dropped.stock_series("3550308", Category::Agro), vec![0, 0, 0]);
    assert!(report.balance.cells_before_range > 0);

    let mut config = fixture.config.clone();
    config.carry_prior_flows = true;
    let (carried, _) = PanelPipeline::new(config).run()?;
    assert_eq!(carried.stock_series("3550308", Category::Agro), vec![1, 1, 1]);
    assert_eq!(carried.stock_series("3550308", Category::Industry), vec![0, 0, 0]);
    assert_eq!(carried.len(), dropped.len());
    Ok(())
}

#[test]
fn test_run_with_every_flow_before_the_range_fails() -> flow_panel::Result<()> {
    let fixture = Fixture::new(&sources(), &inclusion(), PeriodRange::new(2030, 2032));

    let result = PanelPipeline::new(fixture.config.clone()).run();
    assert!(matches!(
        result,
        Err(PanelError::EmptyAggregate { rows_read: 6, .. })
    ));
    assert!(!fixture.config.output_path.exists());

    let mut config = fixture.config.clone();
    config.carry_prior_flows = true;
    let (carried, _) = PanelPipeline::new(config).run()?;
    assert_eq!(carried.stock_series("3550308", Category::Agro), vec![1, 1, 1]);
    assert!(carried.rows.iter().all(|r| !r.observed));
    Ok(())
}

#[test]
fn test_inverted_period_range_is_rejected() {
    let fixture = Fixture::new(&sources(), &inclusion(), PeriodRange::new(2020, 2016));

    let result = PanelPipeline::new(fixture.config.clone()).run();
    assert!(matches!(result, Err(PanelError::ConfigError(_))));
    assert!(!fixture.config.output_path.exists());
}
