use flow_panel::models::{Category, PeriodRange};
use flow_panel::{PanelPipeline, read_aggregate_parquet, read_panel_parquet};

use crate::utils::{Fixture, inclusion_line, source_line};

fn fixture() -> Fixture {
    let inclusion = vec![
        inclusion_line("11", "S", "20160101", "20190101"),
        inclusion_line("12", "s", "20170101", "00000000"),
        inclusion_line("13", "S", "2018-05-01", "0"),
    ];
    let sources = vec![vec![
        source_line("11", "0150", "10", "Norte"),
        source_line("12", "0150", "10", "Norte"),
        source_line("13", "3311", "20", ""),
    ]];
    Fixture::new(&sources, &inclusion, PeriodRange::new(2016, 2019))
}

#[test]
fn test_balance_only_run_matches_full_run() -> flow_panel::Result<()> {
    let fixture = fixture();
    let mut config = fixture.config.clone();
    config.aggregate_path = Some(fixture.path("aggregate.parquet"));

    let (full, _) = PanelPipeline::new(config.clone()).run()?;
    let stored = read_aggregate_parquet(&fixture.path("aggregate.parquet"))?;
    assert_eq!(stored.len(), 4);

    config.output_path = fixture.path("rebalanced.parquet");
    let (rebalanced, report) = PanelPipeline::new(config).run_balance_only()?;
    assert_eq!(report.extraction.rows_read, 0);

    let stocks = |panel: &flow_panel::BalancedPanel| {
        panel
            .rows
            .iter()
            .map(|r| (r.location.clone(), r.category, r.period, r.stock, r.observed))
            .collect::<Vec<_>>()
    };
    assert_eq!(stocks(&rebalanced), stocks(&full));
    assert!(rebalanced.rows.iter().all(|r| r.location_name.is_none()));
    Ok(())
}

#[test]
fn test_stored_panel_keeps_observed_flags_and_names() -> flow_panel::Result<()> {
    let fixture = fixture();
    let (panel, _) = PanelPipeline::new(fixture.config.clone()).run()?;
    let rows = read_panel_parquet(&fixture.config.output_path)?;

    assert_eq!(rows.len(), 2 * Category::PANEL.len() * 4);
    assert_eq!(rows.iter().filter(|r| r.observed).count(), panel.rows.iter().filter(|r| r.observed).count());

    let agro: Vec<_> = rows
        .iter()
        .filter(|r| r.location == "10" && r.category == Category::Agro)
        .map(|r| (r.period, r.stock, r.location_name.as_deref()))
        .collect();
    assert_eq!(
        agro,
        vec![
            (2016, 1, Some("Norte")),
            (2017, 2, Some("Norte")),
            (2018, 2, Some("Norte")),
            (2019, 1, Some("Norte")),
        ]
    );
    assert!(rows.iter().filter(|r| r.location == "20").all(|r| r.location_name.is_none()));
    Ok(())
}
