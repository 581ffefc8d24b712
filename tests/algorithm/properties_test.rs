use flow_panel::algorithm::merge::{merge_all, par_merge_all};
use flow_panel::algorithm::{
    ChunkExtractor, Merge, PartialAggregate, balance, reconcile_stock, totalize,
};
use flow_panel::inclusion::InclusionSet;
use flow_panel::models::{
    Category, FlowAggregate, FlowCounts, FlowKey, InclusionEntry, PeriodRange, RawRecord,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const CODES: [&str; 6] = ["0111", "2511", "4711", "8411", "9999", "x1"];

fn random_records(rng: &mut StdRng, count: usize) -> Vec<RawRecord> {
    (0..count)
        .map(|_| {
            let entity = rng.random_range(1..40).to_string();
            let code = CODES[rng.random_range(0..CODES.len())];
            let location = rng.random_range(100..106).to_string();
            RawRecord::new(entity, code, location)
        })
        .collect()
}

fn random_inclusion(rng: &mut StdRng) -> InclusionSet {
    (1..30)
        .map(|i| {
            let start = rng.random_bool(0.9).then(|| rng.random_range(2014..2026));
            let end = rng.random_bool(0.5).then(|| rng.random_range(2014..2026));
            (i.to_string(), InclusionEntry { start, end })
        })
        .collect()
}

/// Split `records` at random points into contiguous chunks
fn random_partition<'a>(rng: &mut StdRng, records: &'a [RawRecord]) -> Vec<&'a [RawRecord]> {
    let mut cuts: Vec<usize> = (0..rng.random_range(0..8))
        .map(|_| rng.random_range(0..=records.len()))
        .collect();
    cuts.push(0);
    cuts.push(records.len());
    cuts.sort_unstable();
    cuts.windows(2).map(|w| &records[w[0]..w[1]]).collect()
}

#[test]
fn test_merge_is_partition_independent() {
    let mut rng = StdRng::seed_from_u64(42);
    let inclusion = random_inclusion(&mut rng);
    let extractor = ChunkExtractor::new(&inclusion, 1900);
    let records = random_records(&mut rng, 500);
    let whole = extractor.extract_chunk(&records);

    for _ in 0..20 {
        let mut parts: Vec<PartialAggregate> = random_partition(&mut rng, &records)
            .into_iter()
            .map(|chunk| extractor.extract_chunk(chunk))
            .collect();

        let sequential = merge_all(parts.clone());
        assert_eq!(sequential.flows, whole.flows);
        assert_eq!(sequential.stats.rows_read, whole.stats.rows_read);
        assert_eq!(sequential.stats.entries_counted, whole.stats.entries_counted);

        parts.shuffle(&mut rng);
        let shuffled = par_merge_all(parts);
        assert_eq!(shuffled.flows, whole.flows);
        assert_eq!(shuffled.stats.rows_matched, whole.stats.rows_matched);
    }
}

#[test]
fn test_merge_is_associative() {
    let mut rng = StdRng::seed_from_u64(7);
    let inclusion = random_inclusion(&mut rng);
    let extractor = ChunkExtractor::new(&inclusion, 1900);
    let [a, b, c] = [0, 1, 2].map(|_| extractor.extract_chunk(&random_records(&mut rng, 80)).flows);

    let left = a.clone().merge(b.clone()).merge(c.clone());
    let right = a.clone().merge(b.clone().merge(c.clone()));
    assert_eq!(left, right);
    assert_eq!(a.clone().merge(FlowAggregate::default()), a);
    assert_eq!(a.clone().merge(b.clone()), b.merge(a));
}

#[test]
fn test_non_member_never_contributes() {
    let inclusion: InclusionSet = std::iter::once((
        "1".to_string(),
        InclusionEntry {
            start: Some(2018),
            end: None,
        },
    ))
    .collect();
    let extractor = ChunkExtractor::new(&inclusion, 1900);

    let records = vec![
        RawRecord::new("1", "0111", "10"),
        RawRecord::new("2", "0111", "10").with_markers(Some("20180101"), Some("20190101")),
        RawRecord::new("3", "2511", "99").with_markers(Some("2018"), None),
    ];
    let partial = extractor.extract_chunk(&records);

    assert_eq!(partial.stats.rows_excluded, 2);
    assert_eq!(partial.flows.len(), 1);
    assert_eq!(
        partial.flows.get(&FlowKey::new("10", Category::Agro, 2018)),
        Some(FlowCounts::new(1, 0))
    );
    assert!(!partial.flows.locations().contains("99"));
}

#[test]
fn test_balancing_conserves_in_range_flows() {
    let mut rng = StdRng::seed_from_u64(3);
    let inclusion = random_inclusion(&mut rng);
    let extractor = ChunkExtractor::new(&inclusion, 1900);
    let periods = PeriodRange::new(2014, 2025);

    let aggregate = totalize(extractor.extract_chunk(&random_records(&mut rng, 400)).flows);
    let grid = balance(&aggregate, periods, false);

    let in_range: FlowCounts = aggregate
        .iter()
        .filter(|(k, _)| periods.contains(k.period))
        .map(|(_, c)| *c)
        .sum();
    let balanced: FlowCounts = grid.rows.iter().map(|r| r.counts()).sum();
    assert_eq!(balanced, in_range);

    let locations = aggregate.locations().len();
    assert_eq!(grid.rows.len(), locations * Category::PANEL.len() * periods.len());
}

#[test]
fn test_totalize_twice_is_totalize_once() {
    let mut rng = StdRng::seed_from_u64(11);
    let inclusion = random_inclusion(&mut rng);
    let extractor = ChunkExtractor::new(&inclusion, 1900);
    let flows = extractor.extract_chunk(&random_records(&mut rng, 300)).flows;

    let once = totalize(flows);
    assert_eq!(totalize(once.clone()), once);
}

#[test]
fn test_stock_of_total_equals_sum_of_semantic_stocks() {
    let mut rng = StdRng::seed_from_u64(5);
    let inclusion = random_inclusion(&mut rng);
    let extractor = ChunkExtractor::new(&inclusion, 1900);
    let periods = PeriodRange::new(2014, 2025);

    let aggregate = totalize(extractor.extract_chunk(&random_records(&mut rng, 300)).flows);
    let mut grid = balance(&aggregate, periods, false);
    reconcile_stock(&mut grid.rows, &grid.opening);

    for location in aggregate.locations() {
        for period in periods.years() {
            let at = |category: Category| {
                grid.rows
                    .iter()
                    .find(|r| r.location == location && r.category == category && r.period == period)
                    .map(|r| r.stock)
                    .unwrap()
            };
            let semantic: i64 = Category::SEMANTIC.into_iter().map(at).sum();
            assert_eq!(at(Category::Total), semantic, "{location} {period}");
        }
    }
}
