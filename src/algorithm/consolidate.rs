//! File-level and dataset-level consolidation
//!
//! A source file is read chunk by chunk and its chunk aggregates are folded
//! into one file aggregate. Files are extracted on the rayon pool, one task
//! per file, and their aggregates reduced with the same merge law. A file that
//! cannot be read is skipped and recorded; it never aborts the run.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

use super::extract::{ChunkExtractor, PartialAggregate};
use super::merge::Merge;
use super::statistics::ExtractionStats;
use crate::config::PanelConfig;
use crate::error::{PanelError, Result};
use crate::inclusion::InclusionSet;
use crate::models::RawRecord;
use crate::utils::io::delimited::{RecordChunks, SourceColumns, delimited_reader};
use crate::utils::logging::{
    create_main_progress_bar, finish_progress_bar, log_operation_complete, log_operation_start,
    log_skipped_source,
};

/// Fold chunk aggregates into one aggregate
///
/// Each chunk is dropped as soon as it has been reduced, so at most one chunk
/// of raw records is alive at a time.
pub fn aggregate_chunks<I>(chunks: I, extractor: &ChunkExtractor<'_>) -> Result<PartialAggregate>
where
    I: IntoIterator<Item = Result<Vec<RawRecord>>>,
{
    chunks
        .into_iter()
        .try_fold(PartialAggregate::default(), |acc, chunk| {
            let partial = extractor.extract_chunk(&chunk?);
            log::debug!(
                "Chunk reduced: {} rows, {} matched, {} cells",
                partial.stats.rows_read,
                partial.stats.rows_matched,
                partial.flows.len()
            );
            Ok(acc.merge(partial))
        })
}

/// Extract a delimited source from any reader
pub fn extract_reader<R: Read>(
    reader: R,
    config: &PanelConfig,
    inclusion: &InclusionSet,
) -> Result<PartialAggregate> {
    let reader = delimited_reader(reader, config.sources.delimiter, config.sources.has_headers);
    let chunks = RecordChunks::new(reader, SourceColumns::from(&config.sources), config.chunk_size);
    let extractor = ChunkExtractor::new(inclusion, config.min_plausible_year);
    aggregate_chunks(chunks, &extractor)
}

/// Extract one source file into a file-level aggregate
pub fn extract_file(
    path: &Path,
    config: &PanelConfig,
    inclusion: &InclusionSet,
) -> Result<PartialAggregate> {
    let start = Instant::now();
    log_operation_start("Extracting flows from", path);

    let chunks = RecordChunks::open(path, &config.sources, config.chunk_size)?;
    let extractor = ChunkExtractor::new(inclusion, config.min_plausible_year);
    let mut partial = aggregate_chunks(chunks, &extractor)?;
    partial.stats.files_processed = 1;

    log_operation_complete(
        "aggregated",
        path,
        usize::try_from(partial.stats.rows_read).unwrap_or(usize::MAX),
        "rows",
        Some(start.elapsed()),
    );
    Ok(partial)
}

/// Extract a file, turning any failure into a skipped-source record
fn extract_or_skip(path: &Path, config: &PanelConfig, inclusion: &InclusionSet) -> PartialAggregate {
    match extract_file(path, config, inclusion) {
        Ok(partial) => partial,
        Err(e) => {
            log_skipped_source(path, Some(&e));
            PartialAggregate {
                stats: ExtractionStats::skipped(path.to_path_buf()),
                ..Default::default()
            }
        }
    }
}

/// Extract and consolidate every configured source
///
/// Missing sources are skipped with a warning. If none of the configured
/// sources exists the run cannot proceed.
pub fn consolidate_sources(config: &PanelConfig, inclusion: &InclusionSet) -> Result<PartialAggregate> {
    let paths = &config.sources.paths;
    let (present, missing): (Vec<&PathBuf>, Vec<&PathBuf>) =
        paths.iter().partition(|p| p.is_file());

    for path in &missing {
        log_skipped_source(path, None);
    }
    if present.is_empty() {
        return Err(PanelError::NoEligibleSources(paths.len()));
    }

    let skipped = missing.iter().map(|p| PartialAggregate {
        stats: ExtractionStats::skipped((*p).clone()),
        ..Default::default()
    });

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_threads())
        .build()
        .map_err(|e| PanelError::config(format!("Failed to build extraction pool: {e}")))?;

    let progress = create_main_progress_bar(present.len() as u64, Some("Extracting sources"));
    let extracted = pool.install(|| {
        present
            .par_iter()
            .progress_with(progress.clone())
            .map(|path| extract_or_skip(path, config, inclusion))
            .reduce(PartialAggregate::default, PartialAggregate::merge)
    });
    finish_progress_bar(&progress, Some("Extraction complete"));

    Ok(skipped.fold(extracted, PartialAggregate::merge))
}
