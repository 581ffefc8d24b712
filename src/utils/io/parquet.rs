//! Parquet artifacts
//!
//! The balanced panel is written as a single Snappy-compressed Parquet file.
//! The consolidated aggregate can be stored the same way and loaded again as
//! the input of a balance-only run.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use arrow::array::{
    Array, ArrayRef, BooleanArray, Float64Array, Int32Array, Int64Array, StringArray, UInt64Array,
};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::error::util::{ensure_parent_dir, safe_open_file};
use crate::error::{PanelError, Result};
use crate::models::{BalancedPanel, BalancedPanelRow, Category, FlowAggregate, FlowCounts, FlowKey};
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Default number of rows per record batch
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// Helper function to get batch size from environment
#[must_use]
pub fn get_batch_size() -> Option<usize> {
    std::env::var("PARQUET_BATCH_SIZE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
}

fn batch_size() -> usize {
    get_batch_size().unwrap_or(DEFAULT_BATCH_SIZE)
}

/// Schema of the balanced panel artifact
#[must_use]
pub fn panel_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("location", DataType::Utf8, false),
        Field::new("category", DataType::Utf8, false),
        Field::new("period", DataType::Int32, false),
        Field::new("entries", DataType::UInt64, false),
        Field::new("exits", DataType::UInt64, false),
        Field::new("stock", DataType::Int64, false),
        Field::new("log_stock", DataType::Float64, false),
        Field::new("location_name", DataType::Utf8, true),
        Field::new("observed", DataType::Boolean, false),
    ]))
}

/// Schema of the consolidated aggregate artifact
#[must_use]
pub fn aggregate_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("location", DataType::Utf8, false),
        Field::new("category", DataType::Utf8, false),
        Field::new("period", DataType::Int32, false),
        Field::new("entries", DataType::UInt64, false),
        Field::new("exits", DataType::UInt64, false),
    ]))
}

fn writer_properties() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build()
}

/// Write record batches to a new Parquet file
fn write_batches<I>(path: &Path, schema: SchemaRef, batches: I) -> Result<()>
where
    I: IntoIterator<Item = Result<RecordBatch>>,
{
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(|e| {
        PanelError::path_error_with_source(path, "Failed to create output file", e)
    })?;

    let mut writer = ArrowWriter::try_new(file, schema, Some(writer_properties()))?;
    for batch in batches {
        writer.write(&batch?)?;
    }
    writer.close()?;
    Ok(())
}

/// Read every record batch of a Parquet file
fn read_batches(path: &Path, purpose: &str) -> Result<Vec<RecordBatch>> {
    let file = safe_open_file(path, purpose)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
        .with_batch_size(batch_size())
        .build()?;
    Ok(reader.collect::<std::result::Result<Vec<_>, _>>()?)
}

/// Look up a column by name and downcast it
fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|col| col.as_any().downcast_ref::<T>())
        .ok_or_else(|| {
            PanelError::schema(format!("Column '{name}' is missing or has an unexpected type"))
        })
}

fn panel_batch(schema: &SchemaRef, rows: &[BalancedPanelRow]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.location.as_str()))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.category.label()))),
        Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.period))),
        Arc::new(UInt64Array::from_iter_values(rows.iter().map(|r| r.entries))),
        Arc::new(UInt64Array::from_iter_values(rows.iter().map(|r| r.exits))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.stock))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.log_stock))),
        Arc::new(rows.iter().map(|r| r.location_name.as_deref()).collect::<StringArray>()),
        Arc::new(rows.iter().map(|r| Some(r.observed)).collect::<BooleanArray>()),
    ];
    Ok(RecordBatch::try_new(Arc::clone(schema), columns)?)
}

/// Store the balanced panel as Parquet
pub fn write_panel_parquet(panel: &BalancedPanel, path: &Path) -> Result<()> {
    let start = Instant::now();
    log_operation_start("Writing balanced panel to", path);

    let schema = panel_schema();
    let batches = panel
        .rows
        .chunks(batch_size())
        .map(|rows| panel_batch(&schema, rows));
    write_batches(path, Arc::clone(&schema), batches)?;

    log_operation_complete("wrote", path, panel.len(), "rows", Some(start.elapsed()));
    Ok(())
}

/// Load balanced panel rows stored by [`write_panel_parquet`]
pub fn read_panel_parquet(path: &Path) -> Result<Vec<BalancedPanelRow>> {
    let start = Instant::now();
    log_operation_start("Reading balanced panel from", path);

    let mut rows = Vec::new();
    for batch in read_batches(path, "balanced panel")? {
        let location = column::<StringArray>(&batch, "location")?;
        let category = column::<StringArray>(&batch, "category")?;
        let period = column::<Int32Array>(&batch, "period")?;
        let entries = column::<UInt64Array>(&batch, "entries")?;
        let exits = column::<UInt64Array>(&batch, "exits")?;
        let stock = column::<Int64Array>(&batch, "stock")?;
        let log_stock = column::<Float64Array>(&batch, "log_stock")?;
        let location_name = column::<StringArray>(&batch, "location_name")?;
        let observed = column::<BooleanArray>(&batch, "observed")?;

        rows.reserve(batch.num_rows());
        for i in 0..batch.num_rows() {
            rows.push(BalancedPanelRow {
                location: location.value(i).to_string(),
                location_name: (!location_name.is_null(i))
                    .then(|| location_name.value(i).to_string()),
                category: category.value(i).parse::<Category>()?,
                period: period.value(i),
                entries: entries.value(i),
                exits: exits.value(i),
                stock: stock.value(i),
                log_stock: log_stock.value(i),
                observed: observed.value(i),
            });
        }
    }

    log_operation_complete("read", path, rows.len(), "rows", Some(start.elapsed()));
    Ok(rows)
}

fn aggregate_batch(schema: &SchemaRef, cells: &[(&FlowKey, FlowCounts)]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(cells.iter().map(|(k, _)| k.location.as_str()))),
        Arc::new(StringArray::from_iter_values(cells.iter().map(|(k, _)| k.category.label()))),
        Arc::new(Int32Array::from_iter_values(cells.iter().map(|(k, _)| k.period))),
        Arc::new(UInt64Array::from_iter_values(cells.iter().map(|(_, c)| c.entries))),
        Arc::new(UInt64Array::from_iter_values(cells.iter().map(|(_, c)| c.exits))),
    ];
    Ok(RecordBatch::try_new(Arc::clone(schema), columns)?)
}

/// Store a consolidated aggregate as Parquet, cells in key order
pub fn write_aggregate_parquet(aggregate: &FlowAggregate, path: &Path) -> Result<()> {
    let start = Instant::now();
    log_operation_start("Writing consolidated aggregate to", path);

    let schema = aggregate_schema();
    let cells = aggregate.sorted();
    let batches = cells
        .chunks(batch_size())
        .map(|cells| aggregate_batch(&schema, cells));
    write_batches(path, Arc::clone(&schema), batches)?;

    log_operation_complete("wrote", path, cells.len(), "cells", Some(start.elapsed()));
    Ok(())
}

/// Load an aggregate stored by [`write_aggregate_parquet`]
///
/// Rows repeating a key are summed.
pub fn read_aggregate_parquet(path: &Path) -> Result<FlowAggregate> {
    let start = Instant::now();
    log_operation_start("Reading consolidated aggregate from", path);

    let mut aggregate = FlowAggregate::new();
    for batch in read_batches(path, "consolidated aggregate")? {
        let location = column::<StringArray>(&batch, "location")?;
        let category = column::<StringArray>(&batch, "category")?;
        let period = column::<Int32Array>(&batch, "period")?;
        let entries = column::<UInt64Array>(&batch, "entries")?;
        let exits = column::<UInt64Array>(&batch, "exits")?;

        for i in 0..batch.num_rows() {
            aggregate.add(
                FlowKey::new(location.value(i), category.value(i).parse()?, period.value(i)),
                FlowCounts::new(entries.value(i), exits.value(i)),
            );
        }
    }

    log_operation_complete("read", path, aggregate.len(), "cells", Some(start.elapsed()));
    Ok(aggregate)
}
