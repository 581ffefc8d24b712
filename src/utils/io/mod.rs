//! File I/O for source extracts and panel artifacts

pub mod delimited;
pub mod parquet;

pub use delimited::{RecordChunks, SourceColumns, delimited_reader, open_delimited};
pub use parquet::{
    aggregate_schema, panel_schema, read_aggregate_parquet, read_panel_parquet,
    write_aggregate_parquet, write_panel_parquet,
};
