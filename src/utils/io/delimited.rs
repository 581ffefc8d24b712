//! Delimited text sources
//!
//! Source extracts are headerless, Latin-1 encoded, delimited files with
//! positional columns. Rows are decoded from raw bytes and handed out in
//! bounded chunks so that peak memory depends on the chunk size only.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ByteRecord, Reader, ReaderBuilder};

use crate::config::SourceConfig;
use crate::error::Result;
use crate::error::util::safe_open_file;
use crate::models::RawRecord;
use crate::models::record::{normalize_entity_id, normalize_location_code};

/// Build a delimited reader over any byte source
pub fn delimited_reader<R: Read>(reader: R, delimiter: char, has_headers: bool) -> Reader<R> {
    ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(has_headers)
        .flexible(true)
        .from_reader(reader)
}

/// Open a delimited file with rich error information
pub fn open_delimited(
    path: &Path,
    delimiter: char,
    has_headers: bool,
    purpose: &str,
) -> Result<Reader<File>> {
    let file = safe_open_file(path, purpose)?;
    Ok(delimited_reader(file, delimiter, has_headers))
}

/// Decode a Latin-1 field; every byte maps to the code point of equal value
#[must_use]
pub fn latin1_field(record: &ByteRecord, index: usize) -> Option<String> {
    record
        .get(index)
        .map(|bytes| bytes.iter().map(|&b| char::from(b)).collect())
}

/// Decode a field, trimming it and treating blanks as missing
#[must_use]
pub fn non_empty_field(record: &ByteRecord, index: usize) -> Option<String> {
    latin1_field(record, index)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Column positions of a source extract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceColumns {
    pub entity: usize,
    pub category: usize,
    pub location: usize,
    pub name: Option<usize>,
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl From<&SourceConfig> for SourceColumns {
    fn from(config: &SourceConfig) -> Self {
        Self {
            entity: config.entity_column,
            category: config.category_column,
            location: config.location_column,
            name: config.name_column,
            start: config.start_column,
            end: config.end_column,
        }
    }
}

impl SourceColumns {
    /// Decode one row; short rows yield empty fields rather than errors
    #[must_use]
    pub fn decode(&self, record: &ByteRecord) -> RawRecord {
        let text = |index: usize| latin1_field(record, index).unwrap_or_default();
        RawRecord {
            entity_id: normalize_entity_id(&text(self.entity)),
            category_code: text(self.category).trim().to_string(),
            location: normalize_location_code(&text(self.location)),
            location_name: self.name.and_then(|i| non_empty_field(record, i)),
            start_marker: self.start.and_then(|i| non_empty_field(record, i)),
            end_marker: self.end.and_then(|i| non_empty_field(record, i)),
        }
    }
}

/// Iterator over bounded chunks of decoded rows
pub struct RecordChunks<R: Read> {
    reader: Reader<R>,
    columns: SourceColumns,
    chunk_size: usize,
    record: ByteRecord,
    finished: bool,
}

impl<R: Read> RecordChunks<R> {
    pub fn new(reader: Reader<R>, columns: SourceColumns, chunk_size: usize) -> Self {
        Self {
            reader,
            columns,
            chunk_size: chunk_size.max(1),
            record: ByteRecord::new(),
            finished: false,
        }
    }
}

impl RecordChunks<File> {
    /// Open a source extract for chunked reading
    pub fn open(path: &Path, config: &SourceConfig, chunk_size: usize) -> Result<Self> {
        let reader = open_delimited(path, config.delimiter, config.has_headers, "flow extraction")?;
        Ok(Self::new(reader, SourceColumns::from(config), chunk_size))
    }
}

impl<R: Read> Iterator for RecordChunks<R> {
    type Item = Result<Vec<RawRecord>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut chunk = Vec::with_capacity(self.chunk_size.min(64 * 1024));
        while chunk.len() < self.chunk_size {
            match self.reader.read_byte_record(&mut self.record) {
                Ok(true) => chunk.push(self.columns.decode(&self.record)),
                Ok(false) => {
                    self.finished = true;
                    break;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
            }
        }

        if chunk.is_empty() { None } else { Some(Ok(chunk)) }
    }
}
