use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecordsIntoIter};

use crate::error::{IngestError, Result};

/// One data row, paired with the header it was read under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line of the record in its source file.
    pub line: u64,
    pub columns: Vec<(String, String)>,
}

fn normalize_header(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').trim().to_string()
}

/// Reads a header-first CSV file one row at a time.
///
/// Rows are yielded lazily so a file is never held in memory. A record whose
/// field count differs from the header is an error; blank records are
/// skipped. An empty file yields no rows.
pub struct CsvRowReader {
    path: PathBuf,
    headers: Vec<String>,
    records: StringRecordsIntoIter<File>,
}

impl CsvRowReader {
    pub fn open(path: &Path) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_path(path)
            .map_err(|source| IngestError::csv(path, source))?;
        let headers: Vec<String> = reader
            .headers()
            .map_err(|source| IngestError::csv(path, source))?
            .iter()
            .map(normalize_header)
            .collect();
        Ok(Self {
            path: path.to_path_buf(),
            headers,
            records: reader.into_records(),
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for CsvRowReader {
    type Item = Result<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(source) => return Some(Err(IngestError::csv(&self.path, source))),
            };
            if record.iter().all(|value| value.trim().is_empty()) {
                continue;
            }
            let line = record.position().map_or(0, csv::Position::line);
            let columns = self
                .headers
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_string))
                .collect();
            return Some(Ok(RawRow { line, columns }));
        }
    }
}

/// Read every row of a CSV file.
pub fn read_csv_rows(path: &Path) -> Result<Vec<RawRow>> {
    CsvRowReader::open(path)?.collect()
}
