//! Split a CSV file into single-row files.
//!
//! Each output file holds the header line and one data row, so every row can
//! be replayed, and moved to done/failed, on its own.

use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::{debug, info};

use crate::error::{IngestError, Result};

#[derive(Debug, Clone)]
pub struct SplitSummary {
    pub output_dir: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Default output directory: a sibling of the input named after its stem.
pub fn default_split_dir(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    input
        .parent()
        .map_or_else(|| PathBuf::from(&stem), |parent| parent.join(&stem))
}

/// Split `input` into `output_dir`, naming outputs `<input file name><index>`.
///
/// The output directory must not exist yet.
pub fn split_csv(input: &Path, output_dir: &Path) -> Result<SplitSummary> {
    if output_dir.exists() {
        return Err(IngestError::OutputExists {
            path: output_dir.to_path_buf(),
        });
    }
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(input)
        .map_err(|source| IngestError::csv(input, source))?;
    let mut records = reader.records();
    let headers: StringRecord = match records.next() {
        Some(record) => record.map_err(|source| IngestError::csv(input, source))?,
        None => {
            return Err(IngestError::MissingHeader {
                path: input.to_path_buf(),
            });
        }
    };

    std::fs::create_dir_all(output_dir).map_err(|source| IngestError::CreateDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let file_name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut files = Vec::new();
    for (index, record) in records.enumerate() {
        let record = record.map_err(|source| IngestError::csv(input, source))?;
        let path = output_dir.join(format!("{file_name}{index}"));
        write_single_row(&path, &headers, &record)?;
        debug!(path = %path.display(), "wrote split file");
        files.push(path);
    }
    info!(
        input = %input.display(),
        output_dir = %output_dir.display(),
        file_count = files.len(),
        "split complete"
    );
    Ok(SplitSummary {
        output_dir: output_dir.to_path_buf(),
        files,
    })
}

fn write_single_row(path: &Path, headers: &StringRecord, record: &StringRecord) -> Result<()> {
    let write_error = |source| IngestError::CsvWrite {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(write_error)?;
    writer.write_record(headers).map_err(write_error)?;
    writer.write_record(record).map_err(write_error)?;
    writer
        .flush()
        .map_err(|source| write_error(csv::Error::from(source)))?;
    Ok(())
}
