pub mod classify;
pub mod csv_rows;
pub mod discovery;
pub mod error;
pub mod split;

pub use classify::{
    ATTRIBUTE_TAG, COLUMN_DELIMITER, ColumnKind, DATA_ELEMENT_TAG, NULL_MARKER, classify_row,
    column_kind,
};
pub use csv_rows::{CsvRowReader, RawRow, read_csv_rows};
pub use discovery::{FileIdentifiers, list_input_files};
pub use error::{IngestError, Result};
pub use split::{SplitSummary, default_split_dir, split_csv};
