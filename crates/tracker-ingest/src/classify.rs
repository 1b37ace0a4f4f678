//! Column classification.
//!
//! Column names follow a prefix convention:
//!
//! - `orgUnit`, `eventDate`, ... (no delimiter): a known parameter
//! - `A|<attributeID>`: a tracked entity attribute
//! - `DE|<dataElementID>`: a data element
//!
//! Columns with any other prefix are not part of the convention and are dropped.

use tracing::warn;

use tracker_model::{AttributeId, ClassifiedRow, DataElementId};

pub const COLUMN_DELIMITER: char = '|';
pub const ATTRIBUTE_TAG: &str = "A";
pub const DATA_ELEMENT_TAG: &str = "DE";
/// Cell text that stands for an empty value.
pub const NULL_MARKER: &str = "NULL";

/// Which group a column belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind<'a> {
    Parameter(&'a str),
    Attribute(&'a str),
    DataElement(&'a str),
    Unrecognized,
}

pub fn column_kind(column: &str) -> ColumnKind<'_> {
    let mut parts = column.split(COLUMN_DELIMITER);
    let tag = parts.next().unwrap_or_default();
    // Segments after the identifier are ignored.
    match (tag, parts.next()) {
        (_, None) => ColumnKind::Parameter(column),
        (ATTRIBUTE_TAG, Some(key)) => ColumnKind::Attribute(key),
        (DATA_ELEMENT_TAG, Some(key)) => ColumnKind::DataElement(key),
        _ => ColumnKind::Unrecognized,
    }
}

pub fn normalize_value(value: &str) -> &str {
    if value == NULL_MARKER { "" } else { value }
}

/// Split a flat row of column/value pairs into parameters, attributes, and
/// data elements.
pub fn classify_row<I, K, V>(columns: I) -> ClassifiedRow
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut row = ClassifiedRow::default();
    for (column, value) in columns {
        let column = column.as_ref();
        let value = normalize_value(value.as_ref()).to_string();
        match column_kind(column) {
            ColumnKind::Parameter(key) => {
                row.parameters.insert(key.to_string(), value);
            }
            ColumnKind::Attribute(key) => match AttributeId::new(key) {
                Ok(id) => {
                    row.attributes.insert(id, value);
                }
                Err(error) => warn!(column, %error, "skipping column"),
            },
            ColumnKind::DataElement(key) => match DataElementId::new(key) {
                Ok(id) => {
                    row.data_elements.insert(id, value);
                }
                Err(error) => warn!(column, %error, "skipping column"),
            },
            ColumnKind::Unrecognized => warn!(column, "skipping column with unknown prefix"),
        }
    }
    row
}
