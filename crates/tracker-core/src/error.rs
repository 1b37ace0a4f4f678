use std::fmt;

use thiserror::Error;

use tracker_client::ClientError;
use tracker_model::{AttributeId, DataElementId, Operation};

/// A field type requested before it was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeCacheError {
    #[error("type of attribute {0} has not been resolved")]
    AttributeNotResolved(AttributeId),
    #[error("type of data element {0} has not been resolved")]
    DataElementNotResolved(DataElementId),
}

/// Why the duplicate check rejected a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateReason {
    /// An event exists on or after `start_date`.
    WithinThreshold { days: u32, start_date: String },
    /// An existing event already records `value` for `data_element`.
    UniqueDataElement {
        data_element: DataElementId,
        value: String,
    },
}

impl fmt::Display for DuplicateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WithinThreshold { days, start_date } => write!(
                f,
                "an event already exists within {days} day(s) (since {start_date})"
            ),
            Self::UniqueDataElement {
                data_element,
                value,
            } => write!(
                f,
                "an event already records value {value:?} for data element {data_element}"
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("{operation} failed: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: ClientError,
    },

    #[error("{operation}: unexpected status code {status}")]
    UnexpectedStatus { operation: Operation, status: u16 },

    #[error("{operation}: malformed response ({detail})")]
    MalformedResponse {
        operation: Operation,
        detail: String,
    },

    #[error("tracked entity conflict cannot be resolved: {}", .conflicts.join("; "))]
    UnresolvableConflict { conflicts: Vec<String> },

    #[error("no unique attribute found to resolve the tracked entity conflict")]
    NoUniqueAttribute,

    #[error("row has no value for unique attribute {attribute}")]
    MissingUniqueValue { attribute: AttributeId },

    #[error("failed to look up existing tracked entity instance by attribute {attribute}")]
    LookupEmpty { attribute: AttributeId },

    #[error("{operation} rejected with status {status}")]
    Rejected {
        operation: Operation,
        status: String,
        conflicts: Vec<String>,
    },

    #[error("invalid event date {value:?}, expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("duplicate event: {0}")]
    DuplicateEvent(DuplicateReason),

    #[error(transparent)]
    TypeLookup(#[from] TypeCacheError),
}

impl ReconcileError {
    pub(crate) fn transport(operation: Operation) -> impl FnOnce(ClientError) -> Self {
        move |source| Self::Transport { operation, source }
    }

    pub(crate) fn malformed(operation: Operation, detail: impl Into<String>) -> Self {
        Self::MalformedResponse {
            operation,
            detail: detail.into(),
        }
    }
}

/// Pipeline states of a row, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RowStage {
    Start,
    TypesResolved,
    EntityResolved,
    Enrolled,
    DuplicateChecked,
    EventRecorded,
}

impl RowStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::TypesResolved => "types resolved",
            Self::EntityResolved => "entity resolved",
            Self::Enrolled => "enrolled",
            Self::DuplicateChecked => "duplicate checked",
            Self::EventRecorded => "event recorded",
        }
    }
}

impl fmt::Display for RowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed row: the error and the last stage the row completed.
#[derive(Debug, Error)]
#[error("{error} (last completed stage: {stage})")]
pub struct RowFailure {
    pub stage: RowStage,
    #[source]
    pub error: ReconcileError,
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
