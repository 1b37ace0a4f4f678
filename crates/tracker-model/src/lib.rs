//! Shared data model for the tracker populator.

pub mod error;
pub mod ids;
pub mod payload;
pub mod response;
pub mod row;
pub mod trace;
pub mod value;

pub use error::{ModelError, Result};
pub use ids::{AttributeId, DataElementId, EntityReference, ProgramId, StageId, TrackedEntityId};
pub use payload::{
    AttributeValue, Coordinate, DataValue, EnrollmentPayload, EntityPayload, EventPayload,
    STORED_BY,
};
pub use response::{
    AttributeMetadata, Conflict, DataElementMetadata, EventList, EventRecord, ImportSummary,
    RecordedDataValue, STATUS_SUCCESS, first_entity_reference,
};
pub use row::ClassifiedRow;
pub use trace::{Operation, RequestTrace};
pub use value::{CoercedValue, ValueType, parse_int_prefix};
