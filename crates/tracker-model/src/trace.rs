use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// A remote call made by the reconciliation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    AttributeType,
    DataElementType,
    CreateEntity,
    FindEntity,
    UpdateEntity,
    Enroll,
    ListEvents,
    AddEvent,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AttributeType => "get attribute type",
            Self::DataElementType => "get data element type",
            Self::CreateEntity => "create tracked entity",
            Self::FindEntity => "find tracked entity",
            Self::UpdateEntity => "update tracked entity",
            Self::Enroll => "enroll in program",
            Self::ListEvents => "list events",
            Self::AddEvent => "add event",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What was sent for one remote call, captured for observability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestTrace {
    pub method: String,
    /// Path and query, relative to the server root.
    pub path: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub timestamp: DateTime<Utc>,
}
