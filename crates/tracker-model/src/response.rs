//! Views over tracker API response bodies.
//!
//! The remote API has shipped several response shapes over time. These types
//! read only the fields the pipeline needs and tolerate the rest.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::ids::EntityReference;

pub const STATUS_SUCCESS: &str = "SUCCESS";

const NON_UNIQUE_MARKER: &str = "non-unique";

/// Response of `GET trackedEntityAttributes/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeMetadata {
    #[serde(default)]
    pub value_type: Option<String>,
    #[serde(default)]
    pub unique: Option<bool>,
}

impl AttributeMetadata {
    pub fn is_unique(&self) -> bool {
        self.unique == Some(true)
    }
}

/// Response of `GET dataElements/{id}`. The type is read from `type`, or
/// `valueType` when `type` is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataElementMetadata {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub value_type: Option<String>,
}

impl DataElementMetadata {
    pub fn declared_type(&self) -> Option<&str> {
        self.kind.as_deref().or(self.value_type.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Conflict {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
}

impl Conflict {
    /// Whether the remote rejected the value because it already exists on
    /// another entity.
    pub fn is_non_unique(&self) -> bool {
        self.value.to_lowercase().contains(NON_UNIQUE_MARKER)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImportSummary {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub conflicts: Vec<Conflict>,
}

impl ImportSummary {
    /// Locate the import summary in a response body.
    ///
    /// Looks, in order, at the first element of `importSummaries`, at a
    /// nested `response` object, and finally at the body itself when it
    /// carries a `status`.
    pub fn from_body(body: &Value) -> Option<Self> {
        if let Some(first) = body
            .get("importSummaries")
            .and_then(Value::as_array)
            .and_then(|summaries| summaries.first())
        {
            return Self::deserialize(first).ok();
        }
        if let Some(nested) = body.get("response").filter(|value| value.is_object()) {
            return Self::from_body(nested);
        }
        if body.get("status").is_some() {
            return Self::deserialize(body).ok();
        }
        None
    }

    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some(STATUS_SUCCESS)
    }

    /// True when there is at least one conflict and every conflict is a
    /// non-unique violation.
    pub fn all_conflicts_non_unique(&self) -> bool {
        !self.conflicts.is_empty() && self.conflicts.iter().all(Conflict::is_non_unique)
    }

    pub fn reference(&self) -> Option<EntityReference> {
        self.reference
            .as_deref()
            .and_then(|value| EntityReference::new(value).ok())
    }

    pub fn conflict_messages(&self) -> Vec<String> {
        self.conflicts
            .iter()
            .map(|conflict| match &conflict.object {
                Some(object) => format!("{object}: {}", conflict.value),
                None => conflict.value.clone(),
            })
            .collect()
    }
}

/// First entity reference in a tracked entity instance query response.
///
/// Reads `trackedEntityInstances[0].trackedEntityInstance`, or the legacy
/// grid shape `rows[0][0]`.
pub fn first_entity_reference(body: &Value) -> Option<EntityReference> {
    let from_list = body
        .get("trackedEntityInstances")
        .and_then(Value::as_array)
        .and_then(|instances| instances.first())
        .and_then(|instance| instance.get("trackedEntityInstance"))
        .and_then(Value::as_str);
    let from_grid = || {
        body.get("rows")
            .and_then(Value::as_array)
            .and_then(|rows| rows.first())
            .and_then(Value::as_array)
            .and_then(|row| row.first())
            .and_then(Value::as_str)
    };
    from_list
        .or_else(from_grid)
        .and_then(|value| EntityReference::new(value).ok())
}

/// Response of `GET events`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EventList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub events: Vec<EventRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data_values: Vec<RecordedDataValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedDataValue {
    pub data_element: String,
    #[serde(default)]
    pub value: Value,
}

impl RecordedDataValue {
    /// The recorded value as text; numbers and booleans are rendered, `null`
    /// becomes empty.
    pub fn value_text(&self) -> String {
        match &self.value {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
