//! Request bodies sent to the tracker API.

use serde::Serialize;

use crate::ids::{
    AttributeId, DataElementId, EntityReference, ProgramId, StageId, TrackedEntityId,
};
use crate::value::CoercedValue;

/// Fixed `storedBy` value written on every event.
pub const STORED_BY: &str = "admin";

/// Body of both the create (`POST`) and update (`PUT`) entity calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityPayload {
    pub tracked_entity: TrackedEntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_unit: Option<String>,
    pub attributes: Vec<AttributeValue>,
}

impl EntityPayload {
    pub fn attribute(&self, id: &AttributeId) -> Option<&CoercedValue> {
        self.attributes
            .iter()
            .find(|attribute| &attribute.attribute == id)
            .map(|attribute| &attribute.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeValue {
    pub attribute: AttributeId,
    pub value: CoercedValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentPayload {
    pub program: ProgramId,
    pub tracked_entity_instance: EntityReference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_enrollment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_incident: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub program: ProgramId,
    pub program_stage: StageId,
    pub tracked_entity_instance: EntityReference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_unit: Option<String>,
    pub stored_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_date: Option<String>,
    pub data_values: Vec<DataValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataValue {
    pub data_element: DataElementId,
    pub value: CoercedValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn event_payload_omits_absent_optionals() {
        let payload = EventPayload {
            program: ProgramId::new("P1").unwrap(),
            program_stage: StageId::new("S1").unwrap(),
            tracked_entity_instance: EntityReference::new("TEI1").unwrap(),
            org_unit: Some("OU1".into()),
            stored_by: STORED_BY.into(),
            event_date: Some("1970-01-02".into()),
            data_values: vec![DataValue {
                data_element: DataElementId::new("de1").unwrap(),
                value: CoercedValue::Integer(3),
            }],
            coordinate: None,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "program": "P1",
                "programStage": "S1",
                "trackedEntityInstance": "TEI1",
                "orgUnit": "OU1",
                "storedBy": "admin",
                "eventDate": "1970-01-02",
                "dataValues": [{"dataElement": "de1", "value": 3}]
            })
        );
    }

    #[test]
    fn event_payload_carries_coordinate() {
        let payload = EventPayload {
            program: ProgramId::new("P1").unwrap(),
            program_stage: StageId::new("S1").unwrap(),
            tracked_entity_instance: EntityReference::new("TEI1").unwrap(),
            org_unit: None,
            stored_by: STORED_BY.into(),
            event_date: None,
            data_values: Vec::new(),
            coordinate: Some(Coordinate {
                latitude: 1.5,
                longitude: 2.0,
            }),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["coordinate"], json!({"latitude": 1.5, "longitude": 2.0}));
        assert!(value.get("orgUnit").is_none());
    }
}
