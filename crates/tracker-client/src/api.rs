//! The remote calls the reconciliation pipeline depends on.

use serde_json::Value;

use tracker_model::{
    AttributeId, DataElementId, EnrollmentPayload, EntityPayload, EntityReference, EventPayload,
    ProgramId, RequestTrace, StageId,
};

use crate::error::ClientError;

/// A completed HTTP exchange. Status interpretation is left to the caller.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    /// Parsed JSON body; `None` when the body was empty or not JSON.
    pub body: Option<Value>,
    pub trace: RequestTrace,
}

/// Parameters of the threshold duplicate query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub program: ProgramId,
    pub program_stage: StageId,
    pub tracked_entity_instance: EntityReference,
    pub org_unit: Option<String>,
    /// Inclusive lower bound, `YYYY-MM-DD`.
    pub start_date: String,
}

/// Tracker API surface, relative to the configured API root.
///
/// Implementations only fail for transport-level problems; every HTTP status
/// is returned as an [`ApiResponse`].
pub trait TrackerApi {
    /// `GET trackedEntityAttributes/{id}`
    fn attribute_metadata(&self, id: &AttributeId) -> Result<ApiResponse, ClientError>;

    /// `GET dataElements/{id}`
    fn data_element_metadata(&self, id: &DataElementId) -> Result<ApiResponse, ClientError>;

    /// `POST trackedEntityInstances`
    fn create_entity(&self, payload: &EntityPayload) -> Result<ApiResponse, ClientError>;

    /// `GET trackedEntityInstances?ou={org_unit}&filter={attribute}:EQ:{value}`
    fn find_entities(
        &self,
        org_unit: Option<&str>,
        attribute: &AttributeId,
        value: &str,
    ) -> Result<ApiResponse, ClientError>;

    /// `PUT trackedEntityInstances/{id}`
    fn update_entity(
        &self,
        entity: &EntityReference,
        payload: &EntityPayload,
    ) -> Result<ApiResponse, ClientError>;

    /// `POST enrollments`
    fn enroll(&self, payload: &EnrollmentPayload) -> Result<ApiResponse, ClientError>;

    /// `GET events?...&pageSize=1&page=1`
    fn list_events(&self, query: &EventQuery) -> Result<ApiResponse, ClientError>;

    /// `GET events?trackedEntityInstance={id}&paging=false`, data values only.
    fn list_entity_events(&self, entity: &EntityReference) -> Result<ApiResponse, ClientError>;

    /// `POST events`
    fn add_event(&self, payload: &EventPayload) -> Result<ApiResponse, ClientError>;
}

impl<T: TrackerApi + ?Sized> TrackerApi for &T {
    fn attribute_metadata(&self, id: &AttributeId) -> Result<ApiResponse, ClientError> {
        (**self).attribute_metadata(id)
    }

    fn data_element_metadata(&self, id: &DataElementId) -> Result<ApiResponse, ClientError> {
        (**self).data_element_metadata(id)
    }

    fn create_entity(&self, payload: &EntityPayload) -> Result<ApiResponse, ClientError> {
        (**self).create_entity(payload)
    }

    fn find_entities(
        &self,
        org_unit: Option<&str>,
        attribute: &AttributeId,
        value: &str,
    ) -> Result<ApiResponse, ClientError> {
        (**self).find_entities(org_unit, attribute, value)
    }

    fn update_entity(
        &self,
        entity: &EntityReference,
        payload: &EntityPayload,
    ) -> Result<ApiResponse, ClientError> {
        (**self).update_entity(entity, payload)
    }

    fn enroll(&self, payload: &EnrollmentPayload) -> Result<ApiResponse, ClientError> {
        (**self).enroll(payload)
    }

    fn list_events(&self, query: &EventQuery) -> Result<ApiResponse, ClientError> {
        (**self).list_events(query)
    }

    fn list_entity_events(&self, entity: &EntityReference) -> Result<ApiResponse, ClientError> {
        (**self).list_entity_events(entity)
    }

    fn add_event(&self, payload: &EventPayload) -> Result<ApiResponse, ClientError> {
        (**self).add_event(payload)
    }
}
