//! Lifecycle notifications emitted while a row is reconciled.

use tracker_client::ApiResponse;
use tracker_model::{
    EnrollmentPayload, EntityPayload, EntityReference, EventPayload, Operation,
};

#[derive(Debug, Clone, Copy)]
pub enum PipelineEvent<'a> {
    /// Type resolution is starting for the row's fields.
    ResolvingTypes {
        attributes: usize,
        data_elements: usize,
    },
    AddingEntity {
        payload: &'a EntityPayload,
    },
    EntityAddResponse {
        response: &'a ApiResponse,
    },
    UpdatingEntity {
        entity: &'a EntityReference,
    },
    EntityUpdateResponse {
        response: &'a ApiResponse,
    },
    Enrolling {
        payload: &'a EnrollmentPayload,
    },
    EnrollmentResponse {
        response: &'a ApiResponse,
    },
    CheckingDuplicates {
        entity: &'a EntityReference,
    },
    AddingEvent {
        payload: &'a EventPayload,
    },
    EventAddResponse {
        response: &'a ApiResponse,
    },
}

impl PipelineEvent<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ResolvingTypes { .. } => "resolving types",
            Self::AddingEntity { .. } => "adding entity",
            Self::EntityAddResponse { .. } => "entity add response",
            Self::UpdatingEntity { .. } => "updating entity",
            Self::EntityUpdateResponse { .. } => "entity update response",
            Self::Enrolling { .. } => "enrolling",
            Self::EnrollmentResponse { .. } => "enrollment response",
            Self::CheckingDuplicates { .. } => "checking duplicates",
            Self::AddingEvent { .. } => "adding event",
            Self::EventAddResponse { .. } => "event add response",
        }
    }

    /// The remote response carried by this event, with the call it answers.
    pub fn response(&self) -> Option<(Operation, &ApiResponse)> {
        match *self {
            Self::EntityAddResponse { response } => Some((Operation::CreateEntity, response)),
            Self::EntityUpdateResponse { response } => Some((Operation::UpdateEntity, response)),
            Self::EnrollmentResponse { response } => Some((Operation::Enroll, response)),
            Self::EventAddResponse { response } => Some((Operation::AddEvent, response)),
            _ => None,
        }
    }
}

/// Receives [`PipelineEvent`]s in the order they happen.
pub trait PipelineObserver {
    fn observe(&mut self, event: &PipelineEvent<'_>);
}

/// Ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    fn observe(&mut self, _event: &PipelineEvent<'_>) {}
}

impl<O: PipelineObserver + ?Sized> PipelineObserver for &mut O {
    fn observe(&mut self, event: &PipelineEvent<'_>) {
        (**self).observe(event);
    }
}
