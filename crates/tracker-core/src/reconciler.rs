//! The per-row reconciliation pipeline.
//!
//! A row moves through these stages strictly in order; the first failure
//! ends the row:
//!
//! 1. resolve attribute and data element types (memoized in the [`TypeCache`])
//! 2. create the tracked entity, or find and update it on a non-unique conflict
//! 3. enroll the entity in the program, when one is configured
//! 4. check for duplicate events, when a stage and a strategy are configured
//! 5. record the event, when a stage is configured
//!
//! Nothing is retried.

use serde::Deserialize;
use tracing::{debug, warn};

use tracker_client::TrackerApi;
use tracker_model::{
    AttributeMetadata, ClassifiedRow, DataElementMetadata, DataValue, EnrollmentPayload,
    EntityReference, EventPayload, ImportSummary, Operation, ProgramId, STORED_BY, StageId,
    ValueType,
};

use crate::error::{ReconcileError, Result, RowFailure, RowStage};
use crate::observer::{NoopObserver, PipelineEvent, PipelineObserver};
use crate::options::ReconcilerOptions;
use crate::type_cache::TypeCache;

/// How the row's tracked entity was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityResolution {
    Created(EntityReference),
    /// The entity already existed and was updated after a non-unique conflict.
    Updated(EntityReference),
}

impl EntityResolution {
    pub fn reference(&self) -> &EntityReference {
        match self {
            Self::Created(reference) | Self::Updated(reference) => reference,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentOutcome {
    /// No program configured.
    Skipped,
    Enrolled,
    /// The enrollment was not accepted (usually already enrolled); the row
    /// continues.
    Tolerated { status: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateCheck {
    Skipped,
    Clear,
    /// A duplicate was found and the event goes to this stage instead.
    Redirected(StageId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub stage: StageId,
    pub reference: Option<String>,
}

/// Result of a row that reached the end of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOutcome {
    /// Last stage completed: `EventRecorded` when an event was written.
    pub stage: RowStage,
    pub entity: EntityResolution,
    pub enrollment: EnrollmentOutcome,
    pub duplicate_check: DuplicateCheck,
    pub event: Option<RecordedEvent>,
}

/// Replays classified rows against a [`TrackerApi`].
///
/// Owns one [`TypeCache`]; build one reconciler per input file.
pub struct Reconciler<A, O = NoopObserver> {
    pub(crate) api: A,
    pub(crate) options: ReconcilerOptions,
    pub(crate) cache: TypeCache,
    observer: O,
}

impl<A: TrackerApi> Reconciler<A> {
    pub fn new(api: A, options: ReconcilerOptions) -> Self {
        Self::with_observer(api, options, NoopObserver)
    }
}

impl<A: TrackerApi, O: PipelineObserver> Reconciler<A, O> {
    pub fn with_observer(api: A, options: ReconcilerOptions, observer: O) -> Self {
        let cache = match &options.unique_attribute {
            Some(attribute) => TypeCache::with_unique_attribute(attribute.clone()),
            None => TypeCache::new(),
        };
        Self {
            api,
            options,
            cache,
            observer,
        }
    }

    pub fn options(&self) -> &ReconcilerOptions {
        &self.options
    }

    pub fn cache(&self) -> &TypeCache {
        &self.cache
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn into_observer(self) -> O {
        self.observer
    }

    /// Run one row through the pipeline.
    pub fn process_row(&mut self, row: &ClassifiedRow) -> std::result::Result<RowOutcome, RowFailure> {
        self.resolve_types(row).map_err(failed(RowStage::Start))?;

        let entity = self
            .upsert_entity(row)
            .map_err(failed(RowStage::TypesResolved))?;
        let reference = entity.reference().clone();

        let enrollment = self
            .enroll(row, &reference)
            .map_err(failed(RowStage::EntityResolved))?;
        let mut stage = if enrollment == EnrollmentOutcome::Skipped {
            RowStage::EntityResolved
        } else {
            RowStage::Enrolled
        };

        let target = self
            .options
            .event_target()
            .map(|(program, stage)| (program.clone(), stage.clone()));
        let Some((program, event_stage)) = target else {
            return Ok(RowOutcome {
                stage,
                entity,
                enrollment,
                duplicate_check: DuplicateCheck::Skipped,
                event: None,
            });
        };

        let duplicate_check = self
            .check_duplicates(row, &reference, &program, &event_stage)
            .map_err(failed(stage))?;
        if duplicate_check != DuplicateCheck::Skipped {
            stage = RowStage::DuplicateChecked;
        }

        let event_stage = match &duplicate_check {
            DuplicateCheck::Redirected(redirect) => redirect.clone(),
            DuplicateCheck::Skipped | DuplicateCheck::Clear => event_stage,
        };
        let event = self
            .record_event(row, &reference, &program, &event_stage)
            .map_err(failed(stage))?;

        Ok(RowOutcome {
            stage: RowStage::EventRecorded,
            entity,
            enrollment,
            duplicate_check,
            event: Some(event),
        })
    }

    pub(crate) fn notify(&mut self, event: PipelineEvent<'_>) {
        debug!(event = event.name(), "pipeline event");
        self.observer.observe(&event);
    }

    fn resolve_types(&mut self, row: &ClassifiedRow) -> Result<()> {
        self.notify(PipelineEvent::ResolvingTypes {
            attributes: row.attributes.len(),
            data_elements: row.data_elements.len(),
        });

        for id in row.attributes.keys() {
            if self.cache.has_attribute(id) {
                continue;
            }
            let operation = Operation::AttributeType;
            let response = self
                .api
                .attribute_metadata(id)
                .map_err(ReconcileError::transport(operation))?;
            if response.status != 200 {
                return Err(ReconcileError::UnexpectedStatus {
                    operation,
                    status: response.status,
                });
            }
            let body = response
                .body
                .as_ref()
                .ok_or_else(|| ReconcileError::malformed(operation, "empty body"))?;
            let metadata = AttributeMetadata::deserialize(body)
                .map_err(|error| ReconcileError::malformed(operation, error.to_string()))?;
            let value_type = ValueType::from_declared(metadata.value_type.as_deref());
            debug!(attribute = %id, %value_type, unique = metadata.is_unique(), "resolved attribute type");
            self.cache
                .record_attribute_type(id.clone(), value_type, metadata.is_unique());
        }

        for id in row.data_elements.keys() {
            if self.cache.has_data_element(id) {
                continue;
            }
            let operation = Operation::DataElementType;
            let response = self
                .api
                .data_element_metadata(id)
                .map_err(ReconcileError::transport(operation))?;
            if !matches!(response.status, 200 | 404) {
                return Err(ReconcileError::UnexpectedStatus {
                    operation,
                    status: response.status,
                });
            }
            let metadata = response
                .body
                .as_ref()
                .and_then(|body| DataElementMetadata::deserialize(body).ok())
                .unwrap_or_default();
            let value_type = ValueType::from_declared(metadata.declared_type());
            debug!(data_element = %id, %value_type, status = response.status, "resolved data element type");
            self.cache.record_data_element_type(id.clone(), value_type);
        }

        Ok(())
    }

    fn enroll(&mut self, row: &ClassifiedRow, entity: &EntityReference) -> Result<EnrollmentOutcome> {
        let Some(program) = self.options.program.clone() else {
            return Ok(EnrollmentOutcome::Skipped);
        };
        let date = non_empty(row.program_date());
        let payload = EnrollmentPayload {
            program,
            tracked_entity_instance: entity.clone(),
            date_of_enrollment: date.clone(),
            date_of_incident: date,
        };

        self.notify(PipelineEvent::Enrolling { payload: &payload });
        let response = self
            .api
            .enroll(&payload)
            .map_err(ReconcileError::transport(Operation::Enroll))?;
        self.notify(PipelineEvent::EnrollmentResponse {
            response: &response,
        });

        let summary = response.body.as_ref().and_then(ImportSummary::from_body);
        let accepted = (200..300).contains(&response.status)
            && summary.as_ref().is_none_or(ImportSummary::is_success);
        if accepted {
            return Ok(EnrollmentOutcome::Enrolled);
        }
        if response.status == 409 {
            debug!(entity = %entity, "entity already enrolled");
        } else {
            warn!(entity = %entity, status = response.status, "enrollment not accepted, continuing");
        }
        Ok(EnrollmentOutcome::Tolerated {
            status: response.status,
        })
    }

    fn record_event(
        &mut self,
        row: &ClassifiedRow,
        entity: &EntityReference,
        program: &ProgramId,
        stage: &StageId,
    ) -> Result<RecordedEvent> {
        let data_values = row
            .data_elements
            .iter()
            .map(|(id, raw)| {
                Ok(DataValue {
                    data_element: id.clone(),
                    value: self.cache.coerce_data_element_value(id, raw)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let payload = EventPayload {
            program: program.clone(),
            program_stage: stage.clone(),
            tracked_entity_instance: entity.clone(),
            org_unit: non_empty(row.event_org_unit()),
            stored_by: STORED_BY.to_string(),
            event_date: non_empty(row.event_date()),
            data_values,
            coordinate: row.coordinate(),
        };

        let operation = Operation::AddEvent;
        self.notify(PipelineEvent::AddingEvent { payload: &payload });
        let response = self
            .api
            .add_event(&payload)
            .map_err(ReconcileError::transport(operation))?;
        self.notify(PipelineEvent::EventAddResponse {
            response: &response,
        });

        if response.status > 203 {
            return Err(ReconcileError::UnexpectedStatus {
                operation,
                status: response.status,
            });
        }
        let summary = response
            .body
            .as_ref()
            .and_then(ImportSummary::from_body)
            .ok_or_else(|| ReconcileError::malformed(operation, "no import summary"))?;
        if !summary.is_success() {
            return Err(rejected(operation, &summary));
        }
        debug!(entity = %entity, stage = %stage, "recorded event");
        Ok(RecordedEvent {
            stage: stage.clone(),
            reference: summary.reference,
        })
    }
}

fn failed(stage: RowStage) -> impl FnOnce(ReconcileError) -> RowFailure {
    move |error| RowFailure { stage, error }
}

pub(crate) fn rejected(operation: Operation, summary: &ImportSummary) -> ReconcileError {
    ReconcileError::Rejected {
        operation,
        status: summary.status.clone().unwrap_or_default(),
        conflicts: summary.conflict_messages(),
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
}
