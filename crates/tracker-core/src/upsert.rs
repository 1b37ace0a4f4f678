//! Create-or-update of the row's tracked entity.
//!
//! A create that fails only because the unique attribute value already exists
//! is recovered by looking the entity up by that value and updating it with
//! the same payload.

use tracing::{debug, info};

use tracker_client::TrackerApi;
use tracker_model::{
    AttributeValue, ClassifiedRow, EntityPayload, EntityReference, ImportSummary, Operation,
    first_entity_reference,
};

use crate::error::{ReconcileError, Result};
use crate::observer::{PipelineEvent, PipelineObserver};
use crate::reconciler::{EntityResolution, Reconciler, non_empty, rejected};

impl<A: TrackerApi, O: PipelineObserver> Reconciler<A, O> {
    pub(crate) fn entity_payload(&self, row: &ClassifiedRow) -> Result<EntityPayload> {
        let attributes = row
            .attributes
            .iter()
            .map(|(id, raw)| {
                Ok(AttributeValue {
                    attribute: id.clone(),
                    value: self.cache.coerce_attribute_value(id, raw)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(EntityPayload {
            tracked_entity: self.options.tracked_entity.clone(),
            org_unit: non_empty(row.org_unit()),
            attributes,
        })
    }

    pub(crate) fn upsert_entity(&mut self, row: &ClassifiedRow) -> Result<EntityResolution> {
        let operation = Operation::CreateEntity;
        let payload = self.entity_payload(row)?;

        self.notify(PipelineEvent::AddingEntity { payload: &payload });
        let response = self
            .api
            .create_entity(&payload)
            .map_err(ReconcileError::transport(operation))?;
        self.notify(PipelineEvent::EntityAddResponse {
            response: &response,
        });

        let created = matches!(response.status, 200 | 201);
        if !created && response.status != 409 {
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

        if created && summary.is_success() {
            let reference = summary
                .reference()
                .ok_or_else(|| ReconcileError::malformed(operation, "no entity reference"))?;
            debug!(entity = %reference, "created tracked entity");
            return Ok(EntityResolution::Created(reference));
        }
        if summary.conflicts.is_empty() {
            return Err(rejected(operation, &summary));
        }
        if !summary.all_conflicts_non_unique() {
            return Err(ReconcileError::UnresolvableConflict {
                conflicts: summary.conflict_messages(),
            });
        }

        let reference = self.update_existing(row, &payload)?;
        Ok(EntityResolution::Updated(reference))
    }

    fn update_existing(
        &mut self,
        row: &ClassifiedRow,
        payload: &EntityPayload,
    ) -> Result<EntityReference> {
        let attribute = self
            .cache
            .unique_attribute()
            .cloned()
            .ok_or(ReconcileError::NoUniqueAttribute)?;
        let raw = row
            .attributes
            .get(&attribute)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ReconcileError::MissingUniqueValue {
                attribute: attribute.clone(),
            })?;
        let value = match payload.attribute(&attribute) {
            Some(coerced) => coerced.render(raw),
            None => raw.to_string(),
        };

        let operation = Operation::FindEntity;
        let response = self
            .api
            .find_entities(row.org_unit().filter(|ou| !ou.is_empty()), &attribute, &value)
            .map_err(ReconcileError::transport(operation))?;
        if response.status != 200 {
            return Err(ReconcileError::UnexpectedStatus {
                operation,
                status: response.status,
            });
        }
        let reference = response
            .body
            .as_ref()
            .and_then(first_entity_reference)
            .ok_or(ReconcileError::LookupEmpty { attribute })?;

        let operation = Operation::UpdateEntity;
        self.notify(PipelineEvent::UpdatingEntity { entity: &reference });
        let response = self
            .api
            .update_entity(&reference, payload)
            .map_err(ReconcileError::transport(operation))?;
        self.notify(PipelineEvent::EntityUpdateResponse {
            response: &response,
        });

        if response.status != 200 {
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
        info!(entity = %reference, "updated existing tracked entity");
        Ok(reference)
    }
}
