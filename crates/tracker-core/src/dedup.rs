//! Duplicate event checks.

use chrono::{Days, NaiveDate};
use serde::Deserialize;
use tracing::{debug, info};

use tracker_client::{ApiResponse, EventQuery, TrackerApi};
use tracker_model::{
    ClassifiedRow, DataElementId, EntityReference, EventList, Operation, ProgramId, StageId,
};

use crate::error::{DuplicateReason, ReconcileError, Result};
use crate::observer::{PipelineEvent, PipelineObserver};
use crate::options::DuplicateStrategy;
use crate::reconciler::{DuplicateCheck, Reconciler, non_empty};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date. Anything else, including single-digit fields,
/// surrounding whitespace, and impossible calendar dates, is rejected.
pub fn parse_event_date(raw: &str) -> Result<NaiveDate> {
    let invalid = || ReconcileError::InvalidDate {
        value: raw.to_string(),
    };
    let bytes = raw.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(index, byte)| match index {
            4 | 7 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        });
    if !shaped {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| invalid())
}

/// First day of the duplicate window, `date - days`.
pub fn threshold_start(date: NaiveDate, days: u32) -> Option<String> {
    date.checked_sub_days(Days::new(u64::from(days)))
        .map(|start| start.format(DATE_FORMAT).to_string())
}

fn event_list(operation: Operation, response: &ApiResponse) -> Result<EventList> {
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
    EventList::deserialize(body).map_err(|error| ReconcileError::malformed(operation, error.to_string()))
}

impl<A: TrackerApi, O: PipelineObserver> Reconciler<A, O> {
    pub(crate) fn check_duplicates(
        &mut self,
        row: &ClassifiedRow,
        entity: &EntityReference,
        program: &ProgramId,
        stage: &StageId,
    ) -> Result<DuplicateCheck> {
        match self.options.duplicate_check.clone() {
            None => Ok(DuplicateCheck::Skipped),
            Some(DuplicateStrategy::Threshold { days }) => {
                self.check_threshold(row, entity, program, stage, days)
            }
            Some(DuplicateStrategy::UniqueDataElement(element)) => {
                self.check_unique_element(row, entity, &element)
            }
        }
    }

    fn check_threshold(
        &mut self,
        row: &ClassifiedRow,
        entity: &EntityReference,
        program: &ProgramId,
        stage: &StageId,
        days: u32,
    ) -> Result<DuplicateCheck> {
        let raw = row.event_date().unwrap_or_default();
        let date = parse_event_date(raw)?;
        let start_date = threshold_start(date, days).ok_or_else(|| ReconcileError::InvalidDate {
            value: raw.to_string(),
        })?;

        self.notify(PipelineEvent::CheckingDuplicates { entity });
        let operation = Operation::ListEvents;
        let query = EventQuery {
            program: program.clone(),
            program_stage: stage.clone(),
            tracked_entity_instance: entity.clone(),
            org_unit: non_empty(row.org_unit()),
            start_date: start_date.clone(),
        };
        let response = self
            .api
            .list_events(&query)
            .map_err(ReconcileError::transport(operation))?;
        let events = event_list(operation, &response)?;

        if events.events.is_empty() {
            return Ok(DuplicateCheck::Clear);
        }
        match &self.options.duplicate_stage {
            Some(redirect) => {
                info!(entity = %entity, stage = %redirect, "duplicate event, recording on duplicate stage");
                Ok(DuplicateCheck::Redirected(redirect.clone()))
            }
            None => Err(ReconcileError::DuplicateEvent(
                DuplicateReason::WithinThreshold { days, start_date },
            )),
        }
    }

    fn check_unique_element(
        &mut self,
        row: &ClassifiedRow,
        entity: &EntityReference,
        element: &DataElementId,
    ) -> Result<DuplicateCheck> {
        let Some(raw) = row
            .data_elements
            .get(element)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
        else {
            debug!(data_element = %element, "row has no value for unique data element");
            return Ok(DuplicateCheck::Skipped);
        };
        let expected = self.cache.coerce_data_element_value(element, raw)?.render(raw);

        self.notify(PipelineEvent::CheckingDuplicates { entity });
        let operation = Operation::ListEvents;
        let response = self
            .api
            .list_entity_events(entity)
            .map_err(ReconcileError::transport(operation))?;
        let events = event_list(operation, &response)?;

        let duplicate = events
            .events
            .iter()
            .flat_map(|event| &event.data_values)
            .any(|value| value.data_element == element.as_str() && value.value_text() == expected);
        if duplicate {
            return Err(ReconcileError::DuplicateEvent(
                DuplicateReason::UniqueDataElement {
                    data_element: element.clone(),
                    value: expected,
                },
            ));
        }
        Ok(DuplicateCheck::Clear)
    }
}
