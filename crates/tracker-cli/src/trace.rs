//! Pipeline observation: log lines and the optional JSONL request trace.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use tracker_core::{PipelineEvent, PipelineObserver};
use tracker_model::{Operation, RequestTrace};

use crate::logging::{redact_json, redact_value};

/// One line of the trace file.
#[derive(Debug, Serialize)]
pub struct TraceRecord<'a> {
    pub file: &'a str,
    pub operation: Operation,
    pub status: u16,
    #[serde(flatten)]
    pub request: &'a RequestTrace,
}

/// Appends [`TraceRecord`]s to a file, one JSON object per line.
pub struct TraceSink {
    writer: BufWriter<File>,
}

impl TraceSink {
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open trace file {}", path.display()))?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    pub fn write(&mut self, record: &TraceRecord<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record).context("serialize trace record")?;
        self.writer.write_all(b"\n").context("write trace record")?;
        self.writer.flush().context("flush trace file")?;
        Ok(())
    }
}

/// Observer for one input file: logs every pipeline event and forwards
/// remote responses to the trace sink.
pub struct FileObserver<'a> {
    file: String,
    sink: Option<&'a mut TraceSink>,
    sink_failed: bool,
}

impl<'a> FileObserver<'a> {
    pub fn new(file: impl Into<String>, sink: Option<&'a mut TraceSink>) -> Self {
        Self {
            file: file.into(),
            sink,
            sink_failed: false,
        }
    }

    fn record(&mut self, operation: Operation, status: u16, request: &RequestTrace) {
        let Some(sink) = self.sink.as_deref_mut() else {
            return;
        };
        if self.sink_failed {
            return;
        }
        let record = TraceRecord {
            file: &self.file,
            operation,
            status,
            request,
        };
        if let Err(error) = sink.write(&record) {
            warn!(error = %error, "request tracing disabled for this file");
            self.sink_failed = true;
        }
    }
}

impl PipelineObserver for FileObserver<'_> {
    fn observe(&mut self, event: &PipelineEvent<'_>) {
        match event {
            PipelineEvent::ResolvingTypes {
                attributes,
                data_elements,
            } => debug!(attributes, data_elements, "resolving field types"),
            PipelineEvent::AddingEntity { payload } => {
                debug!(payload = %redact_json(payload), "adding tracked entity");
            }
            PipelineEvent::UpdatingEntity { entity } => {
                debug!(entity = %entity, "updating tracked entity");
            }
            PipelineEvent::Enrolling { payload } => {
                debug!(entity = %payload.tracked_entity_instance, program = %payload.program, "enrolling");
            }
            PipelineEvent::CheckingDuplicates { entity } => {
                debug!(entity = %entity, "checking for duplicate events");
            }
            PipelineEvent::AddingEvent { payload } => {
                debug!(stage = %payload.program_stage, payload = %redact_json(payload), "adding event");
            }
            PipelineEvent::EntityAddResponse { .. }
            | PipelineEvent::EntityUpdateResponse { .. }
            | PipelineEvent::EnrollmentResponse { .. }
            | PipelineEvent::EventAddResponse { .. } => {}
        }

        if let Some((operation, response)) = event.response() {
            info!(
                operation = %operation,
                status = response.status,
                path = %loggable_path(&response.trace.path),
                body = %redact_json(&response.body),
                "tracker response"
            );
            self.record(operation, response.status, &response.trace);
        }
    }
}

/// Query strings can carry attribute values.
fn loggable_path(path: &str) -> String {
    match path.split_once('?') {
        Some((path, query)) => format!("{path}?{}", redact_value(query)),
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_strings_are_redacted_by_default() {
        assert_eq!(
            loggable_path("/api/trackedEntityInstances?ou=OU1&filter=code:EQ:7"),
            "/api/trackedEntityInstances?[REDACTED]"
        );
        assert_eq!(loggable_path("/api/enrollments"), "/api/enrollments");
    }
}
