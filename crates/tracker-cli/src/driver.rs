//! File Driver: replays every input file and moves it to done or failed.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::{info, info_span, warn};

use tracker_client::TrackerApi;
use tracker_core::{DuplicateStrategy, Reconciler, ReconcilerOptions};
use tracker_ingest::{CsvRowReader, FileIdentifiers, classify_row, list_input_files};
use tracker_model::{AttributeId, ProgramId, StageId, TrackedEntityId};

use crate::trace::{FileObserver, TraceSink};
use crate::types::{FileOutcome, FileReport, ImportResult};

#[derive(Debug, Clone)]
pub struct Directories {
    pub input: PathBuf,
    pub done: PathBuf,
    pub fail: PathBuf,
}

impl Directories {
    /// All three directories must exist before anything is processed.
    pub fn check(&self) -> Result<()> {
        for (role, path) in [
            ("input", &self.input),
            ("done", &self.done),
            ("fail", &self.fail),
        ] {
            if !path.is_dir() {
                bail!("{role} directory not found: {}", path.display());
            }
        }
        Ok(())
    }
}

/// Where a file's program, stage, and tracked entity type come from.
#[derive(Debug, Clone)]
pub enum IdentifierSource {
    /// `programID.stageID.trackedEntityID.<ext>`
    FileName,
    /// The same identifiers for every file.
    Fixed {
        tracked_entity: TrackedEntityId,
        program: Option<ProgramId>,
        stage: Option<StageId>,
    },
}

#[derive(Debug, Clone)]
pub struct ImportSettings {
    pub directories: Directories,
    pub identifiers: IdentifierSource,
    pub duplicate_check: Option<DuplicateStrategy>,
    pub duplicate_stage: Option<StageId>,
    pub unique_attribute: Option<AttributeId>,
}

impl ImportSettings {
    /// Reconciler configuration for one file, or why none can be built.
    pub fn options_for(&self, path: &Path) -> std::result::Result<ReconcilerOptions, String> {
        let options = match &self.identifiers {
            IdentifierSource::FileName => {
                let ids = FileIdentifiers::from_path(path).map_err(|error| error.to_string())?;
                ReconcilerOptions::new(ids.tracked_entity)
                    .with_program(ids.program)
                    .with_stage(ids.stage)
            }
            IdentifierSource::Fixed {
                tracked_entity,
                program,
                stage,
            } => {
                let mut options = ReconcilerOptions::new(tracked_entity.clone());
                options.program = program.clone();
                options.stage = stage.clone();
                options
            }
        };
        Ok(options
            .with_duplicate_check(self.duplicate_check.clone())
            .with_duplicate_stage(self.duplicate_stage.clone())
            .with_unique_attribute(self.unique_attribute.clone()))
    }
}

/// Processes input files one at a time, rows in order.
pub struct FileDriver<'a, A> {
    api: &'a A,
    settings: &'a ImportSettings,
    sink: Option<TraceSink>,
}

impl<'a, A: TrackerApi> FileDriver<'a, A> {
    pub fn new(api: &'a A, settings: &'a ImportSettings) -> Self {
        Self {
            api,
            settings,
            sink: None,
        }
    }

    #[must_use]
    pub fn with_trace_sink(mut self, sink: Option<TraceSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn run(&mut self) -> Result<ImportResult> {
        self.settings.directories.check()?;
        let files = list_input_files(&self.settings.directories.input)
            .context("list input files")?;
        info!(files = files.len(), "starting import");

        let mut result = ImportResult::default();
        for path in files {
            let report = self.process_file(&path);
            result.reports.push(report);
        }
        info!(
            files = result.reports.len(),
            failed = result.failed_files(),
            rows = result.rows_processed(),
            "import finished"
        );
        Ok(result)
    }

    pub fn process_file(&mut self, path: &Path) -> FileReport {
        let name = file_name(path);
        let span = info_span!("file", file = %name);
        let _guard = span.enter();
        let start = Instant::now();

        let (rows_processed, mut outcome) = match self.settings.options_for(path) {
            Ok(options) => self.reconcile_file(path, &name, options),
            Err(reason) => (0, FileOutcome::Failed { line: None, reason }),
        };

        let directories = &self.settings.directories;
        let target_dir = if outcome.is_failed() {
            &directories.fail
        } else {
            &directories.done
        };
        let target = target_dir.join(&name);
        let destination = match move_file(path, &target) {
            Ok(()) => Some(target),
            Err(error) => {
                // The file stays in the input directory.
                let move_reason = format!("{error:#}");
                outcome = match outcome {
                    FileOutcome::Done => FileOutcome::Failed {
                        line: None,
                        reason: move_reason,
                    },
                    FileOutcome::Failed { line, reason } => FileOutcome::Failed {
                        line,
                        reason: format!("{reason}; {move_reason}"),
                    },
                };
                None
            }
        };

        let duration_ms = start.elapsed().as_millis();
        match &outcome {
            FileOutcome::Done => info!(rows = rows_processed, duration_ms, "file done"),
            FileOutcome::Failed { line, reason } => warn!(
                rows = rows_processed,
                line = ?line,
                reason = %reason,
                duration_ms,
                "file failed"
            ),
        }

        FileReport {
            file: path.to_path_buf(),
            rows_processed,
            outcome,
            destination,
        }
    }

    fn reconcile_file(
        &mut self,
        path: &Path,
        name: &str,
        options: ReconcilerOptions,
    ) -> (usize, FileOutcome) {
        let reader = match CsvRowReader::open(path) {
            Ok(reader) => reader,
            Err(error) => {
                return (
                    0,
                    FileOutcome::Failed {
                        line: None,
                        reason: error.to_string(),
                    },
                );
            }
        };

        let observer = FileObserver::new(name, self.sink.as_mut());
        let mut reconciler = Reconciler::with_observer(self.api, options, observer);
        let mut processed = 0;
        for row in reader {
            let raw = match row {
                Ok(raw) => raw,
                Err(error) => {
                    return (
                        processed,
                        FileOutcome::Failed {
                            line: None,
                            reason: error.to_string(),
                        },
                    );
                }
            };
            let span = info_span!("row", line = raw.line);
            let _guard = span.enter();
            let classified = classify_row(raw.columns.iter().map(|(key, value)| (key, value)));
            match reconciler.process_row(&classified) {
                Ok(outcome) => {
                    processed += 1;
                    info!(entity = %outcome.entity.reference(), "row reconciled");
                }
                Err(failure) => {
                    warn!(stage = %failure.stage, error = %failure.error, "row failed");
                    return (
                        processed,
                        FileOutcome::Failed {
                            line: Some(raw.line),
                            reason: failure.error.to_string(),
                        },
                    );
                }
            }
        }
        (processed, FileOutcome::Done)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Rename, falling back to copy and delete across filesystems.
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)
        .with_context(|| format!("copy {} to {}", from.display(), to.display()))?;
    fs::remove_file(from).with_context(|| format!("remove {}", from.display()))?;
    Ok(())
}
