use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{info, info_span};

use tracker_cli::driver::{Directories, FileDriver, IdentifierSource, ImportSettings};
use tracker_cli::trace::TraceSink;
use tracker_cli::types::ImportResult;
use tracker_client::{ClientConfig, Credentials, HttpTrackerClient};
use tracker_core::DuplicateStrategy;
use tracker_ingest::{SplitSummary, default_split_dir, split_csv};
use tracker_model::{AttributeId, DataElementId, ModelError, ProgramId, StageId, TrackedEntityId};

use crate::cli::{ImportArgs, SplitArgs};

pub fn run_import(args: &ImportArgs) -> Result<ImportResult> {
    let span = info_span!("import", url = %args.url);
    let _guard = span.enter();
    let start = Instant::now();

    let settings = import_settings(args)?;
    settings.directories.check()?;

    let credentials = args
        .username
        .clone()
        .zip(args.password.clone())
        .map(|(username, password)| Credentials { username, password });
    let config = ClientConfig::new(args.url.clone())
        .with_api_version(args.api_version.clone())
        .with_credentials(credentials)
        .with_timeout(Duration::from_secs(args.timeout));
    let client = HttpTrackerClient::new(&config).context("create tracker client")?;
    info!(api_root = %client.api_root(), "connected tracker client");

    let sink = args
        .trace_file
        .as_deref()
        .map(TraceSink::open)
        .transpose()?;
    let result = FileDriver::new(&client, &settings)
        .with_trace_sink(sink)
        .run()?;

    info!(duration_ms = start.elapsed().as_millis(), "import complete");
    Ok(result)
}

pub fn run_split(args: &SplitArgs) -> Result<SplitSummary> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_split_dir(&args.file));
    split_csv(&args.file, &output).with_context(|| format!("split {}", args.file.display()))
}

fn import_settings(args: &ImportArgs) -> Result<ImportSettings> {
    let identifiers = match &args.tracked_entity {
        Some(tracked_entity) => IdentifierSource::Fixed {
            tracked_entity: id(TrackedEntityId::new(tracked_entity.as_str()), "--tracked-entity")?,
            program: optional_id(args.program.as_deref(), ProgramId::new, "--program")?,
            stage: optional_id(args.stage.as_deref(), StageId::new, "--stage")?,
        },
        None => IdentifierSource::FileName,
    };
    let unique_data_element = optional_id(
        args.unique_data_element.as_deref(),
        DataElementId::new,
        "--unique-data-element",
    )?;

    Ok(ImportSettings {
        directories: Directories {
            input: args.csv.clone(),
            done: args.done.clone(),
            fail: args.fail.clone(),
        },
        identifiers,
        duplicate_check: DuplicateStrategy::select(args.duplicate_threshold, unique_data_element),
        duplicate_stage: optional_id(args.duplicate_stage.as_deref(), StageId::new, "--duplicate-stage")?,
        unique_attribute: optional_id(
            args.unique_attribute.as_deref(),
            AttributeId::new,
            "--unique-attribute",
        )?,
    })
}

fn id<T>(parsed: std::result::Result<T, ModelError>, flag: &str) -> Result<T> {
    parsed.with_context(|| format!("invalid {flag}"))
}

fn optional_id<T>(
    raw: Option<&str>,
    parse: impl FnOnce(String) -> std::result::Result<T, ModelError>,
    flag: &str,
) -> Result<Option<T>> {
    raw.map(|value| id(parse(value.to_string()), flag)).transpose()
}
