//! File Driver behaviour against a mock tracker server.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::DateTime;
use httpmock::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

use tracker_cli::driver::{Directories, FileDriver, IdentifierSource, ImportSettings};
use tracker_cli::trace::{TraceRecord, TraceSink};
use tracker_cli::types::FileOutcome;
use tracker_client::{ClientConfig, HttpTrackerClient};
use tracker_model::{Operation, RequestTrace, TrackedEntityId};

fn workspace() -> (TempDir, Directories) {
    let root = TempDir::new().expect("temp dir");
    let directories = Directories {
        input: root.path().join("csv"),
        done: root.path().join("csvdone"),
        fail: root.path().join("csvfail"),
    };
    for dir in [&directories.input, &directories.done, &directories.fail] {
        fs::create_dir(dir).expect("mkdir");
    }
    (root, directories)
}

fn settings(directories: Directories, identifiers: IdentifierSource) -> ImportSettings {
    ImportSettings {
        directories,
        identifiers,
        duplicate_check: None,
        duplicate_stage: None,
        unique_attribute: None,
    }
}

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).expect("write input");
}

fn mock_happy_path(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/api/trackedEntityAttributes/attr1");
        then.status(200).json_body(json!({"valueType": "TEXT"}));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/trackedEntityInstances");
        then.status(201)
            .json_body(json!({"status": "SUCCESS", "reference": "TEI1"}));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/enrollments");
        then.status(201).json_body(json!({"status": "SUCCESS"}));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/events");
        then.status(201)
            .json_body(json!({"importSummaries": [{"status": "SUCCESS"}]}));
    });
}

#[test]
fn moves_files_by_outcome_and_traces_requests() {
    let server = MockServer::start();
    mock_happy_path(&server);
    server.mock(|when, then| {
        when.method(GET).path("/api/trackedEntityAttributes/broken");
        then.status(500);
    });

    let (root, directories) = workspace();
    write(
        &directories.input,
        "P1.S1.TE1.csv",
        "orgUnit,eventDate,A|attr1\nOU1,1970-01-02,a\nOU1,1970-01-03,b\n",
    );
    write(&directories.input, "P1.S1.TE1.fail", "orgUnit,A|broken\nOU1,x\n");
    write(&directories.input, "bad-name.csv", "orgUnit,A|attr1\nOU1,a\n");
    let trace_path = root.path().join("trace.jsonl");

    let client = HttpTrackerClient::new(&ClientConfig::new(server.base_url())).unwrap();
    let settings = settings(directories.clone(), IdentifierSource::FileName);
    let result = FileDriver::new(&client, &settings)
        .with_trace_sink(Some(TraceSink::open(&trace_path).unwrap()))
        .run()
        .expect("import runs");

    assert_eq!(result.reports.len(), 3);
    assert!(result.has_failures());
    assert_eq!(result.failed_files(), 2);

    let done = &result.reports[0];
    assert_eq!(done.outcome, FileOutcome::Done);
    assert_eq!(done.rows_processed, 2);
    let moved_to = done.destination.as_deref().expect("moved");
    assert_eq!(moved_to, directories.done.join("P1.S1.TE1.csv"));
    assert!(moved_to.exists());
    assert!(!directories.input.join("P1.S1.TE1.csv").exists());

    let failed_row = &result.reports[1];
    assert_eq!(failed_row.rows_processed, 0);
    match &failed_row.outcome {
        FileOutcome::Failed { line, reason } => {
            assert_eq!(*line, Some(2));
            assert!(reason.contains("500"), "{reason}");
        }
        FileOutcome::Done => panic!("expected failure"),
    }
    assert!(directories.fail.join("P1.S1.TE1.fail").exists());

    let bad_name = &result.reports[2];
    match &bad_name.outcome {
        FileOutcome::Failed { line, reason } => {
            assert_eq!(*line, None);
            assert!(reason.contains("incorrect file name format"), "{reason}");
        }
        FileOutcome::Done => panic!("expected failure"),
    }
    assert!(directories.fail.join("bad-name.csv").exists());

    let trace = fs::read_to_string(&trace_path).unwrap();
    let records: Vec<Value> = trace
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 6);
    assert!(records.iter().all(|record| record["file"] == "P1.S1.TE1.csv"));
    let operations: Vec<&str> = records
        .iter()
        .map(|record| record["operation"].as_str().unwrap())
        .collect();
    assert_eq!(
        operations,
        ["create_entity", "enroll", "add_event", "create_entity", "enroll", "add_event"]
    );
    assert_eq!(records[2]["body"]["eventDate"], "1970-01-02");
    assert_eq!(records[2]["status"], 201);
}

#[test]
fn empty_files_are_done() {
    let server = MockServer::start();
    let (_root, directories) = workspace();
    write(&directories.input, "P1.S1.TE1.csv", "");

    let client = HttpTrackerClient::new(&ClientConfig::new(server.base_url())).unwrap();
    let settings = settings(directories.clone(), IdentifierSource::FileName);
    let result = FileDriver::new(&client, &settings).run().unwrap();

    assert_eq!(result.reports[0].outcome, FileOutcome::Done);
    assert_eq!(result.reports[0].rows_processed, 0);
    assert!(directories.done.join("P1.S1.TE1.csv").exists());
}

#[test]
fn fixed_identifiers_without_program_only_upsert() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/trackedEntityAttributes/attr1");
        then.status(200).json_body(json!({"valueType": "TEXT"}));
    });
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/api/trackedEntityInstances")
            .json_body(json!({
                "trackedEntity": "person",
                "orgUnit": "OU1",
                "attributes": [{"attribute": "attr1", "value": "a"}]
            }));
        then.status(201)
            .json_body(json!({"status": "SUCCESS", "reference": "TEI1"}));
    });
    let enroll = server.mock(|when, then| {
        when.method(POST).path("/api/enrollments");
        then.status(201).json_body(json!({"status": "SUCCESS"}));
    });

    let (_root, directories) = workspace();
    write(&directories.input, "anything.csv", "orgUnit,A|attr1\nOU1,a\n");

    let client = HttpTrackerClient::new(&ClientConfig::new(server.base_url())).unwrap();
    let identifiers = IdentifierSource::Fixed {
        tracked_entity: TrackedEntityId::new("person").unwrap(),
        program: None,
        stage: None,
    };
    let settings = settings(directories, identifiers);
    let result = FileDriver::new(&client, &settings).run().unwrap();

    assert!(!result.has_failures());
    create.assert();
    enroll.assert_calls(0);
}

#[test]
fn a_failed_move_is_reported_and_later_files_continue() {
    let server = MockServer::start();
    let (_root, directories) = workspace();
    write(&directories.input, "a.csv", "");
    write(&directories.input, "b.csv", "");
    // A non-empty directory in the way makes both rename and copy fail.
    let blocker = directories.done.join("a.csv");
    fs::create_dir(&blocker).unwrap();
    fs::write(blocker.join("keep"), "").unwrap();

    let client = HttpTrackerClient::new(&ClientConfig::new(server.base_url())).unwrap();
    let identifiers = IdentifierSource::Fixed {
        tracked_entity: TrackedEntityId::new("person").unwrap(),
        program: None,
        stage: None,
    };
    let settings = settings(directories.clone(), identifiers);
    let result = FileDriver::new(&client, &settings).run().expect("import runs");

    assert_eq!(result.reports.len(), 2);
    let blocked = &result.reports[0];
    assert!(blocked.outcome.is_failed());
    assert_eq!(blocked.destination, None);
    assert!(directories.input.join("a.csv").exists());

    let moved = &result.reports[1];
    assert_eq!(moved.outcome, FileOutcome::Done);
    assert_eq!(moved.destination, Some(directories.done.join("b.csv")));
    assert!(result.has_failures());
}

#[test]
fn missing_directories_fail_before_processing() {
    let server = MockServer::start();
    let (_root, mut directories) = workspace();
    directories.done = directories.done.join("missing");

    let client = HttpTrackerClient::new(&ClientConfig::new(server.base_url())).unwrap();
    let settings = settings(directories, IdentifierSource::FileName);
    let err = FileDriver::new(&client, &settings).run().unwrap_err();

    assert!(err.to_string().contains("done directory not found"), "{err}");
}

#[test]
fn trace_record_line_format() {
    let mut headers = BTreeMap::new();
    headers.insert("accept".to_string(), "*/*".to_string());
    headers.insert("content-type".to_string(), "application/json".to_string());
    let request = RequestTrace {
        method: "POST".into(),
        path: "/api/trackedEntityInstances".into(),
        headers,
        body: Some(json!({"trackedEntity": "TE1"})),
        timestamp: DateTime::from_timestamp(0, 0).unwrap(),
    };
    let record = TraceRecord {
        file: "P1.S1.TE1.csv",
        operation: Operation::CreateEntity,
        status: 201,
        request: &request,
    };

    let line = serde_json::to_string(&record).unwrap();

    insta::assert_snapshot!(line, @r#"{"file":"P1.S1.TE1.csv","operation":"create_entity","status":201,"method":"POST","path":"/api/trackedEntityInstances","headers":{"accept":"*/*","content-type":"application/json"},"body":{"trackedEntity":"TE1"},"timestamp":"1970-01-01T00:00:00Z"}"#);
}
