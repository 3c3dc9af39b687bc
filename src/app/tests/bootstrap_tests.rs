//! Tests for session bootstrap and reference data loading.

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use serde_json::json;

use super::fakes::{Harness, records_json};
use crate::constants::{METHOD_ANNOTATION_HISTORY, METHOD_ANNOTATION_RECORDS};
use crate::error::AnnotatorError;
use crate::message::{Command, Message};
use crate::model::TemplateCategory;
use crate::transport::RemoteError;

#[test]
fn test_missing_session_halts_before_fetching() {
    for query in ["", "?doctype=Encounter", "?docname=ENC-0001", "?doctype=&docname=X"] {
        let mut harness = Harness::new();

        let result = harness.annotator.bootstrap(query);
        assert_matches!(result, Err(AnnotatorError::MissingSession));

        let started = pollster::block_on(harness.annotator.start());
        assert_matches!(started, Err(AnnotatorError::MissingSession));

        assert!(harness.transport.calls().is_empty(), "query {:?}", query);
        assert_eq!(
            harness.notifier.errors(),
            vec![
                "Please open the annotation from an encounter or a procedure!".to_string(),
                "Please open the annotation from an encounter or a procedure!".to_string(),
            ]
        );
    }
}

#[test]
fn test_valid_session_loads_both_fetches() {
    let harness = Harness::started();

    let history_calls = harness.transport.calls_to(METHOD_ANNOTATION_HISTORY);
    assert_eq!(history_calls.len(), 1);
    assert_eq!(
        history_calls[0].args,
        json!({ "doctype": "Encounter", "docname": "ENC-0001" })
    );
    assert_eq!(harness.transport.calls_to(METHOD_ANNOTATION_RECORDS).len(), 1);

    let annotator = &harness.annotator;
    assert_eq!(annotator.catalog().len(), 1);
    assert_eq!(annotator.library().category(TemplateCategory::Male).len(), 2);
    assert!(annotator.library().category(TemplateCategory::Female).is_empty());
    assert!(harness.notifier.notices().is_empty());
}

#[test]
fn test_failed_reference_fetch_leaves_history_intact() {
    let mut harness = Harness::new();
    harness.transport.respond(
        METHOD_ANNOTATION_RECORDS,
        Err(RemoteError::rejected(
            METHOD_ANNOTATION_RECORDS,
            500,
            Some("PermissionError".to_string()),
            None,
        )),
    );
    harness.transport.respond(
        METHOD_ANNOTATION_HISTORY,
        Ok(json!([{
            "name": "HA-1",
            "annotation_template": "AT-0001",
            "json": "{\"elements\":[],\"files\":{}}",
            "creation": "2024-05-01 10:00:00"
        }])),
    );
    harness.annotator.bootstrap("doctype=Encounter&docname=ENC-0001").unwrap();

    let report = pollster::block_on(harness.annotator.start()).unwrap();
    assert!(!report.is_complete());
    assert_matches!(report.reference_data, Err(RemoteError::Rejected { status: 500, .. }));
    assert_eq!(report.history, Ok(()));

    assert!(harness.annotator.catalog().is_empty());
    assert_eq!(harness.annotator.history().len(), 1);
    assert_eq!(
        harness.notifier.errors(),
        vec!["annotation.api.annotations_records failed: PermissionError".to_string()]
    );

    // Retry once the backend recovers
    harness
        .transport
        .respond(METHOD_ANNOTATION_RECORDS, Ok(records_json()));
    let command = harness.annotator.update(Message::RetryReferenceData);
    assert_eq!(command, Command::LoadReferenceData);
    pollster::block_on(harness.annotator.run(command)).unwrap();
    assert_eq!(harness.annotator.catalog().len(), 1);
}

#[test]
fn test_history_entries_with_bad_scene_are_reported() {
    let mut harness = Harness::new();
    harness.transport.respond(
        METHOD_ANNOTATION_HISTORY,
        Ok(json!([
            { "name": "HA-1", "json": "{\"elements\":[],\"files\":{}}", "creation": "a" },
            { "name": "HA-2", "json": "{broken", "creation": "b" },
            { "name": "HA-3", "json": "42", "creation": "c" }
        ])),
    );
    harness.annotator.bootstrap("doctype=Encounter&docname=ENC-0001").unwrap();

    let report = pollster::block_on(harness.annotator.start()).unwrap();
    assert!(report.is_complete());
    let names: Vec<&str> = harness
        .annotator
        .history()
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(names, vec!["HA-1"]);
    assert_eq!(
        harness.notifier.errors(),
        vec!["Could not read saved annotation(s): HA-2, HA-3".to_string()]
    );
}

#[test]
fn test_staging_initialised_empty() {
    let mut harness = Harness::started();
    harness.annotator.pick_treatment("Suture").unwrap();

    let fields = harness.annotator.variable_fields();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].spec.name(), "notes");
    assert_eq!(fields[0].value, "");
}
