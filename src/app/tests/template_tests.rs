//! Tests for background templates and history import.

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use serde_json::json;
use treatmark_canvas::{
    DrawingElement, DrawingSurface, ElementType, FileAsset, PointerDown, SceneSnapshot, ToolKind,
};

use super::fakes::{Harness, png_bytes, records_json, stroke};
use crate::constants::{METHOD_ANNOTATION_HISTORY, METHOD_ANNOTATION_RECORDS};
use crate::data_url;
use crate::error::AnnotatorError;
use crate::message::{CanvasMessage, Command, Message, PanelMessage};
use crate::model::{TemplateCategory, TreatmentTag};
use crate::state::TaggingState;

fn place(harness: &mut Harness, index: usize) -> crate::error::Result<()> {
    let command = harness.annotator.update(Message::TemplateSelected {
        category: TemplateCategory::Male,
        index,
    });
    assert_eq!(
        command,
        Command::PlaceTemplate {
            category: TemplateCategory::Male,
            index
        }
    );
    pollster::block_on(harness.annotator.run(command))
}

fn started_with_records(records: serde_json::Value) -> Harness {
    let mut harness = Harness::new();
    harness
        .transport
        .respond(METHOD_ANNOTATION_RECORDS, Ok(records));
    harness
        .annotator
        .bootstrap("doctype=Encounter&docname=ENC-0001")
        .unwrap();
    pollster::block_on(harness.annotator.start()).unwrap();
    harness
}

#[test]
fn test_template_replaces_scene_with_locked_background() {
    let mut harness = Harness::started();
    harness.surface.push_element(stroke("old", "#000000"));

    place(&mut harness, 0).unwrap();

    let elements = harness.surface.elements().unwrap();
    assert_eq!(elements.len(), 1);
    let background = &elements[0];
    assert_eq!(background.id, "Front");
    assert_eq!(background.kind, ElementType::Image);
    assert!(background.locked);
    // 60x120 image in an 800x600 viewport
    assert_eq!((background.width, background.height), (60.0, 120.0));
    assert_eq!((background.x, background.y), (250.0, 0.0));
    assert_eq!(background.extra["scale"], json!([5.0, 5.0]));

    let file_id = background.file_id.clone().unwrap();
    assert!(file_id.starts_with("AT-0001-"));
    let files = harness.surface.files().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[&file_id].mime_type, "image/jpeg");

    assert_eq!(harness.annotator.annotation_template(), Some("AT-0001"));
    assert_eq!(harness.surface.scroll_count(), 1);
    assert_eq!(harness.transport.fetches(), vec!["/files/front.png".to_string()]);
}

#[test]
fn test_template_file_registered_once() {
    let mut harness = Harness::started();

    place(&mut harness, 0).unwrap();
    let first_id = harness.surface.elements().unwrap()[0].file_id.clone();
    place(&mut harness, 0).unwrap();
    let second_id = harness.surface.elements().unwrap()[0].file_id.clone();

    assert_eq!(first_id, second_id);
    assert_eq!(harness.surface.files().unwrap().len(), 1);

    place(&mut harness, 1).unwrap();
    assert_eq!(harness.surface.elements().unwrap()[0].id, "Back");
    assert_eq!(harness.surface.files().unwrap().len(), 2);
    assert_eq!(harness.annotator.annotation_template(), Some("AT-0002"));
}

#[test]
fn test_templates_sharing_an_image_share_a_file() {
    let mut records = records_json();
    records["templates"][1]["image"] = json!("/files/front.png");
    let mut harness = started_with_records(records);

    place(&mut harness, 0).unwrap();
    place(&mut harness, 1).unwrap();

    assert_eq!(harness.surface.files().unwrap().len(), 1);
    let background = &harness.surface.elements().unwrap()[0];
    assert_eq!(background.id, "Back");
    assert!(background.file_id.as_deref().unwrap().starts_with("AT-0001-"));
}

#[test]
fn test_inline_template_is_not_fetched() {
    let mut records = records_json();
    records["templates"][0]["image"] = json!(data_url::encode("image/png", &png_bytes(30, 30)));
    let mut harness = started_with_records(records);

    place(&mut harness, 0).unwrap();

    assert!(harness.transport.fetches().is_empty());
    let background = &harness.surface.elements().unwrap()[0];
    assert_eq!(background.extra["scale"], json!([20.0, 20.0]));
}

#[test]
fn test_unreachable_template_leaves_scene_untouched() {
    let mut records = records_json();
    records["templates"][0]["image"] = json!("/files/missing.png");
    let mut harness = started_with_records(records);
    harness.surface.push_element(stroke("s1", "#000000"));

    let result = place(&mut harness, 0);
    assert_matches!(result, Err(AnnotatorError::AssetLoad { .. }));

    let ids: Vec<String> = harness.surface.elements().unwrap().into_iter().map(|e| e.id).collect();
    assert_eq!(ids, vec!["s1".to_string()]);
    assert!(harness.surface.files().unwrap().is_empty());
    assert_eq!(harness.annotator.annotation_template(), None);
    assert_eq!(harness.notifier.errors().len(), 1);
}

#[test]
fn test_template_index_out_of_range() {
    let mut harness = Harness::started();
    let result = place(&mut harness, 7);
    assert_matches!(
        result,
        Err(AnnotatorError::OutOfRange {
            what: "template",
            index: 7
        })
    );
    assert!(harness.transport.fetches().is_empty());
    assert_eq!(harness.notifier.errors(), vec!["No template at index 7".to_string()]);
}

#[test]
fn test_history_import_replaces_scene_and_closes_panel() {
    let mut tagged = stroke("h1", "#ff0000");
    tagged.custom_data = Some(TreatmentTag::new("Suture", Default::default()).to_custom_data());
    let saved = SceneSnapshot::new(
        vec![tagged.clone(), DrawingElement::new("r1", ElementType::Rectangle)],
        [(
            "f1".to_string(),
            FileAsset::new("f1", "image/jpeg", "data:image/jpeg;base64,AAAA", 1),
        )]
        .into_iter()
        .collect(),
    );

    let mut harness = Harness::new();
    harness.transport.respond(
        METHOD_ANNOTATION_HISTORY,
        Ok(json!([{
            "name": "HA-1",
            "annotation_template": "AT-0001",
            "image": "/files/ha-1.jpg",
            "json": saved.to_json().unwrap(),
            "creation": "2024-05-01 10:00:00"
        }])),
    );
    harness
        .annotator
        .bootstrap("doctype=Encounter&docname=ENC-0001")
        .unwrap();
    pollster::block_on(harness.annotator.start()).unwrap();
    assert_eq!(harness.annotator.history()[0].element_count(), 2);

    // Select a stroke so there is something to drop
    harness.surface.push_element(tagged.clone());
    harness
        .annotator
        .update(Message::Canvas(CanvasMessage::PointerDown(PointerDown::on(
            tagged,
            ToolKind::Selection,
        ))));
    assert_matches!(harness.annotator.tagging_state(), TaggingState::Editing { .. });

    harness
        .annotator
        .update(Message::Panel(PanelMessage::OpenHistory));
    harness.annotator.update(Message::HistorySelected(0));

    assert_eq!(harness.surface.snapshot().unwrap(), saved);
    assert!(!harness.annotator.panels().history_open);
    assert_eq!(harness.annotator.tagging_state(), &TaggingState::Idle);
    assert!(harness.notifier.notices().is_empty());
}

#[test]
fn test_history_index_out_of_range() {
    let mut harness = Harness::started();
    harness.surface.push_element(stroke("s1", "#000000"));

    let result = harness.annotator.import_history(0);
    assert_matches!(
        result,
        Err(AnnotatorError::OutOfRange {
            what: "history entry",
            index: 0
        })
    );
    assert_eq!(harness.surface.elements().unwrap().len(), 1);
}
