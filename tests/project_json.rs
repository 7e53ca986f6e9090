//! Project bundle and `.tixconfig` files on disk.

use annotix::ir::io_json::{
    read_project_config, read_project_json, to_project_config_string, write_project_config,
    write_project_json, ProjectBundle,
};
use annotix::ir::{AnnotationData, ProjectType};
use annotix::AnnotixError;

mod common;

fn sample_bundle() -> ProjectBundle {
    let mut project = common::project(ProjectType::Mask, &[(0, "cell"), (1, "nucleus")]);
    project.metadata.created = Some("2025-01-02T03:04:05Z".to_string());

    let images = vec![common::image(1, "slide.png", 32, 32).with_annotations(vec![
        common::bbox("a1", 0, 1.0, 2.0, 3.0, 4.0),
        common::polygon("a2", 1, &[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0)]),
        common::mask("a3", 1, common::rect_mask_data_url(32, 32, 2, 2, 10, 10)),
    ])];

    ProjectBundle { project, images }
}

#[test]
fn bundle_roundtrips_through_a_file() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let path = temp.path().join("project.json");
    let bundle = sample_bundle();

    write_project_json(&path, &bundle).expect("write bundle");
    let restored = read_project_json(&path).expect("read bundle");

    assert_eq!(restored, bundle);
    assert_eq!(restored.images[0].bytes, b"not really a jpeg".to_vec());
    assert!(matches!(
        restored.images[0].annotations[2].data,
        AnnotationData::Mask(_)
    ));
}

#[test]
fn bundle_stores_annotations_in_their_stored_shape() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let path = temp.path().join("project.json");
    write_project_json(&path, &sample_bundle()).expect("write bundle");

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read file")).expect("json");
    let first = &raw["images"][0]["annotations"][0];
    assert_eq!(first["id"], "a1");
    assert_eq!(first["type"], "bbox");
    assert_eq!(first["classId"], 0);
    assert_eq!(first["data"]["width"], 3.0);
}

#[test]
fn mismatched_payload_is_a_parse_error() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let path = temp.path().join("broken.json");
    std::fs::write(
        &path,
        r#"{
            "project": {"name": "p", "type": "bbox", "classes": []},
            "images": [{
                "id": 1, "name": "a.jpg", "width": 10, "height": 10,
                "annotations": [{"id": "x", "type": "bbox", "classId": 0, "data": {"points": []}}]
            }]
        }"#,
    )
    .expect("write file");

    let err = read_project_json(&path).expect_err("payload does not match type");
    assert!(matches!(err, AnnotixError::ProjectJsonParse { .. }), "{err}");
}

#[test]
fn missing_file_is_an_io_error() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let err = read_project_json(&temp.path().join("nope.json")).expect_err("missing file");
    assert!(matches!(err, AnnotixError::Io(_)));
}

#[test]
fn tixconfig_keeps_only_the_class_setup() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let path = temp.path().join("team.tixconfig");
    let bundle = sample_bundle();

    write_project_config(&path, &bundle.project).expect("write config");
    let config = read_project_config(&path).expect("read config");

    assert_eq!(config.name, "Test Project");
    assert_eq!(config.project_type, ProjectType::Mask);
    assert_eq!(config.classes, bundle.project.classes);

    let text = to_project_config_string(&bundle.project).expect("render config");
    assert!(!text.contains("metadata"));
    assert!(!text.contains("images"));

    let fresh = config.into_project();
    assert_eq!(fresh.classes.len(), 2);
    assert!(fresh.metadata.created.is_none());
}
