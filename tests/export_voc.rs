//! Pascal VOC archives, checked with a real XML parser.

use annotix::export::{export, CancellationToken, ExportFormat, ExportIssueCode, ExportOptions};
use annotix::ir::{Annotation, AnnotationData, ObbData, ProjectType};

mod common;

fn child_text<'a, 'input>(node: roxmltree::Node<'a, 'input>, name: &str) -> Option<&'a str> {
    node.children()
        .find(|c| c.has_tag_name(name))
        .and_then(|c| c.text())
}

#[test]
fn writes_one_parseable_file_per_image() {
    let mut project = common::project(ProjectType::Bbox, &[(0, "cat & dog")]);
    project.name = "Pets <2024>".to_string();
    let images = vec![
        common::image(1, "one.jpg", 640, 480).with_annotations(vec![
            common::bbox("a1", 0, 10.4, 20.5, 89.6, 159.99),
            common::bbox("a2", 9, 0.0, 0.0, 5.0, 5.0),
        ]),
        common::image(2, "two.jpeg", 32, 32).with_annotation(common::bbox("a3", 0, 1.0, 2.0, 3.0, 4.0)),
    ];

    let output = export(
        &project,
        &images,
        ExportFormat::PascalVoc,
        &ExportOptions::default(),
        &CancellationToken::new(),
        |_| {},
    )
    .expect("export voc");
    let entries = common::unzip(&output.archive);

    assert!(entries.contains_key("JPEGImages/one.jpg"));
    assert!(entries.contains_key("JPEGImages/two.jpeg"));

    let xml = common::entry_text(&entries, "Annotations/one.xml");
    let doc = roxmltree::Document::parse(&xml).expect("parse voc xml");
    let root = doc.root_element();
    assert!(root.has_tag_name("annotation"));
    assert_eq!(child_text(root, "folder"), Some("Pets <2024>"));
    assert_eq!(child_text(root, "filename"), Some("one.jpg"));
    assert_eq!(child_text(root, "segmented"), Some("0"));

    let size = root.children().find(|n| n.has_tag_name("size")).expect("size");
    assert_eq!(child_text(size, "width"), Some("640"));
    assert_eq!(child_text(size, "height"), Some("480"));
    assert_eq!(child_text(size, "depth"), Some("3"));

    let objects: Vec<_> = root.children().filter(|n| n.has_tag_name("object")).collect();
    assert_eq!(objects.len(), 2);
    assert_eq!(child_text(objects[0], "name"), Some("cat & dog"));
    assert_eq!(child_text(objects[0], "pose"), Some("Unspecified"));
    assert_eq!(child_text(objects[0], "truncated"), Some("0"));
    assert_eq!(child_text(objects[0], "difficult"), Some("0"));
    assert_eq!(child_text(objects[1], "name"), Some("unknown"));

    let bndbox = objects[0]
        .children()
        .find(|n| n.has_tag_name("bndbox"))
        .expect("bndbox");
    assert_eq!(child_text(bndbox, "xmin"), Some("10"));
    assert_eq!(child_text(bndbox, "ymin"), Some("21"));
    assert_eq!(child_text(bndbox, "xmax"), Some("100"));
    assert_eq!(child_text(bndbox, "ymax"), Some("180"));

    // the second stem drops only the last extension
    assert!(entries.contains_key("Annotations/two.xml"));
}

#[test]
fn obb_becomes_axis_aligned_box_and_polygon_is_skipped() {
    let project = common::project(ProjectType::Obb, &[(0, "ship")]);
    let images = vec![common::image(1, "sea.jpg", 100, 100).with_annotations(vec![
        Annotation::new(
            "o1",
            0u64,
            AnnotationData::Obb(ObbData::new(50.0, 50.0, 40.0, 20.0, 90.0)),
        ),
        common::polygon("p1", 0, &[(0.0, 0.0), (5.0, 0.0), (5.0, 5.0)]),
    ])];

    let output = export(
        &project,
        &images,
        ExportFormat::PascalVoc,
        &ExportOptions::default(),
        &CancellationToken::new(),
        |_| {},
    )
    .expect("export voc");
    let entries = common::unzip(&output.archive);
    let xml = common::entry_text(&entries, "Annotations/sea.xml");
    let doc = roxmltree::Document::parse(&xml).expect("parse voc xml");

    let bndbox = doc
        .descendants()
        .find(|n| n.has_tag_name("bndbox"))
        .expect("bndbox");
    assert_eq!(child_text(bndbox, "xmin"), Some("40"));
    assert_eq!(child_text(bndbox, "ymin"), Some("30"));
    assert_eq!(child_text(bndbox, "xmax"), Some("60"));
    assert_eq!(child_text(bndbox, "ymax"), Some("70"));

    let report = &output.report;
    assert_eq!(report.issues_with_code(ExportIssueCode::ObbRotationDropped).count(), 1);
    assert_eq!(report.issues_with_code(ExportIssueCode::UnsupportedAnnotation).count(), 1);
    assert_eq!(report.output.annotations, 1);
}
