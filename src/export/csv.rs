//! CSV exporters.
//!
//! # Layout
//!
//! ```text
//! annotations.csv
//! classes.csv      (id,name)
//! images/<name>
//! ```
//!
//! # Table Shapes
//!
//! - detection: `filename,width,height,class,xmin,ymin,xmax,ymax`, one row
//!   per bbox/obb with integer-rounded corners.
//! - landmarks: `filename,width,height,class` then `<name>_x,<name>_y` for
//!   every landmark name seen in the export, sorted alphabetically.
//! - keypoints: `filename,width,height,class,instance_id` then
//!   `<name>_x,<name>_y,<name>_visible` for every named keypoint.
//! - classification: `filename,class` with class names joined by `;`.
//!
//! An image with nothing to put in the table still gets one row with empty
//! cells. Coordinates in the wide formats use two decimals.

use std::collections::{BTreeMap, BTreeSet};

use super::archive::ArchiveWriter;
use super::{class_label, ExportContext, ExportIssueCode, Exporter, StagedImage};
use crate::error::AnnotixError;
use crate::geometry::js_round;
use crate::ir::{AnnotatedImage, AnnotationData, ClassId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CsvLayout {
    Detection,
    Landmarks,
    Keypoints,
    Classification,
}

#[derive(Debug)]
pub(crate) struct CsvExporter {
    layout: CsvLayout,
}

impl CsvExporter {
    pub(crate) fn new(layout: CsvLayout) -> Self {
        Self { layout }
    }
}

/// One image's table contribution, kept until every column is known.
pub(crate) struct CsvImage {
    filename: String,
    width: u32,
    height: u32,
    entries: Vec<CsvEntry>,
}

enum CsvEntry {
    Box {
        class: String,
        corners: [f64; 4],
    },
    Landmarks {
        class: String,
        points: BTreeMap<String, (f64, f64)>,
    },
    Keypoints {
        class: String,
        instance_id: u32,
        points: BTreeMap<String, (f64, f64, bool)>,
    },
    Classes(Vec<String>),
}

impl Exporter for CsvExporter {
    type Record = CsvImage;

    fn write_image(
        &mut self,
        ctx: &ExportContext<'_>,
        _position: usize,
        image: &AnnotatedImage,
        staged: &mut StagedImage,
    ) -> Result<CsvImage, AnnotixError> {
        let project = ctx.project;
        let mut entries = Vec::new();

        for annotation in &image.annotations {
            let class = || class_label(project, annotation.class_id).to_string();
            let entry = match (self.layout, &annotation.data) {
                (CsvLayout::Detection, AnnotationData::BBox(b)) => {
                    let bbox = b.to_xyxy();
                    CsvEntry::Box {
                        class: class(),
                        corners: [bbox.xmin(), bbox.ymin(), bbox.xmax(), bbox.ymax()].map(js_round),
                    }
                }
                (CsvLayout::Detection, AnnotationData::Obb(obb)) => {
                    let bbox = obb.to_aabb();
                    if obb.normalized_rotation() != 0.0 {
                        staged.note(
                            ExportIssueCode::ObbRotationDropped,
                            format!(
                                "obb annotation {} written as its axis-aligned box",
                                annotation.id
                            ),
                        );
                    }
                    CsvEntry::Box {
                        class: class(),
                        corners: [bbox.xmin(), bbox.ymin(), bbox.xmax(), bbox.ymax()].map(js_round),
                    }
                }
                (CsvLayout::Landmarks, AnnotationData::Landmarks(landmarks)) => {
                    let mut points = BTreeMap::new();
                    for point in &landmarks.points {
                        points.entry(point.name.clone()).or_insert((point.x, point.y));
                    }
                    CsvEntry::Landmarks {
                        class: class(),
                        points,
                    }
                }
                (CsvLayout::Keypoints, AnnotationData::Keypoints(keypoints)) => {
                    let mut points = BTreeMap::new();
                    for point in &keypoints.points {
                        if let Some(name) = point.name.as_ref().filter(|n| !n.is_empty()) {
                            points
                                .entry(name.clone())
                                .or_insert((point.x, point.y, point.visible));
                        }
                    }
                    CsvEntry::Keypoints {
                        class: class(),
                        instance_id: keypoints.instance_id.unwrap_or(1),
                        points,
                    }
                }
                (CsvLayout::Classification, AnnotationData::Classification(c))
                | (CsvLayout::Classification, AnnotationData::MultiLabelClassification(c)) => {
                    let ids: Vec<Option<ClassId>> = if c.labels.is_empty() {
                        vec![annotation.class_id]
                    } else {
                        c.labels.iter().copied().map(Some).collect()
                    };
                    CsvEntry::Classes(
                        ids.into_iter()
                            .map(|id| class_label(project, id).to_string())
                            .collect(),
                    )
                }
                _ => {
                    // classification falls back to the first annotation's class
                    if self.layout != CsvLayout::Classification {
                        staged.unsupported(ctx, annotation);
                    }
                    continue;
                }
            };
            entries.push(entry);
            staged.wrote_annotation();
        }

        if self.layout == CsvLayout::Classification {
            let merged: Vec<String> = entries
                .drain(..)
                .flat_map(|e| match e {
                    CsvEntry::Classes(names) => names,
                    _ => Vec::new(),
                })
                .collect();
            if !merged.is_empty() {
                entries.push(CsvEntry::Classes(dedupe(merged)));
            } else if let Some(first) = image.annotations.first() {
                entries.push(CsvEntry::Classes(vec![
                    class_label(project, first.class_id).to_string(),
                ]));
                staged.wrote_annotation();
            }
        }

        staged.copy_image("images", image);
        Ok(CsvImage {
            filename: image.name.clone(),
            width: image.width,
            height: image.height,
            entries,
        })
    }

    fn finish(
        &mut self,
        ctx: &ExportContext<'_>,
        records: Vec<CsvImage>,
        archive: &mut ArchiveWriter,
    ) -> Result<(), AnnotixError> {
        let format = ctx.format.name();
        let mut names: BTreeSet<&str> = BTreeSet::new();
        for entry in records.iter().flat_map(|r| &r.entries) {
            match entry {
                CsvEntry::Landmarks { points, .. } => names.extend(points.keys().map(String::as_str)),
                CsvEntry::Keypoints { points, .. } => names.extend(points.keys().map(String::as_str)),
                _ => {}
            }
        }

        let table = match self.layout {
            CsvLayout::Detection => detection_table(&records),
            CsvLayout::Landmarks => landmarks_table(&records, &names),
            CsvLayout::Keypoints => keypoints_table(&records, &names),
            CsvLayout::Classification => classification_table(&records),
        };
        archive.add("annotations.csv", &write_csv(format, &table)?)?;

        let mut classes = vec![vec!["id".to_string(), "name".to_string()]];
        for class in &ctx.project.classes {
            classes.push(vec![class.id.to_string(), class.name.clone()]);
        }
        archive.add("classes.csv", &write_csv(format, &classes)?)
    }
}

// ============================================================================
// Tables
// ============================================================================

type Table = Vec<Vec<String>>;

fn image_cells(record: &CsvImage) -> Vec<String> {
    vec![
        record.filename.clone(),
        record.width.to_string(),
        record.height.to_string(),
    ]
}

fn detection_table(records: &[CsvImage]) -> Table {
    let mut table = vec![["filename", "width", "height", "class", "xmin", "ymin", "xmax", "ymax"]
        .map(String::from)
        .to_vec()];

    for record in records {
        let boxes: Vec<_> = record
            .entries
            .iter()
            .filter_map(|e| match e {
                CsvEntry::Box { class, corners } => Some((class, corners)),
                _ => None,
            })
            .collect();

        if boxes.is_empty() {
            let mut row = image_cells(record);
            row.resize(8, String::new());
            table.push(row);
        }
        for (class, corners) in boxes {
            let mut row = image_cells(record);
            row.push(class.clone());
            row.extend(corners.iter().map(|v| v.to_string()));
            table.push(row);
        }
    }
    table
}

fn landmarks_table(records: &[CsvImage], names: &BTreeSet<&str>) -> Table {
    let mut header: Vec<String> = ["filename", "width", "height", "class"]
        .map(String::from)
        .to_vec();
    for name in names {
        header.push(format!("{name}_x"));
        header.push(format!("{name}_y"));
    }
    let width = header.len();
    let mut table = vec![header];

    for record in records {
        let mut wrote = false;
        for entry in &record.entries {
            let CsvEntry::Landmarks { class, points } = entry else {
                continue;
            };
            let mut row = image_cells(record);
            row.push(class.clone());
            for name in names {
                match points.get(*name) {
                    Some((x, y)) => {
                        row.push(fixed_2(*x));
                        row.push(fixed_2(*y));
                    }
                    None => row.extend([String::new(), String::new()]),
                }
            }
            table.push(row);
            wrote = true;
        }
        if !wrote {
            let mut row = image_cells(record);
            row.resize(width, String::new());
            table.push(row);
        }
    }
    table
}

fn keypoints_table(records: &[CsvImage], names: &BTreeSet<&str>) -> Table {
    let mut header: Vec<String> = ["filename", "width", "height", "class", "instance_id"]
        .map(String::from)
        .to_vec();
    for name in names {
        header.push(format!("{name}_x"));
        header.push(format!("{name}_y"));
        header.push(format!("{name}_visible"));
    }
    let width = header.len();
    let mut table = vec![header];

    for record in records {
        let mut wrote = false;
        for entry in &record.entries {
            let CsvEntry::Keypoints {
                class,
                instance_id,
                points,
            } = entry
            else {
                continue;
            };
            let mut row = image_cells(record);
            row.push(class.clone());
            row.push(instance_id.to_string());
            for name in names {
                match points.get(*name) {
                    Some((x, y, true)) => {
                        row.push(fixed_2(*x));
                        row.push(fixed_2(*y));
                        row.push("1".to_string());
                    }
                    _ => row.extend([String::new(), String::new(), "0".to_string()]),
                }
            }
            table.push(row);
            wrote = true;
        }
        if !wrote {
            let mut row = image_cells(record);
            row.resize(width, String::new());
            table.push(row);
        }
    }
    table
}

fn classification_table(records: &[CsvImage]) -> Table {
    let mut table = vec![vec!["filename".to_string(), "class".to_string()]];
    for record in records {
        let classes = record
            .entries
            .iter()
            .find_map(|e| match e {
                CsvEntry::Classes(names) => Some(names.join(";")),
                _ => None,
            })
            .unwrap_or_default();
        table.push(vec![record.filename.clone(), classes]);
    }
    table
}

/// Two decimals with ties rounded away from zero, as JavaScript's
/// `toFixed(2)` prints them (`1.125 -> "1.13"`).
fn fixed_2(value: f64) -> String {
    let rounded = js_round(value.abs() * 100.0) / 100.0;
    format!("{:.2}", rounded.copysign(value))
}

/// Drops repeated names, keeping first-seen order.
fn dedupe(names: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

fn write_csv(format: &'static str, table: &Table) -> Result<Vec<u8>, AnnotixError> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    for row in table {
        writer
            .write_record(row)
            .map_err(|source| AnnotixError::CsvWrite { format, source })?;
    }
    writer
        .into_inner()
        .map_err(|e| AnnotixError::Io(e.into_error()))
}
