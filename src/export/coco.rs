//! COCO exporter.
//!
//! # Layout
//!
//! ```text
//! annotations.json
//! images/<name>
//! ```
//!
//! Image ids are 1-based positions among annotated images; annotation ids
//! are assigned 1-based in output order once every image is committed, so
//! a skipped image leaves no gap in them. Category ids are project class
//! ids.
//!
//! Boxes use `[x, y, width, height]` in absolute pixels. OBBs are written
//! as the axis-aligned box of their rotated corners; masks are traced into
//! polygons.

use serde::Serialize;

use super::archive::ArchiveWriter;
use super::{mask_contours, ExportContext, ExportIssueCode, Exporter, StagedImage};
use crate::error::AnnotixError;
use crate::geometry::{bounds, flatten, shoelace_area};
use crate::ir::skeleton::{self, SkeletonPreset};
use crate::ir::{AnnotatedImage, AnnotationData, BBoxXYXY, KeypointsData, Pixel, ProjectType};
use crate::raster::MaskCache;

const CONTRIBUTOR: &str = "Annotix - TecMedHub FabLab";

// ============================================================================
// COCO Schema Types
// ============================================================================

#[derive(Debug, Serialize)]
struct CocoDataset {
    info: CocoInfo,
    licenses: Vec<serde_json::Value>,
    images: Vec<CocoImage>,
    annotations: Vec<CocoAnnotation>,
    categories: Vec<CocoCategory>,
}

#[derive(Debug, Serialize)]
struct CocoInfo {
    description: String,
    version: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    year: Option<u32>,

    contributor: &'static str,
    date_created: String,
}

#[derive(Debug, Serialize)]
struct CocoImage {
    id: u64,
    width: u32,
    height: u32,
    file_name: String,
    date_captured: String,
}

#[derive(Debug, Serialize)]
struct CocoCategory {
    id: u64,
    name: String,
    supercategory: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    keypoints: Option<Vec<&'static str>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    skeleton: Option<Vec<[usize; 2]>>,
}

#[derive(Debug, Serialize)]
struct CocoAnnotation {
    id: u64,
    image_id: u64,
    category_id: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    segmentation: Option<Vec<Vec<f64>>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    area: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    bbox: Option<[f64; 4]>,

    iscrowd: u8,

    #[serde(skip_serializing_if = "Option::is_none")]
    keypoints: Option<Vec<f64>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    num_keypoints: Option<usize>,
}

// ============================================================================
// Exporter
// ============================================================================

#[derive(Debug, Default)]
pub(crate) struct CocoExporter {
    masks: MaskCache,
}

pub(crate) struct CocoRecord {
    image: CocoImage,
    annotations: Vec<CocoAnnotation>,
    skeleton: Option<&'static SkeletonPreset>,
}

impl Exporter for CocoExporter {
    type Record = CocoRecord;

    fn write_image(
        &mut self,
        ctx: &ExportContext<'_>,
        position: usize,
        image: &AnnotatedImage,
        staged: &mut StagedImage,
    ) -> Result<CocoRecord, AnnotixError> {
        self.masks.clear();
        let image_id = position as u64 + 1;
        let mut record = CocoRecord {
            image: CocoImage {
                id: image_id,
                width: image.width,
                height: image.height,
                file_name: image.name.clone(),
                date_captured: String::new(),
            },
            annotations: Vec::new(),
            skeleton: None,
        };

        for annotation in &image.annotations {
            let Some(class_id) = annotation.class_id else {
                staged.missing_class(annotation);
                continue;
            };
            let mut coco = CocoAnnotation {
                id: 0,
                image_id,
                category_id: class_id.as_u64(),
                segmentation: None,
                area: None,
                bbox: None,
                iscrowd: 0,
                keypoints: None,
                num_keypoints: None,
            };

            let written = match &annotation.data {
                AnnotationData::BBox(b) => {
                    coco.bbox = Some([b.x, b.y, b.width, b.height]);
                    coco.area = Some(b.width * b.height);
                    true
                }
                AnnotationData::Obb(obb) => {
                    let aabb = obb.to_aabb();
                    set_box(&mut coco, &aabb);
                    if obb.normalized_rotation() != 0.0 {
                        staged.note(
                            ExportIssueCode::ObbRotationDropped,
                            format!(
                                "obb annotation {} written as its axis-aligned box; rotation {} dropped",
                                annotation.id, obb.rotation
                            ),
                        );
                    }
                    true
                }
                AnnotationData::Polygon(polygon) => match bounds(&polygon.points) {
                    Some(bbox) if polygon.points.len() >= 3 => {
                        coco.segmentation = Some(vec![flatten(&polygon.points)]);
                        coco.bbox = Some(xywh(&bbox));
                        coco.area = Some(shoelace_area(&polygon.points));
                        true
                    }
                    _ => staged.empty_geometry(annotation),
                },
                AnnotationData::Mask(mask) => {
                    let contours =
                        mask_contours(&mut self.masks, &annotation.id, mask, ctx.options)?;
                    let union = contours
                        .iter()
                        .filter_map(|c| bounds(c))
                        .reduce(|a, b| a.union(&b));
                    match union {
                        Some(bbox) => {
                            coco.area = Some(contours.iter().map(|c| shoelace_area(c)).sum());
                            coco.segmentation =
                                Some(contours.iter().map(|c| flatten(c)).collect());
                            coco.bbox = Some(xywh(&bbox));
                            true
                        }
                        None => staged.empty_geometry(annotation),
                    }
                }
                AnnotationData::Keypoints(keypoints) => {
                    set_keypoints(&mut coco, keypoints);
                    if record.skeleton.is_none() {
                        record.skeleton = skeleton::preset(&keypoints.skeleton_type);
                    }
                    true
                }
                AnnotationData::Landmarks(_)
                | AnnotationData::Classification(_)
                | AnnotationData::MultiLabelClassification(_) => {
                    staged.unsupported(ctx, annotation);
                    false
                }
            };

            if written {
                staged.wrote_annotation();
                record.annotations.push(coco);
            }
        }

        staged.copy_image("images", image);
        Ok(record)
    }

    fn finish(
        &mut self,
        ctx: &ExportContext<'_>,
        records: Vec<CocoRecord>,
        archive: &mut ArchiveWriter,
    ) -> Result<(), AnnotixError> {
        let project = ctx.project;
        // keypoint projects describe the first known preset their annotations use
        let preset = if project.project_type == ProjectType::Keypoints {
            records
                .iter()
                .find_map(|r| r.skeleton)
                .or_else(|| skeleton::preset(skeleton::DEFAULT_PRESET_ID))
        } else {
            None
        };

        let categories = project
            .classes
            .iter()
            .map(|class| CocoCategory {
                id: class.id.as_u64(),
                name: class.name.clone(),
                supercategory: "none",
                keypoints: preset.map(|p| p.keypoints.to_vec()),
                skeleton: preset.map(|p| p.one_based_connections()),
            })
            .collect();

        let date_created = project.metadata.created.clone().unwrap_or_default();
        let mut dataset = CocoDataset {
            info: CocoInfo {
                description: format!("{} - COCO format dataset", project.name),
                version: "1.0",
                year: year_of(&date_created),
                contributor: CONTRIBUTOR,
                date_created,
            },
            licenses: Vec::new(),
            images: Vec::with_capacity(records.len()),
            annotations: Vec::new(),
            categories,
        };

        for mut record in records {
            record.image.date_captured.clone_from(&dataset.info.date_created);
            dataset.images.push(record.image);
            dataset.annotations.extend(record.annotations);
        }
        for (idx, annotation) in dataset.annotations.iter_mut().enumerate() {
            annotation.id = idx as u64 + 1;
        }

        let json = serde_json::to_vec_pretty(&dataset).map_err(|e| AnnotixError::Serialize {
            format: "coco",
            message: e.to_string(),
        })?;
        archive.add("annotations.json", &json)
    }
}

fn xywh(bbox: &BBoxXYXY<Pixel>) -> [f64; 4] {
    let (x, y, w, h) = bbox.to_xywh();
    [x, y, w, h]
}

fn set_box(coco: &mut CocoAnnotation, bbox: &BBoxXYXY<Pixel>) {
    coco.bbox = Some(xywh(bbox));
    coco.area = Some(bbox.area());
}

/// `[x, y, v]` triples with `v` 2 for visible points and 0 otherwise; the
/// box and area cover visible points only.
fn set_keypoints(coco: &mut CocoAnnotation, keypoints: &KeypointsData) {
    let flat = keypoints
        .points
        .iter()
        .flat_map(|p| [p.x, p.y, if p.visible { 2.0 } else { 0.0 }])
        .collect();
    let visible: Vec<_> = keypoints
        .points
        .iter()
        .filter(|p| p.visible)
        .map(|p| p.coord())
        .collect();

    coco.keypoints = Some(flat);
    coco.num_keypoints = Some(visible.len());
    if let Some(bbox) = bounds(&visible) {
        set_box(coco, &bbox);
    }
}

fn year_of(date: &str) -> Option<u32> {
    date.get(..4)?.parse().ok()
}
