//! YOLO detection and segmentation exporters.
//!
//! # Layout
//!
//! ```text
//! images/<name>
//! labels/<stem>.txt
//! classes.txt
//! data.yaml
//! ```
//!
//! Label rows use the project class id as the class index and coordinates
//! normalized by the image size, clamped to `[0, 1]` and printed in their
//! shortest round-trip decimal form:
//!
//! - detection: `class cx cy w h`
//! - segmentation: `class x1 y1 x2 y2 ...`

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use super::archive::ArchiveWriter;
use super::{
    mask_contours, require_dimensions, ExportContext, ExportIssueCode, Exporter, StagedImage,
};
use crate::error::AnnotixError;
use crate::geometry::bounds;
use crate::ir::{AnnotatedImage, AnnotationData, AnnotationId, BBoxXYXY, ClassId, Coord, Pixel};
use crate::raster::MaskCache;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum YoloTask {
    Detection,
    Segmentation,
}

#[derive(Debug, Serialize)]
struct DataYaml {
    path: &'static str,
    train: &'static str,
    val: &'static str,
    nc: usize,
    names: BTreeMap<u64, String>,
}

#[derive(Debug)]
pub(crate) struct YoloExporter {
    task: YoloTask,
    masks: MaskCache,
}

impl YoloExporter {
    pub(crate) fn new(task: YoloTask) -> Self {
        Self {
            task,
            masks: MaskCache::new(),
        }
    }

    /// Label rows for one annotation. `None` when the task has no
    /// representation for the payload, empty when its geometry is unusable.
    fn rows(
        &mut self,
        ctx: &ExportContext<'_>,
        image: &AnnotatedImage,
        class_id: ClassId,
        data: &AnnotationData,
        id: &AnnotationId,
    ) -> Result<Option<Vec<String>>, AnnotixError> {
        let (w, h) = (f64::from(image.width), f64::from(image.height));

        let shapes: Vec<Vec<Coord<Pixel>>> = match (self.task, data) {
            (YoloTask::Detection, AnnotationData::BBox(b)) => vec![b.corners().to_vec()],
            (YoloTask::Detection, AnnotationData::Obb(obb)) => {
                vec![box_corners(&obb.to_aabb())]
            }
            (YoloTask::Detection, AnnotationData::Polygon(p)) => vec![p.points.clone()],
            (YoloTask::Segmentation, AnnotationData::BBox(b)) => vec![b.corners().to_vec()],
            (YoloTask::Segmentation, AnnotationData::Obb(obb)) => vec![obb.corners().to_vec()],
            (YoloTask::Segmentation, AnnotationData::Polygon(p)) => {
                if p.points.len() < 3 {
                    vec![]
                } else {
                    vec![p.points.clone()]
                }
            }
            (_, AnnotationData::Mask(mask)) => {
                let contours = mask_contours(&mut self.masks, id, mask, ctx.options)?;
                match self.task {
                    YoloTask::Segmentation => contours,
                    YoloTask::Detection => contours
                        .iter()
                        .filter_map(|c| bounds(c))
                        .reduce(|a, b| a.union(&b))
                        .map(|union| vec![box_corners(&union)])
                        .unwrap_or_default(),
                }
            }
            (_, AnnotationData::Keypoints(_))
            | (_, AnnotationData::Landmarks(_))
            | (_, AnnotationData::Classification(_))
            | (_, AnnotationData::MultiLabelClassification(_)) => return Ok(None),
        };

        let rows = shapes
            .iter()
            .filter(|shape| !shape.is_empty() && shape.iter().all(|p| p.is_finite()))
            .filter_map(|shape| match self.task {
                YoloTask::Detection => {
                    let bbox = bounds(shape)?;
                    let (cx, cy, bw, bh) = bbox.to_cxcywh();
                    let center = Coord::<Pixel>::new(cx, cy).to_normalized(w, h);
                    Some(format_row(class_id, &[center.x, center.y, bw / w, bh / h]))
                }
                YoloTask::Segmentation => {
                    let coords: Vec<f64> = shape
                        .iter()
                        .map(|p| p.to_normalized(w, h))
                        .flat_map(|p| [p.x, p.y])
                        .collect();
                    Some(format_row(class_id, &coords))
                }
            })
            .collect();
        Ok(Some(rows))
    }
}

impl Exporter for YoloExporter {
    type Record = ();

    fn write_image(
        &mut self,
        ctx: &ExportContext<'_>,
        _position: usize,
        image: &AnnotatedImage,
        staged: &mut StagedImage,
    ) -> Result<(), AnnotixError> {
        require_dimensions(image)?;
        self.masks.clear();

        let mut label = String::new();
        for annotation in &image.annotations {
            let Some(class_id) = annotation.class_id else {
                staged.missing_class(annotation);
                continue;
            };

            match self.rows(ctx, image, class_id, &annotation.data, &annotation.id)? {
                None => staged.unsupported(ctx, annotation),
                Some(rows) if rows.is_empty() => {
                    staged.empty_geometry(annotation);
                }
                Some(rows) => {
                    if let AnnotationData::Obb(obb) = &annotation.data {
                        if self.task == YoloTask::Detection && obb.normalized_rotation() != 0.0 {
                            staged.note(
                                ExportIssueCode::ObbRotationDropped,
                                format!(
                                    "obb annotation {} written as its axis-aligned box",
                                    annotation.id
                                ),
                            );
                        }
                    }
                    for row in rows {
                        label.push_str(&row);
                        label.push('\n');
                    }
                    staged.wrote_annotation();
                }
            }
        }

        staged.add_file(format!("labels/{}.txt", image.file_stem()), label.into_bytes());
        staged.copy_image("images", image);
        Ok(())
    }

    fn finish(
        &mut self,
        ctx: &ExportContext<'_>,
        _records: Vec<()>,
        archive: &mut ArchiveWriter,
    ) -> Result<(), AnnotixError> {
        let classes = ctx.project.classes_by_id();

        let mut classes_txt = String::new();
        for class in &classes {
            classes_txt.push_str(&class.name);
            classes_txt.push('\n');
        }
        archive.add("classes.txt", classes_txt.as_bytes())?;

        let data = DataYaml {
            path: ".",
            train: "images",
            val: "images",
            nc: classes.len(),
            names: classes
                .iter()
                .map(|c| (c.id.as_u64(), c.name.clone()))
                .collect(),
        };
        let yaml = serde_yaml::to_string(&data).map_err(|e| AnnotixError::Serialize {
            format: ctx.format.name(),
            message: e.to_string(),
        })?;
        archive.add("data.yaml", yaml.as_bytes())
    }
}

fn box_corners(bbox: &BBoxXYXY<Pixel>) -> Vec<Coord<Pixel>> {
    vec![
        Coord::new(bbox.xmin(), bbox.ymin()),
        Coord::new(bbox.xmax(), bbox.ymin()),
        Coord::new(bbox.xmax(), bbox.ymax()),
        Coord::new(bbox.xmin(), bbox.ymax()),
    ]
}

/// `class v1 v2 ...` with each value clamped to `[0, 1]`.
fn format_row(class_id: ClassId, values: &[f64]) -> String {
    let mut row = class_id.to_string();
    for value in values {
        // `+ 0.0` turns a clamped -0.0 into 0.0
        let v = value.clamp(0.0, 1.0) + 0.0;
        write!(row, " {}", v).expect("write to string");
    }
    row
}
