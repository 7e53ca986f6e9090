//! Core project model for annotix.
//!
//! Annotations are stored records owned by the annotation store; this module
//! gives them a closed, strongly typed shape so every consumer matches on
//! [`AnnotationData`] exhaustively.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::bbox::BBoxXYXY;
use super::coord::Coord;
use super::ids::{AnnotationId, ClassId, ImageId};
use super::space::Pixel;
use crate::error::AnnotixError;
use crate::geometry;

/// A labeling project: its task type and class list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,

    #[serde(rename = "type")]
    pub project_type: ProjectType,

    #[serde(default)]
    pub classes: Vec<ClassDefinition>,

    #[serde(default)]
    pub metadata: ProjectMetadata,
}

impl Project {
    pub fn new(
        name: impl Into<String>,
        project_type: ProjectType,
        classes: Vec<ClassDefinition>,
    ) -> Self {
        Self {
            name: name.into(),
            project_type,
            classes,
            metadata: ProjectMetadata::default(),
        }
    }

    /// Looks up a class definition by id.
    pub fn class(&self, id: ClassId) -> Option<&ClassDefinition> {
        self.classes.iter().find(|c| c.id == id)
    }

    /// Looks up a class name by id.
    pub fn class_name(&self, id: ClassId) -> Option<&str> {
        self.class(id).map(|c| c.name.as_str())
    }

    /// Class definitions ordered by ascending id.
    pub fn classes_by_id(&self) -> Vec<&ClassDefinition> {
        let mut classes: Vec<&ClassDefinition> = self.classes.iter().collect();
        classes.sort_by_key(|c| c.id);
        classes
    }
}

/// Free-form project bookkeeping carried along with exports.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Creation date (ISO 8601 or similar).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Task type of a project.
///
/// Time-series and audio project types exist in the wider tool but carry no
/// image geometry; they deserialize as [`ProjectType::Other`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectType {
    Bbox,
    Mask,
    Polygon,
    Keypoints,
    Landmarks,
    Obb,
    Classification,
    MultiLabelClassification,
    InstanceSegmentation,
    #[serde(other)]
    Other,
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProjectType::Bbox => "bbox",
            ProjectType::Mask => "mask",
            ProjectType::Polygon => "polygon",
            ProjectType::Keypoints => "keypoints",
            ProjectType::Landmarks => "landmarks",
            ProjectType::Obb => "obb",
            ProjectType::Classification => "classification",
            ProjectType::MultiLabelClassification => "multi-label-classification",
            ProjectType::InstanceSegmentation => "instance-segmentation",
            ProjectType::Other => "other",
        };
        f.write_str(name)
    }
}

/// A class (label) defined by the project.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassDefinition {
    pub id: ClassId,
    pub name: String,

    /// `#RRGGBB` display color. Not structural.
    #[serde(default)]
    pub color: String,
}

impl ClassDefinition {
    pub fn new(id: impl Into<ClassId>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
        }
    }
}

/// An image with its encoded bytes and completed annotations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedImage {
    pub id: ImageId,

    /// Original file name, kept verbatim inside archives.
    pub name: String,

    pub width: u32,
    pub height: u32,

    /// Encoded original image file.
    #[serde(
        default,
        rename = "data",
        with = "super::io_json::base64_bytes",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub bytes: Vec<u8>,

    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl AnnotatedImage {
    pub fn new(id: impl Into<ImageId>, name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            width,
            height,
            bytes: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Builds an image from encoded bytes, reading its dimensions from the
    /// file header.
    pub fn from_bytes(
        id: impl Into<ImageId>,
        name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, AnnotixError> {
        let name = name.into();
        let size = imagesize::blob_size(&bytes).map_err(|source| {
            AnnotixError::ImageDimensionRead {
                name: name.clone(),
                source,
            }
        })?;
        let width = u32::try_from(size.width).map_err(|_| AnnotixError::ProjectInvalid {
            message: format!("image '{name}' width {} does not fit in u32", size.width),
        })?;
        let height = u32::try_from(size.height).map_err(|_| AnnotixError::ProjectInvalid {
            message: format!("image '{name}' height {} does not fit in u32", size.height),
        })?;

        Ok(Self {
            id: id.into(),
            name,
            width,
            height,
            bytes,
            annotations: Vec::new(),
        })
    }

    pub fn with_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.bytes = bytes;
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }

    /// File name without its final extension (`"a.b.jpg"` -> `"a.b"`).
    pub fn file_stem(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) if !self.name[idx + 1..].is_empty() && !self.name[idx..].contains('/') => {
                &self.name[..idx]
            }
            _ => &self.name,
        }
    }
}

// ============================================================================
// Annotations
// ============================================================================

/// Discriminant of an annotation payload, as written in the `type` field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnnotationKind {
    Bbox,
    Mask,
    Polygon,
    Keypoints,
    Landmarks,
    Obb,
    Classification,
    MultiLabelClassification,
}

impl AnnotationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationKind::Bbox => "bbox",
            AnnotationKind::Mask => "mask",
            AnnotationKind::Polygon => "polygon",
            AnnotationKind::Keypoints => "keypoints",
            AnnotationKind::Landmarks => "landmarks",
            AnnotationKind::Obb => "obb",
            AnnotationKind::Classification => "classification",
            AnnotationKind::MultiLabelClassification => "multi-label-classification",
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored annotation record.
///
/// Serialized as `{"id", "type", "classId", "data"}`. Deserialization
/// rejects a `data` object whose shape does not match `type`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "AnnotationRecord")]
pub struct Annotation {
    pub id: AnnotationId,

    /// Optional for multi-label sets whose classes live in `data.labels`.
    pub class_id: Option<ClassId>,

    pub data: AnnotationData,
}

impl Annotation {
    pub fn new(
        id: impl Into<AnnotationId>,
        class_id: impl Into<ClassId>,
        data: AnnotationData,
    ) -> Self {
        Self {
            id: id.into(),
            class_id: Some(class_id.into()),
            data,
        }
    }

    /// Creates an annotation with a freshly generated UUID v4 id.
    pub fn generated(class_id: Option<ClassId>, data: AnnotationData) -> Self {
        Self {
            id: AnnotationId::generate(),
            class_id,
            data,
        }
    }

    pub fn without_class(mut self) -> Self {
        self.class_id = None;
        self
    }

    #[inline]
    pub fn kind(&self) -> AnnotationKind {
        self.data.kind()
    }
}

impl Serialize for Annotation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let field_count = if self.class_id.is_some() { 4 } else { 3 };
        let mut state = serializer.serialize_struct("Annotation", field_count)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("type", &self.kind())?;
        if let Some(class_id) = self.class_id {
            state.serialize_field("classId", &class_id)?;
        }
        match &self.data {
            AnnotationData::BBox(d) => state.serialize_field("data", d)?,
            AnnotationData::Obb(d) => state.serialize_field("data", d)?,
            AnnotationData::Polygon(d) => state.serialize_field("data", d)?,
            AnnotationData::Mask(d) => state.serialize_field("data", d)?,
            AnnotationData::Keypoints(d) => state.serialize_field("data", d)?,
            AnnotationData::Landmarks(d) => state.serialize_field("data", d)?,
            AnnotationData::Classification(d) => state.serialize_field("data", d)?,
            AnnotationData::MultiLabelClassification(d) => state.serialize_field("data", d)?,
        }
        state.end()
    }
}

/// Wire form of [`Annotation`] before `data` is checked against `type`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotationRecord {
    id: AnnotationId,
    #[serde(rename = "type")]
    kind: AnnotationKind,
    #[serde(default)]
    class_id: Option<ClassId>,
    data: serde_json::Value,
}

impl TryFrom<AnnotationRecord> for Annotation {
    type Error = String;

    fn try_from(record: AnnotationRecord) -> Result<Self, Self::Error> {
        fn payload<T: serde::de::DeserializeOwned>(
            kind: AnnotationKind,
            value: serde_json::Value,
        ) -> Result<T, String> {
            serde_json::from_value(value)
                .map_err(|e| format!("data does not match annotation type '{kind}': {e}"))
        }

        let kind = record.kind;
        let value = record.data;
        let data = match kind {
            AnnotationKind::Bbox => AnnotationData::BBox(payload(kind, value)?),
            AnnotationKind::Obb => AnnotationData::Obb(payload(kind, value)?),
            AnnotationKind::Polygon => AnnotationData::Polygon(payload(kind, value)?),
            AnnotationKind::Mask => AnnotationData::Mask(payload(kind, value)?),
            AnnotationKind::Keypoints => AnnotationData::Keypoints(payload(kind, value)?),
            AnnotationKind::Landmarks => AnnotationData::Landmarks(payload(kind, value)?),
            AnnotationKind::Classification => {
                AnnotationData::Classification(payload(kind, value)?)
            }
            AnnotationKind::MultiLabelClassification => {
                AnnotationData::MultiLabelClassification(payload(kind, value)?)
            }
        };

        Ok(Annotation {
            id: record.id,
            class_id: record.class_id,
            data,
        })
    }
}

/// Annotation payload, one variant per annotation type.
#[derive(Clone, Debug, PartialEq)]
pub enum AnnotationData {
    BBox(BBoxData),
    Obb(ObbData),
    Polygon(PolygonData),
    Mask(MaskData),
    Keypoints(KeypointsData),
    Landmarks(LandmarksData),
    Classification(ClassificationData),
    MultiLabelClassification(ClassificationData),
}

impl AnnotationData {
    pub fn kind(&self) -> AnnotationKind {
        match self {
            AnnotationData::BBox(_) => AnnotationKind::Bbox,
            AnnotationData::Obb(_) => AnnotationKind::Obb,
            AnnotationData::Polygon(_) => AnnotationKind::Polygon,
            AnnotationData::Mask(_) => AnnotationKind::Mask,
            AnnotationData::Keypoints(_) => AnnotationKind::Keypoints,
            AnnotationData::Landmarks(_) => AnnotationKind::Landmarks,
            AnnotationData::Classification(_) => AnnotationKind::Classification,
            AnnotationData::MultiLabelClassification(_) => {
                AnnotationKind::MultiLabelClassification
            }
        }
    }
}

/// Top-left corner plus extent, in original image pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BBoxData {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BBoxData {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_xyxy(bbox: &BBoxXYXY<Pixel>) -> Self {
        let (x, y, width, height) = bbox.to_xywh();
        Self::new(x, y, width, height)
    }

    pub fn to_xyxy(&self) -> BBoxXYXY<Pixel> {
        BBoxXYXY::from_xywh(self.x, self.y, self.width, self.height)
    }

    /// The four corners, clockwise from top-left.
    pub fn corners(&self) -> [Coord<Pixel>; 4] {
        [
            Coord::new(self.x, self.y),
            Coord::new(self.x + self.width, self.y),
            Coord::new(self.x + self.width, self.y + self.height),
            Coord::new(self.x, self.y + self.height),
        ]
    }
}

/// Oriented box: center, extent and rotation in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObbData {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
}

impl ObbData {
    pub fn new(x: f64, y: f64, width: f64, height: f64, rotation: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotation,
        }
    }

    /// Rotation folded into `[0, 360)`.
    pub fn normalized_rotation(&self) -> f64 {
        let r = self.rotation.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360 for tiny negative inputs
        if r >= 360.0 {
            0.0
        } else {
            r
        }
    }

    pub fn center(&self) -> Coord<Pixel> {
        Coord::new(self.x, self.y)
    }

    /// The rotated corners, starting from the local top-left.
    pub fn corners(&self) -> [Coord<Pixel>; 4] {
        geometry::obb_corners(self)
    }

    /// Axis-aligned bounds of the rotated corners.
    pub fn to_aabb(&self) -> BBoxXYXY<Pixel> {
        geometry::obb_to_aabb(self)
    }
}

fn default_closed() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolygonData {
    pub points: Vec<Coord<Pixel>>,
    #[serde(default = "default_closed")]
    pub closed: bool,
}

impl PolygonData {
    pub fn closed(points: Vec<Coord<Pixel>>) -> Self {
        Self {
            points,
            closed: true,
        }
    }
}

/// A raster mask drawn by the user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MaskData {
    /// PNG bytes, base64 encoded, optionally as a `data:` URL. Alpha above
    /// 128 marks foreground.
    pub base64png: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<u32>,
}

impl MaskData {
    pub fn new(base64png: impl Into<String>) -> Self {
        Self {
            base64png: base64png.into(),
            instance_id: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,

    /// Whether the point was placed. COCO's "labeled but occluded" state is
    /// not tracked.
    #[serde(default)]
    pub visible: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Keypoint {
    pub fn new(x: f64, y: f64, visible: bool) -> Self {
        Self {
            x,
            y,
            visible,
            name: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn coord(&self) -> Coord<Pixel> {
        Coord::new(self.x, self.y)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KeypointsData {
    pub points: Vec<Keypoint>,

    /// Skeleton preset id, see [`crate::ir::skeleton`].
    #[serde(default)]
    pub skeleton_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub name: String,
}

impl Landmark {
    pub fn new(x: f64, y: f64, name: impl Into<String>) -> Self {
        Self {
            x,
            y,
            name: name.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LandmarksData {
    pub points: Vec<Landmark>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassificationData {
    #[serde(default)]
    pub labels: Vec<ClassId>,
}
