//! Intermediate Representation (IR) for annotix.
//!
//! This module defines the typed annotation records every other part of
//! the crate consumes: projects, class definitions, annotated images and
//! the closed [`AnnotationData`] sum type.
//!
//! # Design Principles
//!
//! 1. **Type Safety**: Marker types keep original-image pixels, letterboxed
//!    model-input coordinates and normalized label coordinates apart at
//!    compile time.
//!
//! 2. **Stored Shape**: Records serialize exactly as the annotation store
//!    writes them (`{"id", "type", "classId", "data"}`), so they can be
//!    persisted verbatim.
//!
//! 3. **Permissive Construction**: Geometry may be out of bounds or
//!    malformed; validation reports issues rather than constructors
//!    panicking.
//!
//! # Example
//!
//! ```
//! use annotix::ir::{
//!     AnnotatedImage, Annotation, AnnotationData, BBoxData, ClassDefinition, Project,
//!     ProjectType,
//! };
//!
//! let project = Project::new(
//!     "Birds",
//!     ProjectType::Bbox,
//!     vec![ClassDefinition::new(0u64, "sparrow", "#ff8800")],
//! );
//! let image = AnnotatedImage::new(1u64, "nest.jpg", 640, 480).with_annotation(
//!     Annotation::new("a1", 0u64, AnnotationData::BBox(BBoxData::new(10.0, 20.0, 90.0, 180.0))),
//! );
//! assert_eq!(project.class_name(image.annotations[0].class_id.unwrap()), Some("sparrow"));
//! ```

mod bbox;
mod coord;
mod ids;
pub mod io_json;
mod model;
pub mod skeleton;
mod space;

pub use bbox::BBoxXYXY;
pub use coord::Coord;
pub use ids::{AnnotationId, ClassId, ImageId};
pub use model::{
    AnnotatedImage, Annotation, AnnotationData, AnnotationKind, BBoxData, ClassDefinition,
    ClassificationData, Keypoint, KeypointsData, Landmark, LandmarksData, MaskData, ObbData,
    PolygonData, Project, ProjectMetadata, ProjectType,
};
pub use space::{Canvas, Normalized, Pixel};
