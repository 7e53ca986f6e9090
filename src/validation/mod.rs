//! Project validation for annotix.
//!
//! This module checks a project and its annotated images before export:
//! - Structural integrity (unique IDs, valid class references)
//! - Data quality (non-empty names, valid colors, positive dimensions)
//! - Geometric validity (finite coordinates, non-negative extents, within
//!   image bounds)
//!
//! Errors mark data an exporter would misrepresent; warnings mark data that
//! exports but probably not the way the user intended.

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use std::collections::{HashMap, HashSet};

use crate::error::AnnotixError;
use crate::ir::{
    skeleton, AnnotatedImage, Annotation, AnnotationData, AnnotationId, ClassId, Coord, ImageId,
    Pixel, Project,
};

/// Slack in pixels before geometry counts as outside its image.
const BOUNDS_TOLERANCE: f64 = 0.5;

/// Options for validation behavior.
#[derive(Clone, Debug, Default)]
pub struct ValidateOptions {
    /// If true, treat warnings as errors.
    pub strict: bool,
}

/// Validates a project and returns a report of all issues found.
///
/// This function performs comprehensive validation including:
/// - Checking for duplicate IDs (classes, images, annotations)
/// - Verifying every `classId` and classification label names a class
/// - Validating image dimensions are positive and filenames non-empty
/// - Checking geometry is finite, non-negative and within the image
pub fn validate_project(
    project: &Project,
    images: &[AnnotatedImage],
    _opts: &ValidateOptions,
) -> ValidationReport {
    let mut report = ValidationReport::new();

    let class_ids: HashSet<ClassId> = project.classes.iter().map(|c| c.id).collect();

    validate_classes(project, &mut report);
    validate_images(images, &mut report);
    validate_annotations(images, &class_ids, &mut report);

    report
}

/// Runs [`validate_project`] and fails when the report has errors, or any
/// warning under [`ValidateOptions::strict`].
pub fn ensure_valid(
    project: &Project,
    images: &[AnnotatedImage],
    opts: &ValidateOptions,
) -> Result<ValidationReport, AnnotixError> {
    let report = validate_project(project, images, opts);
    let error_count = report.error_count();
    let warning_count = report.warning_count();

    if error_count > 0 || (opts.strict && warning_count > 0) {
        return Err(AnnotixError::ValidationFailed {
            error_count,
            warning_count,
            report,
        });
    }
    Ok(report)
}

/// Validates the project's class definitions.
fn validate_classes(project: &Project, report: &mut ValidationReport) {
    let mut seen_ids: HashMap<ClassId, usize> = HashMap::new();
    let mut seen_names: HashMap<&str, ClassId> = HashMap::new();

    for (idx, class) in project.classes.iter().enumerate() {
        let id = class.id.as_u64();

        // Check for duplicate IDs
        if let Some(first_idx) = seen_ids.get(&class.id) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateClassId,
                format!(
                    "Duplicate class ID {} (first seen at index {})",
                    id, first_idx
                ),
                IssueContext::Class { id },
            ));
        } else {
            seen_ids.insert(class.id, idx);
        }

        if class.name.is_empty() {
            report.add(ValidationIssue::warning(
                IssueCode::EmptyClassName,
                "Empty class name",
                IssueContext::Class { id },
            ));
        } else if let Some(first_id) = seen_names.get(class.name.as_str()) {
            report.add(ValidationIssue::warning(
                IssueCode::DuplicateClassName,
                format!(
                    "Duplicate class name '{}' (also used by class {})",
                    class.name, first_id
                ),
                IssueContext::Class { id },
            ));
        } else {
            seen_names.insert(&class.name, class.id);
        }

        if !is_hex_color(&class.color) {
            report.add(ValidationIssue::warning(
                IssueCode::InvalidClassColor,
                format!("Color '{}' is not #RRGGBB", class.color),
                IssueContext::Class { id },
            ));
        }
    }
}

/// Validates image records, ignoring their annotations.
fn validate_images(images: &[AnnotatedImage], report: &mut ValidationReport) {
    let mut seen_ids: HashMap<ImageId, usize> = HashMap::new();

    for (idx, image) in images.iter().enumerate() {
        let id = image.id.as_u64();

        if let Some(first_idx) = seen_ids.get(&image.id) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateImageId,
                format!(
                    "Duplicate image ID {} (first seen at index {})",
                    id, first_idx
                ),
                IssueContext::Image { id },
            ));
        } else {
            seen_ids.insert(image.id, idx);
        }

        if image.width == 0 || image.height == 0 {
            report.add(ValidationIssue::error(
                IssueCode::InvalidImageDimensions,
                format!(
                    "Invalid dimensions {}x{} (must be positive)",
                    image.width, image.height
                ),
                IssueContext::Image { id },
            ));
        }

        if image.name.is_empty() {
            report.add(ValidationIssue::warning(
                IssueCode::EmptyFileName,
                "Empty filename",
                IssueContext::Image { id },
            ));
        }

        if image.annotations.is_empty() {
            report.add(ValidationIssue::warning(
                IssueCode::ImageWithoutAnnotations,
                format!("Image '{}' has no annotations and will not be exported", image.name),
                IssueContext::Image { id },
            ));
        }
    }
}

/// Validates every annotation across all images.
fn validate_annotations(
    images: &[AnnotatedImage],
    class_ids: &HashSet<ClassId>,
    report: &mut ValidationReport,
) {
    // Annotation ids are project-wide, not per image.
    let mut seen_ids: HashMap<&AnnotationId, u64> = HashMap::new();

    for image in images {
        let image_id = image.id.as_u64();

        for annotation in &image.annotations {
            let ctx = IssueContext::Annotation {
                image: image_id,
                id: annotation.id.to_string(),
            };

            if let Some(first_image) = seen_ids.get(&annotation.id) {
                report.add(ValidationIssue::error(
                    IssueCode::DuplicateAnnotationId,
                    format!(
                        "Duplicate annotation ID {} (first seen in image {})",
                        annotation.id, first_image
                    ),
                    ctx.clone(),
                ));
            } else {
                seen_ids.insert(&annotation.id, image_id);
            }

            if let Some(class_id) = annotation.class_id {
                if !class_ids.contains(&class_id) {
                    report.add(ValidationIssue::error(
                        IssueCode::UnknownClassRef,
                        format!("References non-existent class {}", class_id),
                        ctx.clone(),
                    ));
                }
            }

            validate_geometry(image, annotation, class_ids, &ctx, report);
        }
    }
}

/// Checks one annotation's payload.
fn validate_geometry(
    image: &AnnotatedImage,
    annotation: &Annotation,
    class_ids: &HashSet<ClassId>,
    ctx: &IssueContext,
    report: &mut ValidationReport,
) {
    let points: Vec<Coord<Pixel>> = match &annotation.data {
        AnnotationData::BBox(b) => {
            if ![b.x, b.y, b.width, b.height].iter().all(|v| v.is_finite()) {
                not_finite(ctx, report);
                return;
            }
            if b.width < 0.0 || b.height < 0.0 {
                negative_extent(b.width, b.height, ctx, report);
                return;
            }
            b.corners().to_vec()
        }
        AnnotationData::Obb(obb) => {
            if ![obb.x, obb.y, obb.width, obb.height, obb.rotation]
                .iter()
                .all(|v| v.is_finite())
            {
                not_finite(ctx, report);
                return;
            }
            if obb.width < 0.0 || obb.height < 0.0 {
                negative_extent(obb.width, obb.height, ctx, report);
                return;
            }
            if !(0.0..360.0).contains(&obb.rotation) {
                report.add(ValidationIssue::warning(
                    IssueCode::RotationOutOfRange,
                    format!(
                        "Rotation {} is outside [0, 360) and will be normalized",
                        obb.rotation
                    ),
                    ctx.clone(),
                ));
            }
            obb.corners().to_vec()
        }
        AnnotationData::Polygon(polygon) => {
            if polygon.closed && polygon.points.len() < 3 {
                report.add(ValidationIssue::error(
                    IssueCode::PolygonTooFewPoints,
                    format!(
                        "Closed polygon has {} point(s), needs at least 3",
                        polygon.points.len()
                    ),
                    ctx.clone(),
                ));
            }
            polygon.points.clone()
        }
        AnnotationData::Keypoints(keypoints) => {
            let preset = &keypoints.skeleton_type;
            if !preset.is_empty() && skeleton::preset(preset).is_none() {
                report.add(ValidationIssue::warning(
                    IssueCode::UnknownSkeleton,
                    format!("Unknown skeleton preset '{}'", preset),
                    ctx.clone(),
                ));
            }
            keypoints.points.iter().map(|p| p.coord()).collect()
        }
        AnnotationData::Landmarks(landmarks) => landmarks
            .points
            .iter()
            .map(|p| Coord::new(p.x, p.y))
            .collect(),
        AnnotationData::Classification(c) | AnnotationData::MultiLabelClassification(c) => {
            for label in &c.labels {
                if !class_ids.contains(label) {
                    report.add(ValidationIssue::error(
                        IssueCode::UnknownLabelRef,
                        format!("Label references non-existent class {}", label),
                        ctx.clone(),
                    ));
                }
            }
            return;
        }
        // Mask bounds are the image itself; decoding is left to export.
        AnnotationData::Mask(_) => return,
    };

    if !points.iter().all(|p| p.is_finite()) {
        not_finite(ctx, report);
        return;
    }

    if image.width > 0 && image.height > 0 {
        let (w, h) = (f64::from(image.width), f64::from(image.height));
        let outside = points.iter().any(|p| {
            p.x < -BOUNDS_TOLERANCE
                || p.y < -BOUNDS_TOLERANCE
                || p.x > w + BOUNDS_TOLERANCE
                || p.y > h + BOUNDS_TOLERANCE
        });
        if outside {
            report.add(ValidationIssue::warning(
                IssueCode::GeometryOutOfBounds,
                format!(
                    "{} geometry extends outside image bounds ({}x{})",
                    annotation.kind().as_str(),
                    image.width,
                    image.height
                ),
                ctx.clone(),
            ));
        }
    }
}

fn not_finite(ctx: &IssueContext, report: &mut ValidationReport) {
    report.add(ValidationIssue::error(
        IssueCode::GeometryNotFinite,
        "Geometry contains non-finite values (NaN or Inf)",
        ctx.clone(),
    ));
}

fn negative_extent(width: f64, height: f64, ctx: &IssueContext, report: &mut ValidationReport) {
    report.add(ValidationIssue::error(
        IssueCode::NegativeExtent,
        format!("Negative extent {}x{}", width, height),
        ctx.clone(),
    ));
}

fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{
        BBoxData, ClassDefinition, ClassificationData, Keypoint, KeypointsData, ObbData,
        PolygonData, ProjectType,
    };

    fn make_project() -> Project {
        Project::new(
            "test",
            ProjectType::Bbox,
            vec![ClassDefinition::new(1u64, "person", "#ff0000")],
        )
    }

    fn make_image(annotations: Vec<Annotation>) -> AnnotatedImage {
        AnnotatedImage::new(1u64, "test.jpg", 640, 480).with_annotations(annotations)
    }

    fn bbox(id: &str, x: f64, y: f64, w: f64, h: f64) -> Annotation {
        Annotation::new(id, 1u64, AnnotationData::BBox(BBoxData::new(x, y, w, h)))
    }

    #[test]
    fn test_valid_project() {
        let project = make_project();
        let images = vec![make_image(vec![bbox("a1", 10.0, 10.0, 90.0, 90.0)])];
        let report = validate_project(&project, &images, &ValidateOptions::default());
        assert!(report.is_clean(), "Expected no issues: {}", report);
    }

    #[test]
    fn test_duplicate_ids() {
        let mut project = make_project();
        project
            .classes
            .push(ClassDefinition::new(1u64, "car", "#00ff00"));
        let images = vec![
            make_image(vec![bbox("a1", 10.0, 10.0, 20.0, 20.0)]),
            make_image(vec![bbox("a1", 10.0, 10.0, 20.0, 20.0)]),
        ];

        let report = validate_project(&project, &images, &ValidateOptions::default());
        assert!(report.has(IssueCode::DuplicateClassId));
        assert!(report.has(IssueCode::DuplicateImageId));
        assert!(report.has(IssueCode::DuplicateAnnotationId));
        assert_eq!(report.error_count(), 3);
    }

    #[test]
    fn test_unknown_class_and_label_refs() {
        let project = make_project();
        let images = vec![make_image(vec![
            Annotation::new(
                "a1",
                99u64,
                AnnotationData::BBox(BBoxData::new(1.0, 1.0, 5.0, 5.0)),
            ),
            Annotation::new(
                "a2",
                1u64,
                AnnotationData::MultiLabelClassification(ClassificationData {
                    labels: vec![ClassId(1), ClassId(7)],
                }),
            ),
        ])];

        let report = validate_project(&project, &images, &ValidateOptions::default());
        assert!(report.has(IssueCode::UnknownClassRef));
        assert!(report.has(IssueCode::UnknownLabelRef));
        assert_eq!(report.error_count(), 2);
    }

    #[test]
    fn test_classless_annotation_is_not_an_error() {
        let project = make_project();
        let images = vec![make_image(vec![
            bbox("a1", 1.0, 1.0, 5.0, 5.0).without_class()
        ])];
        let report = validate_project(&project, &images, &ValidateOptions::default());
        assert!(report.is_ok());
    }

    #[test]
    fn test_zero_dimensions_and_empty_name() {
        let project = make_project();
        let images = vec![AnnotatedImage::new(1u64, "", 0, 480)
            .with_annotation(bbox("a1", 1.0, 1.0, 5.0, 5.0))];

        let report = validate_project(&project, &images, &ValidateOptions::default());
        assert!(report.has(IssueCode::InvalidImageDimensions));
        assert!(report.has(IssueCode::EmptyFileName));
        // Bounds are not checked against an image without a size.
        assert!(!report.has(IssueCode::GeometryOutOfBounds));
    }

    #[test]
    fn test_non_finite_and_negative_geometry() {
        let project = make_project();
        let images = vec![make_image(vec![
            bbox("a1", f64::NAN, 0.0, 5.0, 5.0),
            bbox("a2", 0.0, 0.0, -5.0, 5.0),
            Annotation::new(
                "a3",
                1u64,
                AnnotationData::Obb(ObbData::new(0.0, 0.0, 5.0, -1.0, 0.0)),
            ),
        ])];

        let report = validate_project(&project, &images, &ValidateOptions::default());
        assert!(report.has(IssueCode::GeometryNotFinite));
        assert_eq!(
            report
                .issues
                .iter()
                .filter(|i| i.code == IssueCode::NegativeExtent)
                .count(),
            2
        );
    }

    #[test]
    fn test_polygon_point_count() {
        let project = make_project();
        let open = PolygonData {
            points: vec![Coord::new(1.0, 1.0), Coord::new(5.0, 5.0)],
            closed: false,
        };
        let closed = PolygonData::closed(vec![Coord::new(1.0, 1.0), Coord::new(5.0, 5.0)]);
        let images = vec![make_image(vec![
            Annotation::new("open", 1u64, AnnotationData::Polygon(open)),
            Annotation::new("closed", 1u64, AnnotationData::Polygon(closed)),
        ])];

        let report = validate_project(&project, &images, &ValidateOptions::default());
        let hits: Vec<_> = report
            .issues
            .iter()
            .filter(|i| i.code == IssueCode::PolygonTooFewPoints)
            .collect();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].context.to_string().contains("closed"));
    }

    #[test]
    fn test_out_of_bounds_is_a_warning() {
        let project = make_project();
        let images = vec![make_image(vec![
            bbox("inside", 0.0, 0.0, 640.4, 480.0),
            bbox("outside", 600.0, 400.0, 100.0, 100.0),
        ])];

        let report = validate_project(&project, &images, &ValidateOptions::default());
        assert!(report.is_ok());
        assert_eq!(report.warning_count(), 1);
        assert!(report.issues[0].context.to_string().contains("outside"));
    }

    #[test]
    fn test_class_warnings() {
        let project = Project::new(
            "test",
            ProjectType::Bbox,
            vec![
                ClassDefinition::new(1u64, "", "#ff0000"),
                ClassDefinition::new(2u64, "car", "red"),
                ClassDefinition::new(3u64, "car", "#00FF00"),
            ],
        );
        let images = vec![make_image(vec![bbox("a1", 1.0, 1.0, 5.0, 5.0)])];

        let report = validate_project(&project, &images, &ValidateOptions::default());
        assert!(report.has(IssueCode::EmptyClassName));
        assert!(report.has(IssueCode::DuplicateClassName));
        assert!(report.has(IssueCode::InvalidClassColor));
        assert!(report.is_ok());
    }

    #[test]
    fn test_rotation_and_skeleton_warnings() {
        let project = make_project();
        let images = vec![make_image(vec![
            Annotation::new(
                "obb",
                1u64,
                AnnotationData::Obb(ObbData::new(10.0, 10.0, 20.0, 10.0, 400.0)),
            ),
            Annotation::new(
                "kp",
                1u64,
                AnnotationData::Keypoints(KeypointsData {
                    points: vec![Keypoint::new(5.0, 5.0, true)],
                    skeleton_type: "octopus".to_string(),
                    instance_id: None,
                }),
            ),
        ])];

        let report = validate_project(&project, &images, &ValidateOptions::default());
        assert!(report.has(IssueCode::RotationOutOfRange));
        assert!(report.has(IssueCode::UnknownSkeleton));
        assert!(report.is_ok());
    }

    #[test]
    fn test_image_without_annotations_warns() {
        let project = make_project();
        let images = vec![make_image(vec![])];
        let report = validate_project(&project, &images, &ValidateOptions::default());
        assert!(report.has(IssueCode::ImageWithoutAnnotations));
        assert!(report.is_ok());
    }

    #[test]
    fn test_ensure_valid_strict() {
        let project = make_project();
        let images = vec![make_image(vec![])];

        assert!(ensure_valid(&project, &images, &ValidateOptions::default()).is_ok());

        let err = ensure_valid(&project, &images, &ValidateOptions { strict: true })
            .expect_err("warnings fail in strict mode");
        match err {
            AnnotixError::ValidationFailed {
                error_count,
                warning_count,
                report,
            } => {
                assert_eq!(error_count, 0);
                assert_eq!(warning_count, 1);
                assert!(report.has(IssueCode::ImageWithoutAnnotations));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
