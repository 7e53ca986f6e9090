//! Dataset exporters.
//!
//! Every format shares one sequential driver ([`export`]): images are
//! processed in input order, each image's files are staged and committed to
//! the archive only once the whole image succeeded, and a failing image is
//! skipped with a warning in the [`ExportReport`] instead of aborting the
//! export. Annotations a format cannot represent are skipped with an info
//! note.
//!
//! # Example
//!
//! ```
//! use annotix::export::{export, CancellationToken, ExportFormat, ExportOptions};
//! use annotix::ir::{
//!     AnnotatedImage, Annotation, AnnotationData, BBoxData, ClassDefinition, Project,
//!     ProjectType,
//! };
//!
//! let project = Project::new("Cars", ProjectType::Bbox, vec![ClassDefinition::new(0u64, "car", "#ff0000")]);
//! let images = vec![AnnotatedImage::new(1u64, "street.jpg", 200, 100).with_annotation(
//!     Annotation::new("a1", 0u64, AnnotationData::BBox(BBoxData::new(10.0, 10.0, 40.0, 20.0))),
//! )];
//!
//! let mut last = 0.0;
//! let output = export(
//!     &project,
//!     &images,
//!     ExportFormat::YoloDetection,
//!     &ExportOptions::default(),
//!     &CancellationToken::new(),
//!     |p| last = p,
//! )?;
//! assert_eq!(last, 100.0);
//! assert_eq!(output.report.output.annotations, 1);
//! # Ok::<(), annotix::AnnotixError>(())
//! ```

mod archive;
mod coco;
mod csv;
mod report;
mod unet;
mod voc;
mod yolo;

pub use report::{ExportCounts, ExportIssue, ExportIssueCode, ExportReport, ExportSeverity};

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use self::archive::ArchiveWriter;
use crate::contour::{trace_all, BinaryGrid, DEFAULT_MIN_AREA};
use crate::error::AnnotixError;
use crate::ir::{AnnotatedImage, Annotation, AnnotationId, ClassId, Coord, MaskData, Pixel, Project};
use crate::raster::MaskCache;
use crate::simplify::{simplify, SimplifyOptions};

/// Label used for annotations whose class the project does not define.
pub const UNKNOWN_CLASS: &str = "unknown";

// ============================================================================
// Formats and options
// ============================================================================

/// Supported dataset formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Coco,
    YoloDetection,
    YoloSegmentation,
    PascalVoc,
    CsvDetection,
    CsvLandmarks,
    CsvKeypoints,
    CsvClassification,
    UnetMasks,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 9] = [
        ExportFormat::Coco,
        ExportFormat::YoloDetection,
        ExportFormat::YoloSegmentation,
        ExportFormat::PascalVoc,
        ExportFormat::CsvDetection,
        ExportFormat::CsvLandmarks,
        ExportFormat::CsvKeypoints,
        ExportFormat::CsvClassification,
        ExportFormat::UnetMasks,
    ];

    /// Canonical name, as accepted by [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Coco => "coco",
            ExportFormat::YoloDetection => "yolo-detection",
            ExportFormat::YoloSegmentation => "yolo-segmentation",
            ExportFormat::PascalVoc => "pascal-voc",
            ExportFormat::CsvDetection => "csv-detection",
            ExportFormat::CsvLandmarks => "csv-landmarks",
            ExportFormat::CsvKeypoints => "csv-keypoints",
            ExportFormat::CsvClassification => "csv-classification",
            ExportFormat::UnetMasks => "unet-masks",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportFormat {
    type Err = AnnotixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        let format = match normalized.as_str() {
            "voc" => ExportFormat::PascalVoc,
            "unet" => ExportFormat::UnetMasks,
            other => ExportFormat::ALL
                .into_iter()
                .find(|f| f.name() == other)
                .ok_or_else(|| AnnotixError::UnsupportedFormat(s.to_string()))?,
        };
        Ok(format)
    }
}

/// Options shared by all exporters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportOptions {
    /// Simplification applied to contours traced from masks.
    pub simplify: SimplifyOptions,

    /// Minimum shoelace area of a traced mask region.
    pub min_area: f64,

    /// U-Net: spread class values over `0..=255` instead of writing raw ids.
    pub scale_mask_values: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            simplify: SimplifyOptions::default(),
            min_area: DEFAULT_MIN_AREA,
            scale_mask_values: true,
        }
    }
}

/// Cooperative cancellation flag, checked between images.
///
/// Clones share the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A finished archive and what went into it.
#[derive(Clone, Debug)]
pub struct ExportOutput {
    /// Zip archive bytes.
    pub archive: Vec<u8>,
    pub report: ExportReport,
}

// ============================================================================
// Driver
// ============================================================================

/// Exports `images` of `project` as a zip archive in `format`.
///
/// Only images with at least one annotation are exported; if there are
/// none, [`AnnotixError::NoAnnotatedImages`] is returned. `on_progress`
/// receives `(i + 1) / n × 100` after each image, ending at exactly 100.
pub fn export<F>(
    project: &Project,
    images: &[AnnotatedImage],
    format: ExportFormat,
    options: &ExportOptions,
    cancel: &CancellationToken,
    on_progress: F,
) -> Result<ExportOutput, AnnotixError>
where
    F: FnMut(f64),
{
    let ctx = ExportContext {
        project,
        options,
        format,
    };

    match format {
        ExportFormat::Coco => run(coco::CocoExporter::default(), &ctx, images, cancel, on_progress),
        ExportFormat::YoloDetection => run(
            yolo::YoloExporter::new(yolo::YoloTask::Detection),
            &ctx,
            images,
            cancel,
            on_progress,
        ),
        ExportFormat::YoloSegmentation => run(
            yolo::YoloExporter::new(yolo::YoloTask::Segmentation),
            &ctx,
            images,
            cancel,
            on_progress,
        ),
        ExportFormat::PascalVoc => run(voc::VocExporter, &ctx, images, cancel, on_progress),
        ExportFormat::CsvDetection => run(
            csv::CsvExporter::new(csv::CsvLayout::Detection),
            &ctx,
            images,
            cancel,
            on_progress,
        ),
        ExportFormat::CsvLandmarks => run(
            csv::CsvExporter::new(csv::CsvLayout::Landmarks),
            &ctx,
            images,
            cancel,
            on_progress,
        ),
        ExportFormat::CsvKeypoints => run(
            csv::CsvExporter::new(csv::CsvLayout::Keypoints),
            &ctx,
            images,
            cancel,
            on_progress,
        ),
        ExportFormat::CsvClassification => run(
            csv::CsvExporter::new(csv::CsvLayout::Classification),
            &ctx,
            images,
            cancel,
            on_progress,
        ),
        ExportFormat::UnetMasks => run(unet::UnetExporter::default(), &ctx, images, cancel, on_progress),
    }
}

/// Shared inputs of one export run.
pub(crate) struct ExportContext<'a> {
    pub project: &'a Project,
    pub options: &'a ExportOptions,
    pub format: ExportFormat,
}

/// One format's image and dataset writers.
///
/// `write_image` stages everything it produces in `staged` and returns a
/// per-image record; records of committed images are handed to `finish`
/// in input order. A failed image leaves no trace in either.
pub(crate) trait Exporter {
    type Record;

    fn write_image(
        &mut self,
        ctx: &ExportContext<'_>,
        position: usize,
        image: &AnnotatedImage,
        staged: &mut StagedImage,
    ) -> Result<Self::Record, AnnotixError>;

    fn finish(
        &mut self,
        ctx: &ExportContext<'_>,
        records: Vec<Self::Record>,
        archive: &mut ArchiveWriter,
    ) -> Result<(), AnnotixError>;
}

/// Files and notes produced by one image, committed only on success.
#[derive(Debug, Default)]
pub(crate) struct StagedImage {
    files: Vec<(String, Vec<u8>)>,
    notes: Vec<ExportIssue>,
    annotations: usize,
}

impl StagedImage {
    pub(crate) fn add_file(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.files.push((name.into(), bytes));
    }

    /// Copies the encoded original image into `folder`.
    pub(crate) fn copy_image(&mut self, folder: &str, image: &AnnotatedImage) {
        self.add_file(format!("{}/{}", folder, image.name), image.bytes.clone());
    }

    pub(crate) fn note(&mut self, code: ExportIssueCode, message: impl Into<String>) {
        self.notes.push(ExportIssue::info(code, message));
    }

    /// Notes that `annotation` was not written because the format has no
    /// representation for it.
    pub(crate) fn unsupported(&mut self, ctx: &ExportContext<'_>, annotation: &Annotation) {
        self.note(
            ExportIssueCode::UnsupportedAnnotation,
            format!(
                "{} annotation {} skipped: not representable in {}",
                annotation.kind(),
                annotation.id,
                ctx.format
            ),
        );
    }

    /// Notes that `annotation` produced nothing to write. Returns `false`
    /// so match arms can report "not written" in one expression.
    pub(crate) fn empty_geometry(&mut self, annotation: &Annotation) -> bool {
        self.note(
            ExportIssueCode::EmptyGeometry,
            format!(
                "{} annotation {} has no usable geometry and was skipped",
                annotation.kind(),
                annotation.id
            ),
        );
        false
    }

    /// Notes a class-less annotation the format cannot place.
    pub(crate) fn missing_class(&mut self, annotation: &Annotation) {
        self.note(
            ExportIssueCode::MissingClass,
            format!("annotation {} has no class and was skipped", annotation.id),
        );
    }

    pub(crate) fn wrote_annotation(&mut self) {
        self.annotations += 1;
    }
}

fn run<E, F>(
    mut exporter: E,
    ctx: &ExportContext<'_>,
    images: &[AnnotatedImage],
    cancel: &CancellationToken,
    mut on_progress: F,
) -> Result<ExportOutput, AnnotixError>
where
    E: Exporter,
    F: FnMut(f64),
{
    let mut report = ExportReport::new(ctx.format.name());
    report.input = ExportCounts {
        images: images.len(),
        annotations: images.iter().map(|i| i.annotations.len()).sum(),
    };

    let mut selected = Vec::with_capacity(images.len());
    for image in images {
        if image.annotations.is_empty() {
            report.add(ExportIssue::info(
                ExportIssueCode::ImageWithoutAnnotations,
                format!("image '{}' has no annotations and was left out", image.name),
            ));
        } else {
            selected.push(image);
        }
    }
    if selected.is_empty() {
        return Err(AnnotixError::NoAnnotatedImages);
    }

    let total = selected.len();
    let mut archive = ArchiveWriter::new(ctx.format.name());
    let mut records = Vec::with_capacity(total);

    for (position, image) in selected.into_iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::debug!(completed = position, total, "Export cancelled");
            return Err(AnnotixError::Cancelled {
                completed: position,
                total,
            });
        }

        let mut staged = StagedImage::default();
        match exporter.write_image(ctx, position, image, &mut staged) {
            Ok(record) => {
                for (name, bytes) in &staged.files {
                    archive.add(name, bytes)?;
                }
                report.output.images += 1;
                report.output.annotations += staged.annotations;
                report.issues.extend(staged.notes);
                records.push(record);
            }
            Err(err) => {
                tracing::warn!(image = %image.name, error = %err, "Skipping image that failed to export");
                report.add(ExportIssue::warning(
                    ExportIssueCode::ImageSkipped,
                    format!("image '{}' skipped: {}", image.name, err),
                ));
            }
        }

        let progress = (position + 1) as f64 / total as f64 * 100.0;
        tracing::debug!(image = %image.name, progress, "Exported image");
        on_progress(progress);
    }

    exporter.finish(ctx, records, &mut archive)?;
    tracing::debug!(
        format = ctx.format.name(),
        entries = archive.entries(),
        "Finished export archive"
    );

    Ok(ExportOutput {
        archive: archive.finish()?,
        report,
    })
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Class name for an annotation, `"unknown"` when absent or undefined.
pub(crate) fn class_label(project: &Project, class_id: Option<ClassId>) -> &str {
    class_id
        .and_then(|id| project.class_name(id))
        .unwrap_or(UNKNOWN_CLASS)
}

/// Traces a mask annotation into simplified region contours.
///
/// Regions below the configured minimum area are dropped; every returned
/// contour has at least 3 points.
pub(crate) fn mask_contours(
    masks: &mut MaskCache,
    id: &AnnotationId,
    mask: &MaskData,
    options: &ExportOptions,
) -> Result<Vec<Vec<Coord<Pixel>>>, AnnotixError> {
    let image = masks.get_or_decode(id, mask)?;
    let grid = BinaryGrid::from_rgba_image(image);
    Ok(trace_all(&grid, options.min_area)
        .into_iter()
        .map(|contour| simplify(&contour, options.simplify.tolerance))
        .filter(|contour| contour.len() >= 3)
        .collect())
}

/// Rejects images whose dimensions would break normalization.
pub(crate) fn require_dimensions(image: &AnnotatedImage) -> Result<(), AnnotixError> {
    if image.width == 0 || image.height == 0 {
        return Err(AnnotixError::ImageExport {
            image: image.name.clone(),
            message: format!("invalid dimensions {}x{}", image.width, image.height),
        });
    }
    Ok(())
}
