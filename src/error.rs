use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationReport;

/// The main error type for annotix operations.
#[derive(Debug, Error)]
pub enum AnnotixError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse project JSON from {path}: {source}")]
    ProjectJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write project JSON to {path}: {source}")]
    ProjectJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid project bundle: {message}")]
    ProjectInvalid { message: String },

    #[error("Malformed annotation {id}: {source}")]
    AnnotationJson {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Tensor shape {shape:?} does not match {num_classes} class(es): {message}")]
    TensorShape {
        shape: Vec<usize>,
        num_classes: usize,
        message: String,
    },

    #[error("Mask buffer for a {width}x{height} grid has {actual} byte(s), expected {expected}")]
    MaskBuffer {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid dimensions {width}x{height} for letterbox target {target_size}")]
    InvalidDimensions {
        width: u32,
        height: u32,
        target_size: u32,
    },

    #[error("Failed to decode mask for annotation {annotation_id}: {message}")]
    MaskDecode {
        annotation_id: String,
        message: String,
    },

    #[error("Failed to encode image {name}: {source}")]
    ImageEncode {
        name: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to read dimensions of image {name}: {source}")]
    ImageDimensionRead {
        name: String,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("Failed to write {format} archive entry '{entry}': {source}")]
    ArchiveWrite {
        format: &'static str,
        entry: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Failed to write CSV for {format}: {source}")]
    CsvWrite {
        format: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to serialize {format} output: {message}")]
    Serialize {
        format: &'static str,
        message: String,
    },

    #[error("Export of image '{image}' failed: {message}")]
    ImageExport { image: String, message: String },

    #[error("Export cancelled after {completed} of {total} image(s)")]
    Cancelled { completed: usize, total: usize },

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },

    #[error("No annotated images to export")]
    NoAnnotatedImages,

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}
