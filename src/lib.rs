//! Annotix: annotation geometry and dataset export engine.
//!
//! Annotix is the engineering core of an image annotation tool. It turns
//! what a user draws, or what a detection model predicts, into typed
//! annotation records, and packages those records as machine-learning
//! datasets.
//!
//! # Modules
//!
//! - [`ir`]: Annotation records (Project, AnnotatedImage, Annotation, etc.)
//!   and project JSON I/O
//! - [`geometry`]: Shared polygon and box math
//! - [`contour`]: Moore-Neighbor boundary tracing of binary masks
//! - [`simplify`]: Radial-distance and Douglas-Peucker polygon simplification
//! - [`inference`]: Letterboxing, YOLO tensor decoding and NMS
//! - [`raster`]: Raster surfaces and the mask decode cache
//! - [`export`]: COCO, YOLO, Pascal VOC, CSV and U-Net zip exporters
//! - [`validation`]: Project validation and error reporting
//! - [`error`]: Error types for annotix operations
//!
//! # Example
//!
//! ```
//! use annotix::contour::{trace_all, BinaryGrid, DEFAULT_MIN_AREA};
//! use annotix::simplify::simplify;
//!
//! let mut grid = BinaryGrid::new(16, 16);
//! grid.fill_rect(2, 2, 8, 6);
//!
//! let contours = trace_all(&grid, DEFAULT_MIN_AREA);
//! assert_eq!(contours.len(), 1);
//!
//! let polygon = simplify(&contours[0], 1.0);
//! assert!(polygon.len() <= contours[0].len());
//! ```

pub mod contour;
pub mod error;
pub mod export;
pub mod geometry;
pub mod inference;
pub mod ir;
pub mod raster;
pub mod simplify;
pub mod validation;

pub use error::AnnotixError;
pub use export::{export, CancellationToken, ExportFormat, ExportOptions, ExportOutput, ExportReport};
pub use validation::{validate_project, ValidateOptions, ValidationReport};
