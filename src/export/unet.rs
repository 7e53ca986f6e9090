//! U-Net semantic mask exporter.
//!
//! # Layout
//!
//! ```text
//! images/<name>
//! masks/<stem>.png
//! classes.txt
//! ```
//!
//! Each mask is an 8-bit grayscale PNG the size of its image. Background is
//! 0; every mask or polygon annotation paints its class value, later
//! annotations over earlier ones.

use super::archive::ArchiveWriter;
use super::{require_dimensions, ExportContext, Exporter, StagedImage};
use crate::error::AnnotixError;
use crate::geometry::js_round;
use crate::ir::{AnnotatedImage, AnnotationData, ClassId};
use crate::raster::{GraySurface, MaskCache, RasterSurface};

#[derive(Debug, Default)]
pub(crate) struct UnetExporter {
    masks: MaskCache,
}

/// Gray value painted for `class_id`.
///
/// Scaled values spread ids over `0..=255` as `round(id × 255 / n)`, with a
/// single-class project mapping to 255; unscaled values are the raw id.
/// Both saturate at 255.
pub(crate) fn class_value(class_id: ClassId, num_classes: usize, scale: bool) -> u8 {
    let id = class_id.as_u64() as f64;
    let value = match (scale, num_classes) {
        (true, 1) => 255.0,
        (true, n) if n > 1 => js_round(id * 255.0 / n as f64),
        _ => id,
    };
    value.min(255.0) as u8
}

impl Exporter for UnetExporter {
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

        let num_classes = ctx.project.classes.len();
        let mut surface = GraySurface::new(image.width, image.height);

        for annotation in &image.annotations {
            let Some(class_id) = annotation.class_id else {
                staged.missing_class(annotation);
                continue;
            };
            let value = class_value(class_id, num_classes, ctx.options.scale_mask_values);

            match &annotation.data {
                AnnotationData::Mask(mask) => {
                    let decoded = self.masks.get_or_decode(&annotation.id, mask)?;
                    surface.composite_alpha(decoded, 0, 0, value);
                }
                AnnotationData::Polygon(polygon) if polygon.points.len() >= 3 => {
                    surface.fill_polygon(&polygon.points, value);
                }
                AnnotationData::Polygon(_) => {
                    staged.empty_geometry(annotation);
                    continue;
                }
                _ => {
                    staged.unsupported(ctx, annotation);
                    continue;
                }
            }
            staged.wrote_annotation();
        }

        let png = surface.to_png().map_err(|source| AnnotixError::ImageEncode {
            name: image.name.clone(),
            source,
        })?;
        staged.add_file(format!("masks/{}.png", image.file_stem()), png);
        staged.copy_image("images", image);
        Ok(())
    }

    fn finish(
        &mut self,
        ctx: &ExportContext<'_>,
        _records: Vec<()>,
        archive: &mut ArchiveWriter,
    ) -> Result<(), AnnotixError> {
        let num_classes = ctx.project.classes.len();
        let mut lines = vec!["0: background".to_string()];
        for class in &ctx.project.classes {
            let value = class_value(class.id, num_classes, ctx.options.scale_mask_values);
            lines.push(format!("{}: {}", value, class.name));
        }
        archive.add("classes.txt", lines.join("\n").as_bytes())
    }
}
