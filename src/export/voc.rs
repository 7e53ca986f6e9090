//! Pascal VOC exporter.
//!
//! # Layout
//!
//! ```text
//! Annotations/<stem>.xml
//! JPEGImages/<name>
//! ```
//!
//! One tab-indented XML file per image. Only boxes are representable: OBBs
//! are written as the axis-aligned box of their rotated corners, every
//! other annotation type is skipped. Box corners are rounded to integers.

use std::fmt::Write as _;

use super::archive::ArchiveWriter;
use super::{class_label, ExportContext, ExportIssueCode, Exporter, StagedImage};
use crate::error::AnnotixError;
use crate::geometry::js_round;
use crate::ir::{AnnotatedImage, AnnotationData, BBoxXYXY, Pixel, Project};

#[derive(Debug, Default)]
pub(crate) struct VocExporter;

impl Exporter for VocExporter {
    type Record = ();

    fn write_image(
        &mut self,
        ctx: &ExportContext<'_>,
        _position: usize,
        image: &AnnotatedImage,
        staged: &mut StagedImage,
    ) -> Result<(), AnnotixError> {
        let mut objects: Vec<(&str, BBoxXYXY<Pixel>)> = Vec::new();

        for annotation in &image.annotations {
            let bbox = match &annotation.data {
                AnnotationData::BBox(b) => b.to_xyxy(),
                AnnotationData::Obb(obb) => {
                    if obb.normalized_rotation() != 0.0 {
                        staged.note(
                            ExportIssueCode::ObbRotationDropped,
                            format!(
                                "obb annotation {} written as its axis-aligned box",
                                annotation.id
                            ),
                        );
                    }
                    obb.to_aabb()
                }
                _ => {
                    staged.unsupported(ctx, annotation);
                    continue;
                }
            };
            if !bbox.is_finite() {
                staged.empty_geometry(annotation);
                continue;
            }
            objects.push((class_label(ctx.project, annotation.class_id), bbox));
            staged.wrote_annotation();
        }

        let xml = voc_xml(ctx.project, image, &objects);
        staged.add_file(
            format!("Annotations/{}.xml", image.file_stem()),
            xml.into_bytes(),
        );
        staged.copy_image("JPEGImages", image);
        Ok(())
    }

    fn finish(
        &mut self,
        _ctx: &ExportContext<'_>,
        _records: Vec<()>,
        _archive: &mut ArchiveWriter,
    ) -> Result<(), AnnotixError> {
        Ok(())
    }
}

fn voc_xml(project: &Project, image: &AnnotatedImage, objects: &[(&str, BBoxXYXY<Pixel>)]) -> String {
    let mut xml = String::new();

    writeln!(xml, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>").expect("write to string");
    writeln!(xml, "<annotation>").expect("write to string");
    writeln!(xml, "\t<folder>{}</folder>", xml_escape(&project.name)).expect("write to string");
    writeln!(xml, "\t<filename>{}</filename>", xml_escape(&image.name)).expect("write to string");
    writeln!(xml, "\t<source>").expect("write to string");
    writeln!(xml, "\t\t<database>Annotix</database>").expect("write to string");
    writeln!(xml, "\t\t<annotation>Annotix Dataset</annotation>").expect("write to string");
    writeln!(xml, "\t</source>").expect("write to string");
    writeln!(xml, "\t<size>").expect("write to string");
    writeln!(xml, "\t\t<width>{}</width>", image.width).expect("write to string");
    writeln!(xml, "\t\t<height>{}</height>", image.height).expect("write to string");
    writeln!(xml, "\t\t<depth>3</depth>").expect("write to string");
    writeln!(xml, "\t</size>").expect("write to string");
    writeln!(xml, "\t<segmented>0</segmented>").expect("write to string");

    for (name, bbox) in objects {
        writeln!(xml, "\t<object>").expect("write to string");
        writeln!(xml, "\t\t<name>{}</name>", xml_escape(name)).expect("write to string");
        writeln!(xml, "\t\t<pose>Unspecified</pose>").expect("write to string");
        writeln!(xml, "\t\t<truncated>0</truncated>").expect("write to string");
        writeln!(xml, "\t\t<difficult>0</difficult>").expect("write to string");
        writeln!(xml, "\t\t<bndbox>").expect("write to string");
        writeln!(xml, "\t\t\t<xmin>{}</xmin>", js_round(bbox.xmin())).expect("write to string");
        writeln!(xml, "\t\t\t<ymin>{}</ymin>", js_round(bbox.ymin())).expect("write to string");
        writeln!(xml, "\t\t\t<xmax>{}</xmax>", js_round(bbox.xmax())).expect("write to string");
        writeln!(xml, "\t\t\t<ymax>{}</ymax>", js_round(bbox.ymax())).expect("write to string");
        writeln!(xml, "\t\t</bndbox>").expect("write to string");
        writeln!(xml, "\t</object>").expect("write to string");
    }

    write!(xml, "</annotation>").expect("write to string");
    xml
}

fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ProjectType;

    #[test]
    fn escapes_special_characters() {
        assert_eq!(
            xml_escape(r#"<a & 'b' "c">"#),
            "&lt;a &amp; &apos;b&apos; &quot;c&quot;&gt;"
        );
    }

    #[test]
    fn xml_is_tab_indented_and_rounded() {
        let project = Project::new("Birds & Bees", ProjectType::Bbox, vec![]);
        let image = AnnotatedImage::new(1u64, "nest.jpg", 640, 480);
        let xml = voc_xml(
            &project,
            &image,
            &[("sparrow", BBoxXYXY::from_xyxy(10.4, 20.5, 99.5, 180.49))],
        );

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<annotation>\n"));
        assert!(xml.contains("\t<folder>Birds &amp; Bees</folder>\n"));
        assert!(xml.contains("\t\t<depth>3</depth>\n"));
        assert!(xml.contains("\t\t\t<xmin>10</xmin>\n"));
        assert!(xml.contains("\t\t\t<ymin>21</ymin>\n"));
        assert!(xml.contains("\t\t\t<xmax>100</xmax>\n"));
        assert!(xml.contains("\t\t\t<ymax>180</ymax>\n"));
        assert!(xml.ends_with("</annotation>"));
    }
}
