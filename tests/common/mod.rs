#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use annotix::ir::{
    AnnotatedImage, Annotation, AnnotationData, BBoxData, ClassDefinition, Coord, MaskData,
    PolygonData, Project, ProjectType,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ImageFormat, Rgba, RgbaImage};

pub fn project(project_type: ProjectType, classes: &[(u64, &str)]) -> Project {
    Project::new(
        "Test Project",
        project_type,
        classes
            .iter()
            .map(|(id, name)| ClassDefinition::new(*id, *name, "#ff0000"))
            .collect(),
    )
}

pub fn bbox(id: &str, class_id: u64, x: f64, y: f64, w: f64, h: f64) -> Annotation {
    Annotation::new(id, class_id, AnnotationData::BBox(BBoxData::new(x, y, w, h)))
}

pub fn polygon(id: &str, class_id: u64, points: &[(f64, f64)]) -> Annotation {
    Annotation::new(
        id,
        class_id,
        AnnotationData::Polygon(PolygonData::closed(
            points.iter().map(|&(x, y)| Coord::new(x, y)).collect(),
        )),
    )
}

pub fn mask(id: &str, class_id: u64, base64png: String) -> Annotation {
    Annotation::new(id, class_id, AnnotationData::Mask(MaskData::new(base64png)))
}

/// A `width × height` image with placeholder bytes.
pub fn image(id: u64, name: &str, width: u32, height: u32) -> AnnotatedImage {
    AnnotatedImage::new(id, name, width, height).with_bytes(b"not really a jpeg".to_vec())
}

/// PNG with opaque pixels inside `[x0, x1) × [y0, y1)` and transparent
/// pixels elsewhere.
pub fn rect_mask_png(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> Vec<u8> {
    rects_mask_png(width, height, &[(x0, y0, x1, y1)])
}

/// Like [`rect_mask_png`] with several opaque rectangles.
pub fn rects_mask_png(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        let inside = rects
            .iter()
            .any(|&(x0, y0, x1, y1)| x >= x0 && x < x1 && y >= y0 && y < y1);
        if inside {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    bytes
}

pub fn base64_png(png: &[u8]) -> String {
    STANDARD.encode(png)
}

pub fn rect_mask_data_url(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> String {
    format!(
        "data:image/png;base64,{}",
        STANDARD.encode(rect_mask_png(width, height, x0, y0, x1, y1))
    )
}

/// Reads every entry of a zip archive into memory.
pub fn unzip(bytes: &[u8]) -> BTreeMap<String, Vec<u8>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("open zip");
    let mut entries = BTreeMap::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).expect("zip entry");
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).expect("read zip entry");
        entries.insert(file.name().to_string(), contents);
    }
    entries
}

pub fn entry_text(entries: &BTreeMap<String, Vec<u8>>, name: &str) -> String {
    let bytes = entries
        .get(name)
        .unwrap_or_else(|| panic!("missing archive entry {name}; have {:?}", entries.keys()));
    String::from_utf8(bytes.clone()).expect("utf-8 entry")
}
