//! Fuzz target for YOLO output decoding and NMS.
//!
//! The first three bytes pick the class count and the box count; the rest
//! is read as little-endian f32 tensor data in either layout.

#![no_main]

use annotix::inference::{decode, nms};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 || data.len() > 1024 * 1024 {
        return;
    }

    let num_classes = usize::from(data[0] % 16) + 1;
    let num_boxes = usize::from(u16::from_le_bytes([data[1], data[2]]) % 512) + 1;
    let tensor: Vec<f32> = data[3..]
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    for shape in [
        [1, 4 + num_classes, num_boxes],
        [1, num_boxes, 4 + num_classes],
        [1, num_boxes, 5 + num_classes],
    ] {
        if let Ok(boxes) = decode(&tensor, &shape, num_classes, 0.25) {
            let _ = nms(&boxes, 0.45, 0.25);
        }
    }
});
