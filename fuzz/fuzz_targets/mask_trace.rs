//! Fuzz target for contour tracing and simplification on arbitrary masks.

#![no_main]

use annotix::contour::{trace_all, BinaryGrid};
use annotix::simplify::simplify;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 || data.len() > 64 * 1024 {
        return;
    }

    let width = usize::from(data[0]).max(1);
    let cells: Vec<bool> = data[1..].iter().map(|&b| b & 1 == 1).collect();
    let height = cells.len() / width;
    if height == 0 {
        return;
    }

    let Ok(grid) = BinaryGrid::from_cells(width, height, cells[..width * height].to_vec()) else {
        return;
    };

    for contour in trace_all(&grid, 0.0) {
        let _ = simplify(&contour, 1.0);
    }
});
