//! Fuzz target for project bundle and annotation record parsing.

#![no_main]

use annotix::ir::io_json::fuzz_parse_project;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = fuzz_parse_project(data);
});
