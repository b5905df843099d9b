#![no_main]

use libfuzzer_sys::fuzz_target;
use xtmpl_engine::slicer::slice_template;

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        let _ = slice_template(source);
    }
});
