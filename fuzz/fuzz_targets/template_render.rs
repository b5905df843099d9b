#![no_main]

use libfuzzer_sys::fuzz_target;
use xtmpl::{render_to_string, Scope, Value};

fuzz_target!(|data: &[u8]| {
    let source = match std::str::from_utf8(data) {
        Ok(src) => src,
        Err(_) => return,
    };

    let mut scope = Scope::new();
    scope.set("n", Value::Int(3));
    scope.set("items", Value::Array(vec![Value::Int(1), Value::Float(2.5)]));

    let _ = render_to_string(source, Some(&scope));
});
