#![forbid(unsafe_code)]
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Core of the `xtmpl` templating language: a slicer splitting the template
//! into typed spans, a precedence-climbing expression evaluator, and a render
//! engine interpreting control flow directly over the flat slice stream.
//!
//! The language is deliberately small: `{{ expr }}` output directives with
//! integer/float/array arithmetic, and `{% if %}` / `{% for %}` blocks with
//! an optional `{% else %}`. Rendering streams byte chunks to a caller
//! supplied sink; failures carry a byte offset into the template plus a
//! lazily computed row/column pair.
//!
//! ```
//! use xtmpl_engine::{render, Scope, Value};
//!
//! let mut scope = Scope::new();
//! scope.set("items", Value::Array(vec![Value::Int(10), Value::Int(20)]));
//!
//! let mut out = Vec::new();
//! render(
//!     "{% for i, v in items %}{{i}}:{{v}} {% endfor %}",
//!     Some(&scope),
//!     |chunk| out.extend_from_slice(chunk),
//! )
//! .unwrap();
//! assert_eq!(out, b"0:10 1:20 ");
//! ```

mod error;
mod eval;
mod mem;
mod render;
mod scope;
pub mod slicer;
pub mod telemetry;
mod value;

pub use error::{Error, MESSAGE_MAX};
pub use render::{render, NAME_MAX};
pub use scope::Scope;
pub use slicer::MAX_DEPTH;
pub use value::{BinOp, Value};
