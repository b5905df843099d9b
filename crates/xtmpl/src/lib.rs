#![forbid(unsafe_code)]
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! String and file conveniences over [`xtmpl_engine`].
//!
//! The engine crate renders through a caller-supplied byte sink so it never
//! allocates output it doesn't have to. Most callers just want a `String`,
//! or want to render a template straight from disk; this crate covers both.
//!
//! ```
//! use xtmpl::{render_to_string, Scope, Value};
//!
//! let mut scope = Scope::new();
//! scope.set("greeting", Value::Int(42));
//! let out = render_to_string("answer: {{ greeting }}", Some(&scope)).unwrap();
//! assert_eq!(out, "answer: 42");
//! ```

use std::fs;
use std::path::Path;

pub use xtmpl_engine::{
    render, slicer, telemetry, BinOp, Error, Scope, Value, MAX_DEPTH, MESSAGE_MAX, NAME_MAX,
};

/// Renders `template` into a freshly allocated `String`.
///
/// Template output is always valid UTF-8: text spans are copied from the
/// template verbatim and expression output is ASCII.
pub fn render_to_string(template: &str, scope: Option<&Scope<'_>>) -> Result<String, Error> {
    let mut out = Vec::new();
    render(template, scope, |bytes| out.extend_from_slice(bytes))?;
    String::from_utf8(out).map_err(|_| Error::msg("Rendered output isn't valid UTF-8"))
}

/// Reads a template file into memory.
///
/// I/O failures are reported through the engine's [`Error`] type so callers
/// see one error surface regardless of where rendering went wrong.
pub fn load_file(path: impl AsRef<Path>) -> Result<String, Error> {
    let path = path.as_ref();
    fs::read_to_string(path)
        .map_err(|err| Error::msg(format!("Can't read template file [{}]: {err}", path.display())))
}

/// Reads the template at `path` and renders it through `sink`.
pub fn render_file<S: FnMut(&[u8])>(
    path: impl AsRef<Path>,
    scope: Option<&Scope<'_>>,
    sink: S,
) -> Result<(), Error> {
    let template = load_file(path)?;
    render(&template, scope, sink)
}

/// Reads the template at `path` and renders it into a `String`.
pub fn render_file_to_string(
    path: impl AsRef<Path>,
    scope: Option<&Scope<'_>>,
) -> Result<String, Error> {
    let template = load_file(path)?;
    render_to_string(&template, scope)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn render_to_string_collects_sink_output() {
        let out = render_to_string("{% for i, v in [1, 2, 3] %}{{ v * 2 }} {% endfor %}", None);
        assert_eq!(out.unwrap(), "2 4 6 ");
    }

    #[test]
    fn render_to_string_surfaces_engine_errors() {
        let err = render_to_string("{{ missing }}", None).unwrap_err();
        assert_eq!(err.message(), "Undefined variable [missing]");
    }

    #[test]
    fn render_file_to_string_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Hello, {{{{ who }}}}!").unwrap();

        let mut scope = Scope::new();
        scope.set("who", Value::Int(7));
        let out = render_file_to_string(file.path(), Some(&scope)).unwrap();
        assert_eq!(out, "Hello, 7!");
    }

    #[test]
    fn load_file_reports_missing_files() {
        let err = load_file("/nonexistent/template.xtmpl").unwrap_err();
        assert!(err.message().contains("Can't read template file"));
        assert!(err.message().contains("/nonexistent/template.xtmpl"));
    }

    #[test]
    fn render_file_streams_through_the_sink() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{% if 1 %}}yes{{% else %}}no{{% endif %}}").unwrap();

        let mut out = Vec::new();
        render_file(file.path(), None, |bytes| out.extend_from_slice(bytes)).unwrap();
        assert_eq!(out, b"yes");
    }
}
