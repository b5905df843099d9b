// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Single-pass slicer that partitions a template into typed spans.
//!
//! The output is a flat list of [`Slice`]s referencing the template by byte
//! offset, always terminated by exactly one [`SliceKind::End`]. The slicer
//! validates block keywords and nesting; it deliberately does *not* require
//! `{{` to be closed: an unterminated expression slices to end-of-input and
//! fails later, inside the evaluator, with a less specific message. Blocks
//! still open at end-of-input are accepted for the same reason.

use smallvec::SmallVec;

use crate::error::Error;
use crate::mem;

/// Maximum nesting of `{% if %}` / `{% for %}` blocks.
pub const MAX_DEPTH: usize = 8;

/// Classification of a template span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceKind {
    /// Literal text, emitted verbatim.
    Text,
    /// The inside of a `{{ ... }}` directive.
    Expr,
    /// An `{% if %}` opener; the slice covers the condition text.
    If,
    /// A `{% for %}` opener; the slice covers the clause text.
    For,
    /// `{% else %}`.
    Else,
    /// `{% endif %}`.
    EndIf,
    /// `{% endfor %}`.
    EndFor,
    /// Synthetic terminator appended at end-of-input.
    End,
}

/// A `{kind, offset, length}` reference into the template text, never a copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    /// What the span is.
    pub kind: SliceKind,
    /// Byte offset of the span within the template.
    pub off: usize,
    /// Byte length of the span.
    pub len: usize,
}

struct OpenBlock {
    kind: SliceKind,
    has_else: bool,
}

/// Splits `template` into its slice sequence.
pub fn slice_template(template: &str) -> Result<Vec<Slice>, Error> {
    let bytes = template.as_bytes();
    let len = bytes.len();
    let mut slices = Vec::new();
    let mut stack: SmallVec<[OpenBlock; MAX_DEPTH]> = SmallVec::new();

    let mut i = 0;
    loop {
        let text_off = i;
        while i < len && !directive_opens_at(bytes, i) {
            i += 1;
        }
        if i > text_off {
            mem::push(
                &mut slices,
                Slice {
                    kind: SliceKind::Text,
                    off: text_off,
                    len: i - text_off,
                },
            )?;
        }

        if i == len {
            mem::push(
                &mut slices,
                Slice {
                    kind: SliceKind::End,
                    off: i,
                    len: 0,
                },
            )?;
            return Ok(slices);
        }

        if bytes[i + 1] == b'%' {
            i = scan_block(template, i, &mut slices, &mut stack)?;
        } else {
            i = scan_expr(bytes, i, &mut slices)?;
        }
    }
}

fn directive_opens_at(bytes: &[u8], i: usize) -> bool {
    bytes[i] == b'{' && i + 1 < bytes.len() && (bytes[i + 1] == b'%' || bytes[i + 1] == b'{')
}

fn scan_expr(bytes: &[u8], open: usize, slices: &mut Vec<Slice>) -> Result<usize, Error> {
    let len = bytes.len();
    let mut i = skip_spaces(bytes, open + 2);

    let off = i;
    while i < len && !(bytes[i] == b'}' && i + 1 < len && bytes[i + 1] == b'}') {
        i += 1;
    }
    mem::push(
        slices,
        Slice {
            kind: SliceKind::Expr,
            off,
            len: i - off,
        },
    )?;

    if i < len {
        i += 2; // past `}}`
    }
    Ok(i)
}

fn scan_block(
    template: &str,
    open: usize,
    slices: &mut Vec<Slice>,
    stack: &mut SmallVec<[OpenBlock; MAX_DEPTH]>,
) -> Result<usize, Error> {
    let bytes = template.as_bytes();
    let len = bytes.len();
    let mut i = skip_spaces(bytes, open + 2);

    if i == len || !(bytes[i].is_ascii_alphabetic() || bytes[i] == b'_') {
        return Err(Error::at("block {% .. %} doesn't start with a keyword", i));
    }

    let kw_off = i;
    while i < len && (bytes[i].is_ascii_alphabetic() || bytes[i] == b'_') {
        i += 1;
    }
    let keyword = &template[kw_off..i];
    i = skip_spaces(bytes, i);

    let kind = match keyword {
        "if" | "for" => {
            if stack.len() == MAX_DEPTH {
                return Err(Error::at(
                    "Too many nested {% if .. %} and {% for .. %} blocks",
                    kw_off,
                ));
            }
            let kind = if keyword == "if" {
                SliceKind::If
            } else {
                SliceKind::For
            };
            stack.push(OpenBlock {
                kind,
                has_else: false,
            });
            kind
        }
        "else" => {
            match stack.last_mut() {
                Some(top) if top.kind == SliceKind::If => {
                    if top.has_else {
                        return Err(Error::at(
                            "Can't have multiple {% else %} blocks relative to only one {% if .. %}",
                            kw_off,
                        ));
                    }
                    top.has_else = true;
                }
                _ => {
                    return Err(Error::at("{% else %} has no matching {% if .. %}", kw_off));
                }
            }
            SliceKind::Else
        }
        "endif" => {
            match stack.last() {
                Some(top) if top.kind == SliceKind::If => {
                    stack.pop();
                }
                _ => {
                    return Err(Error::at("{% endif %} has no matching {% if .. %}", kw_off));
                }
            }
            SliceKind::EndIf
        }
        "endfor" => {
            match stack.last() {
                Some(top) if top.kind == SliceKind::For => {
                    stack.pop();
                }
                _ => {
                    return Err(Error::at(
                        "{% endfor %} has no matching {% for .. %}",
                        kw_off,
                    ));
                }
            }
            SliceKind::EndFor
        }
        _ => return Err(Error::at("Bad {% .. %} block keyword", kw_off)),
    };

    let off = i;
    while i < len && !(bytes[i] == b'%' && i + 1 < len && bytes[i + 1] == b'}') {
        i += 1;
    }
    mem::push(
        slices,
        Slice {
            kind,
            off,
            len: i - off,
        },
    )?;

    if i < len {
        i += 2; // past `%}`
    }
    Ok(i)
}

fn skip_spaces(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && matches!(bytes[i], b' ' | b'\t' | b'\n') {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(template: &str) -> Vec<SliceKind> {
        slice_template(template)
            .unwrap()
            .iter()
            .map(|slice| slice.kind)
            .collect()
    }

    fn text_of<'a>(template: &'a str, slice: &Slice) -> &'a str {
        &template[slice.off..slice.off + slice.len]
    }

    #[test]
    fn empty_template_is_just_the_terminator() {
        assert_eq!(kinds(""), vec![SliceKind::End]);
    }

    #[test]
    fn plain_text_is_one_slice() {
        let template = "Hello, world!";
        let slices = slice_template(template).unwrap();
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].kind, SliceKind::Text);
        assert_eq!(text_of(template, &slices[0]), template);
        assert_eq!(slices[1].kind, SliceKind::End);
    }

    #[test]
    fn expr_slice_covers_the_directive_body() {
        let template = "a{{ 1+2 }}b";
        let slices = slice_template(template).unwrap();
        assert_eq!(
            slices.iter().map(|s| s.kind).collect::<Vec<_>>(),
            vec![
                SliceKind::Text,
                SliceKind::Expr,
                SliceKind::Text,
                SliceKind::End
            ]
        );
        assert_eq!(text_of(template, &slices[1]), "1+2 ");
    }

    #[test]
    fn block_slices_carry_their_clause() {
        let template = "{% if x %}{% else %}{% endif %}";
        let slices = slice_template(template).unwrap();
        assert_eq!(
            slices.iter().map(|s| s.kind).collect::<Vec<_>>(),
            vec![
                SliceKind::If,
                SliceKind::Else,
                SliceKind::EndIf,
                SliceKind::End
            ]
        );
        assert_eq!(text_of(template, &slices[0]), "x ");
    }

    #[test]
    fn unterminated_expr_slices_to_end_of_input() {
        let template = "a{{ 1+";
        let slices = slice_template(template).unwrap();
        assert_eq!(slices[1].kind, SliceKind::Expr);
        assert_eq!(text_of(template, &slices[1]), "1+");
        assert_eq!(slices.last().unwrap().kind, SliceKind::End);
    }

    #[test]
    fn unclosed_blocks_at_end_of_input_are_accepted() {
        let template = "{% if 0 %}x{% for v in [0] %}y{% if 0 %}z";
        let slices = slice_template(template).unwrap();
        assert_eq!(slices.last().unwrap().kind, SliceKind::End);
    }

    #[test]
    fn lone_brace_is_text() {
        let template = "a{b}{";
        let slices = slice_template(template).unwrap();
        assert_eq!(slices.len(), 2);
        assert_eq!(text_of(template, &slices[0]), "a{b}{");
    }

    #[test]
    fn missing_keyword_is_rejected() {
        for template in ["{%%}", "{% %}", "{%@%}", "{% @ %}"] {
            let err = slice_template(template).unwrap_err();
            assert_eq!(err.message(), "block {% .. %} doesn't start with a keyword");
        }
    }

    #[test]
    fn unknown_keywords_are_rejected() {
        for template in ["{% x %}", "{% xx %}", "{% ifx %}", "{% endwhile %}"] {
            let err = slice_template(template).unwrap_err();
            assert_eq!(err.message(), "Bad {% .. %} block keyword");
        }
    }

    #[test]
    fn depth_limit_is_enforced() {
        let over = "{% if 1 %}".repeat(MAX_DEPTH + 4);
        let err = slice_template(&over).unwrap_err();
        assert_eq!(
            err.message(),
            "Too many nested {% if .. %} and {% for .. %} blocks"
        );

        let at_limit = "{% for v in [] %}".repeat(MAX_DEPTH);
        assert!(slice_template(&at_limit).is_ok());
    }

    #[test]
    fn mismatched_closers_are_rejected() {
        let err = slice_template("{% else %}").unwrap_err();
        assert_eq!(err.message(), "{% else %} has no matching {% if .. %}");

        let err = slice_template("{% endif %}").unwrap_err();
        assert_eq!(err.message(), "{% endif %} has no matching {% if .. %}");

        let err = slice_template("{% endfor %}").unwrap_err();
        assert_eq!(err.message(), "{% endfor %} has no matching {% for .. %}");

        let err = slice_template("{% for v in x %}{% endif %}").unwrap_err();
        assert_eq!(err.message(), "{% endif %} has no matching {% if .. %}");
    }

    #[test]
    fn duplicate_else_is_rejected() {
        let err = slice_template("{% if 0 %}{% else %}{% else %}").unwrap_err();
        assert_eq!(
            err.message(),
            "Can't have multiple {% else %} blocks relative to only one {% if .. %}"
        );
    }

    #[test]
    fn else_binds_to_the_innermost_if() {
        let template = "{% if 1 %}{% if 0 %}{% else %}{% endif %}{% else %}{% endif %}";
        assert!(slice_template(template).is_ok());
    }

    #[test]
    fn errors_carry_the_keyword_offset() {
        let err = slice_template("ab\n{% endif %}").unwrap_err();
        assert_eq!(err.offset(), Some(6));
    }
}
