// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Render engine interpreting the flat slice stream.
//!
//! There is no parse tree: control flow is executed directly over the slice
//! sequence with two primitives, a sequential `render_until` that executes
//! slices up to a terminator and a `skip_balanced` that scans past a region
//! without executing it, tracking nesting depth. `for` re-runs its body range
//! once per element with a fresh scope frame chained onto the caller's.

use std::time::Instant;

use crate::error::Error;
use crate::eval;
use crate::scope::Scope;
use crate::slicer::{self, Slice, SliceKind};
use crate::telemetry;
use crate::value::Value;

/// Longest accepted iteration variable name in a `for` clause, in bytes.
pub const NAME_MAX: usize = 31;

/// Slices the template and renders it against `scope`, streaming output
/// chunks to `sink` in document order.
///
/// The slice list lives only for the duration of this call. On failure the
/// returned error carries an absolute byte offset plus 1-based row/column
/// whenever a token position is known.
pub fn render<S: FnMut(&[u8])>(
    template: &str,
    scope: Option<&Scope<'_>>,
    mut sink: S,
) -> Result<(), Error> {
    let started = Instant::now();
    let result = render_impl(template, scope, &mut sink);
    telemetry::record_render(template.len(), started.elapsed(), result.is_ok());
    result.map_err(|mut err| {
        err.locate(template);
        err
    })
}

fn render_impl(
    template: &str,
    scope: Option<&Scope<'_>>,
    sink: &mut dyn FnMut(&[u8]),
) -> Result<(), Error> {
    let slices = slicer::slice_template(template)?;
    let mut renderer = Renderer {
        template,
        slices: &slices,
        pos: 0,
        sink,
    };
    renderer.render_until(scope, &[])?;
    Ok(())
}

struct Renderer<'a, 's> {
    template: &'a str,
    slices: &'s [Slice],
    pos: usize,
    sink: &'s mut dyn FnMut(&[u8]),
}

impl<'a> Renderer<'a, '_> {
    /// Executes slices sequentially until one of `stops` (consumed) or the
    /// `End` terminator (left in place); returns the kind that ended the run.
    fn render_until(
        &mut self,
        scope: Option<&Scope<'_>>,
        stops: &[SliceKind],
    ) -> Result<SliceKind, Error> {
        loop {
            let slice = self.slices[self.pos];
            if slice.kind == SliceKind::End {
                return Ok(SliceKind::End);
            }
            self.pos += 1;
            if stops.contains(&slice.kind) {
                return Ok(slice.kind);
            }

            match slice.kind {
                SliceKind::Text => {
                    let text = self.text(slice);
                    (self.sink)(text.as_bytes());
                }
                SliceKind::Expr => {
                    let value = eval::eval(self.text(slice), scope)
                        .map_err(|err| err.rebase(slice.off))?;
                    value.write_to(self.sink);
                }
                SliceKind::If => self.render_if(slice, scope)?,
                SliceKind::For => self.render_for(slice, scope)?,
                SliceKind::Else | SliceKind::EndIf | SliceKind::EndFor | SliceKind::End => {
                    // The slicer validates terminators and every control arm
                    // consumes its own.
                    unreachable!("unbalanced slice stream")
                }
            }
        }
    }

    /// Scans forward without executing, stopping at the first of `stops`
    /// found at nesting depth zero (consumed) or at `End` (left in place).
    fn skip_balanced(&mut self, stops: &[SliceKind]) -> SliceKind {
        let mut depth = 0usize;
        loop {
            let kind = self.slices[self.pos].kind;
            if kind == SliceKind::End {
                return SliceKind::End;
            }
            self.pos += 1;
            if depth == 0 && stops.contains(&kind) {
                return kind;
            }
            match kind {
                SliceKind::If | SliceKind::For => depth += 1,
                SliceKind::EndIf | SliceKind::EndFor => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
    }

    fn render_if(&mut self, slice: Slice, scope: Option<&Scope<'_>>) -> Result<(), Error> {
        let condition =
            eval::eval(self.text(slice), scope).map_err(|err| err.rebase(slice.off))?;

        if condition.is_truthy() {
            if self.render_until(scope, &[SliceKind::Else, SliceKind::EndIf])? == SliceKind::Else {
                self.skip_balanced(&[SliceKind::EndIf]);
            }
        } else if self.skip_balanced(&[SliceKind::Else, SliceKind::EndIf]) == SliceKind::Else {
            self.render_until(scope, &[SliceKind::EndIf])?;
        }
        Ok(())
    }

    fn render_for(&mut self, slice: Slice, scope: Option<&Scope<'_>>) -> Result<(), Error> {
        let clause = self.text(slice);
        let parsed = parse_for_clause(clause).map_err(|err| err.rebase(slice.off))?;

        let collection = eval::eval(&clause[parsed.expr_start..], scope)
            .map_err(|err| err.rebase(slice.off + parsed.expr_start))?;
        let Value::Array(items) = collection else {
            return Err(Error::at(
                "Iteration subject isn't an array",
                slice.off + parsed.expr_start,
            ));
        };

        if items.is_empty() {
            self.skip_balanced(&[SliceKind::EndFor]);
            return Ok(());
        }

        let body = self.pos;
        let mut frame = Scope::frame(scope);
        for (index, element) in items.into_iter().enumerate() {
            frame.bind_iteration(parsed.index_name, index as i64, parsed.element_name, element);
            self.pos = body;
            self.render_until(Some(&frame), &[SliceKind::EndFor])?;
        }
        Ok(())
    }

    fn text(&self, slice: Slice) -> &'a str {
        &self.template[slice.off..slice.off + slice.len]
    }
}

struct ForClause<'a> {
    index_name: &'a str,
    element_name: Option<&'a str>,
    expr_start: usize,
}

/// Parses the `name[, name] in <collection>` clause of a `for` slice.
/// Offsets in errors are clause-relative; the caller rebases them.
fn parse_for_clause(clause: &str) -> Result<ForClause<'_>, Error> {
    let bytes = clause.as_bytes();
    let mut k = skip_whitespace(bytes, 0);

    if k == bytes.len() {
        return Err(Error::at("For statement ended unexpectedly", k));
    }
    if !is_name_start(bytes[k]) {
        return Err(Error::at(
            "Missing iteration variable name after [for] keyword",
            k,
        ));
    }
    let (index_name, next) = scan_name(clause, k)?;
    k = skip_whitespace(bytes, next);

    if k == bytes.len() {
        return Err(Error::at("For statement ended unexpectedly", k));
    }

    let mut element_name = None;
    if bytes[k] == b',' {
        k = skip_whitespace(bytes, k + 1);
        if k == bytes.len() {
            return Err(Error::at("For statement ended unexpectedly", k));
        }
        if !is_name_start(bytes[k]) {
            return Err(Error::at(
                "Missing second iteration variable name after ','",
                k,
            ));
        }
        let (name, next) = scan_name(clause, k)?;
        element_name = Some(name);
        k = skip_whitespace(bytes, next);
        if k == bytes.len() {
            return Err(Error::at("For statement ended unexpectedly", k));
        }
    }

    // The `in` keyword must be bounded by a non-identifier character.
    let has_in = k + 1 < bytes.len()
        && bytes[k] == b'i'
        && bytes[k + 1] == b'n'
        && (k + 2 == bytes.len() || !is_name_part(bytes[k + 2]));
    if !has_in {
        return Err(Error::at(
            "Missing in keyword after iteration variable names",
            k,
        ));
    }

    Ok(ForClause {
        index_name,
        element_name,
        expr_start: k + 2,
    })
}

fn scan_name(clause: &str, start: usize) -> Result<(&str, usize), Error> {
    let bytes = clause.as_bytes();
    let mut k = start;
    while k < bytes.len() && is_name_part(bytes[k]) {
        k += 1;
    }
    let name = &clause[start..k];
    if matches!(name, "in" | "if" | "for" | "else" | "endif" | "endfor") {
        return Err(Error::at(
            format!("Unexpected keyword [{name}] where an iteration variable name was expected"),
            start,
        ));
    }
    if name.len() > NAME_MAX {
        return Err(Error::at(
            format!("Variable name [{name}] is too long (the maximum is {NAME_MAX})"),
            start,
        ));
    }
    Ok((name, k))
}

fn is_name_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

fn is_name_part(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

fn skip_whitespace(bytes: &[u8], mut k: usize) -> usize {
    while k < bytes.len() && bytes[k].is_ascii_whitespace() {
        k += 1;
    }
    k
}
