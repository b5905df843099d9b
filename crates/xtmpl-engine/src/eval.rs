// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Recursive-descent, precedence-climbing evaluator for the expression
//! sub-language (`INT`, `INT.DIGITS`, identifiers, `[a, b]` literals and the
//! four arithmetic operators, no parentheses).
//!
//! The evaluator operates directly on a template substring and reports error
//! offsets relative to that substring; the render engine rebases them by the
//! slice's absolute start. Trailing input after a complete expression is left
//! unconsumed; whether leftovers matter is the caller's concern.

use crate::error::Error;
use crate::mem;
use crate::scope::Scope;
use crate::value::{BinOp, Value};

/// Evaluates `src` against the scope chain.
pub(crate) fn eval(src: &str, scope: Option<&Scope<'_>>) -> Result<Value, Error> {
    let mut cursor = Cursor {
        src,
        bytes: src.as_bytes(),
        pos: 0,
        scope,
    };
    cursor.expr()
}

struct Cursor<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    scope: Option<&'a Scope<'a>>,
}

impl Cursor<'_> {
    fn expr(&mut self) -> Result<Value, Error> {
        let lhs = self.primary()?;
        self.climb(lhs, 0)
    }

    /// Folds operators at or above `min_prec` into `lhs`. A following
    /// operator of strictly higher precedence (or an equal-precedence
    /// right-associative one) is climbed into the right-hand side first,
    /// with a raised floor, before the pending operator is applied.
    fn climb(&mut self, mut lhs: Value, min_prec: u8) -> Result<Value, Error> {
        let mut reset = self.pos;
        while let Some((op, op_offset)) = self.next_operator() {
            if op.precedence() < min_prec {
                break;
            }

            let mut rhs = self.primary()?;

            let mut inner_reset = self.pos;
            while let Some((next, _)) = self.next_operator() {
                let climbs = next.precedence() > op.precedence()
                    || (next.is_right_assoc() && next.precedence() == op.precedence());
                if !climbs {
                    break;
                }
                // Rewind so the recursive call re-reads the operator.
                self.pos = inner_reset;
                let floor = op.precedence() + u8::from(next.precedence() > op.precedence());
                rhs = self.climb(rhs, floor)?;
                inner_reset = self.pos;
            }
            self.pos = inner_reset;

            lhs = op.apply(&lhs, &rhs, op_offset)?;
            reset = self.pos;
        }
        self.pos = reset;
        Ok(lhs)
    }

    fn primary(&mut self) -> Result<Value, Error> {
        self.skip_whitespace();
        let Some(&byte) = self.bytes.get(self.pos) else {
            return Err(Error::at(
                "Expression ended where a primary expression was expected",
                self.pos,
            ));
        };

        if byte.is_ascii_alphabetic() || byte == b'_' {
            self.identifier()
        } else if byte.is_ascii_digit() {
            self.number()
        } else if byte == b'[' {
            self.array()
        } else {
            Err(Error::at(
                format!(
                    "Unexpected character [{}] where a primary expression was expected",
                    self.char_at(self.pos)
                ),
                self.pos,
            ))
        }
    }

    fn identifier(&mut self) -> Result<Value, Error> {
        let start = self.pos;
        while matches!(self.bytes.get(self.pos), Some(b) if b.is_ascii_alphanumeric() || *b == b'_')
        {
            self.pos += 1;
        }
        let name = &self.src[start..self.pos];
        match self.scope.and_then(|scope| scope.get(name)) {
            Some(value) => Ok(value.clone()),
            None => Err(Error::at(format!("Undefined variable [{name}]"), start)),
        }
    }

    fn number(&mut self) -> Result<Value, Error> {
        let start = self.pos;
        let mut acc: i64 = 0;
        while let Some(b) = self.bytes.get(self.pos) {
            if !b.is_ascii_digit() {
                break;
            }
            let digit = i64::from(b - b'0');
            if acc > (i64::MAX - digit) / 10 {
                return Err(Error::at("Overflow", start));
            }
            acc = acc * 10 + digit;
            self.pos += 1;
        }

        // A dot only counts as a decimal point with a digit right after it;
        // a trailing bare dot is left for the caller.
        if self.pos + 1 < self.bytes.len()
            && self.bytes[self.pos] == b'.'
            && self.bytes[self.pos + 1].is_ascii_digit()
        {
            self.pos += 1;
            let mut fraction = 0.0;
            let mut place = 1.0;
            while let Some(b) = self.bytes.get(self.pos) {
                if !b.is_ascii_digit() {
                    break;
                }
                place /= 10.0;
                fraction += place * f64::from(b - b'0');
                self.pos += 1;
            }
            return Ok(Value::Float(acc as f64 + fraction));
        }

        Ok(Value::Int(acc))
    }

    fn array(&mut self) -> Result<Value, Error> {
        self.pos += 1; // '['
        self.skip_whitespace();
        if self.pos == self.bytes.len() {
            return Err(Error::at("Expression ended inside of an array", self.pos));
        }

        let mut items = Vec::new();
        if self.bytes[self.pos] != b']' {
            loop {
                let item = self.expr()?;
                mem::push(&mut items, item)?;

                self.skip_whitespace();
                match self.bytes.get(self.pos) {
                    None => {
                        return Err(Error::at("Expression ended inside of an array", self.pos));
                    }
                    Some(b']') => break,
                    Some(b',') => self.pos += 1,
                    Some(_) => {
                        return Err(Error::at(
                            format!(
                                "Unexpected character [{}] inside of an array",
                                self.char_at(self.pos)
                            ),
                            self.pos,
                        ));
                    }
                }
            }
        }

        self.pos += 1; // ']'
        Ok(Value::Array(items))
    }

    fn next_operator(&mut self) -> Option<(BinOp, usize)> {
        self.skip_whitespace();
        let op = match self.bytes.get(self.pos)? {
            b'+' => BinOp::Add,
            b'-' => BinOp::Sub,
            b'*' => BinOp::Mul,
            b'/' => BinOp::Div,
            _ => return None,
        };
        let offset = self.pos;
        self.pos += 1;
        Some((op, offset))
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.bytes.get(self.pos), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn char_at(&self, pos: usize) -> char {
        self.src
            .get(pos..)
            .and_then(|rest| rest.chars().next())
            .unwrap_or('?')
    }
}
