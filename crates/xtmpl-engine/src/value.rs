// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::error::Error;

/// Result of evaluating a template expression.
///
/// The language deliberately has no boolean or string type; conditions reuse
/// the integer truthiness rule (`Int(0)` is false, everything else is true).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 64-bit signed integer.
    Int(i64),
    /// Double-precision float.
    Float(f64),
    /// Ordered sequence of values, produced by `[a, b, c]` literals.
    Array(Vec<Value>),
}

impl Value {
    /// Reports whether the value counts as true in an `{% if %}` condition.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Int(0))
    }

    /// Streams the printed form to `sink`: integers in decimal, floats with
    /// six fixed decimal digits, arrays as `[a, b, c]`.
    pub fn write_to(&self, sink: &mut dyn FnMut(&[u8])) {
        match self {
            Value::Int(value) => sink(value.to_string().as_bytes()),
            Value::Float(value) => sink(format!("{value:.6}").as_bytes()),
            Value::Array(items) => {
                sink(b"[");
                for (index, item) in items.iter().enumerate() {
                    item.write_to(sink);
                    if index + 1 < items.len() {
                        sink(b", ");
                    }
                }
                sink(b"]");
            }
        }
    }
}

/// Binary operators of the expression language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

impl BinOp {
    /// Source spelling of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        }
    }

    pub(crate) fn precedence(self) -> u8 {
        match self {
            BinOp::Add | BinOp::Sub => 0,
            BinOp::Mul | BinOp::Div => 1,
        }
    }

    /// Associativity is a per-operator policy used as the precedence tie-break
    /// during climbing, even though every current operator is left-associative.
    pub(crate) fn is_right_assoc(self) -> bool {
        false
    }

    /// Applies the operator under the numeric promotion rules: int ⊗ int stays
    /// int, any float operand widens the result to float. `offset` anchors the
    /// error for non-numeric operands and division by zero.
    pub(crate) fn apply(self, lhs: &Value, rhs: &Value, offset: usize) -> Result<Value, Error> {
        use Value::{Float, Int};

        match (lhs, rhs) {
            (Int(_), Int(0)) if self == BinOp::Div => Err(Error::at("Division by zero", offset)),
            (Int(a), Int(b)) => Ok(Int(self.fold_int(*a, *b))),
            (Int(a), Float(b)) => Ok(Float(self.fold_float(*a as f64, *b))),
            (Float(a), Int(b)) => Ok(Float(self.fold_float(*a, *b as f64))),
            (Float(a), Float(b)) => Ok(Float(self.fold_float(*a, *b))),
            _ => Err(Error::at(
                format!("Bad \"{}\" operand", self.symbol()),
                offset,
            )),
        }
    }

    fn fold_int(self, a: i64, b: i64) -> i64 {
        match self {
            BinOp::Add => a.wrapping_add(b),
            BinOp::Sub => a.wrapping_sub(b),
            BinOp::Mul => a.wrapping_mul(b),
            BinOp::Div => a.wrapping_div(b),
        }
    }

    fn fold_float(self, a: f64, b: f64) -> f64 {
        match self {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => a / b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn printed(value: &Value) -> String {
        let mut out = Vec::new();
        value.write_to(&mut |chunk| out.extend_from_slice(chunk));
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn prints_ints_in_decimal() {
        assert_eq!(printed(&Value::Int(0)), "0");
        assert_eq!(printed(&Value::Int(-42)), "-42");
    }

    #[test]
    fn prints_floats_with_six_decimals() {
        assert_eq!(printed(&Value::Float(1.1)), "1.100000");
        assert_eq!(printed(&Value::Float(2.0 / 3.0)), "0.666667");
    }

    #[test]
    fn prints_arrays_recursively() {
        assert_eq!(printed(&Value::Array(Vec::new())), "[]");
        let nested = Value::Array(vec![
            Value::Int(1),
            Value::Array(vec![Value::Int(2), Value::Float(3.0)]),
        ]);
        assert_eq!(printed(&nested), "[1, [2, 3.000000]]");
    }

    #[test]
    fn int_arithmetic_stays_int() {
        let v = BinOp::Div.apply(&Value::Int(2), &Value::Int(3), 0).unwrap();
        assert_eq!(v, Value::Int(0));
    }

    #[test]
    fn float_operand_promotes_result() {
        let v = BinOp::Add.apply(&Value::Int(2), &Value::Float(3.0), 0).unwrap();
        assert_eq!(v, Value::Float(5.0));
        let v = BinOp::Sub.apply(&Value::Float(2.0), &Value::Int(3), 0).unwrap();
        assert_eq!(v, Value::Float(-1.0));
    }

    #[test]
    fn array_operands_are_rejected() {
        for op in [BinOp::Add, BinOp::Sub, BinOp::Mul, BinOp::Div] {
            let err = op
                .apply(&Value::Int(1), &Value::Array(Vec::new()), 7)
                .unwrap_err();
            assert_eq!(err.message(), format!("Bad \"{}\" operand", op.symbol()));
            assert_eq!(err.offset(), Some(7));
        }
    }

    #[test]
    fn integer_division_by_zero_is_a_typed_error() {
        let err = BinOp::Div.apply(&Value::Int(1), &Value::Int(0), 2).unwrap_err();
        assert_eq!(err.message(), "Division by zero");
    }

    #[test]
    fn float_division_by_zero_follows_ieee() {
        let v = BinOp::Div.apply(&Value::Float(1.0), &Value::Int(0), 0).unwrap();
        assert_eq!(v, Value::Float(f64::INFINITY));
    }
}
