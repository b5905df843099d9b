// SPDX-License-Identifier: Apache-2.0 OR MIT
use smallvec::SmallVec;

use crate::value::Value;

/// One frame of named bindings, chained to its enclosing frame.
///
/// Lookup walks innermost to outermost and returns the first match, so an
/// inner `for` binding shadows an equally named outer variable for exactly
/// the dynamic extent of the loop body. Only `for` introduces bindings (a
/// loop index and the current element), hence the two inline slots; a
/// caller-built root scope may spill past them.
#[derive(Debug, Default)]
pub struct Scope<'p> {
    parent: Option<&'p Scope<'p>>,
    bindings: SmallVec<[(String, Value); 2]>,
}

impl<'p> Scope<'p> {
    /// Creates an empty root scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a binding in this frame.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if let Some(slot) = self.bindings.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.bindings.push((name, value));
        }
    }

    /// Resolves `name` through the chain, innermost first.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some((_, value)) = current.bindings.iter().find(|(n, _)| n == name) {
                return Some(value);
            }
            scope = current.parent;
        }
        None
    }

    pub(crate) fn frame(parent: Option<&'p Scope<'p>>) -> Self {
        Self {
            parent,
            bindings: SmallVec::new(),
        }
    }

    /// Binds the loop index and, when named, the current element. The first
    /// iteration creates the slots; later ones only swap the values, and a
    /// duplicate name keeps the index binding in front (first match wins on
    /// lookup, as in the original engine).
    pub(crate) fn bind_iteration(
        &mut self,
        index_name: &str,
        index: i64,
        element_name: Option<&str>,
        element: Value,
    ) {
        if self.bindings.is_empty() {
            self.bindings.push((index_name.to_string(), Value::Int(index)));
            if let Some(name) = element_name {
                self.bindings.push((name.to_string(), element));
            }
        } else {
            self.bindings[0].1 = Value::Int(index);
            if element_name.is_some() {
                self.bindings[1].1 = element;
            }
        }
    }
}
