// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Fallible growth for the buffers the engine owns.
//!
//! Every growable collection in the core (the slice list, array-literal
//! values) goes through [`push`], which grows geometrically (0 → 32 →
//! double) and surfaces allocation failure as an [`Error`] instead of
//! aborting. Unit tests can arm a per-thread gate that fails the Nth growth
//! to exercise the out-of-memory paths.

use crate::error::Error;

const SEED_CAPACITY: usize = 32;

pub(crate) fn push<T>(vec: &mut Vec<T>, item: T) -> Result<(), Error> {
    if vec.len() == vec.capacity() {
        grow(vec)?;
    }
    vec.push(item);
    Ok(())
}

fn grow<T>(vec: &mut Vec<T>) -> Result<(), Error> {
    #[cfg(test)]
    fault::check()?;

    let target = if vec.capacity() == 0 {
        SEED_CAPACITY
    } else {
        vec.capacity() * 2
    };
    vec.try_reserve_exact(target - vec.len())
        .map_err(|_| Error::out_of_memory())
}

#[cfg(test)]
pub(crate) mod fault {
    use std::cell::Cell;

    use crate::error::Error;

    thread_local! {
        static REMAINING: Cell<Option<usize>> = Cell::new(None);
    }

    /// Lets `successes` growths through, then fails every one after that,
    /// like a process that truly ran out of memory.
    pub(crate) fn arm(successes: usize) {
        REMAINING.with(|cell| cell.set(Some(successes)));
    }

    pub(crate) fn disarm() {
        REMAINING.with(|cell| cell.set(None));
    }

    pub(crate) fn check() -> Result<(), Error> {
        REMAINING.with(|cell| match cell.get() {
            Some(0) => Err(Error::out_of_memory()),
            Some(left) => {
                cell.set(Some(left - 1));
                Ok(())
            }
            None => Ok(()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_from_seed_then_doubles() {
        let mut vec = Vec::new();
        for i in 0..SEED_CAPACITY {
            push(&mut vec, i).unwrap();
        }
        assert_eq!(vec.capacity(), SEED_CAPACITY);
        push(&mut vec, 99).unwrap();
        assert_eq!(vec.capacity(), SEED_CAPACITY * 2);
    }

    #[test]
    fn armed_gate_fails_the_nth_growth() {
        fault::arm(0);
        let mut vec: Vec<u8> = Vec::new();
        let err = push(&mut vec, 1).unwrap_err();
        assert_eq!(err.message(), "Out of memory");
        assert!(vec.is_empty());
        fault::disarm();
        push(&mut vec, 1).unwrap();
    }
}
