// SPDX-License-Identifier: Apache-2.0 OR MIT
use thiserror::Error as ThisError;

/// Upper bound on the stored message, matching the fixed diagnostic buffer of
/// the original engine. Longer messages are cut at a character boundary and
/// flagged as truncated.
pub const MESSAGE_MAX: usize = 256;

/// Structured failure record for a slice or render pass.
///
/// A render either succeeds or produces exactly one of these; the two states
/// are mutually exclusive. The byte offset is absolute within the template
/// once the error reaches the caller; inner frames report offsets relative
/// to the substring they scan and each enclosing frame rebases them via
/// [`Error::rebase`]. Row and column are filled in lazily, only for a failing
/// render, and stay unset when no offset is known (for example on an
/// allocation failure).
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("{message}")]
pub struct Error {
    message: String,
    offset: Option<usize>,
    row: Option<usize>,
    col: Option<usize>,
    truncated: bool,
}

impl Error {
    /// Creates an error with no associated template position.
    pub fn msg(message: impl Into<String>) -> Self {
        let (message, truncated) = cap_message(message.into());
        Self {
            message,
            offset: None,
            row: None,
            col: None,
            truncated,
        }
    }

    /// Creates an error anchored at a byte offset into the scanned text.
    pub fn at(message: impl Into<String>, offset: usize) -> Self {
        Self {
            offset: Some(offset),
            ..Self::msg(message)
        }
    }

    /// The error reported when a growth point fails to allocate.
    pub fn out_of_memory() -> Self {
        Self::msg("Out of memory")
    }

    /// Shifts a substring-relative offset into the enclosing frame's space.
    #[must_use]
    pub fn rebase(mut self, base: usize) -> Self {
        if let Some(offset) = self.offset {
            self.offset = Some(offset + base);
        }
        self
    }

    /// Derives row and column from the offset with a single newline-counting
    /// scan of the template. Both are 1-based.
    pub(crate) fn locate(&mut self, template: &str) {
        if let Some(offset) = self.offset {
            let (row, col) = position(template, offset);
            self.row = Some(row);
            self.col = Some(col);
        }
    }

    /// Human-readable diagnostic text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Absolute byte offset of the offending token, when one exists.
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    /// 1-based line of the offending token, when an offset exists.
    pub fn row(&self) -> Option<usize> {
        self.row
    }

    /// 1-based column of the offending token, when an offset exists.
    pub fn col(&self) -> Option<usize> {
        self.col
    }

    /// Whether the message was cut to fit [`MESSAGE_MAX`].
    pub fn truncated(&self) -> bool {
        self.truncated
    }
}

fn cap_message(message: String) -> (String, bool) {
    if message.len() <= MESSAGE_MAX {
        return (message, false);
    }
    let mut end = MESSAGE_MAX;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    let mut capped = message;
    capped.truncate(end);
    (capped, true)
}

fn position(template: &str, offset: usize) -> (usize, usize) {
    let upto = offset.min(template.len());
    let mut row = 1;
    let mut line_start = 0;
    for (i, byte) in template.as_bytes()[..upto].iter().enumerate() {
        if *byte == b'\n' {
            row += 1;
            line_start = i + 1;
        }
    }
    (row, upto - line_start + 1)
}
