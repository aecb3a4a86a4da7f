//! Cursor coordinates
//!
//! Editors report the cursor as a 1-indexed (line, column) pair while the
//! scanners in this crate work on byte offsets. Columns count characters,
//! so a position inside multi-byte text still maps to a char boundary.

use serde::{Deserialize, Serialize};

/// 1-indexed cursor position as reported by the editor widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPosition {
    pub line: usize,
    pub column: usize,
}

impl CursorPosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Convert a (line, column) position into a byte offset into `text`.
///
/// Positions past the end of a line run on into the next one, and positions
/// past the end of the text clamp to `text.len()`.
pub fn position_to_offset(text: &str, position: CursorPosition) -> usize {
    let mut line_start = 0;
    for _ in 1..position.line {
        match text[line_start..].find('\n') {
            Some(newline) => line_start += newline + 1,
            None => return text.len(),
        }
    }

    let advance = position.column.saturating_sub(1);
    text[line_start..]
        .char_indices()
        .nth(advance)
        .map(|(i, _)| line_start + i)
        .unwrap_or(text.len())
}

/// Convert a byte offset back into a (line, column) position.
pub fn offset_to_position(text: &str, offset: usize) -> CursorPosition {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    CursorPosition { line, column }
}

/// Position just after the last character of `text`.
pub fn end_position(text: &str) -> CursorPosition {
    offset_to_position(text, text.len())
}
