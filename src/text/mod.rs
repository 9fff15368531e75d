//! Line-boundary helpers shared by the batch engine and the live
//! maintainers, plus escape protection and token plumbing.

pub mod protect;
pub mod token;

use crate::editor::Buffer;

pub use protect::Protector;
pub use token::EditToken;

/// Offset of the first `'\n'` at or after `from`, if any.
pub fn next_newline(buffer: &Buffer, from: usize) -> Option<usize> {
    if from >= buffer.len_chars() {
        return None;
    }
    buffer
        .chars_at(from)
        .position(|c| c == '\n')
        .map(|i| from + i)
}

/// Offset of the last `'\n'` strictly before `from`, if any.
pub fn previous_newline(buffer: &Buffer, from: usize) -> Option<usize> {
    let from = safe_clamp(from, buffer);
    let mut chars = buffer.chars_at(from);
    let mut pos = from;
    while let Some(c) = chars.prev() {
        pos -= 1;
        if c == '\n' {
            return Some(pos);
        }
    }
    None
}

/// Start of the line containing `pos`.
pub fn line_start(buffer: &Buffer, pos: usize) -> usize {
    previous_newline(buffer, pos).map_or(0, |nl| nl + 1)
}

/// End of the line containing `pos`, including its newline; the buffer
/// length for the last line.
pub fn line_end(buffer: &Buffer, pos: usize) -> usize {
    next_newline(buffer, pos).map_or(buffer.len_chars(), |nl| nl + 1)
}

/// Line containing `pos` without its terminator.
pub fn line_text(buffer: &Buffer, pos: usize) -> String {
    let start = line_start(buffer, pos);
    let end = next_newline(buffer, start).unwrap_or(buffer.len_chars());
    buffer.slice(start..end)
}

pub fn safe_clamp(pos: usize, buffer: &Buffer) -> usize {
    pos.min(buffer.len_chars())
}

/// Byte offset in `s` to char offset.
pub(crate) fn char_offset(s: &str, byte: usize) -> usize {
    s[..byte].chars().count()
}
