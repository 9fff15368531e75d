//! Escape protection: literal markers are swapped for Private Use Area
//! placeholders before parsing so no rule mistakes them for syntax.

use std::ops::Range;

use crate::editor::{AnnotationKind, Buffer};

/// Private Use Area ranges placeholders are drawn from, in order.
const PLACEHOLDER_RANGES: &[std::ops::RangeInclusive<u32>] =
    &[0xE000..=0xF8FF, 0xF_0000..=0xF_FFFD, 0x10_0000..=0x10_FFFD];

/// Escapes the batch engine protects before running any rule.
pub const STANDARD_ESCAPES: &[&str] = &[
    "\\\\", "\\`", "\\*", "\\_", "\\~", "\\[", "\\]", "\\(", "\\)", "\\#", "\\>", "\\!", "\\+",
    "\\-", "\\|",
];

/// A marker and the placeholder it was given on first protection.
#[derive(Debug, Clone)]
struct Entry {
    marker: String,
    placeholder: Option<char>,
}

/// Registry of protected markers and their placeholder codepoints.
///
/// Placeholders are allocated lazily from codepoints that do not occur in
/// the buffer being protected, so user text in the Private Use Area is
/// never mistaken for a placeholder. A protector serves one buffer.
#[derive(Debug, Clone, Default)]
pub struct Protector {
    entries: Vec<Entry>,
}

impl Protector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_standard_escapes() -> Self {
        let mut protector = Self::new();
        for marker in STANDARD_ESCAPES {
            protector.register(marker);
        }
        protector
    }

    /// Register `marker` without allocating a placeholder yet.
    pub fn register(&mut self, marker: &str) -> usize {
        if let Some(idx) = self.position(marker) {
            return idx;
        }
        self.entries.push(Entry {
            marker: marker.to_string(),
            placeholder: None,
        });
        self.entries.len() - 1
    }

    /// Placeholder allocated for `marker`, if it has been protected.
    pub fn placeholder(&self, marker: &str) -> Option<char> {
        self.position(marker)
            .and_then(|idx| self.entries[idx].placeholder)
    }

    fn position(&self, marker: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.marker == marker)
    }

    /// First codepoint that is neither in `text` nor already allocated.
    fn allocate(&self, text: &str) -> Option<char> {
        PLACEHOLDER_RANGES
            .iter()
            .cloned()
            .flatten()
            .filter_map(char::from_u32)
            .find(|&c| {
                !text.contains(c) && self.entries.iter().all(|e| e.placeholder != Some(c))
            })
    }

    /// Replace every occurrence of `marker` with its placeholder. Returns
    /// whether anything changed. Spans are shifted, never added or removed
    /// beyond what the shrinking edits imply.
    pub fn protect(&mut self, buffer: &mut Buffer, marker: &str) -> bool {
        if marker.is_empty() {
            return false;
        }
        let text = buffer.text();
        if !text.contains(marker) {
            return false;
        }
        let idx = self.register(marker);
        let placeholder = match self.entries[idx].placeholder {
            Some(c) => c,
            None => {
                let Some(c) = self.allocate(&text) else {
                    tracing::warn!(marker, "no free placeholder codepoint");
                    return false;
                };
                self.entries[idx].placeholder = Some(c);
                c
            }
        }
        .to_string();
        let marker_chars = marker.chars().count();
        let hits: Vec<usize> = text
            .match_indices(marker)
            .map(|(byte, _)| super::char_offset(&text, byte))
            .collect();
        for &start in hits.iter().rev() {
            buffer.replace(start..start + marker_chars, &placeholder);
        }
        !hits.is_empty()
    }

    /// Protect every registered marker, longest first so `\\` wins over
    /// any marker it prefixes.
    pub fn protect_all(&mut self, buffer: &mut Buffer) -> bool {
        let mut markers: Vec<String> = self.entries.iter().map(|e| e.marker.clone()).collect();
        markers.sort_by_key(|m| std::cmp::Reverse(m.chars().count()));
        let mut changed = false;
        for marker in &markers {
            changed |= self.protect(buffer, marker);
        }
        changed
    }

    /// Exact inverse of [`Protector::protect`] for `marker`.
    pub fn unprotect(&self, buffer: &mut Buffer, marker: &str) -> bool {
        let Some(placeholder) = self.placeholder(marker) else {
            return false;
        };
        self.restore(buffer, placeholder, marker)
    }

    /// Restore every placeholder to its marker minus the leading escape
    /// backslash, which is how escaped characters end up in parsed output.
    pub fn unprotect_literal(&self, buffer: &mut Buffer) -> bool {
        let mut changed = false;
        for entry in &self.entries {
            let Some(placeholder) = entry.placeholder else {
                continue;
            };
            let literal = entry.marker.strip_prefix('\\').unwrap_or(&entry.marker);
            changed |= self.restore(buffer, placeholder, literal);
        }
        changed
    }

    /// Exact restore of every placeholder inside `range`, for regions such
    /// as code where escapes carry no meaning. Returns the new range end.
    pub fn unprotect_range(&self, buffer: &mut Buffer, range: Range<usize>) -> usize {
        let mut end = range.end.min(buffer.len_chars());
        let hits: Vec<(usize, usize)> = buffer
            .chars_at(range.start)
            .take(end.saturating_sub(range.start))
            .enumerate()
            .filter_map(|(i, c)| {
                let idx = self
                    .entries
                    .iter()
                    .position(|e| e.placeholder == Some(c))?;
                Some((range.start + i, idx))
            })
            .collect();
        for &(pos, idx) in hits.iter().rev() {
            let marker = &self.entries[idx].marker;
            buffer.replace(pos..pos + 1, marker);
            end += marker.chars().count() - 1;
        }
        end
    }

    fn restore(&self, buffer: &mut Buffer, placeholder: char, with: &str) -> bool {
        let hits: Vec<usize> = buffer
            .chars_at(0)
            .enumerate()
            .filter_map(|(i, c)| (c == placeholder).then_some(i))
            .collect();
        for &pos in hits.iter().rev() {
            buffer.replace(pos..pos + 1, with);
        }
        !hits.is_empty()
    }
}

/// Whether `[position, position + length)` is fully covered by one span of
/// `kind`.
pub fn is_inside(buffer: &Buffer, position: usize, length: usize, kind: AnnotationKind) -> bool {
    let end = position + length;
    buffer
        .spans_of(kind)
        .any(|s| s.start() <= position && end <= s.end())
}
