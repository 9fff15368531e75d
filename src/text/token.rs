//! Batches of discovered annotations, committed to a buffer in one pass.

use regex::Regex;

use super::{char_offset, line_end, line_start};
use crate::editor::{Annotation, AnnotationKind, Buffer, Inclusivity};

/// Blanks out text a pattern must not see. Same char count as what it hides.
const BLANK: char = '\u{F8FF}';

/// One annotation found by a parse pass, not yet attached to a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditToken {
    pub annotation: Annotation,
    pub start: usize,
    pub end: usize,
    pub inclusivity: Inclusivity,
}

impl EditToken {
    pub const fn new(annotation: Annotation, start: usize, end: usize) -> Self {
        Self {
            annotation,
            start,
            end,
            inclusivity: Inclusivity::Exclusive,
        }
    }

    pub const fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

/// Find every non-overlapping match of `pattern`, leftmost first.
///
/// Matching runs on a working copy where occurrences of `ignore` are
/// blanked, and each match is blanked once claimed so later searches can
/// never land inside it.
pub fn parse(
    buffer: &Buffer,
    pattern: &Regex,
    ignore: Option<&str>,
    make: impl Fn() -> Annotation,
) -> Vec<EditToken> {
    let mut work = buffer.text();
    if let Some(ignore) = ignore.filter(|s| !s.is_empty()) {
        let blank: String = std::iter::repeat_n(BLANK, ignore.chars().count()).collect();
        work = work.replace(ignore, &blank);
    }

    let mut tokens = Vec::new();
    while let Some(m) = pattern.find(&work) {
        if m.is_empty() {
            break;
        }
        let start = char_offset(&work, m.start());
        let len = m.as_str().chars().count();
        tokens.push(EditToken::new(make(), start, start + len));
        let blank: String = std::iter::repeat_n(BLANK, len).collect();
        work.replace_range(m.range(), &blank);
    }
    tokens
}

/// Commit tokens as spans.
pub fn set_spans(buffer: &mut Buffer, tokens: Vec<EditToken>) {
    for token in tokens {
        buffer.add_span(token.annotation, token.start..token.end, token.inclusivity);
    }
}

/// Commit tokens after clearing whatever spans they fully cover.
pub fn set_code_spans(buffer: &mut Buffer, tokens: Vec<EditToken>) {
    for token in &tokens {
        buffer.retain_spans(|s| !(token.start <= s.start() && s.end() <= token.end));
    }
    set_spans(buffer, tokens);
}

/// Remove spans of `kind` that touch the line containing `pos`. Code-block
/// lines take their whole chain with them.
pub fn remove_spans(buffer: &mut Buffer, pos: usize, kind: AnnotationKind) {
    let start = line_start(buffer, pos);
    let end = line_end(buffer, pos).max(start + 1);
    let ids: Vec<_> = buffer
        .spans_overlapping(start, end)
        .filter(|s| s.kind() == kind)
        .map(crate::editor::Span::id)
        .collect();
    for id in ids {
        if kind == AnnotationKind::CodeBlockLine {
            buffer.remove_chain(id);
        } else {
            buffer.remove_span(id);
        }
    }
}

/// Tokens lying within the line containing `pos`.
pub fn matched_tokens(buffer: &Buffer, tokens: Vec<EditToken>, pos: usize) -> Vec<EditToken> {
    let start = line_start(buffer, pos);
    let end = line_end(buffer, pos);
    tokens
        .into_iter()
        .filter(|t| t.start >= start && t.end <= end)
        .collect()
}
