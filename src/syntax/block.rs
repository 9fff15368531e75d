//! Line-prefix rules (header, quote, todo, lists) and tables.
//!
//! Each line rule receives a buffer holding exactly one line and strips the
//! syntax prefix it recognises. Block spans cover the rest of the line,
//! newline included.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::MarkdownConfig;
use crate::editor::{Annotation, AnnotationKind, Buffer, Inclusivity, ListMarker};
use crate::text::protect::is_inside;
use crate::text::{line_end, line_text};

static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6}) ").expect("Invalid header regex"));
static QUOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(>+) ?").expect("Invalid quote regex"));
static TODO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^- \[([ xX])\] ").expect("Invalid todo regex"));
static ORDERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^( *)(\d+)\. ").expect("Invalid ordered list regex"));
static UNORDERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^( *)([*+-]) ").expect("Invalid unordered list regex"));
static TABLE_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\|.*\|\s*$").expect("Invalid table row regex"));
static TABLE_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\|?\s*:?-+:?\s*(\|\s*:?-+:?\s*)*\|?\s*$").expect("Invalid table separator regex")
});

pub(super) fn header(buffer: &mut Buffer) {
    let text = line_text(buffer, 0);
    let Some(caps) = HEADER.captures(&text) else {
        return;
    };
    let level = caps[1].len();
    buffer.delete(0..level + 1);
    add_line_span(
        buffer,
        Annotation::Header {
            level: u8::try_from(level).unwrap_or(6),
        },
        Inclusivity::Exclusive,
    );
}

pub(super) fn quote(buffer: &mut Buffer, config: &MarkdownConfig) {
    let text = line_text(buffer, 0);
    let Some(m) = QUOTE.find(&text) else {
        return;
    };
    let depth = m.as_str().trim_end().len();
    buffer.delete(0..m.end());
    add_line_span(buffer, Annotation::Quote, Inclusivity::Exclusive);
    add_line_span(
        buffer,
        Annotation::Margin {
            width: config.quote_indent * depth,
        },
        Inclusivity::Exclusive,
    );
}

pub(super) fn todo(buffer: &mut Buffer) {
    let text = line_text(buffer, 0);
    let Some(caps) = TODO.captures(&text) else {
        return;
    };
    let done = !caps[1].trim().is_empty();
    let prefix = caps[0].len();
    buffer.delete(0..prefix);
    add_line_span(buffer, Annotation::Todo { done }, Inclusivity::Exclusive);
}

pub(super) fn ordered_list(buffer: &mut Buffer) {
    if has_exclusive_block(buffer) {
        return;
    }
    let text = line_text(buffer, 0);
    let Some(caps) = ORDERED.captures(&text) else {
        return;
    };
    let nested = caps[1].len();
    let number = caps[2].parse().unwrap_or(u32::MAX);
    buffer.delete(0..nested);
    add_line_span(
        buffer,
        Annotation::OrderedListItem { nested, number },
        Inclusivity::Line,
    );
}

pub(super) fn unordered_list(buffer: &mut Buffer, config: &MarkdownConfig) {
    if has_exclusive_block(buffer) {
        return;
    }
    let text = line_text(buffer, 0);
    let Some(caps) = UNORDERED.captures(&text) else {
        return;
    };
    let nested = caps[1].len();
    let Some(marker) = caps[2].chars().next().and_then(ListMarker::from_char) else {
        return;
    };
    buffer.delete(0..nested + 2);
    add_line_span(
        buffer,
        Annotation::UnorderedListItem {
            nested,
            marker,
            color: config.unordered_list_color,
        },
        Inclusivity::Line,
    );
}

/// Mark `header | separator | rows*` groups and drop the separator lines.
pub(super) fn table(buffer: &mut Buffer) {
    let mut lines = Vec::new();
    let mut pos = 0;
    while pos < buffer.len_chars() {
        let end = line_end(buffer, pos);
        let code = is_inside(buffer, pos, 1, AnnotationKind::CodeBlockLine);
        lines.push((pos..end, line_text(buffer, pos), code));
        pos = end;
    }

    let is_row = |i: usize| {
        lines
            .get(i)
            .is_some_and(|(_, text, code)| !code && TABLE_ROW.is_match(text))
    };
    let is_separator = |i: usize| {
        lines
            .get(i)
            .is_some_and(|(_, text, code)| !code && text.contains('-') && TABLE_SEPARATOR.is_match(text))
    };

    let mut tables = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if is_row(i) && is_separator(i + 1) {
            let mut end = i + 2;
            while is_row(end) {
                end += 1;
            }
            tables.push((i, end));
            i = end;
        } else {
            i += 1;
        }
    }

    for &(header, end) in tables.iter().rev() {
        tracing::debug!(rows = end - header - 1, "table");
        for (row, (range, _, _)) in lines.iter().enumerate().take(end).skip(header) {
            if row == header + 1 {
                continue;
            }
            buffer.add_span(
                Annotation::TableRow {
                    header: row == header,
                },
                range.clone(),
                Inclusivity::Exclusive,
            );
        }
        buffer.delete(lines[header + 1].0.clone());
    }
}

fn add_line_span(buffer: &mut Buffer, annotation: Annotation, inclusivity: Inclusivity) {
    let end = buffer.len_chars();
    if end > 0 {
        buffer.add_span(annotation, 0..end, inclusivity);
    }
}

/// Headers and todo items never double as list items.
fn has_exclusive_block(buffer: &Buffer) -> bool {
    buffer.spans_of(AnnotationKind::Header).next().is_some()
        || buffer.spans_of(AnnotationKind::Todo).next().is_some()
}
