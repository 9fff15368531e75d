//! Live list maintenance.
//!
//! [`ListLive`] keeps ordered and unordered list spans in step with typing.
//! In live mode the marker text stays in the buffer and each list span covers
//! exactly one line, newline included, with [`Inclusivity::Line`].

use std::ops::Range;

use crate::config::MarkdownConfig;
use crate::editor::{
    Annotation, AnnotationKind, Buffer, EditContext, EditDelta, EditListener, Inclusivity,
    ListMarker, Rgb, SpanId,
};
use crate::text::{line_end, line_start, line_text};

/// Recognised shape of one list line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListLine {
    Ordered { nested: usize, number: u32 },
    Unordered { nested: usize, marker: ListMarker },
}

impl ListLine {
    /// `spaces digits ". "` or `spaces [*+-] " "` at the start of `text`.
    pub fn parse(text: &str) -> Option<Self> {
        let nested = nested(text);
        let rest = &text[nested..];
        if let Some(marker) = rest.chars().next().and_then(ListMarker::from_char) {
            return rest[1..]
                .starts_with(' ')
                .then_some(Self::Unordered { nested, marker });
        }
        let digits = rest.chars().take_while(char::is_ascii_digit).count();
        if digits == 0 || !rest[digits..].starts_with(". ") {
            return None;
        }
        Some(Self::Ordered {
            nested,
            number: order_number(rest),
        })
    }

    fn from_annotation(annotation: &Annotation) -> Option<Self> {
        match *annotation {
            Annotation::OrderedListItem { nested, number } => Some(Self::Ordered { nested, number }),
            Annotation::UnorderedListItem { nested, marker, .. } => {
                Some(Self::Unordered { nested, marker })
            }
            _ => None,
        }
    }

    pub const fn nested(self) -> usize {
        match self {
            Self::Ordered { nested, .. } | Self::Unordered { nested, .. } => nested,
        }
    }

    /// Chars taken by indentation plus marker, e.g. 5 for `"  1. "`.
    pub fn marker_width(self) -> usize {
        match self {
            Self::Ordered { nested, number } => nested + number.to_string().len() + 2,
            Self::Unordered { nested, .. } => nested + 2,
        }
    }

    /// Marker text for the item that follows this one.
    fn continuation(self) -> String {
        let indent = " ".repeat(self.nested());
        match self {
            Self::Ordered { number, .. } => format!("{indent}{}. ", number.saturating_add(1)),
            Self::Unordered { marker, .. } => format!("{indent}{} ", marker.as_char()),
        }
    }

    const fn next(self) -> Self {
        match self {
            Self::Ordered { nested, number } => Self::Ordered {
                nested,
                number: number.saturating_add(1),
            },
            unordered @ Self::Unordered { .. } => unordered,
        }
    }

    const fn outdented(self) -> Self {
        match self {
            Self::Ordered { nested, number } => Self::Ordered {
                nested: nested.saturating_sub(1),
                number,
            },
            Self::Unordered { nested, marker } => Self::Unordered {
                nested: nested.saturating_sub(1),
                marker,
            },
        }
    }

    const fn annotation(self, color: Rgb) -> Annotation {
        match self {
            Self::Ordered { nested, number } => Annotation::OrderedListItem { nested, number },
            Self::Unordered { nested, marker } => Annotation::UnorderedListItem {
                nested,
                marker,
                color,
            },
        }
    }
}

/// Leading spaces.
pub fn nested(text: &str) -> usize {
    text.chars().take_while(|c| *c == ' ').count()
}

/// Value of the leading digit run, spaces tolerated inside it. Saturates.
pub fn order_number(text: &str) -> u32 {
    let mut number: u32 = 0;
    for c in text.chars() {
        match c.to_digit(10) {
            Some(d) => number = number.saturating_mul(10).saturating_add(d),
            None if c == ' ' => {}
            None => break,
        }
    }
    number
}

/// A list span found on some line.
#[derive(Debug, Clone)]
struct Item {
    id: SpanId,
    range: Range<usize>,
    line: ListLine,
    color: Option<Rgb>,
}

/// The list span covering the start of the line that contains `pos`.
fn item_on_line(buffer: &Buffer, pos: usize) -> Option<Item> {
    let ls = line_start(buffer, pos);
    buffer
        .spans()
        .iter()
        .filter(|s| s.annotation.is_list_item() && s.start() <= ls && ls < s.end())
        .find_map(|s| {
            let color = match s.annotation {
                Annotation::UnorderedListItem { color, .. } => Some(color),
                _ => None,
            };
            Some(Item {
                id: s.id(),
                range: s.range(),
                line: ListLine::from_annotation(&s.annotation)?,
                color,
            })
        })
}

fn in_code_block(buffer: &Buffer, pos: usize) -> bool {
    let ls = line_start(buffer, pos);
    let le = line_end(buffer, pos).max(ls + 1);
    buffer
        .spans_overlapping(ls, le)
        .any(|s| s.kind() == AnnotationKind::CodeBlockLine)
}

/// Continues, terminates, renumbers and detects list items as the user
/// types.
#[derive(Debug, Clone)]
pub struct ListLive {
    color: Rgb,
    enabled: bool,
    needs_format: bool,
}

impl ListLive {
    pub const fn new(config: &MarkdownConfig) -> Self {
        Self {
            color: config.unordered_list_color,
            enabled: config.syntax.lists,
            needs_format: false,
        }
    }

    /// Deleting `removed` joins every line it touches into the first one.
    /// The first line's item survives and the items of the joined lines go.
    fn merge_lines(ctx: &mut EditContext<'_>, removed: Range<usize>) {
        let buffer = ctx.buffer();
        let first = item_on_line(buffer, removed.start);
        let merged_end = line_end(buffer, removed.end);
        let joined: Vec<SpanId> = buffer
            .spans_overlapping(removed.start, merged_end)
            .filter(|s| s.annotation.is_list_item())
            .filter(|s| first.as_ref().is_none_or(|first| first.id != s.id()))
            .map(|s| s.id())
            .collect();

        let buffer = ctx.buffer_mut();
        for id in joined {
            buffer.remove_span(id);
        }
        if let Some(first) = first {
            tracing::debug!(?first.line, "list lines merged");
            buffer.set_span_range(first.id, first.range.start..merged_end);
        }
    }

    fn newline_in_item(&self, ctx: &mut EditContext<'_>, at: usize, item: &Item) {
        let Range { start, end } = item.range.clone();
        if at == start {
            // Enter before the marker pushes the whole item down a line.
            ctx.buffer_mut().set_span_range(item.id, start + 1..end);
            return;
        }

        let buffer = ctx.buffer();
        let trailing = usize::from(end - 1 > at && buffer.char_at(end - 1) == Some('\n'));
        let content = (end - start).saturating_sub(1 + trailing);
        let color = item.color.unwrap_or(self.color);

        if content > item.line.marker_width() {
            let next_start = at + 1;
            tracing::debug!(?item.line, "list item continued");
            ctx.buffer_mut().set_span_range(item.id, start..next_start);
            ctx.corrective_edit(next_start..next_start, &item.line.continuation());
            let next_end = line_end(ctx.buffer(), next_start);
            ctx.buffer_mut().add_span(
                item.line.next().annotation(color),
                next_start..next_end,
                Inclusivity::Line,
            );
        } else if item.line.nested() == 0 {
            tracing::debug!(?item.line, "empty list item removed");
            ctx.buffer_mut().remove_span(item.id);
            ctx.corrective_edit(start..end, "");
        } else {
            let outdented = item.line.outdented();
            tracing::debug!(?outdented, "empty list item outdented");
            if let Some(span) = ctx.buffer_mut().span_mut(item.id) {
                span.annotation = outdented.annotation(color);
            }
            ctx.corrective_edit(at..at + 1, "");
            if ctx.buffer().char_at(start) == Some(' ') {
                ctx.corrective_edit(start..start + 1, "");
            }
            let end = line_end(ctx.buffer(), start);
            ctx.buffer_mut().set_span_range(item.id, start..end);
        }
    }

    /// Re-derive an existing item from its line text, or drop it.
    fn reformat(&self, buffer: &mut Buffer, item: &Item) {
        let ls = line_start(buffer, item.range.start);
        let le = line_end(buffer, ls);
        match ListLine::parse(&line_text(buffer, ls)) {
            Some(line) => {
                if line != item.line {
                    tracing::debug!(from = ?item.line, to = ?line, "list item re-derived");
                }
                let color = item.color.unwrap_or(self.color);
                if let Some(span) = buffer.span_mut(item.id) {
                    span.annotation = line.annotation(color);
                }
                buffer.set_span_range(item.id, ls..le);
            }
            None => {
                tracing::debug!(?item.line, "list marker removed");
                buffer.remove_span(item.id);
            }
        }
    }

    fn create(&self, buffer: &mut Buffer, pos: usize, line: ListLine) {
        let ls = line_start(buffer, pos);
        let le = line_end(buffer, pos);
        if le > ls {
            buffer.add_span(line.annotation(self.color), ls..le, Inclusivity::Line);
        }
    }
}

impl EditListener for ListLive {
    fn before_change(&mut self, ctx: &mut EditContext<'_>, delta: EditDelta) {
        self.needs_format = false;
        if !self.enabled {
            return;
        }
        let start = delta.start;
        let removed = start..start + delta.removed;
        if delta.removed == 1 && delta.inserted == 0 && ctx.buffer().char_at(start) == Some('\n') {
            Self::merge_lines(ctx, removed);
            return;
        }
        if delta.removed > 1 && ctx.buffer().slice(removed.clone()).contains('\n') {
            Self::merge_lines(ctx, removed);
        }
        if delta.removed > 0 {
            self.needs_format = item_on_line(ctx.buffer(), start)
                .is_some_and(|item| start < item.range.start + item.line.marker_width());
        }
    }

    fn after_change(&mut self, ctx: &mut EditContext<'_>, delta: EditDelta) {
        if !self.enabled {
            return;
        }
        let needs_format = std::mem::take(&mut self.needs_format);
        let start = delta.start;
        let buffer = ctx.buffer();
        let newline_input =
            delta.inserted == 1 && delta.removed == 0 && buffer.char_at(start) == Some('\n');
        let item = item_on_line(buffer, start);

        if newline_input && let Some(item) = &item {
            self.newline_in_item(ctx, start, item);
            return;
        }

        let at_line_start = start == line_start(buffer, start);
        let parsed = ListLine::parse(&line_text(buffer, start));
        let in_code = in_code_block(buffer, start);
        match (item, parsed) {
            (None, Some(line)) if at_line_start && !in_code => {
                tracing::debug!(?line, "list marker typed at line start");
                self.create(ctx.buffer_mut(), start, line);
            }
            (Some(item), _) if needs_format || start < item.range.start + item.line.marker_width() => {
                self.reformat(ctx.buffer_mut(), &item);
            }
            (None, Some(line)) if !in_code => {
                tracing::debug!(?line, "list format detected");
                self.create(ctx.buffer_mut(), start, line);
            }
            _ => {}
        }
    }
}
