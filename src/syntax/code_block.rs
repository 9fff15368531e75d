//! Fenced code blocks.

use super::RuleContext;
use crate::editor::{Annotation, Buffer, Inclusivity, SpanId};
use crate::text::{line_end, line_text};

const FENCE: &str = "```";

/// An opening and closing fence, as line starts.
struct Fences {
    open: usize,
    close: usize,
}

/// Annotate every closed fenced block and remove its fence lines.
/// A trailing unclosed fence stays literal text.
pub(super) fn apply(buffer: &mut Buffer, ctx: &RuleContext<'_>) {
    for block in find_blocks(buffer).into_iter().rev() {
        rewrite(buffer, &block, ctx);
    }
}

fn find_blocks(buffer: &Buffer) -> Vec<Fences> {
    let mut blocks = Vec::new();
    let mut open = None;
    let mut pos = 0;
    while pos < buffer.len_chars() {
        if line_text(buffer, pos).starts_with(FENCE) {
            match open.take() {
                Some(start) => blocks.push(Fences {
                    open: start,
                    close: pos,
                }),
                None => open = Some(pos),
            }
        }
        pos = line_end(buffer, pos);
    }
    blocks
}

fn rewrite(buffer: &mut Buffer, block: &Fences, ctx: &RuleContext<'_>) {
    let config = ctx.config;
    let language = line_text(buffer, block.open)[FENCE.len()..].trim().to_string();
    let body_start = line_end(buffer, block.open);
    let mut body_end = block.close;

    body_end = ctx.protector.unprotect_range(buffer, body_start..body_end);
    if body_start == body_end {
        buffer.insert(body_start, " \n");
        body_end += 2;
    }

    // Interior lines as [start, newline) ranges; blank lines get a space.
    let mut lines = Vec::new();
    let mut pos = body_start;
    while pos < body_end {
        if buffer.char_at(pos) == Some('\n') {
            buffer.insert(pos, " ");
            body_end += 1;
        }
        let end = line_end(buffer, pos);
        lines.push(pos..end - 1);
        pos = end;
    }

    tracing::debug!(
        language = %language,
        lines = lines.len(),
        "code block"
    );

    let last = lines.len().saturating_sub(1);
    let mut next: Option<SpanId> = None;
    for (i, range) in lines.iter().enumerate().rev() {
        let annotation = Annotation::CodeBlockLine {
            language: language.clone(),
            is_first: i == 0,
            is_last: i == last,
            raw_line: buffer.slice(range.clone()),
            next,
        };
        next = Some(buffer.add_span(annotation, range.clone(), Inclusivity::Exclusive));
        buffer.add_span(
            Annotation::Margin {
                width: config.code_indent,
            },
            range.clone(),
            Inclusivity::Exclusive,
        );
        buffer.add_span(
            Annotation::Background {
                color: config.code_background,
            },
            range.clone(),
            Inclusivity::Exclusive,
        );
    }

    if language.is_empty() {
        for range in &lines {
            buffer.add_span(
                Annotation::Foreground {
                    color: config.code_foreground,
                },
                range.clone(),
                Inclusivity::Exclusive,
            );
        }
    } else {
        ctx.highlighter
            .highlight(&language, buffer, body_start..body_end);
    }

    // Closing fence first so the opening fence's offsets stay valid.
    let close_end = line_end(buffer, body_end);
    buffer.delete(body_end..close_end);
    buffer.delete(block.open..body_start);
}
