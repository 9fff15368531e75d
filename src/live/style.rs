//! Live inline styling.
//!
//! Unlike the batch engine, live styling leaves delimiters in the text: a
//! bold span covers `**x**` whole. Every edit restyles the lines it touched.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::MarkdownConfig;
use crate::editor::{Annotation, AnnotationKind, Buffer, EditContext, EditDelta, EditListener};
use crate::text::line_start;
use crate::text::protect::is_inside;
use crate::text::token::{self, EditToken};

static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`[^`\n]+`").expect("Invalid inline code regex"));
static BOLD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*[^*\n]+\*\*|__[^_\n]+__").expect("Invalid bold regex")
});
static ITALIC_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*[^*\n]+\*").expect("Invalid italic regex"));
static ITALIC_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_[^_\n]+_").expect("Invalid italic regex"));
static STRIKETHROUGH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"~~[^~\n]+~~").expect("Invalid strikethrough regex"));

const STYLE_KINDS: [AnnotationKind; 4] = [
    AnnotationKind::InlineCode,
    AnnotationKind::Bold,
    AnnotationKind::Italic,
    AnnotationKind::Strikethrough,
];

/// Re-derives inline code, bold, italic and strikethrough on edited lines.
#[derive(Debug, Clone)]
pub struct StyleLive {
    inline_code: bool,
    bold: bool,
    italic: bool,
    strikethrough: bool,
}

impl StyleLive {
    pub const fn new(config: &MarkdownConfig) -> Self {
        Self {
            inline_code: config.syntax.inline_code,
            bold: config.syntax.bold,
            italic: config.syntax.italic,
            strikethrough: config.syntax.strikethrough,
        }
    }

    /// Drop and re-find every inline style on the line containing `pos`.
    pub fn restyle_line(&self, buffer: &mut Buffer, pos: usize) {
        let ls = line_start(buffer, pos);
        if ls < buffer.len_chars() && is_inside(buffer, ls, 1, AnnotationKind::CodeBlockLine) {
            return;
        }
        for kind in STYLE_KINDS {
            token::remove_spans(buffer, pos, kind);
        }

        let code = if self.inline_code {
            let found = token::parse(buffer, &INLINE_CODE, None, || Annotation::InlineCode);
            token::matched_tokens(buffer, found, pos)
        } else {
            Vec::new()
        };

        let mut styles: Vec<EditToken> = Vec::new();
        let mut find = |enabled: bool,
                        pattern: &Regex,
                        ignore: Option<&str>,
                        make: fn() -> Annotation| {
            if !enabled {
                return;
            }
            let found = token::parse(buffer, pattern, ignore, make);
            styles.extend(
                token::matched_tokens(buffer, found, pos)
                    .into_iter()
                    .filter(|t| !code.iter().any(|c| c.overlaps(t.start, t.end))),
            );
        };
        find(self.bold, &BOLD, None, || Annotation::Bold);
        find(self.italic, &ITALIC_STAR, Some("**"), || Annotation::Italic);
        find(self.italic, &ITALIC_UNDERSCORE, Some("__"), || Annotation::Italic);
        find(self.strikethrough, &STRIKETHROUGH, None, || Annotation::Strikethrough);

        if !code.is_empty() || !styles.is_empty() {
            tracing::trace!(code = code.len(), styles = styles.len(), line = ls, "restyled");
        }
        token::set_code_spans(buffer, code);
        token::set_spans(buffer, styles);
    }
}

impl EditListener for StyleLive {
    fn after_change(&mut self, ctx: &mut EditContext<'_>, delta: EditDelta) {
        let buffer = ctx.buffer_mut();
        let start = delta.start.min(buffer.len_chars());
        let end = (delta.start + delta.inserted).min(buffer.len_chars());
        self.restyle_line(buffer, start);
        if line_start(buffer, end) != line_start(buffer, start) {
            self.restyle_line(buffer, end);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{Editor, Inclusivity};

    fn styles(buffer: &Buffer) -> Vec<(AnnotationKind, std::ops::Range<usize>)> {
        let mut spans: Vec<_> = buffer
            .spans()
            .iter()
            .map(|s| (s.kind(), s.range()))
            .collect();
        spans.sort_by_key(|(_, r)| r.start);
        spans
    }

    fn typed(text: &str) -> Editor {
        let mut editor =
            Editor::from_text("").with_listener(StyleLive::new(&MarkdownConfig::default()));
        for c in text.chars() {
            editor.type_text(&c.to_string());
        }
        editor
    }

    #[test]
    fn test_bold_keeps_delimiters() {
        let editor = typed("a **b** c");
        assert_eq!(editor.buffer().text(), "a **b** c");
        assert_eq!(styles(editor.buffer()), vec![(AnnotationKind::Bold, 2..7)]);
    }

    #[test]
    fn test_italic_ignores_bold_delimiters() {
        let editor = typed("**a** *b*");
        assert_eq!(
            styles(editor.buffer()),
            vec![(AnnotationKind::Bold, 0..5), (AnnotationKind::Italic, 6..9)]
        );
    }

    #[test]
    fn test_inline_code_shields_styles() {
        let editor = typed("`**x**` ~~y~~");
        assert_eq!(
            styles(editor.buffer()),
            vec![
                (AnnotationKind::InlineCode, 0..7),
                (AnnotationKind::Strikethrough, 8..13)
            ]
        );
    }

    #[test]
    fn test_deleting_a_closer_removes_the_style() {
        let mut editor = typed("**b**");
        editor.backspace();
        assert_eq!(editor.buffer().text(), "**b*");
        assert!(styles(editor.buffer()).is_empty());
    }

    #[test]
    fn test_other_lines_are_left_alone() {
        let mut editor = typed("*a*\n");
        editor.type_text("x");
        assert_eq!(styles(editor.buffer()), vec![(AnnotationKind::Italic, 0..3)]);
    }

    #[test]
    fn test_code_block_lines_are_skipped() {
        let mut buffer = Buffer::from_text("**x**\n");
        buffer.add_span(
            Annotation::CodeBlockLine {
                language: String::new(),
                is_first: true,
                is_last: true,
                raw_line: "**x**".to_string(),
                next: None,
            },
            0..5,
            Inclusivity::Exclusive,
        );
        StyleLive::new(&MarkdownConfig::default()).restyle_line(&mut buffer, 0);
        assert_eq!(buffer.spans().len(), 1);
    }

    #[test]
    fn test_disabled_style_is_not_applied() {
        let mut config = MarkdownConfig::default();
        config.syntax.bold = false;
        let mut buffer = Buffer::from_text("**b**");
        StyleLive::new(&config).restyle_line(&mut buffer, 0);
        assert!(buffer.spans().is_empty());
    }
}
