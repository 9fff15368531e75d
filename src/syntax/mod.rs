//! Batch syntax engine.
//!
//! A whole text block goes through a fixed pipeline of [`Rule`]s. Each rule
//! consumes its delimiter text and leaves annotations behind, so later rules
//! see already-rewritten text:
//!
//! 1. escape protection
//! 2. document rules: code block, table
//! 3. per line (code-block lines skipped): header, quote, todo, ordered
//!    list, unordered list, then the inline rules
//! 4. escapes restored as literal characters

mod block;
mod code_block;
mod inline;

use crate::config::{MarkdownConfig, SyntaxToggles};
use crate::editor::{AnnotationKind, Buffer};
use crate::highlight::Highlighter;
use crate::text::protect::{Protector, is_inside};
use crate::text::{line_end, line_text};

/// The closed set of batch rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    CodeBlock,
    Table,
    Header,
    Quote,
    Todo,
    OrderedList,
    UnorderedList,
    InlineCode,
    Bold,
    Italic,
    Strikethrough,
    Footnote,
    Image,
    Link,
}

impl Rule {
    /// Rules that see the whole buffer at once, in order.
    pub const DOCUMENT: &'static [Self] = &[Self::CodeBlock, Self::Table];

    /// Rules run on each line, in order.
    pub const LINE: &'static [Self] = &[
        Self::Header,
        Self::Quote,
        Self::Todo,
        Self::OrderedList,
        Self::UnorderedList,
        Self::InlineCode,
        Self::Bold,
        Self::Italic,
        Self::Strikethrough,
        Self::Footnote,
        Self::Image,
        Self::Link,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::CodeBlock => "code-block",
            Self::Table => "table",
            Self::Header => "header",
            Self::Quote => "quote",
            Self::Todo => "todo",
            Self::OrderedList => "ordered-list",
            Self::UnorderedList => "unordered-list",
            Self::InlineCode => "inline-code",
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Strikethrough => "strikethrough",
            Self::Footnote => "footnote",
            Self::Image => "image",
            Self::Link => "link",
        }
    }

    pub const fn enabled(self, toggles: &SyntaxToggles) -> bool {
        match self {
            Self::CodeBlock => toggles.code_block,
            Self::Table => toggles.table,
            Self::Header => toggles.header,
            Self::Quote => toggles.quote,
            Self::Todo => toggles.todo,
            Self::OrderedList | Self::UnorderedList => toggles.lists,
            Self::InlineCode => toggles.inline_code,
            Self::Bold => toggles.bold,
            Self::Italic => toggles.italic,
            Self::Strikethrough => toggles.strikethrough,
            Self::Footnote => toggles.footnote,
            Self::Image => toggles.image,
            Self::Link => toggles.link,
        }
    }

    /// Cheap prefilter: false means `apply` would change nothing.
    pub fn matches(self, text: &str) -> bool {
        match self {
            Self::CodeBlock => text.contains("```"),
            Self::Table => text.contains('|'),
            Self::Header => text.starts_with('#'),
            Self::Quote => text.starts_with('>'),
            Self::Todo => text.starts_with("- ["),
            Self::OrderedList => text.trim_start_matches(' ').starts_with(|c: char| c.is_ascii_digit()),
            Self::UnorderedList => text
                .trim_start_matches(' ')
                .starts_with(['*', '-', '+']),
            Self::InlineCode => text.contains('`'),
            Self::Bold => text.contains("**") || text.contains("__"),
            Self::Italic => text.contains(['*', '_']),
            Self::Strikethrough => text.contains("~~"),
            Self::Footnote => text.contains("[^"),
            Self::Image => text.contains("!["),
            Self::Link => text.contains("]("),
        }
    }

    /// Rewrite `buffer`. Document rules get the whole buffer, line rules a
    /// buffer holding one line (with its newline, if any).
    pub fn apply(self, buffer: &mut Buffer, ctx: &RuleContext<'_>) {
        match self {
            Self::CodeBlock => code_block::apply(buffer, ctx),
            Self::Table => block::table(buffer),
            Self::Header => block::header(buffer),
            Self::Quote => block::quote(buffer, ctx.config),
            Self::Todo => block::todo(buffer),
            Self::OrderedList => block::ordered_list(buffer),
            Self::UnorderedList => block::unordered_list(buffer, ctx.config),
            Self::InlineCode => inline::inline_code(buffer, ctx.protector),
            Self::Bold => {
                inline::delimited(buffer, "**", "**", AnnotationKind::Bold);
                inline::delimited(buffer, "__", "__", AnnotationKind::Bold);
            }
            Self::Italic => {
                inline::delimited(buffer, "*", "*", AnnotationKind::Italic);
                inline::delimited(buffer, "_", "_", AnnotationKind::Italic);
            }
            Self::Strikethrough => {
                inline::delimited(buffer, "~~", "~~", AnnotationKind::Strikethrough);
            }
            Self::Footnote => inline::delimited(buffer, "[^", "]", AnnotationKind::Footnote),
            Self::Image => inline::image(buffer),
            Self::Link => inline::link(buffer),
        }
    }
}

/// What a rule may consult while rewriting.
pub struct RuleContext<'a> {
    pub config: &'a MarkdownConfig,
    pub highlighter: &'a dyn Highlighter,
    pub protector: &'a Protector,
}

/// Runs the full pipeline over text blocks.
pub struct SyntaxEngine {
    config: MarkdownConfig,
    highlighter: Box<dyn Highlighter>,
}

impl SyntaxEngine {
    pub fn new(config: MarkdownConfig, highlighter: Box<dyn Highlighter>) -> Self {
        Self {
            config,
            highlighter,
        }
    }

    pub const fn config(&self) -> &MarkdownConfig {
        &self.config
    }

    /// Parse `text` into an annotated buffer.
    pub fn parse(&self, text: &str) -> Buffer {
        let _scope = crate::perf::scope("syntax.parse");
        let mut buffer = Buffer::from_text(text);
        let mut protector = Protector::with_standard_escapes();
        protector.protect_all(&mut buffer);

        let ctx = RuleContext {
            config: &self.config,
            highlighter: self.highlighter.as_ref(),
            protector: &protector,
        };

        for &rule in Rule::DOCUMENT {
            if rule.enabled(&self.config.syntax) && rule.matches(&buffer.text()) {
                tracing::debug!(rule = rule.name(), "applying document rule");
                rule.apply(&mut buffer, &ctx);
            }
        }

        let mut pos = 0;
        while pos < buffer.len_chars() {
            let end = line_end(&buffer, pos);
            if is_inside(&buffer, pos, 1, AnnotationKind::CodeBlockLine) {
                pos = end;
                continue;
            }
            let line = self.apply_line_rules(buffer.extract(pos..end), &ctx);
            let len = line.len_chars();
            buffer.splice(pos..end, line);
            pos += len.max(1);
        }

        protector.unprotect_literal(&mut buffer);
        buffer
    }

    fn apply_line_rules(&self, mut line: Buffer, ctx: &RuleContext<'_>) -> Buffer {
        for &rule in Rule::LINE {
            if !rule.enabled(&self.config.syntax) {
                continue;
            }
            // Block rules look at the line as it stands after earlier
            // rules removed their prefixes.
            if rule.matches(&line_text(&line, 0)) {
                tracing::trace!(rule = rule.name(), "applying line rule");
                rule.apply(&mut line, ctx);
            }
        }
        line
    }
}

impl std::fmt::Debug for SyntaxEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
