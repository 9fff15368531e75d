//! Annotation kinds and the span records that attach them to a buffer.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Stable identity of a span inside one [`Buffer`](super::Buffer).
///
/// Ids survive edits and in-place annotation updates, so a renderer can key
/// cached state on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SpanId(pub(crate) u64);

/// 24-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("colour must look like #rrggbb, got {0:?}")]
    Format(String),
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ColorParseError::Format(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(err());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// Bullet character of an unordered list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListMarker {
    Asterisk,
    Hyphen,
    Plus,
}

impl ListMarker {
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '*' => Some(Self::Asterisk),
            '-' => Some(Self::Hyphen),
            '+' => Some(Self::Plus),
            _ => None,
        }
    }

    pub const fn as_char(self) -> char {
        match self {
            Self::Asterisk => '*',
            Self::Hyphen => '-',
            Self::Plus => '+',
        }
    }
}

/// What a span means. Ranges live on [`Span`], not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Annotation {
    Bold,
    Italic,
    Strikethrough,
    Header {
        level: u8,
    },
    Quote,
    OrderedListItem {
        nested: usize,
        number: u32,
    },
    UnorderedListItem {
        nested: usize,
        marker: ListMarker,
        color: Rgb,
    },
    /// Checkbox list item (`- [ ]` / `- [x]`).
    Todo {
        done: bool,
    },
    /// One interior line of a fenced code block. Lines of the same block
    /// are chained through `next`.
    CodeBlockLine {
        language: String,
        is_first: bool,
        is_last: bool,
        raw_line: String,
        next: Option<SpanId>,
    },
    InlineCode,
    Link {
        url: String,
    },
    Image {
        url: String,
    },
    Footnote,
    Margin {
        width: usize,
    },
    Foreground {
        color: Rgb,
    },
    Background {
        color: Rgb,
    },
    TableRow {
        header: bool,
    },
}

/// Payload-free discriminant of [`Annotation`], used for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKind {
    Bold,
    Italic,
    Strikethrough,
    Header,
    Quote,
    OrderedListItem,
    UnorderedListItem,
    Todo,
    CodeBlockLine,
    InlineCode,
    Link,
    Image,
    Footnote,
    Margin,
    Foreground,
    Background,
    TableRow,
}

impl Annotation {
    pub const fn kind(&self) -> AnnotationKind {
        match self {
            Self::Bold => AnnotationKind::Bold,
            Self::Italic => AnnotationKind::Italic,
            Self::Strikethrough => AnnotationKind::Strikethrough,
            Self::Header { .. } => AnnotationKind::Header,
            Self::Quote => AnnotationKind::Quote,
            Self::OrderedListItem { .. } => AnnotationKind::OrderedListItem,
            Self::UnorderedListItem { .. } => AnnotationKind::UnorderedListItem,
            Self::Todo { .. } => AnnotationKind::Todo,
            Self::CodeBlockLine { .. } => AnnotationKind::CodeBlockLine,
            Self::InlineCode => AnnotationKind::InlineCode,
            Self::Link { .. } => AnnotationKind::Link,
            Self::Image { .. } => AnnotationKind::Image,
            Self::Footnote => AnnotationKind::Footnote,
            Self::Margin { .. } => AnnotationKind::Margin,
            Self::Foreground { .. } => AnnotationKind::Foreground,
            Self::Background { .. } => AnnotationKind::Background,
            Self::TableRow { .. } => AnnotationKind::TableRow,
        }
    }

    pub const fn is_list_item(&self) -> bool {
        matches!(
            self,
            Self::OrderedListItem { .. } | Self::UnorderedListItem { .. }
        )
    }
}

/// Whether a span grows when text is inserted exactly at one of its edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Inclusivity {
    /// Never grows at either edge.
    #[default]
    Exclusive,
    /// Grows at both edges.
    Inclusive,
    /// Grows at its start; grows at its end only while the span is not
    /// terminated by a newline. Used for one-line list items so adjacent
    /// lines never absorb each other's text.
    Line,
}

impl Inclusivity {
    pub(crate) const fn grows_at_start(self) -> bool {
        !matches!(self, Self::Exclusive)
    }

    pub(crate) const fn grows_at_end(self, ends_with_newline: bool) -> bool {
        match self {
            Self::Exclusive => false,
            Self::Inclusive => true,
            Self::Line => !ends_with_newline,
        }
    }
}

/// An annotation attached to a half-open char range of a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub(crate) id: SpanId,
    pub annotation: Annotation,
    pub(crate) range: Range<usize>,
    pub inclusivity: Inclusivity,
}

impl Span {
    pub const fn id(&self) -> SpanId {
        self.id
    }

    pub const fn start(&self) -> usize {
        self.range.start
    }

    pub const fn end(&self) -> usize {
        self.range.end
    }

    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    pub const fn kind(&self) -> AnnotationKind {
        self.annotation.kind()
    }
}

/// Span metadata a host needs to register a click responder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClickTarget {
    pub id: SpanId,
    pub kind: ClickKind,
    pub range: Range<usize>,
    /// Checkbox state; only set for [`ClickKind::Todo`].
    pub done: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClickKind {
    Link { url: String },
    Image { url: String },
    Footnote,
    Todo,
}
