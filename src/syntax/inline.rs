//! Inline rules: code, delimiter pairs, images and links.
//!
//! All of them are leftmost-first and fail open: an opener without a closer
//! is left in the text as-is and scanning stops.

use crate::editor::{Annotation, AnnotationKind, Buffer, Inclusivity};
use crate::text::protect::{Protector, is_inside};

/// Char offset of the first `pat` at or after `from`, skipping hits inside
/// inline code when `skip_code` is set.
fn find(buffer: &Buffer, pat: &str, from: usize, skip_code: bool) -> Option<usize> {
    let chars: Vec<char> = buffer.chars_at(0).collect();
    let pat: Vec<char> = pat.chars().collect();
    let last = chars.len().checked_sub(pat.len())?;
    (from..=last).find(|&i| {
        chars[i..i + pat.len()] == pat[..]
            && !(skip_code && is_inside(buffer, i, pat.len(), AnnotationKind::InlineCode))
    })
}

/// Remove `open`/`close` around non-empty content and annotate it.
fn wrap(
    buffer: &mut Buffer,
    open: usize,
    open_len: usize,
    close: usize,
    close_len: usize,
    annotation: Annotation,
) -> usize {
    buffer.delete(close..close + close_len);
    buffer.delete(open..open + open_len);
    let end = close - open_len;
    buffer.add_span(annotation, open..end, Inclusivity::Exclusive);
    end
}

pub(super) fn inline_code(buffer: &mut Buffer, protector: &Protector) {
    let mut from = 0;
    while let Some(open) = find(buffer, "`", from, false) {
        let Some(close) = find(buffer, "`", open + 1, false) else {
            break;
        };
        if close == open + 1 {
            from = close + 1;
            continue;
        }
        let close = protector.unprotect_range(buffer, open + 1..close);
        from = wrap(buffer, open, 1, close, 1, Annotation::InlineCode);
    }
}

/// Shared pair algorithm for bold, italic, strikethrough and footnotes.
pub(super) fn delimited(
    buffer: &mut Buffer,
    open_pat: &str,
    close_pat: &str,
    kind: AnnotationKind,
) {
    let annotation = match kind {
        AnnotationKind::Bold => Annotation::Bold,
        AnnotationKind::Italic => Annotation::Italic,
        AnnotationKind::Strikethrough => Annotation::Strikethrough,
        AnnotationKind::Footnote => Annotation::Footnote,
        _ => return,
    };
    let open_len = open_pat.chars().count();
    let close_len = close_pat.chars().count();
    let mut from = 0;
    while let Some(open) = find(buffer, open_pat, from, true) {
        let content = open + open_len;
        let Some(close) = find(buffer, close_pat, content, true) else {
            break;
        };
        // An opener followed by whitespace cannot start a span.
        if close == content || buffer.char_at(content).is_some_and(char::is_whitespace) {
            from = content;
            continue;
        }
        from = wrap(buffer, open, open_len, close, close_len, annotation.clone());
    }
}

/// `![alt](url)` keeps the alt text. An empty alt shows the url, and
/// `![]()` stays literal.
pub(super) fn image(buffer: &mut Buffer) {
    let mut from = 0;
    while let Some(open) = find(buffer, "![", from, true) {
        match target(buffer, open + 2) {
            Target::Found { label_end, url, .. } if label_end == open + 2 && url.is_empty() => {
                from = open + 2;
            }
            Target::Found { label_end, url, url_end } => {
                let make = |url: String| Annotation::Image { url };
                from = if label_end == open + 2 {
                    buffer.replace(open..url_end, &url);
                    let end = open + url.chars().count();
                    buffer.add_span(make(url), open..end, Inclusivity::Exclusive);
                    end
                } else {
                    let close_len = url_end - label_end;
                    wrap(buffer, open, 2, label_end, close_len, make(url))
                };
            }
            Target::NoUrl => from = open + 2,
            Target::Unterminated => break,
        }
    }
}

/// `[text](url)` keeps the text.
pub(super) fn link(buffer: &mut Buffer) {
    let mut from = 0;
    while let Some(open) = find(buffer, "[", from, true) {
        match target(buffer, open + 1) {
            Target::Found { label_end, url, url_end } if label_end > open + 1 => {
                let close_len = url_end - label_end;
                from = wrap(buffer, open, 1, label_end, close_len, Annotation::Link { url });
            }
            Target::Found { .. } | Target::NoUrl => from = open + 1,
            Target::Unterminated => break,
        }
    }
}

enum Target {
    /// `label_end` is the `]`, `url_end` is one past the `)`.
    Found {
        label_end: usize,
        url: String,
        url_end: usize,
    },
    /// No `](` follows; the bracket is plain text.
    NoUrl,
    /// `](` without a closing `)`.
    Unterminated,
}

fn target(buffer: &Buffer, label_start: usize) -> Target {
    let Some(label_end) = find(buffer, "](", label_start, true) else {
        return Target::NoUrl;
    };
    if buffer.slice(label_start..label_end).contains(['[', '\n']) {
        return Target::NoUrl;
    }
    let url_start = label_end + 2;
    let Some(paren) = find(buffer, ")", url_start, true) else {
        return Target::Unterminated;
    };
    Target::Found {
        label_end,
        url: buffer.slice(url_start..paren).trim().to_string(),
        url_end: paren + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(buffer: &Buffer) -> Vec<(Annotation, std::ops::Range<usize>)> {
        buffer
            .spans()
            .iter()
            .map(|s| (s.annotation.clone(), s.range()))
            .collect()
    }

    #[test]
    fn test_bold_pair_is_consumed() {
        let mut buf = Buffer::from_text("a **b** c");
        delimited(&mut buf, "**", "**", AnnotationKind::Bold);
        assert_eq!(buf.text(), "a b c");
        assert_eq!(spans(&buf), vec![(Annotation::Bold, 2..3)]);
    }

    #[test]
    fn test_unmatched_opener_stays_literal() {
        let mut buf = Buffer::from_text("*hello world");
        delimited(&mut buf, "*", "*", AnnotationKind::Italic);
        assert_eq!(buf.text(), "*hello world");
        assert!(buf.spans().is_empty());
    }

    #[test]
    fn test_empty_pair_is_literal_and_scanning_continues() {
        let mut buf = Buffer::from_text("** then *x*");
        delimited(&mut buf, "*", "*", AnnotationKind::Italic);
        assert_eq!(buf.text(), "** then x");
        assert_eq!(spans(&buf), vec![(Annotation::Italic, 8..9)]);
    }

    #[test]
    fn test_footnote_uses_caret_bracket() {
        let mut buf = Buffer::from_text("claim[^1] more");
        delimited(&mut buf, "[^", "]", AnnotationKind::Footnote);
        assert_eq!(buf.text(), "claim1 more");
        assert_eq!(spans(&buf), vec![(Annotation::Footnote, 5..6)]);
    }

    #[test]
    fn test_unclosed_footnote_is_literal() {
        let mut buf = Buffer::from_text("claim[^1 more");
        delimited(&mut buf, "[^", "]", AnnotationKind::Footnote);
        assert_eq!(buf.text(), "claim[^1 more");
    }

    #[test]
    fn test_inline_code_shields_delimiters() {
        let mut buf = Buffer::from_text("`*a*` *b*");
        inline_code(&mut buf, &Protector::new());
        delimited(&mut buf, "*", "*", AnnotationKind::Italic);
        assert_eq!(buf.text(), "*a* b");
        assert_eq!(
            spans(&buf),
            vec![(Annotation::InlineCode, 0..3), (Annotation::Italic, 4..5)]
        );
    }

    #[test]
    fn test_link_keeps_text() {
        let mut buf = Buffer::from_text("see [docs](https://d.rs) now");
        link(&mut buf);
        assert_eq!(buf.text(), "see docs now");
        assert_eq!(
            spans(&buf),
            vec![(
                Annotation::Link {
                    url: "https://d.rs".to_string()
                },
                4..8
            )]
        );
    }

    #[test]
    fn test_bracket_without_url_is_skipped() {
        let mut buf = Buffer::from_text("[x] and [y](u)");
        link(&mut buf);
        assert_eq!(buf.text(), "[x] and y");
        assert_eq!(spans(&buf)[0].1, 8..9);
    }

    #[test]
    fn test_unterminated_link_is_literal() {
        let mut buf = Buffer::from_text("[x](oops");
        link(&mut buf);
        assert_eq!(buf.text(), "[x](oops");
        assert!(buf.spans().is_empty());
    }

    #[test]
    fn test_image_keeps_alt_or_url() {
        let mut buf = Buffer::from_text("![cat](c.png) ![](d.png)");
        image(&mut buf);
        assert_eq!(buf.text(), "cat d.png");
        assert_eq!(
            spans(&buf),
            vec![
                (
                    Annotation::Image {
                        url: "c.png".to_string()
                    },
                    0..3
                ),
                (
                    Annotation::Image {
                        url: "d.png".to_string()
                    },
                    4..9
                ),
            ]
        );
    }

    #[test]
    fn test_image_without_alt_or_url_is_literal() {
        let mut buf = Buffer::from_text("a ![]() b ![](e.png)");
        image(&mut buf);
        assert_eq!(buf.text(), "a ![]() b e.png");
        assert_eq!(
            spans(&buf),
            vec![(
                Annotation::Image {
                    url: "e.png".to_string()
                },
                10..15
            )]
        );
    }
}
