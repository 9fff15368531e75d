use std::collections::HashMap;
use std::ops::Range;

use ropey::Rope;
use ropey::iter::Chars;

use super::span::{
    Annotation, AnnotationKind, ClickKind, ClickTarget, Inclusivity, Span, SpanId,
};

/// A text buffer backed by a rope, carrying a set of annotations.
///
/// Offsets are char indices. Every length-changing mutation goes through
/// [`Buffer::replace`], which shifts span ranges in one place so callers
/// never repeat the offset arithmetic.
pub struct Buffer {
    rope: Rope,
    spans: Vec<Span>,
    next_id: u64,
}

impl Buffer {
    /// Create a new buffer from a string.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            spans: Vec::new(),
            next_id: 0,
        }
    }

    /// Create an empty buffer.
    pub fn empty() -> Self {
        Self::from_text("")
    }

    /// Length in chars.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// The full text content of the buffer.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn char_at(&self, idx: usize) -> Option<char> {
        (idx < self.rope.len_chars()).then(|| self.rope.char(idx))
    }

    /// Iterator over chars starting at `idx` (clamped to the buffer).
    pub fn chars_at(&self, idx: usize) -> Chars<'_> {
        self.rope.chars_at(idx.min(self.rope.len_chars()))
    }

    /// Text of `range`, clamped to the buffer.
    pub fn slice(&self, range: Range<usize>) -> String {
        let range = self.clamp(range);
        self.rope.slice(range).to_string()
    }

    // --- Mutation ---

    pub fn insert(&mut self, at: usize, text: &str) {
        self.replace(at..at, text);
    }

    pub fn delete(&mut self, range: Range<usize>) {
        self.replace(range, "");
    }

    /// Replace `range` with `text`.
    ///
    /// The overlapping prefix is overwritten in place, so a same-length
    /// replacement leaves every span untouched. The remainder is a plain
    /// deletion or insertion.
    pub fn replace(&mut self, range: Range<usize>, text: &str) {
        let range = self.clamp(range);
        let removed = range.len();
        let inserted = text.chars().count();
        let overwrite = removed.min(inserted);

        if overwrite > 0 {
            let head: String = text.chars().take(overwrite).collect();
            self.rope.remove(range.start..range.start + overwrite);
            self.rope.insert(range.start, &head);
        }

        if removed > inserted {
            let tail = range.start + inserted..range.end;
            self.shift_for_delete(&tail);
            self.rope.remove(tail);
        } else if inserted > removed {
            let at = range.start + removed;
            let tail: String = text.chars().skip(removed).collect();
            self.shift_for_insert(at, inserted - removed, true);
            self.rope.insert(at, &tail);
        }
    }

    /// Replace `range` with the contents of `other`, spans included.
    ///
    /// Neighbouring spans never grow into the spliced text.
    pub fn splice(&mut self, range: Range<usize>, other: Self) {
        let range = self.clamp(range);
        self.delete(range.clone());
        let at = range.start;
        let len = other.len_chars();
        self.shift_for_insert(at, len, false);
        self.rope.insert(at, &other.text());
        self.adopt_spans(other.spans, at);
    }

    /// Append `other` to the end of this buffer, spans included.
    pub fn append(&mut self, other: Self) {
        let end = self.len_chars();
        self.splice(end..end, other);
    }

    /// Copy of `range` as a standalone buffer carrying the spans that lie
    /// fully inside it.
    pub fn extract(&self, range: Range<usize>) -> Self {
        let range = self.clamp(range);
        let mut out = Self::from_text(&self.slice(range.clone()));
        let inner = self
            .spans
            .iter()
            .filter(|s| s.start() >= range.start && s.end() <= range.end)
            .cloned()
            .map(|mut s| {
                s.range = s.start() - range.start..s.end() - range.start;
                s
            })
            .collect();
        out.adopt_spans(inner, 0);
        out
    }

    // --- Spans ---

    pub fn add_span(
        &mut self,
        annotation: Annotation,
        range: Range<usize>,
        inclusivity: Inclusivity,
    ) -> SpanId {
        let range = self.clamp(range);
        let id = SpanId(self.next_id);
        self.next_id += 1;
        self.spans.push(Span {
            id,
            annotation,
            range,
            inclusivity,
        });
        id
    }

    pub fn span(&self, id: SpanId) -> Option<&Span> {
        self.spans.iter().find(|s| s.id == id)
    }

    /// Mutable access to a span's annotation and inclusivity. Ranges are
    /// changed through [`Buffer::set_span_range`].
    pub fn span_mut(&mut self, id: SpanId) -> Option<&mut Span> {
        self.spans.iter_mut().find(|s| s.id == id)
    }

    /// Move a span. Empty or inverted ranges are refused.
    pub fn set_span_range(&mut self, id: SpanId, range: Range<usize>) -> bool {
        let range = self.clamp(range);
        if range.is_empty() {
            return false;
        }
        match self.span_mut(id) {
            Some(span) => {
                span.range = range;
                true
            }
            None => false,
        }
    }

    pub fn remove_span(&mut self, id: SpanId) -> Option<Span> {
        let idx = self.spans.iter().position(|s| s.id == id)?;
        Some(self.spans.remove(idx))
    }

    /// Remove a span and, for code-block lines, every line chained after it.
    pub fn remove_chain(&mut self, id: SpanId) {
        let mut next = Some(id);
        while let Some(current) = next {
            next = match self.remove_span(current) {
                Some(Span {
                    annotation: Annotation::CodeBlockLine { next, .. },
                    ..
                }) => next,
                _ => None,
            };
        }
    }

    pub fn retain_spans(&mut self, mut keep: impl FnMut(&Span) -> bool) {
        self.spans.retain(|s| keep(s));
    }

    /// All spans in insertion order.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn spans_of(&self, kind: AnnotationKind) -> impl Iterator<Item = &Span> {
        self.spans.iter().filter(move |s| s.kind() == kind)
    }

    /// Spans touching `start..end`.
    ///
    /// A point query (`start == end`) returns spans with
    /// `span.start <= start <= span.end`; a range query returns spans that
    /// share at least one char with the range.
    pub fn spans_overlapping(&self, start: usize, end: usize) -> impl Iterator<Item = &Span> {
        self.spans.iter().filter(move |s| {
            if start == end {
                s.start() <= start && start <= s.end()
            } else {
                s.start() < end && start < s.end()
            }
        })
    }

    /// Hosts register click responders against these ranges.
    pub fn click_targets(&self) -> Vec<ClickTarget> {
        let mut targets: Vec<ClickTarget> = self
            .spans
            .iter()
            .filter_map(|s| {
                let (kind, done) = match &s.annotation {
                    Annotation::Link { url } => (ClickKind::Link { url: url.clone() }, None),
                    Annotation::Image { url } => (ClickKind::Image { url: url.clone() }, None),
                    Annotation::Footnote => (ClickKind::Footnote, None),
                    Annotation::Todo { done } => (ClickKind::Todo, Some(*done)),
                    _ => return None,
                };
                Some(ClickTarget {
                    id: s.id,
                    kind,
                    range: s.range(),
                    done,
                })
            })
            .collect();
        targets.sort_by_key(|t| (t.range.start, t.range.end));
        targets
    }

    // --- Private helpers ---

    fn clamp(&self, range: Range<usize>) -> Range<usize> {
        let len = self.rope.len_chars();
        let start = range.start.min(len);
        start..range.end.clamp(start, len)
    }

    fn shift_for_insert(&mut self, at: usize, n: usize, respect_inclusivity: bool) {
        let rope = &self.rope;
        for span in &mut self.spans {
            let ends_with_newline = span.end() > 0 && rope.char(span.end() - 1) == '\n';
            let grow_start = respect_inclusivity && span.inclusivity.grows_at_start();
            let grow_end = respect_inclusivity && span.inclusivity.grows_at_end(ends_with_newline);
            if span.range.start > at || (span.range.start == at && !grow_start) {
                span.range.start += n;
            }
            if span.range.end > at || (span.range.end == at && grow_end) {
                span.range.end += n;
            }
        }
    }

    fn shift_for_delete(&mut self, range: &Range<usize>) {
        let removed = range.len();
        let map = |x: usize| {
            if x <= range.start {
                x
            } else if x < range.end {
                range.start
            } else {
                x - removed
            }
        };
        for span in &mut self.spans {
            span.range = map(span.range.start)..map(span.range.end);
        }
        self.spans.retain(|s| !s.range.is_empty());
    }

    fn adopt_spans(&mut self, spans: Vec<Span>, offset: usize) {
        let mut ids = HashMap::with_capacity(spans.len());
        for span in &spans {
            ids.insert(span.id, SpanId(self.next_id));
            self.next_id += 1;
        }
        for mut span in spans {
            span.id = ids[&span.id];
            span.range = span.start() + offset..span.end() + offset;
            if let Annotation::CodeBlockLine { next, .. } = &mut span.annotation {
                *next = next.and_then(|old| ids.get(&old).copied());
            }
            self.spans.push(span);
        }
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field(
                "rope",
                &format_args!("Rope({} chars)", self.rope.len_chars()),
            )
            .field("spans", &self.spans.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_item(number: u32) -> Annotation {
        Annotation::OrderedListItem { nested: 0, number }
    }

    // --- Construction and basic queries ---

    #[test]
    fn test_empty_buffer_has_no_chars() {
        let buf = Buffer::empty();
        assert!(buf.is_empty());
        assert_eq!(buf.char_at(0), None);
    }

    #[test]
    fn test_offsets_are_chars_not_bytes() {
        let buf = Buffer::from_text("héllo");
        assert_eq!(buf.len_chars(), 5);
        assert_eq!(buf.char_at(1), Some('é'));
        assert_eq!(buf.slice(1..3), "él");
    }

    #[test]
    fn test_slice_clamps_out_of_range() {
        let buf = Buffer::from_text("abc");
        assert_eq!(buf.slice(1..99), "bc");
        assert_eq!(buf.slice(7..9), "");
    }

    // --- Span shifting ---

    #[test]
    fn test_insert_before_span_shifts_it() {
        let mut buf = Buffer::from_text("abc def");
        let id = buf.add_span(Annotation::Bold, 4..7, Inclusivity::Exclusive);
        buf.insert(0, "xx");
        assert_eq!(buf.span(id).unwrap().range(), 6..9);
        assert_eq!(buf.slice(6..9), "def");
    }

    #[test]
    fn test_exclusive_span_does_not_grow_at_edges() {
        let mut buf = Buffer::from_text("abc");
        let id = buf.add_span(Annotation::Bold, 0..3, Inclusivity::Exclusive);
        buf.insert(3, "!");
        buf.insert(0, "!");
        assert_eq!(buf.span(id).unwrap().range(), 1..4);
    }

    #[test]
    fn test_inclusive_span_grows_at_edges() {
        let mut buf = Buffer::from_text("abc");
        let id = buf.add_span(Annotation::Bold, 0..3, Inclusivity::Inclusive);
        buf.insert(3, "!");
        buf.insert(0, "!");
        assert_eq!(buf.span(id).unwrap().range(), 0..5);
    }

    #[test]
    fn test_line_span_does_not_absorb_next_line() {
        let mut buf = Buffer::from_text("1. a\n");
        let first = buf.add_span(list_item(1), 0..5, Inclusivity::Line);
        buf.insert(5, "2. b");
        assert_eq!(buf.span(first).unwrap().range(), 0..5);
    }

    #[test]
    fn test_line_span_grows_at_unterminated_end() {
        let mut buf = Buffer::from_text("1. a");
        let id = buf.add_span(list_item(1), 0..4, Inclusivity::Line);
        buf.insert(4, "b");
        assert_eq!(buf.span(id).unwrap().range(), 0..5);
    }

    #[test]
    fn test_delete_collapses_and_drops_empty_spans() {
        let mut buf = Buffer::from_text("abcdef");
        let gone = buf.add_span(Annotation::Bold, 2..4, Inclusivity::Exclusive);
        let kept = buf.add_span(Annotation::Italic, 1..5, Inclusivity::Exclusive);
        buf.delete(2..4);
        assert!(buf.span(gone).is_none());
        assert_eq!(buf.span(kept).unwrap().range(), 1..3);
        assert_eq!(buf.text(), "abef");
    }

    #[test]
    fn test_same_length_replace_keeps_spans() {
        let mut buf = Buffer::from_text("a*b");
        let id = buf.add_span(Annotation::Bold, 1..2, Inclusivity::Exclusive);
        buf.replace(1..2, "x");
        assert_eq!(buf.text(), "axb");
        assert_eq!(buf.span(id).unwrap().range(), 1..2);
    }

    #[test]
    fn test_shrinking_replace_keeps_covering_span() {
        let mut buf = Buffer::from_text(r"a\*b");
        let id = buf.add_span(Annotation::Bold, 1..3, Inclusivity::Exclusive);
        buf.replace(1..3, "*");
        assert_eq!(buf.text(), "a*b");
        assert_eq!(buf.span(id).unwrap().range(), 1..2);
    }

    // --- Queries ---

    #[test]
    fn test_point_query_includes_touching_spans() {
        let mut buf = Buffer::from_text("ab\ncd\n");
        buf.add_span(list_item(1), 0..3, Inclusivity::Line);
        buf.add_span(list_item(2), 3..6, Inclusivity::Line);
        assert_eq!(buf.spans_overlapping(3, 3).count(), 2);
        assert_eq!(buf.spans_overlapping(3, 4).count(), 1);
    }

    #[test]
    fn test_set_span_range_refuses_empty() {
        let mut buf = Buffer::from_text("abc");
        let id = buf.add_span(Annotation::Bold, 0..2, Inclusivity::Exclusive);
        assert!(!buf.set_span_range(id, 1..1));
        assert!(buf.set_span_range(id, 1..3));
        assert_eq!(buf.span(id).unwrap().range(), 1..3);
    }

    #[test]
    fn test_remove_chain_follows_code_lines() {
        let mut buf = Buffer::from_text("a\nb\nc");
        let code = |next| Annotation::CodeBlockLine {
            language: String::new(),
            is_first: false,
            is_last: false,
            raw_line: String::new(),
            next,
        };
        let third = buf.add_span(code(None), 4..5, Inclusivity::Exclusive);
        let second = buf.add_span(code(Some(third)), 2..3, Inclusivity::Exclusive);
        let first = buf.add_span(code(Some(second)), 0..1, Inclusivity::Exclusive);
        buf.add_span(Annotation::Bold, 0..1, Inclusivity::Exclusive);
        buf.remove_chain(first);
        assert_eq!(buf.spans().len(), 1);
        assert_eq!(buf.spans()[0].annotation, Annotation::Bold);
    }

    // --- Splicing ---

    #[test]
    fn test_splice_remaps_spans_and_chain_ids() {
        let mut line = Buffer::from_text("xy");
        let tail = line.add_span(Annotation::Italic, 1..2, Inclusivity::Exclusive);
        line.add_span(
            Annotation::CodeBlockLine {
                language: "rs".into(),
                is_first: true,
                is_last: true,
                raw_line: "xy".into(),
                next: Some(tail),
            },
            0..1,
            Inclusivity::Exclusive,
        );

        let mut buf = Buffer::from_text("ab\ncd");
        buf.add_span(Annotation::Bold, 0..2, Inclusivity::Inclusive);
        buf.splice(3..5, line);
        assert_eq!(buf.text(), "ab\nxy");

        let italic = buf.spans_of(AnnotationKind::Italic).next().unwrap();
        assert_eq!(italic.range(), 4..5);
        let italic_id = italic.id();
        let code = buf.spans_of(AnnotationKind::CodeBlockLine).next().unwrap();
        match &code.annotation {
            Annotation::CodeBlockLine { next, .. } => assert_eq!(*next, Some(italic_id)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_splice_does_not_grow_inclusive_neighbours() {
        let mut buf = Buffer::from_text("ab");
        let id = buf.add_span(Annotation::Bold, 0..2, Inclusivity::Inclusive);
        buf.append(Buffer::from_text("cd"));
        assert_eq!(buf.span(id).unwrap().range(), 0..2);
        assert_eq!(buf.text(), "abcd");
    }

    #[test]
    fn test_extract_keeps_inner_spans_only() {
        let mut buf = Buffer::from_text("ab\ncd\n");
        buf.add_span(Annotation::Bold, 3..5, Inclusivity::Exclusive);
        buf.add_span(Annotation::Italic, 0..4, Inclusivity::Exclusive);
        let line = buf.extract(3..6);
        assert_eq!(line.text(), "cd\n");
        assert_eq!(line.spans().len(), 1);
        assert_eq!(line.spans()[0].range(), 0..2);
    }

    #[test]
    fn test_click_targets_sorted_with_todo_state() {
        let mut buf = Buffer::from_text("done link");
        buf.add_span(
            Annotation::Link { url: "u".into() },
            5..9,
            Inclusivity::Exclusive,
        );
        buf.add_span(Annotation::Todo { done: true }, 0..4, Inclusivity::Exclusive);
        buf.add_span(Annotation::Bold, 0..4, Inclusivity::Exclusive);
        let targets = buf.click_targets();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].kind, ClickKind::Todo);
        assert_eq!(targets[0].done, Some(true));
        assert_eq!(targets[1].range, 5..9);
    }
}
