use marklive::config::MarkdownConfig;
use marklive::editor::{Annotation, Buffer, Editor, Inclusivity, ListMarker};
use marklive::live::{ListLive, StyleLive};
use proptest::prelude::*;

fn ordered(nested: usize, number: u32) -> Annotation {
    Annotation::OrderedListItem { nested, number }
}

fn editor_with(text: &str, items: &[(Annotation, std::ops::Range<usize>)]) -> Editor {
    let mut buffer = Buffer::from_text(text);
    for (annotation, range) in items {
        buffer.add_span(annotation.clone(), range.clone(), Inclusivity::Line);
    }
    let config = MarkdownConfig::default();
    Editor::new(buffer)
        .with_listener(ListLive::new(&config))
        .with_listener(StyleLive::new(&config))
}

fn list_spans(editor: &Editor) -> Vec<(Annotation, std::ops::Range<usize>)> {
    let mut spans: Vec<_> = editor
        .buffer()
        .spans()
        .iter()
        .filter(|s| s.annotation.is_list_item())
        .map(|s| (s.annotation.clone(), s.range()))
        .collect();
    spans.sort_by_key(|(_, r)| r.start);
    spans
}

fn type_chars(editor: &mut Editor, text: &str) {
    for c in text.chars() {
        editor.type_text(&c.to_string());
    }
}

#[test]
fn test_enter_continues_ordered_list() {
    let mut editor = editor_with("1. aaa\n", &[(ordered(0, 1), 0..7)]);
    editor.set_cursor(6);
    editor.enter();

    assert_eq!(editor.buffer().text(), "1. aaa\n2. \n");
    assert_eq!(
        list_spans(&editor),
        vec![(ordered(0, 1), 0..7), (ordered(0, 2), 7..11)]
    );
    assert_eq!(editor.cursor(), 10);
}

#[test]
fn test_enter_mid_line_splits_item() {
    let mut editor = editor_with("1. abc\n", &[(ordered(0, 1), 0..7)]);
    editor.set_cursor(4);
    editor.enter();

    assert_eq!(editor.buffer().text(), "1. a\n2. bc\n");
    assert_eq!(
        list_spans(&editor),
        vec![(ordered(0, 1), 0..5), (ordered(0, 2), 5..11)]
    );
    assert_eq!(editor.cursor(), 8);
}

#[test]
fn test_enter_on_empty_item_ends_list() {
    let mut editor = editor_with(
        "1. aaa\n1. \n",
        &[(ordered(0, 1), 0..7), (ordered(0, 2), 7..11)],
    );
    editor.set_cursor(10);
    editor.enter();

    assert_eq!(editor.buffer().text(), "1. aaa\n");
    assert_eq!(list_spans(&editor), vec![(ordered(0, 1), 0..7)]);
    assert_eq!(editor.cursor(), 7);
}

#[test]
fn test_enter_on_empty_nested_item_outdents() {
    let mut editor = editor_with(
        "  1. a\n  2. \n",
        &[(ordered(2, 1), 0..7), (ordered(2, 2), 7..13)],
    );
    editor.set_cursor(12);
    editor.enter();

    assert_eq!(editor.buffer().text(), "  1. a\n 2. \n");
    assert_eq!(
        list_spans(&editor),
        vec![(ordered(2, 1), 0..7), (ordered(1, 2), 7..12)]
    );
    assert_eq!(editor.cursor(), 11);
}

#[test]
fn test_enter_at_line_start_moves_item_down() {
    let mut editor = editor_with("1. a\n", &[(ordered(0, 1), 0..5)]);
    editor.set_cursor(0);
    editor.enter();

    assert_eq!(editor.buffer().text(), "\n1. a\n");
    assert_eq!(list_spans(&editor), vec![(ordered(0, 1), 1..6)]);
}

#[test]
fn test_backspace_over_newline_merges_into_first_item() {
    let mut editor = editor_with(
        "1. a\n2. b\n",
        &[(ordered(0, 1), 0..5), (ordered(0, 2), 5..10)],
    );
    editor.set_cursor(5);
    editor.backspace();

    assert_eq!(editor.buffer().text(), "1. a2. b\n");
    assert_eq!(list_spans(&editor), vec![(ordered(0, 1), 0..9)]);
}

#[test]
fn test_deleting_selection_across_lines_merges_items() {
    let mut editor = editor_with(
        "1. aa\n2. bb\n3. cc\n",
        &[
            (ordered(0, 1), 0..6),
            (ordered(0, 2), 6..12),
            (ordered(0, 3), 12..18),
        ],
    );
    editor.delete(4..8);

    assert_eq!(editor.buffer().text(), "1. a bb\n3. cc\n");
    assert_eq!(
        list_spans(&editor),
        vec![(ordered(0, 1), 0..8), (ordered(0, 3), 8..14)]
    );

    editor.delete(5..10);
    assert_eq!(editor.buffer().text(), "1. a  cc\n");
    assert_eq!(list_spans(&editor), vec![(ordered(0, 1), 0..9)]);
}

#[test]
fn test_typed_number_is_accepted_verbatim() {
    let mut editor = editor_with("1. a\n", &[(ordered(0, 1), 0..5)]);
    editor.set_cursor(1);
    editor.type_text("2");

    assert_eq!(editor.buffer().text(), "12. a\n");
    assert_eq!(list_spans(&editor), vec![(ordered(0, 12), 0..6)]);

    editor.set_selection(0, 2);
    editor.type_text("5");
    assert_eq!(list_spans(&editor), vec![(ordered(0, 5), 0..5)]);
}

#[test]
fn test_indenting_item_updates_nesting() {
    let mut editor = editor_with("1. a\n", &[(ordered(0, 1), 0..5)]);
    editor.set_cursor(0);
    editor.type_text(" ");

    assert_eq!(list_spans(&editor), vec![(ordered(1, 1), 0..6)]);
}

#[test]
fn test_removing_marker_drops_item() {
    let mut editor = editor_with("1. a\n", &[(ordered(0, 1), 0..5)]);
    editor.set_cursor(2);
    editor.backspace();

    assert_eq!(editor.buffer().text(), "1 a\n");
    assert!(list_spans(&editor).is_empty());
}

#[test]
fn test_typed_unordered_marker_is_detected_and_continued() {
    let mut editor = editor_with("", &[]);
    type_chars(&mut editor, "- x");
    let color = MarkdownConfig::default().unordered_list_color;
    let item = Annotation::UnorderedListItem {
        nested: 0,
        marker: ListMarker::Hyphen,
        color,
    };
    assert_eq!(list_spans(&editor), vec![(item.clone(), 0..3)]);

    editor.enter();
    assert_eq!(editor.buffer().text(), "- x\n- ");
    assert_eq!(
        list_spans(&editor),
        vec![(item.clone(), 0..4), (item.clone(), 4..6)]
    );

    editor.enter();
    assert_eq!(editor.buffer().text(), "- x\n");
    assert_eq!(list_spans(&editor), vec![(item, 0..4)]);
}

#[test]
fn test_lists_disabled_by_config() {
    let mut config = MarkdownConfig::default();
    config.syntax.lists = false;
    let mut editor = Editor::from_text("").with_listener(ListLive::new(&config));
    type_chars(&mut editor, "1. a\n");
    assert_eq!(editor.buffer().text(), "1. a\n");
    assert!(list_spans(&editor).is_empty());
}

#[test]
fn test_continuation_is_seen_by_style_listener() {
    let mut editor = editor_with("1. **a**\n", &[(ordered(0, 1), 0..9)]);
    editor.set_cursor(8);
    editor.enter();
    type_chars(&mut editor, "**b**");

    assert_eq!(editor.buffer().text(), "1. **a**\n2. **b**\n");
    let bold: Vec<_> = editor
        .buffer()
        .spans()
        .iter()
        .filter(|s| s.annotation == Annotation::Bold)
        .map(|s| s.range())
        .collect();
    assert!(bold.contains(&(3..8)));
    assert!(bold.contains(&(12..17)));
}

#[derive(Debug, Clone)]
enum Op {
    Type(char),
    Backspace,
    Cursor(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => prop::sample::select(vec!['1', '2', '.', ' ', '-', '*', 'a', '\n']).prop_map(Op::Type),
        1 => Just(Op::Backspace),
        1 => (0usize..64).prop_map(Op::Cursor),
    ]
}

proptest! {
    #[test]
    fn test_list_spans_never_degenerate(ops in prop::collection::vec(op(), 0..80)) {
        let mut editor = editor_with("", &[]);
        for op in ops {
            match op {
                Op::Type(c) => editor.type_text(&c.to_string()),
                Op::Backspace => editor.backspace(),
                Op::Cursor(pos) => editor.set_cursor(pos),
            }
            let len = editor.buffer().len_chars();
            for span in editor.buffer().spans() {
                prop_assert!(span.start() < span.end());
                prop_assert!(span.end() <= len);
            }
            prop_assert!(editor.cursor() <= len);
        }
    }
}
