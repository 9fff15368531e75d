//! Benchmarks for markdown parsing.

use std::ops::Range;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use marklive::config::MarkdownConfig;
use marklive::editor::{Buffer, Editor};
use marklive::highlight::{Highlighter, SyntectHighlighter};
use marklive::live::{ListLive, StyleLive};
use marklive::syntax::SyntaxEngine;

const MEDIUM: &str = r#"# Shopping

Things to **buy** before the *weekend*, see [the list](https://example.com).

1. milk
2. eggs
   3. free range
- bread
- [ ] butter
- [x] jam

> Quoted advice with `inline code` and ~~struck~~ text\*.

| item | qty |
|------|----:|
| milk | 2   |
| eggs | 12  |

```rust
fn main() {
    println!("hello");
}
```

![cart](cart.png) and a footnote[^1].
"#;

struct NoHighlight;

impl Highlighter for NoHighlight {
    fn highlight(&self, _language: &str, _buffer: &mut Buffer, _range: Range<usize>) {}
}

fn bench_parse_simple(c: &mut Criterion) {
    let engine = SyntaxEngine::new(MarkdownConfig::default(), Box::new(NoHighlight));
    let md = "# Hello\n\nWorld";
    c.bench_function("parse_simple", |b| b.iter(|| engine.parse(black_box(md))));
}

fn bench_parse_medium(c: &mut Criterion) {
    let engine = SyntaxEngine::new(MarkdownConfig::default(), Box::new(NoHighlight));
    c.bench_function("parse_medium", |b| b.iter(|| engine.parse(black_box(MEDIUM))));
}

fn bench_parse_highlighted(c: &mut Criterion) {
    let config = MarkdownConfig::default();
    let highlighter = SyntectHighlighter::new(config.theme, config.code_foreground);
    let engine = SyntaxEngine::new(config, Box::new(highlighter));
    c.bench_function("parse_highlighted", |b| {
        b.iter(|| engine.parse(black_box(MEDIUM)))
    });
}

fn bench_live_typing(c: &mut Criterion) {
    let config = MarkdownConfig::default();
    c.bench_function("live_typing", |b| {
        b.iter(|| {
            let mut editor = Editor::from_text("")
                .with_listener(ListLive::new(&config))
                .with_listener(StyleLive::new(&config));
            for ch in black_box(MEDIUM).chars() {
                editor.type_text(&ch.to_string());
            }
            editor.into_buffer()
        })
    });
}

criterion_group!(
    benches,
    bench_parse_simple,
    bench_parse_medium,
    bench_parse_highlighted,
    bench_live_typing
);
criterion_main!(benches);
