//! Syntax highlighting for code blocks.
//!
//! The batch engine only knows the [`Highlighter`] trait. The default
//! implementation uses syntect with Sublime Text syntax definitions and
//! writes `Foreground` spans into the buffer.

use std::ops::Range;
use std::sync::OnceLock;

use syntect::easy::HighlightLines;
use syntect::highlighting::{Style, Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::config::ThemeMode;
use crate::editor::{Annotation, Buffer, Inclusivity, Rgb};

/// Colours a code region of a buffer in place.
///
/// Implementations only add spans inside `range`; they never change text.
pub trait Highlighter {
    fn highlight(&self, language: &str, buffer: &mut Buffer, range: Range<usize>);
}

/// syntect-backed highlighter.
#[derive(Debug, Clone, Copy)]
pub struct SyntectHighlighter {
    mode: BackgroundMode,
    fallback: Rgb,
}

impl SyntectHighlighter {
    /// `fallback` colours code in languages syntect does not know.
    pub fn new(theme: ThemeMode, fallback: Rgb) -> Self {
        let mode = match theme {
            ThemeMode::Light => BackgroundMode::Light,
            ThemeMode::Dark => BackgroundMode::Dark,
            ThemeMode::Auto => {
                background_mode_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
            }
        };
        Self { mode, fallback }
    }

    /// Add a `Foreground` span per styled token of `line`, which starts at
    /// `pos`. Returns the offset of the next line.
    fn colour_line<E: std::fmt::Display>(
        &self,
        buffer: &mut Buffer,
        mut pos: usize,
        line: &str,
        ranges: Result<Vec<(Style, &str)>, E>,
    ) -> usize {
        let ranges = match ranges {
            Ok(ranges) => ranges,
            Err(err) => {
                tracing::warn!(%err, "highlighting failed for line");
                return pos + line.chars().count();
            }
        };
        for (style, text) in ranges {
            let len = text.chars().count();
            let body = text.trim_end_matches('\n').chars().count();
            if !text.trim().is_empty() {
                let fg = Rgb::new(style.foreground.r, style.foreground.g, style.foreground.b);
                buffer.add_span(
                    Annotation::Foreground {
                        color: adjust_fg_for_background(fg, self.mode),
                    },
                    pos..pos + body,
                    Inclusivity::Exclusive,
                );
            }
            pos += len;
        }
        pos
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, language: &str, buffer: &mut Buffer, range: Range<usize>) {
        let _scope = crate::perf::scope("highlight.code_block");
        let code = buffer.slice(range.clone());
        let syntax_set = syntax_set();
        let syntax = syntax_set
            .find_syntax_by_token(language)
            .or_else(|| syntax_set.find_syntax_by_name(language));

        let Some(syntax) = syntax else {
            tracing::debug!(language, "no syntax definition, using plain colour");
            let mut pos = range.start;
            for line in LinesWithEndings::from(&code) {
                let body = line.trim_end_matches('\n').chars().count();
                if body > 0 {
                    buffer.add_span(
                        Annotation::Foreground {
                            color: self.fallback,
                        },
                        pos..pos + body,
                        Inclusivity::Exclusive,
                    );
                }
                pos += line.chars().count();
            }
            return;
        };

        let mut highlighter = HighlightLines::new(syntax, theme(self.mode));
        let mut pos = range.start;
        for line in LinesWithEndings::from(&code) {
            let ranges = highlighter.highlight_line(line, syntax_set);
            pos = self.colour_line(buffer, pos, line, ranges);
        }
    }
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.syntax_set.load_defaults");
        SyntaxSet::load_defaults_newlines()
    })
}

fn theme(mode: BackgroundMode) -> &'static Theme {
    static DARK: OnceLock<Theme> = OnceLock::new();
    static LIGHT: OnceLock<Theme> = OnceLock::new();
    let (cell, preferred) = match mode {
        BackgroundMode::Dark => (
            &DARK,
            [
                "Monokai Extended",
                "base16-eighties.dark",
                "Solarized (dark)",
                "base16-ocean.dark",
            ]
            .as_slice(),
        ),
        BackgroundMode::Light => (
            &LIGHT,
            ["InspiredGitHub", "Solarized (light)", "base16-ocean.light"].as_slice(),
        ),
    };
    cell.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.theme.load_defaults");
        let theme_set = ThemeSet::load_defaults();
        for name in preferred {
            if let Some(theme) = theme_set.themes.get(*name) {
                return theme.clone();
            }
        }
        theme_set
            .themes
            .values()
            .next()
            .cloned()
            .unwrap_or_default()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackgroundMode {
    Dark,
    Light,
}

fn background_mode_from_colorfgbg(colorfgbg: Option<&str>) -> BackgroundMode {
    let Some(value) = colorfgbg else {
        return BackgroundMode::Dark;
    };
    let bg_str = value.rsplit(';').next().unwrap_or(value);
    let Ok(bg) = bg_str.parse::<u8>() else {
        return BackgroundMode::Dark;
    };

    if bg >= 7 {
        BackgroundMode::Light
    } else {
        BackgroundMode::Dark
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_lossless
)]
fn adjust_fg_for_background(color: Rgb, mode: BackgroundMode) -> Rgb {
    match mode {
        BackgroundMode::Dark => color,
        BackgroundMode::Light => {
            let luma = (0.2126 * color.r as f32)
                + (0.7152 * color.g as f32)
                + (0.0722 * color.b as f32);
            if luma < 155.0 {
                return color;
            }
            let scale = |c: u8| ((c as f32) * 0.42).round() as u8;
            Rgb::new(scale(color.r), scale(color.g), scale(color.b))
        }
    }
}
