//! Options for the batch engine and live maintainers, plus rc-file loading.
//!
//! [`MarkdownConfig`] is the read-only options object threaded into rules
//! and listeners. [`ConfigFlags`] is the partial, mergeable form read from
//! rc files and the command line; [`ConfigFlags::resolve`] turns it into a
//! `MarkdownConfig`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::editor::Rgb;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    #[default]
    Auto,
    Light,
    Dark,
}

impl ThemeMode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

/// One switch per syntax rule. Everything is on by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyntaxToggles {
    pub code_block: bool,
    pub table: bool,
    pub header: bool,
    pub quote: bool,
    pub todo: bool,
    /// Ordered and unordered lists, batch and live.
    pub lists: bool,
    pub inline_code: bool,
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub footnote: bool,
    pub image: bool,
    pub link: bool,
}

impl Default for SyntaxToggles {
    fn default() -> Self {
        Self {
            code_block: true,
            table: true,
            header: true,
            quote: true,
            todo: true,
            lists: true,
            inline_code: true,
            bold: true,
            italic: true,
            strikethrough: true,
            footnote: true,
            image: true,
            link: true,
        }
    }
}

impl SyntaxToggles {
    pub const NAMES: &'static [&'static str] = &[
        "code-block",
        "table",
        "header",
        "quote",
        "todo",
        "lists",
        "inline-code",
        "bold",
        "italic",
        "strikethrough",
        "footnote",
        "image",
        "link",
    ];

    /// Flip the rule called `name`. Returns false for unknown names.
    pub fn set(&mut self, name: &str, on: bool) -> bool {
        let slot = match name {
            "code-block" => &mut self.code_block,
            "table" => &mut self.table,
            "header" => &mut self.header,
            "quote" => &mut self.quote,
            "todo" => &mut self.todo,
            "lists" => &mut self.lists,
            "inline-code" => &mut self.inline_code,
            "bold" => &mut self.bold,
            "italic" => &mut self.italic,
            "strikethrough" => &mut self.strikethrough,
            "footnote" => &mut self.footnote,
            "image" => &mut self.image,
            "link" => &mut self.link,
            _ => return false,
        };
        *slot = on;
        true
    }
}

/// Read-only options shared by every rule and listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkdownConfig {
    pub unordered_list_color: Rgb,
    pub code_background: Rgb,
    pub code_foreground: Rgb,
    /// Left margin of code-block lines, in columns.
    pub code_indent: usize,
    /// Left margin per quote level, in columns.
    pub quote_indent: usize,
    pub theme: ThemeMode,
    pub syntax: SyntaxToggles,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            unordered_list_color: Rgb::new(0xdd, 0xdd, 0xdd),
            code_background: Rgb::new(0xf0, 0xf0, 0xf0),
            code_foreground: Rgb::new(0x55, 0x55, 0x55),
            code_indent: 4,
            quote_indent: 2,
            theme: ThemeMode::Auto,
            syntax: SyntaxToggles::default(),
        }
    }
}

/// Partial options as written in an rc file or on the command line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub perf: bool,
    pub theme: Option<ThemeMode>,
    pub list_color: Option<Rgb>,
    pub code_background: Option<Rgb>,
    pub code_foreground: Option<Rgb>,
    pub code_indent: Option<usize>,
    pub quote_indent: Option<usize>,
    /// Rule names, applied in order with later entries winning.
    pub rules: Vec<(String, bool)>,
}

impl ConfigFlags {
    /// Merge `other` over `self`: options in `other` win, booleans OR.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            perf: self.perf || other.perf,
            theme: other.theme.or(self.theme),
            list_color: other.list_color.or(self.list_color),
            code_background: other.code_background.or(self.code_background),
            code_foreground: other.code_foreground.or(self.code_foreground),
            code_indent: other.code_indent.or(self.code_indent),
            quote_indent: other.quote_indent.or(self.quote_indent),
            rules: self.rules.iter().chain(&other.rules).cloned().collect(),
        }
    }

    pub fn resolve(&self) -> MarkdownConfig {
        let defaults = MarkdownConfig::default();
        let mut syntax = defaults.syntax;
        for (name, on) in &self.rules {
            if !syntax.set(name, *on) {
                tracing::warn!(rule = %name, "unknown syntax rule ignored");
            }
        }
        MarkdownConfig {
            unordered_list_color: self.list_color.unwrap_or(defaults.unordered_list_color),
            code_background: self.code_background.unwrap_or(defaults.code_background),
            code_foreground: self.code_foreground.unwrap_or(defaults.code_foreground),
            code_indent: self.code_indent.unwrap_or(defaults.code_indent),
            quote_indent: self.quote_indent.unwrap_or(defaults.quote_indent),
            theme: self.theme.unwrap_or(defaults.theme),
            syntax,
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("marklive").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("marklive")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("marklive").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("marklive")
                .join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".markliverc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# marklive defaults (saved with --save)".to_string()];
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(theme) = flags.theme {
        lines.push(format!("--theme {}", theme.as_str()));
    }
    let colours = [
        ("--list-color", flags.list_color),
        ("--code-background", flags.code_background),
        ("--code-foreground", flags.code_foreground),
    ];
    for (flag, colour) in colours {
        if let Some(colour) = colour {
            lines.push(format!("{flag} {colour}"));
        }
    }
    if let Some(width) = flags.code_indent {
        lines.push(format!("--code-indent {width}"));
    }
    if let Some(width) = flags.quote_indent {
        lines.push(format!("--quote-indent {width}"));
    }
    for (name, on) in &flags.rules {
        let flag = if *on { "--enable" } else { "--disable" };
        lines.push(format!("{flag} {name}"));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick known flags out of a token list. Unknown tokens are skipped and
/// malformed values are logged and dropped.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        if token == "--perf" {
            flags.perf = true;
            i += 1;
            continue;
        }
        let (name, inline_value) = match token.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (token, None),
        };
        if !VALUE_FLAGS.contains(&name) {
            i += 1;
            continue;
        }
        let value = match inline_value {
            Some(value) => value,
            None => {
                i += 1;
                match tokens.get(i) {
                    Some(next) => next.as_str(),
                    None => {
                        tracing::warn!(flag = name, "missing value");
                        break;
                    }
                }
            }
        };
        apply_value(&mut flags, name, value);
        i += 1;
    }
    flags
}

const VALUE_FLAGS: &[&str] = &[
    "--theme",
    "--list-color",
    "--code-background",
    "--code-foreground",
    "--code-indent",
    "--quote-indent",
    "--enable",
    "--disable",
];

fn apply_value(flags: &mut ConfigFlags, name: &str, value: &str) {
    match name {
        "--theme" => match parse_theme(value) {
            Some(theme) => flags.theme = Some(theme),
            None => tracing::warn!(value, "unknown theme ignored"),
        },
        "--list-color" => flags.list_color = parse_colour(name, value),
        "--code-background" => flags.code_background = parse_colour(name, value),
        "--code-foreground" => flags.code_foreground = parse_colour(name, value),
        "--code-indent" => flags.code_indent = parse_width(name, value),
        "--quote-indent" => flags.quote_indent = parse_width(name, value),
        "--enable" => flags.rules.push((value.to_string(), true)),
        "--disable" => flags.rules.push((value.to_string(), false)),
        _ => {}
    }
}

fn parse_theme(s: &str) -> Option<ThemeMode> {
    match s {
        "auto" => Some(ThemeMode::Auto),
        "light" => Some(ThemeMode::Light),
        "dark" => Some(ThemeMode::Dark),
        _ => None,
    }
}

fn parse_colour(flag: &str, value: &str) -> Option<Rgb> {
    value
        .parse::<Rgb>()
        .inspect_err(|err| tracing::warn!(flag, %err, "bad colour ignored"))
        .ok()
}

fn parse_width(flag: &str, value: &str) -> Option<usize> {
    value
        .parse::<usize>()
        .inspect_err(|err| tracing::warn!(flag, %err, "bad width ignored"))
        .ok()
}
