// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. syntax::SyntaxEngine)
    clippy::module_name_repetitions
)]

//! # marklive
//!
//! Markdown to annotated text, for editors that style text with spans.
//!
//! marklive turns markdown source into plain text plus a set of typed
//! annotation spans:
//! - A batch engine that rewrites a whole document in one pass
//! - Live maintainers that keep list and inline-style spans correct while
//!   the user types
//! - Escape protection so `\*` stays a literal asterisk
//! - Click targets for links, images, footnotes and todo items
//!
//! ## Architecture
//!
//! Everything operates on an [`editor::Buffer`]: rope text plus spans whose
//! ranges follow every edit. The batch engine applies a fixed, ordered rule
//! set to a buffer. In live mode an [`editor::Editor`] host delivers a
//! before/after/complete edit protocol to registered listeners, which may
//! answer with corrective edits of their own.
//!
//! ## Modules
//!
//! - [`editor`]: Buffer, spans, the edit protocol and a minimal host
//! - [`syntax`]: Batch syntax engine
//! - [`live`]: Live list and style maintainers
//! - [`text`]: Line helpers, escape protection, token batches
//! - [`highlight`]: Code block highlighting
//! - [`config`]: Options and rc-file flags
//! - [`perf`]: Timing scopes

pub mod config;
pub mod editor;
pub mod highlight;
pub mod live;
pub mod perf;
pub mod syntax;
pub mod text;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::MarkdownConfig;
    pub use crate::editor::{Annotation, Buffer, Editor, EditListener};
    pub use crate::live::{ListLive, StyleLive};
    pub use crate::syntax::SyntaxEngine;
}
