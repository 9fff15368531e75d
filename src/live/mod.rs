//! Live-mode maintainers.
//!
//! These are [`EditListener`](crate::editor::EditListener)s that keep
//! annotations correct while the user types. Register them on an
//! [`Editor`](crate::editor::Editor):
//!
//! ```
//! use marklive::config::MarkdownConfig;
//! use marklive::editor::Editor;
//! use marklive::live::{ListLive, StyleLive};
//!
//! let config = MarkdownConfig::default();
//! let mut editor = Editor::from_text("")
//!     .with_listener(ListLive::new(&config))
//!     .with_listener(StyleLive::new(&config));
//! editor.type_text("1. milk");
//! editor.type_text("\n");
//! assert_eq!(editor.buffer().text(), "1. milk\n2. ");
//! ```

mod list;
mod style;

pub use list::{ListLine, ListLive, nested, order_number};
pub use style::StyleLive;
