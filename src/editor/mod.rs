//! Annotated text buffer and the edit protocol around it.
//!
//! [`Buffer`] owns text and spans and keeps span ranges consistent across
//! every mutation. [`Editor`] is a small host that runs the
//! before/after/complete notification sequence for registered
//! [`EditListener`]s, which is how live formatting hooks in.

mod buffer;
mod host;
mod listener;
mod span;

pub use buffer::Buffer;
pub use host::Editor;
pub use listener::{BoxedListener, EditContext, EditDelta, EditListener};
pub use span::{
    Annotation, AnnotationKind, ClickKind, ClickTarget, ColorParseError, Inclusivity, ListMarker,
    Rgb, Span, SpanId,
};
