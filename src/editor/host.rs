use std::ops::Range;

use super::buffer::Buffer;
use super::listener::{BoxedListener, EditContext, EditDelta, EditListener};

/// Minimal host: owns a buffer and its listeners and delivers the edit
/// protocol around every mutation.
///
/// Listeners are notified in registration order. The caret follows both the
/// host's edits and any corrective edits listeners make.
pub struct Editor {
    buffer: Buffer,
    listeners: Vec<BoxedListener>,
    selection: Range<usize>,
}

impl Editor {
    pub fn new(buffer: Buffer) -> Self {
        let end = buffer.len_chars();
        Self {
            buffer,
            listeners: Vec::new(),
            selection: end..end,
        }
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(Buffer::from_text(text))
    }

    pub fn with_listener(mut self, listener: impl EditListener + 'static) -> Self {
        self.add_listener(listener);
        self
    }

    pub fn add_listener(&mut self, listener: impl EditListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub const fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn into_buffer(self) -> Buffer {
        self.buffer
    }

    pub fn selection(&self) -> Range<usize> {
        self.selection.clone()
    }

    /// Caret position (end of the selection).
    pub const fn cursor(&self) -> usize {
        self.selection.end
    }

    pub fn set_selection(&mut self, start: usize, end: usize) {
        let len = self.buffer.len_chars();
        let (start, end) = (start.min(len), end.min(len));
        self.selection = start..end;
        for listener in &mut self.listeners {
            listener.selection_changed(start, end);
        }
    }

    pub fn set_cursor(&mut self, pos: usize) {
        self.set_selection(pos, pos);
    }

    // --- Host edits ---

    pub fn insert(&mut self, at: usize, text: &str) {
        self.replace(at..at, text);
    }

    pub fn delete(&mut self, range: Range<usize>) {
        self.replace(range, "");
    }

    /// Replace `range` with `text`, running every listener around it.
    pub fn replace(&mut self, range: Range<usize>, text: &str) {
        let len = self.buffer.len_chars();
        let start = range.start.min(len);
        let range = start..range.end.clamp(start, len);
        if range.is_empty() && text.is_empty() {
            return;
        }
        let delta = EditDelta::for_replace(&range, text);
        tracing::trace!(?delta, "host edit");

        let mut journal = self.dispatch(|listener, ctx| listener.before_change(ctx, delta));
        self.buffer.replace(range, text);
        self.shift_selection(delta);
        journal.extend(self.dispatch(|listener, ctx| listener.after_change(ctx, delta)));
        for correction in journal {
            self.shift_selection(correction);
        }
        for listener in &mut self.listeners {
            listener.edit_complete(&self.buffer);
        }
    }

    /// Type `text` at the caret, replacing any selection.
    pub fn type_text(&mut self, text: &str) {
        self.replace(self.selection(), text);
    }

    /// Enter key.
    pub fn enter(&mut self) {
        self.type_text("\n");
    }

    /// Delete the selection, or the char before the caret.
    pub fn backspace(&mut self) {
        let selection = self.selection();
        if !selection.is_empty() {
            self.delete(selection);
        } else if selection.start > 0 {
            self.delete(selection.start - 1..selection.start);
        }
    }

    // --- Private helpers ---

    fn dispatch(
        &mut self,
        mut notify: impl FnMut(&mut dyn EditListener, &mut EditContext<'_>),
    ) -> Vec<EditDelta> {
        let mut journal = Vec::new();
        for i in 0..self.listeners.len() {
            let (head, rest) = self.listeners.split_at_mut(i);
            let Some((current, tail)) = rest.split_first_mut() else {
                break;
            };
            let others = head.iter_mut().chain(tail.iter_mut()).collect();
            let mut ctx = EditContext::new(&mut self.buffer, others);
            notify(current.as_mut(), &mut ctx);
            journal.extend(ctx.into_journal());
        }
        journal
    }

    fn shift_selection(&mut self, delta: EditDelta) {
        self.selection = delta.shift(self.selection.start)..delta.shift(self.selection.end);
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("buffer", &self.buffer)
            .field("listeners", &self.listeners.len())
            .field("selection", &self.selection)
            .finish()
    }
}
