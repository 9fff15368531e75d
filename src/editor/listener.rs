//! Edit notifications and the context listeners receive with them.

use std::ops::Range;

use serde::Serialize;

use super::buffer::Buffer;

/// One buffer mutation: `removed` chars at `start` were replaced by
/// `inserted` chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EditDelta {
    pub start: usize,
    pub removed: usize,
    pub inserted: usize,
}

impl EditDelta {
    pub const fn new(start: usize, removed: usize, inserted: usize) -> Self {
        Self {
            start,
            removed,
            inserted,
        }
    }

    pub fn for_replace(range: &Range<usize>, text: &str) -> Self {
        Self::new(range.start, range.len(), text.chars().count())
    }

    /// Where a caret at `pos` ends up after this edit. A caret sitting
    /// exactly at an insertion point moves past the inserted text.
    pub const fn shift(self, pos: usize) -> usize {
        let removed_end = self.start + self.removed;
        if pos < self.start {
            pos
        } else if pos < removed_end {
            self.start + self.inserted
        } else {
            pos - self.removed + self.inserted
        }
    }
}

/// Receives the host's edit protocol.
///
/// `before_change` sees the buffer before the mutation, `after_change`
/// right after it, and `edit_complete` once every listener has reacted.
pub trait EditListener {
    fn before_change(&mut self, _ctx: &mut EditContext<'_>, _delta: EditDelta) {}

    fn after_change(&mut self, _ctx: &mut EditContext<'_>, _delta: EditDelta) {}

    fn edit_complete(&mut self, _buffer: &Buffer) {}

    fn selection_changed(&mut self, _start: usize, _end: usize) {}
}

pub type BoxedListener = Box<dyn EditListener>;

/// The buffer plus every listener except the one being notified.
///
/// The notified listener is borrowed out of the listener set for as long as
/// this context lives, so it cannot be re-entered by its own corrective
/// edits. Those edits are replayed to everyone else instead.
pub struct EditContext<'a> {
    buffer: &'a mut Buffer,
    others: Vec<&'a mut BoxedListener>,
    journal: Vec<EditDelta>,
}

impl<'a> EditContext<'a> {
    pub(crate) fn new(buffer: &'a mut Buffer, others: Vec<&'a mut BoxedListener>) -> Self {
        Self {
            buffer,
            others,
            journal: Vec::new(),
        }
    }

    /// A context with nobody to replay to.
    pub fn detached(buffer: &'a mut Buffer) -> Self {
        Self::new(buffer, Vec::new())
    }

    pub fn buffer(&self) -> &Buffer {
        &*self.buffer
    }

    /// Direct access for annotation changes. Text changes made here are not
    /// seen by other listeners; use [`EditContext::corrective_edit`].
    pub fn buffer_mut(&mut self) -> &mut Buffer {
        &mut *self.buffer
    }

    /// Replace `range` with `text` on behalf of the notified listener and
    /// replay before/after/complete to every other listener.
    pub fn corrective_edit(&mut self, range: Range<usize>, text: &str) {
        let len = self.buffer.len_chars();
        let range = range.start.min(len)..range.end.clamp(range.start.min(len), len);
        let delta = EditDelta::for_replace(&range, text);
        tracing::trace!(?delta, text, "corrective edit");

        for other in &mut self.others {
            other.before_change(&mut EditContext::detached(&mut *self.buffer), delta);
        }
        self.buffer.replace(range, text);
        for other in &mut self.others {
            other.after_change(&mut EditContext::detached(&mut *self.buffer), delta);
        }
        for other in &mut self.others {
            other.edit_complete(&*self.buffer);
        }
        self.journal.push(delta);
    }

    /// Corrective edits made through this context, in order.
    pub(crate) fn into_journal(self) -> Vec<EditDelta> {
        self.journal
    }
}
