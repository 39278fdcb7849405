//! # History Manager
//!
//! Linear undo/redo over reversible operations.
//!
//! The stack is a vector with a cursor in `[0, len]`: everything below the
//! cursor has been applied, everything at or above it has been undone.
//! A push truncates the undone tail, the standard linear model. Boundary
//! calls (`undo` on empty history, `redo` at the tip) are no-ops, which
//! also makes redundant undo-after-undo and redo-after-redo safe.

use crate::commit::replace_document;
use crate::ops::{Operation, ReplayError};
use crate::store::DocumentStore;
use tracing::debug;

#[derive(Default)]
pub struct HistoryManager {
    operations: Vec<Operation>,
    cursor: usize,
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an already-applied operation, discarding any undone tail
    pub fn push(&mut self, operation: Operation) {
        self.operations.truncate(self.cursor);
        debug!(label = %operation.label, depth = self.operations.len() + 1, "history push");
        self.operations.push(operation);
        self.cursor = self.operations.len();
    }

    /// Reverts the most recent operation and re-derives the document.
    /// Returns `Ok(false)` when there is nothing to undo. On a replay
    /// failure the cursor stays put and the error is surfaced.
    pub fn undo(&mut self, store: &DocumentStore) -> Result<bool, ReplayError> {
        if self.cursor == 0 {
            return Ok(false);
        }
        let Some(operation) = self.operations.get(self.cursor - 1) else {
            return Ok(false);
        };

        let mut document = store.document_clone().ok_or(ReplayError::NoDocument)?;
        operation.apply_backward(&mut document)?;
        replace_document(store, document)?;

        debug!(label = %operation.label, "undo");
        self.cursor -= 1;
        Ok(true)
    }

    /// Reapplies the most recently undone operation. `Ok(false)` at the
    /// stack tip.
    pub fn redo(&mut self, store: &DocumentStore) -> Result<bool, ReplayError> {
        let Some(operation) = self.operations.get(self.cursor) else {
            return Ok(false);
        };

        let mut document = store.document_clone().ok_or(ReplayError::NoDocument)?;
        operation.apply_forward(&mut document)?;
        replace_document(store, document)?;

        debug!(label = %operation.label, "redo");
        self.cursor += 1;
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.operations.len()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Label of the operation the next `undo` would revert
    pub fn undo_label(&self) -> Option<&str> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.operations.get(i))
            .map(|op| op.label.as_str())
    }

    /// Label of the operation the next `redo` would reapply
    pub fn redo_label(&self) -> Option<&str> {
        self.operations.get(self.cursor).map(|op| op.label.as_str())
    }

    pub fn clear(&mut self) {
        self.operations.clear();
        self.cursor = 0;
    }
}
