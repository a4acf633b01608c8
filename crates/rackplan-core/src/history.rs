//! Snapshot-based undo/redo over the layout.

use crate::geometry::LayoutDocument;
use std::collections::VecDeque;

/// Default number of undo states to keep.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Bounded undo stack of whole-layout snapshots.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    capacity: usize,
    /// Oldest snapshot at the front.
    undo_stack: VecDeque<LayoutDocument>,
    redo_stack: Vec<LayoutDocument>,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryManager {
    /// Create a history keeping at most `capacity` undo states.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            undo_stack: VecDeque::with_capacity(capacity.max(1)),
            redo_stack: Vec::new(),
        }
    }

    /// Record the state before a mutation. Evicts the oldest snapshot when full.
    pub fn push(&mut self, snapshot: LayoutDocument) {
        self.undo_stack.push_back(snapshot);
        self.redo_stack.clear();
        while self.undo_stack.len() > self.capacity {
            self.undo_stack.pop_front();
        }
    }

    /// Take the latest snapshot, remembering `current` for redo.
    pub fn undo(&mut self, current: LayoutDocument) -> Option<LayoutDocument> {
        let snapshot = self.undo_stack.pop_back()?;
        self.redo_stack.push(current);
        Some(snapshot)
    }

    /// Take the latest undone state, remembering `current` for undo.
    pub fn redo(&mut self, current: LayoutDocument) -> Option<LayoutDocument> {
        let snapshot = self.redo_stack.pop()?;
        self.undo_stack.push_back(current);
        while self.undo_stack.len() > self.capacity {
            self.undo_stack.pop_front();
        }
        Some(snapshot)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undo states held.
    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    /// Forget all history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
