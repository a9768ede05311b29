use crate::layout::Album;
use std::collections::VecDeque;

/// Bounded undo/redo of whole-album snapshots.
///
/// Every entry is the album as it was before one committed edit, so any
/// state can be restored directly without replaying inverse operations.
#[derive(Debug, Clone)]
pub struct EditHistory {
    undo_stack: VecDeque<Album>,
    redo_stack: VecDeque<Album>,
    max_steps: usize,
}

impl EditHistory {
    /// `max_steps` is raised to 1 if zero.
    pub fn new(max_steps: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_steps: max_steps.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.max_steps
    }

    /// Records the state preceding a committed edit.
    pub fn push(&mut self, prior: Album) {
        self.redo_stack.clear();
        self.push_undo(prior);
    }

    fn push_undo(&mut self, snapshot: Album) {
        self.undo_stack.push_back(snapshot);
        while self.undo_stack.len() > self.max_steps {
            self.undo_stack.pop_front();
        }
    }

    /// Returns the snapshot to show after undoing, or `current` unchanged
    /// when there is nothing to undo.
    pub fn undo(&mut self, current: Album) -> Album {
        match self.undo_stack.pop_back() {
            Some(previous) => {
                self.redo_stack.push_back(current);
                previous
            }
            None => current,
        }
    }

    pub fn redo(&mut self, current: Album) -> Album {
        match self.redo_stack.pop_back() {
            Some(next) => {
                self.push_undo(current);
                next
            }
            None => current,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
