//! # Undo/Redo Stack
//!
//! Tracks mutation history as batches of (mutation, inverse) pairs.
//!
//! ## Design
//!
//! - Each mutation's inverse is computed before the mutation is applied
//! - The stack only stores history; the editor replays batches through
//!   its normal apply path, so dirty marking is identical for live edits
//!   and history replay
//! - Undo hands back the inverses and parks the batch on the redo stack
//! - Redo hands back the original mutations
//! - New mutations clear the redo stack
//! - Batches group multiple mutations into one undo step

use crate::mutations::Mutation;

/// A group of mutations undone/redone together.
#[derive(Debug, Clone)]
pub struct MutationBatch {
    /// The mutations in application order.
    pub mutations: Vec<Mutation>,

    /// The inverse mutations, in reverse order for undo.
    pub inverses: Vec<Mutation>,

    /// Optional description of this batch.
    pub description: Option<String>,
}

impl MutationBatch {
    pub fn single(mutation: Mutation, inverse: Mutation) -> Self {
        Self {
            mutations: vec![mutation],
            inverses: vec![inverse],
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Undo/redo history for one editor instance.
#[derive(Debug)]
pub struct UndoStack {
    /// Applied batches, most recent last.
    undo_stack: Vec<MutationBatch>,

    /// Undone batches, most recent last.
    redo_stack: Vec<MutationBatch>,

    /// Maximum number of undo levels (0 = unlimited).
    max_levels: usize,

    /// Batch currently being built.
    current_batch: Option<MutationBatch>,
}

impl UndoStack {
    /// Default depth is 100 levels.
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            current_batch: None,
        }
    }

    /// Record an applied mutation and its precomputed inverse.
    pub fn record(&mut self, mutation: Mutation, inverse: Mutation) {
        if let Some(batch) = &mut self.current_batch {
            batch.mutations.push(mutation);
            // Inverses unwind in reverse application order.
            batch.inverses.insert(0, inverse);
        } else {
            let batch = MutationBatch::single(mutation, inverse);
            self.push_batch(batch);
        }
    }

    /// Start grouping mutations into one undo step.
    pub fn begin_batch(&mut self) {
        self.current_batch = Some(MutationBatch {
            mutations: Vec::new(),
            inverses: Vec::new(),
            description: None,
        });
    }

    /// Close the current batch and push it, unless it stayed empty.
    pub fn end_batch(&mut self) {
        if let Some(batch) = self.current_batch.take() {
            if !batch.mutations.is_empty() {
                self.push_batch(batch);
            }
        }
    }

    pub fn set_batch_description(&mut self, description: impl Into<String>) {
        if let Some(batch) = &mut self.current_batch {
            batch.description = Some(description.into());
        }
    }

    fn push_batch(&mut self, batch: MutationBatch) {
        self.undo_stack.push(batch);
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }
        // A new edit invalidates the redo future.
        self.redo_stack.clear();
    }

    /// Pop the most recent batch for the editor to unwind.
    pub fn take_undo(&mut self) -> Option<MutationBatch> {
        self.undo_stack.pop()
    }

    /// Park an unwound batch on the redo stack.
    pub fn push_undone(&mut self, batch: MutationBatch) {
        self.redo_stack.push(batch);
    }

    /// Pop the most recently undone batch for the editor to replay.
    pub fn take_redo(&mut self) -> Option<MutationBatch> {
        self.redo_stack.pop()
    }

    /// Return a replayed batch to the undo stack (without clearing redo).
    pub fn push_redone(&mut self, batch: MutationBatch) {
        self.undo_stack.push(batch);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current_batch = None;
    }

    /// Description of the next undo operation, if the batch has one.
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|batch| batch.description.as_deref())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack
            .last()
            .and_then(|batch| batch.description.as_deref())
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}
