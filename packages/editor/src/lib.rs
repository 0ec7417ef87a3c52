//! # Inkpad Editor
//!
//! The editing engine: one [`Editor`] instance owns a document and keeps
//! its live DOM in step with it under incremental edits.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ mutations: validated, intent-preserving     │
//! │ edits with precomputed inverses             │
//! └─────────────────────────────────────────────┘
//!                     ↓ apply
//! ┌─────────────────────────────────────────────┐
//! │ editor: post model + undo history           │
//! │  - edits the post, marks render nodes dirty │
//! │  - undo/redo replay through the same path   │
//! └─────────────────────────────────────────────┘
//!                     ↓ rerender
//! ┌─────────────────────────────────────────────┐
//! │ render tree: dirty-subtree reconciliation   │
//! │ onto the in-memory DOM                      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core principles
//!
//! 1. **The post is the source of truth**: the DOM is a derived view,
//!    regenerated from dirty render nodes on demand.
//! 2. **Mutations are validated before they touch anything**: a rejected
//!    edit leaves post, tree and DOM untouched.
//! 3. **Inverses are computed up front**: every applied mutation lands on
//!    the undo stack with the mutation that reverts it.
//! 4. **History replays through the normal path**: undo and redo apply
//!    mutations exactly like live edits, so dirty marking is identical.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use inkpad_editor::{Editor, Mutation, SectionSnapshot};
//!
//! let mut editor = Editor::new();
//! editor.apply(Mutation::InsertSection {
//!     index: 0,
//!     section: SectionSnapshot::Markup {
//!         uid: None,
//!         tag: "p".into(),
//!         children: vec![],
//!     },
//! })?;
//! editor.rerender()?;
//! println!("{}", editor.html());
//! ```

mod editor;
mod errors;
mod mutations;
mod undo_stack;

pub use editor::Editor;
pub use errors::EditorError;
pub use mutations::{Mutation, MutationEffect, MutationError};
pub use undo_stack::{MutationBatch, UndoStack};

// The types the editor API surfaces from the underlying packages.
pub use inkpad_post::{InlineSnapshot, Markup, PostSnapshot, PostUid, SectionSnapshot};
pub use inkpad_render::{AtomHost, CardHost, HostRegistry, RenderStats};
