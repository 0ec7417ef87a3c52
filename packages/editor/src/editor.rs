//! The editor facade: one instance owns the post, its DOM, the render
//! tree and the edit history, and keeps them in step.
//!
//! `apply` is the only way a document changes: validate, record the
//! inverse, edit the post, translate the effect into dirty marks on the
//! render tree. `rerender` then runs one reconciliation pass. Undo and
//! redo replay recorded mutations through the same path, so history
//! replay dirties the tree exactly like a live edit.

use inkpad_dom::DomDocument;
use inkpad_post::{Post, PostSnapshot, PostUid};
use inkpad_render::{HostRegistry, RenderStats, RenderTree, Renderer};
use tracing::{debug, info};

use crate::errors::EditorError;
use crate::mutations::{Mutation, MutationEffect};
use crate::undo_stack::UndoStack;

pub struct Editor {
    post: Post,
    dom: DomDocument,
    tree: RenderTree,
    hosts: HostRegistry,
    undo: UndoStack,
    version: u64,
}

impl Editor {
    /// An empty document with no card or atom hosts.
    pub fn new() -> Self {
        Self::with_hosts(HostRegistry::new())
    }

    pub fn with_hosts(hosts: HostRegistry) -> Self {
        Self::build(Post::new(), hosts)
    }

    pub fn from_snapshot(snapshot: &PostSnapshot) -> Result<Self, EditorError> {
        Self::from_snapshot_with_hosts(snapshot, HostRegistry::new())
    }

    pub fn from_snapshot_with_hosts(
        snapshot: &PostSnapshot,
        hosts: HostRegistry,
    ) -> Result<Self, EditorError> {
        Ok(Self::build(Post::from_snapshot(snapshot)?, hosts))
    }

    fn build(post: Post, hosts: HostRegistry) -> Self {
        let dom = DomDocument::new();
        let tree = RenderTree::new(post.uid(post.root()), dom.root());
        Self {
            post,
            dom,
            tree,
            hosts,
            undo: UndoStack::new(),
            version: 0,
        }
    }

    pub fn post(&self) -> &Post {
        &self.post
    }

    pub fn dom(&self) -> &DomDocument {
        &self.dom
    }

    pub fn tree(&self) -> &RenderTree {
        &self.tree
    }

    /// Bumped once per applied mutation, including history replay.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    /// Current document markup (the DOM root's children, serialized).
    pub fn html(&self) -> String {
        self.dom.inner_string(self.dom.root())
    }

    /// Validate and apply a mutation, recording it for undo.
    pub fn apply(&mut self, mut mutation: Mutation) -> Result<(), EditorError> {
        mutation.pin_uids(&mut self.post);
        let inverse = mutation.to_inverse(&self.post)?;
        let effect = mutation.apply(&mut self.post)?;
        debug!(?effect, "mutation applied");
        self.apply_effect(effect);
        self.undo.record(mutation, inverse);
        self.version += 1;
        Ok(())
    }

    /// Run one reconciliation pass over the dirty render subtree.
    pub fn rerender(&mut self) -> Result<RenderStats, EditorError> {
        let stats = Renderer::new(&self.hosts).render(&mut self.tree, &mut self.dom, &self.post)?;
        Ok(stats)
    }

    /// Unwind the most recent batch. Returns false when there is nothing
    /// to undo.
    pub fn undo(&mut self) -> Result<bool, EditorError> {
        match self.undo.take_undo() {
            Some(batch) => {
                for inverse in &batch.inverses {
                    self.apply_untracked(inverse)?;
                }
                info!(mutations = batch.mutations.len(), "undid batch");
                self.undo.push_undone(batch);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Replay the most recently undone batch. Returns false when there is
    /// nothing to redo.
    pub fn redo(&mut self) -> Result<bool, EditorError> {
        match self.undo.take_redo() {
            Some(batch) => {
                for mutation in &batch.mutations {
                    self.apply_untracked(mutation)?;
                }
                info!(mutations = batch.mutations.len(), "redid batch");
                self.undo.push_redone(batch);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Group subsequent mutations into one undo step.
    pub fn begin_batch(&mut self) {
        self.undo.begin_batch();
    }

    pub fn end_batch(&mut self) {
        self.undo.end_batch();
    }

    pub fn set_batch_description(&mut self, description: impl Into<String>) {
        self.undo.set_batch_description(description);
    }

    /// Apply without touching history; the undo/redo replay path.
    fn apply_untracked(&mut self, mutation: &Mutation) -> Result<(), EditorError> {
        let effect = mutation.apply(&mut self.post)?;
        self.apply_effect(effect);
        self.version += 1;
        Ok(())
    }

    /// Translate a post edit into render-tree bookkeeping.
    fn apply_effect(&mut self, effect: MutationEffect) {
        match effect {
            MutationEffect::Inserted { parent, .. } => self.mark_dirty_from(parent),
            MutationEffect::Changed { uid } => self.mark_dirty_from(uid),
            MutationEffect::Removed { parent, uid } => {
                if let Some(node) = self.tree.node_for_post(uid) {
                    self.tree.schedule_removal(node);
                }
                self.mark_dirty_from(parent);
            }
        }
    }

    /// Mark the render node of `uid` dirty, falling back to the nearest
    /// rendered ancestor when the node has never been rendered.
    fn mark_dirty_from(&mut self, uid: PostUid) {
        let mut cursor = self.post.resolve(uid);
        while let Some(id) = cursor {
            if let Some(node) = self.tree.node_for_post(self.post.uid(id)) {
                self.tree.mark_dirty(node);
                return;
            }
            cursor = self.post.parent(id);
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkpad_post::SectionSnapshot;

    fn paragraph(text: &str) -> Mutation {
        Mutation::InsertSection {
            index: 0,
            section: SectionSnapshot::Markup {
                uid: None,
                tag: "p".into(),
                children: vec![inkpad_post::InlineSnapshot::Marker {
                    uid: None,
                    text: text.into(),
                    markups: vec![],
                }],
            },
        }
    }

    #[test]
    fn test_apply_bumps_version_and_records_history() {
        let mut editor = Editor::new();
        assert_eq!(editor.version(), 0);

        editor.apply(paragraph("hello")).unwrap();
        assert_eq!(editor.version(), 1);
        assert!(editor.can_undo());
        assert!(!editor.can_redo());
    }

    #[test]
    fn test_rejected_mutation_changes_nothing() {
        let mut editor = Editor::new();
        let result = editor.apply(Mutation::RemoveSection {
            uid: PostUid(42),
        });
        assert!(result.is_err());
        assert_eq!(editor.version(), 0);
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut editor = Editor::new();
        editor.apply(paragraph("hello")).unwrap();
        editor.rerender().unwrap();
        assert_eq!(editor.html(), "<p>hello</p>");

        assert!(editor.undo().unwrap());
        editor.rerender().unwrap();
        assert_eq!(editor.html(), "");
        assert!(editor.can_redo());

        assert!(editor.redo().unwrap());
        editor.rerender().unwrap();
        assert_eq!(editor.html(), "<p>hello</p>");

        // Nothing left to redo.
        assert!(!editor.redo().unwrap());
    }

    #[test]
    fn test_undo_on_empty_history_is_a_noop() {
        let mut editor = Editor::new();
        assert!(!editor.undo().unwrap());
        assert_eq!(editor.version(), 0);
    }
}
