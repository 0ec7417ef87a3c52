//! The render tree: owns every render node and the DOM→render-node index.
//!
//! [`RenderTree::set_element`] is the single writer of the index: changing
//! a node's element atomically deregisters the old mapping and registers
//! the new one, so the index can never hold a stale entry. Eviction goes
//! through [`ListStore::list_remove`], whose `free` hook tears the node
//! down (children first, one list at a time) and drops it from both
//! indexes.

use std::collections::HashMap;

use inkpad_common::{Arena, LinkedList, ListError, ListLinks, ListStore};
use inkpad_dom::{DomDocument, DomError, DomNodeId};
use inkpad_post::PostUid;
use thiserror::Error;

use crate::node::{RenderNode, RenderNodeId, RenderSlots};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("List error: {0}")]
    List(#[from] ListError),

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("Render node has no element")]
    NotRendered,

    #[error("Render node refers to a missing post node")]
    MissingPostNode,
}

/// All render nodes of one editor instance, plus the element index.
///
/// The tree's lifetime is the editor instance's lifetime; dropping the
/// tree discards the index with it.
#[derive(Debug)]
pub struct RenderTree {
    nodes: Arena<RenderNode>,
    root: RenderNodeId,
    root_element: DomNodeId,
    by_element: HashMap<DomNodeId, RenderNodeId>,
    by_post: HashMap<PostUid, RenderNodeId>,
}

impl RenderTree {
    /// Create a tree whose root render node represents `root_post` and is
    /// already bound to `root_element`. The root is born dirty, so the
    /// first render pass builds the whole document.
    pub fn new(root_post: PostUid, root_element: DomNodeId) -> Self {
        let mut nodes = Arena::new();
        let root = nodes.insert(RenderNode::new(root_post, RenderSlots::Section));
        let mut tree = Self {
            nodes,
            root,
            root_element,
            by_element: HashMap::new(),
            by_post: HashMap::new(),
        };
        tree.by_post.insert(root_post, root);
        tree.set_element(root, Some(root_element));
        tree
    }

    pub fn root(&self) -> RenderNodeId {
        self.root
    }

    pub fn root_element(&self) -> DomNodeId {
        self.root_element
    }

    pub fn node(&self, id: RenderNodeId) -> Option<&RenderNode> {
        self.nodes.get(id)
    }

    /// Number of live render nodes, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Allocate a detached render node for a post node (born dirty).
    pub fn create_node(&mut self, post: PostUid, slots: RenderSlots) -> RenderNodeId {
        let id = self.nodes.insert(RenderNode::new(post, slots));
        self.by_post.insert(post, id);
        id
    }

    // --- lookups ------------------------------------------------------------

    /// Reverse lookup: which render node owns this DOM node?
    pub fn node_for_dom(&self, element: DomNodeId) -> Option<RenderNodeId> {
        self.by_element.get(&element).copied()
    }

    /// Which render node represents this post node, if it has one?
    pub fn node_for_post(&self, uid: PostUid) -> Option<RenderNodeId> {
        self.by_post.get(&uid).copied()
    }

    pub fn post_uid(&self, node: RenderNodeId) -> Option<PostUid> {
        self.nodes.get(node).and_then(|n| n.post)
    }

    pub fn element(&self, node: RenderNodeId) -> Option<DomNodeId> {
        self.nodes.get(node).and_then(|n| n.element)
    }

    pub fn parent(&self, node: RenderNodeId) -> Option<RenderNodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    pub fn slots(&self, node: RenderNodeId) -> &RenderSlots {
        &self.nodes[node].slots
    }

    pub(crate) fn set_slots(&mut self, node: RenderNodeId, slots: RenderSlots) {
        self.nodes[node].slots = slots;
    }

    pub fn is_dirty(&self, node: RenderNodeId) -> bool {
        self.nodes.get(node).is_some_and(|n| n.dirty)
    }

    pub fn is_removed(&self, node: RenderNodeId) -> bool {
        self.nodes.get(node).is_some_and(|n| n.removed)
    }

    pub fn is_rendered(&self, node: RenderNodeId) -> bool {
        self.nodes.get(node).is_some_and(|n| n.element.is_some())
    }

    pub fn children(&self, node: RenderNodeId) -> impl Iterator<Item = RenderNodeId> + '_ {
        self.list_iter(node)
    }

    pub fn child_count(&self, node: RenderNodeId) -> usize {
        self.list(node).len()
    }

    pub fn first_child(&self, node: RenderNodeId) -> Option<RenderNodeId> {
        self.list(node).head()
    }

    pub fn next_sibling(&self, node: RenderNodeId) -> Option<RenderNodeId> {
        self.links(node).next()
    }

    // --- dirty tracking -----------------------------------------------------

    /// Mark `node` and every ancestor up to the root dirty. Idempotent:
    /// after any sequence of calls the dirty set is exactly the union of
    /// each marked node's root path.
    pub fn mark_dirty(&mut self, node: RenderNodeId) {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            let n = &mut self.nodes[id];
            n.dirty = true;
            cursor = n.parent;
        }
    }

    /// Clear the dirty flag on `node` only. The render pass calls this
    /// after the node's own DOM has been confirmed; it never propagates.
    pub fn mark_clean(&mut self, node: RenderNodeId) {
        self.nodes[node].dirty = false;
    }

    /// Flag `node` for eviction and mark its parent dirty, so the next
    /// render pass revisits the parent's child list and removes the
    /// node's DOM. Nothing is destroyed synchronously; DOM mutation stays
    /// inside the render pass.
    pub fn schedule_removal(&mut self, node: RenderNodeId) {
        self.nodes[node].removed = true;
        if let Some(parent) = self.nodes[node].parent {
            self.mark_dirty(parent);
        }
    }

    // --- element binding ----------------------------------------------------

    /// Bind `node` to a DOM node, or unbind it with `None`. The single
    /// integration point between the render tree and the DOM: the old
    /// element is deregistered from the index and the new one registered
    /// in the same step.
    pub fn set_element(&mut self, node: RenderNodeId, element: Option<DomNodeId>) {
        let old = self.nodes[node].element;
        if old == element {
            return;
        }
        if let Some(old) = old {
            if self.by_element.get(&old) == Some(&node) {
                self.by_element.remove(&old);
            }
        }
        self.nodes[node].element = element;
        if let Some(new) = element {
            self.by_element.insert(new, node);
        }
    }

    /// Whether the node's element is still a descendant of (or equal to)
    /// the tree's root DOM element. Errors if the node has no element.
    ///
    /// Detects nodes detached by DOM mutation done behind the tree's back
    /// (undo/redo, cut); the render pass answers by re-rendering or
    /// discarding, not this method.
    pub fn is_attached(&self, node: RenderNodeId, dom: &DomDocument) -> Result<bool, RenderError> {
        let element = self.nodes[node].element.ok_or(RenderError::NotRendered)?;
        Ok(dom.contains(self.root_element, element))
    }

    /// Policy hook: must a mutation of `dom_node` re-derive the owning
    /// post node from raw DOM? Cards manage their own DOM, so mutations
    /// inside a card's element never trigger a reparse.
    pub fn reparses_mutation_of_child_node(
        &self,
        node: RenderNodeId,
        dom_node: DomNodeId,
        dom: &DomDocument,
    ) -> bool {
        match self.nodes[node].slots {
            RenderSlots::Card { .. } => match self.nodes[node].element {
                Some(owned) => !dom.contains(owned, dom_node),
                None => true,
            },
            _ => true,
        }
    }
}

impl ListStore for RenderTree {
    type Id = RenderNodeId;

    fn links(&self, item: RenderNodeId) -> &ListLinks<RenderNodeId> {
        &self.nodes[item].links
    }

    fn links_mut(&mut self, item: RenderNodeId) -> &mut ListLinks<RenderNodeId> {
        &mut self.nodes[item].links
    }

    fn list(&self, owner: RenderNodeId) -> &LinkedList<RenderNodeId> {
        &self.nodes[owner].children
    }

    fn list_mut(&mut self, owner: RenderNodeId) -> &mut LinkedList<RenderNodeId> {
        &mut self.nodes[owner].children
    }

    fn adopt(&mut self, owner: RenderNodeId, item: RenderNodeId) {
        self.nodes[item].parent = Some(owner);
    }

    /// Eviction is destruction. The evicted node's own child list is
    /// drained first (each removal re-entering this hook), then the node
    /// releases its element registration, parent and post references, and
    /// leaves the arena. Destruction never reaches past the one list each
    /// call manages.
    fn free(&mut self, _owner: RenderNodeId, item: RenderNodeId) {
        while let Some(child) = self.list(item).head() {
            // Membership is by construction; the splice cannot fail.
            let _ = self.list_remove(item, child);
        }
        self.set_element(item, None);
        let node = &mut self.nodes[item];
        node.parent = None;
        if let Some(uid) = node.post.take() {
            if self.by_post.get(&uid) == Some(&item) {
                self.by_post.remove(&uid);
            }
        }
        self.nodes.remove(item);
    }
}
