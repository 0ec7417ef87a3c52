//! Render nodes: the bridge between one post node and its current DOM.

use inkpad_common::{Id, LinkedList, ListLinks};
use inkpad_dom::DomNodeId;
use inkpad_post::PostUid;

pub type RenderNodeId = Id<RenderNode>;

/// Kind-specific DOM slots, selected when the node is created.
///
/// A node's kind never changes; the slot ids inside it are filled in by
/// the render pass and replaced whenever that node's DOM is rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderSlots {
    /// The root and markup sections: `element` holds child DOM directly.
    Section,

    /// Markers: `element` is the text node, `markup_element` the outermost
    /// markup wrapper actually sitting in the section element (absent when
    /// the marker carries no markups).
    Marker { markup_element: Option<DomNodeId> },

    /// Atoms: `element` is a wrapper span holding cursor text nodes around
    /// the host-rendered element.
    Atom {
        head_text: Option<DomNodeId>,
        tail_text: Option<DomNodeId>,
        atom_element: Option<DomNodeId>,
    },

    /// Cards: `element` is a wrapper around the host-rendered contents.
    Card { card_element: Option<DomNodeId> },
}

/// The rendered state of exactly one post node.
///
/// The post node is referenced by its stable uid, never owned; `element`
/// is the node's current DOM, registered in the owning tree's index for
/// reverse lookup. Children are ordered by the shared intrusive list, so
/// eviction always runs the tree's `free` hook and destruction cannot be
/// skipped.
#[derive(Debug, PartialEq)]
pub struct RenderNode {
    pub(crate) post: Option<PostUid>,
    pub(crate) parent: Option<RenderNodeId>,
    pub(crate) links: ListLinks<RenderNodeId>,
    pub(crate) children: LinkedList<RenderNodeId>,
    pub(crate) element: Option<DomNodeId>,
    pub(crate) dirty: bool,
    pub(crate) removed: bool,
    pub(crate) slots: RenderSlots,
}

impl RenderNode {
    /// New nodes are born dirty so their first render pass builds them.
    pub(crate) fn new(post: PostUid, slots: RenderSlots) -> Self {
        Self {
            post: Some(post),
            parent: None,
            links: ListLinks::new(),
            children: LinkedList::new(),
            element: None,
            dirty: true,
            removed: false,
            slots,
        }
    }

    pub fn post(&self) -> Option<PostUid> {
        self.post
    }

    pub fn parent(&self) -> Option<RenderNodeId> {
        self.parent
    }

    pub fn element(&self) -> Option<DomNodeId> {
        self.element
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// True iff the node currently has DOM.
    pub fn is_rendered(&self) -> bool {
        self.element.is_some()
    }

    pub fn slots(&self) -> &RenderSlots {
        &self.slots
    }
}
