//! # Post Model
//!
//! The abstract, DOM-independent document structure: a root node owning an
//! ordered list of sections, where markup sections own ordered runs of
//! markers and atoms. The render tree consumes this model; it never owns
//! it.
//!
//! Nodes live in a generational arena and are ordered by the shared
//! intrusive list machinery. Arena ids are positional and go stale on
//! removal, so every node also carries a stable [`PostUid`]: the address
//! mutations and snapshots use, and the one that survives a
//! remove/undo/redo round trip.

use std::collections::HashMap;
use std::fmt;

use inkpad_common::{Arena, Id, LinkedList, ListError, ListLinks, ListStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::Markup;

pub type PostNodeId = Id<PostNode>;

/// Stable node address, unique for the lifetime of a [`Post`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PostUid(pub u64);

impl fmt::Display for PostUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Default tag for new markup sections.
pub const DEFAULT_SECTION_TAG: &str = "p";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PostError {
    #[error("List error: {0}")]
    List(#[from] ListError),

    #[error("A {child} cannot be placed inside a {parent}")]
    InvalidChild {
        parent: &'static str,
        child: &'static str,
    },

    #[error("Node is not attached to the document")]
    Detached,

    #[error("Node is not a {expected}")]
    WrongKind { expected: &'static str },

    #[error("Uid {0} is already taken")]
    DuplicateUid(PostUid),
}

/// Node payload, selected at construction.
#[derive(Debug, Clone, PartialEq)]
pub enum PostKind {
    /// The document root; its children are sections.
    Root,

    /// Block of rich text (p, h1–h6, blockquote, …) owning markers/atoms.
    MarkupSection { tag: String },

    /// A run of text with uniform inline markups.
    Marker { text: String, markups: Vec<Markup> },

    /// Opaque block-level embed rendered by a registered host.
    Card { name: String, payload: Value },

    /// Opaque inline embed with display text, rendered by a host.
    Atom {
        name: String,
        text: String,
        payload: Value,
    },
}

impl PostKind {
    pub fn name(&self) -> &'static str {
        match self {
            PostKind::Root => "root",
            PostKind::MarkupSection { .. } => "markup section",
            PostKind::Marker { .. } => "marker",
            PostKind::Card { .. } => "card",
            PostKind::Atom { .. } => "atom",
        }
    }

    /// True if `child` may be inserted under `self`.
    fn accepts(&self, child: &PostKind) -> bool {
        match self {
            PostKind::Root => matches!(
                child,
                PostKind::MarkupSection { .. } | PostKind::Card { .. }
            ),
            PostKind::MarkupSection { .. } => {
                matches!(child, PostKind::Marker { .. } | PostKind::Atom { .. })
            }
            _ => false,
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct PostNode {
    uid: PostUid,
    parent: Option<PostNodeId>,
    links: ListLinks<PostNodeId>,
    children: LinkedList<PostNodeId>,
    kind: PostKind,
}

impl PostNode {
    pub fn uid(&self) -> PostUid {
        self.uid
    }

    pub fn parent(&self) -> Option<PostNodeId> {
        self.parent
    }

    pub fn kind(&self) -> &PostKind {
        &self.kind
    }
}

/// The document: an arena of nodes plus the uid index.
#[derive(Debug)]
pub struct Post {
    nodes: Arena<PostNode>,
    by_uid: HashMap<PostUid, PostNodeId>,
    root: PostNodeId,
    next_uid: u64,
}

impl Post {
    pub fn new() -> Self {
        let mut nodes = Arena::new();
        let root = nodes.insert(PostNode {
            uid: PostUid(0),
            parent: None,
            links: ListLinks::new(),
            children: LinkedList::new(),
            kind: PostKind::Root,
        });
        let mut by_uid = HashMap::new();
        by_uid.insert(PostUid(0), root);
        Self {
            nodes,
            by_uid,
            root,
            next_uid: 1,
        }
    }

    pub fn root(&self) -> PostNodeId {
        self.root
    }

    pub fn node(&self, id: PostNodeId) -> Option<&PostNode> {
        self.nodes.get(id)
    }

    pub fn kind(&self, id: PostNodeId) -> &PostKind {
        &self.nodes[id].kind
    }

    pub fn uid(&self, id: PostNodeId) -> PostUid {
        self.nodes[id].uid
    }

    pub fn parent(&self, id: PostNodeId) -> Option<PostNodeId> {
        self.nodes[id].parent
    }

    /// Resolve a stable address to the live node, if it still exists.
    pub fn resolve(&self, uid: PostUid) -> Option<PostNodeId> {
        self.by_uid.get(&uid).copied()
    }

    /// Number of live nodes, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        // The root always exists.
        self.nodes.len() <= 1
    }

    // --- node construction -------------------------------------------------

    fn fresh_uid(&mut self) -> PostUid {
        let uid = PostUid(self.next_uid);
        self.next_uid += 1;
        uid
    }

    /// Reserve a uid without creating a node. Lets a caller name a node
    /// before it exists, e.g. to build the inverse of an insertion ahead
    /// of applying it.
    pub fn reserve_uid(&mut self) -> PostUid {
        self.fresh_uid()
    }

    fn alloc(&mut self, uid: PostUid, kind: PostKind) -> PostNodeId {
        let id = self.nodes.insert(PostNode {
            uid,
            parent: None,
            links: ListLinks::new(),
            children: LinkedList::new(),
            kind,
        });
        self.by_uid.insert(uid, id);
        id
    }

    /// Create a detached markup section.
    pub fn create_markup_section(&mut self, tag: impl Into<String>) -> PostNodeId {
        let uid = self.fresh_uid();
        self.alloc(uid, PostKind::MarkupSection { tag: tag.into() })
    }

    /// Create a detached marker.
    pub fn create_marker(&mut self, text: impl Into<String>, markups: Vec<Markup>) -> PostNodeId {
        let uid = self.fresh_uid();
        self.alloc(
            uid,
            PostKind::Marker {
                text: text.into(),
                markups,
            },
        )
    }

    /// Create a detached card.
    pub fn create_card(&mut self, name: impl Into<String>, payload: Value) -> PostNodeId {
        let uid = self.fresh_uid();
        self.alloc(
            uid,
            PostKind::Card {
                name: name.into(),
                payload,
            },
        )
    }

    /// Create a detached atom.
    pub fn create_atom(
        &mut self,
        name: impl Into<String>,
        text: impl Into<String>,
        payload: Value,
    ) -> PostNodeId {
        let uid = self.fresh_uid();
        self.alloc(
            uid,
            PostKind::Atom {
                name: name.into(),
                text: text.into(),
                payload,
            },
        )
    }

    /// Create a detached node restoring a specific uid (snapshot replay).
    pub(crate) fn create_with_uid(
        &mut self,
        uid: Option<PostUid>,
        kind: PostKind,
    ) -> Result<PostNodeId, PostError> {
        let uid = match uid {
            Some(uid) => {
                if self.by_uid.contains_key(&uid) {
                    return Err(PostError::DuplicateUid(uid));
                }
                self.next_uid = self.next_uid.max(uid.0 + 1);
                uid
            }
            None => self.fresh_uid(),
        };
        Ok(self.alloc(uid, kind))
    }

    // --- tree structure ----------------------------------------------------

    /// Append `child` to `parent`'s child list.
    pub fn append_child(&mut self, parent: PostNodeId, child: PostNodeId) -> Result<(), PostError> {
        self.insert_child_before(parent, child, None)
    }

    /// Insert `child` under `parent`, before `reference` (tail if `None`).
    pub fn insert_child_before(
        &mut self,
        parent: PostNodeId,
        child: PostNodeId,
        reference: Option<PostNodeId>,
    ) -> Result<(), PostError> {
        let parent_kind = &self.nodes[parent].kind;
        let child_kind = &self.nodes[child].kind;
        if !parent_kind.accepts(child_kind) {
            return Err(PostError::InvalidChild {
                parent: parent_kind.name(),
                child: child_kind.name(),
            });
        }
        self.list_insert_before(parent, child, reference)?;
        Ok(())
    }

    /// Insert `child` under `parent` at `index` (clamped to the list tail).
    pub fn insert_child_at(
        &mut self,
        parent: PostNodeId,
        child: PostNodeId,
        index: usize,
    ) -> Result<(), PostError> {
        let reference = self.list_iter(parent).nth(index);
        self.insert_child_before(parent, child, reference)
    }

    /// Detach `node` from its parent and drop it and its whole subtree.
    pub fn remove(&mut self, node: PostNodeId) -> Result<(), PostError> {
        let owner = self.nodes[node].links.owner().ok_or(PostError::Detached)?;
        self.list_remove(owner, node)?;
        self.drop_subtree(node);
        Ok(())
    }

    fn drop_subtree(&mut self, node: PostNodeId) {
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            stack.extend(self.list_iter(id));
            if let Some(dropped) = self.nodes.remove(id) {
                self.by_uid.remove(&dropped.uid);
            }
        }
    }

    /// Child ids of `parent` in document order.
    pub fn children(&self, parent: PostNodeId) -> impl Iterator<Item = PostNodeId> + '_ {
        self.list_iter(parent)
    }

    pub fn child_count(&self, parent: PostNodeId) -> usize {
        self.list(parent).len()
    }

    /// Position of `node` within its parent's child list.
    pub fn index_of(&self, node: PostNodeId) -> Option<usize> {
        let owner = self.nodes[node].links.owner()?;
        self.list_iter(owner).position(|id| id == node)
    }

    // --- kind-specific edits -----------------------------------------------

    pub fn set_section_tag(
        &mut self,
        id: PostNodeId,
        new_tag: impl Into<String>,
    ) -> Result<String, PostError> {
        match &mut self.nodes[id].kind {
            PostKind::MarkupSection { tag } => Ok(std::mem::replace(tag, new_tag.into())),
            _ => Err(PostError::WrongKind {
                expected: "markup section",
            }),
        }
    }

    pub fn set_marker_text(
        &mut self,
        id: PostNodeId,
        new_text: impl Into<String>,
    ) -> Result<String, PostError> {
        match &mut self.nodes[id].kind {
            PostKind::Marker { text, .. } => Ok(std::mem::replace(text, new_text.into())),
            _ => Err(PostError::WrongKind { expected: "marker" }),
        }
    }

    pub fn set_marker_markups(
        &mut self,
        id: PostNodeId,
        new_markups: Vec<Markup>,
    ) -> Result<Vec<Markup>, PostError> {
        match &mut self.nodes[id].kind {
            PostKind::Marker { markups, .. } => Ok(std::mem::replace(markups, new_markups)),
            _ => Err(PostError::WrongKind { expected: "marker" }),
        }
    }

    pub fn set_atom_text(
        &mut self,
        id: PostNodeId,
        new_text: impl Into<String>,
    ) -> Result<String, PostError> {
        match &mut self.nodes[id].kind {
            PostKind::Atom { text, .. } => Ok(std::mem::replace(text, new_text.into())),
            _ => Err(PostError::WrongKind { expected: "atom" }),
        }
    }

    /// Concatenated display text of a section's markers and atoms.
    pub fn section_text(&self, section: PostNodeId) -> String {
        let mut out = String::new();
        for child in self.list_iter(section) {
            match &self.nodes[child].kind {
                PostKind::Marker { text, .. } | PostKind::Atom { text, .. } => out.push_str(text),
                _ => {}
            }
        }
        out
    }
}

impl Default for Post {
    fn default() -> Self {
        Self::new()
    }
}

impl ListStore for Post {
    type Id = PostNodeId;

    fn links(&self, item: PostNodeId) -> &ListLinks<PostNodeId> {
        &self.nodes[item].links
    }

    fn links_mut(&mut self, item: PostNodeId) -> &mut ListLinks<PostNodeId> {
        &mut self.nodes[item].links
    }

    fn list(&self, owner: PostNodeId) -> &LinkedList<PostNodeId> {
        &self.nodes[owner].children
    }

    fn list_mut(&mut self, owner: PostNodeId) -> &mut LinkedList<PostNodeId> {
        &mut self.nodes[owner].children
    }

    fn adopt(&mut self, owner: PostNodeId, item: PostNodeId) {
        self.nodes[item].parent = Some(owner);
    }

    fn free(&mut self, _owner: PostNodeId, item: PostNodeId) {
        self.nodes[item].parent = None;
    }
}
