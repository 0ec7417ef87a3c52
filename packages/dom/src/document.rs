//! # DOM Document
//!
//! A minimal in-memory DOM: element and text nodes in a generational
//! arena, children ordered by the shared intrusive list. This is the
//! render target the render tree keeps in sync with the post model.
//!
//! Structural operations follow browser semantics where it matters to the
//! renderer: appending or inserting a node that is already attached moves
//! it (detach first, then insert), and inserting a node into its own
//! subtree is a hierarchy violation.

use inkpad_common::{Arena, Id, LinkedList, ListError, ListLinks, ListStore};
use thiserror::Error;

pub type DomNodeId = Id<DomNode>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("List error: {0}")]
    List(#[from] ListError),

    #[error("Node is not an element")]
    NotAnElement,

    #[error("Node is not a text node")]
    NotAText,

    #[error("Node cannot be inserted into its own subtree")]
    HierarchyViolation,
}

/// Node payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomData {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text {
        content: String,
    },
}

#[derive(Debug, PartialEq)]
pub struct DomNode {
    parent: Option<DomNodeId>,
    links: ListLinks<DomNodeId>,
    children: LinkedList<DomNodeId>,
    data: DomData,
}

impl DomNode {
    pub fn parent(&self) -> Option<DomNodeId> {
        self.parent
    }

    pub fn data(&self) -> &DomData {
        &self.data
    }
}

/// A document: arena of nodes plus the fixed root element.
#[derive(Debug)]
pub struct DomDocument {
    nodes: Arena<DomNode>,
    root: DomNodeId,
}

impl DomDocument {
    /// Create a document whose root is a `div` element.
    pub fn new() -> Self {
        Self::with_root_tag("div")
    }

    pub fn with_root_tag(tag: impl Into<String>) -> Self {
        let mut nodes = Arena::new();
        let root = nodes.insert(DomNode {
            parent: None,
            links: ListLinks::new(),
            children: LinkedList::new(),
            data: DomData::Element {
                tag: tag.into(),
                attributes: Vec::new(),
            },
        });
        Self { nodes, root }
    }

    pub fn root(&self) -> DomNodeId {
        self.root
    }

    pub fn node(&self, id: DomNodeId) -> Option<&DomNode> {
        self.nodes.get(id)
    }

    /// Number of live nodes, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    // --- node construction -------------------------------------------------

    pub fn create_element(&mut self, tag: impl Into<String>) -> DomNodeId {
        self.nodes.insert(DomNode {
            parent: None,
            links: ListLinks::new(),
            children: LinkedList::new(),
            data: DomData::Element {
                tag: tag.into(),
                attributes: Vec::new(),
            },
        })
    }

    pub fn create_text(&mut self, content: impl Into<String>) -> DomNodeId {
        self.nodes.insert(DomNode {
            parent: None,
            links: ListLinks::new(),
            children: LinkedList::new(),
            data: DomData::Text {
                content: content.into(),
            },
        })
    }

    // --- accessors ----------------------------------------------------------

    pub fn is_element(&self, id: DomNodeId) -> bool {
        matches!(self.nodes[id].data, DomData::Element { .. })
    }

    pub fn is_text(&self, id: DomNodeId) -> bool {
        matches!(self.nodes[id].data, DomData::Text { .. })
    }

    pub fn tag(&self, id: DomNodeId) -> Option<&str> {
        match &self.nodes[id].data {
            DomData::Element { tag, .. } => Some(tag),
            DomData::Text { .. } => None,
        }
    }

    pub fn text(&self, id: DomNodeId) -> Option<&str> {
        match &self.nodes[id].data {
            DomData::Text { content } => Some(content),
            DomData::Element { .. } => None,
        }
    }

    pub fn attribute(&self, id: DomNodeId, name: &str) -> Option<&str> {
        match &self.nodes[id].data {
            DomData::Element { attributes, .. } => attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str()),
            DomData::Text { .. } => None,
        }
    }

    pub fn parent(&self, id: DomNodeId) -> Option<DomNodeId> {
        self.nodes.get(id)?.parent
    }

    pub fn children(&self, parent: DomNodeId) -> impl Iterator<Item = DomNodeId> + '_ {
        self.list_iter(parent)
    }

    pub fn child_count(&self, parent: DomNodeId) -> usize {
        self.list(parent).len()
    }

    pub fn first_child(&self, parent: DomNodeId) -> Option<DomNodeId> {
        self.list(parent).head()
    }

    pub fn next_sibling(&self, id: DomNodeId) -> Option<DomNodeId> {
        self.links(id).next()
    }

    /// True if `node` is `ancestor` or lies in its subtree.
    ///
    /// A stale `node` id (already freed) is simply not contained.
    pub fn contains(&self, ancestor: DomNodeId, node: DomNodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = match self.nodes.get(id) {
                Some(n) => n.parent,
                None => return false,
            };
        }
        false
    }

    // --- mutation -----------------------------------------------------------

    pub fn set_attribute(
        &mut self,
        id: DomNodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), DomError> {
        match &mut self.nodes[id].data {
            DomData::Element { attributes, .. } => {
                let name = name.into();
                let value = value.into();
                if let Some(slot) = attributes.iter_mut().find(|(n, _)| *n == name) {
                    slot.1 = value;
                } else {
                    attributes.push((name, value));
                }
                Ok(())
            }
            DomData::Text { .. } => Err(DomError::NotAnElement),
        }
    }

    /// Replace a text node's content, returning the old content.
    pub fn set_text(
        &mut self,
        id: DomNodeId,
        new_content: impl Into<String>,
    ) -> Result<String, DomError> {
        match &mut self.nodes[id].data {
            DomData::Text { content } => Ok(std::mem::replace(content, new_content.into())),
            DomData::Element { .. } => Err(DomError::NotAText),
        }
    }

    /// Append `child` to `parent`. Moves the child if it is attached.
    pub fn append_child(&mut self, parent: DomNodeId, child: DomNodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` under `parent` before `reference` (tail if `None`).
    /// Moves the child if it is attached elsewhere.
    pub fn insert_before(
        &mut self,
        parent: DomNodeId,
        child: DomNodeId,
        reference: Option<DomNodeId>,
    ) -> Result<(), DomError> {
        if !self.is_element(parent) {
            return Err(DomError::NotAnElement);
        }
        if self.contains(child, parent) {
            return Err(DomError::HierarchyViolation);
        }
        self.detach(child);
        self.list_insert_before(parent, child, reference)?;
        Ok(())
    }

    /// Remove `node` from its parent's child list, keeping the subtree
    /// alive. No-op when the node is already detached.
    pub fn detach(&mut self, node: DomNodeId) {
        if let Some(owner) = self.links(node).owner() {
            // Membership was just checked; the splice cannot fail.
            let _ = self.list_remove(owner, node);
        }
    }

    /// Detach `node` and free it and its whole subtree.
    pub fn remove_subtree(&mut self, node: DomNodeId) {
        self.detach(node);
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            stack.extend(self.list_iter(id));
            self.nodes.remove(id);
        }
    }

    // --- serialization ------------------------------------------------------

    /// Compact markup form of a subtree, for tests and debugging.
    pub fn outer_string(&self, node: DomNodeId) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    /// Markup form of the root's children (the document content).
    pub fn inner_string(&self, node: DomNodeId) -> String {
        let mut out = String::new();
        for child in self.list_iter(node) {
            self.write_node(child, &mut out);
        }
        out
    }

    fn write_node(&self, id: DomNodeId, out: &mut String) {
        match &self.nodes[id].data {
            DomData::Text { content } => out.push_str(&escape_text(content)),
            DomData::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(value));
                    out.push('"');
                }
                out.push('>');
                for child in self.list_iter(id) {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

impl Default for DomDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl ListStore for DomDocument {
    type Id = DomNodeId;

    fn links(&self, item: DomNodeId) -> &ListLinks<DomNodeId> {
        &self.nodes[item].links
    }

    fn links_mut(&mut self, item: DomNodeId) -> &mut ListLinks<DomNodeId> {
        &mut self.nodes[item].links
    }

    fn list(&self, owner: DomNodeId) -> &LinkedList<DomNodeId> {
        &self.nodes[owner].children
    }

    fn list_mut(&mut self, owner: DomNodeId) -> &mut LinkedList<DomNodeId> {
        &mut self.nodes[owner].children
    }

    fn adopt(&mut self, owner: DomNodeId, item: DomNodeId) {
        self.nodes[item].parent = Some(owner);
    }

    fn free(&mut self, _owner: DomNodeId, item: DomNodeId) {
        self.nodes[item].parent = None;
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;")
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
