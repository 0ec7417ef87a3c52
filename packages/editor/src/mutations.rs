//! # Post Mutations
//!
//! High-level semantic operations on the post model.
//!
//! ## Design principles
//!
//! 1. **Intent-preserving**: each mutation represents one semantic edit
//! 2. **Validated**: structural constraints are checked before anything
//!    is modified
//! 3. **Invertible**: every mutation can produce the mutation that
//!    reverts it, computed against the document as it stands
//!
//! Nodes are addressed by their stable [`PostUid`], which survives a
//! remove/undo round trip: a removed section re-inserted from its
//! snapshot keeps its uids, so later mutations and inverses referencing
//! them still resolve.
//!
//! Inserted content travels as snapshots. Before an insert's inverse can
//! be built the snapshot must carry uids; [`Mutation::pin_uids`] reserves
//! them from the post. The editor pins every mutation it records.

use inkpad_post::{
    InlineSnapshot, Markup, Post, PostError, PostKind, PostNodeId, PostUid, SectionSnapshot,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Semantic mutations (intent-preserving operations).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Mutation {
    /// Insert a markup section at a root index.
    InsertSection {
        index: usize,
        section: SectionSnapshot,
    },

    /// Remove a root-level section or card and its whole subtree.
    RemoveSection { uid: PostUid },

    /// Change a markup section's tag (p → h2, …).
    SetSectionTag { uid: PostUid, tag: String },

    /// Insert a marker into a markup section at an index.
    InsertMarker {
        section: PostUid,
        index: usize,
        marker: InlineSnapshot,
    },

    /// Remove a marker or atom from its section.
    RemoveMarker { uid: PostUid },

    /// Replace a marker's text (atomic replacement, not a character diff).
    UpdateMarkerText { uid: PostUid, text: String },

    /// Replace a marker's markups, outermost-first.
    SetMarkerMarkups { uid: PostUid, markups: Vec<Markup> },

    /// Insert a card at a root index.
    InsertCard { index: usize, card: SectionSnapshot },

    /// Insert an atom into a markup section at an index.
    InsertAtom {
        section: PostUid,
        index: usize,
        atom: InlineSnapshot,
    },

    /// Replace an atom's display text.
    UpdateAtomText { uid: PostUid, text: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Node not found: {0}")]
    NodeNotFound(PostUid),

    #[error("Node is not a {0}")]
    WrongKind(&'static str),

    #[error("Index {index} is out of bounds for {len} children")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Payload is not a {0} snapshot")]
    WrongPayload(&'static str),

    #[error("Inserted snapshot has no uid; pin uids before inverting")]
    UnpinnedSnapshot,

    #[error("Post error: {0}")]
    Post(#[from] PostError),
}

/// What a mutation did to the tree, in terms the render layer cares
/// about. The editor translates effects into dirty marks and scheduled
/// removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationEffect {
    /// A new child landed under `parent`.
    Inserted { parent: PostUid, uid: PostUid },

    /// This node changed in place.
    Changed { uid: PostUid },

    /// This node left `parent`'s child list.
    Removed { parent: PostUid, uid: PostUid },
}

impl Mutation {
    /// Validate structural constraints without modifying the document.
    pub fn validate(&self, post: &Post) -> Result<(), MutationError> {
        match self {
            Mutation::InsertSection { index, section } => {
                if !matches!(section, SectionSnapshot::Markup { .. }) {
                    return Err(MutationError::WrongPayload("markup section"));
                }
                check_index(post, post.root(), *index)
            }
            Mutation::InsertCard { index, card } => {
                if !matches!(card, SectionSnapshot::Card { .. }) {
                    return Err(MutationError::WrongPayload("card"));
                }
                check_index(post, post.root(), *index)
            }
            Mutation::RemoveSection { uid } => {
                let id = resolve(post, *uid)?;
                if post.parent(id) != Some(post.root()) {
                    return Err(MutationError::WrongKind("section"));
                }
                Ok(())
            }
            Mutation::SetSectionTag { uid, .. } => {
                require_markup_section(post, *uid).map(|_| ())
            }
            Mutation::InsertMarker { section, index, marker } => {
                if !matches!(marker, InlineSnapshot::Marker { .. }) {
                    return Err(MutationError::WrongPayload("marker"));
                }
                let section = require_markup_section(post, *section)?;
                check_index(post, section, *index)
            }
            Mutation::InsertAtom { section, index, atom } => {
                if !matches!(atom, InlineSnapshot::Atom { .. }) {
                    return Err(MutationError::WrongPayload("atom"));
                }
                let section = require_markup_section(post, *section)?;
                check_index(post, section, *index)
            }
            Mutation::RemoveMarker { uid } => require_inline(post, *uid).map(|_| ()),
            Mutation::UpdateMarkerText { uid, .. } | Mutation::SetMarkerMarkups { uid, .. } => {
                require_marker(post, *uid).map(|_| ())
            }
            Mutation::UpdateAtomText { uid, .. } => require_atom(post, *uid).map(|_| ()),
        }
    }

    /// Reserve uids for any inserted snapshot that lacks them, so
    /// [`Mutation::to_inverse`] can reference the nodes before they
    /// exist.
    pub fn pin_uids(&mut self, post: &mut Post) {
        match self {
            Mutation::InsertSection { section, .. } | Mutation::InsertCard { card: section, .. } => {
                pin_section(section, post)
            }
            Mutation::InsertMarker { marker: inline, .. }
            | Mutation::InsertAtom { atom: inline, .. } => pin_inline(inline, post),
            _ => {}
        }
    }

    /// Apply to the post, validating first. Returns the effect the
    /// editor uses to mark render nodes dirty.
    pub fn apply(&self, post: &mut Post) -> Result<MutationEffect, MutationError> {
        self.validate(post)?;

        match self {
            Mutation::InsertSection { index, section }
            | Mutation::InsertCard { index, card: section } => {
                let id = post.restore_section(section)?;
                let root = post.root();
                post.insert_child_at(root, id, *index)?;
                Ok(MutationEffect::Inserted {
                    parent: post.uid(root),
                    uid: post.uid(id),
                })
            }
            Mutation::RemoveSection { uid } | Mutation::RemoveMarker { uid } => {
                let id = resolve(post, *uid)?;
                let parent = post.parent(id).ok_or(PostError::Detached)?;
                let parent_uid = post.uid(parent);
                post.remove(id)?;
                Ok(MutationEffect::Removed {
                    parent: parent_uid,
                    uid: *uid,
                })
            }
            Mutation::SetSectionTag { uid, tag } => {
                let id = resolve(post, *uid)?;
                post.set_section_tag(id, tag.clone())?;
                Ok(MutationEffect::Changed { uid: *uid })
            }
            Mutation::InsertMarker { section, index, marker: inline }
            | Mutation::InsertAtom { section, index, atom: inline } => {
                let section_id = resolve(post, *section)?;
                let id = post.restore_inline(inline)?;
                post.insert_child_at(section_id, id, *index)?;
                Ok(MutationEffect::Inserted {
                    parent: *section,
                    uid: post.uid(id),
                })
            }
            Mutation::UpdateMarkerText { uid, text } => {
                let id = resolve(post, *uid)?;
                post.set_marker_text(id, text.clone())?;
                Ok(MutationEffect::Changed { uid: *uid })
            }
            Mutation::SetMarkerMarkups { uid, markups } => {
                let id = resolve(post, *uid)?;
                post.set_marker_markups(id, markups.clone())?;
                Ok(MutationEffect::Changed { uid: *uid })
            }
            Mutation::UpdateAtomText { uid, text } => {
                let id = resolve(post, *uid)?;
                post.set_atom_text(id, text.clone())?;
                Ok(MutationEffect::Changed { uid: *uid })
            }
        }
    }

    /// Build the mutation that reverts this one, against the document as
    /// it stands (before this mutation is applied).
    pub fn to_inverse(&self, post: &Post) -> Result<Mutation, MutationError> {
        match self {
            Mutation::InsertSection { section, .. } => Ok(Mutation::RemoveSection {
                uid: section_uid(section)?,
            }),
            Mutation::InsertCard { card, .. } => Ok(Mutation::RemoveSection {
                uid: section_uid(card)?,
            }),
            Mutation::RemoveSection { uid } => {
                let id = resolve(post, *uid)?;
                let index = post.index_of(id).ok_or(PostError::Detached)?;
                let section = post.snapshot_section(id);
                Ok(match &section {
                    SectionSnapshot::Markup { .. } => Mutation::InsertSection { index, section },
                    SectionSnapshot::Card { .. } => Mutation::InsertCard {
                        index,
                        card: section,
                    },
                })
            }
            Mutation::SetSectionTag { uid, .. } => {
                let id = require_markup_section(post, *uid)?;
                match post.kind(id) {
                    PostKind::MarkupSection { tag } => Ok(Mutation::SetSectionTag {
                        uid: *uid,
                        tag: tag.clone(),
                    }),
                    _ => Err(MutationError::WrongKind("markup section")),
                }
            }
            Mutation::InsertMarker { marker, .. } => Ok(Mutation::RemoveMarker {
                uid: inline_uid(marker)?,
            }),
            Mutation::InsertAtom { atom, .. } => Ok(Mutation::RemoveMarker {
                uid: inline_uid(atom)?,
            }),
            Mutation::RemoveMarker { uid } => {
                let id = require_inline(post, *uid)?;
                let parent = post.parent(id).ok_or(PostError::Detached)?;
                let index = post.index_of(id).ok_or(PostError::Detached)?;
                let inline = post.snapshot_inline(id);
                let section = post.uid(parent);
                Ok(match &inline {
                    InlineSnapshot::Marker { .. } => Mutation::InsertMarker {
                        section,
                        index,
                        marker: inline,
                    },
                    InlineSnapshot::Atom { .. } => Mutation::InsertAtom {
                        section,
                        index,
                        atom: inline,
                    },
                })
            }
            Mutation::UpdateMarkerText { uid, .. } => {
                let id = require_marker(post, *uid)?;
                match post.kind(id) {
                    PostKind::Marker { text, .. } => Ok(Mutation::UpdateMarkerText {
                        uid: *uid,
                        text: text.clone(),
                    }),
                    _ => Err(MutationError::WrongKind("marker")),
                }
            }
            Mutation::SetMarkerMarkups { uid, .. } => {
                let id = require_marker(post, *uid)?;
                match post.kind(id) {
                    PostKind::Marker { markups, .. } => Ok(Mutation::SetMarkerMarkups {
                        uid: *uid,
                        markups: markups.clone(),
                    }),
                    _ => Err(MutationError::WrongKind("marker")),
                }
            }
            Mutation::UpdateAtomText { uid, .. } => {
                let id = require_atom(post, *uid)?;
                match post.kind(id) {
                    PostKind::Atom { text, .. } => Ok(Mutation::UpdateAtomText {
                        uid: *uid,
                        text: text.clone(),
                    }),
                    _ => Err(MutationError::WrongKind("atom")),
                }
            }
        }
    }
}

fn resolve(post: &Post, uid: PostUid) -> Result<PostNodeId, MutationError> {
    post.resolve(uid).ok_or(MutationError::NodeNotFound(uid))
}

fn require_markup_section(post: &Post, uid: PostUid) -> Result<PostNodeId, MutationError> {
    let id = resolve(post, uid)?;
    match post.kind(id) {
        PostKind::MarkupSection { .. } => Ok(id),
        _ => Err(MutationError::WrongKind("markup section")),
    }
}

fn require_marker(post: &Post, uid: PostUid) -> Result<PostNodeId, MutationError> {
    let id = resolve(post, uid)?;
    match post.kind(id) {
        PostKind::Marker { .. } => Ok(id),
        _ => Err(MutationError::WrongKind("marker")),
    }
}

fn require_atom(post: &Post, uid: PostUid) -> Result<PostNodeId, MutationError> {
    let id = resolve(post, uid)?;
    match post.kind(id) {
        PostKind::Atom { .. } => Ok(id),
        _ => Err(MutationError::WrongKind("atom")),
    }
}

fn require_inline(post: &Post, uid: PostUid) -> Result<PostNodeId, MutationError> {
    let id = resolve(post, uid)?;
    match post.kind(id) {
        PostKind::Marker { .. } | PostKind::Atom { .. } => Ok(id),
        _ => Err(MutationError::WrongKind("marker or atom")),
    }
}

fn check_index(post: &Post, parent: PostNodeId, index: usize) -> Result<(), MutationError> {
    let len = post.child_count(parent);
    if index > len {
        return Err(MutationError::IndexOutOfBounds { index, len });
    }
    Ok(())
}

fn section_uid(section: &SectionSnapshot) -> Result<PostUid, MutationError> {
    match section {
        SectionSnapshot::Markup { uid, .. } | SectionSnapshot::Card { uid, .. } => {
            uid.ok_or(MutationError::UnpinnedSnapshot)
        }
    }
}

fn inline_uid(inline: &InlineSnapshot) -> Result<PostUid, MutationError> {
    match inline {
        InlineSnapshot::Marker { uid, .. } | InlineSnapshot::Atom { uid, .. } => {
            uid.ok_or(MutationError::UnpinnedSnapshot)
        }
    }
}

fn pin_section(section: &mut SectionSnapshot, post: &mut Post) {
    match section {
        SectionSnapshot::Markup { uid, children, .. } => {
            if uid.is_none() {
                *uid = Some(post.reserve_uid());
            }
            for child in children {
                pin_inline(child, post);
            }
        }
        SectionSnapshot::Card { uid, .. } => {
            if uid.is_none() {
                *uid = Some(post.reserve_uid());
            }
        }
    }
}

fn pin_inline(inline: &mut InlineSnapshot, post: &mut Post) {
    match inline {
        InlineSnapshot::Marker { uid, .. } | InlineSnapshot::Atom { uid, .. } => {
            if uid.is_none() {
                *uid = Some(post.reserve_uid());
            }
        }
    }
}
