//! Serializable document snapshots.
//!
//! A snapshot is plain data: no arena ids, no sibling pointers. It is the
//! form a document takes in fixtures, on the wire between tests, and in
//! the undo stack (removed subtrees are snapshotted so their inverse
//! insert can rebuild them, uids included).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::post::{Post, PostError, PostKind, PostNodeId, PostUid};
use crate::Markup;
use inkpad_common::ListStore;

/// Whole-document snapshot: the root's sections in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSnapshot {
    pub sections: Vec<SectionSnapshot>,
}

/// One root-level child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SectionSnapshot {
    Markup {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uid: Option<PostUid>,
        tag: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<InlineSnapshot>,
    },
    Card {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uid: Option<PostUid>,
        name: String,
        payload: Value,
    },
}

/// One child of a markup section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InlineSnapshot {
    Marker {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uid: Option<PostUid>,
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        markups: Vec<Markup>,
    },
    Atom {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uid: Option<PostUid>,
        name: String,
        text: String,
        payload: Value,
    },
}

impl Post {
    /// Build a document from a snapshot.
    pub fn from_snapshot(snapshot: &PostSnapshot) -> Result<Self, PostError> {
        let mut post = Post::new();
        for section in &snapshot.sections {
            let id = post.restore_section(section)?;
            let root = post.root();
            post.append_child(root, id)?;
        }
        Ok(post)
    }

    /// Snapshot the whole document.
    pub fn snapshot(&self) -> PostSnapshot {
        PostSnapshot {
            sections: self
                .list_iter(self.root())
                .map(|id| self.snapshot_section(id))
                .collect(),
        }
    }

    /// Snapshot one root-level child (markup section or card).
    ///
    /// The caller must pass a root-level node; anything else is a
    /// programming error and panics via the arena kind match.
    pub fn snapshot_section(&self, id: PostNodeId) -> SectionSnapshot {
        match self.kind(id) {
            PostKind::MarkupSection { tag } => SectionSnapshot::Markup {
                uid: Some(self.uid(id)),
                tag: tag.clone(),
                children: self
                    .list_iter(id)
                    .map(|child| self.snapshot_inline(child))
                    .collect(),
            },
            PostKind::Card { name, payload } => SectionSnapshot::Card {
                uid: Some(self.uid(id)),
                name: name.clone(),
                payload: payload.clone(),
            },
            other => panic!("not a section: {}", other.name()),
        }
    }

    /// Snapshot one child of a markup section (marker or atom).
    pub fn snapshot_inline(&self, id: PostNodeId) -> InlineSnapshot {
        match self.kind(id) {
            PostKind::Marker { text, markups } => InlineSnapshot::Marker {
                uid: Some(self.uid(id)),
                text: text.clone(),
                markups: markups.clone(),
            },
            PostKind::Atom {
                name,
                text,
                payload,
            } => InlineSnapshot::Atom {
                uid: Some(self.uid(id)),
                name: name.clone(),
                text: text.clone(),
                payload: payload.clone(),
            },
            other => panic!("not an inline node: {}", other.name()),
        }
    }

    /// Rebuild a detached section subtree from a snapshot.
    pub fn restore_section(&mut self, snapshot: &SectionSnapshot) -> Result<PostNodeId, PostError> {
        match snapshot {
            SectionSnapshot::Markup { uid, tag, children } => {
                let section =
                    self.create_with_uid(*uid, PostKind::MarkupSection { tag: tag.clone() })?;
                for child in children {
                    let inline = self.restore_inline(child)?;
                    self.append_child(section, inline)?;
                }
                Ok(section)
            }
            SectionSnapshot::Card { uid, name, payload } => self.create_with_uid(
                *uid,
                PostKind::Card {
                    name: name.clone(),
                    payload: payload.clone(),
                },
            ),
        }
    }

    /// Rebuild a detached marker/atom from a snapshot.
    pub fn restore_inline(&mut self, snapshot: &InlineSnapshot) -> Result<PostNodeId, PostError> {
        match snapshot {
            InlineSnapshot::Marker { uid, text, markups } => self.create_with_uid(
                *uid,
                PostKind::Marker {
                    text: text.clone(),
                    markups: markups.clone(),
                },
            ),
            InlineSnapshot::Atom {
                uid,
                name,
                text,
                payload,
            } => self.create_with_uid(
                *uid,
                PostKind::Atom {
                    name: name.clone(),
                    text: text.clone(),
                    payload: payload.clone(),
                },
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::anchor;
    use serde_json::json;

    fn sample() -> PostSnapshot {
        PostSnapshot {
            sections: vec![
                SectionSnapshot::Markup {
                    uid: None,
                    tag: "h1".into(),
                    children: vec![InlineSnapshot::Marker {
                        uid: None,
                        text: "Title".into(),
                        markups: vec![],
                    }],
                },
                SectionSnapshot::Markup {
                    uid: None,
                    tag: "p".into(),
                    children: vec![
                        InlineSnapshot::Marker {
                            uid: None,
                            text: "Read ".into(),
                            markups: vec![],
                        },
                        InlineSnapshot::Marker {
                            uid: None,
                            text: "this".into(),
                            markups: vec![anchor("https://example.com")],
                        },
                        InlineSnapshot::Atom {
                            uid: None,
                            name: "mention".into(),
                            text: "@sam".into(),
                            payload: json!({ "user": 42 }),
                        },
                    ],
                },
                SectionSnapshot::Card {
                    uid: None,
                    name: "divider".into(),
                    payload: json!({}),
                },
            ],
        }
    }

    #[test]
    fn test_snapshot_round_trip() {
        let post = Post::from_snapshot(&sample()).unwrap();
        let first = post.snapshot();
        // Snapshotting a restored document reproduces the structure; the
        // second pass must be byte-stable since uids are now pinned.
        let rebuilt = Post::from_snapshot(&first).unwrap();
        assert_eq!(rebuilt.snapshot(), first);
    }

    #[test]
    fn test_restore_assigns_uids() {
        let post = Post::from_snapshot(&sample()).unwrap();
        let snapshot = post.snapshot();
        for section in &snapshot.sections {
            match section {
                SectionSnapshot::Markup { uid, .. } | SectionSnapshot::Card { uid, .. } => {
                    assert!(uid.is_some());
                }
            }
        }
    }

    #[test]
    fn test_duplicate_uid_rejected() {
        let mut post = Post::new();
        let section = post.restore_section(&SectionSnapshot::Card {
            uid: Some(PostUid(7)),
            name: "divider".into(),
            payload: json!({}),
        });
        assert!(section.is_ok());

        let clash = post.restore_section(&SectionSnapshot::Card {
            uid: Some(PostUid(7)),
            name: "divider".into(),
            payload: json!({}),
        });
        assert_eq!(clash, Err(PostError::DuplicateUid(PostUid(7))));
    }

    #[test]
    fn test_json_shape() {
        let snapshot = PostSnapshot {
            sections: vec![SectionSnapshot::Markup {
                uid: None,
                tag: "p".into(),
                children: vec![],
            }],
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            json,
            json!({ "sections": [{ "type": "Markup", "tag": "p" }] })
        );
    }
}
