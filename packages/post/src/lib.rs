//! # Inkpad Post Model
//!
//! The abstract document the editor edits: a root owning an ordered list
//! of sections, markup sections owning ordered runs of markers and atoms.
//! The model knows nothing about the DOM; the render tree consumes it and
//! maps every node onto live DOM.
//!
//! ```text
//! Root
//! ├── MarkupSection "h1"
//! │   └── Marker "Title"
//! ├── MarkupSection "p"
//! │   ├── Marker "Read "            (no markups)
//! │   ├── Marker "this"             (markups: [a href=…])
//! │   └── Atom "mention" "@sam"
//! └── Card "divider"
//! ```

mod markup;
mod post;
mod snapshot;

pub use markup::{anchor, Markup};
pub use post::{
    Post, PostError, PostKind, PostNode, PostNodeId, PostUid, DEFAULT_SECTION_TAG,
};
pub use snapshot::{InlineSnapshot, PostSnapshot, SectionSnapshot};
