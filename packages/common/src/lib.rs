//! # Inkpad Common
//!
//! Shared structural machinery for the inkpad trees: the generational
//! [`Arena`] every tree stores its nodes in, and the intrusive
//! [`LinkedList`] that orders sections, markers, DOM children and child
//! render nodes alike.

pub mod arena;
pub mod list;

pub use arena::{Arena, Id};
pub use list::{LinkedList, ListError, ListIter, ListLinks, ListStore};
