//! # Inkpad DOM
//!
//! In-memory DOM the render tree targets: element and text nodes in a
//! generational arena, with browser-shaped structural operations
//! (append moves attached nodes, hierarchy violations are rejected) and a
//! compact serializer for tests and debugging.

mod document;

pub use document::{DomData, DomDocument, DomError, DomNode, DomNodeId};
