//! # Inkpad Render Tree
//!
//! The reconciliation core: a dirty-tracking tree that maps post nodes
//! onto live DOM nodes and decides what must be re-rendered after a
//! mutation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ post: sections / markers / cards / atoms    │
//! └─────────────────────────────────────────────┘
//!                     ↓ mark_dirty / schedule_removal
//! ┌─────────────────────────────────────────────┐
//! │ render tree: one RenderNode per post node   │
//! │  - dirty flags propagate to the root        │
//! │  - DOM-node → render-node index             │
//! └─────────────────────────────────────────────┘
//!                     ↓ render pass
//! ┌─────────────────────────────────────────────┐
//! │ dom: live element / text tree               │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Dirtiness propagates to the root at `mark_dirty` time, so a render
//! pass can skip any clean subtree outright: a clean node cannot have a
//! dirty descendant. The pass walks top-down, regenerates or patches the
//! DOM of each dirty node, syncs child render nodes against the post
//! node's children, and cleans each node once its own DOM is confirmed.
//!
//! Card and atom contents are produced by [`CardHost`] / [`AtomHost`]
//! implementations registered by name in a [`HostRegistry`]; the tree
//! owns only the wrapper elements around them.

mod hosts;
mod node;
mod renderer;
mod tree;

pub use hosts::{AtomHost, CardHost, HostRegistry};
pub use node::{RenderNode, RenderNodeId, RenderSlots};
pub use renderer::{RenderStats, Renderer, CURSOR_TEXT};
pub use tree::{RenderError, RenderTree};
