//! Error types for the editor.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Mutation error: {0}")]
    Mutation(#[from] crate::mutations::MutationError),

    #[error("Render error: {0}")]
    Render(#[from] inkpad_render::RenderError),

    #[error("Post error: {0}")]
    Post(#[from] inkpad_post::PostError),

    #[error("DOM error: {0}")]
    Dom(#[from] inkpad_dom::DomError),
}
