pub mod model;
pub mod service;

pub use model::{Comment, CreateCommentPayload};
pub use service::*;

pub const COMMENT_NOT_FOUND: &str = "Comment not found";
