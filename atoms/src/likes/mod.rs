pub mod model;
pub mod service;

pub use model::{LikeToggle, PhotoLike};
pub use service::*;
