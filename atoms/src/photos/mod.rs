pub mod model;
pub mod service;

pub use model::{
    CreatePhotoPayload, CreatedPhoto, Photo, PhotoView, RepairReport, UpdatePhotoPayload,
};
pub use service::*;

pub const PHOTO_NOT_FOUND: &str = "Photo not found";
