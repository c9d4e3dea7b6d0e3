//! Storage seams. Services only see these traits; `dynamo` and `s3` are the
//! production implementations, `crate::testing` holds in-memory ones.

pub mod dynamo;
pub mod s3;

use async_trait::async_trait;

use crate::comments::Comment;
use crate::error::StoreError;
use crate::likes::PhotoLike;
use crate::photos::{Photo, UpdatePhotoPayload};

pub use dynamo::DynamoStore;
pub use s3::S3Media;

#[async_trait]
pub trait PhotoStore: Send + Sync {
    async fn get_photo(&self, photo_id: &str) -> Result<Option<Photo>, StoreError>;
    async fn list_photos(&self) -> Result<Vec<Photo>, StoreError>;
    async fn put_photo(&self, photo: &Photo) -> Result<(), StoreError>;
    async fn update_photo(
        &self,
        photo_id: &str,
        patch: &UpdatePhotoPayload,
        updated_at: &str,
    ) -> Result<(), StoreError>;
    async fn delete_photo(&self, photo_id: &str) -> Result<(), StoreError>;
    /// Overwrites the cached like count. Never increments.
    async fn set_like_count(&self, photo_id: &str, count: u32) -> Result<(), StoreError>;
    /// Overwrites the cached comment count. Never increments.
    async fn set_comment_count(&self, photo_id: &str, count: u32) -> Result<(), StoreError>;
}

#[async_trait]
pub trait LikeStore: Send + Sync {
    async fn get_like(&self, photo_id: &str, user_id: &str)
        -> Result<Option<PhotoLike>, StoreError>;
    /// Fails with `StoreError::Conflict` when the `(photo_id, user_id)` row exists.
    async fn create_like(&self, like: &PhotoLike) -> Result<(), StoreError>;
    /// Deleting a row that is already gone succeeds.
    async fn delete_like(&self, photo_id: &str, user_id: &str) -> Result<(), StoreError>;
    async fn list_likes(&self, photo_id: &str) -> Result<Vec<PhotoLike>, StoreError>;
    async fn list_all_likes(&self) -> Result<Vec<PhotoLike>, StoreError>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn get_comment(
        &self,
        photo_id: &str,
        comment_id: &str,
    ) -> Result<Option<Comment>, StoreError>;
    async fn create_comment(&self, comment: &Comment) -> Result<(), StoreError>;
    async fn delete_comment(&self, photo_id: &str, comment_id: &str) -> Result<(), StoreError>;
    async fn list_comments(&self, photo_id: &str) -> Result<Vec<Comment>, StoreError>;
    async fn list_all_comments(&self) -> Result<Vec<Comment>, StoreError>;
}

/// Everything the gallery keeps in its table.
pub trait GalleryStore: PhotoStore + LikeStore + CommentStore {}

impl<T: PhotoStore + LikeStore + CommentStore> GalleryStore for T {}

/// Image object storage.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn presign_get(&self, key: &str) -> Result<String, StoreError>;
    async fn presign_put(&self, key: &str, content_type: &str) -> Result<String, StoreError>;
    async fn delete_object(&self, key: &str) -> Result<(), StoreError>;
}

/// Convert a scanned row count into a stored counter value.
pub(crate) fn row_count(rows: usize) -> Result<u32, StoreError> {
    u32::try_from(rows)
        .map_err(|_| StoreError::Malformed(format!("row count {} overflows u32", rows)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_count_fits_u32() {
        assert_eq!(row_count(0).unwrap(), 0);
        assert_eq!(row_count(42).unwrap(), 42);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn row_count_rejects_overflow() {
        let err = row_count(u32::MAX as usize + 1).unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)));
    }
}
