use super::model::Comment;
use super::COMMENT_NOT_FOUND;
use crate::error::{ActionError, StoreError};
use crate::photos::PHOTO_NOT_FOUND;
use crate::store::{row_count, CommentStore, PhotoStore};
use crate::users::ServerUser;

const MAX_COMMENT_CHARS: usize = 1000;

/// Authoritative comment count: the number of comment rows, by full rescan.
pub async fn count_comments<S: CommentStore>(
    store: &S,
    photo_id: &str,
) -> Result<u32, StoreError> {
    row_count(store.list_comments(photo_id).await?.len())
}

/// Recount comment rows and overwrite the cached counter, best-effort.
pub async fn refresh_comment_count<S>(store: &S, photo_id: &str) -> Result<u32, ActionError>
where
    S: PhotoStore + CommentStore,
{
    let comment_count = count_comments(store, photo_id).await?;

    if let Err(e) = store.set_comment_count(photo_id, comment_count).await {
        tracing::warn!(
            photo_id,
            comment_count,
            "failed to store comment count, leaving it for read-path repair: {}",
            e
        );
    }

    Ok(comment_count)
}

/// Comments on a photo, oldest first.
pub async fn list_comments<S>(store: &S, photo_id: &str) -> Result<Vec<Comment>, ActionError>
where
    S: PhotoStore + CommentStore,
{
    if store.get_photo(photo_id).await?.is_none() {
        return Err(ActionError::NotFound(PHOTO_NOT_FOUND.to_string()));
    }

    let mut comments = store.list_comments(photo_id).await?;
    comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(comments)
}

pub async fn add_comment<S>(
    store: &S,
    photo_id: &str,
    author: &ServerUser,
    text: &str,
) -> Result<Comment, ActionError>
where
    S: PhotoStore + CommentStore,
{
    let text = text.trim();
    if text.is_empty() {
        return Err(ActionError::Validation("Comment cannot be empty".to_string()));
    }
    if text.chars().count() > MAX_COMMENT_CHARS {
        return Err(ActionError::Validation(format!(
            "Comment must be at most {} characters",
            MAX_COMMENT_CHARS
        )));
    }

    if store.get_photo(photo_id).await?.is_none() {
        return Err(ActionError::NotFound(PHOTO_NOT_FOUND.to_string()));
    }

    let comment = Comment {
        id: uuid::Uuid::new_v4().to_string(),
        photo_id: photo_id.to_string(),
        user_id: author.user_id.clone(),
        username: author.display_name().to_string(),
        text: text.to_string(),
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    store.create_comment(&comment).await.map_err(|e| {
        tracing::error!(photo_id, user_id = %author.user_id, "failed to create comment: {}", e);
        ActionError::Persistence(format!("Failed to add comment: {}", e))
    })?;

    let comment_count = refresh_comment_count(store, photo_id).await?;
    tracing::info!(photo_id, comment_id = %comment.id, comment_count, "comment added");

    Ok(comment)
}

/// Remove a comment. Only its author or an admin may do so.
/// Returns the recounted number of comments on the photo.
pub async fn delete_comment<S>(
    store: &S,
    photo_id: &str,
    comment_id: &str,
    caller: &ServerUser,
) -> Result<u32, ActionError>
where
    S: PhotoStore + CommentStore,
{
    let comment = store
        .get_comment(photo_id, comment_id)
        .await?
        .ok_or_else(|| ActionError::NotFound(COMMENT_NOT_FOUND.to_string()))?;

    if comment.user_id != caller.user_id && !caller.is_admin() {
        tracing::warn!(photo_id, comment_id, user_id = %caller.user_id, "comment delete refused");
        return Err(ActionError::Forbidden(
            "You can only delete your own comments".to_string(),
        ));
    }

    store.delete_comment(photo_id, comment_id).await.map_err(|e| {
        tracing::error!(photo_id, comment_id, "failed to delete comment: {}", e);
        ActionError::Persistence(format!("Failed to delete comment: {}", e))
    })?;

    refresh_comment_count(store, photo_id).await
}
