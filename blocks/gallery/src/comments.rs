use gallery_atoms::auth::{with_auth, IdentityProvider};
use gallery_atoms::comments::{self, Comment, CreateCommentPayload};
use gallery_atoms::store::GalleryStore;
use gallery_atoms::ActionResponse;
use serde::Serialize;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommentDeleted {
    pub comment_count: u32,
}

/// GET /photos/{id}/comments
pub async fn list_photo_comments<I, S>(
    identity: &I,
    store: &S,
    photo_id: &str,
) -> ActionResponse<Vec<Comment>>
where
    I: IdentityProvider + ?Sized,
    S: GalleryStore,
{
    with_auth(identity, |_| async move { comments::list_comments(store, photo_id).await }).await
}

/// POST /photos/{id}/comments
pub async fn add_photo_comment<I, S>(
    identity: &I,
    store: &S,
    photo_id: &str,
    payload: CreateCommentPayload,
) -> ActionResponse<Comment>
where
    I: IdentityProvider + ?Sized,
    S: GalleryStore,
{
    with_auth(identity, |user| async move {
        comments::add_comment(store, photo_id, &user, &payload.text).await
    })
    .await
}

/// DELETE /photos/{id}/comments/{comment_id}
pub async fn delete_photo_comment<I, S>(
    identity: &I,
    store: &S,
    photo_id: &str,
    comment_id: &str,
) -> ActionResponse<CommentDeleted>
where
    I: IdentityProvider + ?Sized,
    S: GalleryStore,
{
    with_auth(identity, |user| async move {
        let comment_count = comments::delete_comment(store, photo_id, comment_id, &user).await?;
        Ok(CommentDeleted { comment_count })
    })
    .await
}
