use futures::future::join_all;
use gallery_atoms::auth::{with_auth, with_role, IdentityProvider};
use gallery_atoms::likes::{self, LikeToggle};
use gallery_atoms::photos::{
    self, CreatePhotoPayload, CreatedPhoto, Photo, PhotoView, RepairReport, UpdatePhotoPayload,
};
use gallery_atoms::store::{GalleryStore, MediaStore};
use gallery_atoms::users::ADMIN_ROLE;
use gallery_atoms::ActionResponse;

/// GET /photos
pub async fn get_all_photos<I, S, M>(
    identity: &I,
    store: &S,
    media: &M,
) -> ActionResponse<Vec<PhotoView>>
where
    I: IdentityProvider + ?Sized,
    S: GalleryStore,
    M: MediaStore,
{
    with_auth(identity, |user| async move {
        let views = photos::get_all_photos(store, &user.user_id).await?;
        tracing::info!(user_id = %user.user_id, count = views.len(), "photos listed");
        Ok(sign_all(media, views).await)
    })
    .await
}

/// GET /photos/{id}
pub async fn get_photo_by_id<I, S, M>(
    identity: &I,
    store: &S,
    media: &M,
    photo_id: &str,
) -> ActionResponse<PhotoView>
where
    I: IdentityProvider + ?Sized,
    S: GalleryStore,
    M: MediaStore,
{
    with_auth(identity, |user| async move {
        let view = photos::get_photo_by_id(store, photo_id, &user.user_id).await?;
        Ok(sign(media, view).await)
    })
    .await
}

/// POST /photos/{id}/like
pub async fn toggle_photo_like<I, S>(
    identity: &I,
    store: &S,
    photo_id: &str,
) -> ActionResponse<LikeToggle>
where
    I: IdentityProvider + ?Sized,
    S: GalleryStore,
{
    with_auth(identity, |user| async move {
        likes::toggle_like(store, photo_id, &user.user_id).await
    })
    .await
}

/// POST /photos
pub async fn create_photo<I, S, M>(
    identity: &I,
    store: &S,
    media: &M,
    payload: CreatePhotoPayload,
) -> ActionResponse<CreatedPhoto>
where
    I: IdentityProvider + ?Sized,
    S: GalleryStore,
    M: MediaStore,
{
    with_role(identity, ADMIN_ROLE, |user| async move {
        photos::create_photo(store, media, &user.user_id, payload).await
    })
    .await
}

/// PATCH /photos/{id}
pub async fn update_photo<I, S>(
    identity: &I,
    store: &S,
    photo_id: &str,
    payload: UpdatePhotoPayload,
) -> ActionResponse<Photo>
where
    I: IdentityProvider + ?Sized,
    S: GalleryStore,
{
    with_role(identity, ADMIN_ROLE, |user| async move {
        let photo = photos::update_photo(store, photo_id, payload).await?;
        tracing::info!(photo_id, user_id = %user.user_id, "photo updated");
        Ok(photo)
    })
    .await
}

/// DELETE /photos/{id}
pub async fn delete_photo<I, S, M>(
    identity: &I,
    store: &S,
    media: &M,
    photo_id: &str,
) -> ActionResponse<()>
where
    I: IdentityProvider + ?Sized,
    S: GalleryStore,
    M: MediaStore,
{
    with_role(identity, ADMIN_ROLE, |user| async move {
        tracing::info!(photo_id, user_id = %user.user_id, "deleting photo");
        photos::delete_photo(store, media, photo_id).await
    })
    .await
}

/// POST /admin/migrations/recount
pub async fn recount_all_photos<I, S>(identity: &I, store: &S) -> ActionResponse<RepairReport>
where
    I: IdentityProvider + ?Sized,
    S: GalleryStore,
{
    with_role(identity, ADMIN_ROLE, |_| async move {
        photos::reconcile_all_photos(store).await
    })
    .await
}

/// Attach a presigned image URL. A signing failure leaves the URL empty.
async fn sign<M: MediaStore>(media: &M, mut view: PhotoView) -> PhotoView {
    match media.presign_get(&view.photo.image_key).await {
        Ok(url) => view.image_url = Some(url),
        Err(e) => {
            tracing::warn!(photo_id = %view.photo.id, "failed to sign image url: {}", e);
        }
    }
    view
}

async fn sign_all<M: MediaStore>(media: &M, views: Vec<PhotoView>) -> Vec<PhotoView> {
    join_all(views.into_iter().map(|view| sign(media, view))).await
}
