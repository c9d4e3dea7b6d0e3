//! In-memory collaborators for tests: a table, an object store and a fixed identity.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::auth::IdentityProvider;
use crate::comments::Comment;
use crate::error::{IdentityError, StoreError};
use crate::likes::PhotoLike;
use crate::photos::{Photo, UpdatePhotoPayload};
use crate::store::{CommentStore, LikeStore, MediaStore, PhotoStore};
use crate::users::ServerUser;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
pub struct MemoryStore {
    photos: Mutex<BTreeMap<String, Photo>>,
    likes: Mutex<BTreeMap<(String, String), PhotoLike>>,
    comments: Mutex<BTreeMap<(String, String), Comment>>,
    fail_count_writes: AtomicBool,
    fail_like_writes: AtomicBool,
    count_writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `photo` as-is, stale counts included.
    pub fn seed_photo(&self, photo: Photo) {
        lock(&self.photos).insert(photo.id.clone(), photo);
    }

    pub fn seed_like(&self, photo_id: &str, user_id: &str) {
        lock(&self.likes).insert(
            (photo_id.to_string(), user_id.to_string()),
            PhotoLike::new(photo_id, user_id),
        );
    }

    pub fn seed_comment(&self, comment: Comment) {
        lock(&self.comments).insert((comment.photo_id.clone(), comment.id.clone()), comment);
    }

    /// Raw stored row, without any repair.
    pub fn stored_photo(&self, photo_id: &str) -> Option<Photo> {
        lock(&self.photos).get(photo_id).cloned()
    }

    pub fn like_rows(&self, photo_id: &str) -> usize {
        lock(&self.likes).keys().filter(|(p, _)| p == photo_id).count()
    }

    pub fn comment_rows(&self, photo_id: &str) -> usize {
        lock(&self.comments).keys().filter(|(p, _)| p == photo_id).count()
    }

    /// Number of successful like/comment count overwrites so far.
    pub fn count_writes(&self) -> usize {
        self.count_writes.load(Ordering::SeqCst)
    }

    pub fn fail_count_writes(&self, fail: bool) {
        self.fail_count_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_like_writes(&self, fail: bool) {
        self.fail_like_writes.store(fail, Ordering::SeqCst);
    }

    fn write_count(
        &self,
        photo_id: &str,
        apply: impl FnOnce(&mut Photo),
    ) -> Result<(), StoreError> {
        if self.fail_count_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected count write failure".to_string()));
        }
        let mut photos = lock(&self.photos);
        let photo = photos
            .get_mut(photo_id)
            .ok_or_else(|| StoreError::Backend(format!("photo {} no longer exists", photo_id)))?;
        apply(photo);
        self.count_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn check_like_writes(&self) -> Result<(), StoreError> {
        if self.fail_like_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected like write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PhotoStore for MemoryStore {
    async fn get_photo(&self, photo_id: &str) -> Result<Option<Photo>, StoreError> {
        Ok(lock(&self.photos).get(photo_id).cloned())
    }

    async fn list_photos(&self) -> Result<Vec<Photo>, StoreError> {
        Ok(lock(&self.photos).values().cloned().collect())
    }

    async fn put_photo(&self, photo: &Photo) -> Result<(), StoreError> {
        lock(&self.photos).insert(photo.id.clone(), photo.clone());
        Ok(())
    }

    async fn update_photo(
        &self,
        photo_id: &str,
        patch: &UpdatePhotoPayload,
        updated_at: &str,
    ) -> Result<(), StoreError> {
        let mut photos = lock(&self.photos);
        let photo = photos
            .get_mut(photo_id)
            .ok_or_else(|| StoreError::Backend(format!("photo {} no longer exists", photo_id)))?;
        if let Some(title) = &patch.title {
            photo.title = title.clone();
        }
        if let Some(description) = &patch.description {
            photo.description = Some(description.clone());
        }
        photo.updated_at = updated_at.to_string();
        Ok(())
    }

    async fn delete_photo(&self, photo_id: &str) -> Result<(), StoreError> {
        lock(&self.photos).remove(photo_id);
        Ok(())
    }

    async fn set_like_count(&self, photo_id: &str, count: u32) -> Result<(), StoreError> {
        self.write_count(photo_id, |p| p.like_count = count)
    }

    async fn set_comment_count(&self, photo_id: &str, count: u32) -> Result<(), StoreError> {
        self.write_count(photo_id, |p| p.comment_count = count)
    }
}

#[async_trait]
impl LikeStore for MemoryStore {
    async fn get_like(
        &self,
        photo_id: &str,
        user_id: &str,
    ) -> Result<Option<PhotoLike>, StoreError> {
        Ok(lock(&self.likes)
            .get(&(photo_id.to_string(), user_id.to_string()))
            .cloned())
    }

    async fn create_like(&self, like: &PhotoLike) -> Result<(), StoreError> {
        self.check_like_writes()?;
        let mut likes = lock(&self.likes);
        let key = (like.photo_id.clone(), like.user_id.clone());
        if likes.contains_key(&key) {
            return Err(StoreError::Conflict);
        }
        likes.insert(key, like.clone());
        Ok(())
    }

    async fn delete_like(&self, photo_id: &str, user_id: &str) -> Result<(), StoreError> {
        self.check_like_writes()?;
        lock(&self.likes).remove(&(photo_id.to_string(), user_id.to_string()));
        Ok(())
    }

    async fn list_likes(&self, photo_id: &str) -> Result<Vec<PhotoLike>, StoreError> {
        Ok(lock(&self.likes)
            .values()
            .filter(|l| l.photo_id == photo_id)
            .cloned()
            .collect())
    }

    async fn list_all_likes(&self) -> Result<Vec<PhotoLike>, StoreError> {
        Ok(lock(&self.likes).values().cloned().collect())
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn get_comment(
        &self,
        photo_id: &str,
        comment_id: &str,
    ) -> Result<Option<Comment>, StoreError> {
        Ok(lock(&self.comments)
            .get(&(photo_id.to_string(), comment_id.to_string()))
            .cloned())
    }

    async fn create_comment(&self, comment: &Comment) -> Result<(), StoreError> {
        lock(&self.comments).insert(
            (comment.photo_id.clone(), comment.id.clone()),
            comment.clone(),
        );
        Ok(())
    }

    async fn delete_comment(&self, photo_id: &str, comment_id: &str) -> Result<(), StoreError> {
        lock(&self.comments).remove(&(photo_id.to_string(), comment_id.to_string()));
        Ok(())
    }

    async fn list_comments(&self, photo_id: &str) -> Result<Vec<Comment>, StoreError> {
        Ok(lock(&self.comments)
            .values()
            .filter(|c| c.photo_id == photo_id)
            .cloned()
            .collect())
    }

    async fn list_all_comments(&self) -> Result<Vec<Comment>, StoreError> {
        Ok(lock(&self.comments).values().cloned().collect())
    }
}

/// Object store that hands out `memory://` URLs and records deletions.
#[derive(Default)]
pub struct MemoryMedia {
    deleted: Mutex<BTreeSet<String>>,
    fail_signing: AtomicBool,
}

impl MemoryMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn was_deleted(&self, key: &str) -> bool {
        lock(&self.deleted).contains(key)
    }

    pub fn fail_signing(&self, fail: bool) {
        self.fail_signing.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaStore for MemoryMedia {
    async fn presign_get(&self, key: &str) -> Result<String, StoreError> {
        if self.fail_signing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected signing failure".to_string()));
        }
        Ok(format!("memory://get/{}", key))
    }

    async fn presign_put(&self, key: &str, content_type: &str) -> Result<String, StoreError> {
        if self.fail_signing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected signing failure".to_string()));
        }
        Ok(format!("memory://put/{}?content-type={}", key, content_type))
    }

    async fn delete_object(&self, key: &str) -> Result<(), StoreError> {
        lock(&self.deleted).insert(key.to_string());
        Ok(())
    }
}

/// Identity provider with a fixed answer.
pub struct StaticIdentity {
    result: Result<ServerUser, IdentityError>,
}

impl StaticIdentity {
    pub fn user(user_id: &str, groups: &[&str]) -> Self {
        StaticIdentity {
            result: Ok(ServerUser {
                user_id: user_id.to_string(),
                username: user_id.to_string(),
                preferred_username: None,
                groups: groups.iter().map(|g| g.to_string()).collect(),
            }),
        }
    }

    pub fn admin(user_id: &str) -> Self {
        Self::user(user_id, &["admin"])
    }

    pub fn anonymous() -> Self {
        Self::failing(IdentityError::Unauthenticated)
    }

    pub fn failing(error: IdentityError) -> Self {
        StaticIdentity { result: Err(error) }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user(&self) -> Result<ServerUser, IdentityError> {
        self.result.clone()
    }
}

/// Photo with the given stored counts and a fixed timestamp.
pub fn photo(id: &str, like_count: u32, comment_count: u32) -> Photo {
    Photo {
        id: id.to_string(),
        title: format!("Photo {}", id),
        description: None,
        image_key: format!("photos/{}.jpg", id),
        uploaded_by: "admin-1".to_string(),
        like_count,
        comment_count,
        created_at: "2024-01-01T00:00:00+00:00".to_string(),
        updated_at: "2024-01-01T00:00:00+00:00".to_string(),
    }
}
