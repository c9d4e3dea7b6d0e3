//! Photo read path and lifecycle.
//!
//! Every read recounts like and comment rows and overwrites any cached count
//! that disagrees, so drift left behind by racing writers heals on the next read.

use std::collections::{HashMap, HashSet};

use futures::future::join_all;

use super::model::{
    CreatePhotoPayload, CreatedPhoto, Photo, PhotoView, RepairReport, UpdatePhotoPayload,
};
use super::PHOTO_NOT_FOUND;
use crate::error::{ActionError, StoreError};
use crate::store::{row_count, GalleryStore, MediaStore, PhotoStore};

const MAX_TITLE_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 2000;

/// Authoritative counts for one photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tally {
    likes: u32,
    comments: u32,
}

/// All photos, newest first, with reconciled counts.
pub async fn get_all_photos<S: GalleryStore>(
    store: &S,
    viewer_id: &str,
) -> Result<Vec<PhotoView>, ActionError> {
    let (photos, liked, _) = load_reconciled(store, Some(viewer_id)).await?;

    Ok(photos
        .into_iter()
        .map(|photo| {
            let is_liked = liked.contains(&photo.id);
            PhotoView {
                photo,
                image_url: None,
                is_liked,
            }
        })
        .collect())
}

/// One photo with reconciled counts.
pub async fn get_photo_by_id<S: GalleryStore>(
    store: &S,
    photo_id: &str,
    viewer_id: &str,
) -> Result<PhotoView, ActionError> {
    let mut photo = store
        .get_photo(photo_id)
        .await?
        .ok_or_else(|| ActionError::NotFound(PHOTO_NOT_FOUND.to_string()))?;

    let (likes, comments) = tokio::join!(store.list_likes(photo_id), store.list_comments(photo_id));
    let likes = likes?;
    let tally = Tally {
        likes: row_count(likes.len())?,
        comments: row_count(comments?.len())?,
    };

    repair_counts(store, &mut photo, tally).await;

    Ok(PhotoView {
        photo,
        image_url: None,
        is_liked: likes.iter().any(|like| like.user_id == viewer_id),
    })
}

/// Runs the read-path repair over every photo and reports what it fixed.
pub async fn reconcile_all_photos<S: GalleryStore>(store: &S) -> Result<RepairReport, ActionError> {
    let (photos, _, repaired) = load_reconciled(store, None).await?;
    let report = RepairReport {
        photos_scanned: photos.len(),
        photos_repaired: repaired,
    };
    tracing::info!(
        photos_scanned = report.photos_scanned,
        photos_repaired = report.photos_repaired,
        "count repair pass finished"
    );
    Ok(report)
}

/// One list call per entity, grouped in memory, repairs issued concurrently.
/// Returns the photos (newest first), the ids the viewer likes and the repair count.
async fn load_reconciled<S: GalleryStore>(
    store: &S,
    viewer_id: Option<&str>,
) -> Result<(Vec<Photo>, HashSet<String>, usize), ActionError> {
    let (photos, likes, comments) = tokio::join!(
        store.list_photos(),
        store.list_all_likes(),
        store.list_all_comments()
    );
    let mut photos = photos?;
    let likes = likes?;
    let comments = comments?;

    let like_counts = tally_by_photo(likes.iter().map(|l| l.photo_id.as_str()));
    let comment_counts = tally_by_photo(comments.iter().map(|c| c.photo_id.as_str()));

    let liked: HashSet<String> = match viewer_id {
        Some(viewer) => likes
            .iter()
            .filter(|l| l.user_id == viewer)
            .map(|l| l.photo_id.clone())
            .collect(),
        None => HashSet::new(),
    };

    let tallies = photos
        .iter()
        .map(|photo| {
            Ok(Tally {
                likes: row_count(like_counts.get(photo.id.as_str()).copied().unwrap_or(0))?,
                comments: row_count(comment_counts.get(photo.id.as_str()).copied().unwrap_or(0))?,
            })
        })
        .collect::<Result<Vec<_>, StoreError>>()?;

    let repairs = photos
        .iter_mut()
        .zip(tallies)
        .map(|(photo, tally)| repair_counts(store, photo, tally));
    let repaired = join_all(repairs).await.into_iter().filter(|r| *r).count();

    photos.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok((photos, liked, repaired))
}

fn tally_by_photo<'a>(photo_ids: impl Iterator<Item = &'a str>) -> HashMap<&'a str, usize> {
    let mut counts = HashMap::new();
    for photo_id in photo_ids {
        *counts.entry(photo_id).or_insert(0) += 1;
    }
    counts
}

/// Bring `photo` in line with `tally`, overwriting stale stored counters.
/// Returns whether anything was stale. Write failures are logged only.
async fn repair_counts<S: PhotoStore>(store: &S, photo: &mut Photo, tally: Tally) -> bool {
    let mut stale = false;

    if photo.like_count != tally.likes {
        stale = true;
        tracing::info!(
            photo_id = %photo.id,
            stored = photo.like_count,
            actual = tally.likes,
            "repairing stale like count"
        );
        if let Err(e) = store.set_like_count(&photo.id, tally.likes).await {
            tracing::warn!(photo_id = %photo.id, "like count repair failed: {}", e);
        }
        photo.like_count = tally.likes;
    }

    if photo.comment_count != tally.comments {
        stale = true;
        tracing::info!(
            photo_id = %photo.id,
            stored = photo.comment_count,
            actual = tally.comments,
            "repairing stale comment count"
        );
        if let Err(e) = store.set_comment_count(&photo.id, tally.comments).await {
            tracing::warn!(photo_id = %photo.id, "comment count repair failed: {}", e);
        }
        photo.comment_count = tally.comments;
    }

    stale
}

/// Store a new photo row and hand back a presigned upload URL for its image.
pub async fn create_photo<S, M>(
    store: &S,
    media: &M,
    user_id: &str,
    payload: CreatePhotoPayload,
) -> Result<CreatedPhoto, ActionError>
where
    S: PhotoStore,
    M: MediaStore,
{
    let title = validate_title(&payload.title)?;
    let description = validate_description(payload.description.as_deref())?;
    let extension = image_extension(&payload.content_type).ok_or_else(|| {
        ActionError::Validation(format!("Unsupported image type: {}", payload.content_type))
    })?;

    let photo_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let photo = Photo {
        image_key: format!("photos/{}.{}", photo_id, extension),
        id: photo_id,
        title,
        description,
        uploaded_by: user_id.to_string(),
        like_count: 0,
        comment_count: 0,
        created_at: now.clone(),
        updated_at: now,
    };

    let upload_url = media
        .presign_put(&photo.image_key, &payload.content_type)
        .await?;
    store.put_photo(&photo).await?;
    tracing::info!(photo_id = %photo.id, uploaded_by = user_id, "photo created");

    Ok(CreatedPhoto { photo, upload_url })
}

/// Patch title and/or description.
pub async fn update_photo<S: PhotoStore>(
    store: &S,
    photo_id: &str,
    payload: UpdatePhotoPayload,
) -> Result<Photo, ActionError> {
    if store.get_photo(photo_id).await?.is_none() {
        return Err(ActionError::NotFound(PHOTO_NOT_FOUND.to_string()));
    }

    let patch = UpdatePhotoPayload {
        title: payload.title.as_deref().map(validate_title).transpose()?,
        description: validate_description(payload.description.as_deref())?,
    };

    let now = chrono::Utc::now().to_rfc3339();
    store.update_photo(photo_id, &patch, &now).await?;

    store
        .get_photo(photo_id)
        .await?
        .ok_or_else(|| ActionError::NotFound(PHOTO_NOT_FOUND.to_string()))
}

/// Delete a photo with everything under it. Like and comment rows go first so
/// no orphan survives a failure half way; the image object is best-effort.
pub async fn delete_photo<S, M>(store: &S, media: &M, photo_id: &str) -> Result<(), ActionError>
where
    S: GalleryStore,
    M: MediaStore,
{
    let photo = store
        .get_photo(photo_id)
        .await?
        .ok_or_else(|| ActionError::NotFound(PHOTO_NOT_FOUND.to_string()))?;

    let (likes, comments) = tokio::join!(store.list_likes(photo_id), store.list_comments(photo_id));
    let (likes, comments) = (likes?, comments?);

    for like in &likes {
        store.delete_like(photo_id, &like.user_id).await?;
    }
    for comment in &comments {
        store.delete_comment(photo_id, &comment.id).await?;
    }

    if let Err(e) = media.delete_object(&photo.image_key).await {
        tracing::warn!(
            photo_id,
            image_key = %photo.image_key,
            "failed to delete image object: {}",
            e
        );
    }

    store.delete_photo(photo_id).await?;
    tracing::info!(
        photo_id,
        likes = likes.len(),
        comments = comments.len(),
        "photo deleted"
    );

    Ok(())
}

/// File extension for an accepted upload content type.
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

fn validate_title(title: &str) -> Result<String, ActionError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ActionError::Validation("Title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(ActionError::Validation(format!(
            "Title must be at most {} characters",
            MAX_TITLE_CHARS
        )));
    }
    Ok(title.to_string())
}

fn validate_description(description: Option<&str>) -> Result<Option<String>, ActionError> {
    match description.map(str::trim) {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_CHARS => Err(ActionError::Validation(
            format!("Description must be at most {} characters", MAX_DESCRIPTION_CHARS),
        )),
        Some(d) => Ok(Some(d.to_string())),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::Comment;
    use crate::store::{CommentStore, LikeStore};
    use crate::testing::{photo, MemoryMedia, MemoryStore};

    fn comment(photo_id: &str, id: &str) -> Comment {
        Comment {
            id: id.to_string(),
            photo_id: photo_id.to_string(),
            user_id: "u-c".to_string(),
            username: "carol".to_string(),
            text: "nice".to_string(),
            created_at: "2024-01-02T00:00:00+00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn get_by_id_repairs_drifted_like_count() {
        let store = MemoryStore::new();
        store.seed_photo(photo("P1", 5, 0));
        for user in ["u1", "u2", "u3"] {
            store.seed_like("P1", user);
        }

        let view = get_photo_by_id(&store, "P1", "u2").await.unwrap();
        assert_eq!(view.photo.like_count, 3);
        assert!(view.is_liked);
        assert_eq!(store.stored_photo("P1").unwrap().like_count, 3);
    }

    #[tokio::test]
    async fn zero_likes_reads_as_zero() {
        let store = MemoryStore::new();
        store.seed_photo(photo("p1", 4, 0));
        store.seed_photo(photo("p2", 0, 0));

        let views = get_all_photos(&store, "u1").await.unwrap();
        assert!(views.iter().all(|v| v.photo.like_count == 0));
        assert_eq!(store.stored_photo("p1").unwrap().like_count, 0);
    }

    #[tokio::test]
    async fn second_read_writes_nothing() {
        let store = MemoryStore::new();
        store.seed_photo(photo("p1", 9, 3));
        store.seed_like("p1", "u1");
        store.seed_comment(comment("p1", "c1"));

        get_all_photos(&store, "u1").await.unwrap();
        let writes_after_first = store.count_writes();
        assert_eq!(writes_after_first, 2);

        let views = get_all_photos(&store, "u1").await.unwrap();
        assert_eq!(store.count_writes(), writes_after_first);
        assert_eq!(views[0].photo.like_count, 1);
        assert_eq!(views[0].photo.comment_count, 1);

        get_photo_by_id(&store, "p1", "u1").await.unwrap();
        assert_eq!(store.count_writes(), writes_after_first);
    }

    #[tokio::test]
    async fn listing_marks_viewer_likes_and_sorts_newest_first() {
        let store = MemoryStore::new();
        let mut older = photo("old", 0, 0);
        older.created_at = "2023-05-01T00:00:00+00:00".to_string();
        store.seed_photo(older);
        store.seed_photo(photo("new", 1, 0));
        store.seed_like("new", "viewer");

        let views = get_all_photos(&store, "viewer").await.unwrap();
        let ids: Vec<&str> = views.iter().map(|v| v.photo.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert!(views[0].is_liked);
        assert!(!views[1].is_liked);
    }

    #[tokio::test]
    async fn repair_failure_still_returns_true_counts() {
        let store = MemoryStore::new();
        store.seed_photo(photo("p1", 7, 0));
        store.seed_like("p1", "u1");
        store.fail_count_writes(true);

        let view = get_photo_by_id(&store, "p1", "u9").await.unwrap();
        assert_eq!(view.photo.like_count, 1);
        assert_eq!(store.stored_photo("p1").unwrap().like_count, 7);
    }

    #[tokio::test]
    async fn reconcile_all_reports_repairs() {
        let store = MemoryStore::new();
        store.seed_photo(photo("a", 2, 0));
        store.seed_photo(photo("b", 0, 0));
        store.seed_photo(photo("c", 0, 1));
        store.seed_like("b", "u1");
        store.seed_comment(comment("c", "c1"));

        let report = reconcile_all_photos(&store).await.unwrap();
        assert_eq!(
            report,
            RepairReport {
                photos_scanned: 3,
                photos_repaired: 2
            }
        );
    }

    #[tokio::test]
    async fn missing_photo_is_not_found() {
        let store = MemoryStore::new();
        let err = get_photo_by_id(&store, "missing", "u1").await.unwrap_err();
        assert_eq!(err, ActionError::NotFound("Photo not found".to_string()));
    }

    #[tokio::test]
    async fn delete_cascades_to_likes_and_comments() {
        let store = MemoryStore::new();
        let media = MemoryMedia::new();
        store.seed_photo(photo("p1", 2, 1));
        store.seed_like("p1", "u1");
        store.seed_like("p1", "u2");
        store.seed_comment(comment("p1", "c1"));
        store.seed_photo(photo("p2", 1, 0));
        store.seed_like("p2", "u1");

        delete_photo(&store, &media, "p1").await.unwrap();

        assert!(store.stored_photo("p1").is_none());
        assert_eq!(store.like_rows("p1"), 0);
        assert_eq!(store.comment_rows("p1"), 0);
        assert!(media.was_deleted("photos/p1.jpg"));
        assert_eq!(store.like_rows("p2"), 1);
        assert!(store.list_likes("p1").await.unwrap().is_empty());
        assert!(store.list_comments("p1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_validates_and_signs_upload() {
        let store = MemoryStore::new();
        let media = MemoryMedia::new();

        let created = create_photo(
            &store,
            &media,
            "admin-1",
            CreatePhotoPayload {
                title: "  Sunset  ".to_string(),
                description: Some("over the bay".to_string()),
                content_type: "image/png".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(created.photo.title, "Sunset");
        assert_eq!(created.photo.like_count, 0);
        assert!(created.photo.image_key.ends_with(".png"));
        assert!(created.upload_url.contains(&created.photo.image_key));
        assert!(store.stored_photo(&created.photo.id).is_some());
    }

    #[tokio::test]
    async fn create_rejects_blank_title_and_unknown_type() {
        let store = MemoryStore::new();
        let media = MemoryMedia::new();

        let blank = CreatePhotoPayload {
            title: "   ".to_string(),
            description: None,
            content_type: "image/jpeg".to_string(),
        };
        assert!(matches!(
            create_photo(&store, &media, "a", blank).await,
            Err(ActionError::Validation(_))
        ));

        let pdf = CreatePhotoPayload {
            title: "Doc".to_string(),
            description: None,
            content_type: "application/pdf".to_string(),
        };
        assert!(matches!(
            create_photo(&store, &media, "a", pdf).await,
            Err(ActionError::Validation(_))
        ));
        assert!(store.list_photos().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_patches_only_given_fields() {
        let store = MemoryStore::new();
        store.seed_photo(photo("p1", 0, 0));

        let updated = update_photo(
            &store,
            "p1",
            UpdatePhotoPayload {
                title: None,
                description: Some("new words".to_string()),
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.title, "Photo p1");
        assert_eq!(updated.description.as_deref(), Some("new words"));
    }

    #[test]
    fn extensions_for_known_types() {
        assert_eq!(image_extension("image/JPEG"), Some("jpg"));
        assert_eq!(image_extension("image/webp"), Some("webp"));
        assert_eq!(image_extension("text/plain"), None);
    }
}
