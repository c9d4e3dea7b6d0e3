use crate::error::{ActionError, StoreError};
use crate::likes::model::{LikeToggle, PhotoLike};
use crate::photos::PHOTO_NOT_FOUND;
use crate::store::{row_count, LikeStore, PhotoStore};

/// Authoritative like count: the number of like rows, by full rescan.
pub async fn count_likes<S: LikeStore>(store: &S, photo_id: &str) -> Result<u32, StoreError> {
    row_count(store.list_likes(photo_id).await?.len())
}

/// Recount the like rows and overwrite the cached counter.
/// A failed overwrite is logged and otherwise ignored; the read path repairs it later.
pub async fn refresh_like_count<S>(store: &S, photo_id: &str) -> Result<u32, ActionError>
where
    S: PhotoStore + LikeStore,
{
    let like_count = count_likes(store, photo_id).await?;

    if let Err(e) = store.set_like_count(photo_id, like_count).await {
        tracing::warn!(
            photo_id,
            like_count,
            "failed to store like count, leaving it for read-path repair: {}",
            e
        );
    }

    Ok(like_count)
}

/// Flip the caller's like on a photo: delete the row if it exists, create it otherwise.
pub async fn toggle_like<S>(
    store: &S,
    photo_id: &str,
    user_id: &str,
) -> Result<LikeToggle, ActionError>
where
    S: PhotoStore + LikeStore,
{
    if store.get_photo(photo_id).await?.is_none() {
        return Err(ActionError::NotFound(PHOTO_NOT_FOUND.to_string()));
    }

    let is_liked = match store.get_like(photo_id, user_id).await? {
        Some(_) => {
            store.delete_like(photo_id, user_id).await.map_err(|e| {
                tracing::error!(photo_id, user_id, "failed to remove like: {}", e);
                ActionError::Persistence(format!("Failed to unlike photo: {}", e))
            })?;
            false
        }
        None => {
            store
                .create_like(&PhotoLike::new(photo_id, user_id))
                .await
                .map_err(|e| {
                    tracing::error!(photo_id, user_id, "failed to create like: {}", e);
                    ActionError::Persistence(format!("Failed to like photo: {}", e))
                })?;
            true
        }
    };

    let like_count = refresh_like_count(store, photo_id).await?;
    tracing::info!(photo_id, user_id, is_liked, like_count, "like toggled");

    Ok(LikeToggle {
        is_liked,
        like_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{photo, MemoryStore};

    #[tokio::test]
    async fn toggle_twice_returns_to_prior_count() {
        let store = MemoryStore::new();
        store.seed_photo(photo("p1", 2, 0));
        store.seed_like("p1", "u-a");
        store.seed_like("p1", "u-b");

        let liked = toggle_like(&store, "p1", "u-1").await.unwrap();
        assert_eq!(liked, LikeToggle { is_liked: true, like_count: 3 });

        let unliked = toggle_like(&store, "p1", "u-1").await.unwrap();
        assert_eq!(unliked, LikeToggle { is_liked: false, like_count: 2 });
        assert_eq!(store.stored_photo("p1").unwrap().like_count, 2);
    }

    #[tokio::test]
    async fn deleting_a_missing_like_is_a_no_op() {
        let store = MemoryStore::new();
        store.seed_photo(photo("p1", 0, 0));

        store.delete_like("p1", "u1").await.unwrap();
        assert_eq!(store.like_rows("p1"), 0);

        store.seed_like("p1", "u1");
        store.delete_like("p1", "u1").await.unwrap();
        store.delete_like("p1", "u1").await.unwrap();
        assert_eq!(store.like_rows("p1"), 0);
        assert_eq!(count_likes(&store, "p1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn two_users_in_sequence() {
        let store = MemoryStore::new();
        store.seed_photo(photo("p1", 0, 0));

        assert_eq!(toggle_like(&store, "p1", "u1").await.unwrap().like_count, 1);
        assert_eq!(toggle_like(&store, "p1", "u2").await.unwrap().like_count, 2);

        assert_eq!(store.like_rows("p1"), 2);
        assert_eq!(store.stored_photo("p1").unwrap().like_count, 2);
    }

    #[tokio::test]
    async fn toggle_overwrites_drifted_count() {
        let store = MemoryStore::new();
        store.seed_photo(photo("p1", 40, 0));

        let result = toggle_like(&store, "p1", "u1").await.unwrap();
        assert_eq!(result.like_count, 1);
        assert_eq!(store.stored_photo("p1").unwrap().like_count, 1);
    }

    #[tokio::test]
    async fn missing_photo_is_not_found() {
        let store = MemoryStore::new();
        let err = toggle_like(&store, "nope", "u1").await.unwrap_err();
        assert_eq!(err, ActionError::NotFound("Photo not found".to_string()));
        assert_eq!(store.like_rows("nope"), 0);
    }

    #[tokio::test]
    async fn failed_relation_write_leaves_count_alone() {
        let store = MemoryStore::new();
        store.seed_photo(photo("p1", 0, 0));
        store.fail_like_writes(true);

        let err = toggle_like(&store, "p1", "u1").await.unwrap_err();
        assert!(matches!(err, ActionError::Persistence(_)));
        assert_eq!(store.count_writes(), 0);
        assert_eq!(store.like_rows("p1"), 0);
    }

    #[tokio::test]
    async fn failed_count_write_still_succeeds() {
        let store = MemoryStore::new();
        store.seed_photo(photo("p1", 0, 0));
        store.fail_count_writes(true);

        let result = toggle_like(&store, "p1", "u1").await.unwrap();
        assert_eq!(result, LikeToggle { is_liked: true, like_count: 1 });
        assert_eq!(store.like_rows("p1"), 1);
        assert_eq!(store.stored_photo("p1").unwrap().like_count, 0);
    }

    #[tokio::test]
    async fn duplicate_like_row_is_rejected_by_store() {
        let store = MemoryStore::new();
        store.seed_like("p1", "u1");
        let err = store.create_like(&PhotoLike::new("p1", "u1")).await.unwrap_err();
        assert_eq!(err, StoreError::Conflict);
        assert_eq!(store.like_rows("p1"), 1);
    }
}
