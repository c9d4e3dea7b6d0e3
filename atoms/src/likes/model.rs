use serde::{Deserialize, Serialize};

/// "user likes photo". Identity is `(photo_id, user_id)`; existence is the signal.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PhotoLike {
    pub photo_id: String,
    pub user_id: String,
    pub created_at: String,
}

impl PhotoLike {
    pub fn new(photo_id: &str, user_id: &str) -> Self {
        PhotoLike {
            photo_id: photo_id.to_string(),
            user_id: user_id.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggle {
    pub is_liked: bool,
    pub like_count: u32,
}
