use serde::{Deserialize, Serialize};

/// Photo row. `like_count` and `comment_count` are cached aggregates of the
/// like and comment rows stored under the photo; the rows win when they disagree.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub image_key: String,
    pub uploaded_by: String,
    pub like_count: u32,
    pub comment_count: u32,
    pub created_at: String,
    pub updated_at: String,
}

/// Photo as returned to a caller: reconciled counts, a signed image URL and
/// whether the caller likes it.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PhotoView {
    #[serde(flatten)]
    pub photo: Photo,
    pub image_url: Option<String>,
    pub is_liked: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePhotoPayload {
    pub title: String,
    pub description: Option<String>,
    pub content_type: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePhotoPayload {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// A freshly created photo plus the URL the client uploads the image bytes to.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPhoto {
    pub photo: Photo,
    pub upload_url: String,
}

/// Outcome of a full count repair pass.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    pub photos_scanned: usize,
    pub photos_repaired: usize,
}
