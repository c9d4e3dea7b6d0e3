//! Single-table DynamoDB layout:
//!
//! | item    | PK                 | SK                     |
//! |---------|--------------------|------------------------|
//! | photo   | `PHOTO`            | `PHOTO#{photo_id}`     |
//! | like    | `PHOTO#{photo_id}` | `LIKE#{user_id}`       |
//! | comment | `PHOTO#{photo_id}` | `COMMENT#{comment_id}` |

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;

use super::{CommentStore, LikeStore, PhotoStore};
use crate::comments::Comment;
use crate::error::StoreError;
use crate::likes::PhotoLike;
use crate::photos::{Photo, UpdatePhotoPayload};

const PHOTO_PK: &str = "PHOTO";
const PHOTO_PREFIX: &str = "PHOTO#";
const LIKE_PREFIX: &str = "LIKE#";
const COMMENT_PREFIX: &str = "COMMENT#";

type Item = HashMap<String, AttributeValue>;

#[derive(Clone, Debug)]
pub struct DynamoStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoStore {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        DynamoStore {
            client,
            table_name: table_name.into(),
        }
    }

    /// Every item under one photo partition whose SK starts with `prefix`.
    async fn query_children(&self, photo_id: &str, prefix: &str) -> Result<Vec<Item>, StoreError> {
        self.client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
            .expression_attribute_values(":pk", AttributeValue::S(photo_pk(photo_id)))
            .expression_attribute_values(":sk_prefix", AttributeValue::S(prefix.to_string()))
            .into_paginator()
            .items()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await
            .map_err(|e| StoreError::Backend(format!("DynamoDB query error: {}", e)))
    }

    /// Every item in the table whose SK starts with `prefix`.
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<Item>, StoreError> {
        self.client
            .scan()
            .table_name(&self.table_name)
            .filter_expression("begins_with(SK, :sk_prefix)")
            .expression_attribute_values(":sk_prefix", AttributeValue::S(prefix.to_string()))
            .into_paginator()
            .items()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await
            .map_err(|e| StoreError::Backend(format!("DynamoDB scan error: {}", e)))
    }

    async fn set_count(&self, photo_id: &str, attr: &str, count: u32) -> Result<(), StoreError> {
        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(PHOTO_PK.to_string()))
            .key("SK", AttributeValue::S(photo_sk(photo_id)))
            .update_expression("SET #count = :count")
            .condition_expression("attribute_exists(SK)")
            .expression_attribute_names("#count", attr)
            .expression_attribute_values(":count", AttributeValue::N(count.to_string()))
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception()) =>
            {
                Err(StoreError::Backend(format!("photo {} no longer exists", photo_id)))
            }
            Err(e) => Err(StoreError::Backend(format!("DynamoDB update_item error: {}", e))),
        }
    }

    async fn delete_key(&self, pk: String, sk: String) -> Result<(), StoreError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(pk))
            .key("SK", AttributeValue::S(sk))
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("DynamoDB delete_item error: {}", e)))?;
        Ok(())
    }

    async fn get_key(&self, pk: String, sk: String) -> Result<Option<Item>, StoreError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(pk))
            .key("SK", AttributeValue::S(sk))
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("DynamoDB get_item error: {}", e)))?;
        Ok(result.item)
    }
}

#[async_trait]
impl PhotoStore for DynamoStore {
    async fn get_photo(&self, photo_id: &str) -> Result<Option<Photo>, StoreError> {
        self.get_key(PHOTO_PK.to_string(), photo_sk(photo_id))
            .await?
            .map(|item| photo_from_item(&item))
            .transpose()
    }

    async fn list_photos(&self) -> Result<Vec<Photo>, StoreError> {
        let items = self
            .client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
            .expression_attribute_values(":pk", AttributeValue::S(PHOTO_PK.to_string()))
            .expression_attribute_values(":sk_prefix", AttributeValue::S(PHOTO_PREFIX.to_string()))
            .into_paginator()
            .items()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await
            .map_err(|e| StoreError::Backend(format!("DynamoDB query error: {}", e)))?;

        items.iter().map(photo_from_item).collect()
    }

    async fn put_photo(&self, photo: &Photo) -> Result<(), StoreError> {
        let mut builder = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .item("PK", AttributeValue::S(PHOTO_PK.to_string()))
            .item("SK", AttributeValue::S(photo_sk(&photo.id)))
            .item("title", AttributeValue::S(photo.title.clone()))
            .item("image_key", AttributeValue::S(photo.image_key.clone()))
            .item("uploaded_by", AttributeValue::S(photo.uploaded_by.clone()))
            .item("like_count", AttributeValue::N(photo.like_count.to_string()))
            .item("comment_count", AttributeValue::N(photo.comment_count.to_string()))
            .item("created_at", AttributeValue::S(photo.created_at.clone()))
            .item("updated_at", AttributeValue::S(photo.updated_at.clone()));

        if let Some(description) = &photo.description {
            builder = builder.item("description", AttributeValue::S(description.clone()));
        }

        builder
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("DynamoDB put_item error: {}", e)))?;
        Ok(())
    }

    async fn update_photo(
        &self,
        photo_id: &str,
        patch: &UpdatePhotoPayload,
        updated_at: &str,
    ) -> Result<(), StoreError> {
        let mut update_expr = vec!["updated_at = :updated_at"];
        let mut expr_values = HashMap::new();
        expr_values.insert(
            ":updated_at".to_string(),
            AttributeValue::S(updated_at.to_string()),
        );

        if let Some(title) = &patch.title {
            update_expr.push("title = :title");
            expr_values.insert(":title".to_string(), AttributeValue::S(title.clone()));
        }

        if let Some(description) = &patch.description {
            update_expr.push("description = :description");
            expr_values.insert(
                ":description".to_string(),
                AttributeValue::S(description.clone()),
            );
        }

        let mut builder = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(PHOTO_PK.to_string()))
            .key("SK", AttributeValue::S(photo_sk(photo_id)))
            .update_expression(format!("SET {}", update_expr.join(", ")))
            .condition_expression("attribute_exists(SK)");

        for (k, v) in expr_values {
            builder = builder.expression_attribute_values(k, v);
        }

        builder
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("DynamoDB update_item error: {}", e)))?;
        Ok(())
    }

    async fn delete_photo(&self, photo_id: &str) -> Result<(), StoreError> {
        self.delete_key(PHOTO_PK.to_string(), photo_sk(photo_id)).await
    }

    async fn set_like_count(&self, photo_id: &str, count: u32) -> Result<(), StoreError> {
        self.set_count(photo_id, "like_count", count).await
    }

    async fn set_comment_count(&self, photo_id: &str, count: u32) -> Result<(), StoreError> {
        self.set_count(photo_id, "comment_count", count).await
    }
}

#[async_trait]
impl LikeStore for DynamoStore {
    async fn get_like(
        &self,
        photo_id: &str,
        user_id: &str,
    ) -> Result<Option<PhotoLike>, StoreError> {
        self.get_key(photo_pk(photo_id), like_sk(user_id))
            .await?
            .map(|item| like_from_item(&item))
            .transpose()
    }

    async fn create_like(&self, like: &PhotoLike) -> Result<(), StoreError> {
        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .item("PK", AttributeValue::S(photo_pk(&like.photo_id)))
            .item("SK", AttributeValue::S(like_sk(&like.user_id)))
            .item("photo_id", AttributeValue::S(like.photo_id.clone()))
            .item("user_id", AttributeValue::S(like.user_id.clone()))
            .item("created_at", AttributeValue::S(like.created_at.clone()))
            .condition_expression("attribute_not_exists(SK)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception()) =>
            {
                Err(StoreError::Conflict)
            }
            Err(e) => Err(StoreError::Backend(format!("DynamoDB put_item error: {}", e))),
        }
    }

    async fn delete_like(&self, photo_id: &str, user_id: &str) -> Result<(), StoreError> {
        // DeleteItem on a missing key succeeds, which is what the trait promises.
        self.delete_key(photo_pk(photo_id), like_sk(user_id)).await
    }

    async fn list_likes(&self, photo_id: &str) -> Result<Vec<PhotoLike>, StoreError> {
        let items = self.query_children(photo_id, LIKE_PREFIX).await?;
        items.iter().map(like_from_item).collect()
    }

    async fn list_all_likes(&self) -> Result<Vec<PhotoLike>, StoreError> {
        let items = self.scan_prefix(LIKE_PREFIX).await?;
        items.iter().map(like_from_item).collect()
    }
}

#[async_trait]
impl CommentStore for DynamoStore {
    async fn get_comment(
        &self,
        photo_id: &str,
        comment_id: &str,
    ) -> Result<Option<Comment>, StoreError> {
        self.get_key(photo_pk(photo_id), comment_sk(comment_id))
            .await?
            .map(|item| comment_from_item(&item))
            .transpose()
    }

    async fn create_comment(&self, comment: &Comment) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .item("PK", AttributeValue::S(photo_pk(&comment.photo_id)))
            .item("SK", AttributeValue::S(comment_sk(&comment.id)))
            .item("photo_id", AttributeValue::S(comment.photo_id.clone()))
            .item("user_id", AttributeValue::S(comment.user_id.clone()))
            .item("username", AttributeValue::S(comment.username.clone()))
            .item("text", AttributeValue::S(comment.text.clone()))
            .item("created_at", AttributeValue::S(comment.created_at.clone()))
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("DynamoDB put_item error: {}", e)))?;
        Ok(())
    }

    async fn delete_comment(&self, photo_id: &str, comment_id: &str) -> Result<(), StoreError> {
        self.delete_key(photo_pk(photo_id), comment_sk(comment_id)).await
    }

    async fn list_comments(&self, photo_id: &str) -> Result<Vec<Comment>, StoreError> {
        let items = self.query_children(photo_id, COMMENT_PREFIX).await?;
        items.iter().map(comment_from_item).collect()
    }

    async fn list_all_comments(&self) -> Result<Vec<Comment>, StoreError> {
        let items = self.scan_prefix(COMMENT_PREFIX).await?;
        items.iter().map(comment_from_item).collect()
    }
}

fn photo_pk(photo_id: &str) -> String {
    format!("{}{}", PHOTO_PREFIX, photo_id)
}

fn photo_sk(photo_id: &str) -> String {
    format!("{}{}", PHOTO_PREFIX, photo_id)
}

fn like_sk(user_id: &str) -> String {
    format!("{}{}", LIKE_PREFIX, user_id)
}

fn comment_sk(comment_id: &str) -> String {
    format!("{}{}", COMMENT_PREFIX, comment_id)
}

fn string_attr(item: &Item, name: &str) -> Option<String> {
    item.get(name)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
}

fn count_attr(item: &Item, name: &str) -> u32 {
    item.get(name)
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

/// Id carried in the sort key, e.g. `LIKE#u-1` -> `u-1`.
fn sk_suffix(item: &Item, prefix: &str) -> Result<String, StoreError> {
    string_attr(item, "SK")
        .as_deref()
        .and_then(|sk| sk.strip_prefix(prefix))
        .map(|id| id.to_string())
        .ok_or_else(|| StoreError::Malformed(format!("missing {} sort key", prefix)))
}

/// Photo id carried in the partition key of a child item.
fn pk_photo_id(item: &Item) -> Result<String, StoreError> {
    string_attr(item, "PK")
        .as_deref()
        .and_then(|pk| pk.strip_prefix(PHOTO_PREFIX))
        .map(|id| id.to_string())
        .ok_or_else(|| StoreError::Malformed("missing photo partition key".to_string()))
}

fn photo_from_item(item: &Item) -> Result<Photo, StoreError> {
    Ok(Photo {
        id: sk_suffix(item, PHOTO_PREFIX)?,
        title: string_attr(item, "title").unwrap_or_default(),
        description: string_attr(item, "description"),
        image_key: string_attr(item, "image_key").unwrap_or_default(),
        uploaded_by: string_attr(item, "uploaded_by").unwrap_or_default(),
        like_count: count_attr(item, "like_count"),
        comment_count: count_attr(item, "comment_count"),
        created_at: string_attr(item, "created_at").unwrap_or_default(),
        updated_at: string_attr(item, "updated_at").unwrap_or_default(),
    })
}

fn like_from_item(item: &Item) -> Result<PhotoLike, StoreError> {
    Ok(PhotoLike {
        photo_id: pk_photo_id(item)?,
        user_id: sk_suffix(item, LIKE_PREFIX)?,
        created_at: string_attr(item, "created_at").unwrap_or_default(),
    })
}

fn comment_from_item(item: &Item) -> Result<Comment, StoreError> {
    Ok(Comment {
        id: sk_suffix(item, COMMENT_PREFIX)?,
        photo_id: pk_photo_id(item)?,
        user_id: string_attr(item, "user_id").unwrap_or_default(),
        username: string_attr(item, "username").unwrap_or_default(),
        text: string_attr(item, "text").unwrap_or_default(),
        created_at: string_attr(item, "created_at").unwrap_or_default(),
    })
}
