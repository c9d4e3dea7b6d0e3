use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client as S3Client;

use super::MediaStore;
use crate::error::StoreError;

/// Photo bytes live in S3; callers only ever see presigned URLs.
#[derive(Clone, Debug)]
pub struct S3Media {
    client: S3Client,
    bucket: String,
    url_ttl: Duration,
}

impl S3Media {
    pub fn new(client: S3Client, bucket: impl Into<String>, url_ttl: Duration) -> Self {
        S3Media {
            client,
            bucket: bucket.into(),
            url_ttl,
        }
    }

    fn presigning(&self) -> Result<PresigningConfig, StoreError> {
        PresigningConfig::expires_in(self.url_ttl)
            .map_err(|e| StoreError::Backend(format!("Invalid presigning config: {}", e)))
    }
}

#[async_trait]
impl MediaStore for S3Media {
    async fn presign_get(&self, key: &str) -> Result<String, StoreError> {
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(self.presigning()?)
            .await
            .map_err(|e| StoreError::Backend(format!("S3 presign get_object error: {}", e)))?;
        Ok(request.uri().to_string())
    }

    async fn presign_put(&self, key: &str, content_type: &str) -> Result<String, StoreError> {
        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(self.presigning()?)
            .await
            .map_err(|e| StoreError::Backend(format!("S3 presign put_object error: {}", e)))?;
        Ok(request.uri().to_string())
    }

    async fn delete_object(&self, key: &str) -> Result<(), StoreError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("S3 delete_object error: {}", e)))?;
        Ok(())
    }
}
