use anyhow::{Context as _, Result};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;

use crate::image_store::ImageStore;

pub struct S3ImageStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    endpoint: Option<String>,
    region: Option<String>,
}

impl S3ImageStore {
    pub fn new(
        client: aws_sdk_s3::Client,
        bucket: String,
        endpoint: Option<String>,
        region: Option<String>,
    ) -> Self {
        Self {
            client,
            bucket,
            endpoint,
            region,
        }
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn put_object(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let content_length = bytes.len() as i64;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .content_length(content_length)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .with_context(|| format!("failed to put object {key} into {}", self.bucket))?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        match (&self.endpoint, &self.region) {
            (Some(endpoint), _) => {
                format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key)
            }
            (None, Some(region)) => {
                format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket, region, key)
            }
            (None, None) => format!("https://{}.s3.amazonaws.com/{}", self.bucket, key),
        }
    }
}
