#[cfg(test)]
mod fake_image_store;
mod s3_image_store;

use crate::{ErrorCode, Result};
use async_trait::async_trait;

#[cfg(test)]
pub use fake_image_store::*;
pub use s3_image_store::*;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Object storage holding uploaded images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> anyhow::Result<()>;

    /// The public URL an object is served from.
    fn public_url(&self, key: &str) -> String;
}

/// Stores an uploaded image and returns the URL it can be fetched from.
///
/// Only png, jpg, jpeg and gif files are accepted, judged by the extension
/// of `file_name`. Each upload gets a unique key so names never collide.
pub async fn upload_image(
    store: &dyn ImageStore,
    file_name: &str,
    bytes: Vec<u8>,
) -> Result<String> {
    if bytes.is_empty() {
        Err(ErrorCode::NotFoundImage)?;
    }
    let content_type = image_content_type(file_name).ok_or(ErrorCode::MissMatchImageType)?;

    let key = format!("{}{}", uuid::Uuid::new_v4(), file_name);
    let len = bytes.len();
    if let Err(error) = store.put_object(&key, bytes, content_type).await {
        log::error!("failed to upload image {key}: {error:#}");
        Err(ErrorCode::ImageUploadFail)?;
    }

    tracing::info!(%key, len, "uploaded image");
    Ok(store.public_url(&key))
}

fn image_content_type(file_name: &str) -> Option<&'static str> {
    let (_, extension) = file_name.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();
    if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return None;
    }
    Some(match extension.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        _ => "image/jpeg",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_image_content_type() {
        assert_eq!(image_content_type("cat.png"), Some("image/png"));
        assert_eq!(image_content_type("cat.JPG"), Some("image/jpeg"));
        assert_eq!(image_content_type("archive.tar.gif"), Some("image/gif"));
        assert_eq!(image_content_type("notes.txt"), None);
        assert_eq!(image_content_type("png"), None);
    }

    #[tokio::test]
    async fn test_upload_image() {
        let store = FakeImageStore::new();

        let url = upload_image(&store, "cat.PNG", b"meow".to_vec())
            .await
            .unwrap();
        let objects = store.objects();
        assert_eq!(objects.len(), 1);
        let (key, object) = objects.into_iter().next().unwrap();
        assert!(key.ends_with("cat.PNG"));
        assert_eq!(object.bytes, b"meow");
        assert_eq!(object.content_type, "image/png");
        assert_eq!(url, store.public_url(&key));
    }

    #[tokio::test]
    async fn test_rejected_uploads_never_reach_the_store() {
        let store = FakeImageStore::new();

        let error = upload_image(&store, "notes.txt", b"text".to_vec())
            .await
            .unwrap_err();
        assert_eq!(error.code(), Some(ErrorCode::MissMatchImageType));

        let error = upload_image(&store, "cat.png", Vec::new())
            .await
            .unwrap_err();
        assert_eq!(error.code(), Some(ErrorCode::NotFoundImage));

        assert!(store.objects().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure() {
        let store = FakeImageStore::new();
        store.fail_uploads(true);

        let error = upload_image(&store, "cat.gif", b"gif".to_vec())
            .await
            .unwrap_err();
        assert_eq!(error.code(), Some(ErrorCode::ImageUploadFail));
    }
}
