use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::image_store::ImageStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Default)]
pub struct FakeImageStore {
    objects: Mutex<BTreeMap<String, FakeObject>>,
    fail_uploads: AtomicBool,
}

impl FakeImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn objects(&self) -> BTreeMap<String, FakeObject> {
        self.objects.lock().clone()
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ImageStore for FakeImageStore {
    async fn put_object(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(anyhow!("storage is unavailable"));
        }

        self.objects.lock().insert(
            key.to_string(),
            FakeObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://images.test/{key}")
    }
}
