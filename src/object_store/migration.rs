use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use super::{FileSystemStorage, ObjectStoreError, OpenMode, Storage, StoredFile, ThumborStorage};
use crate::config::Config;
use crate::name;

/// Storage for a gradual move from the local filesystem to Thumbor.
///
/// New content always goes to Thumbor. Existing names keep being served by
/// whichever backend their shape points to, so a name never changes backend.
pub struct MigrationStorage {
    thumbor: Arc<dyn Storage>,
    local: Arc<dyn Storage>,
}

impl MigrationStorage {
    pub fn new(thumbor: Arc<dyn Storage>, local: Arc<dyn Storage>) -> Self {
        Self { thumbor, local }
    }

    pub fn from_config(config: &Config) -> Result<Self, ObjectStoreError> {
        let thumbor = ThumborStorage::new(&config.thumbor)?;
        let local = FileSystemStorage::from_config(&config.local)?;
        Ok(Self::new(Arc::new(thumbor), Arc::new(local)))
    }

    pub fn is_thumbor(&self, name: &str) -> bool {
        name::is_remote(name)
    }

    fn backend(&self, name: &str) -> &dyn Storage {
        if self.is_thumbor(name) {
            self.thumbor.as_ref()
        } else {
            self.local.as_ref()
        }
    }
}

#[async_trait]
impl Storage for MigrationStorage {
    async fn save(&self, name: &str, content: Bytes) -> Result<String, ObjectStoreError> {
        self.thumbor.save(name, content).await
    }

    async fn open(&self, name: &str, mode: OpenMode) -> Result<StoredFile, ObjectStoreError> {
        self.backend(name).open(name, mode).await
    }

    async fn delete(&self, name: &str) -> Result<(), ObjectStoreError> {
        self.backend(name).delete(name).await
    }

    async fn exists(&self, name: &str) -> Result<bool, ObjectStoreError> {
        self.backend(name).exists(name).await
    }

    async fn size(&self, name: &str) -> Result<u64, ObjectStoreError> {
        self.backend(name).size(name).await
    }

    async fn get_available_name(&self, name: &str) -> Result<String, ObjectStoreError> {
        self.thumbor.get_available_name(name).await
    }

    fn url(&self, name: &str) -> Result<String, ObjectStoreError> {
        self.backend(name).url(name)
    }

    fn path(&self, name: &str) -> Result<PathBuf, ObjectStoreError> {
        if self.is_thumbor(name) {
            return Err(ObjectStoreError::Routing(format!(
                "{name} is stored on Thumbor and has no filesystem path"
            )));
        }
        self.local.path(name)
    }

    fn key(&self, name: &str) -> Result<String, ObjectStoreError> {
        if !self.is_thumbor(name) {
            return Err(ObjectStoreError::Routing(format!(
                "{name} is stored locally and has no Thumbor key"
            )));
        }
        self.thumbor.key(name)
    }
}
