use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use super::{ObjectStoreError, OpenMode, Storage, StoredFile, ThumborClient, ThumborFile};
use crate::config::ThumborConfig;
use crate::name::{self, Route};
use crate::signing::UrlSigner;

/// Storage backed entirely by Thumbor.
pub struct ThumborStorage {
    client: Arc<ThumborClient>,
    signer: UrlSigner,
}

impl ThumborStorage {
    pub fn new(config: &ThumborConfig) -> Result<Self, ObjectStoreError> {
        let client = ThumborClient::new(
            &config.rw_server,
            config.timeout_seconds.map(Duration::from_secs),
        )?;
        Ok(Self {
            client: Arc::new(client),
            signer: UrlSigner::new(&config.server, &config.security_key),
        })
    }

    pub fn client(&self) -> &Arc<ThumborClient> {
        &self.client
    }

    /// Handle on `name`. Nothing is requested until content is accessed.
    pub fn open_file(&self, name: &str, mode: OpenMode) -> ThumborFile {
        ThumborFile::new(name, mode, Arc::clone(&self.client))
    }

    /// Read-write URL of the original image.
    pub fn original_url(&self, name: &str) -> String {
        self.client.object_url(name)
    }

    /// Translate a signed public URL back to the read-write URL of its
    /// original, keeping anything after the key.
    pub fn rw_url_from_public(&self, public_url: &str) -> Result<String, ObjectStoreError> {
        let (key, extra) = self.signer.parse_public_url(public_url).ok_or_else(|| {
            ObjectStoreError::Routing(format!(
                "{public_url} is not a signed URL of {}",
                self.signer.server()
            ))
        })?;
        Ok(self.original_url(&format!("/image/{key}{extra}")))
    }
}

fn remote_key(name: &str) -> Result<&str, ObjectStoreError> {
    match name::classify(name) {
        Route::Remote(remote) => Ok(remote.key()),
        Route::Local => Err(ObjectStoreError::Routing(format!(
            "{name} is not a Thumbor name"
        ))),
    }
}

#[async_trait]
impl Storage for ThumborStorage {
    async fn save(&self, name: &str, content: Bytes) -> Result<String, ObjectStoreError> {
        let mut file = self.open_file(name, OpenMode::Write);
        let location = file.write(content).await?;
        // A saved name must keep routing to Thumbor
        if !name::is_remote(location) {
            return Err(ObjectStoreError::Transport(format!(
                "Thumbor returned unexpected Location {location} for {name}"
            )));
        }
        Ok(name::strip_leading_separator(location).to_string())
    }

    async fn open(&self, name: &str, mode: OpenMode) -> Result<StoredFile, ObjectStoreError> {
        Ok(StoredFile::Thumbor(self.open_file(name, mode)))
    }

    async fn delete(&self, name: &str) -> Result<(), ObjectStoreError> {
        self.open_file(name, OpenMode::Read).delete().await
    }

    /// Only names Thumbor handed back can exist there. Anything else is a
    /// name that has not been saved yet.
    async fn exists(&self, name: &str) -> Result<bool, ObjectStoreError> {
        match name::classify(name) {
            Route::Remote(remote) => self.client.exists(remote.name()).await,
            Route::Local => Ok(false),
        }
    }

    async fn size(&self, name: &str) -> Result<u64, ObjectStoreError> {
        self.open_file(name, OpenMode::Read).size().await
    }

    /// Thumbor picks a fresh random key on every upload, so any name is
    /// available.
    async fn get_available_name(&self, name: &str) -> Result<String, ObjectStoreError> {
        Ok(name.to_string())
    }

    fn url(&self, name: &str) -> Result<String, ObjectStoreError> {
        Ok(self.signer.public_url(remote_key(name)?))
    }

    fn key(&self, name: &str) -> Result<String, ObjectStoreError> {
        remote_key(name).map(str::to_string)
    }
}
