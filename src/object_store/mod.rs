mod client;
mod file;
mod local;
mod migration;
mod thumbor;

pub use client::ThumborClient;
pub use file::ThumborFile;
pub use local::{FileSystemStorage, LocalFile};
pub use migration::MigrationStorage;
pub use thumbor::ThumborStorage;

use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),
    #[error("Thumbor rejected upload ({status}): {reason}")]
    Post { status: u16, reason: String },
    #[error("Routing error: {0}")]
    Routing(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
    #[error("Transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
}

impl FromStr for OpenMode {
    type Err = ObjectStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r" | "rb" => Ok(OpenMode::Read),
            "w" | "wb" => Ok(OpenMode::Write),
            other => Err(ObjectStoreError::Unsupported(format!(
                "open mode '{other}'"
            ))),
        }
    }
}

/// An opened object from either backend.
pub enum StoredFile {
    Thumbor(ThumborFile),
    Local(LocalFile),
}

impl StoredFile {
    pub fn name(&self) -> &str {
        match self {
            StoredFile::Thumbor(f) => f.name(),
            StoredFile::Local(f) => f.name(),
        }
    }

    pub async fn read(&mut self) -> Result<Bytes, ObjectStoreError> {
        match self {
            StoredFile::Thumbor(f) => f.read().await,
            StoredFile::Local(f) => f.read().await,
        }
    }

    pub async fn write(&mut self, content: Bytes) -> Result<(), ObjectStoreError> {
        match self {
            StoredFile::Thumbor(f) => f.write(content).await.map(|_| ()),
            StoredFile::Local(f) => f.write(content).await,
        }
    }

    pub async fn size(&mut self) -> Result<u64, ObjectStoreError> {
        match self {
            StoredFile::Thumbor(f) => f.size().await,
            StoredFile::Local(f) => f.size().await,
        }
    }

    pub fn close(&mut self) {
        match self {
            StoredFile::Thumbor(f) => f.close(),
            StoredFile::Local(f) => f.close(),
        }
    }
}

/// Operations the application performs on stored objects.
/// Names are the strings persisted by the application, not backend paths.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store content and return the name to persist.
    async fn save(&self, name: &str, content: Bytes) -> Result<String, ObjectStoreError>;
    async fn open(&self, name: &str, mode: OpenMode) -> Result<StoredFile, ObjectStoreError>;
    async fn delete(&self, name: &str) -> Result<(), ObjectStoreError>;
    async fn exists(&self, name: &str) -> Result<bool, ObjectStoreError>;
    async fn size(&self, name: &str) -> Result<u64, ObjectStoreError>;
    async fn get_available_name(&self, name: &str) -> Result<String, ObjectStoreError>;
    fn url(&self, name: &str) -> Result<String, ObjectStoreError>;

    /// Filesystem path, for backends that have one.
    fn path(&self, name: &str) -> Result<PathBuf, ObjectStoreError> {
        Err(ObjectStoreError::Routing(format!(
            "{name} has no filesystem path"
        )))
    }

    /// Thumbor key, for backends that have one.
    fn key(&self, name: &str) -> Result<String, ObjectStoreError> {
        Err(ObjectStoreError::Routing(format!("{name} has no Thumbor key")))
    }
}
