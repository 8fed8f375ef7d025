use async_trait::async_trait;
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use super::file::FileState;
use super::{ObjectStoreError, OpenMode, Storage, StoredFile};
use crate::config::LocalConfig;

/// Characters left untouched when turning a name into a URL path.
const URI_PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'/')
    .remove(b'~')
    .remove(b'!')
    .remove(b'*')
    .remove(b'(')
    .remove(b')')
    .remove(b'\'');

/// Local filesystem storage, serving files that predate the move to Thumbor.
pub struct FileSystemStorage {
    base_path: PathBuf,
    base_url: String,
}

impl FileSystemStorage {
    pub fn new<P: AsRef<Path>>(base_path: P, base_url: &str) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self {
            base_path,
            base_url: base_url.to_string(),
        })
    }

    pub fn from_config(config: &LocalConfig) -> Result<Self, std::io::Error> {
        Self::new(&config.location, &config.base_url)
    }

    /// Resolve a name under the root, refusing anything that would escape it.
    fn object_path(&self, name: &str) -> Result<PathBuf, ObjectStoreError> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if name.is_empty() || escapes {
            return Err(ObjectStoreError::InvalidName(name.to_string()));
        }
        Ok(self.base_path.join(relative))
    }

    pub fn open_file(&self, name: &str, mode: OpenMode) -> Result<LocalFile, ObjectStoreError> {
        Ok(LocalFile {
            name: name.to_string(),
            path: self.object_path(name)?,
            mode,
            state: FileState::Empty,
        })
    }
}

/// `photo.jpg` -> `photo_<suffix>.jpg`
fn alternative_name(name: &str, suffix: &str) -> String {
    let (dir, file_name) = match name.rsplit_once('/') {
        Some((dir, file_name)) => (Some(dir), file_name),
        None => (None, name),
    };
    let file_name = match file_name.split_once('.') {
        Some((stem, ext)) => format!("{stem}_{suffix}.{ext}"),
        None => format!("{file_name}_{suffix}"),
    };
    match dir {
        Some(dir) => format!("{dir}/{file_name}"),
        None => file_name,
    }
}

#[async_trait]
impl Storage for FileSystemStorage {
    async fn save(&self, name: &str, content: Bytes) -> Result<String, ObjectStoreError> {
        let name = self.get_available_name(&name.replace('\\', "/")).await?;
        let mut file = self.open_file(&name, OpenMode::Write)?;
        file.write(content).await?;
        debug!(%name, "saved file to local storage");
        Ok(name)
    }

    async fn open(&self, name: &str, mode: OpenMode) -> Result<StoredFile, ObjectStoreError> {
        let file = self.open_file(name, mode)?;
        if mode == OpenMode::Read && !file.path.is_file() {
            return Err(ObjectStoreError::NotFound(name.to_string()));
        }
        Ok(StoredFile::Local(file))
    }

    async fn delete(&self, name: &str) -> Result<(), ObjectStoreError> {
        let path = self.object_path(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            // Already gone
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, name: &str) -> Result<bool, ObjectStoreError> {
        let path = self.object_path(name)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn size(&self, name: &str) -> Result<u64, ObjectStoreError> {
        let path = self.object_path(name)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ObjectStoreError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_available_name(&self, name: &str) -> Result<String, ObjectStoreError> {
        let mut candidate = name.to_string();
        while self.exists(&candidate).await? {
            let suffix = uuid::Uuid::new_v4().simple().to_string();
            candidate = alternative_name(name, &suffix[..7]);
        }
        Ok(candidate)
    }

    fn url(&self, name: &str) -> Result<String, ObjectStoreError> {
        let encoded = utf8_percent_encode(name.trim_start_matches('/'), URI_PATH);
        Ok(format!("{}/{encoded}", self.base_url.trim_end_matches('/')))
    }

    fn path(&self, name: &str) -> Result<PathBuf, ObjectStoreError> {
        self.object_path(name)
    }
}

/// Handle on one file under the local root.
pub struct LocalFile {
    name: String,
    path: PathBuf,
    mode: OpenMode,
    state: FileState,
}

impl LocalFile {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&mut self) -> Result<Bytes, ObjectStoreError> {
        if let Some(data) = self.state.buffer() {
            return Ok(data.clone());
        }

        let data = match self.mode {
            OpenMode::Read => match tokio::fs::read(&self.path).await {
                Ok(data) => Bytes::from(data),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(ObjectStoreError::NotFound(self.name.clone()));
                }
                Err(e) => return Err(e.into()),
            },
            OpenMode::Write => Bytes::new(),
        };
        self.state = FileState::Buffered(data.clone());
        Ok(data)
    }

    pub async fn write(&mut self, content: Bytes) -> Result<(), ObjectStoreError> {
        if self.mode != OpenMode::Write {
            return Err(ObjectStoreError::Unsupported(format!(
                "{} is not opened for writing",
                self.name
            )));
        }
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, &content).await?;
        self.state = FileState::Buffered(content);
        Ok(())
    }

    pub async fn size(&mut self) -> Result<u64, ObjectStoreError> {
        Ok(self.read().await?.len() as u64)
    }

    pub fn close(&mut self) {
        self.state = FileState::Closed;
    }
}
