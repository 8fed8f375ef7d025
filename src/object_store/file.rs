use std::sync::Arc;

use bytes::Bytes;

use super::{ObjectStoreError, OpenMode, ThumborClient};

/// Buffer state of an opened object.
#[derive(Debug, Clone)]
pub(crate) enum FileState {
    Empty,
    Buffered(Bytes),
    Closed,
}

impl FileState {
    pub(crate) fn buffer(&self) -> Option<&Bytes> {
        match self {
            FileState::Buffered(data) => Some(data),
            FileState::Empty | FileState::Closed => None,
        }
    }
}

/// Handle on one object stored on Thumbor.
///
/// Opening costs nothing: in read mode the content is fetched on first access
/// and kept until [`ThumborFile::close`]. In write mode the handle uploads once
/// and remembers the location Thumbor assigned.
pub struct ThumborFile {
    name: String,
    mode: OpenMode,
    state: FileState,
    location: Option<String>,
    client: Arc<ThumborClient>,
}

impl ThumborFile {
    pub fn new(name: &str, mode: OpenMode, client: Arc<ThumborClient>) -> Self {
        Self {
            name: name.to_string(),
            mode,
            state: FileState::Empty,
            location: None,
            client,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Location returned by Thumbor after a successful write.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn is_buffered(&self) -> bool {
        self.state.buffer().is_some()
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, FileState::Closed)
    }

    /// Upload `content` under this handle's name. A handle accepts one write.
    pub async fn write(&mut self, content: Bytes) -> Result<&str, ObjectStoreError> {
        if self.mode != OpenMode::Write {
            return Err(ObjectStoreError::Unsupported(format!(
                "{} is not opened for writing",
                self.name
            )));
        }
        if self.location.is_some() {
            return Err(ObjectStoreError::Unsupported(format!(
                "{} has already been written",
                self.name
            )));
        }

        let location = self.client.store(&self.name, content.clone()).await?;
        self.state = FileState::Buffered(content);
        Ok(self.location.insert(location).as_str())
    }

    /// Content of the object, fetched from Thumbor on first access in read
    /// mode. A write-mode handle only ever returns what it wrote.
    pub async fn read(&mut self) -> Result<Bytes, ObjectStoreError> {
        if let Some(data) = self.state.buffer() {
            return Ok(data.clone());
        }

        let data = match self.mode {
            OpenMode::Read => self.client.fetch(&self.name).await?,
            OpenMode::Write => Bytes::new(),
        };
        self.state = FileState::Buffered(data.clone());
        Ok(data)
    }

    /// Length of the content. Fetches it if it is not buffered yet.
    pub async fn size(&mut self) -> Result<u64, ObjectStoreError> {
        Ok(self.read().await?.len() as u64)
    }

    /// Drop the buffer. The next read fetches again.
    pub fn close(&mut self) {
        self.state = FileState::Closed;
    }

    /// Delete the object on Thumbor, whatever the buffer holds.
    pub async fn delete(&self) -> Result<(), ObjectStoreError> {
        self.client.delete(&self.name).await
    }
}
