//! Uploaded file handles.
//!
//! An [`UploadSource`] is what the file picker hands over: a name, the type
//! the client claims, a size, and asynchronous access to the content.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncReadExt;

#[async_trait]
pub trait UploadSource: Send + Sync {
    fn file_name(&self) -> &str;

    /// Content type asserted by the client, not verified.
    fn declared_mime(&self) -> &str;

    fn size(&self) -> u64;

    /// Reads at most `len` leading bytes.
    async fn read_head(&self, len: usize) -> io::Result<Vec<u8>>;

    /// Reads the content from the start, stopping after `limit` bytes.
    async fn read_all(&self, limit: u64) -> io::Result<Vec<u8>>;
}

/// An upload whose content is already in memory.
#[derive(Debug, Clone)]
pub struct MemoryUpload {
    file_name: String,
    declared_mime: String,
    bytes: Vec<u8>,
}

impl MemoryUpload {
    pub fn new(
        file_name: impl Into<String>,
        declared_mime: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            declared_mime: declared_mime.into(),
            bytes: bytes.into(),
        }
    }
}

#[async_trait]
impl UploadSource for MemoryUpload {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn declared_mime(&self) -> &str {
        &self.declared_mime
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    async fn read_head(&self, len: usize) -> io::Result<Vec<u8>> {
        Ok(self.bytes[..self.bytes.len().min(len)].to_vec())
    }

    async fn read_all(&self, limit: u64) -> io::Result<Vec<u8>> {
        let end = usize::try_from(limit).map_or(self.bytes.len(), |l| l.min(self.bytes.len()));
        Ok(self.bytes[..end].to_vec())
    }
}

/// An upload backed by a file on disk.
///
/// The declared type is guessed from the extension the same way a browser
/// fills in `File.type`, and is empty when the extension is unknown.
#[derive(Debug, Clone)]
pub struct LocalFileUpload {
    path: PathBuf,
    file_name: String,
    declared_mime: String,
    size: u64,
}

impl LocalFileUpload {
    /// # Errors
    ///
    /// Returns an error if the file metadata cannot be read.
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = tokio::fs::metadata(&path).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let declared_mime = mime_guess::from_path(&path)
            .first_raw()
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            path,
            file_name,
            declared_mime,
            size: metadata.len(),
        })
    }

    #[must_use]
    pub fn with_declared_mime(mut self, mime: impl Into<String>) -> Self {
        self.declared_mime = mime.into();
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl UploadSource for LocalFileUpload {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn declared_mime(&self) -> &str {
        &self.declared_mime
    }

    fn size(&self) -> u64 {
        self.size
    }

    async fn read_head(&self, len: usize) -> io::Result<Vec<u8>> {
        let file = tokio::fs::File::open(&self.path).await?;
        let mut head = Vec::with_capacity(len);
        file.take(len as u64).read_to_end(&mut head).await?;
        Ok(head)
    }

    // the file may have changed since `open`, so the cached size is not trusted
    async fn read_all(&self, limit: u64) -> io::Result<Vec<u8>> {
        let file = tokio::fs::File::open(&self.path).await?;
        let mut bytes = Vec::new();
        file.take(limit).read_to_end(&mut bytes).await?;
        Ok(bytes)
    }
}
