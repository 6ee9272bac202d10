//! Upload dialog draft and the file payload it carries.

use std::fmt;
use std::path::Path;

use tracing::debug;

/// In-memory file selected for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct FileBlob {
    /// File name sent with the multipart part.
    pub name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
    /// Optional MIME type; the transport defaults to `application/octet-stream`.
    pub mime: Option<String>,
}

impl FileBlob {
    /// Creates a blob from a name and contents.
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            mime: None,
        }
    }

    /// Sets the MIME type.
    #[must_use]
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Reads a file from disk, naming the blob after the file name.
    ///
    /// # Errors
    ///
    /// Returns the IO error when the file cannot be read.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |name| name.to_string_lossy().into_owned());
        debug!(path = %path.display(), bytes = bytes.len(), "read upload file");
        Ok(Self::new(name, bytes))
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true for a zero-byte file.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for FileBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileBlob")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .field("mime", &self.mime)
            .finish()
    }
}

/// Form contents while the upload dialog is open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingUploadDraft {
    /// Selected file, if any.
    pub file: Option<FileBlob>,
    /// Entered title.
    pub title: String,
}

impl PendingUploadDraft {
    /// Returns the file and trimmed title when both are present.
    ///
    /// # Errors
    ///
    /// Returns a static description of the first missing field.
    pub fn ready(&self) -> Result<(&FileBlob, &str), &'static str> {
        let title = self.title.trim();
        match (&self.file, title.is_empty()) {
            (None, _) => Err("no file selected"),
            (Some(_), true) => Err("title is empty"),
            (Some(file), false) => Ok((file, title)),
        }
    }
}
