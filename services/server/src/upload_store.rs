use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, instrument, warn};

/// Route prefix uploaded files are served under
pub const UPLOAD_ROUTE: &str = "/uploads";

/// Errors from the upload store
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Failed to create upload directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write upload: {0}")]
    Io(#[from] std::io::Error),
}

/// A file persisted by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    /// Name on disk, `<timestampMs>.<ext>`
    pub file_name: String,
    /// Relative reference returned to clients
    pub url: String,
    pub size_bytes: usize,
}

/// Append-only on-disk store for uploaded audio
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    /// Open the store, creating its directory if absent.
    ///
    /// An existing directory is fine; any other creation failure is returned
    /// and treated as fatal by the caller.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, UploadError> {
        let root = root.into();

        match fs::create_dir(&root).await {
            Ok(()) => info!(path = %root.display(), "Created upload directory"),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(path = %root.display(), "Upload directory already exists")
            }
            Err(source) => return Err(UploadError::CreateDir { path: root, source }),
        }

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist `bytes` under a fresh timestamp-derived name
    #[instrument(skip(self, bytes), fields(size_bytes = bytes.len()))]
    pub async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<StoredUpload, UploadError> {
        let mut timestamp_ms = Utc::now().timestamp_millis();

        loop {
            let file_name = stored_name(timestamp_ms, original_name);
            let path = self.root.join(&file_name);

            // create_new claims the name atomically, so concurrent uploads in the
            // same millisecond move on to the next one
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => {
                    write_claimed(file, &path, bytes).await?;

                    info!(file = %file_name, size_bytes = bytes.len(), "Upload stored");
                    return Ok(StoredUpload {
                        url: format!("{}/{}", UPLOAD_ROUTE, file_name),
                        file_name,
                        size_bytes: bytes.len(),
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(file = %file_name, "Upload name taken, trying next millisecond");
                    timestamp_ms += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Fill a freshly claimed file. On failure the partial file is removed so it
/// is never served.
async fn write_claimed<W>(mut writer: W, path: &Path, bytes: &[u8]) -> Result<(), UploadError>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        writer.write_all(bytes).await?;
        writer.flush().await
    }
    .await;

    if let Err(e) = written {
        drop(writer);
        if let Err(remove_err) = fs::remove_file(path).await {
            warn!(
                path = %path.display(),
                error = %remove_err,
                "Failed to remove partial upload"
            );
        }
        return Err(e.into());
    }

    Ok(())
}

/// `<timestampMs>.<ext>`, keeping the original extension when it is plain ASCII alphanumeric
pub fn stored_name(timestamp_ms: i64, original_name: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    match extension {
        Some(ext) => format!("{}.{}", timestamp_ms, ext),
        None => timestamp_ms.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Accepts nothing, failing every write
    struct BrokenDisk;

    impl AsyncWrite for BrokenDisk {
        fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, _: &[u8]) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::new(ErrorKind::Other, "disk full")))
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[test]
    fn test_stored_name_keeps_extension() {
        assert_eq!(stored_name(1700000000000, "song.mp3"), "1700000000000.mp3");
        assert_eq!(stored_name(5, "my.take.final.WAV"), "5.WAV");
    }

    #[test]
    fn test_stored_name_without_usable_extension() {
        assert_eq!(stored_name(5, "noext"), "5");
        assert_eq!(stored_name(5, ""), "5");
        assert_eq!(stored_name(5, "weird.m p3"), "5");
        assert_eq!(stored_name(5, "../../etc/passwd"), "5");
    }

    #[tokio::test]
    async fn test_open_creates_and_reopens_directory() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("uploads");

        let store = UploadStore::open(&root).await.unwrap();
        assert!(store.root().is_dir());

        // Already exists is not an error
        UploadStore::open(&root).await.unwrap();
    }

    #[tokio::test]
    async fn test_open_fails_when_parent_missing() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("missing").join("uploads");

        let result = UploadStore::open(&root).await;
        assert!(matches!(result, Err(UploadError::CreateDir { .. })));
    }

    #[tokio::test]
    async fn test_store_writes_file_and_returns_url() {
        let temp = tempfile::tempdir().unwrap();
        let store = UploadStore::open(temp.path()).await.unwrap();

        let stored = store.store("beat.m4a", b"audio bytes").await.unwrap();

        assert!(stored.file_name.ends_with(".m4a"));
        assert_eq!(stored.url, format!("/uploads/{}", stored.file_name));
        assert_eq!(stored.size_bytes, 11);
        let written = std::fs::read(temp.path().join(&stored.file_name)).unwrap();
        assert_eq!(written, b"audio bytes");
    }

    #[tokio::test]
    async fn test_same_millisecond_uploads_get_distinct_names() {
        let temp = tempfile::tempdir().unwrap();
        let store = UploadStore::open(temp.path()).await.unwrap();

        let mut names = Vec::new();
        for i in 0..5u8 {
            let stored = store.store("loop.wav", &[i]).await.unwrap();
            names.push(stored.file_name);
        }
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 5);
    }

    #[tokio::test]
    async fn test_failed_write_removes_claimed_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("1700000000000.mp3");
        std::fs::write(&path, b"").unwrap();

        let result = write_claimed(BrokenDisk, &path, b"audio bytes").await;

        assert!(matches!(result, Err(UploadError::Io(_))));
        assert!(!path.exists());
    }
}
