//! Blob storage backed by a local directory: `<root>/<bucket>/<path>`.

use crate::store::BlobStore;
use async_trait::async_trait;
use hub_shared::HubError;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct DirBlobStore {
    root: PathBuf,
}

impl DirBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Only plain relative components are accepted
    fn resolve(&self, bucket: &str, path: &str) -> Result<PathBuf, HubError> {
        let relative = Path::new(bucket).join(path);
        let clean = relative.components().all(|c| matches!(c, Component::Normal(_)));
        if bucket.is_empty() || path.is_empty() || !clean {
            return Err(HubError::Blob(format!("invalid object path '{}/{}'", bucket, path)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for DirBlobStore {
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> Result<(), HubError> {
        let target = self.resolve(bucket, path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let size = bytes.len();
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&target).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                warn!("refusing to overwrite {}/{}", bucket, path);
                return Err(HubError::Blob(format!("object {}/{} already exists", bucket, path)));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(&bytes).await?;
        file.flush().await?;
        info!("stored {}/{} ({} bytes)", bucket, path, size);
        Ok(())
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>, HubError> {
        let target = self.resolve(bucket, path)?;
        match tokio::fs::read(&target).await {
            Ok(bytes) => {
                debug!("read {}/{} ({} bytes)", bucket, path, bytes.len());
                Ok(bytes)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(HubError::NotFound(format!("{}/{}", bucket, path)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), HubError> {
        for path in paths {
            let target = self.resolve(bucket, path)?;
            match tokio::fs::remove_file(&target).await {
                Ok(()) => info!("removed {}/{}", bucket, path),
                Err(e) if e.kind() == ErrorKind::NotFound => debug!("{}/{} already gone", bucket, path),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_download_remove() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = DirBlobStore::new(dir.path());
        blobs.upload("company-resources", "c1/1.pdf", b"hello".to_vec()).await.unwrap();
        assert_eq!(blobs.download("company-resources", "c1/1.pdf").await.unwrap(), b"hello");

        blobs.remove("company-resources", &["c1/1.pdf".to_string()]).await.unwrap();
        assert!(matches!(
            blobs.download("company-resources", "c1/1.pdf").await,
            Err(HubError::NotFound(_))
        ));
        blobs.remove("company-resources", &["c1/1.pdf".to_string()]).await.unwrap();
    }

    #[tokio::test]
    async fn test_upload_keeps_existing_object() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = DirBlobStore::new(dir.path());
        blobs.upload("company-resources", "c1/1.pdf", b"first".to_vec()).await.unwrap();

        let err = blobs.upload("company-resources", "c1/1.pdf", b"second".to_vec()).await.unwrap_err();
        assert!(matches!(err, HubError::Blob(_)));
        assert_eq!(blobs.download("company-resources", "c1/1.pdf").await.unwrap(), b"first");
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = DirBlobStore::new(dir.path());
        assert!(blobs.upload("b", "../outside", vec![1]).await.is_err());
        assert!(blobs.upload("b", "/abs", vec![1]).await.is_err());
    }
}
