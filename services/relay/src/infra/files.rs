use std::path::{Path, PathBuf};

use anyhow::Context as _;
use bytes::Bytes;
use uuid::Uuid;

use crate::domain::repository::RelayFileStore;
use crate::error::RelayServiceError;

/// Attachments stored under the media root on local disk.
#[derive(Clone)]
pub struct DiskFileStore {
    pub root: PathBuf,
}

impl DiskFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Keep only the final path component, so uploads cannot escape `dir`.
fn stored_name(file_name: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("upload");
    format!("{}_{}", Uuid::new_v4().simple(), base)
}

impl RelayFileStore for DiskFileStore {
    async fn save(&self, dir: &str, file_name: &str, bytes: Bytes) -> Result<String, RelayServiceError> {
        let dir_path = self.root.join(dir);
        tokio::fs::create_dir_all(&dir_path)
            .await
            .with_context(|| format!("create media dir {}", dir_path.display()))?;
        let name = stored_name(file_name);
        tokio::fs::write(dir_path.join(&name), &bytes)
            .await
            .with_context(|| format!("write media file {name}"))?;
        Ok(format!("{dir}/{name}"))
    }

    async fn read(&self, path: &str) -> Result<Bytes, RelayServiceError> {
        let full = self.root.join(path);
        let data = tokio::fs::read(&full)
            .await
            .with_context(|| format!("read media file {}", full.display()))?;
        Ok(Bytes::from(data))
    }
}
