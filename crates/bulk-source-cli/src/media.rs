use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use bulk_source::{FileId, MaterializeError, MediaMaterializer};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Downloads remote files into a local directory, named by the SHA-256 of
/// their URL. The file path is the [`FileId`].
pub struct DownloadMaterializer {
    client: reqwest::Client,
    dir: PathBuf,
}

impl DownloadMaterializer {
    pub fn new(dir: PathBuf, request_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent("bulk-source")
            .build()?;
        Ok(Self { client, dir })
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        self.dir.join(format!("{:x}", hasher.finalize()))
    }
}

#[async_trait]
impl MediaMaterializer for DownloadMaterializer {
    async fn materialize(&self, url: &str) -> Result<FileId, MaterializeError> {
        let path = self.path_for(url);
        let file_id = FileId::new(path.display().to_string());

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!(%url, path = %path.display(), "media already downloaded");
            return Ok(file_id);
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MaterializeError(e.to_string()))?;
        if !response.status().is_success() {
            return Err(MaterializeError(format!("HTTP {}", response.status())));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| MaterializeError(e.to_string()))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| MaterializeError(format!("{}: {e}", self.dir.display())))?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| MaterializeError(format!("{}: {e}", path.display())))?;

        debug!(%url, path = %path.display(), bytes = bytes.len(), "downloaded media");
        Ok(file_id)
    }
}
