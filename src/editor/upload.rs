use anyhow::Result;
use async_trait::async_trait;

/// A binary asset picked by the user.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Stores a binary asset and returns a stable URL for it.
#[async_trait]
pub trait AssetUploader: Send + Sync {
    async fn upload(&self, file: UploadFile) -> Result<String>;
}
