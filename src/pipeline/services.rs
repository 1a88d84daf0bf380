use async_trait::async_trait;
use std::sync::Arc;

/// The external systems a job talks to.
///
/// Each call returns a human-readable message on failure; the pipeline
/// stores it in [`JobContext::error`](crate::pipeline::JobContext::error).
#[async_trait]
pub trait JobServices: Send + Sync {
    /// Create the asset and return its id.
    async fn create_asset(&self) -> Result<String, String>;

    /// Upload the asset and return the URL it is reachable at.
    async fn upload_asset(&self, asset_id: &str) -> Result<String, String>;

    /// Tell the client where to find the uploaded asset.
    async fn email_client(&self, asset_id: &str, upload_url: &str) -> Result<(), String>;
}

#[async_trait]
impl<T: JobServices + ?Sized> JobServices for Arc<T> {
    async fn create_asset(&self) -> Result<String, String> {
        (**self).create_asset().await
    }

    async fn upload_asset(&self, asset_id: &str) -> Result<String, String> {
        (**self).upload_asset(asset_id).await
    }

    async fn email_client(&self, asset_id: &str, upload_url: &str) -> Result<(), String> {
        (**self).email_client(asset_id, upload_url).await
    }
}
