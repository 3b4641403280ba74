use async_trait::async_trait;
use tracing::info;

use crate::notifier::{ChatProvider, NotifyError, PhotoUpload, TextMessage};

/// Logs notifications instead of delivering them.
pub struct NullProvider;

impl NullProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatProvider for NullProvider {
    async fn upload_photo(&self, upload: PhotoUpload) -> Result<(), NotifyError> {
        info!(
            "NULL CHAT PROVIDER - Would upload photo:\n\
             Channel: {}\n\
             File: {} ({} bytes)\n\
             Caption:\n{}",
            upload.channel,
            upload.file_name,
            upload.bytes.len(),
            upload.caption
        );
        Ok(())
    }

    async fn post_message(&self, message: TextMessage) -> Result<(), NotifyError> {
        info!(
            "NULL CHAT PROVIDER - Would post message to {}: {}",
            message.channel, message.text
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "Null Chat Provider (Logging Only)"
    }
}
