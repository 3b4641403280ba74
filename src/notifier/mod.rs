pub mod config;
pub mod error;
pub mod providers;
pub mod types;

pub use config::*;
pub use error::*;
pub use types::*;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::metadata::{self, MetadataRecord};

#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn upload_photo(&self, upload: PhotoUpload) -> Result<(), NotifyError>;
    async fn post_message(&self, message: TextMessage) -> Result<(), NotifyError>;
    fn name(&self) -> &str;
}

pub type DynChatProvider = Arc<dyn ChatProvider>;

pub fn create_provider(config: &NotifierConfig) -> Result<DynChatProvider, NotifyError> {
    match config.provider {
        ProviderKind::Slack => Ok(Arc::new(providers::slack::SlackProvider::new(config)?)),
        ProviderKind::Null => Ok(Arc::new(providers::null::NullProvider::new())),
    }
}

/// Sends report photos to the configured chat channel.
pub struct Notifier {
    config: NotifierConfig,
    provider: DynChatProvider,
    pacing: Duration,
}

impl Notifier {
    pub fn new(config: NotifierConfig, provider: DynChatProvider) -> Self {
        let pacing = Duration::from_millis(config.pacing_millis);
        Self {
            config,
            provider,
            pacing,
        }
    }

    pub fn from_config(config: NotifierConfig) -> Result<Self, NotifyError> {
        let provider = create_provider(&config)?;
        Ok(Self::new(config, provider))
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    fn check_ready(&self) -> Result<(), NotifyError> {
        if !self.config.enabled {
            warn!("Notifications are disabled; enable them in config.toml or with SLACK_ENABLED");
            return Err(NotifyError::Disabled);
        }
        if !self.config.has_credentials() {
            error!("Notifier token or channel is not configured");
            return Err(NotifyError::MissingCredentials);
        }
        Ok(())
    }

    /// Post one photo with a caption built from its metadata.
    pub async fn send_photo(
        &self,
        path: &Path,
        metadata: Option<&MetadataRecord>,
    ) -> Result<(), NotifyError> {
        self.check_ready()?;

        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            error!("Photo to send does not exist: {:?}", path);
            return Err(NotifyError::PhotoMissing(path.display().to_string()));
        }

        let result = async {
            let bytes = tokio::fs::read(path).await?;
            let upload = PhotoUpload {
                channel: self.config.channel.clone(),
                file_name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "photo.jpg".to_string()),
                bytes,
                caption: metadata::format_caption(metadata),
            };
            self.provider.upload_photo(upload).await
        }
        .await;

        match &result {
            Ok(()) => info!("Photo sent via {}: {:?}", self.provider.name(), path),
            Err(e) => error!("Failed to send photo {:?}: {}", path, e),
        }
        result
    }

    pub async fn send_text(&self, text: &str) -> Result<(), NotifyError> {
        self.check_ready()?;

        let message = TextMessage {
            channel: self.config.channel.clone(),
            text: text.to_string(),
        };
        let result = self.provider.post_message(message).await;
        match &result {
            Ok(()) => info!("Message sent via {}", self.provider.name()),
            Err(e) => error!("Failed to send message: {}", e),
        }
        result
    }

    /// Send photos one at a time, pausing after every attempt.
    ///
    /// Metadata is paired with paths by index when supplied. A failed photo
    /// is counted and the batch carries on.
    pub async fn send_bulk(
        &self,
        paths: &[PathBuf],
        metadata: Option<&[MetadataRecord]>,
    ) -> BulkReport {
        let mut report = BulkReport::default();

        for (i, path) in paths.iter().enumerate() {
            let record = metadata.and_then(|records| records.get(i));
            match self.send_photo(path, record).await {
                Ok(()) => report.succeeded += 1,
                Err(_) => report.failed += 1,
            }
            tokio::time::sleep(self.pacing).await;
        }

        info!(
            "Bulk send finished: {} succeeded, {} failed",
            report.succeeded, report.failed
        );
        report
    }

    pub async fn test_connection(&self) -> Result<(), NotifyError> {
        self.send_text("Site report system: connection test").await
    }
}
