use crate::Config;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Failed to create upload directory: {0}")]
    UploadDirectoryCreationFailed(std::io::Error),

    #[error("Failed to create log directory: {0}")]
    LogDirectoryCreationFailed(std::io::Error),

    #[error("Notifier is enabled but its token or channel is not set")]
    NotifierCredentialsMissing,

    #[error("Compression quality {0} is outside 0-100")]
    InvalidCompressionQuality(u8),
}

impl StartupCheckError {
    /// Errors that leave the server unable to store photos.
    pub fn is_critical(&self) -> bool {
        matches!(self, StartupCheckError::UploadDirectoryCreationFailed(_))
    }
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    let upload_dir = &config.storage.upload_directory;
    match tokio::fs::create_dir_all(upload_dir).await {
        Ok(()) => info!("Upload directory ready: {:?}", upload_dir),
        Err(e) => {
            error!("Failed to create upload directory {:?}: {}", upload_dir, e);
            errors.push(StartupCheckError::UploadDirectoryCreationFailed(e));
        }
    }

    let daily_log_dir = config
        .storage
        .log_directory
        .join(crate::util::today_folder_name());
    match tokio::fs::create_dir_all(&daily_log_dir).await {
        Ok(()) => info!("Log directory ready: {:?}", daily_log_dir),
        Err(e) => {
            warn!("Failed to create log directory {:?}: {}", daily_log_dir, e);
            errors.push(StartupCheckError::LogDirectoryCreationFailed(e));
        }
    }

    if config.app.compression_quality > 100 {
        warn!(
            "Compression quality {} will be clamped to 100",
            config.app.compression_quality
        );
        errors.push(StartupCheckError::InvalidCompressionQuality(
            config.app.compression_quality,
        ));
    }

    if config.notifier.enabled {
        if config.notifier.has_credentials() {
            info!("Notifier enabled for channel {}", config.notifier.channel);
        } else {
            warn!("Notifier is enabled but the token or channel is not set");
            warn!("Set notifier.token and notifier.channel, or SLACK_TOKEN and SLACK_CHANNEL");
            errors.push(StartupCheckError::NotifierCredentialsMissing);
        }
    } else {
        info!("Notifier disabled");
    }

    match crate::overlay::detect_font_path() {
        Some(path) => info!("System font available for overlays: {:?}", path),
        None if config.overlay.font_paths.is_empty() => {
            warn!("No system font found, overlays will use the bundled font")
        }
        None => {}
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}
