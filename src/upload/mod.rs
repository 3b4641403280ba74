// Upload module - turns an uploaded file into an annotated, registered photo
mod handlers;

pub use handlers::{
    config_handler, delete_handler, export_handler, list_handler, notify_handler, upload_handler,
};

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::metadata;
use crate::overlay::{self, OverlayFont};
use crate::registry::UploadEntry;
use crate::storage::{self, FileStore, PHOTO_EXTENSION, StorageError};
use crate::util;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Not an accepted image file: {0}")]
    InvalidFile(String),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Malformed upload request: {0}")]
    Multipart(String),

    #[error("Image processing task failed: {0}")]
    TaskFailed(String),
}

/// Operator details sent along with the photos.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub name: Option<String>,
    pub location: Option<String>,
    pub tags: Vec<String>,
    pub comment: Option<String>,
}

impl UploadForm {
    /// Accepts repeated tag fields as well as comma separated lists.
    pub fn add_tags(&mut self, raw: &str) {
        self.tags.extend(
            raw.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        );
    }
}

/// Decode, annotate, encode and store one uploaded photo.
///
/// The returned entry is not yet registered; the caller decides when it
/// becomes visible.
pub async fn process_upload(
    store: &FileStore,
    font: Arc<OverlayFont>,
    quality: u8,
    bytes: Vec<u8>,
    filename: &str,
    form: &UploadForm,
) -> Result<UploadEntry, UploadError> {
    if !util::is_valid_upload(filename, bytes.len() as u64) {
        warn!("Rejected upload {:?} ({} bytes)", filename, bytes.len());
        return Err(UploadError::InvalidFile(filename.to_string()));
    }

    let record = metadata::build(
        form.name.as_deref(),
        form.location.as_deref(),
        Some(form.tags.clone()),
        form.comment.as_deref(),
    );

    let task_record = record.clone();
    let jpeg = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, UploadError> {
        let image = image::load_from_memory(&bytes)?;
        let annotated = overlay::annotate(&image, &task_record, &font);
        Ok(storage::encode_jpeg(&annotated, quality)?)
    })
    .await
    .map_err(|e| UploadError::TaskFailed(e.to_string()))??;

    let id = util::generate_id();
    let path = store.photo_path(&id);
    store.save(&jpeg, &path).await?;

    // The photo is what matters; a missing sidecar only loses the JSON copy
    if let Err(e) = metadata::save_json(&record, &store.metadata_path(&id)) {
        warn!("Metadata sidecar for {} not written: {}", id, e);
    }

    info!("Image uploaded: {} -> {:?} (id {})", filename, path, id);

    Ok(UploadEntry {
        preview_url: format!("/uploads/{}.{}", id, PHOTO_EXTENSION),
        filename: util::safe_filename(filename),
        id,
        path,
        metadata: record,
    })
}
