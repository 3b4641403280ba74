use super::{UploadError, UploadForm, process_upload};
use crate::AppState;
use crate::registry::UploadEntry;
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

#[derive(Debug, Serialize)]
pub struct FileFailure {
    pub filename: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub uploaded: Vec<UploadEntry>,
    pub errors: Vec<FileFailure>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: UploadEntry,
    pub file_removed: bool,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

async fn read_multipart(
    multipart: &mut Multipart,
) -> Result<(UploadForm, Vec<(String, Vec<u8>)>), UploadError> {
    let mut form = UploadForm::default();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Multipart(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let filename = field.file_name().unwrap_or("upload.jpg").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| UploadError::Multipart(e.to_string()))?;
            files.push((filename, bytes.to_vec()));
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| UploadError::Multipart(e.to_string()))?;
        match name.as_str() {
            "name" => form.name = Some(value),
            "location" => form.location = Some(value),
            "tags" => form.add_tags(&value),
            "comment" => form.comment = Some(value),
            other => warn!("Ignoring unknown upload field: {}", other),
        }
    }

    Ok((form, files))
}

pub async fn upload_handler(
    State(app_state): State<AppState>,
    mut multipart: Multipart,
) -> Response {
    let (form, files) = match read_multipart(&mut multipart).await {
        Ok(parsed) => parsed,
        Err(e) => {
            error!("Failed to read upload: {}", e);
            return error_response(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    if files.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No files in upload");
    }

    let mut response = UploadResponse {
        uploaded: Vec::new(),
        errors: Vec::new(),
    };

    for (filename, bytes) in files {
        match process_upload(
            &app_state.store,
            app_state.font.clone(),
            app_state.config.app.compression_quality,
            bytes,
            &filename,
            &form,
        )
        .await
        {
            Ok(entry) => {
                app_state.registry.write().await.insert(entry.clone());
                response.uploaded.push(entry);
            }
            Err(e) => {
                error!("Upload of {} failed: {}", filename, e);
                response.errors.push(FileFailure {
                    filename,
                    error: e.to_string(),
                });
            }
        }
    }

    let status = if response.uploaded.is_empty() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };
    (status, Json(response)).into_response()
}

pub async fn list_handler(State(app_state): State<AppState>) -> Json<Vec<UploadEntry>> {
    let registry = app_state.registry.read().await;
    Json(registry.get_all().to_vec())
}

pub async fn delete_handler(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let Some(entry) = app_state.registry.write().await.remove(&id) else {
        return error_response(StatusCode::NOT_FOUND, format!("Unknown upload: {}", id));
    };

    // The entry stays removed even if the file could not be deleted
    let file_removed = match app_state.store.delete(&entry.path).await {
        Ok(()) => true,
        Err(e) => {
            error!("Registry entry {} removed but its file was not: {}", id, e);
            false
        }
    };

    let sidecar = app_state.store.metadata_path(&id);
    if let Err(e) = tokio::fs::remove_file(&sidecar).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!("Failed to delete metadata sidecar {:?}: {}", sidecar, e);
    }

    info!("Upload deleted: {} ({})", entry.filename, id);
    Json(DeleteResponse {
        deleted: entry,
        file_removed,
    })
    .into_response()
}

pub async fn export_handler(State(app_state): State<AppState>) -> Response {
    let paths: Vec<_> = {
        let registry = app_state.registry.read().await;
        registry.get_all().iter().map(|e| e.path.clone()).collect()
    };
    if paths.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No images to export");
    }

    let zip_name = format!("site_report_{}.zip", crate::util::timestamp("%Y%m%d_%H%M%S"));
    let upload_dir = app_state.store.upload_dir();
    let zip_path = upload_dir
        .parent()
        .unwrap_or(upload_dir)
        .join(&zip_name);

    let store = app_state.store.clone();
    let task_path = zip_path.clone();
    let summary =
        match tokio::task::spawn_blocking(move || store.archive_zip(&paths, &task_path)).await {
            Ok(Ok(summary)) => summary,
            Ok(Err(e)) => {
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
            }
            Err(e) => {
                error!("ZIP task failed: {}", e);
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "ZIP task failed");
            }
        };

    for missing in &summary.skipped {
        error!("Registered photo is missing on disk: {}", missing);
    }

    let read = tokio::fs::read(&zip_path).await;
    if let Err(e) = tokio::fs::remove_file(&zip_path).await {
        warn!("Failed to remove exported ZIP {:?}: {}", zip_path, e);
    }

    match read {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/zip".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", zip_name),
                ),
                (
                    header::HeaderName::from_static("x-missing-files"),
                    summary.skipped.len().to_string(),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to read ZIP {:?}: {}", zip_path, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

pub async fn notify_handler(State(app_state): State<AppState>) -> Response {
    let (paths, records): (Vec<_>, Vec<_>) = {
        let registry = app_state.registry.read().await;
        registry
            .get_all()
            .iter()
            .map(|e| (e.path.clone(), e.metadata.clone()))
            .unzip()
    };
    if paths.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No images to send");
    }

    let notifier_config = app_state.notifier.config();
    if !notifier_config.enabled || !notifier_config.has_credentials() {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Notifications are not enabled or not configured",
        );
    }

    // Every photo is attempted; failures are counted, not fatal
    let report = app_state.notifier.send_bulk(&paths, Some(records.as_slice())).await;
    Json(report).into_response()
}

pub async fn config_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    let config = &app_state.config;
    Json(json!({
        "name": config.app.name,
        "tags": config.app.tags,
        "location_presets": config.app.location_presets,
        "notifications_enabled": config.notifier.enabled,
    }))
}
