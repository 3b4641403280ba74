// Metadata module - builds, validates and persists photo annotations
mod error;
mod types;

pub use error::{MetadataError, ValidationError};
pub use types::*;

use serde_json::Value;
use std::path::Path;
use tracing::{error, info, warn};

fn or_default(value: Option<&str>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

/// Build a metadata record for a new upload.
///
/// Empty or missing inputs are replaced by their defaults and the timestamp
/// is always taken from the local clock.
pub fn build(
    user_name: Option<&str>,
    location: Option<&str>,
    tags: Option<Vec<String>>,
    comment: Option<&str>,
) -> MetadataRecord {
    MetadataRecord {
        user_name: or_default(user_name, DEFAULT_USER_NAME),
        location: or_default(location, DEFAULT_LOCATION),
        tags: tags.unwrap_or_default(),
        comment: comment.unwrap_or_default().to_string(),
        timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
    }
}

/// Check the required fields of a typed record.
pub fn validate(record: &MetadataRecord) -> Result<(), ValidationError> {
    let required = [
        ("user_name", &record.user_name),
        ("location", &record.location),
        ("timestamp", &record.timestamp),
    ];
    for (field, value) in required {
        if value.is_empty() {
            return Err(ValidationError::MissingField(field));
        }
    }
    Ok(())
}

/// Check untyped JSON, as read from disk or sent by a client.
pub fn validate_value(value: &Value) -> Result<(), ValidationError> {
    let object = value.as_object().ok_or(ValidationError::NotAnObject)?;

    for field in ["user_name", "location", "timestamp"] {
        let present = match object.get(field) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Bool(b)) => *b,
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
            Some(Value::Number(_)) => true,
        };
        if !present {
            return Err(ValidationError::MissingField(field));
        }
    }

    if let Some(tags) = object.get("tags")
        && !tags.is_array()
    {
        return Err(ValidationError::TagsNotSequence);
    }

    Ok(())
}

/// Write a record as indented JSON next to its photo.
pub fn save_json(record: &MetadataRecord, output_path: &Path) -> Result<(), MetadataError> {
    if let Err(e) = validate(record) {
        error!("Refusing to save invalid metadata: {}", e);
        return Err(e.into());
    }

    let write = || -> Result<(), MetadataError> {
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(output_path, json)?;
        Ok(())
    };

    match write() {
        Ok(()) => {
            info!("Metadata saved: {:?}", output_path);
            Ok(())
        }
        Err(e) => {
            error!("Failed to save metadata {:?}: {}", output_path, e);
            Err(e)
        }
    }
}

pub fn load_json(json_path: &Path) -> Result<MetadataRecord, MetadataError> {
    if !json_path.exists() {
        warn!("Metadata file does not exist: {:?}", json_path);
        return Err(MetadataError::NotFound(json_path.display().to_string()));
    }

    let content = std::fs::read_to_string(json_path).inspect_err(|e| {
        error!("Failed to read metadata {:?}: {}", json_path, e);
    })?;
    let value: Value = serde_json::from_str(&content).inspect_err(|e| {
        error!("Failed to parse metadata {:?}: {}", json_path, e);
    })?;

    if let Err(e) = validate_value(&value) {
        warn!("Invalid metadata in {:?}: {}", json_path, e);
        return Err(e.into());
    }

    Ok(serde_json::from_value(value)?)
}

/// Render the chat caption posted alongside a photo.
pub fn format_caption(record: Option<&MetadataRecord>) -> String {
    let Some(record) = record else {
        return "Site report photo".to_string();
    };

    if validate(record).is_err() {
        return "Metadata incomplete".to_string();
    }

    let tags = if record.tags.is_empty() {
        "none".to_string()
    } else {
        record.joined_tags()
    };

    let mut lines = vec![
        "📸 Site report photo".to_string(),
        format!("👷 Worker: {}", record.user_name),
        format!("📍 Location: {}", record.location),
        format!("🏷️ Tags: {}", tags),
        format!("🕒 Time: {}", record.timestamp),
    ];
    if record.has_comment() {
        lines.push(format!("💬 Comment: {}", record.comment));
    }

    lines.join("\n")
}
