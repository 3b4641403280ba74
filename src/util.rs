use std::path::Path;

/// Characters most filesystems reject in a file name.
const INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const MAX_FILENAME_BYTES: usize = 255;
pub const MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;
const UPLOAD_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp"];

pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current local time in the given `strftime` format.
pub fn timestamp(format: &str) -> String {
    chrono::Local::now().format(format).to_string()
}

pub fn today_folder_name() -> String {
    timestamp("%Y%m%d")
}

/// Replace characters that are unsafe in file names with `_` and cap the
/// length, keeping the extension intact.
pub fn safe_filename(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .map(|c| {
            if INVALID_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    if cleaned.len() <= MAX_FILENAME_BYTES {
        return cleaned;
    }

    let (stem, ext) = match cleaned.rfind('.') {
        Some(pos) if pos > 0 => cleaned.split_at(pos),
        _ => (cleaned.as_str(), ""),
    };
    let budget = MAX_FILENAME_BYTES.saturating_sub(ext.len());
    let mut cut = budget.min(stem.len());
    while !stem.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{}", &stem[..cut], ext)
}

/// Whether an uploaded file looks like an image we accept.
pub fn is_valid_upload(filename: &str, size: u64) -> bool {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension {
        Some(ext) if UPLOAD_EXTENSIONS.contains(&ext.as_str()) => {
            size > 0 && size <= MAX_UPLOAD_BYTES
        }
        _ => false,
    }
}
