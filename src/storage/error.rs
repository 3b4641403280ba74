use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("ZIP error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("{} of the requested files were missing", missing.len())]
    Incomplete { missing: Vec<String> },
}
