// Storage module - photo files on local disk, ZIP export and housekeeping
mod error;
mod jpeg;

pub use error::StorageError;
pub use jpeg::encode_jpeg;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

pub const PHOTO_EXTENSION: &str = "jpg";
pub const METADATA_EXTENSION: &str = "json";
pub const LOG_FILE_NAME: &str = "site_report.log";

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Result of building a ZIP archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub added: usize,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    upload_dir: PathBuf,
}

/// Create the upload folder, the log folder and today's log subfolder.
pub fn ensure_folders(upload_dir: &Path, log_dir: &Path) -> Result<(), StorageError> {
    std::fs::create_dir_all(upload_dir)?;
    std::fs::create_dir_all(log_dir.join(crate::util::today_folder_name()))?;
    Ok(())
}

/// Open today's log file for appending, creating the dated folder if needed.
pub fn open_daily_log(log_dir: &Path) -> Result<File, StorageError> {
    let daily_dir = log_dir.join(crate::util::today_folder_name());
    std::fs::create_dir_all(&daily_dir)?;
    let file = File::options()
        .create(true)
        .append(true)
        .open(daily_dir.join(LOG_FILE_NAME))?;
    Ok(file)
}

impl FileStore {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn photo_path(&self, id: &str) -> PathBuf {
        self.upload_dir.join(format!("{}.{}", id, PHOTO_EXTENSION))
    }

    pub fn metadata_path(&self, id: &str) -> PathBuf {
        self.upload_dir.join(format!("{}.{}", id, METADATA_EXTENSION))
    }

    /// Write `bytes` to `dest`, creating parent folders and replacing any
    /// existing file.
    pub async fn save(&self, bytes: &[u8], dest: &Path) -> Result<(), StorageError> {
        let result = async {
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(dest, bytes).await
        }
        .await;

        match result {
            Ok(()) => {
                info!("Image saved: {:?} ({} bytes)", dest, bytes.len());
                Ok(())
            }
            Err(e) => {
                error!("Failed to save image {:?}: {}", dest, e);
                Err(e.into())
            }
        }
    }

    pub async fn delete(&self, path: &Path) -> Result<(), StorageError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            warn!("Image to delete does not exist: {:?}", path);
            return Err(StorageError::NotFound(path.display().to_string()));
        }

        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                info!("Image deleted: {:?}", path);
                Ok(())
            }
            Err(e) => {
                error!("Failed to delete image {:?}: {}", path, e);
                Err(e.into())
            }
        }
    }

    /// Every photo currently in the upload folder, in directory order.
    pub fn list_uploaded(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.upload_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| {
                entry.file_type().is_file()
                    && entry.path().extension().and_then(|e| e.to_str()) == Some(PHOTO_EXTENSION)
            })
            .map(|entry| entry.into_path())
            .collect()
    }

    /// Delete files in the upload folder last modified more than `days` ago.
    pub fn cleanup_older_than(&self, days: u64) -> usize {
        let Some(secs) = days.checked_mul(SECS_PER_DAY) else {
            info!("Cleanup skipped, no file can be older than {} days", days);
            return 0;
        };
        let threshold = SystemTime::now()
            .checked_sub(Duration::from_secs(secs))
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let mut count = 0;
        for entry in WalkDir::new(&self.upload_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let modified = match entry.metadata() {
                Ok(metadata) => match metadata.modified() {
                    Ok(modified) => modified,
                    Err(e) => {
                        warn!("Cannot read modification time of {:?}: {}", path, e);
                        continue;
                    }
                },
                Err(e) => {
                    warn!("Cannot stat {:?}: {}", path, e);
                    continue;
                }
            };

            if modified < threshold {
                match std::fs::remove_file(path) {
                    Ok(()) => {
                        info!("Deleted old file: {:?}", path);
                        count += 1;
                    }
                    Err(e) => error!("Failed to delete old file {:?}: {}", path, e),
                }
            }
        }

        info!("Cleanup removed {} files older than {} days", count, days);
        count
    }

    /// Move files into `archive_dir`, replacing same-named files there.
    ///
    /// Every path is attempted; missing sources are reported together.
    pub fn move_to_archive(
        &self,
        paths: &[PathBuf],
        archive_dir: &Path,
    ) -> Result<(), StorageError> {
        if let Err(e) = std::fs::create_dir_all(archive_dir) {
            error!("Failed to create archive folder {:?}: {}", archive_dir, e);
            return Err(e.into());
        }

        let mut missing = Vec::new();
        let mut last_error = None;
        for path in paths {
            if !path.exists() {
                warn!("File to move does not exist: {:?}", path);
                missing.push(path.display().to_string());
                continue;
            }
            let Some(file_name) = path.file_name() else {
                missing.push(path.display().to_string());
                continue;
            };
            let dest = archive_dir.join(file_name);

            if let Err(e) = move_file(path, &dest) {
                error!("Failed to move {:?} -> {:?}: {}", path, dest, e);
                last_error = Some(e);
                continue;
            }
            info!("Moved file: {:?} -> {:?}", path, dest);
        }

        if !missing.is_empty() {
            return Err(StorageError::Incomplete { missing });
        }
        match last_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Bundle files into a ZIP using only their base names.
    ///
    /// Missing inputs are skipped; an archive with no entries still counts
    /// as success.
    pub fn archive_zip(
        &self,
        paths: &[PathBuf],
        output_path: &Path,
    ) -> Result<ArchiveSummary, StorageError> {
        match write_zip(paths, output_path) {
            Ok(summary) => {
                info!(
                    "ZIP created: {:?} ({} added, {} skipped)",
                    output_path,
                    summary.added,
                    summary.skipped.len()
                );
                Ok(summary)
            }
            Err(e) => {
                error!("Failed to create ZIP {:?}: {}", output_path, e);
                Err(e)
            }
        }
    }
}

fn move_file(source: &Path, dest: &Path) -> std::io::Result<()> {
    if dest.exists() {
        std::fs::remove_file(dest)?;
    }
    match std::fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(_) => {
            // Different filesystems: copy then remove
            std::fs::copy(source, dest)?;
            std::fs::remove_file(source)
        }
    }
}

fn write_zip(paths: &[PathBuf], output_path: &Path) -> Result<ArchiveSummary, StorageError> {
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut zip = ZipWriter::new(BufWriter::new(File::create(output_path)?));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut summary = ArchiveSummary::default();
    for path in paths {
        let name = path.file_name().map(|n| n.to_string_lossy().to_string());
        let (true, Some(name)) = (path.is_file(), name) else {
            warn!("File to add to ZIP does not exist: {:?}", path);
            summary.skipped.push(path.display().to_string());
            continue;
        };

        zip.start_file(name.as_str(), options)?;
        let mut reader = BufReader::new(File::open(path)?);
        std::io::copy(&mut reader, &mut zip)?;
        debug!("Added to ZIP: {}", name);
        summary.added += 1;
    }

    zip.finish()?;
    Ok(summary)
}
