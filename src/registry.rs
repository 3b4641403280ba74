use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::metadata::MetadataRecord;

pub type SharedRegistry = Arc<RwLock<UploadRegistry>>;

#[derive(Debug, Clone, Serialize)]
pub struct UploadEntry {
    pub id: String,
    pub path: PathBuf,
    pub metadata: MetadataRecord,
    pub preview_url: String,
    pub filename: String,
}

/// Photos uploaded during this process run, in upload order.
#[derive(Debug, Default)]
pub struct UploadRegistry {
    entries: Vec<UploadEntry>,
}

impl UploadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedRegistry {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Add an entry; an existing entry with the same id is replaced in place.
    pub fn insert(&mut self, entry: UploadEntry) {
        match self.entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<UploadEntry> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&UploadEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn get_all(&self) -> &[UploadEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
