use serde::{Deserialize, Serialize};

pub const DEFAULT_USER_NAME: &str = "name unset";
pub const DEFAULT_LOCATION: &str = "location unset";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Operator-entered annotation attached to a single photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub user_name: String,
    pub location: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub comment: String,
    pub timestamp: String,
}

impl MetadataRecord {
    pub fn has_comment(&self) -> bool {
        !self.comment.is_empty()
    }

    /// Tags joined for display, empty when there are none.
    pub fn joined_tags(&self) -> String {
        self.tags.join(", ")
    }
}
