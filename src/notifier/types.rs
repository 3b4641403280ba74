use serde::{Deserialize, Serialize};

/// A photo and its caption, ready to hand to a provider.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub channel: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub caption: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextMessage {
    pub channel: String,
    pub text: String,
}

/// `{ok, error}` envelope returned by the chat service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BulkReport {
    pub succeeded: usize,
    pub failed: usize,
}

impl BulkReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}
