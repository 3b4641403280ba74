use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod metadata;
pub mod notifier;
pub mod overlay;
pub mod registry;
pub mod startup_checks;
pub mod storage;
pub mod upload;
pub mod util;

use notifier::NotifierConfig;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub overlay: OverlaySettings,
    #[serde(default)]
    pub notifier: NotifierConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub name: String,
    /// JPEG quality for stored photos (0-100)
    pub compression_quality: u8,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub location_presets: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub upload_directory: PathBuf,
    pub log_directory: PathBuf,
    pub archive_directory: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OverlaySettings {
    /// Fonts tried before the platform defaults
    #[serde(default)]
    pub font_paths: Vec<PathBuf>,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            app: AppConfig {
                name: "Site Report".to_string(),
                compression_quality: 70,
                tags: strings(&[
                    "before work",
                    "in progress",
                    "after work",
                    "problem area",
                    "needs repair",
                    "review request",
                    "completion report",
                    "cleaning",
                    "safety measures",
                    "material delivery",
                    "other",
                ]),
                location_presets: strings(&[
                    "A-1F",
                    "A-2F",
                    "A-3F",
                    "B-1F",
                    "B-2F",
                    "B-3F",
                    "Exterior",
                    "Parking",
                    "Warehouse",
                ]),
            },
            storage: StorageConfig {
                upload_directory: PathBuf::from("data/uploaded"),
                log_directory: PathBuf::from("log"),
                archive_directory: PathBuf::from("data/archive"),
            },
            overlay: OverlaySettings::default(),
            notifier: NotifierConfig::default(),
        }
    }
}

use axum::{Router, extract::DefaultBodyLimit};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Largest multipart request accepted by the upload endpoint.
const MAX_REQUEST_BYTES: usize = 100 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: storage::FileStore,
    pub registry: registry::SharedRegistry,
    pub font: Arc<overlay::OverlayFont>,
    pub notifier: Arc<notifier::Notifier>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, notifier::NotifyError> {
        let store = storage::FileStore::new(config.storage.upload_directory.clone());
        let font = Arc::new(overlay::OverlayFont::resolve(&config.overlay.font_paths));
        let notifier = Arc::new(notifier::Notifier::from_config(config.notifier.clone())?);

        Ok(Self {
            config,
            store,
            registry: registry::UploadRegistry::shared(),
            font,
            notifier,
        })
    }
}

pub fn create_app(app_state: AppState) -> Router {
    let previews = ServeDir::new(app_state.store.upload_dir());

    Router::new()
        .route(
            "/api/uploads",
            axum::routing::get(upload::list_handler).post(upload::upload_handler),
        )
        .route(
            "/api/uploads/export",
            axum::routing::get(upload::export_handler),
        )
        .route(
            "/api/uploads/notify",
            axum::routing::post(upload::notify_handler),
        )
        .route(
            "/api/uploads/{id}",
            axum::routing::delete(upload::delete_handler),
        )
        .route("/api/config", axum::routing::get(upload::config_handler))
        .nest_service("/uploads", previews)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let method = request.method();
                    let uri = request.uri();
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    tracing::info_span!(
                        "http_request",
                        method = %method,
                        uri = %uri,
                        matched_path,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    let user_agent = request
                        .headers()
                        .get("user-agent")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");

                    tracing::info!(
                        target: "access_log",
                        method = %request.method(),
                        path = %request.uri().path(),
                        user_agent = %user_agent,
                        "request"
                    );
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            target: "access_log",
                            status = %response.status(),
                            latency_ms = %latency.as_millis(),
                            "response"
                        );
                    },
                ),
        )
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [app]
            name = "Test"
            compression_quality = 85
            tags = ["before", "after"]

            [storage]
            upload_directory = "/tmp/uploads"
            log_directory = "/tmp/log"
            archive_directory = "/tmp/archive"

            [notifier]
            enabled = true
            provider = "null"
            channel = "C1"
        "#;

        let config: Config = toml_edit::de::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.app.compression_quality, 85);
        assert_eq!(config.app.tags, vec!["before", "after"]);
        assert!(config.app.location_presets.is_empty());
        assert!(config.overlay.font_paths.is_empty());
        assert!(config.notifier.enabled);
        assert_eq!(config.notifier.provider, notifier::ProviderKind::Null);
        assert_eq!(config.notifier.pacing_millis, 1000);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.app.compression_quality, 70);
        assert_eq!(config.app.tags.len(), 11);
        assert!(config.app.location_presets.contains(&"A-1F".to_string()));
        assert!(!config.notifier.enabled);
    }
}
