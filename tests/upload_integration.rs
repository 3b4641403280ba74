use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use std::io::{Cursor, Read};
use tempfile::TempDir;
use site_report::{AppState, Config, create_app, metadata, notifier::ProviderKind};

/// Helper to create a test configuration rooted in a temp directory
fn create_test_config(temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.storage.upload_directory = temp_dir.path().join("data").join("uploaded");
    config.storage.log_directory = temp_dir.path().join("log");
    config.storage.archive_directory = temp_dir.path().join("data").join("archive");
    std::fs::create_dir_all(&config.storage.upload_directory).unwrap();

    config.notifier.enabled = true;
    config.notifier.provider = ProviderKind::Null;
    config.notifier.token = "xoxb-test".to_string();
    config.notifier.channel = "C123".to_string();
    config.notifier.pacing_millis = 0;
    config
}

fn create_test_server(config: Config) -> (TestServer, AppState) {
    let app_state = AppState::new(config).unwrap();
    let app = create_app(app_state.clone());
    let server = TestServer::new(app.into_make_service()).unwrap();
    (server, app_state)
}

fn test_image(format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(240, 180, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

fn upload_form(name: &str, location: &str, tags: &[&str], files: &[&str]) -> MultipartForm {
    let mut form = MultipartForm::new()
        .add_text("name", name.to_string())
        .add_text("location", location.to_string());
    for tag in tags {
        form = form.add_text("tags", tag.to_string());
    }
    for file in files {
        form = form.add_part(
            "file",
            Part::bytes(test_image(ImageFormat::Png))
                .file_name(file.to_string())
                .mime_type("image/png"),
        );
    }
    form
}

#[tokio::test]
async fn test_upload_annotate_save_register() {
    let temp_dir = TempDir::new().unwrap();
    let (server, app_state) = create_test_server(create_test_config(&temp_dir));

    let response = server
        .post("/api/uploads")
        .multipart(upload_form("Taro", "A-1F", &["before"], &["site.png"]))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["uploaded"].as_array().unwrap().len(), 1);
    assert!(body["errors"].as_array().unwrap().is_empty());

    let registry = app_state.registry.read().await;
    assert_eq!(registry.len(), 1);
    let entry = &registry.get_all()[0];
    assert_eq!(entry.metadata.user_name, "Taro");
    assert_eq!(entry.metadata.location, "A-1F");
    assert_eq!(entry.metadata.tags, vec!["before".to_string()]);
    assert!(metadata::validate(&entry.metadata).is_ok());
    assert_eq!(entry.filename, "site.png");

    let stored = std::fs::read(&entry.path).unwrap();
    assert_eq!(image::guess_format(&stored).unwrap(), ImageFormat::Jpeg);
}

#[tokio::test]
async fn test_upload_defaults_and_comma_tags() {
    let temp_dir = TempDir::new().unwrap();
    let (server, app_state) = create_test_server(create_test_config(&temp_dir));

    let form = MultipartForm::new()
        .add_text("tags", "before, safety")
        .add_text("comment", "loose railing")
        .add_part(
            "file",
            Part::bytes(test_image(ImageFormat::Jpeg))
                .file_name("a.jpg")
                .mime_type("image/jpeg"),
        );
    let response = server.post("/api/uploads").multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let registry = app_state.registry.read().await;
    let record = &registry.get_all()[0].metadata;
    assert_eq!(record.user_name, metadata::DEFAULT_USER_NAME);
    assert_eq!(record.location, metadata::DEFAULT_LOCATION);
    assert_eq!(record.tags, vec!["before".to_string(), "safety".to_string()]);
    assert_eq!(record.comment, "loose railing");
}

#[tokio::test]
async fn test_upload_partial_failure() {
    let temp_dir = TempDir::new().unwrap();
    let (server, app_state) = create_test_server(create_test_config(&temp_dir));

    let form = upload_form("Taro", "A-1F", &[], &["good.png"]).add_part(
        "file",
        Part::bytes(b"definitely not an image".to_vec())
            .file_name("broken.jpg")
            .mime_type("image/jpeg"),
    );
    let response = server.post("/api/uploads").multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["uploaded"].as_array().unwrap().len(), 1);
    assert_eq!(body["errors"][0]["filename"], "broken.jpg");
    assert_eq!(app_state.registry.read().await.len(), 1);
}

#[tokio::test]
async fn test_upload_rejections() {
    let temp_dir = TempDir::new().unwrap();
    let (server, _app_state) = create_test_server(create_test_config(&temp_dir));

    let response = server
        .post("/api/uploads")
        .multipart(upload_form("Taro", "A-1F", &[], &[]))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"hello".to_vec())
            .file_name("notes.txt")
            .mime_type("text/plain"),
    );
    let response = server.post("/api/uploads").multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_list_preserves_upload_order_and_serves_previews() {
    let temp_dir = TempDir::new().unwrap();
    let (server, _app_state) = create_test_server(create_test_config(&temp_dir));

    for name in ["first.png", "second.png", "third.png"] {
        server
            .post("/api/uploads")
            .multipart(upload_form("Taro", "A-1F", &[], &[name]))
            .await;
    }

    let listing: Vec<Value> = server.get("/api/uploads").await.json();
    let names: Vec<&str> = listing
        .iter()
        .map(|e| e["filename"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["first.png", "second.png", "third.png"]);

    let preview_url = listing[0]["preview_url"].as_str().unwrap();
    let preview = server.get(preview_url).await;
    assert_eq!(preview.status_code(), StatusCode::OK);
    assert_eq!(
        image::guess_format(preview.as_bytes()).unwrap(),
        ImageFormat::Jpeg
    );
}

#[tokio::test]
async fn test_delete_removes_entry_and_file() {
    let temp_dir = TempDir::new().unwrap();
    let (server, app_state) = create_test_server(create_test_config(&temp_dir));

    server
        .post("/api/uploads")
        .multipart(upload_form("Taro", "A-1F", &[], &["a.png", "b.png"]))
        .await;

    let (id, path, other_path) = {
        let registry = app_state.registry.read().await;
        let entries = registry.get_all();
        (entries[0].id.clone(), entries[0].path.clone(), entries[1].path.clone())
    };

    let response = server.delete(&format!("/api/uploads/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["file_removed"], true);
    assert!(!path.exists());
    assert!(!app_state.store.metadata_path(&id).exists());

    let response = server.delete(&format!("/api/uploads/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    // Entry whose file vanished is still removed, but the failure is reported
    std::fs::remove_file(&other_path).unwrap();
    let other_id = app_state.registry.read().await.get_all()[0].id.clone();
    let response = server.delete(&format!("/api/uploads/{}", other_id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["file_removed"], false);
    assert!(app_state.registry.read().await.is_empty());
}

#[tokio::test]
async fn test_export_zip() {
    let temp_dir = TempDir::new().unwrap();
    let (server, app_state) = create_test_server(create_test_config(&temp_dir));

    let response = server.get("/api/uploads/export").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    server
        .post("/api/uploads")
        .multipart(upload_form("Taro", "A-1F", &[], &["a.png", "b.png", "c.png"]))
        .await;

    // One registered photo goes missing before the export
    let missing = app_state.registry.read().await.get_all()[2].path.clone();
    std::fs::remove_file(&missing).unwrap();

    let response = server.get("/api/uploads/export").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.header("content-type"), "application/zip");
    assert_eq!(response.header("x-missing-files"), "1");

    let mut archive = zip::ZipArchive::new(Cursor::new(response.as_bytes().to_vec())).unwrap();
    assert_eq!(archive.len(), 2);

    let entries = app_state.registry.read().await.get_all().to_vec();
    for entry in &entries[..2] {
        let name = entry.path.file_name().unwrap().to_str().unwrap();
        assert!(!name.contains('/'));
        let mut contents = Vec::new();
        archive
            .by_name(name)
            .unwrap()
            .read_to_end(&mut contents)
            .unwrap();
        assert_eq!(contents, std::fs::read(&entry.path).unwrap());
    }

    // The exported archive does not linger next to the uploads
    let leftovers: Vec<_> = std::fs::read_dir(temp_dir.path().join("data"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".zip"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_notify_with_null_provider() {
    let temp_dir = TempDir::new().unwrap();
    let (server, _app_state) = create_test_server(create_test_config(&temp_dir));

    let response = server.post("/api/uploads/notify").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    server
        .post("/api/uploads")
        .multipart(upload_form("Taro", "A-1F", &["before"], &["a.png", "b.png"]))
        .await;

    let response = server.post("/api/uploads/notify").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["succeeded"], 2);
    assert_eq!(body["failed"], 0);
}

#[tokio::test]
async fn test_notify_when_disabled() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = create_test_config(&temp_dir);
    config.notifier.enabled = false;
    let (server, _app_state) = create_test_server(config);

    server
        .post("/api/uploads")
        .multipart(upload_form("Taro", "A-1F", &[], &["a.png"]))
        .await;

    let response = server.post("/api/uploads/notify").await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_config_endpoint() {
    let temp_dir = TempDir::new().unwrap();
    let (server, _app_state) = create_test_server(create_test_config(&temp_dir));

    let body: Value = server.get("/api/config").await.json();
    assert_eq!(body["tags"].as_array().unwrap().len(), 11);
    assert!(
        body["location_presets"]
            .as_array()
            .unwrap()
            .iter()
            .any(|l| l == "A-1F")
    );
    assert_eq!(body["notifications_enabled"], true);
}
