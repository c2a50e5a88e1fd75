//! Common test utilities for E2E testing with mocks.
//!
//! The fixture builds the real router over a conversion service whose tools
//! are replaced by a `MockProcessRunner`, so every request runs in process
//! without ffmpeg, LibreOffice or ImageMagick installed.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use fileforge_core::{testing::MockProcessRunner, Config, ConversionService, QueueConfig};
use fileforge_server::api::create_router;
use fileforge_server::state::AppState;

const BOUNDARY: &str = "fileforge-test-boundary";

/// Test fixture for E2E testing with a mock process runner.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock runner - script tool results and inspect invocations
    pub runner: Arc<MockProcessRunner>,
    /// Shared state, for reaching the queue directly
    pub state: Arc<AppState>,
    /// Holds the upload and output directories
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub max_concurrent: usize,
    pub max_upload_bytes: usize,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 2,
            max_upload_bytes: 1024 * 1024,
        }
    }
}

impl TestFixture {
    /// Create a new test fixture with default settings.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = Config::default();
        config.queue = QueueConfig::default().with_max_concurrent(test_config.max_concurrent);
        config.server.max_upload_bytes = test_config.max_upload_bytes;
        config.storage.upload_dir = temp_dir.path().join("uploads");
        config.storage.output_dir = temp_dir.path().join("outputs");
        config.janitor.enabled = false;
        std::fs::create_dir_all(&config.storage.upload_dir).unwrap();
        std::fs::create_dir_all(&config.storage.output_dir).unwrap();

        let runner = Arc::new(MockProcessRunner::new());
        runner.set_create_last_argument(true).await;

        let service = ConversionService::with_runner(&config, runner.clone());
        let state = Arc::new(AppState::new(config, service));
        let router = create_router(Arc::clone(&state));

        Self {
            router,
            runner,
            state,
            temp_dir,
        }
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.state.upload_dir().to_path_buf()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.state.output_dir().to_path_buf()
    }

    /// Place a file in the upload directory without going through HTTP.
    pub fn stage_upload(&self, file_name: &str, content: &[u8]) {
        std::fs::write(self.upload_dir().join(file_name), content).unwrap();
    }

    /// Send a GET request.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a GET request and return the raw body.
    pub async fn get_bytes(&self, path: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Upload `content` as the multipart field `file`.
    pub async fn upload(&self, file_name: &str, content: &[u8]) -> TestResponse {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/upload")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();

        let (status, bytes) = self.send(request).await;
        TestResponse {
            status,
            body: parse_json(&bytes),
        }
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        let (status, bytes) = self.send(request).await;

        TestResponse {
            status,
            body: parse_json(&bytes),
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, body_bytes.to_vec())
    }
}

fn parse_json(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(bytes).unwrap_or(Value::Null)
    }
}
