#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use url::form_urlencoded;

use reportes::app::accounts::AccountService;
use reportes::config::{SessionConfig, UploadBackend, UploadConfig};
use reportes::infra::memory::MemoryStore;
use reportes::infra::storage::LocalImageStore;
use reportes::AppState;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

// test-only key
pub const TEST_SESSION_KEY: [u8; 32] = *b"0123456789abcdef0123456789abcdef";
pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-password-123";
pub const UPLOAD_MAX_BYTES: usize = 64 * 1024;

/// Enough of a PNG for format sniffing.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00\x00\x00\x01\x00\x00\x00\x01";

const MULTIPART_BOUNDARY: &str = "----reportes-test-boundary";

// ---------------------------------------------------------------------------
// TestApp: a fresh in-memory app per test
// ---------------------------------------------------------------------------

pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub store: MemoryStore,
    pub upload_dir: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    body_bytes: bytes::Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body_bytes).unwrap_or(Value::Null)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body_bytes
    }

    pub fn error_message(&self) -> String {
        self.json()["error"].as_str().unwrap_or("").to_string()
    }

    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
    }

    /// `session=<token>` from the Set-Cookie header, ready to send back.
    pub fn session_cookie(&self) -> Option<String> {
        let value = self.headers.get(header::SET_COOKIE)?.to_str().ok()?;
        value.split(';').next().map(|pair| pair.trim().to_string())
    }
}

pub async fn app() -> TestApp {
    TestApp::setup().await
}

impl TestApp {
    async fn setup() -> Self {
        let upload_dir = TempDir::new().expect("failed to create upload dir");
        let upload = UploadConfig {
            backend: UploadBackend::Local {
                dir: upload_dir.path().to_path_buf(),
                url_prefix: "/uploads".to_string(),
            },
            max_bytes: UPLOAD_MAX_BYTES,
        };
        let session = SessionConfig {
            key: TEST_SESSION_KEY,
            ttl_hours: 1,
        };

        let store = MemoryStore::new();
        let images = LocalImageStore::new(upload_dir.path().to_path_buf(), "/uploads".to_string())
            .await
            .expect("LocalImageStore::new failed");

        let state = AppState::new(Arc::new(store.clone()), Arc::new(images), upload, &session)
            .expect("AppState::new failed");
        let router = reportes::http::router(state.clone());

        TestApp {
            router,
            state,
            store,
            upload_dir,
        }
    }

    // ------------------------------------------------------------------
    // Low-level request helper
    // ------------------------------------------------------------------
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<(&str, Vec<u8>)>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("host", "localhost");

        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some((content_type, bytes)) => builder
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(bytes))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot failed");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to collect body")
            .to_bytes();

        TestResponse {
            status,
            headers,
            body_bytes,
        }
    }

    // ------------------------------------------------------------------
    // Convenience HTTP helpers
    // ------------------------------------------------------------------
    pub async fn get(&self, path: &str, cookie: Option<&str>) -> TestResponse {
        self.request(Method::GET, path, None, cookie).await
    }

    pub async fn post(&self, path: &str, cookie: Option<&str>) -> TestResponse {
        self.request(Method::POST, path, None, cookie).await
    }

    pub async fn post_form(
        &self,
        path: &str,
        fields: &[(&str, &str)],
        cookie: Option<&str>,
    ) -> TestResponse {
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields.iter().copied())
            .finish();
        self.request(
            Method::POST,
            path,
            Some(("application/x-www-form-urlencoded", body.into_bytes())),
            cookie,
        )
        .await
    }

    pub async fn post_multipart(
        &self,
        path: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, &[u8])>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            );
            body.extend_from_slice(value.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        if let Some((file_name, data)) = file {
            body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                    file_name
                )
                .as_bytes(),
            );
            body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());

        let content_type = format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY);
        self.request(Method::POST, path, Some((&content_type, body)), cookie)
            .await
    }

    // ------------------------------------------------------------------
    // Test data helpers
    // ------------------------------------------------------------------

    /// Logs in as a regular user and returns the cookie to send back.
    pub async fn login(&self, username: &str) -> String {
        let resp = self.post_form("/login", &[("username", username)], None).await;
        assert_eq!(resp.status, StatusCode::SEE_OTHER, "login failed for {}", username);
        resp.session_cookie().expect("login did not set a session cookie")
    }

    /// Provisions the admin account (once) and logs in with it.
    pub async fn login_admin(&self) -> String {
        AccountService::new(Arc::new(self.store.clone()))
            .create_admin(ADMIN_USERNAME, ADMIN_PASSWORD)
            .await
            .expect("create_admin failed");

        let resp = self
            .post_form(
                "/admin_login",
                &[("admin_user", ADMIN_USERNAME), ("admin_pass", ADMIN_PASSWORD)],
                None,
            )
            .await;
        assert_eq!(resp.status, StatusCode::SEE_OTHER, "admin login failed");
        resp.session_cookie().expect("admin login did not set a session cookie")
    }

    /// Creates a report without an image and returns its JSON.
    pub async fn create_report(&self, cookie: &str, risk_type: &str, description: &str) -> Value {
        let resp = self
            .post_multipart(
                "/new_report",
                &[("risk_type", risk_type), ("descripcion", description)],
                None,
                Some(cookie),
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK, "create report failed: {}", resp.error_message());
        resp.json()
    }

    pub async fn set_score(&self, admin_cookie: &str, report_id: i64, score: i32) {
        let resp = self
            .post_form(
                &format!("/update_score/{}", report_id),
                &[("score", score.to_string().as_str())],
                Some(admin_cookie),
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK, "set score failed: {}", resp.error_message());
    }

    /// Ids of the listed reports, in listing order.
    pub async fn listed_ids(&self, cookie: &str, query: &str) -> Vec<i64> {
        let resp = self.get(&format!("/{}", query), Some(cookie)).await;
        assert_eq!(resp.status, StatusCode::OK, "listing failed: {}", resp.error_message());
        resp.json()["items"]
            .as_array()
            .expect("items array")
            .iter()
            .map(|item| item["id"].as_i64().expect("report id"))
            .collect()
    }
}

pub fn report_id(report: &Value) -> i64 {
    report["id"].as_i64().expect("report id")
}
