//! In-process stand-in for the Local REST API, used by tests.

use crate::markdown::classifier::classify;
use crate::markdown::target::document_frontmatter;
use crate::vault::client::ObsidianClient;
use crate::vault::config::{ObsidianConfig, Protocol};
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const API_KEY: &str = "test-key";

const NOTE_JSON: &str = "application/vnd.olrapi.note+json";

#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: String,
}

#[derive(Clone, Default)]
struct MockState {
    notes: Arc<HashMap<String, String>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

pub struct MockVault {
    addr: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockVault {
    /// Serve `notes` (path, content) plus a fixed directory layout:
    /// `Projects/`, `Projects/Archive/`, `Projects/plan.md`,
    /// `Projects/Archive/old.md` and `index.md`.
    pub async fn spawn(notes: &[(&str, &str)]) -> Self {
        let state = MockState {
            notes: Arc::new(
                notes
                    .iter()
                    .map(|(path, content)| (path.to_string(), content.to_string()))
                    .collect(),
            ),
            requests: Arc::default(),
        };
        let requests = state.requests.clone();

        let app = Router::new()
            .route("/vault/", get(list_root))
            .route("/vault/{*path}", any(handle))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, requests }
    }

    pub fn client(&self) -> ObsidianClient {
        self.client_with_key(API_KEY)
    }

    pub fn client_with_key(&self, api_key: &str) -> ObsidianClient {
        let (host, port) = self.addr.rsplit_once(':').unwrap();
        let config = ObsidianConfig {
            host: host.to_string(),
            port: port.parse().unwrap(),
            protocol: Protocol::Http,
            ..ObsidianConfig::new(api_key)
        };
        ObsidianClient::new(&config).unwrap()
    }

    /// Every authorized request that reached a file or directory route.
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {}", API_KEY))
}

fn api_error(status: StatusCode, code: u32, message: &str) -> Response {
    (status, axum::Json(json!({ "errorCode": code, "message": message }))).into_response()
}

async fn list_root(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return api_error(StatusCode::UNAUTHORIZED, 40101, "Authorization required");
    }
    axum::Json(json!({ "files": ["Projects/", "index.md"] })).into_response()
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    Path(path): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if !authorized(&headers) {
        return api_error(StatusCode::UNAUTHORIZED, 40101, "Authorization required");
    }

    state.requests.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: path.clone(),
        headers: headers.clone(),
        body,
    });

    if method != Method::GET {
        return StatusCode::NO_CONTENT.into_response();
    }

    match path.as_str() {
        "Projects/" => return axum::Json(json!({ "files": ["Archive/", "plan.md"] })).into_response(),
        "Projects/Archive/" => return axum::Json(json!({ "files": ["old.md"] })).into_response(),
        _ => {}
    }

    let Some(content) = state.notes.get(&path) else {
        return api_error(StatusCode::NOT_FOUND, 40400, "File not found");
    };

    let wants_json = headers
        .get("accept")
        .is_some_and(|value| value.as_bytes() == NOTE_JSON.as_bytes());

    if wants_json {
        let frontmatter = document_frontmatter(&classify(content));
        return axum::Json(json!({
            "frontmatter": frontmatter,
            "tags": [],
            "path": path,
            "content": content,
        }))
        .into_response();
    }

    content.clone().into_response()
}
