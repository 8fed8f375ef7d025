//! In-process stand-in for Thumbor's read-write API.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use thumbor_storage::config::ThumborConfig;

pub const SERVER: &str = "http://thumbor.example.com";
pub const SECURITY_KEY: &str = "MY_SECURE_KEY";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub slug: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Default)]
struct StubState {
    /// Originals by key; the rest of the path is ignored on lookup.
    objects: HashMap<String, Bytes>,
    requests: Vec<RecordedRequest>,
    post_status: Option<StatusCode>,
    get_status: Option<StatusCode>,
    delete_status: Option<StatusCode>,
    location: Option<String>,
}

type Shared = Arc<Mutex<StubState>>;

pub struct StubThumbor {
    pub base_url: String,
    state: Shared,
}

impl StubThumbor {
    pub async fn start() -> Self {
        let state: Shared = Arc::default();
        let app = Router::new()
            .route("/image", post(upload))
            .fallback(object)
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn config(&self) -> ThumborConfig {
        ThumborConfig {
            server: SERVER.to_string(),
            rw_server: self.base_url.clone(),
            security_key: SECURITY_KEY.to_string(),
            timeout_seconds: Some(5),
        }
    }

    pub fn insert(&self, key: &str, data: impl Into<Bytes>) {
        self.state
            .lock()
            .unwrap()
            .objects
            .insert(key.to_string(), data.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.state.lock().unwrap().objects.contains_key(key)
    }

    pub fn fail_posts_with(&self, status: StatusCode) {
        self.state.lock().unwrap().post_status = Some(status);
    }

    pub fn fail_gets_with(&self, status: StatusCode) {
        self.state.lock().unwrap().get_status = Some(status);
    }

    /// Answer uploads with this `Location` instead of `/image/<key>/<slug>`.
    pub fn respond_with_location(&self, location: &str) {
        self.state.lock().unwrap().location = Some(location.to_string());
    }

    pub fn fail_deletes_with(&self, status: StatusCode) {
        self.state.lock().unwrap().delete_status = Some(status);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn upload(State(state): State<Shared>, headers: HeaderMap, body: Bytes) -> Response {
    let mut state = state.lock().unwrap();
    let slug = header_str(&headers, "slug");
    state.requests.push(RecordedRequest {
        method: Method::POST,
        path: "/image".to_string(),
        slug: slug.clone(),
        content_type: header_str(&headers, header::CONTENT_TYPE.as_str()),
    });

    if let Some(status) = state.post_status {
        return status.into_response();
    }

    let key = uuid::Uuid::new_v4().simple().to_string();
    state.objects.insert(key.clone(), body);
    let location = match (state.location.clone(), slug) {
        (Some(location), _) => location,
        (None, Some(slug)) => format!("/image/{key}/{slug}"),
        (None, None) => format!("/image/{key}"),
    };
    (StatusCode::CREATED, [(header::LOCATION, location)]).into_response()
}

async fn object(State(state): State<Shared>, method: Method, uri: Uri) -> Response {
    let mut state = state.lock().unwrap();
    let path = uri.path().to_string();
    state.requests.push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        slug: None,
        content_type: None,
    });

    let key = path
        .strip_prefix("/image/")
        .and_then(|rest| rest.get(..32))
        .unwrap_or_default()
        .to_string();

    match method {
        Method::GET => {
            if let Some(status) = state.get_status {
                return status.into_response();
            }
            match state.objects.get(&key) {
                Some(data) => (StatusCode::OK, data.clone()).into_response(),
                None => StatusCode::NOT_FOUND.into_response(),
            }
        }
        Method::DELETE => {
            if let Some(status) = state.delete_status {
                return status.into_response();
            }
            match state.objects.remove(&key) {
                Some(_) => StatusCode::NO_CONTENT.into_response(),
                None => StatusCode::NOT_FOUND.into_response(),
            }
        }
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}
