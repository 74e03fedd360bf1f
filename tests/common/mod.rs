//! In-process stand-in for the drive API: `POST /file` hands out a record
//! whose upload URL points back at `PUT /upload/{id}`. Every call is
//! recorded so tests can inspect what the client actually sent.

#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use tekdrive_upload::config::DriveConfig;
use tokio::sync::oneshot;

pub const TEST_ACCESS_KEY: &str = "test-access-key-12345";

#[derive(Debug, Clone)]
pub struct CreateCall {
    pub access_key: Option<String>,
    pub content_type: Option<String>,
    pub body: Value,
}

#[derive(Debug, Clone)]
pub struct UploadCall {
    pub file_id: String,
    pub access_key: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub transfer_encoding: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct MockOptions {
    pub file_id: String,
    pub create_status: u16,
    pub upload_status: u16,
    /// Raw body for the create call instead of a generated record.
    pub create_body: Option<String>,
    pub create_delay: Option<Duration>,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            file_id: "abc123".to_string(),
            create_status: 200,
            upload_status: 200,
            create_body: None,
            create_delay: None,
        }
    }
}

struct Shared {
    base_url: String,
    options: MockOptions,
    creates: Mutex<Vec<CreateCall>>,
    uploads: Mutex<Vec<UploadCall>>,
}

pub struct MockDrive {
    pub base_url: String,
    shared: Arc<Shared>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockDrive {
    pub fn start() -> Self {
        Self::start_with(MockOptions::default())
    }

    pub fn start_with(options: MockOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind mock drive");
        listener.set_nonblocking(true).unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let shared = Arc::new(Shared {
            base_url: base_url.clone(),
            options,
            creates: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        });
        let app = Router::new()
            .route("/file", post(create_file))
            .route("/upload/{id}", put(upload_file))
            .with_state(shared.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to build mock runtime");
            rt.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        let _ = shutdown_rx.await;
                    })
                    .await
                    .unwrap();
            });
        });

        MockDrive {
            base_url,
            shared,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn config(&self) -> DriveConfig {
        DriveConfig {
            base_url: self.base_url.clone(),
            access_key: TEST_ACCESS_KEY.to_string(),
            ..DriveConfig::default()
        }
    }

    pub fn upload_url(&self, file_id: &str) -> String {
        format!("{}/upload/{}", self.base_url, file_id)
    }

    pub fn create_calls(&self) -> Vec<CreateCall> {
        self.shared.creates.lock().unwrap().clone()
    }

    pub fn upload_calls(&self) -> Vec<UploadCall> {
        self.shared.uploads.lock().unwrap().clone()
    }
}

impl Drop for MockDrive {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub fn file_record(file_id: &str, name: &str, upload_url: &str) -> Value {
    json!({
        "file": {
            "id": file_id,
            "owner": { "id": "user-1", "username": "tester" },
            "creator": { "id": "user-1", "username": "tester" },
            "name": name,
            "fileType": "FILE",
            "createdAt": "2021-03-04T17:20:41.122Z",
            "updatedAt": "2021-03-04T17:20:41.122Z",
            "sharedAt": null,
            "uploadState": "PENDING",
            "bytes": "0",
            "type": "FILE",
            "parentFolderId": "root",
            "permissions": {
                "owner": true,
                "creator": true,
                "public": false,
                "read": true,
                "edit": true
            }
        },
        "uploadUrl": upload_url,
        "storageLimitExceeded": false
    })
}

async fn create_file(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let name = body["name"].as_str().unwrap_or_default().to_string();
    shared.creates.lock().unwrap().push(CreateCall {
        access_key: header_str(&headers, "x-is-ak"),
        content_type: header_str(&headers, "content-type"),
        body,
    });

    if let Some(delay) = shared.options.create_delay {
        tokio::time::sleep(delay).await;
    }

    let status = StatusCode::from_u16(shared.options.create_status).unwrap();
    let payload = match &shared.options.create_body {
        Some(raw) => raw.clone(),
        None => {
            let id = &shared.options.file_id;
            let upload_url = format!("{}/upload/{}", shared.base_url, id);
            file_record(id, &name, &upload_url).to_string()
        }
    };
    (status, [(header::CONTENT_TYPE, "application/json")], payload).into_response()
}

async fn upload_file(
    State(shared): State<Arc<Shared>>,
    Path(file_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    shared.uploads.lock().unwrap().push(UploadCall {
        file_id,
        access_key: header_str(&headers, "x-is-ak"),
        content_type: header_str(&headers, "content-type"),
        content_length: header_str(&headers, "content-length").and_then(|v| v.parse().ok()),
        transfer_encoding: header_str(&headers, "transfer-encoding"),
        body: body.to_vec(),
    });
    StatusCode::from_u16(shared.options.upload_status).unwrap()
}
