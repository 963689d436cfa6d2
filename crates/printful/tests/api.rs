//! HTTP-level tests for [`PrintfulApi`] against an in-process axum backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use printlab_core::{MockupFormat, Position, TaskStatus};
use printlab_printful::{
    poll_mockup_status, upload_composite, ApiError, ClientConfig, CreateTaskRequest, PollConfig,
    PrintfulApi, TaskFile,
};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Fake backend
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Backend {
    create_bodies: Mutex<Vec<Value>>,
    uploads: Mutex<Vec<(String, String, Vec<u8>)>>,
    status_calls: AtomicUsize,
}

type Shared = Arc<Backend>;

async fn create_task(State(backend): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let unknown_variant = body["variant_ids"] == json!([0]);
    backend.create_bodies.lock().unwrap().push(body);
    if unknown_variant {
        return Json(json!({ "code": 200, "result": { "status": "rejected" } }));
    }
    Json(json!({ "code": 200, "result": { "task_key": "gt-123", "status": "pending" } }))
}

async fn task_status(State(backend): State<Shared>, Path(key): Path<String>) -> (StatusCode, Json<Value>) {
    match key.as_str() {
        "gt-123" => {
            let n = backend.status_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                (StatusCode::OK, Json(json!({ "status": "pending" })))
            } else {
                (
                    StatusCode::OK,
                    Json(json!({
                        "status": "completed",
                        "result": { "mockup_url": "https://mockups.example.com/gt-123.jpg" }
                    })),
                )
            }
        }
        "gt-failed" => (
            StatusCode::OK,
            Json(json!({ "status": "failed", "error": "Design outside print area" })),
        ),
        "gt/odd?key#1" => (StatusCode::OK, Json(json!({ "status": "pending" }))),
        "gt-no-url" => (StatusCode::OK, Json(json!({ "status": "completed", "result": {} }))),
        "gt-weird" => (StatusCode::OK, Json(json!({ "status": "exploded" }))),
        _ => (StatusCode::NOT_FOUND, Json(json!({ "error": "unknown task" }))),
    }
}

async fn upload(State(backend): State<Shared>, mut multipart: Multipart) -> Json<Value> {
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.unwrap().to_vec();
        assert_eq!(name, "file");
        backend
            .uploads
            .lock()
            .unwrap()
            .push((filename.clone(), content_type, bytes));
        return Json(json!({ "result": { "file_url": format!("https://files.example.com/{filename}") } }));
    }
    Json(json!({ "result": {} }))
}

async fn printfiles(Path(product_id): Path<u64>) -> Json<Value> {
    Json(json!({
        "code": 200,
        "result": {
            "product_id": product_id,
            "available_placements": { "front": "Front print" },
            "printfiles": [ { "printfile_id": 1, "width": 1800, "height": 2400, "dpi": 150 } ],
            "variant_printfiles": [ { "variant_id": 4012, "placements": { "front": 1 } } ]
        }
    }))
}

fn router(backend: Shared) -> Router {
    Router::new()
        .route("/api/printful/mockup-generator/create-task", post(create_task))
        .route("/api/printful/mockup-tasks/{key}", get(task_status))
        .route("/api/printful/mockup-generator/printfiles/{product_id}", get(printfiles))
        .route("/api/upload", post(upload))
        .route(
            "/broken/upload",
            post(|| async { Json(json!({ "result": { "id": 77 } })) }),
        )
        .with_state(backend)
}

async fn spawn_backend() -> (PrintfulApi, Shared) {
    let backend = Shared::default();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(Arc::clone(&backend));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = ClientConfig {
        api_url: format!("http://{addr}"),
        ..ClientConfig::default()
    };
    (PrintfulApi::new(&config).unwrap(), backend)
}

fn request() -> CreateTaskRequest {
    CreateTaskRequest {
        variant_ids: vec![4012],
        format: MockupFormat::Jpg,
        files: vec![TaskFile {
            placement: "front".into(),
            image_url: "https://files.example.com/art.png".into(),
            position: Some(Position {
                area_width: 1800.0,
                area_height: 2400.0,
                width: 1800.0,
                height: 2400.0,
                top: 0.0,
                left: 0.0,
                limit_to_print_area: true,
            }),
        }],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_task_returns_task_key_and_sends_backend_body() {
    let (api, backend) = spawn_backend().await;

    let key = api.create_mockup_task(&request()).await.unwrap();
    assert_eq!(key, "gt-123");

    let bodies = backend.create_bodies.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["variant_ids"], json!([4012]));
    assert_eq!(bodies[0]["format"], "jpg");
    assert_eq!(bodies[0]["files"][0]["placement"], "front");
    assert_eq!(bodies[0]["files"][0]["position"]["area_width"], 1800.0);
}

#[tokio::test]
async fn create_task_without_key_echoes_response() {
    let (api, _) = spawn_backend().await;
    let mut req = request();
    req.variant_ids = vec![0];

    let err = api.create_mockup_task(&req).await.unwrap_err();

    assert_matches!(
        err,
        ApiError::MissingTaskKey { ref response } if response["result"]["status"] == "rejected"
    );
}

#[tokio::test]
async fn status_reports_pending_then_completed() {
    let (api, _) = spawn_backend().await;

    assert_eq!(api.mockup_task_status("gt-123").await.unwrap(), TaskStatus::Pending);
    assert_eq!(api.mockup_task_status("gt-123").await.unwrap(), TaskStatus::Pending);
    assert_eq!(
        api.mockup_task_status("gt-123").await.unwrap(),
        TaskStatus::Completed {
            mockup_url: "https://mockups.example.com/gt-123.jpg".into()
        }
    );
}

#[tokio::test]
async fn status_failed_carries_server_error() {
    let (api, _) = spawn_backend().await;
    assert_eq!(
        api.mockup_task_status("gt-failed").await.unwrap(),
        TaskStatus::Failed {
            error: "Design outside print area".into()
        }
    );
}

#[tokio::test]
async fn task_key_is_a_single_path_segment() {
    let (api, _) = spawn_backend().await;
    assert_eq!(
        api.mockup_task_status("gt/odd?key#1").await.unwrap(),
        TaskStatus::Pending
    );
}

#[tokio::test]
async fn malformed_statuses_are_rejected() {
    let (api, _) = spawn_backend().await;
    assert_matches!(
        api.mockup_task_status("gt-no-url").await,
        Err(ApiError::MalformedResponse(_))
    );
    assert_matches!(
        api.mockup_task_status("gt-weird").await,
        Err(ApiError::MalformedResponse(msg)) if msg.contains("exploded")
    );
    assert_matches!(
        api.mockup_task_status("nope").await,
        Err(ApiError::Status { status: 404, .. })
    );
}

#[tokio::test]
async fn upload_sends_multipart_file_and_returns_url() {
    let (api, backend) = spawn_backend().await;

    let composite = printlab_core::CompositeImage {
        placement: "front".into(),
        filename: "composite-front-abc.png".into(),
        png: vec![0x89, b'P', b'N', b'G'],
        width: 1,
        height: 1,
    };
    let url = upload_composite(&api, &composite).await.unwrap();
    assert_eq!(url, "https://files.example.com/composite-front-abc.png");

    let uploads = backend.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].0, "composite-front-abc.png");
    assert_eq!(uploads[0].1, "image/png");
    assert_eq!(uploads[0].2, vec![0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn upload_without_file_url_echoes_response() {
    let (api, _) = spawn_backend().await;
    let broken = PrintfulApi::new(&ClientConfig {
        api_url: api.api_url().to_string(),
        upload_path: "/broken/upload".into(),
        ..ClientConfig::default()
    })
    .unwrap();

    let err = broken
        .upload_file(vec![1, 2, 3], "a.png", "image/png")
        .await
        .unwrap_err();

    assert_matches!(err, ApiError::MissingFileUrl { ref response } if response["result"]["id"] == 77);
}

#[tokio::test]
async fn print_files_parse_into_catalog() {
    let (api, _) = spawn_backend().await;

    let catalog = api.print_files(71).await.unwrap();
    assert_eq!(catalog.product_id, 71);
    let area = catalog.resolve_print_area("front").unwrap();
    assert_eq!((area.width, area.height), (1800, 2400));
}

#[tokio::test]
async fn poller_drives_real_client_to_completion() {
    let (api, backend) = spawn_backend().await;
    let config = PollConfig {
        max_attempts: 5,
        interval: Duration::from_millis(10),
    };

    let url = poll_mockup_status(&api, "gt-123", &config, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(url, "https://mockups.example.com/gt-123.jpg");
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), 3);
}
