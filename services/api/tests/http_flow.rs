//! End-to-end tests of the HTTP surface against the in-memory adapters.
//!
//! Run with: cargo test -p api --test http_flow

use api_lib::adapters::{Argon2Hasher, LocalBlobStore, MemoryStore};
use api_lib::config::Config;
use api_lib::web::{
    router,
    state::{AppState, Ports},
};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use ledger_digest_core::domain::MessageId;
use ledger_digest_core::ports::{Clock, DeliveryChannel, PortError, PortResult};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

struct TestClock(Mutex<DateTime<Utc>>);

impl TestClock {
    fn advance(&self, by: Duration) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<(String, String)>>,
    broken: AtomicBool,
}

#[async_trait]
impl DeliveryChannel for Outbox {
    async fn send(&self, destination: &str, subject: &str, _html: &str) -> PortResult<MessageId> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("relay down".to_string()));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push((destination.to_string(), subject.to_string()));
        Ok(MessageId(format!("m{}", sent.len())))
    }
}

struct TestApp {
    router: Router,
    clock: Arc<TestClock>,
    outbox: Arc<Outbox>,
    uploads: TempDir,
}

fn app() -> TestApp {
    let uploads = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(TestClock(Mutex::new(Utc::now())));
    let outbox = Arc::new(Outbox::default());
    let config = Arc::new(Config {
        upload_dir: uploads.path().to_path_buf(),
        ..Config::default()
    });

    let ports = Ports {
        credentials: store.clone(),
        tokens: store.clone(),
        transactions: store.clone(),
        sink: store,
        blobs: Arc::new(LocalBlobStore::new(uploads.path())),
        mail: outbox.clone(),
        hasher: Arc::new(Argon2Hasher::new()),
        clock: clock.clone(),
    };
    let state = Arc::new(AppState::new(config, ports));

    TestApp {
        router: router(state),
        clock,
        outbox,
        uploads,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_upload(uri: &str, token: &str, file_name: &str, content: &str) -> Request<Body> {
    let boundary = "XBOUNDARYX";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {content}\r\n\
         --{boundary}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn summary_request(token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/summary")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn register_and_login(router: &Router, email: &str) -> String {
    let (status, _) = send(
        router,
        post_json(
            "/auth/register",
            json!({"email": email, "password": "strongPassword123", "name": "Test User"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        router,
        post_json(
            "/auth/login",
            json!({"email": email, "password": "strongPassword123"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    body["access_token"].as_str().unwrap().to_string()
}

fn days_ago(days: i64) -> String {
    (Utc::now() - Duration::days(days))
        .date_naive()
        .format("%Y-%m-%d")
        .to_string()
}

#[tokio::test]
async fn health_is_public() {
    let app = app();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn register_twice_conflicts_without_overwriting() {
    let app = app();
    let payload = json!({"email": "test@example.com", "password": "pw-one", "name": "First"});

    let (status, body) = send(&app.router, post_json("/auth/register", payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "test@example.com");
    assert_eq!(body["name"], "First");
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());

    let again = json!({"email": "test@example.com", "password": "pw-two", "name": "Second"});
    let (status, _) = send(&app.router, post_json("/auth/register", again)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let login = json!({"email": "test@example.com", "password": "pw-one"});
    let (status, _) = send(&app.router, post_json("/auth/login", login)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn invalid_registration_is_a_bad_request() {
    let app = app();
    let payload = json!({"email": "nope", "password": "pw", "name": "X"});
    let (status, _) = send(&app.router, post_json("/auth/register", payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = app();
    register_and_login(&app.router, "test@example.com").await;

    let (wrong_status, wrong_body) = send(
        &app.router,
        post_json("/auth/login", json!({"email": "test@example.com", "password": "bad"})),
    )
    .await;
    let (ghost_status, ghost_body) = send(
        &app.router,
        post_json("/auth/login", json!({"email": "ghost@example.com", "password": "bad"})),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(ghost_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, ghost_body);
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/summary")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");

    let (status, _) = send(&app.router, summary_request("made-up-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_stops_working_at_expiry() {
    let app = app();
    let token = register_and_login(&app.router, "test@example.com").await;

    app.clock.advance(Duration::minutes(29));
    let (status, _) = send(&app.router, summary_request(&token)).await;
    assert_eq!(status, StatusCode::OK);

    app.clock.advance(Duration::minutes(1));
    let (status, _) = send(&app.router, summary_request(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn upload_then_summary_reports_window_totals() {
    let app = app();
    let token = register_and_login(&app.router, "test@example.com").await;

    let statement = format!(
        "Id,Date,Transaction\n0,{},+100.50\n1,{},-50.25\n2,{},75.00\n3,{},999.00\nnot,a,row",
        days_ago(5),
        days_ago(10),
        days_ago(15),
        days_ago(60),
    );
    let (status, body) = send(
        &app.router,
        multipart_upload("/upload?folder=statements", &token, "txns.csv", &statement),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["path"], "statements/txns.csv");
    assert_eq!(body["accepted"], 4);
    assert_eq!(body["rejected"], 1);
    assert!(app.uploads.path().join("statements/txns.csv").exists());

    let (status, body) = send(&app.router, summary_request(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["summary"]["total_balance"], "125.25");
    assert_eq!(body["summary"]["avg_credit"], "87.75");
    assert_eq!(body["summary"]["avg_debit"], "-50.25");
    assert_eq!(body["summary"]["transaction_count"], 3);
    assert_eq!(body["delivery"]["status"], "sent");

    let sent = app.outbox.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "test@example.com");
}

#[tokio::test]
async fn summary_without_transactions_is_zeroed() {
    let app = app();
    let token = register_and_login(&app.router, "test@example.com").await;

    let (status, body) = send(&app.router, summary_request(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["transaction_count"], 0);
    assert_eq!(body["summary"]["total_balance"], "0");
    assert_eq!(body["summary"]["transactions_by_month"], json!({}));
}

#[tokio::test]
async fn delivery_failure_still_returns_the_summary() {
    let app = app();
    let token = register_and_login(&app.router, "test@example.com").await;
    app.outbox.broken.store(true, Ordering::SeqCst);

    let (status, body) = send(&app.router, summary_request(&token)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["delivery"]["status"], "failed");
    assert_eq!(body["summary"]["transaction_count"], 0);
}

#[tokio::test]
async fn empty_upload_is_rejected() {
    let app = app();
    let token = register_and_login(&app.router, "test@example.com").await;

    let (status, body) = send(&app.router, multipart_upload("/upload", &token, "empty.csv", "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid input: File is empty");
}

#[tokio::test]
async fn oversized_amounts_are_rejected_and_summary_still_answers() {
    let app = app();
    let token = register_and_login(&app.router, "test@example.com").await;

    let statement = format!(
        "0,{day},79228162514264337593543950335\n1,{day},79228162514264337593543950335\n2,{day},1.005\n3,{day},12.50",
        day = days_ago(1),
    );
    let (status, body) = send(
        &app.router,
        multipart_upload("/upload", &token, "big.csv", &statement),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["accepted"], 1);
    assert_eq!(body["rejected"], 3);

    let (status, body) = send(&app.router, summary_request(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["total_balance"], "12.50");
    assert_eq!(body["summary"]["transaction_count"], 1);
}
