use super::*;
use crate::auth::{AdminIdentity, AdminIdentityResolver, AuthError};
use crate::resources::ResourceType;
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode},
    routing::{get, post, put},
    Extension, Form, Json, Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value as JsonValue};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

// ============================================================================
// In-memory collaborators
// ============================================================================

#[derive(Clone, Default)]
struct MemoryDb {
    rows: Arc<Mutex<HashMap<(ResourceType, String), Snapshot>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryDb {
    fn put(&self, resource_type: ResourceType, key: &str, row: JsonValue) {
        let JsonValue::Object(row) = row else { panic!("row must be an object") };
        self.rows.lock().unwrap().insert((resource_type, key.to_string()), row);
    }

    fn remove(&self, resource_type: ResourceType, key: &str) -> bool {
        self.rows.lock().unwrap().remove(&(resource_type, key.to_string())).is_some()
    }

    fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SnapshotSource for MemoryDb {
    async fn find_by_key(
        &self,
        resource_type: ResourceType,
        key: &str,
    ) -> Result<Option<Snapshot>, AuditError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuditError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(self.rows.lock().unwrap().get(&(resource_type, key.to_string())).cloned())
    }
}

struct ChannelSink(mpsc::UnboundedSender<NewAuditLogEntry>);

#[async_trait]
impl AuditSink for ChannelSink {
    async fn record(&self, entry: NewAuditLogEntry) -> Result<AuditLogEntry, AuditError> {
        let stored = AuditLogEntry {
            id: Uuid::new_v4(),
            admin_user_id: entry.admin_user_id.clone(),
            admin_username: entry.admin_username.clone(),
            action: entry.action.to_string(),
            resource_type: entry.resource_type.to_string(),
            resource_id: entry.resource_id.clone(),
            route_path: entry.route_path.clone(),
            changes_before: entry.changes_before_json()?,
            changes_after: entry.changes_after_json()?,
            ip_address: entry.ip_address.clone(),
            user_agent: entry.user_agent.clone(),
            created_at: Utc::now(),
        };
        self.0.send(entry).map_err(|_| AuditError::SinkClosed)?;
        Ok(stored)
    }
}

struct StaticIdentity(Option<AdminIdentity>);

#[async_trait]
impl AdminIdentityResolver for StaticIdentity {
    async fn current_admin(&self, _headers: &HeaderMap) -> Result<Option<AdminIdentity>, AuthError> {
        Ok(self.0.clone())
    }
}

/// Sink whose writes always fail; reports each attempt
struct FailingSink(mpsc::UnboundedSender<()>);

#[async_trait]
impl AuditSink for FailingSink {
    async fn record(&self, _entry: NewAuditLogEntry) -> Result<AuditLogEntry, AuditError> {
        let _ = self.0.send(());
        Err(AuditError::Database(sqlx::Error::PoolTimedOut))
    }
}

/// Resolver that knows the admin once, then loses its database
#[derive(Default)]
struct FlakyIdentity {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl AdminIdentityResolver for FlakyIdentity {
    async fn current_admin(&self, _headers: &HeaderMap) -> Result<Option<AdminIdentity>, AuthError> {
        match self.calls.fetch_add(1, Ordering::SeqCst) {
            0 => Ok(admin()),
            _ => Err(AuthError::Database(sqlx::Error::PoolTimedOut)),
        }
    }
}

fn admin() -> Option<AdminIdentity> {
    Some(AdminIdentity { user_id: "80351110224678912".to_string(), username: Some("sam".to_string()) })
}

// ============================================================================
// Stand-in handlers
// ============================================================================

async fn create_redirect(
    State(db): State<MemoryDb>,
    Form(form): Form<HashMap<String, String>>,
) -> StatusCode {
    let slug = form.get("slug").cloned().unwrap_or_default();
    db.put(
        ResourceType::Redirects,
        &slug,
        json!({
            "slug": slug,
            "targetUrl": form.get("targetUrl"),
            "enabled": true,
            "clicks": 0,
        }),
    );
    StatusCode::SEE_OTHER
}

async fn reject_note() -> StatusCode {
    StatusCode::BAD_REQUEST
}

async fn update_note(
    State(db): State<MemoryDb>,
    Path(id): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> StatusCode {
    db.put(ResourceType::Notes, &id, json!({ "id": id, "title": form.get("title") }));
    StatusCode::SEE_OTHER
}

async fn delete_meeting(State(db): State<MemoryDb>, Path(id): Path<String>) -> StatusCode {
    if db.remove(ResourceType::Meetings, &id) {
        StatusCode::SEE_OTHER
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn create_icon(State(db): State<MemoryDb>, Json(body): Json<JsonValue>) -> StatusCode {
    let category = body["categoryName"].as_str().unwrap_or_default().to_lowercase();
    db.put(
        ResourceType::LessonIcons,
        &category,
        json!({ "categoryName": category, "iconifyId": body["iconifyId"] }),
    );
    StatusCode::CREATED
}

async fn update_icon(
    State(db): State<MemoryDb>,
    Path(category): Path<String>,
    Json(body): Json<JsonValue>,
) -> StatusCode {
    db.put(
        ResourceType::LessonIcons,
        &category,
        json!({ "categoryName": category, "iconifyId": body["iconifyId"] }),
    );
    StatusCode::OK
}

async fn echo(body: String) -> String {
    body
}

async fn seen_action(Extension(context): Extension<AuditContext>) -> String {
    context.mapping.action.to_string()
}

async fn ok() -> StatusCode {
    StatusCode::OK
}

fn build_app(
    db: MemoryDb,
    identity: Option<AdminIdentity>,
    settings: AuditSettings,
) -> (Router, mpsc::UnboundedReceiver<NewAuditLogEntry>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let layer = audit_layer(
        &db,
        Arc::new(ChannelSink(tx)),
        Arc::new(StaticIdentity(identity)),
        settings,
    );
    (routes(db, layer), rx)
}

fn audit_layer(
    db: &MemoryDb,
    sink: Arc<dyn AuditSink>,
    identity: Arc<dyn AdminIdentityResolver>,
    settings: AuditSettings,
) -> AuditLayer {
    AuditLayer::new(AuditState::new(settings, Arc::new(db.clone()), sink, identity).unwrap())
}

fn routes(db: MemoryDb, layer: AuditLayer) -> Router {
    Router::new()
        .route("/admin/redirects/new", post(create_redirect))
        .route("/admin/notes/new", post(reject_note))
        .route("/admin/notes/:id", post(update_note))
        .route("/admin/meetings", get(ok))
        .route("/admin/meetings/new", post(ok))
        .route("/admin/meetings/:id/delete", post(delete_meeting))
        .route("/admin/lesson-icons/api", post(create_icon))
        .route("/admin/lesson-icons/api/:category", put(update_icon))
        .route("/admin/information/new", post(echo))
        .route("/admin/leadership/new", post(seen_action))
        .route("/admin/uploads", post(ok))
        .route("/admin/audit-log", post(ok))
        .with_state(db)
        .layer(layer)
}

fn app(db: MemoryDb) -> (Router, mpsc::UnboundedReceiver<NewAuditLogEntry>) {
    build_app(db, admin(), AuditSettings::default())
}

fn form_post(uri: &str, body: &'static str) -> Request {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("user-agent", "pipeline-test")
        .body(Body::from(body))
        .unwrap()
}

fn json_request(method: Method, uri: &str, body: JsonValue) -> Request {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn next_entry(rx: &mut mpsc::UnboundedReceiver<NewAuditLogEntry>) -> NewAuditLogEntry {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for audit entry")
        .expect("audit sink closed without an entry")
}

async fn assert_no_entry(rx: &mut mpsc::UnboundedReceiver<NewAuditLogEntry>) {
    if let Ok(Some(entry)) = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await {
        panic!("unexpected audit entry: {:?}", entry);
    }
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ============================================================================
// CREATE
// ============================================================================

#[tokio::test]
async fn test_create_redirect_records_stored_row() {
    let (app, mut rx) = app(MemoryDb::default());

    let response = app
        .oneshot(form_post("/admin/redirects/new", "slug=abc&targetUrl=https%3A%2F%2Fx.com"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let entry = next_entry(&mut rx).await;
    assert_eq!(entry.action, AuditAction::Create);
    assert_eq!(entry.resource_type, ResourceType::Redirects);
    assert_eq!(entry.resource_id.as_deref(), Some("abc"));
    assert_eq!(entry.route_path, "/admin/redirects/new");
    assert_eq!(entry.admin_user_id, "80351110224678912");
    assert_eq!(entry.admin_username.as_deref(), Some("sam"));
    assert_eq!(entry.user_agent.as_deref(), Some("pipeline-test"));
    assert!(entry.changes_before.is_none());

    let after = entry.changes_after.unwrap();
    assert_eq!(after["slug"], "abc");
    assert_eq!(after["targetUrl"], "https://x.com");
    assert_eq!(after["clicks"], 0);

    assert_no_entry(&mut rx).await;
}

#[tokio::test]
async fn test_create_without_stored_row_falls_back_to_form() {
    let (app, mut rx) = app(MemoryDb::default());

    let response = app
        .oneshot(form_post("/admin/notes/new", "title=Week+1&notes=hello"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Handler status does not matter
    let entry = next_entry(&mut rx).await;
    assert_eq!(entry.action, AuditAction::Create);
    assert_eq!(entry.resource_id, None);
    assert_eq!(
        JsonValue::Object(entry.changes_after.unwrap()),
        json!({ "title": "Week 1", "notes": "hello" })
    );
}

#[tokio::test]
async fn test_create_json_sub_api() {
    let db = MemoryDb::default();
    let (app, mut rx) = app(db);

    app.oneshot(json_request(
        Method::POST,
        "/admin/lesson-icons/api",
        json!({ "categoryName": "python", "iconifyId": "logos:python" }),
    ))
    .await
    .unwrap();

    let entry = next_entry(&mut rx).await;
    assert_eq!(entry.action, AuditAction::Create);
    assert_eq!(entry.resource_type, ResourceType::LessonIcons);
    assert_eq!(entry.resource_id.as_deref(), Some("python"));
    assert_eq!(entry.changes_after.unwrap()["iconifyId"], "logos:python");
}

#[tokio::test]
async fn test_created_category_is_recorded_in_stored_form() {
    let (app, mut rx) = app(MemoryDb::default());

    app.oneshot(json_request(
        Method::POST,
        "/admin/lesson-icons/api",
        json!({ "categoryName": "Python", "iconifyId": "logos:python" }),
    ))
    .await
    .unwrap();

    let entry = next_entry(&mut rx).await;
    assert_eq!(entry.resource_id.as_deref(), Some("python"));
    // Stored row, not the raw payload
    assert_eq!(entry.changes_after.unwrap()["categoryName"], "python");
}

#[tokio::test]
async fn test_large_multipart_create_is_described() {
    let (app, mut rx) = app(MemoryDb::default());

    let boundary = "XBOUNDARY";
    let photo_size = 3 * 1024 * 1024;
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nKickoff\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"kickoff.jpg\"\r\n\
         Content-Type: image/jpeg\r\n\r\n",
        b = boundary
    )
    .into_bytes();
    body.extend(std::iter::repeat(0xFF_u8).take(photo_size));
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/admin/meetings/new")
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();
    assert_eq!(app.oneshot(request).await.unwrap().status(), StatusCode::OK);

    let entry = next_entry(&mut rx).await;
    assert_eq!(entry.resource_type, ResourceType::Meetings);
    let after = entry.changes_after.unwrap();
    assert_eq!(after["title"], "Kickoff");
    assert_eq!(
        after["photo"],
        json!({ "name": "kickoff.jpg", "size": photo_size, "mimeType": "image/jpeg", "isFile": true })
    );
}

#[tokio::test]
async fn test_handler_sees_the_full_body() {
    let (app, mut rx) = app(MemoryDb::default());

    let response = app
        .oneshot(form_post("/admin/information/new", "title=About&description=Who+we+are"))
        .await
        .unwrap();
    assert_eq!(body_text(response).await, "title=About&description=Who+we+are");

    let entry = next_entry(&mut rx).await;
    let after = entry.changes_after.unwrap();
    assert_eq!(after["title"], "About");
    assert_eq!(after["description"], "Who we are");
}

#[tokio::test]
async fn test_handler_sees_audit_context() {
    let (app, mut rx) = app(MemoryDb::default());

    let response = app.oneshot(form_post("/admin/leadership/new", "name=Ada")).await.unwrap();
    assert_eq!(body_text(response).await, "CREATE");

    next_entry(&mut rx).await;
}

// ============================================================================
// UPDATE / DELETE
// ============================================================================

#[tokio::test]
async fn test_update_records_before_and_after() {
    let db = MemoryDb::default();
    db.put(ResourceType::Notes, "n1", json!({ "id": "n1", "title": "old" }));
    let (app, mut rx) = app(db);

    app.oneshot(form_post("/admin/notes/n1", "title=new")).await.unwrap();

    let entry = next_entry(&mut rx).await;
    assert_eq!(entry.action, AuditAction::Update);
    assert_eq!(entry.resource_id.as_deref(), Some("n1"));

    let before = entry.changes_before.unwrap();
    let after = entry.changes_after.unwrap();
    assert_eq!(before["title"], "old");
    assert_eq!(after["title"], "new");
    assert_ne!(before, after);
}

#[tokio::test]
async fn test_put_update_on_sub_api() {
    let db = MemoryDb::default();
    db.put(
        ResourceType::LessonIcons,
        "python",
        json!({ "categoryName": "python", "iconifyId": "logos:python" }),
    );
    let (app, mut rx) = app(db);

    app.oneshot(json_request(
        Method::PUT,
        "/admin/lesson-icons/api/python",
        json!({ "iconifyId": "devicon:python" }),
    ))
    .await
    .unwrap();

    let entry = next_entry(&mut rx).await;
    assert_eq!(entry.action, AuditAction::Update);
    assert_eq!(entry.changes_before.unwrap()["iconifyId"], "logos:python");
    assert_eq!(entry.changes_after.unwrap()["iconifyId"], "devicon:python");
}

#[tokio::test]
async fn test_encoded_path_id_is_snapshotted() {
    let db = MemoryDb::default();
    db.put(ResourceType::LessonIcons, "c#", json!({ "categoryName": "c#", "iconifyId": "logos:c" }));
    let (app, mut rx) = app(db);

    let response = app
        .oneshot(json_request(
            Method::PUT,
            "/admin/lesson-icons/api/c%23",
            json!({ "iconifyId": "devicon:csharp" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let entry = next_entry(&mut rx).await;
    assert_eq!(entry.resource_id.as_deref(), Some("c#"));
    assert_eq!(entry.changes_before.unwrap()["iconifyId"], "logos:c");
    assert_eq!(entry.changes_after.unwrap()["iconifyId"], "devicon:csharp");
}

#[tokio::test]
async fn test_delete_meeting_keeps_pre_deletion_row() {
    let db = MemoryDb::default();
    db.put(
        ResourceType::Meetings,
        "42",
        json!({ "id": "42", "title": "Intro", "photo": "/uploads/meetings/x.jpg" }),
    );
    let (app, mut rx) = app(db);

    let response = app.oneshot(form_post("/admin/meetings/42/delete", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let entry = next_entry(&mut rx).await;
    assert_eq!(entry.action, AuditAction::Delete);
    assert_eq!(entry.resource_type, ResourceType::Meetings);
    assert_eq!(entry.resource_id.as_deref(), Some("42"));
    assert_eq!(entry.changes_before.unwrap()["photo"], "/uploads/meetings/x.jpg");
    assert!(entry.changes_after.is_none());
}

#[tokio::test]
async fn test_repeated_delete_writes_two_entries() {
    let db = MemoryDb::default();
    db.put(ResourceType::Meetings, "42", json!({ "id": "42" }));
    let (app, mut rx) = app(db);

    app.clone().oneshot(form_post("/admin/meetings/42/delete", "")).await.unwrap();
    let first = next_entry(&mut rx).await;

    let response = app.oneshot(form_post("/admin/meetings/42/delete", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let second = next_entry(&mut rx).await;

    assert!(first.changes_before.is_some());
    assert_eq!(second.action, AuditAction::Delete);
    assert!(second.changes_before.is_none());
    assert!(second.changes_after.is_none());
}

#[tokio::test]
async fn test_snapshot_failure_still_writes_entry() {
    let db = MemoryDb::default();
    db.put(ResourceType::Notes, "n1", json!({ "id": "n1", "title": "old" }));
    db.fail();
    let (app, mut rx) = app(db);

    let response = app.oneshot(form_post("/admin/notes/n1", "title=new")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let entry = next_entry(&mut rx).await;
    assert!(entry.changes_before.is_none());
    assert!(entry.changes_after.is_none());
}

// ============================================================================
// Skipped requests
// ============================================================================

#[tokio::test]
async fn test_no_admin_no_entry() {
    let (app, mut rx) = build_app(MemoryDb::default(), None, AuditSettings::default());

    let response = app
        .oneshot(form_post("/admin/redirects/new", "slug=abc&targetUrl=https%3A%2F%2Fx.com"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    assert_no_entry(&mut rx).await;
}

#[tokio::test]
async fn test_unmapped_route_is_skipped() {
    let (app, mut rx) = app(MemoryDb::default());

    let response = app.oneshot(form_post("/admin/uploads", "a=1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_no_entry(&mut rx).await;
}

#[tokio::test]
async fn test_reads_and_viewer_are_skipped() {
    let (app, mut rx) = app(MemoryDb::default());

    let read = Request::builder().uri("/admin/meetings").body(Body::empty()).unwrap();
    assert_eq!(app.clone().oneshot(read).await.unwrap().status(), StatusCode::OK);

    let viewer = form_post("/admin/audit-log", "");
    assert_eq!(app.oneshot(viewer).await.unwrap().status(), StatusCode::OK);

    assert_no_entry(&mut rx).await;
}

#[tokio::test]
async fn test_disabled_pipeline_is_inert() {
    let settings = AuditSettings { enabled: false, ..AuditSettings::default() };
    let (app, mut rx) = build_app(MemoryDb::default(), admin(), settings);

    let response = app.oneshot(form_post("/admin/information/new", "title=About")).await.unwrap();
    assert_eq!(body_text(response).await, "title=About");

    assert_no_entry(&mut rx).await;
}

// ============================================================================
// Phase 2 failures
// ============================================================================

#[tokio::test]
async fn test_failing_sink_leaves_response_alone() {
    let db = MemoryDb::default();
    let (attempts_tx, mut attempts) = mpsc::unbounded_channel();
    let layer = audit_layer(
        &db,
        Arc::new(FailingSink(attempts_tx)),
        Arc::new(StaticIdentity(admin())),
        AuditSettings::default(),
    );
    let app = routes(db, layer);

    let response = app.oneshot(form_post("/admin/information/new", "title=About")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "title=About");

    tokio::time::timeout(Duration::from_secs(2), attempts.recv())
        .await
        .expect("sink was never called")
        .expect("sink dropped");
    // No retry
    let retried = tokio::time::timeout(Duration::from_millis(200), attempts.recv()).await;
    assert!(!matches!(retried, Ok(Some(()))));
}

#[tokio::test]
async fn test_identity_failure_after_handler_drops_entry() {
    let db = MemoryDb::default();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let identity = FlakyIdentity::default();
    let calls = identity.calls.clone();
    let layer = audit_layer(&db, Arc::new(ChannelSink(tx)), Arc::new(identity), AuditSettings::default());
    let tasks = layer.tasks();
    let app = routes(db, layer);

    let response = app.oneshot(form_post("/admin/information/new", "title=About")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "title=About");

    tasks.close();
    tokio::time::timeout(Duration::from_secs(2), tasks.wait()).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_tracked_write_lands_before_drain_returns() {
    let db = MemoryDb::default();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let layer = audit_layer(
        &db,
        Arc::new(ChannelSink(tx)),
        Arc::new(StaticIdentity(admin())),
        AuditSettings::default(),
    );
    let tasks = layer.tasks();
    let app = routes(db, layer);

    app.oneshot(form_post("/admin/redirects/new", "slug=abc&targetUrl=https%3A%2F%2Fx.com"))
        .await
        .unwrap();

    tasks.close();
    tokio::time::timeout(Duration::from_secs(2), tasks.wait()).await.unwrap();
    let entry = rx.try_recv().unwrap();
    assert_eq!(entry.resource_id.as_deref(), Some("abc"));
}
