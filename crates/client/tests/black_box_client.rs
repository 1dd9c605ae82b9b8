use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use syzportal_auth::{Action, EvaluationRequest, Resource, ResourceKind};
use syzportal_client::{
    ApiClient, AssignmentRequest, ClientConfig, ClientError, HttpPermissionClient, PermissionEvaluator,
    SessionClient,
};
use syzportal_core::UserId;

#[derive(Default)]
struct Backend {
    logged_in: AtomicBool,
    last_csrf: Mutex<Option<String>>,
    last_evaluate_body: Mutex<Option<Value>>,
    assignments: Mutex<Vec<Value>>,
}

struct TestServer {
    base_url: String,
    backend: Arc<Backend>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let backend = Arc::new(Backend::default());
        let app = Router::new()
            .route("/api/csrf/", get(csrf))
            .route("/api/resource-permissions/evaluate", post(evaluate))
            .route(
                "/api/resource-permissions/user/:id/permissions",
                get(user_permissions),
            )
            .route("/api/resource-permissions/", get(all_permissions))
            .route("/api/resource-permissions/:id", get(one_permission))
            .route("/api/resource-permissions/user/:id/assignments", get(user_assignments))
            .route("/api/resource-permissions/assignments/all", get(all_assignments))
            .route("/api/resource-permissions/assign/:user/:perm", post(assign))
            .route("/api/resource-permissions/unassign/:user/:perm", delete(unassign))
            .route("/api/session-login/", post(login))
            .route("/api/session-logout/", post(logout))
            .route("/api/users/me/", get(me))
            .route("/api/check-username/", post(check_username))
            .route("/api/forgot-password/", post(forgot_password))
            .route("/api/v1/health/", get(|| async { Json(json!({ "status": "ok" })) }))
            .with_state(backend.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            backend,
            handle,
        }
    }

    fn api(&self) -> ApiClient {
        ApiClient::new(ClientConfig::new(&self.base_url)).unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn csrf() -> Json<Value> {
    Json(json!({ "csrfToken": "csrf-123" }))
}

async fn evaluate(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let csrf = headers
        .get("X-CSRFToken")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *backend.last_csrf.lock().unwrap() = csrf;
    *backend.last_evaluate_body.lock().unwrap() = Some(body.clone());

    match body["action"].as_str().unwrap_or_default() {
        "client:read" => Json(json!({
            "status": "success",
            "message": "evaluated",
            "evaluation": {
                "allowed": true,
                "evaluated_policies": ["clients-readers"],
                "user_id": body["user_id"],
                "required_action": "client:read",
                "required_resource": body["resource"]
            }
        }))
        .into_response(),
        "client:delete" => Json(json!({
            "status": "success",
            "message": "evaluated",
            "evaluation": { "allowed": false, "denied_reason": "no matching statement" }
        }))
        .into_response(),
        "auth:me" => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "detail": "policy store offline" })))
            .into_response(),
        "user:create" => (StatusCode::OK, "<html>not json</html>").into_response(),
        "client:update" => (
            StatusCode::ACCEPTED,
            Json(json!({ "status": "queued", "message": "", "evaluation": { "allowed": true } })),
        )
            .into_response(),
        "permissions:read" => StatusCode::UNAUTHORIZED.into_response(),
        _ => (StatusCode::BAD_GATEWAY, "upstream").into_response(),
    }
}

async fn user_permissions() -> Json<Value> {
    Json(json!({
        "permissions": [
            { "id": "p1", "resource": "client:*", "actions": ["client:read"], "category": "clients" },
            { "id": "p2", "resource": "user:*", "actions": ["user:read"], "category": "users" },
            { "id": "p3", "resource": "client:7", "actions": ["client:update"], "category": "clients" }
        ],
        "assignments": [
            { "user_id": "42", "resource_permission_id": "p1", "assigned_by": "admin" }
        ]
    }))
}

async fn all_permissions() -> Json<Value> {
    Json(json!({
        "status": "success",
        "message": "",
        "total": 2,
        "permissions": [
            { "id": "p1", "resource": "client:*", "actions": ["client:read"], "category": "clients" },
            { "id": "p2", "resource": "user:*", "actions": ["user:read"], "category": "users" }
        ]
    }))
}

async fn one_permission(Path(id): Path<String>) -> Response {
    if id == "p1" {
        Json(json!({ "id": "p1", "resource": "client:*", "actions": ["client:read"] })).into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({ "detail": "Resource permission not found" }))).into_response()
    }
}

async fn assign(
    State(backend): State<Arc<Backend>>,
    Path((user, perm)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if headers.get("X-CSRFToken").is_none() {
        return (StatusCode::FORBIDDEN, Json(json!({ "detail": "CSRF token missing" }))).into_response();
    }
    let assignment = json!({
        "user_id": user,
        "resource_permission_id": perm,
        "assigned_by": body["assigned_by"],
        "notes": body["notes"],
        "active": true
    });
    backend.assignments.lock().unwrap().push(assignment.clone());
    Json(json!({ "status": "success", "message": "assigned", "assignment": assignment })).into_response()
}

async fn unassign(
    State(backend): State<Arc<Backend>>,
    Path((user, perm)): Path<(String, String)>,
) -> Response {
    let mut assignments = backend.assignments.lock().unwrap();
    let before = assignments.len();
    assignments.retain(|a| !(a["user_id"] == user && a["resource_permission_id"] == perm));
    if assignments.len() == before {
        return (StatusCode::NOT_FOUND, Json(json!({ "detail": "Assignment not found" }))).into_response();
    }
    Json(json!({ "status": "success", "message": "unassigned" })).into_response()
}

async fn user_assignments(State(backend): State<Arc<Backend>>, Path(user): Path<String>) -> Json<Value> {
    let assignments: Vec<Value> = backend
        .assignments
        .lock()
        .unwrap()
        .iter()
        .filter(|a| a["user_id"] == user)
        .cloned()
        .collect();
    Json(json!({ "status": "success", "message": "", "total": assignments.len(), "assignments": assignments }))
}

async fn all_assignments(State(backend): State<Arc<Backend>>) -> Json<Value> {
    let assignments = backend.assignments.lock().unwrap().clone();
    Json(json!({ "status": "success", "message": "", "total": assignments.len(), "assignments": assignments }))
}

async fn login(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    if body["username"] == "alice" && body["password"] == "secret" {
        backend.logged_in.store(true, Ordering::SeqCst);
        Json(json!({ "detail": "ok" })).into_response()
    } else {
        (StatusCode::BAD_REQUEST, Json(json!({ "detail": "Invalid credentials" }))).into_response()
    }
}

async fn logout(State(backend): State<Arc<Backend>>) -> Response {
    backend.logged_in.store(false, Ordering::SeqCst);
    Json(json!({})).into_response()
}

async fn me(State(backend): State<Arc<Backend>>) -> Response {
    if backend.logged_in.load(Ordering::SeqCst) {
        Json(json!({
            "id": 42,
            "username": "alice",
            "email": "alice@example.com",
            "groups": ["4syz"]
        }))
        .into_response()
    } else {
        (StatusCode::FORBIDDEN, Json(json!({ "detail": "Authentication credentials were not provided." })))
            .into_response()
    }
}

async fn check_username(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({ "exists": body["username"] == "alice" }))
}

async fn forgot_password() -> Json<Value> {
    Json(json!({ "detail": "sent" }))
}

fn user() -> UserId {
    UserId::from(42_u64)
}

#[tokio::test]
async fn evaluate_returns_backend_decision() {
    let server = TestServer::spawn().await;
    let client = HttpPermissionClient::new(server.api());

    let evaluation = client
        .evaluate_permission(&user(), Action::ClientRead, Resource::all(ResourceKind::Client))
        .await
        .unwrap();
    assert!(evaluation.allowed);
    assert_eq!(evaluation.matched_policies, vec!["clients-readers"]);
    assert_eq!(evaluation.action.as_deref(), Some("client:read"));

    let sent = server.backend.last_evaluate_body.lock().unwrap().clone().unwrap();
    assert_eq!(sent, json!({ "user_id": "42", "action": "client:read", "resource": "client:*" }));
}

#[tokio::test]
async fn evaluate_forwards_context_when_present() {
    let server = TestServer::spawn().await;
    let client = HttpPermissionClient::new(server.api());

    let mut context = serde_json::Map::new();
    context.insert("ip".into(), json!("10.0.0.1"));
    let request = EvaluationRequest::new(user(), Action::ClientRead, Resource::instance(ResourceKind::Client, "7"))
        .with_context(context);
    client.evaluate(&request).await.unwrap();

    let sent = server.backend.last_evaluate_body.lock().unwrap().clone().unwrap();
    assert_eq!(sent["context"]["ip"], "10.0.0.1");
    assert_eq!(sent["resource"], "client:7");
}

#[tokio::test]
async fn denial_carries_reason() {
    let server = TestServer::spawn().await;
    let client = HttpPermissionClient::new(server.api());

    let evaluation = client
        .evaluate_permission(&user(), Action::ClientDelete, Resource::all(ResourceKind::Client))
        .await
        .unwrap();
    assert!(!evaluation.allowed);
    assert_eq!(evaluation.reason.as_deref(), Some("no matching statement"));
}

#[tokio::test]
async fn non_success_status_is_an_api_error_with_detail() {
    let server = TestServer::spawn().await;
    let client = HttpPermissionClient::new(server.api());

    let err = client
        .evaluate_permission(&user(), Action::AuthMe, Resource::all(ResourceKind::Auth))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ClientError::Api {
            status: 500,
            detail: "policy store offline".to_string()
        }
    );

    let err = client
        .evaluate_permission(&user(), Action::custom("reports:export"), Resource::Custom("reports:*".into()))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ClientError::Api {
            status: 502,
            detail: "HTTP error! status: 502".to_string()
        }
    );
}

#[tokio::test]
async fn only_http_200_counts_as_an_evaluation() {
    let server = TestServer::spawn().await;
    let client = HttpPermissionClient::new(server.api());

    let err = client
        .evaluate_permission(&user(), Action::ClientUpdate, Resource::all(ResourceKind::Client))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(202));
    assert!(
        !client
            .has_permission(&user(), Action::ClientUpdate, Resource::all(ResourceKind::Client))
            .await
    );
}

#[tokio::test]
async fn malformed_body_is_a_parse_error() {
    let server = TestServer::spawn().await;
    let client = HttpPermissionClient::new(server.api());

    let err = client
        .evaluate_permission(&user(), Action::UserCreate, Resource::all(ResourceKind::User))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Parse(_)));
}

#[tokio::test]
async fn unauthorized_maps_to_unauthenticated() {
    let server = TestServer::spawn().await;
    let client = HttpPermissionClient::new(server.api());

    let err = client
        .evaluate_permission(&user(), Action::PermissionsRead, Resource::all(ResourceKind::Permissions))
        .await
        .unwrap_err();
    assert!(err.is_unauthenticated());
    assert!(
        !client
            .has_permission(&user(), Action::PermissionsRead, Resource::all(ResourceKind::Permissions))
            .await
    );
}

#[tokio::test]
async fn csrf_token_is_sent_once_known() {
    let server = TestServer::spawn().await;
    let api = server.api();
    let client = HttpPermissionClient::new(api.clone());

    client
        .evaluate_permission(&user(), Action::ClientRead, Resource::all(ResourceKind::Client))
        .await
        .unwrap();
    assert_eq!(*server.backend.last_csrf.lock().unwrap(), None);

    assert_eq!(api.ensure_csrf_token().await.unwrap(), "csrf-123");
    client
        .evaluate_permission(&user(), Action::ClientRead, Resource::all(ResourceKind::Client))
        .await
        .unwrap();
    assert_eq!(server.backend.last_csrf.lock().unwrap().as_deref(), Some("csrf-123"));
}

#[tokio::test]
async fn user_resource_permissions_lists_categories() {
    let server = TestServer::spawn().await;
    let client = HttpPermissionClient::new(server.api());

    let permissions = client.user_resource_permissions(&user()).await.unwrap();
    assert_eq!(permissions.permissions.len(), 3);
    assert!(permissions.assignments[0].active);
    assert_eq!(permissions.categories(), vec!["clients", "users"]);
}

#[tokio::test]
async fn session_login_me_logout_flow() {
    let server = TestServer::spawn().await;
    let session = SessionClient::new(server.api());

    assert_eq!(session.current_user().await.unwrap(), None);

    let user = session.login("alice", "secret").await.unwrap();
    assert_eq!(user.id, UserId::from(42_u64));
    assert_eq!(user.username, "alice");
    assert_eq!(session.api().csrf_token().as_deref(), Some("csrf-123"));

    let current = session.current_user().await.unwrap();
    assert_eq!(current.map(|u| u.username), Some("alice".to_string()));

    session.logout().await.unwrap();
    assert_eq!(session.api().csrf_token(), None);
    assert_eq!(session.current_user().await.unwrap(), None);
}

#[tokio::test]
async fn bad_credentials_are_reported_as_such() {
    let server = TestServer::spawn().await;
    let session = SessionClient::new(server.api());

    let err = session.login("alice", "wrong").await.unwrap_err();
    assert_eq!(err, ClientError::InvalidCredentials);

    let err = session.login("  ", "secret").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidRequest(_)));
}

#[tokio::test]
async fn auxiliary_session_endpoints() {
    let server = TestServer::spawn().await;
    let session = SessionClient::new(server.api());

    assert!(session.check_username("alice").await.unwrap());
    assert!(!session.check_username("mallory").await.unwrap());
    session.request_password_reset("alice@example.com").await.unwrap();
    assert!(matches!(
        session.request_password_reset("alice").await,
        Err(ClientError::InvalidRequest(_))
    ));
    assert!(session.health().await);
}

#[tokio::test]
async fn health_is_false_when_backend_is_unreachable() {
    let session = SessionClient::new(ApiClient::new(ClientConfig::new("http://127.0.0.1:9")).unwrap());
    assert!(!session.health().await);
}

#[tokio::test]
async fn permission_catalog_endpoints() {
    let server = TestServer::spawn().await;
    let client = HttpPermissionClient::new(server.api());

    let all = client.resource_permissions().await.unwrap();
    assert_eq!(all.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), vec!["p1", "p2"]);

    let one = client.resource_permission("p1").await.unwrap();
    assert_eq!(one.resource, "client:*");

    let err = client.resource_permission("p9").await.unwrap_err();
    assert_eq!(
        err,
        ClientError::Api {
            status: 404,
            detail: "Resource permission not found".to_string()
        }
    );
}

#[tokio::test]
async fn assign_and_unassign_send_csrf_and_round_trip() {
    let server = TestServer::spawn().await;
    let client = HttpPermissionClient::new(server.api());

    let assignment = client
        .assign(&user(), "p1", &AssignmentRequest::by("admin").with_notes("quarter close"))
        .await
        .unwrap();
    assert_eq!(assignment.user_id, "42");
    assert_eq!(assignment.resource_permission_id, "p1");
    assert_eq!(assignment.notes.as_deref(), Some("quarter close"));

    client.assign(&UserId::from(7_u64), "p2", &AssignmentRequest::by("admin")).await.unwrap();
    assert_eq!(client.user_assignments(&user()).await.unwrap().len(), 1);
    assert_eq!(client.all_assignments().await.unwrap().len(), 2);

    client.unassign(&user(), "p1").await.unwrap();
    assert!(client.user_assignments(&user()).await.unwrap().is_empty());

    let err = client.unassign(&user(), "p1").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}
