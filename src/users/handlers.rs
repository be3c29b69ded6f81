use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    state::AppState,
    users::{
        dto::{LoginRequest, RegisterRequest, UserResponse, UserStats},
        error::DirectoryError,
        model::{PublicUser, UserId},
        services::{is_valid_email, normalize_email},
    },
};

type HandlerError = (StatusCode, String);

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/:id", get(get_user))
        .route("/admin/users/stats", get(user_stats))
}

fn invalid_credentials() -> HandlerError {
    (StatusCode::UNAUTHORIZED, "Invalid credentials".into())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), HandlerError> {
    let email = normalize_email(&payload.email);

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }

    if payload.name.trim().is_empty() {
        warn!(email = %email, "empty name");
        return Err((StatusCode::BAD_REQUEST, "Name is required".into()));
    }

    match state
        .users
        .create(&payload.name, &email, &payload.password)
        .await
    {
        Ok(user) => {
            info!(user_id = %user.id, "user registered");
            Ok((StatusCode::CREATED, Json(UserResponse { user })))
        }
        Err(DirectoryError::DuplicateUser { email }) => {
            warn!(email = %email, "email already registered");
            Err((StatusCode::CONFLICT, "Email already registered".into()))
        }
        Err(e) => {
            error!(error = %e, "create user failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<UserResponse>, HandlerError> {
    let email = normalize_email(&payload.email);

    let record = match state.users.find_by_email(&email).await {
        Some(r) => r,
        None => {
            warn!(email = %email, "login unknown email");
            return Err(invalid_credentials());
        }
    };

    if !state
        .users
        .verify_credential(record.id, &payload.password)
        .await
    {
        warn!(email = %email, user_id = %record.id, "login invalid password");
        return Err(invalid_credentials());
    }

    info!(user_id = %record.id, "user logged in");
    Ok(Json(UserResponse {
        user: record.to_public(),
    }))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<PublicUser>, HandlerError> {
    state
        .users
        .find_by_id(UserId(id))
        .await
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "User not found".into()))
}

pub async fn user_stats(State(state): State<AppState>) -> Json<UserStats> {
    let users = state.users.list_all().await;
    Json(UserStats {
        total: users.len(),
        admins: users.iter().filter(|u| u.is_admin).count(),
    })
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::app::build_app;

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(b) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    fn app() -> Router {
        build_app(AppState::fake())
    }

    fn register_body(email: &str) -> Value {
        json!({ "name": " Ann ", "email": email, "password": "pw1" })
    }

    #[tokio::test]
    async fn register_returns_created_user_without_hash() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/auth/register",
            Some(register_body("Ann@X.com")),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        let user = &body["user"];
        assert_eq!(user["id"], 1);
        assert_eq!(user["name"], "Ann");
        assert_eq!(user["email"], "ann@x.com");
        assert_eq!(user["is_admin"], false);
        assert!(user.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn register_twice_conflicts() {
        let app = app();
        let uri = "/api/v1/auth/register";
        send(&app, Method::POST, uri, Some(register_body("ann@x.com"))).await;
        let (status, body) = send(&app, Method::POST, uri, Some(register_body(" ANN@x.com"))).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, "Email already registered");
    }

    #[tokio::test]
    async fn register_rejects_bad_input() {
        let app = app();
        let uri = "/api/v1/auth/register";

        let (status, _) = send(&app, Method::POST, uri, Some(register_body("not-an-email"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let blank_name = json!({ "name": "   ", "email": "ann@x.com", "password": "pw" });
        let (status, _) = send(&app, Method::POST, uri, Some(blank_name)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_accepts_right_password_only() {
        let app = app();
        send(&app, Method::POST, "/api/v1/auth/register", Some(register_body("ann@x.com"))).await;

        let uri = "/api/v1/auth/login";
        let (status, body) = send(
            &app,
            Method::POST,
            uri,
            Some(json!({ "email": "  ANN@x.com", "password": "pw1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["id"], 1);
        assert!(body["user"].get("password_hash").is_none());

        let (wrong_pw, wrong_body) = send(
            &app,
            Method::POST,
            uri,
            Some(json!({ "email": "ann@x.com", "password": "pw2" })),
        )
        .await;
        let (unknown, unknown_body) = send(
            &app,
            Method::POST,
            uri,
            Some(json!({ "email": "bob@x.com", "password": "pw1" })),
        )
        .await;
        assert_eq!(wrong_pw, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_body, unknown_body);
    }

    #[tokio::test]
    async fn get_user_by_id() {
        let app = app();
        send(&app, Method::POST, "/api/v1/auth/register", Some(register_body("ann@x.com"))).await;

        let (status, body) = send(&app, Method::GET, "/api/v1/users/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "ann@x.com");
        assert!(body.get("password_hash").is_none());

        let (status, _) = send(&app, Method::GET, "/api/v1/users/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stats_count_registered_users() {
        let app = app();
        let uri = "/api/v1/auth/register";
        send(&app, Method::POST, uri, Some(register_body("a@x.com"))).await;
        send(&app, Method::POST, uri, Some(register_body("b@x.com"))).await;

        let (status, body) = send(&app, Method::GET, "/api/v1/admin/users/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "total": 2, "admins": 0 }));
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = send(&app(), Method::GET, "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }
}
