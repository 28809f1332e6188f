//! HTTP API
//!
//! Three route groups share one state:
//! - public: no credentials
//! - authenticated: bearer token required
//! - admin: bearer token plus the `admin` role, re-checked per request

pub mod blogs;
pub mod payments;
pub mod projects;
pub mod stats;
pub mod users;

use crate::auth::{
    admin_middleware, api as auth_api, auth_middleware, AuthState, JwtHandler, UserStore,
};
use crate::middleware::request_logging;
use crate::payments::PaymentGateway;
use crate::store::{Document, DocumentStore, ID_FIELD};
use axum::{
    extract::FromRef,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::error;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub auth: AuthState,
    pub payments: Option<Arc<dyn PaymentGateway>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        jwt_handler: Arc<JwtHandler>,
        payments: Option<Arc<dyn PaymentGateway>>,
    ) -> Self {
        let user_store = UserStore::new(store.clone());
        Self {
            store,
            auth: AuthState::new(user_store, jwt_handler),
            payments,
        }
    }

    pub fn users(&self) -> &UserStore {
        &self.auth.user_store
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

/// Build the full application router
pub fn create_router(state: AppState) -> Router {
    let jwt_handler = state.auth.jwt_handler.clone();
    let user_store = state.auth.user_store.clone();

    let public_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/jwt", post(auth_api::issue_token))
        // Paths shared with admin routes need their own 405 fallback;
        // the merged default one sits behind the auth layers.
        .route(
            "/users",
            post(users::create_user).fallback(method_not_allowed),
        )
        .route("/blogs", get(blogs::list_blogs).post(blogs::create_blog))
        .route("/blogs/:id", get(blogs::get_blog))
        .route(
            "/blog/:id",
            put(blogs::upsert_blog).fallback(method_not_allowed),
        )
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/project/:id",
            put(projects::upsert_project).fallback(method_not_allowed),
        );

    let authenticated_routes = Router::new()
        .route("/users/admin/:user", get(auth_api::admin_status))
        .route("/users/moderator/:user", get(auth_api::moderator_status))
        .route(
            "/create-payment-intent",
            post(payments::create_payment_intent),
        )
        .route("/payments", post(payments::record_payment))
        .route_layer(middleware::from_fn_with_state(
            jwt_handler.clone(),
            auth_middleware,
        ));

    // Layers run bottom-up: authentication first, then the role check.
    let admin_routes = Router::new()
        .route("/users", get(users::list_users))
        .route("/user/:id", delete(users::delete_user))
        .route("/users/admin/:user", patch(users::make_admin))
        .route("/users/moderator/:user", patch(users::make_moderator))
        .route("/blog/:id", delete(blogs::delete_blog))
        .route("/project/:id", delete(projects::delete_project))
        .route("/admin-stats", get(stats::admin_stats))
        .route_layer(middleware::from_fn_with_state(user_store, admin_middleware))
        .route_layer(middleware::from_fn_with_state(jwt_handler, auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .merge(admin_routes)
        .with_state(state)
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
}

// ===== Route Handlers =====

async fn root() -> &'static str {
    "Server is Running"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

// ===== Shared helpers =====

/// Request body as a JSON object.
pub(crate) fn body_object(body: Value) -> Result<Document, ApiError> {
    match body {
        Value::Object(doc) => Ok(doc),
        _ => Err(ApiError::BadRequest(
            "Request body must be a JSON object".to_string(),
        )),
    }
}

/// Request body for a fresh insert. Any client `_id` is dropped so the
/// store always assigns one.
pub(crate) fn new_document(body: Value) -> Result<Document, ApiError> {
    let mut doc = body_object(body)?;
    doc.remove(ID_FIELD);
    Ok(doc)
}

/// `name`/`description` update used by the blog and project PUT endpoints.
/// Fields missing from the body are left untouched.
pub(crate) fn name_description_update(body: &Document) -> Document {
    ["name", "description"]
        .into_iter()
        .filter_map(|field| body.get(field).map(|v| (field.to_string(), v.clone())))
        .collect()
}

// ===== Error Handling =====

#[derive(Debug)]
pub enum ApiError {
    Database(anyhow::Error),
    BadRequest(String),
    MethodNotAllowed,
    PaymentsDisabled,
    PaymentProvider(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Database(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Database(err) => {
                error!("Database error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred".to_string(),
                )
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Method Not Allowed".to_string(),
            ),
            ApiError::PaymentsDisabled => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Payments are not configured".to_string(),
            ),
            ApiError::PaymentProvider(err) => {
                error!("Payment provider error: {:#}", err);
                (
                    StatusCode::BAD_GATEWAY,
                    "Payment provider request failed".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": true,
            "message": message,
        }));

        (status, body).into_response()
    }
}
