//! Authentication API Endpoints
//! Mission: Issue identity tokens and answer "am I admin / moderator?"

use crate::auth::{
    jwt::JwtHandler,
    models::{Claims, TokenRequest, TokenResponse, UserRole},
    user_store::UserStore,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub user_store: UserStore,
    pub jwt_handler: Arc<JwtHandler>,
}

impl AuthState {
    pub fn new(user_store: UserStore, jwt_handler: Arc<JwtHandler>) -> Self {
        Self {
            user_store,
            jwt_handler,
        }
    }
}

/// Token endpoint - POST /jwt
pub async fn issue_token(
    State(state): State<AuthState>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, AuthApiError> {
    let email = payload.email.trim();
    if email.is_empty() {
        return Err(AuthApiError::MissingEmail);
    }

    let token = state.jwt_handler.issue(email).map_err(|e| {
        error!("Token issuance failed: {:#}", e);
        AuthApiError::InternalError
    })?;

    info!("🔐 Token issued for {}", email);

    Ok(Json(TokenResponse { token }))
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct AdminStatus {
    pub admin: bool,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ModeratorStatus {
    pub moderator: bool,
}

/// GET /users/admin/:email
pub async fn admin_status(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
    Path(email): Path<String>,
) -> Result<Json<AdminStatus>, AuthApiError> {
    let admin = self_has_role(&state.user_store, &claims, &email, UserRole::Admin).await?;
    Ok(Json(AdminStatus { admin }))
}

/// GET /users/moderator/:email
pub async fn moderator_status(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
    Path(email): Path<String>,
) -> Result<Json<ModeratorStatus>, AuthApiError> {
    let moderator =
        self_has_role(&state.user_store, &claims, &email, UserRole::Moderator).await?;
    Ok(Json(ModeratorStatus { moderator }))
}

/// Callers may only ask about themselves; asking about anyone else is a
/// plain `false` without touching storage.
async fn self_has_role(
    users: &UserStore,
    claims: &Claims,
    email: &str,
    role: UserRole,
) -> Result<bool, AuthApiError> {
    if claims.email != email {
        debug!(caller = %claims.email, asked = %email, "Role query for another user");
        return Ok(false);
    }

    let user = users.get_user_by_email(email).await.map_err(|e| {
        error!("Role lookup failed: {:#}", e);
        AuthApiError::InternalError
    })?;

    Ok(user.is_some_and(|u| u.has_role(role)))
}

/// Auth API errors
#[derive(Debug)]
pub enum AuthApiError {
    MissingEmail,
    InternalError,
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthApiError::MissingEmail => (StatusCode::BAD_REQUEST, "Email is required"),
            AuthApiError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        };

        (status, Json(json!({ "error": true, "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Document, MemoryDocumentStore};

    fn test_state() -> AuthState {
        AuthState::new(
            UserStore::new(Arc::new(MemoryDocumentStore::new())),
            Arc::new(JwtHandler::new("test-secret-key-12345").unwrap()),
        )
    }

    fn claims_for(email: &str) -> Claims {
        Claims {
            email: email.to_string(),
            iat: 0,
            exp: usize::MAX,
        }
    }

    #[tokio::test]
    async fn test_issue_token_roundtrip() {
        let state = test_state();
        let Json(res) = issue_token(
            State(state.clone()),
            Json(TokenRequest {
                email: "a@b.com".to_string(),
            }),
        )
        .await
        .unwrap();

        let claims = state.jwt_handler.verify(&res.token).unwrap();
        assert_eq!(claims.email, "a@b.com");
    }

    #[tokio::test]
    async fn test_issue_token_requires_email() {
        let err = issue_token(
            State(test_state()),
            Json(TokenRequest {
                email: "  ".to_string(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_self_has_role() {
        let state = test_state();
        let mut doc = Document::new();
        doc.insert("email".to_string(), json!("a@b.com"));
        doc.insert("role".to_string(), json!("admin"));
        state.user_store.create_user(doc).await.unwrap();

        let me = claims_for("a@b.com");
        let users = &state.user_store;
        assert!(self_has_role(users, &me, "a@b.com", UserRole::Admin).await.unwrap());
        assert!(!self_has_role(users, &me, "a@b.com", UserRole::Moderator).await.unwrap());

        // Another caller asking about the admin gets false.
        let other = claims_for("z@b.com");
        assert!(!self_has_role(users, &other, "a@b.com", UserRole::Admin).await.unwrap());
    }
}
