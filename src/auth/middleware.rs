//! Authentication Middleware
//! Mission: Gate protected endpoints on a valid bearer token and, where
//! required, on the caller's stored role
//!
//! Order on a gated route is fixed: `auth_middleware` runs first and attaches
//! the decoded [`Claims`]; `admin_middleware` runs second and re-reads the
//! caller's role from storage on every request.

use crate::auth::{
    jwt::JwtHandler,
    models::{Claims, UserRole},
    user_store::UserStore,
};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Auth middleware that validates JWT tokens
pub async fn auth_middleware(
    State(jwt_handler): State<Arc<JwtHandler>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?;

    let token = header
        .to_str()
        .ok()
        .and_then(bearer_token)
        .ok_or(AuthError::InvalidToken)?;

    // Validate token and extract claims
    let claims = jwt_handler
        .verify(token)
        .map_err(|_| AuthError::InvalidToken)?;

    // Add claims to request extensions so handlers can access them
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Role gate for admin-only routes. Must be layered inside `auth_middleware`.
pub async fn admin_middleware(
    State(users): State<UserStore>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let claims = extract_claims(&req).cloned();
    require_role(&users, claims.as_ref(), UserRole::Admin).await?;
    Ok(next.run(req).await)
}

/// Allow the request only if the caller's stored role equals `role`.
pub async fn require_role(
    users: &UserStore,
    claims: Option<&Claims>,
    role: UserRole,
) -> Result<(), AuthError> {
    // Reaching here without claims means the route skipped authentication.
    let claims = claims.ok_or(AuthError::MissingCredential)?;

    let user = users
        .get_user_by_email(&claims.email)
        .await
        .map_err(|e| {
            error!(email = %claims.email, "Role lookup failed: {:#}", e);
            AuthError::Internal
        })?;

    match user {
        Some(user) if user.has_role(role) => Ok(()),
        Some(_) => {
            warn!(email = %claims.email, required = role.as_str(), "Forbidden: role mismatch");
            Err(AuthError::InsufficientRole)
        }
        None => {
            warn!(email = %claims.email, required = role.as_str(), "Forbidden: no user record");
            Err(AuthError::InsufficientRole)
        }
    }
}

/// Token part of an `Authorization: Bearer <token>` value.
pub fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Bearer") || token.is_empty() {
        debug!("Rejected authorization header with unexpected format");
        return None;
    }
    Some(token)
}

/// Extract claims from request (use after auth middleware)
pub fn extract_claims(req: &Request) -> Option<&Claims> {
    req.extensions().get::<Claims>()
}

/// Gate failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    MissingCredential,
    InvalidToken,
    InsufficientRole,
    Internal,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingCredential | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientRole => StatusCode::FORBIDDEN,
            AuthError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            AuthError::MissingCredential | AuthError::InvalidToken => "Unauthorized Access",
            AuthError::InsufficientRole => "Forbidden User",
            AuthError::Internal => "Internal Server Error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": true, "message": self.message() }));
        (self.status(), body).into_response()
    }
}
