//! User endpoints

use super::{new_document, ApiError, AppState};
use crate::auth::{user_store::CreateUser, UserRole};
use crate::store::{DeleteResult, Document, UpdateResult};
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::{info, warn};

/// GET /users (admin)
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<Document>>, ApiError> {
    Ok(Json(state.users().list_users().await?))
}

/// POST /users
///
/// Registering an email that already exists is not an error: the client gets
/// a message and nothing is written.
pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let mut user = new_document(body)?;
    // Roles are granted only through the admin PATCH routes.
    if user.remove("role").is_some() {
        warn!("Ignoring role supplied at sign-up");
    }
    let has_email = user
        .get("email")
        .and_then(Value::as_str)
        .is_some_and(|e| !e.trim().is_empty());
    if !has_email {
        return Err(ApiError::BadRequest("User email is required".to_string()));
    }

    match state.users().create_user(user).await? {
        CreateUser::Created(result) => Ok(Json(result).into_response()),
        CreateUser::AlreadyExists => {
            Ok(Json(json!({ "message": "User Already exists" })).into_response())
        }
    }
}

/// DELETE /user/:id (admin)
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    Ok(Json(state.users().delete_user(&id).await?))
}

/// PATCH /users/admin/:id (admin)
pub async fn make_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UpdateResult>, ApiError> {
    grant_role(&state, &id, UserRole::Admin).await
}

/// PATCH /users/moderator/:id (admin)
pub async fn make_moderator(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UpdateResult>, ApiError> {
    grant_role(&state, &id, UserRole::Moderator).await
}

async fn grant_role(
    state: &AppState,
    id: &str,
    role: UserRole,
) -> Result<Json<UpdateResult>, ApiError> {
    info!(user = %id, role = role.as_str(), "Role elevation requested");
    Ok(Json(state.users().set_role(id, role).await?))
}
