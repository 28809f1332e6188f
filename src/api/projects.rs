//! Project endpoints

use super::{body_object, name_description_update, new_document, ApiError, AppState};
use crate::store::{Collection, DeleteResult, Document, InsertOneResult, SortOrder, UpdateResult};
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

/// GET /projects, newest first
pub async fn list_projects(
    State(state): State<AppState>,
) -> Result<Json<Vec<Document>>, ApiError> {
    Ok(Json(
        state
            .store
            .find_all(Collection::Projects, SortOrder::Newest)
            .await?,
    ))
}

/// POST /projects
pub async fn create_project(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<InsertOneResult>, ApiError> {
    let project = new_document(body)?;
    Ok(Json(
        state.store.insert_one(Collection::Projects, project).await?,
    ))
}

/// DELETE /project/:id (admin)
pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    Ok(Json(
        state.store.delete_by_id(Collection::Projects, &id).await?,
    ))
}

/// PUT /project/:id, upserting `name` and `description`.
pub async fn upsert_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<UpdateResult>, ApiError> {
    let set = name_description_update(&body_object(body)?);
    Ok(Json(
        state
            .store
            .update_by_id(Collection::Projects, &id, set, true)
            .await?,
    ))
}
