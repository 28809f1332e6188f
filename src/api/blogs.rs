//! Blog endpoints

use super::{body_object, name_description_update, new_document, ApiError, AppState};
use crate::store::{Collection, DeleteResult, Document, InsertOneResult, SortOrder, UpdateResult};
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

/// GET /blogs
pub async fn list_blogs(State(state): State<AppState>) -> Result<Json<Vec<Document>>, ApiError> {
    Ok(Json(
        state
            .store
            .find_all(Collection::Blogs, SortOrder::Oldest)
            .await?,
    ))
}

/// GET /blogs/:id. JSON `null` when there is no such blog.
pub async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Option<Document>>, ApiError> {
    Ok(Json(state.store.find_by_id(Collection::Blogs, &id).await?))
}

/// POST /blogs
pub async fn create_blog(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<InsertOneResult>, ApiError> {
    let blog = new_document(body)?;
    Ok(Json(state.store.insert_one(Collection::Blogs, blog).await?))
}

/// DELETE /blog/:id (admin)
pub async fn delete_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    Ok(Json(state.store.delete_by_id(Collection::Blogs, &id).await?))
}

/// PUT /blog/:id, upserting `name` and `description`.
pub async fn upsert_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<UpdateResult>, ApiError> {
    let set = name_description_update(&body_object(body)?);
    Ok(Json(
        state
            .store
            .update_by_id(Collection::Blogs, &id, set, true)
            .await?,
    ))
}
