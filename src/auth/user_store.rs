//! User Storage
//! Mission: Look up and manage user documents by email

use crate::auth::models::{UserRecord, UserRole};
use crate::store::{
    Collection, DeleteResult, Document, DocumentStore, Filter, InsertOneResult, SortOrder,
    UpdateResult, ID_FIELD,
};
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of registering a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateUser {
    Created(InsertOneResult),
    AlreadyExists,
}

/// User storage on top of the `users` collection
#[derive(Clone)]
pub struct UserStore {
    store: Arc<dyn DocumentStore>,
}

impl UserStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Get user by email (exact match)
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let doc = self
            .store
            .find_one(Collection::Users, &Filter::eq("email", email))
            .await?;

        doc.map(|d| serde_json::from_value(Value::Object(d)).context("Malformed user document"))
            .transpose()
    }

    /// Register a user unless one with the same email already exists
    pub async fn create_user(&self, user: Document) -> Result<CreateUser> {
        let email = user
            .get("email")
            .and_then(Value::as_str)
            .context("User document has no email")?;

        if self.get_user_by_email(email).await?.is_some() {
            return Ok(CreateUser::AlreadyExists);
        }

        let email = email.to_string();
        let result = self.store.insert_one(Collection::Users, user).await?;
        info!("✅ Created user: {}", email);
        Ok(CreateUser::Created(result))
    }

    /// List all users
    pub async fn list_users(&self) -> Result<Vec<Document>> {
        self.store.find_all(Collection::Users, SortOrder::Oldest).await
    }

    /// Delete a user by ID
    pub async fn delete_user(&self, user_id: &str) -> Result<DeleteResult> {
        let result = self.store.delete_by_id(Collection::Users, user_id).await?;
        if result.deleted_count > 0 {
            info!("🗑️  Deleted user: {}", user_id);
        }
        Ok(result)
    }

    /// Grant `role` to the user with `user_id`
    pub async fn set_role(&self, user_id: &str, role: UserRole) -> Result<UpdateResult> {
        let mut set = Document::new();
        set.insert("role".to_string(), json!(role.as_str()));

        let result = self
            .store
            .update_by_id(Collection::Users, user_id, set, false)
            .await?;

        if result.matched_count == 0 {
            warn!("Role change for unknown user {}", user_id);
        } else {
            info!("🔐 User {} is now {}", user_id, role.as_str());
        }
        Ok(result)
    }

    /// Make sure `email` holds the admin role, creating the user if needed
    pub async fn ensure_admin(&self, email: &str) -> Result<()> {
        let existing = self
            .store
            .find_one(Collection::Users, &Filter::eq("email", email))
            .await?;

        match existing {
            Some(doc) => {
                let id = doc
                    .get(ID_FIELD)
                    .and_then(Value::as_str)
                    .context("User document has no id")?
                    .to_string();
                self.set_role(&id, UserRole::Admin).await?;
            }
            None => {
                let mut doc = Document::new();
                doc.insert("email".to_string(), json!(email));
                doc.insert("role".to_string(), json!(UserRole::Admin.as_str()));
                self.store.insert_one(Collection::Users, doc).await?;
                info!("🔐 Seeded admin user: {}", email);
            }
        }
        Ok(())
    }
}
