//! Shared harness for router-level tests.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use folio_backend::{
    auth::JwtHandler,
    create_router,
    payments::{PaymentGateway, PaymentIntent},
    store::{
        Collection, DeleteResult, Document, DocumentStore, Filter, InsertOneResult,
        MemoryDocumentStore, SortOrder, UpdateResult,
    },
    AppState,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret";

/// Memory store that counts `find_one` lookups.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryDocumentStore,
    lookups: AtomicUsize,
}

impl CountingStore {
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    async fn find_all(&self, collection: Collection, order: SortOrder) -> Result<Vec<Document>> {
        self.inner.find_all(collection, order).await
    }

    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_one(collection, filter).await
    }

    async fn insert_one(&self, collection: Collection, doc: Document) -> Result<InsertOneResult> {
        self.inner.insert_one(collection, doc).await
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: &str,
        set: Document,
        upsert: bool,
    ) -> Result<UpdateResult> {
        self.inner.update_by_id(collection, id, set, upsert).await
    }

    async fn delete_by_id(&self, collection: Collection, id: &str) -> Result<DeleteResult> {
        self.inner.delete_by_id(collection, id).await
    }

    async fn delete_many_by_ids(
        &self,
        collection: Collection,
        ids: &[String],
    ) -> Result<DeleteResult> {
        self.inner.delete_many_by_ids(collection, ids).await
    }

    async fn count(&self, collection: Collection) -> Result<u64> {
        self.inner.count(collection).await
    }
}

/// Payment gateway that records requested amounts.
#[derive(Default)]
pub struct FakeGateway {
    pub amounts: Mutex<Vec<i64>>,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_intent(&self, amount_cents: i64, currency: &str) -> Result<PaymentIntent> {
        assert_eq!(currency, "usd");
        self.amounts.lock().push(amount_cents);
        Ok(PaymentIntent {
            id: "pi_test".to_string(),
            client_secret: format!("pi_test_secret_{}", amount_cents),
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<CountingStore>,
    pub jwt: Arc<JwtHandler>,
    pub gateway: Arc<FakeGateway>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(true)
    }

    pub fn without_payments() -> Self {
        Self::build(false)
    }

    fn build(with_payments: bool) -> Self {
        let store = Arc::new(CountingStore::default());
        let jwt = Arc::new(JwtHandler::new(SECRET).unwrap());
        let gateway = Arc::new(FakeGateway::default());
        let payments: Option<Arc<dyn PaymentGateway>> = if with_payments {
            Some(gateway.clone())
        } else {
            None
        };

        let state = AppState::new(store.clone(), jwt.clone(), payments);
        Self {
            router: create_router(state),
            store,
            jwt,
            gateway,
        }
    }

    pub fn token(&self, email: &str) -> String {
        self.jwt.issue(email).unwrap()
    }

    /// Insert a user document directly and return its id.
    pub async fn seed_user(&self, email: &str, role: Option<&str>) -> String {
        let mut doc = json!({ "email": email, "name": "Seeded" });
        if let Some(role) = role {
            doc["role"] = json!(role);
        }
        self.store
            .insert_one(Collection::Users, doc.as_object().cloned().unwrap())
            .await
            .unwrap()
            .inserted_id
    }

    pub async fn set_role(&self, id: &str, role: &str) {
        let set = json!({ "role": role }).as_object().cloned().unwrap();
        self.store
            .update_by_id(Collection::Users, id, set, false)
            .await
            .unwrap();
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
        };
        (status, body)
    }

    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let auth = token.map(|t| format!("Bearer {}", t));
        self.send(request(method, uri, auth.as_deref(), body)).await
    }
}

/// Build a request with an optional raw `Authorization` header value.
pub fn request(
    method: &str,
    uri: &str,
    authorization: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn unauthorized_body() -> Value {
    json!({ "error": true, "message": "Unauthorized Access" })
}

pub fn forbidden_body() -> Value {
    json!({ "error": true, "message": "Forbidden User" })
}
