//! Focal remote data-source façade.
//!
//! This crate defines the narrow contract the console depends on: a typed
//! collection endpoint per entity kind plus single-object fetch/update/delete.
//! The transport (JSON over HTTP with bearer auth in production) is the
//! collaborator's concern; the shipped implementation is the in-process
//! [`FixtureBackend`] serving the seeded marketplace dataset.

#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use focal_core::{Booking, ContentItem, Entity, EntityId, Transaction, User};

mod seed;

/// Failure signal crossing the façade. Every kind is scoped to the single
/// action that raised it; none is fatal to the process.
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum ApiError {
    /// The remote call could not complete (transport or non-2xx).
    #[error("network: {0}")]
    Network(String),
    /// A field-level rule rejected the input before or at the remote boundary.
    #[error("validation: {0}")]
    Validation(String),
    /// Lookup by id matched nothing.
    #[error("not_found: {0}")]
    NotFound(String),
    /// Typed confirmation phrase did not match the required literal.
    #[error("confirmation: {0}")]
    Confirmation(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Request/response surface for one entity collection.
///
/// Contract: a distinguishable [`ApiError`] on any failure, never silent
/// partial data. Calls are fire-once; there is no retry and no backoff.
#[async_trait]
pub trait Resource<T: Entity>: Send + Sync {
    async fn fetch_collection(&self) -> ApiResult<Vec<T>>;
    async fn fetch_one(&self, id: EntityId) -> ApiResult<T>;
    async fn update_one(&self, id: EntityId, patch: T::Patch) -> ApiResult<T>;
    async fn delete_one(&self, id: EntityId) -> ApiResult<()>;
}

// ----------------- Mock implementation -----------------

#[derive(Debug, Default)]
pub struct CallCounts {
    pub fetch_collection: AtomicUsize,
    pub fetch_one: AtomicUsize,
    pub update_one: AtomicUsize,
    pub delete_one: AtomicUsize,
}

/// Scriptable in-memory implementation for tests.
///
/// `fail_with` makes every call fail with the given error; `hold` parks
/// fetch-one/update/delete calls on a zero-permit [`tokio::sync::Semaphore`]
/// so a test can keep invocations in flight while probing the guard, then
/// release them one `add_permits(1)` at a time.
pub struct MockResource<T: Entity> {
    items: Mutex<Vec<T>>,
    fail_with: Mutex<Option<ApiError>>,
    hold: Mutex<Option<Arc<tokio::sync::Semaphore>>>,
    pub calls: CallCounts,
}

impl<T: Entity> MockResource<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: Mutex::new(items),
            fail_with: Mutex::new(None),
            hold: Mutex::new(None),
            calls: CallCounts::default(),
        }
    }

    pub fn fail_with(&self, err: Option<ApiError>) {
        *lock(&self.fail_with) = err;
    }

    pub fn hold_with(&self, gate: Option<Arc<tokio::sync::Semaphore>>) {
        *lock(&self.hold) = gate;
    }

    pub fn items(&self) -> Vec<T> {
        lock(&self.items).clone()
    }

    fn failure(&self) -> Option<ApiError> {
        lock(&self.fail_with).clone()
    }

    async fn park(&self) {
        let gate = lock(&self.hold).clone();
        if let Some(sem) = gate {
            if let Ok(permit) = sem.acquire().await {
                permit.forget();
            }
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl<T: Entity> Resource<T> for MockResource<T> {
    async fn fetch_collection(&self) -> ApiResult<Vec<T>> {
        self.calls.fetch_collection.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.failure() {
            return Err(e);
        }
        Ok(lock(&self.items).clone())
    }

    async fn fetch_one(&self, id: EntityId) -> ApiResult<T> {
        self.calls.fetch_one.fetch_add(1, Ordering::SeqCst);
        self.park().await;
        if let Some(e) = self.failure() {
            return Err(e);
        }
        lock(&self.items)
            .iter()
            .find(|t| t.id() == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("{} {}", T::KIND.as_str(), id)))
    }

    async fn update_one(&self, id: EntityId, patch: T::Patch) -> ApiResult<T> {
        self.calls.update_one.fetch_add(1, Ordering::SeqCst);
        self.park().await;
        if let Some(e) = self.failure() {
            return Err(e);
        }
        let mut items = lock(&self.items);
        match items.iter_mut().find(|t| t.id() == id) {
            Some(t) => {
                t.apply_patch(&patch);
                Ok(t.clone())
            }
            None => Err(ApiError::NotFound(format!("{} {}", T::KIND.as_str(), id))),
        }
    }

    async fn delete_one(&self, id: EntityId) -> ApiResult<()> {
        self.calls.delete_one.fetch_add(1, Ordering::SeqCst);
        self.park().await;
        if let Some(e) = self.failure() {
            return Err(e);
        }
        let mut items = lock(&self.items);
        let before = items.len();
        items.retain(|t| t.id() != id);
        if items.len() == before {
            return Err(ApiError::NotFound(format!("{} {}", T::KIND.as_str(), id)));
        }
        Ok(())
    }
}

// ----------------- In-process fixture backend -----------------

/// The whole marketplace dataset the fixture backend serves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub bookings: Vec<Booking>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub content: Vec<ContentItem>,
}

impl Dataset {
    /// The built-in seed the console runs on when no fixture file is given.
    pub fn seed() -> Self {
        seed::dataset()
    }
}

/// In-process collaborator standing in for the production REST API. Server
/// truth lives behind one `RwLock`; reads clone out, mutations hold the write
/// lock for the duration of the call. Clones share the same server truth.
#[derive(Clone)]
pub struct FixtureBackend {
    data: Arc<RwLock<Dataset>>,
}

impl FixtureBackend {
    pub fn new(data: Dataset) -> Self {
        Self { data: Arc::new(RwLock::new(data)) }
    }

    pub fn seeded() -> Self {
        Self::new(Dataset::seed())
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(raw)?))
    }

    pub async fn dataset(&self) -> Dataset {
        self.data.read().await.clone()
    }
}

macro_rules! fixture_resource {
    ($ty:ty, $field:ident) => {
        #[async_trait]
        impl Resource<$ty> for FixtureBackend {
            async fn fetch_collection(&self) -> ApiResult<Vec<$ty>> {
                let t0 = Instant::now();
                let items = self.data.read().await.$field.clone();
                info!(
                    kind = <$ty as Entity>::KIND.as_str(),
                    count = items.len(),
                    took_ms = %t0.elapsed().as_millis(),
                    "api: fetch_collection ok"
                );
                Ok(items)
            }

            async fn fetch_one(&self, id: EntityId) -> ApiResult<$ty> {
                self.data
                    .read()
                    .await
                    .$field
                    .iter()
                    .find(|t| t.id() == id)
                    .cloned()
                    .ok_or_else(|| {
                        ApiError::NotFound(format!("{} {}", <$ty as Entity>::KIND.as_str(), id))
                    })
            }

            async fn update_one(&self, id: EntityId, patch: <$ty as Entity>::Patch) -> ApiResult<$ty> {
                let t0 = Instant::now();
                let mut data = self.data.write().await;
                match data.$field.iter_mut().find(|t| t.id() == id) {
                    Some(t) => {
                        t.apply_patch(&patch);
                        let updated = t.clone();
                        info!(
                            kind = <$ty as Entity>::KIND.as_str(),
                            id,
                            took_ms = %t0.elapsed().as_millis(),
                            "api: update_one ok"
                        );
                        Ok(updated)
                    }
                    None => Err(ApiError::NotFound(format!(
                        "{} {}",
                        <$ty as Entity>::KIND.as_str(),
                        id
                    ))),
                }
            }

            async fn delete_one(&self, id: EntityId) -> ApiResult<()> {
                let t0 = Instant::now();
                let mut data = self.data.write().await;
                let before = data.$field.len();
                data.$field.retain(|t| t.id() != id);
                if data.$field.len() == before {
                    return Err(ApiError::NotFound(format!(
                        "{} {}",
                        <$ty as Entity>::KIND.as_str(),
                        id
                    )));
                }
                info!(
                    kind = <$ty as Entity>::KIND.as_str(),
                    id,
                    took_ms = %t0.elapsed().as_millis(),
                    "api: delete_one ok"
                );
                Ok(())
            }
        }
    };
}

fixture_resource!(User, users);
fixture_resource!(Booking, bookings);
fixture_resource!(Transaction, transactions);
fixture_resource!(ContentItem, content);

#[cfg(test)]
mod tests {
    use super::*;
    use focal_core::{AccountStatus, UserPatch};

    #[tokio::test]
    async fn fixture_roundtrip_update_and_delete() {
        let backend = FixtureBackend::seeded();
        let users: Vec<User> = backend.fetch_collection().await.expect("seed users");
        assert!(!users.is_empty());
        let id = users[0].id;

        let patch = UserPatch { name: Some("Renamed".into()), ..UserPatch::default() };
        let updated: User = backend.update_one(id, patch).await.expect("update");
        assert_eq!(updated.name, "Renamed");

        let fetched: User = backend.fetch_one(id).await.expect("fetch");
        assert_eq!(fetched.name, "Renamed");

        Resource::<User>::delete_one(&backend, id).await.expect("delete");
        let err = Resource::<User>::fetch_one(&backend, id).await.expect_err("gone");
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn fixture_unknown_id_is_not_found() {
        let backend = FixtureBackend::seeded();
        let err = Resource::<Booking>::fetch_one(&backend, 999_999).await.expect_err("missing");
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn mock_failure_script_applies_to_every_call() {
        let mock = MockResource::<User>::new(Vec::new());
        mock.fail_with(Some(ApiError::Network("boom".into())));
        let err = mock.fetch_collection().await.expect_err("scripted failure");
        assert_eq!(err, ApiError::Network("boom".into()));
        assert_eq!(mock.calls.fetch_collection.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dataset_parses_from_json() {
        let raw = serde_json::to_string(&Dataset::seed()).expect("serialize seed");
        let backend = FixtureBackend::from_json(&raw).expect("parse");
        let ids: Vec<_> = futures_block(backend.dataset()).users.iter().map(|u| u.id).collect();
        assert!(!ids.is_empty());
    }

    fn futures_block<F: std::future::Future>(f: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("rt")
            .block_on(f)
    }

    #[test]
    fn status_toggle_updates_server_truth() {
        futures_block(async {
            let backend = FixtureBackend::seeded();
            let users: Vec<User> = backend.fetch_collection().await.expect("users");
            let target = users.iter().find(|u| u.status == AccountStatus::Active).expect("an active user");
            let patch = UserPatch { status: Some(AccountStatus::Inactive), ..UserPatch::default() };
            let updated: User = backend.update_one(target.id, patch).await.expect("update");
            assert_eq!(updated.status, AccountStatus::Inactive);
        });
    }
}
