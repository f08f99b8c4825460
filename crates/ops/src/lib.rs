//! Focal ops: row actions over a list store (view, edit, toggle-status, delete).
//!
//! One dispatcher per view, constructed next to the store it mutates. Every
//! invocation runs idle, in-flight, then success or failure; a second
//! invocation for the same (entity, action) pair while one is unresolved is
//! rejected, never queued. There are no retries, no backoff, and no
//! cancellation; a late resolution whose view has unmounted is dropped
//! instead of mutating.

#![forbid(unsafe_code)]

mod validate;

pub use validate::{Validate, USERNAME_MIN_LEN};

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Instant;

use rustc_hash::FxHashSet;
use tracing::{debug, info, warn};

use focal_api::{ApiError, ApiResult, Resource};
use focal_core::{Entity, EntityId, ToggleStatus};
use focal_store::ListStore;

/// Literal an operator must type before a destructive action proceeds.
pub const DELETE_CONFIRMATION: &str = "DELETE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    View,
    Edit,
    Toggle,
    Delete,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::View => "view",
            ActionKind::Edit => "edit",
            ActionKind::Toggle => "toggle",
            ActionKind::Delete => "delete",
        }
    }
}

/// How toggle-status persists: through the remote endpoint, or purely local
/// for kinds with no backing endpoint. Fixed per dispatcher, never mixed per
/// action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleMode {
    ServerConfirmed,
    LocalOnly,
}

/// Terminal state of one action invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The remote call (if any) succeeded and the store reflects the result.
    Applied,
    /// Rejected by the in-flight guard; nothing was sent or mutated.
    RejectedInFlight,
    /// The owning view unmounted mid-flight; the resolution was dropped.
    StoreGone,
}

// ---- notifications ----

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: ToastKind,
    pub text: String,
}

impl Toast {
    pub fn success(text: impl Into<String>) -> Self {
        Self { kind: ToastKind::Success, text: text.into() }
    }

    pub fn warn(text: impl Into<String>) -> Self {
        Self { kind: ToastKind::Warn, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { kind: ToastKind::Error, text: text.into() }
    }
}

/// Fire-and-forget sink for user-visible notifications; the dispatcher depends
/// on no return value.
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

/// Routes toasts into the log stream; the sink the CLI runs with.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, toast: Toast) {
        match toast.kind {
            ToastKind::Info | ToastKind::Success => info!(toast = %toast.text, "notify"),
            ToastKind::Warn => warn!(toast = %toast.text, "notify"),
            ToastKind::Error => tracing::error!(toast = %toast.text, "notify"),
        }
    }
}

// ---- in-flight guard ----

/// Tracks (entity, action) pairs with an unresolved invocation. `try_begin`
/// hands out an RAII permit or rejects; the permit releases on drop so failure
/// paths cannot leak a stuck entry.
#[derive(Default)]
pub struct InflightGuard {
    active: Mutex<FxHashSet<(EntityId, ActionKind)>>,
}

pub struct InflightPermit<'a> {
    guard: &'a InflightGuard,
    key: (EntityId, ActionKind),
}

impl InflightGuard {
    pub fn try_begin(&self, id: EntityId, action: ActionKind) -> Option<InflightPermit<'_>> {
        let mut active = lock(&self.active);
        if !active.insert((id, action)) {
            return None;
        }
        Some(InflightPermit { guard: self, key: (id, action) })
    }

    pub fn is_in_flight(&self, id: EntityId, action: ActionKind) -> bool {
        lock(&self.active).contains(&(id, action))
    }
}

impl Drop for InflightPermit<'_> {
    fn drop(&mut self) {
        lock(&self.guard.active).remove(&self.key);
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

// ---- dispatcher ----

/// Translates user-initiated row actions into an optional remote call followed
/// by a local store mutation. Holds the store weakly: the view owns the store,
/// and a resolution arriving after the view is gone must not mutate anything.
pub struct Dispatcher<T: Entity> {
    source: Arc<dyn Resource<T>>,
    store: Weak<ListStore<T>>,
    notifier: Arc<dyn Notifier>,
    inflight: InflightGuard,
    toggle_mode: ToggleMode,
}

impl<T: Entity> Dispatcher<T> {
    pub fn new(
        source: Arc<dyn Resource<T>>,
        store: &Arc<ListStore<T>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            source,
            store: Arc::downgrade(store),
            notifier,
            inflight: InflightGuard::default(),
            toggle_mode: ToggleMode::ServerConfirmed,
        }
    }

    pub fn with_toggle_mode(mut self, mode: ToggleMode) -> Self {
        self.toggle_mode = mode;
        self
    }

    pub fn is_in_flight(&self, id: EntityId, action: ActionKind) -> bool {
        self.inflight.is_in_flight(id, action)
    }

    /// Fetch the detail projection for one row. Falls back to the already
    /// known row on any failure; opening the detail view is never blocked and
    /// this action never errors.
    pub async fn view(&self, row: &T) -> T {
        let id = row.id();
        let Some(_permit) = self.inflight.try_begin(id, ActionKind::View) else {
            self.reject(id, ActionKind::View);
            return row.clone();
        };
        count_action::<T>(ActionKind::View);
        match self.source.fetch_one(id).await {
            Ok(detail) => detail,
            Err(e) => {
                warn!(kind = T::KIND.as_str(), id, error = %e, "ops: detail fetch failed; using row projection");
                self.notifier.notify(Toast::warn(format!(
                    "Could not load details for #{}; showing the cached row",
                    id
                )));
                row.clone()
            }
        }
    }

    /// Validate locally, then persist the patch and mirror the submitted
    /// fields into the store. Validation failures never reach the remote.
    pub async fn edit(&self, id: EntityId, patch: T::Patch) -> ApiResult<Outcome>
    where
        T::Patch: Validate,
    {
        patch.validate()?;
        let Some(_permit) = self.inflight.try_begin(id, ActionKind::Edit) else {
            self.reject(id, ActionKind::Edit);
            return Ok(Outcome::RejectedInFlight);
        };
        count_action::<T>(ActionKind::Edit);
        let t0 = Instant::now();
        match self.source.update_one(id, patch.clone()).await {
            Ok(_updated) => {
                let Some(store) = self.store.upgrade() else {
                    debug!(kind = T::KIND.as_str(), id, "ops: edit resolved after unmount; dropped");
                    return Ok(Outcome::StoreGone);
                };
                store.patch(id, &patch);
                info!(kind = T::KIND.as_str(), id, took_ms = %t0.elapsed().as_millis(), "ops: edit ok");
                self.notifier.notify(Toast::success(format!("Saved changes to #{}", id)));
                Ok(Outcome::Applied)
            }
            Err(e) => {
                warn!(kind = T::KIND.as_str(), id, error = %e, "ops: edit failed");
                self.notifier.notify(Toast::error(format!("Save failed: {}", e)));
                Err(e)
            }
        }
    }

    /// Flip the entity's two-valued status. Server-confirmed or local-only per
    /// the dispatcher's mode; the guard makes rapid re-invocations rejections
    /// rather than queued duplicates.
    pub async fn toggle_status(&self, id: EntityId) -> ApiResult<Outcome>
    where
        T: ToggleStatus,
    {
        let Some(store) = self.store.upgrade() else {
            return Ok(Outcome::StoreGone);
        };
        let Some(current) = store.current().items.iter().find(|t| t.id() == id).cloned() else {
            return Err(ApiError::NotFound(format!("{} {}", T::KIND.as_str(), id)));
        };
        drop(store);

        let Some(_permit) = self.inflight.try_begin(id, ActionKind::Toggle) else {
            self.reject(id, ActionKind::Toggle);
            return Ok(Outcome::RejectedInFlight);
        };
        count_action::<T>(ActionKind::Toggle);
        let t0 = Instant::now();
        let patch = current.toggle_patch();
        if self.toggle_mode == ToggleMode::ServerConfirmed {
            if let Err(e) = self.source.update_one(id, patch.clone()).await {
                warn!(kind = T::KIND.as_str(), id, error = %e, "ops: toggle failed");
                self.notifier.notify(Toast::error(format!("Status change failed: {}", e)));
                return Err(e);
            }
        }
        let Some(store) = self.store.upgrade() else {
            debug!(kind = T::KIND.as_str(), id, "ops: toggle resolved after unmount; dropped");
            return Ok(Outcome::StoreGone);
        };
        store.patch(id, &patch);
        let verb = if current.is_active() { "deactivated" } else { "activated" };
        info!(kind = T::KIND.as_str(), id, verb, took_ms = %t0.elapsed().as_millis(), "ops: toggle ok");
        self.notifier.notify(Toast::success(format!("#{} {}", id, verb)));
        Ok(Outcome::Applied)
    }

    /// Destructive delete, gated on the typed confirmation phrase. A mismatch
    /// aborts before any remote call; a remote failure leaves the store
    /// untouched.
    pub async fn delete(&self, id: EntityId, typed_phrase: &str) -> ApiResult<Outcome> {
        if typed_phrase != DELETE_CONFIRMATION {
            return Err(ApiError::Confirmation(format!(
                "type {} to confirm deleting {} {}",
                DELETE_CONFIRMATION,
                T::KIND.as_str(),
                id
            )));
        }
        let Some(_permit) = self.inflight.try_begin(id, ActionKind::Delete) else {
            self.reject(id, ActionKind::Delete);
            return Ok(Outcome::RejectedInFlight);
        };
        count_action::<T>(ActionKind::Delete);
        let t0 = Instant::now();
        match self.source.delete_one(id).await {
            Ok(()) => {
                let Some(store) = self.store.upgrade() else {
                    debug!(kind = T::KIND.as_str(), id, "ops: delete resolved after unmount; dropped");
                    return Ok(Outcome::StoreGone);
                };
                store.remove(id);
                info!(kind = T::KIND.as_str(), id, took_ms = %t0.elapsed().as_millis(), "ops: delete ok");
                self.notifier.notify(Toast::success(format!("Deleted {} #{}", T::KIND.as_str(), id)));
                Ok(Outcome::Applied)
            }
            Err(e) => {
                warn!(kind = T::KIND.as_str(), id, error = %e, "ops: delete failed");
                self.notifier.notify(Toast::error(format!("Delete failed: {}", e)));
                Err(e)
            }
        }
    }

    fn reject(&self, id: EntityId, action: ActionKind) {
        debug!(kind = T::KIND.as_str(), id, action = action.as_str(), "ops: rejected, already in flight");
        metrics::counter!(
            "actions_rejected_total",
            1u64,
            "kind" => T::KIND.as_str(),
            "action" => action.as_str()
        );
    }
}

fn count_action<T: Entity>(action: ActionKind) {
    metrics::counter!(
        "actions_total",
        1u64,
        "kind" => T::KIND.as_str(),
        "action" => action.as_str()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use focal_api::MockResource;
    use focal_core::{AccountStatus, User, UserPatch};
    use smallvec::smallvec;
    use std::sync::atomic::Ordering;

    fn user(id: u64, name: &str, status: AccountStatus) -> User {
        User {
            id,
            username: format!("{}{}", name.to_lowercase(), id),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
            roles: smallvec![focal_core::Role::User],
            status,
            created_ts: 0,
        }
    }

    struct Recorder(Mutex<Vec<Toast>>);

    impl Recorder {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(Vec::new())))
        }

        fn kinds(&self) -> Vec<ToastKind> {
            lock(&self.0).iter().map(|t| t.kind).collect()
        }
    }

    impl Notifier for Recorder {
        fn notify(&self, toast: Toast) {
            lock(&self.0).push(toast);
        }
    }

    fn rig(
        items: Vec<User>,
    ) -> (Arc<MockResource<User>>, Arc<ListStore<User>>, Arc<Recorder>, Arc<Dispatcher<User>>) {
        let source = Arc::new(MockResource::new(items.clone()));
        let store = ListStore::new();
        store.replace_all(items);
        let recorder = Recorder::new();
        let notifier: Arc<dyn Notifier> = recorder.clone();
        let remote: Arc<dyn Resource<User>> = source.clone();
        let dispatcher = Arc::new(Dispatcher::new(remote, &store, notifier));
        (source, store, recorder, dispatcher)
    }

    #[tokio::test]
    async fn rapid_double_toggle_issues_one_remote_call() {
        let (source, store, _rec, dispatcher) = rig(vec![user(2, "Bob", AccountStatus::Inactive)]);
        let gate = Arc::new(tokio::sync::Semaphore::new(0));
        source.hold_with(Some(gate.clone()));

        let first = tokio::spawn({
            let d = dispatcher.clone();
            async move { d.toggle_status(2).await }
        });

        // wait until the first invocation is pinned in flight
        while !dispatcher.is_in_flight(2, ActionKind::Toggle) {
            tokio::task::yield_now().await;
        }

        let second = dispatcher.toggle_status(2).await.expect("rejected, not an error");
        assert_eq!(second, Outcome::RejectedInFlight);
        assert_eq!(source.calls.update_one.load(Ordering::SeqCst), 1);

        gate.add_permits(1);
        let outcome = first.await.expect("join").expect("first toggle resolves");
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(source.calls.update_one.load(Ordering::SeqCst), 1);
        assert_eq!(store.current().items[0].status, AccountStatus::Active);

        // guard released: a later toggle goes through again
        source.hold_with(None);
        let third = dispatcher.toggle_status(2).await.expect("third toggle");
        assert_eq!(third, Outcome::Applied);
        assert_eq!(source.calls.update_one.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn toggles_on_different_entities_run_independently() {
        let (source, _store, _rec, dispatcher) = rig(vec![
            user(1, "Anna", AccountStatus::Active),
            user(2, "Bob", AccountStatus::Inactive),
        ]);
        let gate = Arc::new(tokio::sync::Semaphore::new(0));
        source.hold_with(Some(gate.clone()));

        let first = tokio::spawn({
            let d = dispatcher.clone();
            async move { d.toggle_status(1).await }
        });
        let second = tokio::spawn({
            let d = dispatcher.clone();
            async move { d.toggle_status(2).await }
        });

        // both reach the remote: neither entity blocks the other
        while source.calls.update_one.load(Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }

        gate.add_permits(2);
        assert_eq!(first.await.expect("join").expect("ok"), Outcome::Applied);
        assert_eq!(second.await.expect("join").expect("ok"), Outcome::Applied);
    }

    #[tokio::test]
    async fn delete_without_matching_phrase_never_calls_remote() {
        let (source, store, _rec, dispatcher) = rig(vec![user(1, "Anna", AccountStatus::Active)]);

        for phrase in ["", "delete", "DELET", "yes please"] {
            let err = dispatcher.delete(1, phrase).await.expect_err("blocked");
            assert!(matches!(err, ApiError::Confirmation(_)));
        }
        assert_eq!(source.calls.delete_one.load(Ordering::SeqCst), 0);
        assert_eq!(store.current().items.len(), 1);
    }

    #[tokio::test]
    async fn confirmed_delete_removes_from_store() {
        let (source, store, rec, dispatcher) =
            rig(vec![user(1, "Anna", AccountStatus::Active), user(2, "Bob", AccountStatus::Active)]);

        let outcome = dispatcher.delete(1, DELETE_CONFIRMATION).await.expect("deleted");
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(source.calls.delete_one.load(Ordering::SeqCst), 1);
        assert_eq!(store.current().items.len(), 1);
        assert_eq!(store.current().items[0].id, 2);
        assert_eq!(rec.kinds(), vec![ToastKind::Success]);
    }

    #[tokio::test]
    async fn failed_delete_leaves_store_untouched_and_surfaces() {
        let (source, store, rec, dispatcher) = rig(vec![user(1, "Anna", AccountStatus::Active)]);
        source.fail_with(Some(ApiError::Network("502".into())));

        let err = dispatcher.delete(1, DELETE_CONFIRMATION).await.expect_err("fails");
        assert!(matches!(err, ApiError::Network(_)));
        assert_eq!(store.current().items.len(), 1);
        assert_eq!(rec.kinds(), vec![ToastKind::Error]);
    }

    #[tokio::test]
    async fn edit_validation_failure_blocks_the_remote_call() {
        let (source, store, _rec, dispatcher) = rig(vec![user(1, "Anna", AccountStatus::Active)]);

        let patch = UserPatch { email: Some("not-an-email".into()), ..Default::default() };
        let err = dispatcher.edit(1, patch).await.expect_err("invalid");
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(source.calls.update_one.load(Ordering::SeqCst), 0);
        assert_eq!(store.current().items[0].email, "anna@example.com");
    }

    #[tokio::test]
    async fn edit_success_patches_the_store() {
        let (_source, store, _rec, dispatcher) = rig(vec![user(1, "Anna", AccountStatus::Active)]);

        let patch = UserPatch { name: Some("Anna Q.".into()), ..Default::default() };
        let outcome = dispatcher.edit(1, patch).await.expect("saved");
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(store.current().items[0].name, "Anna Q.");
    }

    #[tokio::test]
    async fn view_falls_back_to_the_row_on_fetch_failure() {
        let (source, _store, rec, dispatcher) = rig(vec![user(1, "Anna", AccountStatus::Active)]);
        source.fail_with(Some(ApiError::Network("timeout".into())));

        let row = user(1, "Anna", AccountStatus::Active);
        let shown = dispatcher.view(&row).await;
        assert_eq!(shown, row, "failure is non-fatal; the known projection opens");
        assert_eq!(rec.kinds(), vec![ToastKind::Warn]);
    }

    #[tokio::test]
    async fn late_resolution_after_unmount_mutates_nothing() {
        let (source, store, _rec, dispatcher) = rig(vec![user(1, "Anna", AccountStatus::Active)]);
        let gate = Arc::new(tokio::sync::Semaphore::new(0));
        source.hold_with(Some(gate.clone()));

        let edit = tokio::spawn({
            let d = dispatcher.clone();
            async move {
                d.edit(1, UserPatch { name: Some("Late".into()), ..Default::default() }).await
            }
        });
        while !dispatcher.is_in_flight(1, ActionKind::Edit) {
            tokio::task::yield_now().await;
        }

        // the view unmounts while the call is in flight
        drop(store);
        gate.add_permits(1);

        let outcome = edit.await.expect("join").expect("resolves");
        assert_eq!(outcome, Outcome::StoreGone);
        // the remote call did happen; only the local mutation was dropped
        assert_eq!(source.calls.update_one.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn toggle_on_unknown_id_is_not_found() {
        let (_source, _store, _rec, dispatcher) = rig(vec![user(1, "Anna", AccountStatus::Active)]);
        let err = dispatcher.toggle_status(99).await.expect_err("missing");
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn local_only_toggle_skips_the_remote() {
        let source = Arc::new(MockResource::new(vec![user(1, "Anna", AccountStatus::Active)]));
        let store = ListStore::new();
        store.replace_all(vec![user(1, "Anna", AccountStatus::Active)]);
        let remote: Arc<dyn Resource<User>> = source.clone();
        let dispatcher = Dispatcher::new(remote, &store, Arc::new(LogNotifier))
            .with_toggle_mode(ToggleMode::LocalOnly);

        let outcome = dispatcher.toggle_status(1).await.expect("local toggle");
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(source.calls.update_one.load(Ordering::SeqCst), 0);
        assert_eq!(store.current().items[0].status, AccountStatus::Inactive);
    }
}
