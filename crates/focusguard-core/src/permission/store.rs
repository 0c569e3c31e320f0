//! Process-wide holder of the latest permission status.
//!
//! ## Lifecycle
//!
//! ```text
//! mount -> check -> (recheck)* -> drop
//! ```
//!
//! The store is created once per application surface and injected into every
//! consumer. It is only mutated by [`PermissionStore::recheck`]; consumers read
//! it through [`PermissionStore::state`] or by subscribing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;

use super::probe::{query_permissions, PermissionProbe};
use super::status::{OverallStatus, PermissionStatus};

/// Handle returned by [`PermissionStore::subscribe`].
pub type SubscriptionId = u64;

type Listener = Arc<dyn Fn(&StoreState) + Send + Sync>;

/// What consumers observe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    /// Absent until the first check completes.
    pub status: Option<PermissionStatus>,
    pub is_loading: bool,
    /// When the last check completed.
    pub checked_at: Option<DateTime<Utc>>,
}

impl StoreState {
    /// State right after mount: first check in flight, nothing known yet.
    pub fn initial() -> Self {
        Self {
            status: None,
            is_loading: true,
            checked_at: None,
        }
    }

    pub fn overall_status(&self) -> Option<OverallStatus> {
        self.status.as_ref().map(|s| s.overall_status())
    }

    pub fn has_full_permissions(&self) -> bool {
        self.overall_status() == Some(OverallStatus::FullyFunctional)
    }

    pub fn is_degraded(&self) -> bool {
        matches!(
            self.overall_status(),
            Some(OverallStatus::Degraded | OverallStatus::NonFunctional)
        )
    }
}

impl Default for StoreState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Tuning for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Upper bound on one backend round trip. `None` waits forever.
    pub check_timeout: Option<Duration>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            check_timeout: Some(Duration::from_secs(10)),
        }
    }
}

/// Observable permission state shared by the banner, the modal and any
/// feature that needs to know whether blocking works.
pub struct PermissionStore {
    probe: Arc<dyn PermissionProbe>,
    options: StoreOptions,
    state: Mutex<StoreState>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    /// Held from a transition until its listeners have run, so listeners see
    /// transitions in the order they were applied.
    notify_order: Mutex<()>,
    next_id: AtomicU64,
}

impl PermissionStore {
    /// Create a store without checking anything yet.
    pub fn new(probe: Arc<dyn PermissionProbe>, options: StoreOptions) -> Arc<Self> {
        Arc::new(Self {
            probe,
            options,
            state: Mutex::new(StoreState::initial()),
            listeners: Mutex::new(Vec::new()),
            notify_order: Mutex::new(()),
            next_id: AtomicU64::new(1),
        })
    }

    /// Create a store and start its one eager check on the tokio runtime.
    ///
    /// Must be called from within a runtime.
    pub fn mount(
        probe: Arc<dyn PermissionProbe>,
        options: StoreOptions,
    ) -> (Arc<Self>, JoinHandle<()>) {
        let store = Self::new(probe, options);
        let task = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.recheck().await })
        };
        (store, task)
    }

    pub fn state(&self) -> StoreState {
        lock(&self.state).clone()
    }

    /// Register a listener called after every state transition.
    ///
    /// Listeners run one transition at a time, in the order the transitions
    /// were applied, so the last snapshot a listener sees matches
    /// [`PermissionStore::state`].
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&StoreState) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.listeners).push((id, Arc::new(listener)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.listeners).len()
    }

    /// Probe again and install the result.
    ///
    /// Overlapping calls are not coalesced; whichever finishes last decides
    /// the final `status`.
    pub async fn recheck(&self) {
        self.update(|state| state.is_loading = true);

        let status = query_permissions(self.probe.as_ref(), self.options.check_timeout).await;
        tracing::debug!(overall = %status.overall_status(), "permission status updated");

        self.update(move |state| {
            state.status = Some(status);
            state.is_loading = false;
            state.checked_at = Some(Utc::now());
        });
    }

    fn update(&self, apply: impl FnOnce(&mut StoreState)) {
        let _order = lock(&self.notify_order);
        let snapshot = {
            let mut state = lock(&self.state);
            apply(&mut *state);
            state.clone()
        };
        self.notify(&snapshot);
    }

    fn notify(&self, snapshot: &StoreState) {
        // Listeners may subscribe or unsubscribe from inside the callback.
        let listeners: Vec<Listener> = lock(&self.listeners)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(snapshot);
        }
    }
}

impl std::fmt::Debug for PermissionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionStore")
            .field("options", &self.options)
            .field("state", &self.state())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::permission::status::PermissionReport;
    use async_trait::async_trait;

    struct FixedProbe(PermissionReport);

    #[async_trait]
    impl PermissionProbe for FixedProbe {
        async fn check(&self) -> Result<PermissionReport, ProbeError> {
            Ok(self.0.clone())
        }
    }

    fn degraded_report() -> PermissionReport {
        PermissionReport {
            hosts_file_writable: true,
            hosts_file_error: None,
            process_monitoring_available: false,
            process_monitoring_error: Some("Unable to access process list".into()),
            overall_status: None,
        }
    }

    #[test]
    fn initial_state_is_loading_and_not_degraded() {
        let state = StoreState::initial();
        assert!(state.is_loading);
        assert!(state.status.is_none());
        assert!(!state.is_degraded());
        assert!(!state.has_full_permissions());
    }

    #[tokio::test]
    async fn recheck_installs_status_and_clears_loading() {
        let store = PermissionStore::new(
            Arc::new(FixedProbe(degraded_report())),
            StoreOptions::default(),
        );
        store.recheck().await;

        let state = store.state();
        assert!(!state.is_loading);
        assert!(state.is_degraded());
        assert!(state.checked_at.is_some());
    }

    #[tokio::test]
    async fn listeners_see_loading_then_result() {
        let store = PermissionStore::new(
            Arc::new(FixedProbe(degraded_report())),
            StoreOptions::default(),
        );
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(move |state| sink.lock().unwrap().push(state.clone()));

        store.recheck().await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].is_loading);
        assert!(!seen[1].is_loading);
        assert_eq!(seen[1].overall_status(), Some(OverallStatus::Degraded));
    }

    #[tokio::test]
    async fn unsubscribed_listener_is_not_called() {
        let store = PermissionStore::new(
            Arc::new(FixedProbe(degraded_report())),
            StoreOptions::default(),
        );
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let id = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));

        store.recheck().await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.subscriber_count(), 0);
    }

    /// Alternates between a degraded and a fully functional answer.
    struct FlippingProbe(AtomicU64);

    #[async_trait]
    impl PermissionProbe for FlippingProbe {
        async fn check(&self) -> Result<PermissionReport, ProbeError> {
            let n = self.0.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            let mut report = degraded_report();
            if n % 2 == 0 {
                report.process_monitoring_available = true;
                report.process_monitoring_error = None;
            }
            Ok(report)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn last_notification_matches_state_under_concurrent_rechecks() {
        let store = PermissionStore::new(
            Arc::new(FlippingProbe(AtomicU64::new(0))),
            StoreOptions::default(),
        );
        let last_seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&last_seen);
        store.subscribe(move |state| *sink.lock().unwrap() = Some(state.clone()));

        let tasks: Vec<_> = (0..64)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.recheck().await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let last_seen = last_seen.lock().unwrap().clone();
        assert_eq!(last_seen, Some(store.state()));
    }

    #[tokio::test]
    async fn mount_runs_exactly_one_check() {
        let (store, task) = PermissionStore::mount(
            Arc::new(FixedProbe(degraded_report())),
            StoreOptions::default(),
        );
        task.await.unwrap();
        assert!(!store.state().is_loading);
        assert!(store.state().status.is_some());
    }
}
