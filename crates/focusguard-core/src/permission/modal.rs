//! Remediation modal: per-capability status plus platform-specific steps.
//!
//! Two visibility modes:
//!
//! - `Controlled`: the caller owns `open` and is told about changes through
//!   `on_open_change`. Never auto-opens, never reads the suppression flag.
//! - `Uncontrolled`: the modal owns `open`. It reads the suppression flag once
//!   when attached and auto-opens on any store change that reports a degraded
//!   status, unless suppressed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use super::status::{Capability, OverallStatus, PermissionStatus};
use super::store::{PermissionStore, StoreState, SubscriptionId};
use crate::platform::{instructions_for, Platform, PlatformInstructions};
use crate::preferences::SuppressionPreference;

type OpenChange = Arc<dyn Fn(bool) + Send + Sync>;

/// How the modal's visibility is driven, fixed at construction.
pub enum VisibilityMode {
    Controlled {
        open: bool,
        on_open_change: Box<dyn Fn(bool) + Send + Sync>,
    },
    Uncontrolled,
}

impl std::fmt::Debug for VisibilityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VisibilityMode::Controlled { open, .. } => {
                f.debug_struct("Controlled").field("open", open).finish_non_exhaustive()
            }
            VisibilityMode::Uncontrolled => f.write_str("Uncontrolled"),
        }
    }
}

enum Visibility {
    Controlled { open: bool, on_open_change: OpenChange },
    Uncontrolled { open: bool, suppressed: bool },
}

impl Visibility {
    fn is_open(&self) -> bool {
        match self {
            Visibility::Controlled { open, .. } | Visibility::Uncontrolled { open, .. } => *open,
        }
    }
}

struct ModalState {
    visibility: Visibility,
    dont_show_again: bool,
    checks_in_flight: usize,
}

/// One capability line in the modal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityRow {
    pub capability: Capability,
    pub title: &'static str,
    pub resolved: bool,
    pub explanation: &'static str,
    pub error: Option<String>,
}

impl CapabilityRow {
    fn build(capability: Capability, status: &PermissionStatus) -> Self {
        let resolved = status.is_available(capability);
        let explanation = match (capability, resolved) {
            (Capability::HostsFile, true) => {
                "FocusGuard can edit the hosts file, so website blocking works."
            }
            (Capability::HostsFile, false) => {
                "FocusGuard needs write access to the hosts file to block websites."
            }
            (Capability::ProcessMonitoring, true) => {
                "FocusGuard can see running apps, so app blocking works."
            }
            (Capability::ProcessMonitoring, false) => {
                "FocusGuard needs to see running processes to block apps."
            }
        };
        Self {
            capability,
            title: capability.title(),
            resolved,
            explanation,
            error: status.error_for(capability).map(str::to_string),
        }
    }
}

/// Everything the host needs to draw the modal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModalView {
    pub open: bool,
    pub checking: bool,
    pub dont_show_again: bool,
    pub overall_status: Option<OverallStatus>,
    /// Empty until the first check has completed.
    pub rows: Vec<CapabilityRow>,
    pub platform: Platform,
    pub instructions: &'static PlatformInstructions,
}

impl ModalView {
    pub fn build(
        state: &StoreState,
        platform: Platform,
        open: bool,
        checking: bool,
        dont_show_again: bool,
    ) -> Self {
        let rows: Vec<CapabilityRow> = state
            .status
            .as_ref()
            .map(|status| {
                Capability::ALL
                    .into_iter()
                    .map(|c| CapabilityRow::build(c, status))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            open,
            checking,
            dont_show_again,
            overall_status: state.overall_status(),
            rows,
            platform,
            instructions: instructions_for(platform),
        }
    }
}

/// Modal bound to a store, a suppression flag and a platform.
pub struct RemediationModal {
    store: Arc<PermissionStore>,
    suppression: SuppressionPreference,
    platform: Platform,
    state: Mutex<ModalState>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl RemediationModal {
    /// Build the modal and, in uncontrolled mode, start following the store.
    pub fn attach(
        store: Arc<PermissionStore>,
        mode: VisibilityMode,
        suppression: SuppressionPreference,
        platform: Platform,
    ) -> Arc<Self> {
        let uncontrolled = matches!(mode, VisibilityMode::Uncontrolled);
        let visibility = match mode {
            VisibilityMode::Controlled {
                open,
                on_open_change,
            } => Visibility::Controlled {
                open,
                on_open_change: Arc::from(on_open_change),
            },
            VisibilityMode::Uncontrolled => Visibility::Uncontrolled {
                open: false,
                suppressed: suppression.is_set(),
            },
        };

        let modal = Arc::new(Self {
            store: Arc::clone(&store),
            suppression,
            platform,
            state: Mutex::new(ModalState {
                visibility,
                dont_show_again: false,
                checks_in_flight: 0,
            }),
            subscription: Mutex::new(None),
        });

        if uncontrolled {
            let weak = Arc::downgrade(&modal);
            let id = store.subscribe(move |state| {
                if let Some(modal) = weak.upgrade() {
                    modal.on_store_change(state);
                }
            });
            *lock(&modal.subscription) = Some(id);
            modal.on_store_change(&store.state());
        }

        modal
    }

    /// Auto-open check, run for every store state in uncontrolled mode.
    pub fn on_store_change(&self, state: &StoreState) {
        let mut inner = lock(&self.state);
        if let Visibility::Uncontrolled { open, suppressed } = &mut inner.visibility {
            if state.is_degraded() && !*suppressed && !*open {
                tracing::debug!(overall = ?state.overall_status(), "auto-opening permission modal");
                *open = true;
            }
        }
    }

    pub fn is_open(&self) -> bool {
        lock(&self.state).visibility.is_open()
    }

    pub fn is_checking(&self) -> bool {
        lock(&self.state).checks_in_flight > 0
    }

    pub fn dont_show_again(&self) -> bool {
        lock(&self.state).dont_show_again
    }

    pub fn set_dont_show_again(&self, checked: bool) {
        lock(&self.state).dont_show_again = checked;
    }

    /// Caller-driven visibility. In controlled mode this is the `open` prop;
    /// in uncontrolled mode it opens or closes directly.
    pub fn set_open(&self, value: bool) {
        match &mut lock(&self.state).visibility {
            Visibility::Controlled { open, .. } | Visibility::Uncontrolled { open, .. } => {
                *open = value
            }
        }
    }

    /// Ask for the modal to be shown, e.g. from the banner's fix action.
    pub fn request_open(&self) {
        self.change_open(true);
    }

    /// Close, persisting the suppression flag first if the user asked for it.
    pub fn dismiss(&self) {
        if self.dont_show_again() {
            let recorded = self.suppression.set();
            if let Visibility::Uncontrolled { suppressed, .. } = &mut lock(&self.state).visibility {
                *suppressed = recorded;
            }
        }
        self.change_open(false);
    }

    /// Re-probe through the store. The modal stays open afterwards.
    pub async fn check_again(&self) {
        lock(&self.state).checks_in_flight += 1;
        self.store.recheck().await;
        let mut inner = lock(&self.state);
        inner.checks_in_flight = inner.checks_in_flight.saturating_sub(1);
    }

    pub fn view(&self) -> ModalView {
        let state = self.store.state();
        let inner = lock(&self.state);
        ModalView::build(
            &state,
            self.platform,
            inner.visibility.is_open(),
            inner.checks_in_flight > 0,
            inner.dont_show_again,
        )
    }

    /// Stop following the store.
    pub fn detach(&self) {
        if let Some(id) = lock(&self.subscription).take() {
            self.store.unsubscribe(id);
        }
    }

    fn change_open(&self, value: bool) {
        let callback = {
            let mut inner = lock(&self.state);
            match &mut inner.visibility {
                Visibility::Controlled { on_open_change, .. } => Some(Arc::clone(on_open_change)),
                Visibility::Uncontrolled { open, .. } => {
                    *open = value;
                    None
                }
            }
        };
        // Called without the lock held so it may call back into `set_open`.
        if let Some(on_open_change) = callback {
            on_open_change(value);
        }
    }
}

impl Drop for RemediationModal {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for RemediationModal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemediationModal")
            .field("platform", &self.platform)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::permission::probe::PermissionProbe;
    use crate::permission::status::PermissionReport;
    use crate::permission::store::StoreOptions;
    use crate::preferences::MemoryPreferenceStore;
    use async_trait::async_trait;

    struct FixedProbe(PermissionReport);

    #[async_trait]
    impl PermissionProbe for FixedProbe {
        async fn check(&self) -> Result<PermissionReport, ProbeError> {
            Ok(self.0.clone())
        }
    }

    fn report(hosts: bool, process: bool) -> PermissionReport {
        PermissionReport {
            hosts_file_writable: hosts,
            hosts_file_error: (!hosts).then(|| "Permission denied writing to /etc/hosts".into()),
            process_monitoring_available: process,
            process_monitoring_error: (!process).then(|| "Unable to access process list".into()),
            overall_status: None,
        }
    }

    fn store_for(hosts: bool, process: bool) -> Arc<PermissionStore> {
        PermissionStore::new(
            Arc::new(FixedProbe(report(hosts, process))),
            StoreOptions::default(),
        )
    }

    fn suppression() -> SuppressionPreference {
        SuppressionPreference::new(Arc::new(MemoryPreferenceStore::new()))
    }

    #[tokio::test]
    async fn uncontrolled_auto_opens_when_degraded() {
        let store = store_for(true, false);
        let modal = RemediationModal::attach(
            Arc::clone(&store),
            VisibilityMode::Uncontrolled,
            suppression(),
            Platform::Linux,
        );
        assert!(!modal.is_open());

        store.recheck().await;
        assert!(modal.is_open());

        let view = modal.view();
        assert_eq!(view.rows.len(), 2);
        assert!(view.rows[0].resolved);
        assert!(!view.rows[1].resolved);
        assert_eq!(
            view.rows[1].error.as_deref(),
            Some("Unable to access process list")
        );
    }

    #[tokio::test]
    async fn uncontrolled_stays_closed_when_fully_functional() {
        let store = store_for(true, true);
        let modal = RemediationModal::attach(
            Arc::clone(&store),
            VisibilityMode::Uncontrolled,
            suppression(),
            Platform::MacOS,
        );
        store.recheck().await;
        assert!(!modal.is_open());
        assert_eq!(modal.view().instructions.platform, Platform::MacOS);
    }

    #[tokio::test]
    async fn dismiss_without_checkbox_does_not_persist() {
        let store = store_for(false, false);
        let pref = suppression();
        let modal = RemediationModal::attach(
            Arc::clone(&store),
            VisibilityMode::Uncontrolled,
            pref.clone(),
            Platform::Linux,
        );
        store.recheck().await;
        modal.dismiss();
        assert!(!modal.is_open());
        assert!(!pref.is_set());

        // Still degraded on the next check, so it comes back.
        store.recheck().await;
        assert!(modal.is_open());
    }

    #[tokio::test]
    async fn dismiss_with_checkbox_persists_and_stays_closed() {
        let store = store_for(false, false);
        let pref = suppression();
        let modal = RemediationModal::attach(
            Arc::clone(&store),
            VisibilityMode::Uncontrolled,
            pref.clone(),
            Platform::Linux,
        );
        store.recheck().await;
        modal.set_dont_show_again(true);
        modal.dismiss();
        assert!(pref.is_set());

        store.recheck().await;
        assert!(!modal.is_open());
    }

    #[tokio::test]
    async fn controlled_never_auto_opens() {
        let store = store_for(false, false);
        let requested = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&requested);
        let modal = RemediationModal::attach(
            Arc::clone(&store),
            VisibilityMode::Controlled {
                open: false,
                on_open_change: Box::new(move |open| sink.lock().unwrap().push(open)),
            },
            suppression(),
            Platform::Windows,
        );
        store.recheck().await;
        modal.on_store_change(&store.state());
        assert!(!modal.is_open());
        assert_eq!(store.subscriber_count(), 0);

        modal.request_open();
        assert!(!modal.is_open());
        assert_eq!(*requested.lock().unwrap(), vec![true]);

        modal.set_open(true);
        assert!(modal.is_open());
    }

    #[tokio::test]
    async fn check_again_keeps_modal_open() {
        let store = store_for(true, false);
        let modal = RemediationModal::attach(
            Arc::clone(&store),
            VisibilityMode::Uncontrolled,
            suppression(),
            Platform::Linux,
        );
        store.recheck().await;
        assert!(modal.is_open());

        modal.check_again().await;
        assert!(modal.is_open());
        assert!(!modal.is_checking());
    }

    #[test]
    fn dropping_modal_unsubscribes() {
        let store = store_for(true, true);
        let modal = RemediationModal::attach(
            Arc::clone(&store),
            VisibilityMode::Uncontrolled,
            suppression(),
            Platform::Linux,
        );
        assert_eq!(store.subscriber_count(), 1);
        drop(modal);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn view_has_no_rows_before_first_check() {
        let view = ModalView::build(&StoreState::initial(), Platform::Linux, true, false, false);
        assert!(view.rows.is_empty());
        assert!(view.overall_status.is_none());
    }
}
