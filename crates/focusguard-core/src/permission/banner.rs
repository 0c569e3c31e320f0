//! Persistent degraded-mode notice.
//!
//! The banner has no state of its own: whether it shows, and how, is a pure
//! function of the store state. Its one action is forwarded to a callback so
//! the host decides what "fix" means (usually opening the remediation modal).

use std::time::Duration;

use serde::Serialize;

use super::status::{Capability, OverallStatus};
use super::store::StoreState;

/// Default delay before the banner slides in.
pub const DEFAULT_ENTRANCE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerSeverity {
    /// Amber: one capability is missing.
    Degraded,
    /// Red: nothing works.
    NonFunctional,
}

/// What the banner shows when it is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BannerView {
    pub severity: BannerSeverity,
    pub unavailable: Vec<Capability>,
    pub message: String,
    /// Raw hosts-file error, only for the non-functional severity.
    pub detail: Option<String>,
    pub action_label: &'static str,
    #[serde(skip)]
    pub enter_after: Duration,
}

impl BannerView {
    /// `None` unless the store reports a degraded or non-functional status.
    pub fn from_state(state: &StoreState) -> Option<Self> {
        Self::from_state_with_delay(state, DEFAULT_ENTRANCE_DELAY)
    }

    pub fn from_state_with_delay(state: &StoreState, enter_after: Duration) -> Option<Self> {
        if !state.is_degraded() {
            return None;
        }
        let status = state.status.as_ref()?;

        let severity = match status.overall_status() {
            OverallStatus::NonFunctional => BannerSeverity::NonFunctional,
            _ => BannerSeverity::Degraded,
        };
        let unavailable = status.unavailable();
        let detail = match severity {
            BannerSeverity::NonFunctional => status.hosts_file_error().map(str::to_string),
            BannerSeverity::Degraded => None,
        };

        Some(Self {
            severity,
            message: banner_message(severity, &unavailable),
            unavailable,
            detail,
            action_label: "Fix permissions",
            enter_after,
        })
    }
}

fn banner_message(severity: BannerSeverity, unavailable: &[Capability]) -> String {
    let names: Vec<&str> = unavailable.iter().map(|c| c.feature_name()).collect();
    let features = names.join(" and ");
    let verb = if names.len() == 1 { "is" } else { "are" };
    match severity {
        BannerSeverity::Degraded => format!("Limited functionality: {features} {verb} unavailable."),
        BannerSeverity::NonFunctional => {
            format!("Blocking is not working: {features} {verb} unavailable.")
        }
    }
}

/// Banner bound to its caller-supplied fix action.
pub struct PermissionBanner {
    on_fix: Box<dyn Fn() + Send + Sync>,
    entrance_delay: Duration,
}

impl PermissionBanner {
    pub fn new<F>(on_fix: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            on_fix: Box::new(on_fix),
            entrance_delay: DEFAULT_ENTRANCE_DELAY,
        }
    }

    pub fn with_entrance_delay(mut self, delay: Duration) -> Self {
        self.entrance_delay = delay;
        self
    }

    pub fn view(&self, state: &StoreState) -> Option<BannerView> {
        BannerView::from_state_with_delay(state, self.entrance_delay)
    }

    /// The user pressed the fix control.
    pub fn activate_fix(&self) {
        (self.on_fix)();
    }
}

impl std::fmt::Debug for PermissionBanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionBanner")
            .field("entrance_delay", &self.entrance_delay)
            .finish_non_exhaustive()
    }
}
