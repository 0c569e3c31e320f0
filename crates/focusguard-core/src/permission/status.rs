//! Permission status snapshot and the degraded-mode classifier.

use serde::{Deserialize, Serialize};

/// Error text used on both capabilities when the probe itself failed.
pub const CHECK_FAILED_MESSAGE: &str = "Failed to check permissions";

/// Overall functional state derived from the two capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    /// Website and app blocking both work.
    FullyFunctional,
    /// Exactly one of the two capabilities is available.
    Degraded,
    /// Neither capability is available.
    NonFunctional,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::FullyFunctional => "fully_functional",
            OverallStatus::Degraded => "degraded",
            OverallStatus::NonFunctional => "non_functional",
        }
    }
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map the two capability flags to an overall status.
pub fn classify(hosts_writable: bool, process_available: bool) -> OverallStatus {
    match (hosts_writable, process_available) {
        (true, true) => OverallStatus::FullyFunctional,
        (false, false) => OverallStatus::NonFunctional,
        _ => OverallStatus::Degraded,
    }
}

/// An OS-level capability the blocking features depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Write access to the hosts file (website blocking).
    HostsFile,
    /// Ability to enumerate running processes (app blocking).
    ProcessMonitoring,
}

impl Capability {
    pub const ALL: [Capability; 2] = [Capability::HostsFile, Capability::ProcessMonitoring];

    /// The user-facing feature that stops working without this capability.
    pub fn feature_name(&self) -> &'static str {
        match self {
            Capability::HostsFile => "website blocking",
            Capability::ProcessMonitoring => "app blocking",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Capability::HostsFile => "Hosts file access",
            Capability::ProcessMonitoring => "Process monitoring",
        }
    }
}

/// Raw answer of the `check_permissions` backend command.
///
/// `overall_status` is whatever the backend claims; it is never used as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionReport {
    pub hosts_file_writable: bool,
    #[serde(default)]
    pub hosts_file_error: Option<String>,
    pub process_monitoring_available: bool,
    #[serde(default)]
    pub process_monitoring_error: Option<String>,
    #[serde(default)]
    pub overall_status: Option<OverallStatus>,
}

/// Immutable snapshot of what the blocking features can currently do.
///
/// `overall_status` is always `classify(hosts_file_writable,
/// process_monitoring_available)`; the fields are private so it cannot drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionStatus {
    hosts_file_writable: bool,
    hosts_file_error: Option<String>,
    process_monitoring_available: bool,
    process_monitoring_error: Option<String>,
    overall_status: OverallStatus,
}

impl PermissionStatus {
    pub fn new(
        hosts_file_writable: bool,
        hosts_file_error: Option<String>,
        process_monitoring_available: bool,
        process_monitoring_error: Option<String>,
    ) -> Self {
        Self {
            hosts_file_writable,
            hosts_file_error,
            process_monitoring_available,
            process_monitoring_error,
            overall_status: classify(hosts_file_writable, process_monitoring_available),
        }
    }

    /// Status installed when the probe could not be run at all.
    pub fn check_failed() -> Self {
        Self::new(
            false,
            Some(CHECK_FAILED_MESSAGE.to_string()),
            false,
            Some(CHECK_FAILED_MESSAGE.to_string()),
        )
    }

    pub fn hosts_file_writable(&self) -> bool {
        self.hosts_file_writable
    }

    pub fn hosts_file_error(&self) -> Option<&str> {
        self.hosts_file_error.as_deref()
    }

    pub fn process_monitoring_available(&self) -> bool {
        self.process_monitoring_available
    }

    pub fn process_monitoring_error(&self) -> Option<&str> {
        self.process_monitoring_error.as_deref()
    }

    pub fn overall_status(&self) -> OverallStatus {
        self.overall_status
    }

    pub fn is_available(&self, capability: Capability) -> bool {
        match capability {
            Capability::HostsFile => self.hosts_file_writable,
            Capability::ProcessMonitoring => self.process_monitoring_available,
        }
    }

    pub fn error_for(&self, capability: Capability) -> Option<&str> {
        match capability {
            Capability::HostsFile => self.hosts_file_error(),
            Capability::ProcessMonitoring => self.process_monitoring_error(),
        }
    }

    /// Capabilities that are currently missing, in display order.
    pub fn unavailable(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| !self.is_available(*c))
            .collect()
    }
}

impl From<PermissionReport> for PermissionStatus {
    fn from(report: PermissionReport) -> Self {
        let status = Self::new(
            report.hosts_file_writable,
            report.hosts_file_error,
            report.process_monitoring_available,
            report.process_monitoring_error,
        );
        if let Some(claimed) = report.overall_status {
            if claimed != status.overall_status {
                tracing::warn!(
                    claimed = %claimed,
                    derived = %status.overall_status,
                    "backend overall status disagrees with capability flags; using derived value"
                );
            }
        }
        status
    }
}

impl<'de> Deserialize<'de> for PermissionStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        PermissionReport::deserialize(deserializer).map(PermissionStatus::from)
    }
}
