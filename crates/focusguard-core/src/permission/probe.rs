//! The capability probe (`check_permissions`) and its normalizing query.
//!
//! A probe answers one question: can we write the hosts file, and can we see
//! the process list? [`query_permissions`] wraps any probe so that callers
//! always get a well-formed [`PermissionStatus`] back, never an error.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use async_trait::async_trait;

use super::status::{PermissionReport, PermissionStatus};
use crate::error::ProbeError;
use crate::platform::Platform;

/// Backend that reports OS-level capabilities.
///
/// Implementations must be idempotent: calling `check` repeatedly only
/// re-probes the OS.
#[async_trait]
pub trait PermissionProbe: Send + Sync {
    async fn check(&self) -> Result<PermissionReport, ProbeError>;
}

/// Run a probe and normalize its answer.
///
/// Transport errors and timeouts are absorbed into
/// [`PermissionStatus::check_failed`]. There are no retries.
pub async fn query_permissions(
    probe: &dyn PermissionProbe,
    timeout: Option<Duration>,
) -> PermissionStatus {
    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, probe.check()).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::TimedOut {
                timeout_ms: limit.as_millis() as u64,
            }),
        },
        None => probe.check().await,
    };

    match outcome {
        Ok(report) => PermissionStatus::from(report),
        Err(err) => {
            tracing::warn!(error = %err, "permission check failed");
            PermissionStatus::check_failed()
        }
    }
}

/// Probe that inspects the local machine directly.
#[derive(Debug, Clone)]
pub struct SystemProbe {
    hosts_path: PathBuf,
    platform: Platform,
}

impl SystemProbe {
    pub fn new(hosts_path: PathBuf, platform: Platform) -> Self {
        Self {
            hosts_path,
            platform,
        }
    }

    /// Probe the platform's default hosts file, unless `hosts_path` overrides it.
    /// An empty override counts as no override.
    pub fn for_current_platform(hosts_path: Option<PathBuf>) -> Self {
        let platform = Platform::detect();
        let hosts_path = hosts_path
            .filter(|path| !path.as_os_str().is_empty())
            .unwrap_or_else(|| default_hosts_path(platform));
        Self::new(hosts_path, platform)
    }

    pub fn hosts_path(&self) -> &Path {
        &self.hosts_path
    }

    fn probe_blocking(&self) -> PermissionReport {
        let (hosts_file_writable, hosts_file_error) = probe_hosts_file(&self.hosts_path);
        let (process_monitoring_available, process_monitoring_error) =
            probe_process_list(self.platform);
        tracing::debug!(
            hosts_file_writable,
            process_monitoring_available,
            hosts_path = %self.hosts_path.display(),
            "system permission probe finished"
        );
        PermissionReport {
            hosts_file_writable,
            hosts_file_error,
            process_monitoring_available,
            process_monitoring_error,
            overall_status: None,
        }
    }
}

#[async_trait]
impl PermissionProbe for SystemProbe {
    async fn check(&self) -> Result<PermissionReport, ProbeError> {
        let probe = self.clone();
        let report = tokio::task::spawn_blocking(move || probe.probe_blocking()).await?;
        Ok(report)
    }
}

/// Location of the hosts file on `platform`.
pub fn default_hosts_path(platform: Platform) -> PathBuf {
    match platform {
        Platform::Windows => {
            let root = std::env::var("SystemRoot").unwrap_or_else(|_| r"C:\Windows".to_string());
            PathBuf::from(root)
                .join("System32")
                .join("drivers")
                .join("etc")
                .join("hosts")
        }
        Platform::MacOS | Platform::Linux => PathBuf::from("/etc/hosts"),
    }
}

/// Open the hosts file for append without writing anything.
fn probe_hosts_file(path: &Path) -> (bool, Option<String>) {
    match OpenOptions::new().append(true).open(path) {
        Ok(_) => (true, None),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => (
            false,
            Some(format!("Permission denied writing to {}", path.display())),
        ),
        Err(e) => (
            false,
            Some(format!("Cannot open {} for writing: {e}", path.display())),
        ),
    }
}

fn probe_process_list(platform: Platform) -> (bool, Option<String>) {
    let result = match platform {
        Platform::Linux => count_proc_entries(),
        Platform::MacOS => count_command_lines("ps", &["-axo", "pid="]),
        Platform::Windows => count_command_lines("tasklist", &["/fo", "csv", "/nh"]),
    };
    match result {
        Ok(0) => (
            false,
            Some("Unable to access process list: no processes visible".to_string()),
        ),
        Ok(_) => (true, None),
        Err(e) => (false, Some(format!("Unable to access process list: {e}"))),
    }
}

fn count_proc_entries() -> std::io::Result<usize> {
    let mut count = 0;
    for entry in std::fs::read_dir("/proc")? {
        let entry = entry?;
        let is_pid = entry
            .file_name()
            .to_str()
            .map(|name| !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()))
            .unwrap_or(false);
        if is_pid {
            count += 1;
        }
    }
    Ok(count)
}

fn count_command_lines(program: &str, args: &[&str]) -> std::io::Result<usize> {
    let output = Command::new(program).args(args).output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(std::io::Error::other(format!(
            "{program} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::status::{OverallStatus, CHECK_FAILED_MESSAGE};

    struct FailingProbe;

    #[async_trait]
    impl PermissionProbe for FailingProbe {
        async fn check(&self) -> Result<PermissionReport, ProbeError> {
            Err(ProbeError::Backend("connection refused".into()))
        }
    }

    struct HangingProbe;

    #[async_trait]
    impl PermissionProbe for HangingProbe {
        async fn check(&self) -> Result<PermissionReport, ProbeError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn failure_is_synthesized_into_non_functional() {
        let status = query_permissions(&FailingProbe, None).await;
        assert_eq!(status, PermissionStatus::check_failed());
        assert_eq!(status.hosts_file_error(), Some(CHECK_FAILED_MESSAGE));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_synthesized_into_non_functional() {
        let status = query_permissions(&HangingProbe, Some(Duration::from_secs(10))).await;
        assert_eq!(status.overall_status(), OverallStatus::NonFunctional);
    }

    #[test]
    fn writable_temp_file_is_reported_writable() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let (writable, error) = probe_hosts_file(file.path());
        assert!(writable);
        assert!(error.is_none());
    }

    #[test]
    fn missing_hosts_file_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-hosts");
        let (writable, error) = probe_hosts_file(&path);
        assert!(!writable);
        assert!(error.unwrap().contains("no-such-hosts"));
    }

    #[test]
    fn default_hosts_path_per_platform() {
        assert_eq!(default_hosts_path(Platform::Linux), PathBuf::from("/etc/hosts"));
        assert_eq!(default_hosts_path(Platform::MacOS), PathBuf::from("/etc/hosts"));
        assert!(default_hosts_path(Platform::Windows).ends_with("hosts"));
    }

    #[test]
    fn empty_override_falls_back_to_default_hosts_path() {
        let probe = SystemProbe::for_current_platform(Some(PathBuf::new()));
        assert_eq!(probe.hosts_path(), default_hosts_path(Platform::detect()).as_path());
    }

    #[tokio::test]
    async fn system_probe_against_temp_hosts_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let probe = SystemProbe::for_current_platform(Some(file.path().to_path_buf()));
        let report = probe.check().await.unwrap();
        assert!(report.hosts_file_writable);
        assert!(report.overall_status.is_none());
    }
}
