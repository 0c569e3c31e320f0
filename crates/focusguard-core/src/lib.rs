//! # FocusGuard Core Library
//!
//! Website blocking in FocusGuard works by editing the hosts file, and app
//! blocking by watching the process list. Both need OS permissions the app
//! may not have. This library decides whether they work and what to tell the
//! user when they don't.
//!
//! ## Architecture
//!
//! - **Probe**: one idempotent capability check against the OS
//! - **Store**: shared, observable state refreshed only on request
//! - **Classifier**: pure mapping from capability flags to an overall status
//! - **Banner / Modal**: headless view models for the degraded-mode notice and
//!   the remediation dialog
//! - **Platform**: picks which remediation instructions apply
//!
//! ## Key Components
//!
//! - [`PermissionStore`]: observable permission state
//! - [`SystemProbe`]: the real `check_permissions` backend
//! - [`RemediationModal`]: remediation dialog state machine
//! - [`Config`]: application configuration management

pub mod error;
pub mod permission;
pub mod platform;
pub mod preferences;
pub mod storage;

pub use error::{ConfigError, CoreError, PreferenceError, ProbeError};
pub use permission::{
    classify, BannerSeverity, BannerView, Capability, ModalView, OverallStatus, PermissionBanner,
    PermissionProbe, PermissionReport, PermissionStatus, PermissionStore, RemediationModal,
    StoreOptions, StoreState, SystemProbe, VisibilityMode,
};
pub use platform::Platform;
pub use preferences::{
    FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, SuppressionPreference,
};
pub use storage::Config;
