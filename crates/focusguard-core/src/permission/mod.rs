//! Permission status and degraded-mode coordination.
//!
//! - [`probe`]: the `check_permissions` capability probe
//! - [`store`]: shared, observable permission state
//! - [`status`]: the status snapshot and its classifier
//! - [`banner`], [`modal`]: headless view models for the two UI surfaces

pub mod banner;
pub mod modal;
pub mod probe;
pub mod status;
pub mod store;

pub use banner::{BannerSeverity, BannerView, PermissionBanner};
pub use modal::{CapabilityRow, ModalView, RemediationModal, VisibilityMode};
pub use probe::{default_hosts_path, query_permissions, PermissionProbe, SystemProbe};
pub use status::{
    classify, Capability, OverallStatus, PermissionReport, PermissionStatus, CHECK_FAILED_MESSAGE,
};
pub use store::{PermissionStore, StoreOptions, StoreState, SubscriptionId};
