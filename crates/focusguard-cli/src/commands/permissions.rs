//! Permission status, remediation guidance and the modal suppression flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Subcommand;
use focusguard_core::{
    Config, FilePreferenceStore, ModalView, PermissionBanner, PermissionStore, Platform,
    RemediationModal, StoreState, SuppressionPreference, SystemProbe, VisibilityMode,
};

#[derive(Subcommand)]
pub enum PermissionsAction {
    /// Probe hosts-file and process-list access and print the status
    Check {
        /// Print the raw store state as JSON
        #[arg(long)]
        json: bool,
        /// When degraded, also show the remediation steps
        #[arg(long)]
        fix: bool,
    },
    /// Show per-capability status and steps to fix missing permissions
    Explain {
        /// Print the dialog model as JSON
        #[arg(long)]
        json: bool,
        /// Show instructions for this OS instead of the detected one
        #[arg(long)]
        platform: Option<String>,
    },
    /// Manage the "don't show again" flag of the permission dialog
    Suppression {
        #[command(subcommand)]
        action: SuppressionAction,
    },
}

#[derive(Subcommand)]
pub enum SuppressionAction {
    /// Print whether the dialog is suppressed
    Show,
    /// Stop the dialog from opening automatically
    Set,
    /// Let the dialog open automatically again
    Clear,
}

pub async fn run(action: PermissionsAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        PermissionsAction::Check { json, fix } => check(json, fix).await,
        PermissionsAction::Explain { json, platform } => explain(json, platform).await,
        PermissionsAction::Suppression { action } => suppression(action),
    }
}

/// Mount a store against the local machine and wait for its first check.
async fn checked_store(config: &Config) -> Result<Arc<PermissionStore>, Box<dyn std::error::Error>> {
    let probe = SystemProbe::for_current_platform(config.permissions.hosts_path.clone());
    tracing::debug!(hosts_path = %probe.hosts_path().display(), "checking permissions");
    let (store, first_check) =
        PermissionStore::mount(Arc::new(probe), config.permissions.store_options());
    first_check.await?;
    Ok(store)
}

async fn check(json: bool, fix: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let store = checked_store(&config).await?;
    let state = store.state();

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    print_status(&state);

    let fix_requested = Arc::new(AtomicBool::new(false));
    let banner = PermissionBanner::new({
        let fix_requested = Arc::clone(&fix_requested);
        move || fix_requested.store(true, Ordering::SeqCst)
    })
    .with_entrance_delay(config.ui.banner_entrance_delay());

    match banner.view(&state) {
        Some(view) => {
            println!();
            println!("{}", view.message);
            if let Some(detail) = &view.detail {
                println!("  {detail}");
            }
            if fix {
                banner.activate_fix();
            } else {
                println!(
                    "{}: run `focusguard permissions explain` or pass --fix.",
                    view.action_label
                );
            }
        }
        None => println!("All blocking features are available."),
    }

    if fix_requested.load(Ordering::SeqCst) {
        let modal = RemediationModal::attach(
            Arc::clone(&store),
            VisibilityMode::Controlled {
                open: true,
                on_open_change: Box::new(|_| {}),
            },
            suppression_preference()?,
            Platform::detect(),
        );
        println!();
        print_modal(&modal.view());
    }
    Ok(())
}

async fn explain(json: bool, platform: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let platform = platform
        .as_deref()
        .map(Platform::from_os_name)
        .unwrap_or_else(Platform::detect);
    let store = checked_store(&config).await?;

    // Asked for explicitly, so the dialog is caller-controlled and open.
    let modal = RemediationModal::attach(
        Arc::clone(&store),
        VisibilityMode::Controlled {
            open: true,
            on_open_change: Box::new(|_| {}),
        },
        suppression_preference()?,
        platform,
    );
    let view = modal.view();

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_modal(&view);
    }
    Ok(())
}

fn suppression(action: SuppressionAction) -> Result<(), Box<dyn std::error::Error>> {
    let pref = suppression_preference()?;
    match action {
        SuppressionAction::Show => {
            let state = if pref.try_is_set()? { "suppressed" } else { "not suppressed" };
            println!("{state}");
        }
        SuppressionAction::Set => {
            pref.try_set()?;
            println!("permission dialog suppressed");
        }
        SuppressionAction::Clear => {
            pref.clear()?;
            println!("permission dialog will open automatically again");
        }
    }
    Ok(())
}

fn suppression_preference() -> Result<SuppressionPreference, Box<dyn std::error::Error>> {
    Ok(SuppressionPreference::new(Arc::new(
        FilePreferenceStore::open_default()?,
    )))
}

fn print_status(state: &StoreState) {
    let Some(status) = &state.status else {
        println!("Status: unknown");
        return;
    };
    println!("Status: {}", status.overall_status());
    println!(
        "  Hosts file writable:          {}",
        yes_no(status.hosts_file_writable())
    );
    if let Some(error) = status.hosts_file_error() {
        println!("    {error}");
    }
    println!(
        "  Process monitoring available: {}",
        yes_no(status.process_monitoring_available())
    );
    if let Some(error) = status.process_monitoring_error() {
        println!("    {error}");
    }
}

fn print_modal(view: &ModalView) {
    match view.overall_status {
        Some(overall) => println!("Status: {overall}"),
        None => println!("Status: unknown"),
    }
    for row in &view.rows {
        let mark = if row.resolved { "[ok]" } else { "[!!]" };
        println!("{mark} {}", row.title);
        println!("     {}", row.explanation);
        if let Some(error) = &row.error {
            println!("     Error: {error}");
        }
    }

    let instructions = view.instructions;
    println!();
    println!("{}", instructions.title);
    println!();
    println!("Website blocking (hosts file):");
    for (i, step) in instructions.hosts_file_steps.iter().enumerate() {
        println!("  {}. {step}", i + 1);
    }
    println!();
    println!("App blocking (process monitoring):");
    for (i, step) in instructions.process_monitoring_steps.iter().enumerate() {
        println!("  {}. {step}", i + 1);
    }
    if let Some(note) = instructions.note {
        println!();
        println!("Note: {note}");
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
