//! Static remediation text per platform.

use serde::Serialize;

use super::Platform;

/// Steps the user can follow to grant the missing permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlatformInstructions {
    pub platform: Platform,
    pub title: &'static str,
    pub hosts_file_steps: &'static [&'static str],
    pub process_monitoring_steps: &'static [&'static str],
    pub note: Option<&'static str>,
}

const MACOS: PlatformInstructions = PlatformInstructions {
    platform: Platform::MacOS,
    title: "Grant permissions on macOS",
    hosts_file_steps: &[
        "Quit FocusGuard.",
        "Relaunch it and approve the administrator prompt when asked to modify /etc/hosts.",
        "If no prompt appears, run: sudo chmod 644 /etc/hosts && sudo chown root:admin /etc/hosts",
    ],
    process_monitoring_steps: &[
        "Open System Settings > Privacy & Security > Accessibility.",
        "Enable FocusGuard in the list (add it with + if it is missing).",
        "Also enable FocusGuard under Full Disk Access if app blocking still fails.",
    ],
    note: Some("Changes to Privacy & Security may require restarting FocusGuard."),
};

const WINDOWS: PlatformInstructions = PlatformInstructions {
    platform: Platform::Windows,
    title: "Grant permissions on Windows",
    hosts_file_steps: &[
        "Close FocusGuard.",
        "Right-click the FocusGuard shortcut and choose \"Run as administrator\".",
        "If your antivirus protects the hosts file, allow FocusGuard to modify it.",
    ],
    process_monitoring_steps: &[
        "Running as administrator also grants access to the process list.",
        "Check that your security software is not blocking FocusGuard.",
    ],
    note: Some("To always run elevated, open the shortcut's Properties > Compatibility and tick \"Run this program as an administrator\"."),
};

const LINUX: PlatformInstructions = PlatformInstructions {
    platform: Platform::Linux,
    title: "Grant permissions on Linux",
    hosts_file_steps: &[
        "Run FocusGuard with elevated privileges (for example through pkexec), or",
        "grant your user write access: sudo setfacl -m u:$USER:rw /etc/hosts",
    ],
    process_monitoring_steps: &[
        "Make sure /proc is mounted without hidepid, or add your user to the group allowed to see other processes.",
        "Sandboxed installs (Flatpak, Snap) may need permission to see host processes.",
    ],
    note: None,
};

/// Instructions for `platform`.
pub fn instructions_for(platform: Platform) -> &'static PlatformInstructions {
    match platform {
        Platform::MacOS => &MACOS,
        Platform::Windows => &WINDOWS,
        Platform::Linux => &LINUX,
    }
}
