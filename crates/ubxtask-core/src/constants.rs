//! Constants used across the ubxtask workspace.

/// Environment variable that pins the repository root.
pub const ENV_ROOT_DIR: &str = "UBXLIB_DIR";

/// The automation directory, relative to the repository root. Its presence
/// also marks a directory as the repository root during discovery.
pub const AUTOMATION_SUBDIR: &str = "port/platform/common/automation";

/// The VS Code settings directory, relative to the repository root.
pub const VSCODE_SUBDIR: &str = ".vscode";

/// Default parent of per-collection build output, relative to the root.
pub const BUILD_SUBDIR: &str = "_build";

/// Configuration keys every task can rely on.
pub const KEY_ROOT_DIR: &str = "root_dir";
pub const KEY_VSCODE_DIR: &str = "vscode_dir";
pub const KEY_CFG_DIR: &str = "cfg_dir";

pub const REQUIRED_KEYS: [&str; 3] = [KEY_ROOT_DIR, KEY_VSCODE_DIR, KEY_CFG_DIR];
