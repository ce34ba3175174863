//! Leaf filenames and path builders for the compiler's configuration files.

use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "lslc.json";

/// Directory name used under the platform config root.
pub const CONFIG_DIR_NAME: &str = "lslc";

pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join(SETTINGS_FILE)
}

/// Config directory when none is given: `$XDG_CONFIG_HOME/lslc`, then
/// `$HOME/.config/lslc`, then the working directory.
pub fn default_config_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg).join(CONFIG_DIR_NAME);
    }
    if let Some(home) = std::env::var_os("HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(home).join(".config").join(CONFIG_DIR_NAME);
    }
    PathBuf::from(".")
}
