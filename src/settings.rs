use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compiler::flags::AcceptedFlags;
use crate::compiler::{CompileOptions, DEFAULT_MAX_INCLUDE_DEPTH};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unknown mode '{0}' (expected lsl, aurora, whitecore, or assl)")]
    UnknownMode(String),
    #[error("Unknown extension '{0}' (expected admin)")]
    UnknownExtension(String),
}

// ── Compiler settings ────────────────────────────────────────────

/// Compiler defaults stored as `lslc.json` in the config directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerSettings {
    pub version: u32,
    /// Mode used by scripts without a `//#!Mode:` directive.
    #[serde(default = "default_mode")]
    pub default_mode: String,
    /// Extensions enabled for every script, on top of its own directives.
    #[serde(default)]
    pub enable: Vec<String>,
    /// Searched for includes after the including script's directory.
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,
    #[serde(default = "default_max_include_depth")]
    pub max_include_depth: usize,
}

const SETTINGS_VERSION: u32 = 1;

fn default_mode() -> String {
    "aurora".to_owned()
}

fn default_max_include_depth() -> usize {
    DEFAULT_MAX_INCLUDE_DEPTH
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            default_mode: default_mode(),
            enable: Vec::new(),
            include_dirs: Vec::new(),
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }
}

impl CompilerSettings {
    /// Options for the front end. Fails on an unrecognized mode or extension.
    pub fn compile_options(&self) -> Result<CompileOptions, SettingsError> {
        let mut default_flags = AcceptedFlags::for_mode(&self.default_mode)
            .ok_or_else(|| SettingsError::UnknownMode(self.default_mode.clone()))?;
        for name in &self.enable {
            default_flags |=
                AcceptedFlags::for_extension(name).ok_or_else(|| SettingsError::UnknownExtension(name.clone()))?;
        }
        Ok(CompileOptions {
            default_flags,
            max_include_depth: self.max_include_depth,
            include_dirs: self.include_dirs.clone(),
        })
    }
}

/// Load settings from the config directory. A missing file yields defaults.
pub fn load_settings(config_dir: &Path) -> Result<CompilerSettings, SettingsError> {
    let path = crate::paths::settings_path(config_dir);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no settings file, using defaults");
        return Ok(CompilerSettings::default());
    }
    let data = fs::read_to_string(&path)?;
    let settings: CompilerSettings = serde_json::from_str(&data)?;
    if settings.version > SETTINGS_VERSION {
        tracing::warn!(version = settings.version, "settings file is newer than this compiler");
    }
    Ok(settings)
}

pub fn save_settings(config_dir: &Path, settings: &CompilerSettings) -> Result<(), SettingsError> {
    fs::create_dir_all(config_dir)?;
    let json = serde_json::to_string_pretty(settings)?;
    atomic_write(&crate::paths::settings_path(config_dir), json.as_bytes())
}

/// Write to a sibling `.tmp` file, then rename over the target.
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), SettingsError> {
    let mut tmp_name = OsString::from(path.file_name().unwrap_or_default());
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(&tmp_name);

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let settings = CompilerSettings {
            default_mode: "lsl".into(),
            enable: vec!["admin".into()],
            include_dirs: vec![PathBuf::from("/opt/lsl/include")],
            ..CompilerSettings::default()
        };
        save_settings(dir.path(), &settings).unwrap();

        let loaded = load_settings(dir.path()).unwrap();
        assert_eq!(loaded, settings);
        let options = loaded.compile_options().unwrap();
        assert_eq!(options.default_flags, AcceptedFlags::LSL | AcceptedFlags::ADMIN);
        assert_eq!(options.include_dirs.len(), 1);
    }

    #[test]
    fn test_load_missing_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_settings(&dir.path().join("nowhere")).unwrap();
        assert_eq!(loaded, CompilerSettings::default());
        assert_eq!(loaded.compile_options().unwrap(), CompileOptions::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(crate::paths::settings_path(dir.path()), r#"{ "version": 1 }"#).unwrap();
        let loaded = load_settings(dir.path()).unwrap();
        assert_eq!(loaded.default_mode, "aurora");
        assert_eq!(loaded.max_include_depth, DEFAULT_MAX_INCLUDE_DEPTH);
    }

    #[test]
    fn test_bad_values() {
        let bad_mode = CompilerSettings {
            default_mode: "cobol".into(),
            ..CompilerSettings::default()
        };
        assert!(matches!(bad_mode.compile_options(), Err(SettingsError::UnknownMode(_))));

        let dir = tempfile::tempdir().unwrap();
        fs::write(crate::paths::settings_path(dir.path()), "{ not json").unwrap();
        assert!(matches!(load_settings(dir.path()), Err(SettingsError::Json(_))));
    }
}
