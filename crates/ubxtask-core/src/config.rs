use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use crate::constants::{KEY_CFG_DIR, KEY_ROOT_DIR, KEY_VSCODE_DIR, REQUIRED_KEYS, VSCODE_SUBDIR};
use crate::paths::{PathOverrides, RepoPaths};

/// Shared configuration handed to every task.
///
/// Built once at startup and never mutated afterwards; the namespace owns it
/// and lends it to tasks by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    root_dir: PathBuf,
    vscode_dir: PathBuf,
    cfg_dir: PathBuf,
    settings: BTreeMap<String, String>,
}

impl Config {
    pub fn new(root_dir: impl Into<PathBuf>, cfg_dir: impl Into<PathBuf>) -> Self {
        let root_dir = root_dir.into();
        let vscode_dir = root_dir.join(VSCODE_SUBDIR);
        Self {
            root_dir,
            vscode_dir,
            cfg_dir: cfg_dir.into(),
            settings: BTreeMap::new(),
        }
    }

    pub fn from_paths(paths: &RepoPaths) -> Self {
        Self::new(&paths.root_dir, &paths.automation_dir)
    }

    /// Attaches free-form settings. Entries named like a required key are
    /// dropped so they can never shadow the resolved paths.
    pub fn with_settings(mut self, settings: BTreeMap<String, String>) -> Self {
        for (key, value) in settings {
            if REQUIRED_KEYS.contains(&key.as_str()) {
                warn!("ignoring setting '{}': reserved configuration key", key);
                continue;
            }
            self.settings.insert(key, value);
        }
        self
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn vscode_dir(&self) -> &Path {
        &self.vscode_dir
    }

    pub fn cfg_dir(&self) -> &Path {
        &self.cfg_dir
    }

    /// A free-form setting from the config file.
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    /// Looks up any configuration value by key, paths included.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            KEY_ROOT_DIR => Some(self.root_dir.display().to_string()),
            KEY_VSCODE_DIR => Some(self.vscode_dir.display().to_string()),
            KEY_CFG_DIR => Some(self.cfg_dir.display().to_string()),
            other => self.setting(other).map(ToOwned::to_owned),
        }
    }

    /// All key/value pairs, required keys first, then settings in key order.
    pub fn entries(&self) -> Vec<(String, String)> {
        REQUIRED_KEYS
            .iter()
            .map(|key| (key.to_string(), self.get(key).unwrap_or_default()))
            .chain(
                self.settings
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone())),
            )
            .collect()
    }
}

/// On-disk configuration, read from a TOML file passed on the command line.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub root_dir: Option<PathBuf>,
    pub cfg_dir: Option<PathBuf>,
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

impl ConfigFile {
    /// Loads a config file. Relative paths inside it are taken relative to
    /// the directory holding the file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let mut cfg = toml::from_str::<Self>(&text)
            .with_context(|| format!("failed to parse TOML config: {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        cfg.root_dir = cfg.root_dir.map(|dir| base.join(dir));
        cfg.cfg_dir = cfg.cfg_dir.map(|dir| base.join(dir));
        Ok(cfg)
    }

    pub fn path_overrides(&self) -> PathOverrides {
        PathOverrides {
            root_dir: self.root_dir.clone(),
            cfg_dir: self.cfg_dir.clone(),
        }
    }
}
