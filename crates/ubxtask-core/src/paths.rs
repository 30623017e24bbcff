use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::constants::{AUTOMATION_SUBDIR, ENV_ROOT_DIR};

#[derive(Debug, Error)]
pub enum PathError {
    #[error("repository root '{0}' does not exist or is not a directory")]
    MissingRoot(PathBuf),
    #[error("automation directory '{0}' does not exist or is not a directory")]
    MissingAutomationDir(PathBuf),
    #[error(
        "no ubxlib repository found at or above '{0}' \
         (expected a port/platform/common/automation directory; set UBXLIB_DIR to override)"
    )]
    RootNotFound(PathBuf),
}

/// Explicit path choices that take priority over discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathOverrides {
    pub root_dir: Option<PathBuf>,
    pub cfg_dir: Option<PathBuf>,
}

impl PathOverrides {
    /// Reads the repository root from `UBXLIB_DIR`, if set and non-empty.
    pub fn from_env() -> Self {
        let root_dir = std::env::var_os(ENV_ROOT_DIR)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self {
            root_dir,
            cfg_dir: None,
        }
    }

    /// Fills unset fields from `fallback`; fields already set win.
    pub fn or(self, fallback: PathOverrides) -> Self {
        Self {
            root_dir: self.root_dir.or(fallback.root_dir),
            cfg_dir: self.cfg_dir.or(fallback.cfg_dir),
        }
    }
}

/// The two directories every task needs: the repository root and the
/// automation configuration directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPaths {
    pub root_dir: PathBuf,
    pub automation_dir: PathBuf,
}

impl RepoPaths {
    /// Resolves the repository paths.
    ///
    /// An explicit root wins; otherwise the directories from `start` upward
    /// are searched for the automation directory marker. Both results are
    /// absolute, with `.`/`..` components, symlinks and trailing separators
    /// resolved.
    ///
    /// # Errors
    /// Fails if an explicit directory does not exist or if no repository root
    /// can be located.
    pub fn resolve(start: &Path, overrides: &PathOverrides) -> Result<Self, PathError> {
        let root_dir = match &overrides.root_dir {
            Some(root) => {
                let resolved =
                    existing_dir(root).ok_or_else(|| PathError::MissingRoot(root.clone()))?;
                debug!("using explicit repository root: {}", resolved.display());
                resolved
            }
            None => find_root(start)
                .as_deref()
                .and_then(existing_dir)
                .ok_or_else(|| PathError::RootNotFound(start.to_path_buf()))?,
        };

        let automation_dir = match &overrides.cfg_dir {
            Some(dir) => {
                existing_dir(dir).ok_or_else(|| PathError::MissingAutomationDir(dir.clone()))?
            }
            None => root_dir.join(AUTOMATION_SUBDIR),
        };

        Ok(Self {
            root_dir,
            automation_dir,
        })
    }
}

/// Canonical form of `dir`, or `None` unless it is an existing directory.
fn existing_dir(dir: &Path) -> Option<PathBuf> {
    dir.canonicalize().ok().filter(|resolved| resolved.is_dir())
}

/// Walks up from `start` to the first directory holding the automation tree.
pub fn find_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(AUTOMATION_SUBDIR).is_dir())
        .map(|dir| {
            debug!("discovered repository root: {}", dir.display());
            dir.to_path_buf()
        })
}
