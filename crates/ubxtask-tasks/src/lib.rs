//! The root task namespace for ubxlib build automation.
//!
//! Each platform module contributes one task collection; [`bootstrap`]
//! resolves the repository paths, builds the shared [`Config`] and composes
//! all collections into a single [`Namespace`].

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, instrument};

use ubxtask_core::{
    Config, Namespace, NamespaceError, PathError, PathOverrides, RepoPaths, TaskCollection,
};

pub mod arduino;
pub mod automation;
mod common;
pub mod esp_idf;
pub mod linux;
pub mod nrf5;
pub mod nrfconnect;
pub mod stm32cube;

/// Collections every namespace must carry, in registration order.
pub const COLLECTIONS: [&str; 7] = [
    "nrfconnect",
    "nrf5",
    "stm32cube",
    "esp_idf",
    "arduino",
    "automation",
    "linux",
];

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to resolve repository paths")]
    Paths(#[from] PathError),
    #[error("failed to compose task namespace")]
    Namespace(#[from] NamespaceError),
}

/// One fresh instance of every platform collection.
pub fn collections() -> Vec<Box<dyn TaskCollection>> {
    vec![
        Box::new(nrfconnect::NrfConnectTasks),
        Box::new(nrf5::Nrf5Tasks),
        Box::new(stm32cube::Stm32CubeTasks),
        Box::new(esp_idf::EspIdfTasks),
        Box::new(arduino::ArduinoTasks),
        Box::new(automation::AutomationTasks),
        Box::new(linux::LinuxTasks),
    ]
}

/// Attaches `config` and all platform collections to a new namespace.
pub fn compose(config: Config) -> Result<Namespace, NamespaceError> {
    let mut builder = Namespace::builder();
    builder.configure(config).require(&COLLECTIONS);
    for collection in collections() {
        builder.add_collection(collection)?;
    }
    builder.build()
}

/// Builds the root namespace for the repository containing `start`.
///
/// # Errors
/// Fails if the repository paths cannot be resolved or the namespace cannot
/// be composed; nothing is returned in either case.
#[instrument(skip(overrides, settings))]
pub fn bootstrap(
    start: &Path,
    overrides: &PathOverrides,
    settings: &BTreeMap<String, String>,
) -> Result<Namespace, BootstrapError> {
    let paths = RepoPaths::resolve(start, overrides)?;
    debug!(
        "root_dir={} cfg_dir={}",
        paths.root_dir.display(),
        paths.automation_dir.display()
    );

    let config = Config::from_paths(&paths).with_settings(settings.clone());
    Ok(compose(config)?)
}
