use std::collections::{BTreeMap, BTreeSet};

use clap::Command;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::args::{task_command, TaskArgs};
use crate::collection::{ParamSpec, TaskCollection, TaskContext, TaskError, TaskInfo, TaskStep};
use crate::config::Config;
use crate::constants::REQUIRED_KEYS;
use crate::task::TaskRef;

#[derive(Debug, Error)]
pub enum NamespaceError {
    #[error("namespace was never configured")]
    Unconfigured,
    #[error("configuration key '{0}' is missing or empty")]
    MissingConfigKey(&'static str),
    #[error("invalid collection name '{0}'")]
    InvalidCollectionName(String),
    #[error("collection '{0}' is registered twice")]
    DuplicateCollection(String),
    #[error("collection '{0}' has no tasks")]
    EmptyCollection(String),
    #[error("required collection '{0}' was not added")]
    MissingCollection(String),
    #[error("unknown collection '{name}' (available: {available})")]
    UnknownCollection { name: String, available: String },
    #[error("unknown task '{task}' in collection '{collection}'")]
    UnknownTask { collection: String, task: String },
    #[error("{task}: {source}")]
    Task {
        task: String,
        #[source]
        source: TaskError,
    },
}

/// One row of the task listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskListing {
    pub collection: String,
    pub task: String,
    pub help: String,
    pub params: Vec<ParamSpec>,
}

/// Collects configuration and collections; `build` is the only way to get a
/// [`Namespace`], so a half-populated one is never handed out.
#[derive(Debug, Default)]
pub struct NamespaceBuilder {
    config: Option<Config>,
    collections: BTreeMap<String, Box<dyn TaskCollection>>,
    required: BTreeSet<String>,
}

impl NamespaceBuilder {
    pub fn configure(&mut self, config: Config) -> &mut Self {
        self.config = Some(config);
        self
    }

    /// Declares collections that must be present when building.
    pub fn require(&mut self, names: &[&str]) -> &mut Self {
        self.required
            .extend(names.iter().map(|name| name.to_string()));
        self
    }

    /// Adds a collection.
    ///
    /// # Errors
    /// Rejects names that are empty or contain `.`, collections without tasks,
    /// and names already taken.
    pub fn add_collection(
        &mut self,
        collection: Box<dyn TaskCollection>,
    ) -> Result<&mut Self, NamespaceError> {
        let name = collection.name().to_string();
        if name.is_empty() || name.contains('.') {
            return Err(NamespaceError::InvalidCollectionName(name));
        }
        if collection.tasks().is_empty() {
            return Err(NamespaceError::EmptyCollection(name));
        }
        if self.collections.contains_key(&name) {
            return Err(NamespaceError::DuplicateCollection(name));
        }

        debug!(
            "adding collection '{}' with {} tasks",
            name,
            collection.tasks().len()
        );
        self.collections.insert(name, collection);
        Ok(self)
    }

    /// Validates the collected pieces and produces the namespace.
    pub fn build(self) -> Result<Namespace, NamespaceError> {
        let config = self.config.ok_or(NamespaceError::Unconfigured)?;

        for key in REQUIRED_KEYS {
            if config.get(key).map_or(true, |value| value.is_empty()) {
                return Err(NamespaceError::MissingConfigKey(key));
            }
        }

        if let Some(missing) = self
            .required
            .iter()
            .find(|name| !self.collections.contains_key(*name))
        {
            return Err(NamespaceError::MissingCollection(missing.clone()));
        }

        Ok(Namespace {
            config,
            collections: self.collections,
        })
    }
}

/// The root of all task collections plus the shared configuration.
#[derive(Debug)]
pub struct Namespace {
    config: Config,
    collections: BTreeMap<String, Box<dyn TaskCollection>>,
}

impl Namespace {
    pub fn builder() -> NamespaceBuilder {
        NamespaceBuilder::default()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Collection names in sorted order.
    pub fn collection_names(&self) -> Vec<&str> {
        self.collections.keys().map(String::as_str).collect()
    }

    pub fn collection(&self, name: &str) -> Option<&dyn TaskCollection> {
        self.collections.get(name).map(|c| c.as_ref())
    }

    /// Every task, sorted by collection then in the order each collection
    /// declares them.
    pub fn list(&self) -> Vec<TaskListing> {
        self.collections
            .iter()
            .flat_map(|(name, collection)| {
                collection.tasks().iter().map(move |info| TaskListing {
                    collection: name.clone(),
                    task: format!("{}.{}", name, info.name),
                    help: info.help.to_string(),
                    params: info.params.to_vec(),
                })
            })
            .collect()
    }

    /// Finds the collection and description for a task reference.
    pub fn resolve(
        &self,
        task: &TaskRef,
    ) -> Result<(&dyn TaskCollection, &TaskInfo), NamespaceError> {
        let collection =
            self.collection(&task.collection)
                .ok_or_else(|| NamespaceError::UnknownCollection {
                    name: task.collection.clone(),
                    available: self.collection_names().join(", "),
                })?;

        let info = collection
            .task(&task.task)
            .ok_or_else(|| NamespaceError::UnknownTask {
                collection: task.collection.clone(),
                task: task.task.clone(),
            })?;

        Ok((collection, info))
    }

    /// The option parser for a task, named `<collection>.<task>` in usage
    /// and help output.
    pub fn command(&self, task: &TaskRef) -> Result<Command, NamespaceError> {
        let (_, info) = self.resolve(task)?;
        Ok(task_command(info).bin_name(task.canonical()))
    }

    /// Parses `raw_args` for the task and asks its collection for a plan.
    #[instrument(skip(self, raw_args))]
    pub fn plan(
        &self,
        task: &TaskRef,
        raw_args: &[String],
    ) -> Result<Vec<TaskStep>, NamespaceError> {
        let (collection, info) = self.resolve(task)?;
        let wrap = |source: TaskError| NamespaceError::Task {
            task: task.canonical(),
            source,
        };

        let command = task_command(info).bin_name(task.canonical());
        let args =
            TaskArgs::parse_with(command, info.params, raw_args).map_err(|e| wrap(e.into()))?;
        let ctx = TaskContext {
            config: &self.config,
            collection: collection.name(),
        };

        let steps = collection.plan(info.name, &ctx, &args).map_err(wrap)?;
        debug!("planned {} steps", steps.len());
        Ok(steps)
    }
}
