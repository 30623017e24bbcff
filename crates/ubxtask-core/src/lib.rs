//! Core abstractions for the ubxtask runner.
//!
//! This crate defines repository path resolution, the shared configuration,
//! task references and arguments, the task collection contract, and the
//! root namespace that composes collections.

pub mod args;
pub mod collection;
pub mod config;
pub mod constants;
pub mod namespace;
pub mod paths;
pub mod task;

pub use args::{task_command, ArgError, TaskArgs};
pub use collection::{
    ExecutionAction, ParamSpec, TaskCollection, TaskContext, TaskError, TaskInfo, TaskStep,
};
pub use config::{Config, ConfigFile};
pub use namespace::{Namespace, NamespaceBuilder, NamespaceError, TaskListing};
pub use paths::{PathError, PathOverrides, RepoPaths};
pub use task::{TaskRef, TaskRefParseError};
