use std::fmt::{Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

/// Address of a task inside the root namespace: `<collection>.<task>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskRef {
    pub collection: String,
    pub task: String,
}

impl TaskRef {
    pub fn canonical(&self) -> String {
        format!("{}.{}", self.collection, self.task)
    }
}

impl Display for TaskRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

/// Task names are dash-separated; underscores are accepted as an alias.
pub fn normalize_task_name(name: &str) -> String {
    name.replace('_', "-")
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskRefParseError {
    #[error("task '{0}' must be written as <collection>.<task>")]
    MissingSeparator(String),
    #[error("task '{0}' has an empty collection or task name")]
    EmptyPart(String),
}

impl FromStr for TaskRef {
    type Err = TaskRefParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (collection, task) = value
            .split_once('.')
            .ok_or_else(|| TaskRefParseError::MissingSeparator(value.to_string()))?;

        if collection.is_empty() || task.is_empty() {
            return Err(TaskRefParseError::EmptyPart(value.to_string()));
        }

        Ok(Self {
            collection: collection.to_string(),
            task: normalize_task_name(task),
        })
    }
}
