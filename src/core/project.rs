//! Project model.

use crate::core::Task;
use serde::{Deserialize, Serialize};

/// Top-level scheduling entity owning an ordered list of tasks.
///
/// `id` is assigned by the caller and is the join key for task rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub tasks: Vec<Task>,
}

impl Project {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            tasks: Vec::new(),
        }
    }

    /// Append a task and return a handle to it for further edits.
    pub fn add_task(&mut self, task: Task) -> &mut Task {
        self.tasks.push(task);
        let last = self.tasks.len() - 1;
        &mut self.tasks[last]
    }

    /// Find the first task with the given name.
    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name == name)
    }
}
