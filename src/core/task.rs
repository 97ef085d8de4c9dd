//! Task model.

use crate::core::Duration;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A unit of work inside a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    pub start: Option<NaiveDateTime>,
    pub finish: Option<NaiveDateTime>,
    pub duration: Option<Duration>,
}

impl Task {
    /// Create a task with only a name set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: None,
            finish: None,
            duration: None,
        }
    }

    pub fn with_start(mut self, start: NaiveDateTime) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_finish(mut self, finish: NaiveDateTime) -> Self {
        self.finish = Some(finish);
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}
