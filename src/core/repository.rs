//! Project repository - project and task persistence.
//!
//! Every public operation acquires its own connection from the
//! [`ConnectionProvider`] and drops it before returning. Statements run in
//! autocommit mode; there is no transaction spanning a batch.

use crate::core::{Project, Task, TaskMapper};
use crate::db::{Connection, ConnectionProvider, ProjectRow, Schema, TaskRow};
use crate::error::{Error, Result};
use log::{info, warn};

/// What a read does with a task whose stored duration cannot be rebuilt:
/// an unknown unit label or a magnitude that is not a finite number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownUnitPolicy {
    /// Keep the task, with no duration, and log a warning.
    #[default]
    DropDuration,
    /// Fail the whole read with [`Error::UnitParse`] or
    /// [`Error::InvalidDuration`].
    Abort,
}

/// Result of an update addressed by project id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    NotFound,
}

/// A task that could not be imported.
#[derive(Debug)]
pub struct TaskFailure {
    /// Position of the task in `Project::tasks`.
    pub index: usize,
    pub name: String,
    pub error: Error,
}

/// Summary of [`ProjectRepository::insert_project`].
#[derive(Debug)]
pub struct ImportReport {
    pub project_id: i64,
    pub imported: usize,
    pub failures: Vec<TaskFailure>,
}

impl ImportReport {
    /// Whether every task was written.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Project repository.
pub struct ProjectRepository {
    provider: ConnectionProvider,
    unknown_unit: UnknownUnitPolicy,
}

impl ProjectRepository {
    pub fn new(provider: ConnectionProvider) -> Self {
        Self {
            provider,
            unknown_unit: UnknownUnitPolicy::default(),
        }
    }

    pub fn with_unknown_unit_policy(mut self, policy: UnknownUnitPolicy) -> Self {
        self.unknown_unit = policy;
        self
    }

    pub fn provider(&self) -> &ConnectionProvider {
        &self.provider
    }

    /// Create the tables if they do not exist yet.
    pub fn ensure_schema(&self) -> Result<()> {
        let conn = self.provider.acquire()?;
        Schema::init(&conn)
    }

    /// Insert a project row, then one row per task.
    ///
    /// Fails without touching tasks when the project row cannot be written.
    /// After that, each task succeeds or fails on its own and failures are
    /// collected in the report.
    pub fn insert_project(&self, project: &Project) -> Result<ImportReport> {
        let conn = self.provider.acquire()?;

        let inserted = conn.execute(
            "INSERT INTO projects (project_id, project_name) VALUES (?, ?)",
            &[&project.id, &project.title],
        );
        if let Err(err) = inserted {
            let err = if err.is_primary_key_violation() {
                Error::ProjectExists(project.id)
            } else {
                err
            };
            warn!(
                "event=project_insert module=repo status=error project_id={} error={}",
                project.id, err
            );
            return Err(err);
        }

        let mut report = ImportReport {
            project_id: project.id,
            imported: 0,
            failures: Vec::new(),
        };
        for (index, task) in project.tasks.iter().enumerate() {
            match insert_task(&conn, task, project.id) {
                Ok(()) => report.imported += 1,
                Err(error) => {
                    warn!(
                        "event=task_import module=repo status=error project_id={} index={} error={}",
                        project.id, index, error
                    );
                    report.failures.push(TaskFailure {
                        index,
                        name: task.name.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            "event=project_insert module=repo status=ok project_id={} imported={} failed={}",
            project.id,
            report.imported,
            report.failures.len()
        );
        Ok(report)
    }

    /// Import a single task under an existing project.
    pub fn import_task(&self, task: &Task, project_id: i64) -> Result<()> {
        let conn = self.provider.acquire()?;
        insert_task(&conn, task, project_id)?;
        info!(
            "event=task_import module=repo status=ok project_id={}",
            project_id
        );
        Ok(())
    }

    /// Rename a project. Never creates a row.
    pub fn update_project_name(&self, id: i64, new_name: &str) -> Result<UpdateOutcome> {
        let conn = self.provider.acquire()?;
        let changed = conn.execute(
            "UPDATE projects SET project_name = ? WHERE project_id = ?",
            &[&new_name, &id],
        )?;

        let outcome = if changed == 0 {
            UpdateOutcome::NotFound
        } else {
            UpdateOutcome::Applied
        };
        info!(
            "event=project_rename module=repo status=ok project_id={} outcome={:?}",
            id, outcome
        );
        Ok(outcome)
    }

    /// Rename in the store, then in memory if the store changed.
    pub fn rename_project(&self, project: &mut Project, new_name: &str) -> Result<UpdateOutcome> {
        let outcome = self.update_project_name(project.id, new_name)?;
        if outcome == UpdateOutcome::Applied {
            project.title = new_name.to_string();
        }
        Ok(outcome)
    }

    /// Read a project and its tasks, in insertion order.
    ///
    /// Returns `Ok(None)` when no project has this id. Durations that cannot
    /// be rebuilt are handled per [`UnknownUnitPolicy`].
    pub fn read_project_data(&self, id: i64) -> Result<Option<Project>> {
        let conn = self.provider.acquire()?;

        let Some(row) = conn.query_row_optional(
            "SELECT project_id, project_name FROM projects WHERE project_id = ?",
            &[&id],
            ProjectRow::from_row,
        )?
        else {
            info!(
                "event=project_read module=repo status=not_found project_id={}",
                id
            );
            return Ok(None);
        };

        let rows = conn.query(
            &format!(
                "SELECT {} FROM tasks WHERE project_id = ? ORDER BY rowid",
                TaskRow::COLUMNS
            ),
            &[&id],
            TaskRow::from_row,
        )?;

        let mut project = Project::new(row.project_id, row.project_name.unwrap_or_default());
        for task_row in &rows {
            project.tasks.push(self.task_from_row(task_row)?);
        }

        info!(
            "event=project_read module=repo status=ok project_id={} tasks={}",
            id,
            project.tasks.len()
        );
        Ok(Some(project))
    }

    fn task_from_row(&self, row: &TaskRow) -> Result<Task> {
        match TaskMapper::from_row(row) {
            Err(err @ (Error::UnitParse(_) | Error::InvalidDuration(_)))
                if self.unknown_unit == UnknownUnitPolicy::DropDuration =>
            {
                warn!(
                    "event=duration_dropped module=repo project_id={} error={}",
                    row.project_id, err
                );
                TaskMapper::from_row(&row.without_duration())
            }
            other => other,
        }
    }
}

fn insert_task(conn: &Connection, task: &Task, project_id: i64) -> Result<()> {
    let row = TaskMapper::to_row(task, project_id)?;
    conn.execute(
        "INSERT INTO tasks (project_id, task_name, start_date, finish_date, duration_value, duration_units)
         VALUES (?, ?, ?, ?, ?, ?)",
        &[
            &row.project_id,
            &row.task_name,
            &row.start_date,
            &row.finish_date,
            &row.duration_value,
            &row.duration_units,
        ],
    )?;
    Ok(())
}
