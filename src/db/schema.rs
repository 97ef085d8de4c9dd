//! Database schema and row types.

use crate::db::Connection;
use crate::error::Result;
use rusqlite::types::Value;
use rusqlite::Row;

/// Table creation for the `projects` and `tasks` tables.
pub struct Schema;

impl Schema {
    /// Create both tables when they are missing.
    ///
    /// Existing tables are left alone; there is no versioning.
    pub fn init(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS projects (
                project_id INTEGER PRIMARY KEY,
                project_name TEXT
            );

            CREATE TABLE IF NOT EXISTS tasks (
                project_id INTEGER NOT NULL REFERENCES projects(project_id),
                task_name TEXT NOT NULL,
                start_date DATE NULL,
                finish_date DATE NULL,
                duration_value DOUBLE NULL,
                duration_units TEXT NULL,
                CHECK ((duration_value IS NULL) = (duration_units IS NULL))
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_project_id ON tasks(project_id);",
        )
    }

    /// Check whether both tables exist.
    pub fn is_initialized(conn: &Connection) -> Result<bool> {
        Ok(conn.table_exists("projects")? && conn.table_exists("tasks")?)
    }
}

/// Row representation of a project.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRow {
    pub project_id: i64,
    pub project_name: Option<String>,
}

impl ProjectRow {
    /// Create a ProjectRow from a SQLite row.
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            project_id: row.get("project_id")?,
            project_name: row.get("project_name")?,
        })
    }
}

/// Row representation of a task. Dates are `YYYY-MM-DD` text.
///
/// `duration_value` keeps whatever SQLite returned so a non-numeric
/// magnitude is reported by the mapper, not while stepping the query.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRow {
    pub project_id: i64,
    pub task_name: Option<String>,
    pub start_date: Option<String>,
    pub finish_date: Option<String>,
    pub duration_value: Option<Value>,
    pub duration_units: Option<String>,
}

impl TaskRow {
    /// Column list matching [`TaskRow::from_row`].
    pub const COLUMNS: &'static str =
        "project_id, task_name, start_date, finish_date, duration_value, duration_units";

    /// Create a TaskRow from a SQLite row.
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            project_id: row.get("project_id")?,
            task_name: row.get("task_name")?,
            start_date: row.get("start_date")?,
            finish_date: row.get("finish_date")?,
            duration_value: row.get("duration_value")?,
            duration_units: row.get("duration_units")?,
        })
    }

    /// Copy of this row with both duration columns cleared.
    pub fn without_duration(&self) -> Self {
        Self {
            duration_value: None,
            duration_units: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_temp_db() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn test_schema_init_creates_tables() {
        let conn = create_temp_db();
        assert!(!Schema::is_initialized(&conn).unwrap());

        Schema::init(&conn).unwrap();
        assert!(conn.table_exists("projects").unwrap());
        assert!(conn.table_exists("tasks").unwrap());
        assert!(Schema::is_initialized(&conn).unwrap());
    }

    #[test]
    fn test_schema_init_is_idempotent() {
        let conn = create_temp_db();
        Schema::init(&conn).unwrap();
        conn.execute(
            "INSERT INTO projects (project_id, project_name) VALUES (?, ?)",
            &[&1i64, &"Kept"],
        )
        .unwrap();

        Schema::init(&conn).unwrap();
        let name: Option<String> = conn
            .query_row_optional(
                "SELECT project_name FROM projects WHERE project_id = 1",
                &[],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(name.as_deref(), Some("Kept"));
    }

    #[test]
    fn test_task_requires_existing_project() {
        let conn = create_temp_db();
        Schema::init(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO tasks (project_id, task_name) VALUES (?, ?)",
            &[&99i64, &"Orphan"],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_duration_columns_are_paired() {
        let conn = create_temp_db();
        Schema::init(&conn).unwrap();
        conn.execute(
            "INSERT INTO projects (project_id, project_name) VALUES (1, 'P')",
            &[],
        )
        .unwrap();

        let half = conn.execute(
            "INSERT INTO tasks (project_id, task_name, duration_value) VALUES (1, 'Half', 5.0)",
            &[],
        );
        assert!(half.is_err());

        conn.execute(
            "INSERT INTO tasks (project_id, task_name, duration_value, duration_units)
             VALUES (1, 'Whole', 5.0, 'DAYS')",
            &[],
        )
        .unwrap();
    }

    #[test]
    fn test_task_row_from_row() {
        let conn = create_temp_db();
        Schema::init(&conn).unwrap();
        conn.execute(
            "INSERT INTO projects (project_id, project_name) VALUES (1, 'P')",
            &[],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO tasks (project_id, task_name, start_date) VALUES (1, 'T', '2024-03-04')",
            &[],
        )
        .unwrap();

        let rows = conn
            .query(
                &format!("SELECT {} FROM tasks", TaskRow::COLUMNS),
                &[],
                TaskRow::from_row,
            )
            .unwrap();

        assert_eq!(
            rows,
            vec![TaskRow {
                project_id: 1,
                task_name: Some("T".to_string()),
                start_date: Some("2024-03-04".to_string()),
                finish_date: None,
                duration_value: None,
                duration_units: None,
            }]
        );
    }

    #[test]
    fn test_task_row_keeps_text_magnitude() {
        let conn = create_temp_db();
        Schema::init(&conn).unwrap();
        conn.execute(
            "INSERT INTO projects (project_id, project_name) VALUES (1, 'P')",
            &[],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO tasks (project_id, task_name, duration_value, duration_units)
             VALUES (1, 'T', 'abc', 'DAYS')",
            &[],
        )
        .unwrap();

        let rows = conn
            .query(
                &format!("SELECT {} FROM tasks", TaskRow::COLUMNS),
                &[],
                TaskRow::from_row,
            )
            .unwrap();
        assert_eq!(rows[0].duration_value, Some(Value::Text("abc".to_string())));
    }

    #[test]
    fn test_is_initialized_reports_backend_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_a_db.db");
        std::fs::write(&path, "plain text, not a database\n".repeat(200)).unwrap();

        let conn = Connection::open(&path).unwrap();
        assert!(Schema::is_initialized(&conn).is_err());
    }

    #[test]
    fn test_without_duration() {
        let row = TaskRow {
            project_id: 1,
            task_name: Some("T".to_string()),
            start_date: None,
            finish_date: None,
            duration_value: Some(Value::Real(3.0)),
            duration_units: Some("PARSECS".to_string()),
        };
        let cleared = row.without_duration();
        assert_eq!(cleared.duration_value, None);
        assert_eq!(cleared.duration_units, None);
        assert_eq!(cleared.task_name, row.task_name);
    }
}
