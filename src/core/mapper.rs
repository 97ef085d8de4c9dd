//! Task <-> row mapping.

use crate::core::{Duration, DurationCodec, Task};
use crate::db::TaskRow;
use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::types::Value;

/// Storage format of the `start_date` / `finish_date` columns.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Maps a single task to and from its row.
pub struct TaskMapper;

impl TaskMapper {
    /// Build the row for `task` under `project_id`.
    ///
    /// Dates lose their time of day. A non-finite duration magnitude is
    /// rejected.
    pub fn to_row(task: &Task, project_id: i64) -> Result<TaskRow> {
        if let Some(d) = &task.duration {
            if !d.magnitude().is_finite() {
                return Err(Error::InvalidDuration(format!(
                    "task {:?} has non-finite magnitude {}",
                    task.name,
                    d.magnitude()
                )));
            }
        }
        let (duration_value, duration_units) = DurationCodec::encode(task.duration.as_ref());

        Ok(TaskRow {
            project_id,
            task_name: Some(task.name.clone()),
            start_date: encode_date(task.start),
            finish_date: encode_date(task.finish),
            duration_value: duration_value.map(Value::Real),
            duration_units: duration_units.map(str::to_string),
        })
    }

    /// Rebuild a task from its row. NULL columns stay `None`.
    ///
    /// A duration that cannot be rebuilt fails with [`Error::UnitParse`] or
    /// [`Error::InvalidDuration`].
    pub fn from_row(row: &TaskRow) -> Result<Task> {
        let name = row.task_name.clone().ok_or_else(|| Error::InvalidRow {
            column: "task_name".to_string(),
            reason: "NULL task name".to_string(),
        })?;

        Ok(Task {
            name,
            start: decode_date("start_date", row.start_date.as_deref())?,
            finish: decode_date("finish_date", row.finish_date.as_deref())?,
            duration: decode_duration(row)?,
        })
    }
}

fn decode_duration(row: &TaskRow) -> Result<Option<Duration>> {
    // Without a unit the magnitude is ignored, whatever it holds.
    let value = match row.duration_units {
        Some(_) => decode_magnitude(row.duration_value.as_ref())?,
        None => None,
    };
    DurationCodec::decode(value, row.duration_units.as_deref())
}

fn decode_magnitude(value: Option<&Value>) -> Result<Option<f64>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Real(v)) => Ok(Some(*v)),
        Some(Value::Integer(v)) => Ok(Some(*v as f64)),
        Some(Value::Text(text)) => Err(Error::InvalidDuration(format!(
            "stored magnitude {text:?} is not a number"
        ))),
        Some(Value::Blob(_)) => Err(Error::InvalidDuration(
            "stored magnitude is a blob".to_string(),
        )),
    }
}

fn encode_date(value: Option<NaiveDateTime>) -> Option<String> {
    value.map(|dt| dt.date().format(DATE_FORMAT).to_string())
}

fn decode_date(column: &str, value: Option<&str>) -> Result<Option<NaiveDateTime>> {
    let Some(text) = value else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map(|date| Some(date.and_time(NaiveTime::MIN)))
        .map_err(|err| Error::InvalidRow {
            column: column.to_string(),
            reason: format!("{text:?} is not a YYYY-MM-DD date: {err}"),
        })
}
