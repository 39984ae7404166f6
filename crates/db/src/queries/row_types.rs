// crates/db/src/queries/row_types.rs
// Internal row type for `dah_jobs` and its conversion into the domain `Job`.

use crate::{DbError, DbResult};
use chrono::{DateTime, SecondsFormat, Utc};
use dah_core::{Job, JobStatus};
use sqlx::Row;
use uuid::Uuid;

/// Column list shared by every query that returns a full job.
pub(crate) const JOB_COLUMNS: &str =
    "id, status, space_id, selected_page_ids, message, final_text, error_text, created_at";

#[derive(Debug)]
pub(crate) struct JobRow {
    id: String,
    status: String,
    space_id: Option<String>,
    selected_page_ids: String,
    message: String,
    final_text: Option<String>,
    error_text: Option<String>,
    created_at: String,
}

impl<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> for JobRow {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            status: row.try_get("status")?,
            space_id: row.try_get("space_id")?,
            selected_page_ids: row.try_get("selected_page_ids")?,
            message: row.try_get("message")?,
            final_text: row.try_get("final_text")?,
            error_text: row.try_get("error_text")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl JobRow {
    fn corrupt(&self, message: impl Into<String>) -> DbError {
        DbError::Corrupt {
            id: self.id.clone(),
            message: message.into(),
        }
    }

    pub(crate) fn into_job(self) -> DbResult<Job> {
        let id = Uuid::parse_str(&self.id).map_err(|e| self.corrupt(format!("id: {e}")))?;
        let status: JobStatus = self
            .status
            .parse()
            .map_err(|e| self.corrupt(format!("status: {e}")))?;
        let space_id = match self.space_id.as_deref() {
            Some(raw) => {
                Some(Uuid::parse_str(raw).map_err(|e| self.corrupt(format!("space_id: {e}")))?)
            }
            None => None,
        };
        let selected_page_ids: Vec<Uuid> = serde_json::from_str(&self.selected_page_ids)
            .map_err(|e| self.corrupt(format!("selected_page_ids: {e}")))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| self.corrupt(format!("created_at: {e}")))?
            .with_timezone(&Utc);

        Ok(Job {
            id,
            status,
            space_id,
            selected_page_ids,
            message: self.message,
            final_text: self.final_text,
            error_text: self.error_text,
            created_at,
        })
    }
}

/// Fixed-width UTC timestamp, so text order matches time order.
pub(crate) fn format_created_at(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}
