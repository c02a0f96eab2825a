//! Database row types. These map directly to SQLite rows and are kept
//! textual; conversion to the domain models happens in `into_*`.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use reminders_types::models::{Reminder, ReminderStatus};

use crate::{Result, StoreError};

pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub created_by: Option<String>,
    pub created_at: String,
}

pub struct ReminderRow {
    pub id: i64,
    pub days_before_due: i64,
    pub user_name: String,
    pub user_email: String,
    pub email_body: String,
    pub status: String,
    pub created_at: String,
    pub created_by: String,
    pub due_date: String,
}

impl ReminderRow {
    pub fn into_reminder(self) -> Result<Reminder> {
        let id = self.id;
        let corrupt = move |reason: String| StoreError::Corrupt { id, reason };

        let status: ReminderStatus = self.status.parse().map_err(corrupt)?;
        let created_at = parse_timestamp(&self.created_at)
            .ok_or_else(|| corrupt(format!("created_at '{}'", self.created_at)))?;
        let due_date = parse_timestamp(&self.due_date)
            .ok_or_else(|| corrupt(format!("due_date '{}'", self.due_date)))?;

        Ok(Reminder {
            id: self.id,
            days_before_due: self.days_before_due,
            user_name: self.user_name,
            user_email: self.user_email,
            email_body: self.email_body,
            status,
            created_at,
            created_by: self.created_by,
            due_date,
        })
    }
}

/// Canonical storage form: RFC 3339, UTC. Sub-second precision is kept
/// when present, so a stored due date never moves earlier.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>().ok().or_else(|| {
        // SQLite's datetime('now') has no timezone; it is UTC.
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|ndt| ndt.and_utc())
    })
}
