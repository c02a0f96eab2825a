use std::sync::Arc;

use chrono::{DateTime, Utc};
use reminders_types::api::ReminderForm;
use reminders_types::models::{Reminder, ReminderStatus};
use tracing::{debug, info, warn};

use crate::models::{ReminderRow, format_timestamp};
use crate::queries::{InsertReminder, query_reminder};
use crate::validate::{NewReminder, validate_owner};
use crate::{Database, Result, StoreError};

/// Reminder CRUD on top of an injected [`Database`].
///
/// Owner-scoped calls take the caller's identity explicitly; the store never
/// looks it up itself.
#[derive(Clone)]
pub struct ReminderStore {
    db: Arc<Database>,
}

impl ReminderStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn create(&self, owner: &str, form: &ReminderForm) -> Result<Reminder> {
        self.create_at(owner, form, Utc::now())
    }

    /// Like [`create`](Self::create) with an explicit creation instant.
    pub fn create_at(
        &self,
        owner: &str,
        form: &ReminderForm,
        now: DateTime<Utc>,
    ) -> Result<Reminder> {
        let owner = validate_owner(owner)?;
        let new = NewReminder::try_from(form)?;

        let created_at = format_timestamp(now);
        let due_date = format_timestamp(new.due_date);
        let row = self.db.insert_reminder(&InsertReminder {
            days_before_due: new.days_before_due,
            user_name: &new.user_name,
            user_email: &new.user_email,
            email_body: &new.email_body,
            created_at: &created_at,
            created_by: owner,
            due_date: &due_date,
        })?;

        let reminder = row.into_reminder()?;
        info!(
            "Reminder {} created by {} (due {}, {} days lead)",
            reminder.id, owner, due_date, reminder.days_before_due
        );
        Ok(reminder)
    }

    /// All reminders created by `owner`, earliest due first.
    pub fn list_by_owner(&self, owner: &str) -> Result<Vec<Reminder>> {
        let mut reminders = into_reminders(self.db.get_reminders_by_owner(owner)?)?;
        reminders.sort_by_key(|r| (r.due_date, r.id));
        Ok(reminders)
    }

    /// Single reminder, only if `owner` created it.
    pub fn get(&self, owner: &str, id: i64) -> Result<Option<Reminder>> {
        match self.db.get_reminder(id)? {
            Some(row) if row.created_by == owner => Ok(Some(row.into_reminder()?)),
            _ => Ok(None),
        }
    }

    /// Pending reminders in id order. Rows that fail to decode are logged
    /// and skipped so the rest can still be scanned.
    pub fn pending(&self) -> Result<Vec<Reminder>> {
        let rows = self.db.get_pending_reminders()?;
        Ok(rows
            .into_iter()
            .filter_map(|row| match row.into_reminder() {
                Ok(reminder) => Some(reminder),
                Err(e) => {
                    warn!("Skipping undecodable reminder: {}", e);
                    None
                }
            })
            .collect())
    }

    /// Idempotent status change. Fails with `NotFound` for unknown ids and
    /// refuses to move a Sent reminder back to Pending.
    pub fn update_status(&self, id: i64, status: ReminderStatus) -> Result<()> {
        self.db.with_conn_mut(|conn| {
            let current = query_reminder(conn, id)?
                .ok_or(StoreError::NotFound(id))?
                .into_reminder()?
                .status;

            match (current, status) {
                (a, b) if a == b => {
                    debug!("Reminder {} already {}", id, status);
                    Ok(())
                }
                (ReminderStatus::Sent, ReminderStatus::Pending) => Err(StoreError::validation(
                    format!("reminder {} was already sent", id),
                )),
                _ => {
                    conn.execute(
                        "UPDATE reminders SET status = ?2 WHERE id = ?1",
                        rusqlite::params![id, status.as_str()],
                    )?;
                    Ok(())
                }
            }
        })
    }

    /// Atomically claims a Pending reminder by flipping it to Sent.
    /// Returns `false` if it was already Sent or no longer exists.
    pub fn mark_sent(&self, id: i64) -> Result<bool> {
        self.db.mark_reminder_sent(id)
    }

    /// Idempotent. Deleting an unknown id, or one created by someone else,
    /// is a no-op.
    pub fn delete(&self, owner: &str, id: i64) -> Result<()> {
        let removed = self.db.delete_reminder(id, owner)?;
        if removed == 0 {
            debug!("Delete of reminder {} by {}: nothing to remove", id, owner);
        } else {
            info!("Reminder {} deleted by {}", id, owner);
        }
        Ok(())
    }
}

fn into_reminders(rows: Vec<ReminderRow>) -> Result<Vec<Reminder>> {
    rows.into_iter().map(ReminderRow::into_reminder).collect()
}
