use rusqlite::{Connection, ErrorCode, Row};

use crate::models::{ReminderRow, UserRow};
use crate::{Database, Result, StoreError};

const REMINDER_COLUMNS: &str = "id, days_before_due, user_name, user_email, email_body, status, created_at, created_by, due_date";

/// Fields of a reminder about to be inserted. Already validated.
pub struct InsertReminder<'a> {
    pub days_before_due: i64,
    pub user_name: &'a str,
    pub user_email: &'a str,
    pub email_body: &'a str,
    pub created_at: &'a str,
    pub created_by: &'a str,
    pub due_date: &'a str,
}

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        created_by: Option<&str>,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (email, password, created_by) VALUES (?1, ?2, ?3)",
                (email, password_hash, created_by),
            )
            .map_err(|e| match e.sqlite_error_code() {
                Some(ErrorCode::ConstraintViolation) => {
                    StoreError::AlreadyExists(format!("user {}", email))
                }
                _ => e.into(),
            })?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    // -- Reminders --

    pub fn insert_reminder(&self, reminder: &InsertReminder<'_>) -> Result<ReminderRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO reminders (days_before_due, user_name, user_email, email_body, status, created_at, created_by, due_date)
                 VALUES (?1, ?2, ?3, ?4, 'Pending', ?5, ?6, ?7)",
                rusqlite::params![
                    reminder.days_before_due,
                    reminder.user_name,
                    reminder.user_email,
                    reminder.email_body,
                    reminder.created_at,
                    reminder.created_by,
                    reminder.due_date,
                ],
            )?;
            let id = conn.last_insert_rowid();
            query_reminder(conn, id)?.ok_or(StoreError::NotFound(id))
        })
    }

    pub fn get_reminder(&self, id: i64) -> Result<Option<ReminderRow>> {
        self.with_conn(|conn| query_reminder(conn, id))
    }

    pub fn get_reminders_by_owner(&self, created_by: &str) -> Result<Vec<ReminderRow>> {
        self.with_conn(|conn| {
            query_reminders(
                conn,
                &format!("SELECT {REMINDER_COLUMNS} FROM reminders WHERE created_by = ?1 ORDER BY id"),
                [created_by],
            )
        })
    }

    pub fn get_pending_reminders(&self) -> Result<Vec<ReminderRow>> {
        self.with_conn(|conn| {
            query_reminders(
                conn,
                &format!("SELECT {REMINDER_COLUMNS} FROM reminders WHERE status = 'Pending' ORDER BY id"),
                rusqlite::params![],
            )
        })
    }

    /// Conditional Pending -> Sent. Only one caller can win for a given row.
    pub fn mark_reminder_sent(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE reminders SET status = 'Sent' WHERE id = ?1 AND status = 'Pending'",
                [id],
            )?;
            Ok(changed == 1)
        })
    }

    /// Deletes only if the reminder belongs to `created_by`.
    pub fn delete_reminder(&self, id: i64, created_by: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            Ok(conn.execute(
                "DELETE FROM reminders WHERE id = ?1 AND created_by = ?2",
                rusqlite::params![id, created_by],
            )?)
        })
    }
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, email, password, created_by, created_at FROM users WHERE email = ?1",
    )?;

    let row = stmt
        .query_row([email], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                password: row.get(2)?,
                created_by: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

pub(crate) fn query_reminder(conn: &Connection, id: i64) -> Result<Option<ReminderRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {REMINDER_COLUMNS} FROM reminders WHERE id = ?1"))?;
    let row = stmt.query_row([id], reminder_row).optional()?;
    Ok(row)
}

fn query_reminders<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<ReminderRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, reminder_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn reminder_row(row: &Row<'_>) -> rusqlite::Result<ReminderRow> {
    Ok(ReminderRow {
        id: row.get(0)?,
        days_before_due: row.get(1)?,
        user_name: row.get(2)?,
        user_email: row.get(3)?,
        email_body: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
        created_by: row.get(7)?,
        due_date: row.get(8)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn users_are_unique_by_email() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_user("a@example.com", "$argon2id$hash", None).unwrap();

        let user = db.get_user_by_email("a@example.com").unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.password, "$argon2id$hash");
        assert!(user.created_by.is_none());

        let dup = db.create_user("a@example.com", "$argon2id$other", Some("admin@example.com"));
        assert!(matches!(dup, Err(StoreError::AlreadyExists(_))));
        assert!(db.get_user_by_email("b@example.com").unwrap().is_none());
    }
}
