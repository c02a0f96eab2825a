use rusqlite::Connection;
use tracing::info;

use crate::Result;

/// Brings the schema up to date. Safe to call on every startup; versions
/// already applied are skipped.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (users, reminders)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                email       TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                created_by  TEXT,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
            );

            CREATE TABLE reminders (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                days_before_due  INTEGER NOT NULL CHECK (days_before_due >= 0),
                user_name        TEXT NOT NULL,
                user_email       TEXT NOT NULL,
                email_body       TEXT NOT NULL,
                status           TEXT NOT NULL DEFAULT 'Pending'
                                 CHECK (status IN ('Pending', 'Sent')),
                created_at       TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
                created_by       TEXT NOT NULL,
                due_date         TEXT NOT NULL
            );

            CREATE INDEX idx_reminders_owner ON reminders(created_by, due_date);
            CREATE INDEX idx_reminders_status ON reminders(status);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
