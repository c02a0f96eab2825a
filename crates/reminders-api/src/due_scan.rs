use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use reminders_db::{ReminderStore, Result};
use reminders_types::models::Reminder;

use crate::notifier::{Notification, Notifier};

/// What to do with a reminder whose notification could not be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchPolicy {
    /// Claim the reminder (Pending -> Sent) first, then send. A failed send
    /// is logged and not retried.
    #[default]
    AtMostOnce,
    /// Send first and mark Sent only on success. A failed send leaves the
    /// reminder Pending for the next scan, so it may be delivered twice.
    AtLeastOnce,
}

impl FromStr for DispatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "at-most-once" | "at_most_once" => Ok(Self::AtMostOnce),
            "at-least-once" | "at_least_once" => Ok(Self::AtLeastOnce),
            other => Err(format!("unknown dispatch policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Pending reminders looked at.
    pub examined: usize,
    /// Of those, how many had reached their trigger instant.
    pub due: usize,
    /// Delivered and marked Sent.
    pub sent: usize,
    /// Dispatch or storage failures.
    pub failed: usize,
    /// Claimed by a concurrent scan before this one got to it.
    pub skipped: usize,
}

/// One pass over the pending reminders at instant `now`.
///
/// Each due reminder is handled on its own; a failure on one is counted and
/// logged and the pass moves on. Only loading the pending set can fail the
/// whole scan.
pub async fn scan_due_reminders<N: Notifier + ?Sized>(
    store: &ReminderStore,
    notifier: &N,
    policy: DispatchPolicy,
    now: DateTime<Utc>,
) -> Result<ScanReport> {
    let pending = store.pending()?;
    let mut report = ScanReport {
        examined: pending.len(),
        ..ScanReport::default()
    };

    for reminder in pending.iter().filter(|r| r.is_due(now)) {
        report.due += 1;
        match policy {
            DispatchPolicy::AtMostOnce => at_most_once(store, notifier, reminder, &mut report).await,
            DispatchPolicy::AtLeastOnce => at_least_once(store, notifier, reminder, &mut report).await,
        }
    }

    Ok(report)
}

async fn at_most_once<N: Notifier + ?Sized>(
    store: &ReminderStore,
    notifier: &N,
    reminder: &Reminder,
    report: &mut ScanReport,
) {
    match store.mark_sent(reminder.id) {
        Ok(true) => {}
        Ok(false) => {
            debug!("Reminder {} already claimed", reminder.id);
            report.skipped += 1;
            return;
        }
        Err(e) => {
            warn!("Reminder {}: could not mark sent: {}", reminder.id, e);
            report.failed += 1;
            return;
        }
    }

    match notifier.send(&Notification::from(reminder)).await {
        Ok(()) => report.sent += 1,
        Err(e) => {
            warn!("Reminder {}: dispatch failed, not retried: {}", reminder.id, e);
            report.failed += 1;
        }
    }
}

async fn at_least_once<N: Notifier + ?Sized>(
    store: &ReminderStore,
    notifier: &N,
    reminder: &Reminder,
    report: &mut ScanReport,
) {
    if let Err(e) = notifier.send(&Notification::from(reminder)).await {
        warn!("Reminder {}: dispatch failed, will retry next scan: {}", reminder.id, e);
        report.failed += 1;
        return;
    }

    match store.mark_sent(reminder.id) {
        Ok(true) => report.sent += 1,
        Ok(false) => report.skipped += 1,
        Err(e) => {
            warn!("Reminder {}: sent but could not mark sent: {}", reminder.id, e);
            report.failed += 1;
        }
    }
}

/// Background task that runs the due-scan on an interval.
pub async fn run_due_scan_loop(
    store: ReminderStore,
    notifier: Arc<dyn Notifier>,
    policy: DispatchPolicy,
    interval_secs: u64,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        match scan_due_reminders(&store, notifier.as_ref(), policy, Utc::now()).await {
            Ok(report) => {
                if report.due > 0 {
                    info!(
                        "Due-scan: {} due, {} sent, {} failed, {} skipped",
                        report.due, report.sent, report.failed, report.skipped
                    );
                }
            }
            Err(e) => {
                warn!("Due-scan error: {}", e);
            }
        }
    }
}
