use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Delivery state of a reminder. Only ever moves Pending -> Sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderStatus {
    Pending,
    Sent,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Sent => "Sent",
        }
    }
}

impl fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReminderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Sent" => Ok(Self::Sent),
            other => Err(format!("unknown reminder status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: i64,
    /// Lead time in whole days before `due_date`.
    pub days_before_due: i64,
    pub user_name: String,
    pub user_email: String,
    pub email_body: String,
    pub status: ReminderStatus,
    pub created_at: DateTime<Utc>,
    /// Email of the account that created the reminder. Never changes.
    pub created_by: String,
    pub due_date: DateTime<Utc>,
}

impl Reminder {
    /// The instant the reminder becomes eligible to fire: `due_date` minus the lead time.
    pub fn trigger_at(&self) -> DateTime<Utc> {
        trigger_instant(self.due_date, self.days_before_due)
    }

    /// A pending reminder is due once `now` has reached its trigger instant.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == ReminderStatus::Pending && now >= self.trigger_at()
    }
}

/// Saturates at the earliest representable instant for absurd lead times.
pub fn trigger_instant(due_date: DateTime<Utc>, days_before_due: i64) -> DateTime<Utc> {
    TimeDelta::try_days(days_before_due)
        .and_then(|lead| due_date.checked_sub_signed(lead))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
