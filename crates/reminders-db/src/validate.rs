use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reminders_types::api::ReminderForm;

use crate::{Result, StoreError};

pub const MAX_NAME_LEN: usize = 64;
pub const MAX_EMAIL_LEN: usize = 64;
pub const MAX_OWNER_LEN: usize = 255;
/// A century of lead time is already well past anything meaningful.
pub const MAX_DAYS_BEFORE_DUE: i64 = 36_500;

/// A reminder that passed validation and can be written as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReminder {
    pub days_before_due: i64,
    pub user_name: String,
    pub user_email: String,
    pub email_body: String,
    pub due_date: DateTime<Utc>,
}

impl TryFrom<&ReminderForm> for NewReminder {
    type Error = StoreError;

    fn try_from(form: &ReminderForm) -> Result<Self> {
        let days_before_due = parse_days_before_due(required(&form.days_before_due, "days_before_due")?)?;
        let due_date = parse_due_date(required(&form.due_date, "due_date")?)?;

        let user_name = bounded(required(&form.user_name, "user_name")?, "user_name", MAX_NAME_LEN)?;
        let user_email = bounded(required(&form.user_email, "user_email")?, "user_email", MAX_EMAIL_LEN)?;
        if !looks_like_email(user_email) {
            return Err(StoreError::validation("user_email must be an email address"));
        }
        let email_body = required(&form.email_body, "email_body")?;

        Ok(Self {
            days_before_due,
            user_name: user_name.to_string(),
            user_email: user_email.to_string(),
            email_body: email_body.to_string(),
            due_date,
        })
    }
}

pub fn validate_owner(owner: &str) -> Result<&str> {
    let owner = owner.trim();
    if owner.is_empty() {
        return Err(StoreError::validation("owner identity is required"));
    }
    bounded(owner, "created_by", MAX_OWNER_LEN)
}

pub fn parse_days_before_due(raw: &str) -> Result<i64> {
    let days: i64 = raw
        .trim()
        .parse()
        .map_err(|_| StoreError::validation(format!("days_before_due '{}' is not a whole number", raw)))?;
    if !(0..=MAX_DAYS_BEFORE_DUE).contains(&days) {
        return Err(StoreError::validation(format!(
            "days_before_due must be between 0 and {}",
            MAX_DAYS_BEFORE_DUE
        )));
    }
    Ok(days)
}

/// Accepts RFC 3339 instants, `YYYY-MM-DDTHH:MM[:SS]` (taken as UTC) and
/// plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_due_date(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(ndt.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
        .ok_or_else(|| StoreError::validation(format!("due_date '{}' is not a date", raw)))
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(StoreError::validation(format!("{} is required", field))),
    }
}

fn bounded<'a>(value: &'a str, field: &str, max: usize) -> Result<&'a str> {
    if value.chars().count() > max {
        return Err(StoreError::validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(value)
}

pub fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
