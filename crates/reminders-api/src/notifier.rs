use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use reminders_types::models::Reminder;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Notification rejected: {0}")]
    Rejected(String),
}

/// What gets delivered for a due reminder.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub reminder_id: i64,
    pub to: String,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub due_date: DateTime<Utc>,
}

impl From<&Reminder> for Notification {
    fn from(r: &Reminder) -> Self {
        Self {
            reminder_id: r.id,
            to: r.user_email.clone(),
            name: r.user_name.clone(),
            subject: format!("Reminder: due {}", r.due_date.format("%Y-%m-%d")),
            body: r.email_body.clone(),
            due_date: r.due_date,
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), DispatchError>;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, n: &Notification) -> Result<(), DispatchError> {
        info!(
            reminder_id = n.reminder_id,
            to = %n.to,
            "Notify {} <{}>: {}",
            n.name,
            n.to,
            n.subject
        );
        Ok(())
    }
}

/// Upper bound on one webhook call; the scan awaits each send in turn.
pub const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// POSTs each notification as JSON to a fixed URL. Any non-2xx answer, or no
/// answer within the timeout, is a failed dispatch.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, DispatchError> {
        Self::with_timeout(url, DEFAULT_WEBHOOK_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, n: &Notification) -> Result<(), DispatchError> {
        self.client
            .post(&self.url)
            .json(n)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
