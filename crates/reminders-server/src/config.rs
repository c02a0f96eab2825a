use std::path::PathBuf;

use anyhow::{Context, bail};

use reminders_api::due_scan::DispatchPolicy;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

const MAX_TOKEN_TTL_DAYS: i64 = 3650;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub scan_interval_secs: u64,
    pub dispatch_policy: DispatchPolicy,
    pub notify_webhook_url: Option<String>,
}

impl Config {
    /// Load configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = lookup("REMINDERS_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("REMINDERS_JWT_SECRET is unset or still a placeholder");
        }

        let port: u16 = var("REMINDERS_PORT", "3000")
            .parse()
            .context("Invalid REMINDERS_PORT")?;
        let token_ttl_days: i64 = var("REMINDERS_TOKEN_TTL_DAYS", "30")
            .parse()
            .context("Invalid REMINDERS_TOKEN_TTL_DAYS")?;
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&token_ttl_days) {
            bail!(
                "REMINDERS_TOKEN_TTL_DAYS must be between 1 and {}",
                MAX_TOKEN_TTL_DAYS
            );
        }
        let scan_interval_secs: u64 = var("REMINDERS_SCAN_INTERVAL_SECS", "3600")
            .parse()
            .context("Invalid REMINDERS_SCAN_INTERVAL_SECS")?;
        if scan_interval_secs == 0 {
            bail!("REMINDERS_SCAN_INTERVAL_SECS must be positive");
        }
        let dispatch_policy = var("REMINDERS_DISPATCH_POLICY", "at-most-once")
            .parse::<DispatchPolicy>()
            .map_err(anyhow::Error::msg)?;

        Ok(Self {
            host: var("REMINDERS_HOST", "0.0.0.0"),
            port,
            db_path: var("REMINDERS_DB_PATH", "reminders.db").into(),
            jwt_secret,
            token_ttl_days,
            scan_interval_secs,
            dispatch_policy,
            notify_webhook_url: lookup("REMINDERS_NOTIFY_WEBHOOK_URL").filter(|u| !u.is_empty()),
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[("REMINDERS_JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(cfg.server_address(), "0.0.0.0:3000");
        assert_eq!(cfg.db_path, PathBuf::from("reminders.db"));
        assert_eq!(cfg.token_ttl_days, 30);
        assert_eq!(cfg.scan_interval_secs, 3600);
        assert_eq!(cfg.dispatch_policy, DispatchPolicy::AtMostOnce);
        assert!(cfg.notify_webhook_url.is_none());
    }

    #[test]
    fn placeholder_secret_is_refused() {
        assert!(config(&[]).is_err());
        assert!(config(&[("REMINDERS_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = config(&[
            ("REMINDERS_JWT_SECRET", "s3cret"),
            ("REMINDERS_PORT", "8080"),
            ("REMINDERS_DISPATCH_POLICY", "at-least-once"),
            ("REMINDERS_NOTIFY_WEBHOOK_URL", "http://localhost:9000/hook"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.dispatch_policy, DispatchPolicy::AtLeastOnce);
        assert_eq!(cfg.notify_webhook_url.as_deref(), Some("http://localhost:9000/hook"));
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(config(&[("REMINDERS_JWT_SECRET", "s"), ("REMINDERS_PORT", "http")]).is_err());
        assert!(config(&[("REMINDERS_JWT_SECRET", "s"), ("REMINDERS_SCAN_INTERVAL_SECS", "0")]).is_err());
        assert!(config(&[("REMINDERS_JWT_SECRET", "s"), ("REMINDERS_DISPATCH_POLICY", "never")]).is_err());
    }

    #[test]
    fn token_ttl_is_bounded() {
        let ttl = |v: &str| config(&[("REMINDERS_JWT_SECRET", "s"), ("REMINDERS_TOKEN_TTL_DAYS", v)]);
        assert!(ttl("0").is_err());
        assert!(ttl("-1").is_err());
        assert!(ttl("3651").is_err());
        assert!(ttl("200000000000000").is_err());
        assert_eq!(ttl("1").unwrap().token_ttl_days, 1);
        assert_eq!(ttl("3650").unwrap().token_ttl_days, 3650);
    }
}
