//! Server Configuration

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use chat_core::QuotaLimits;
use chat_core::quota::{FREE_DAILY_LIMIT, GUEST_DAILY_LIMIT};

/// Server settings, read from the environment
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,

    /// Base URL browsers reach the app on (payment pages, callbacks)
    pub public_url: String,

    pub limits: QuotaLimits,

    /// Lowercased emails that get the admin flag on sign-in
    pub admin_emails: Vec<String>,

    /// Shared secret for payment receipts
    pub payment_secret: String,

    /// Simulated gateway latency
    pub payment_delay: Duration,

    pub static_dir: String,

    /// Take guest addresses from `X-Forwarded-For`/`X-Real-IP`. Only safe
    /// behind a proxy that overwrites them.
    pub trust_proxy: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            public_url: "http://localhost:3000".into(),
            limits: QuotaLimits::default(),
            admin_emails: Vec::new(),
            payment_secret: uuid::Uuid::new_v4().simple().to_string(),
            payment_delay: Duration::from_millis(2000),
            static_dir: "static".into(),
            trust_proxy: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let payment_secret = get("PAYMENT_SECRET").unwrap_or_else(|| {
            tracing::warn!("PAYMENT_SECRET not set - using a random per-process secret");
            defaults.payment_secret.clone()
        });

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            public_url: get("PUBLIC_URL")
                .map_or(defaults.public_url, |url| url.trim_end_matches('/').to_string()),
            limits: QuotaLimits {
                free_daily: parse_or(&get, "FREE_DAILY_LIMIT", FREE_DAILY_LIMIT)?,
                guest_daily: parse_or(&get, "GUEST_DAILY_LIMIT", GUEST_DAILY_LIMIT)?,
            },
            admin_emails: get("ADMIN_EMAILS")
                .map(|list| {
                    list.split(',')
                        .map(|e| e.trim().to_lowercase())
                        .filter(|e| !e.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            payment_secret,
            payment_delay: Duration::from_millis(parse_or(&get, "PAYMENT_DELAY_MS", 2000)?),
            static_dir: get("STATIC_DIR").unwrap_or(defaults.static_dir),
            trust_proxy: parse_or(&get, "TRUST_PROXY", false)?,
        })
    }

    pub fn is_admin_email(&self, email: Option<&str>) -> bool {
        email.is_some_and(|email| {
            let email = email.to_lowercase();
            self.admin_emails.iter().any(|admin| *admin == email)
        })
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    get(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value {raw:?}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.limits, QuotaLimits::default());
        assert_eq!(config.payment_delay, Duration::from_secs(2));
        assert_eq!(config.static_dir, "static");
        assert!(!config.payment_secret.is_empty());
        assert!(config.admin_emails.is_empty());
        assert!(!config.trust_proxy);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("PUBLIC_URL", "https://sai.example/"),
            ("FREE_DAILY_LIMIT", "5"),
            ("GUEST_DAILY_LIMIT", " 1 "),
            ("ADMIN_EMAILS", "Root@Example.com, ,ops@example.com"),
            ("PAYMENT_DELAY_MS", "0"),
            ("TRUST_PROXY", "true"),
        ]))
        .unwrap();

        assert_eq!(config.public_url, "https://sai.example");
        assert_eq!(config.limits.free_daily, 5);
        assert_eq!(config.limits.guest_daily, 1);
        assert_eq!(config.admin_emails, ["root@example.com", "ops@example.com"]);
        assert!(config.is_admin_email(Some("ROOT@example.com")));
        assert!(!config.is_admin_email(None));
        assert_eq!(config.payment_delay, Duration::ZERO);
        assert!(config.trust_proxy);
    }

    #[test]
    fn test_bad_number_is_an_error() {
        let err = ServerConfig::from_lookup(lookup(&[("FREE_DAILY_LIMIT", "lots")])).unwrap_err();
        assert!(err.to_string().contains("FREE_DAILY_LIMIT"));

        let err = ServerConfig::from_lookup(lookup(&[("TRUST_PROXY", "maybe")])).unwrap_err();
        assert!(err.to_string().contains("TRUST_PROXY"));
    }
}
