use std::time::Duration;

use crate::notify::SmtpConfig;
use crate::{omnivore, pinboard};

const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct Config {
    pub omnivore_api_key: String,
    pub omnivore_username: String,
    pub omnivore_user_id: String,
    pub pinboard_api_token: String,

    /// Address that receives failure reports. `None` means log-only.
    pub notification_email: Option<String>,
    pub smtp: Option<SmtpConfig>,

    /// Selects the notification-capable pipeline (opt-out label honored,
    /// missing URL reported) over the log-only one.
    pub notify: bool,

    pub omnivore_graphql_url: String,
    pub pinboard_api_url: String,
    pub http_timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("omnivore_username", &self.omnivore_username)
            .field("omnivore_user_id", &self.omnivore_user_id)
            .field("notification_email", &self.notification_email)
            .field("smtp_host", &self.smtp.as_ref().map(|smtp| &smtp.host))
            .field("notify", &self.notify)
            .field("omnivore_graphql_url", &self.omnivore_graphql_url)
            .field("pinboard_api_url", &self.pinboard_api_url)
            .field("http_timeout", &self.http_timeout)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| get(key).ok_or_else(|| anyhow::anyhow!("{key} is not set"));

        let notification_email = get("NOTIFICATION_EMAIL");
        let smtp = match get("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: match get("SMTP_PORT") {
                    Some(port) => port
                        .parse()
                        .map_err(|err| anyhow::anyhow!("invalid SMTP_PORT {port:?}: {err}"))?,
                    None => DEFAULT_SMTP_PORT,
                },
                username: require("SMTP_USERNAME")?,
                password: require("SMTP_PASSWORD")?,
            }),
            None => None,
        };
        if notification_email.is_some() && smtp.is_none() {
            anyhow::bail!("NOTIFICATION_EMAIL is set but SMTP_HOST is not");
        }

        let notify = get("OMNIVORE_PINBOARD_NOTIFY")
            .map(|v| parse_flag(&v))
            .transpose()?
            .unwrap_or(true);

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(secs) => {
                let secs: u64 = secs
                    .parse()
                    .map_err(|err| anyhow::anyhow!("invalid HTTP_TIMEOUT_SECS {secs:?}: {err}"))?;
                if secs == 0 {
                    anyhow::bail!("HTTP_TIMEOUT_SECS must be > 0");
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Self {
            omnivore_api_key: require("OMNIVORE_API")?,
            omnivore_username: require("OMNIVORE_USERNAME")?,
            omnivore_user_id: require("OMNIVORE_USER_ID")?,
            pinboard_api_token: require("PINBOARD_API")?,
            notification_email,
            smtp,
            notify,
            omnivore_graphql_url: get("OMNIVORE_GRAPHQL_URL")
                .unwrap_or_else(|| omnivore::DEFAULT_GRAPHQL_URL.to_owned()),
            pinboard_api_url: get("PINBOARD_API_URL")
                .unwrap_or_else(|| pinboard::DEFAULT_API_URL.to_owned()),
            http_timeout,
        })
    }
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("invalid boolean value: {other:?}"),
    }
}
