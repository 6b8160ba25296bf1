use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Serialize;

pub const NOTIFICATION_SUBJECT: &str = "Error saving to Omnivore";

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

/// Sends plain-text mail to a single address, using that same address as
/// the sender.
pub struct SmtpNotifier {
    address: Mailbox,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    pub fn new(address: &str, smtp: &SmtpConfig, timeout: Duration) -> anyhow::Result<Self> {
        let address: Mailbox = address
            .parse()
            .with_context(|| format!("invalid notification address: {address}"))?;

        let creds = Credentials::new(smtp.username.clone(), smtp.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
            .with_context(|| format!("create SMTP transport: {}", smtp.host))?
            .port(smtp.port)
            .credentials(creds)
            .timeout(Some(timeout))
            .build();

        Ok(Self { address, mailer })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, subject: &str, body: &str) -> anyhow::Result<()> {
        let email = Message::builder()
            .from(self.address.clone())
            .to(self.address.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_owned())
            .context("build notification email")?;

        self.mailer
            .send(email)
            .await
            .context("send notification email via SMTP")?;

        tracing::info!(to = %self.address, subject, "notification sent");
        Ok(())
    }
}

/// Logs every failure and, when a notifier is configured, mails it.
#[derive(Clone, Default)]
pub struct Reporter {
    notifier: Option<Arc<dyn Notifier>>,
}

impl Reporter {
    pub fn new(notifier: Option<Arc<dyn Notifier>>) -> Self {
        Self { notifier }
    }

    pub fn log_only() -> Self {
        Self { notifier: None }
    }

    pub fn sends_email(&self) -> bool {
        self.notifier.is_some()
    }

    /// Never fails: a notification that cannot be delivered is logged and
    /// dropped so the original error stays the reported one.
    pub async fn report<T: Serialize + ?Sized>(&self, error: &str, article: &T) {
        tracing::warn!("{error}");

        let Some(notifier) = self.notifier.as_ref() else {
            return;
        };

        let body = notification_body(error, article);
        if let Err(err) = notifier.send(NOTIFICATION_SUBJECT, &body).await {
            tracing::error!(error = %format!("{err:#}"), "failed to send notification");
        }
    }
}

pub fn notification_body<T: Serialize + ?Sized>(error: &str, article: &T) -> String {
    let article = serde_json::to_string_pretty(article)
        .unwrap_or_else(|err| format!("<unserializable article: {err}>"));
    format!("Error: {error}\n\nArticle: {article}")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct FailingNotifier {
        attempts: Mutex<usize>,
    }

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send(&self, _subject: &str, _body: &str) -> anyhow::Result<()> {
            *self.attempts.lock().unwrap() += 1;
            anyhow::bail!("smtp unavailable")
        }
    }

    #[test]
    fn notification_body_embeds_error_and_article() {
        let body = notification_body("boom", &serde_json::json!({ "title": "T" }));
        assert!(body.starts_with("Error: boom\n\nArticle: {"));
        assert!(body.contains("\"title\": \"T\""));
    }

    #[tokio::test]
    async fn report_swallows_notifier_failures() {
        let notifier = Arc::new(FailingNotifier::default());
        let shared: Arc<dyn Notifier> = notifier.clone();
        let reporter = Reporter::new(Some(shared));
        reporter.report("boom", &serde_json::json!({})).await;
        assert_eq!(*notifier.attempts.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn log_only_reporter_does_not_send() {
        let reporter = Reporter::log_only();
        assert!(!reporter.sends_email());
        reporter.report("boom", &serde_json::json!({})).await;
    }

    #[test]
    fn smtp_notifier_rejects_invalid_address() {
        let smtp = SmtpConfig {
            host: "smtp.example.com".to_owned(),
            port: 587,
            username: "u".to_owned(),
            password: "p".to_owned(),
        };
        let result = SmtpNotifier::new("not an address", &smtp, Duration::from_secs(5));
        assert!(result.is_err());
    }
}
