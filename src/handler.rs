//! The archive-to-bookmark pipeline.
//!
//! One call handles one webhook delivery: identity check, archival check,
//! article fetch, filters, bookmark submission. Every expected failure is
//! logged (and mailed when a notifier is configured) and ends the call with
//! an [`Outcome`]; only malformed input and, in the log-only variant, a
//! missing article URL come back as a [`HandleError`].
//!
//! Nothing is remembered between calls, so a re-delivered event produces a
//! second submission of the same bookmark.

use std::fmt;
use std::sync::Arc;

use anyhow::Context as _;

use crate::bookmark::BookmarkPayload;
use crate::config::Config;
use crate::error::HandleError;
use crate::event::IncomingEvent;
use crate::notify::{Notifier, Reporter, SmtpNotifier};
use crate::omnivore::{ArticleSource, OmnivoreClient};
use crate::pinboard::{BookmarkSink, PinboardClient};

/// Label that keeps an article out of the bookmark service.
pub const OPT_OUT_LABEL: &str = "000noarchive";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Bookmarked,
    Skipped(Skip),
    Failed(Failure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    UserMismatch,
    NotArchived,
    FetchedNotArchived,
    OptOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    FetchFailed,
    MissingUrl,
    SubmitFailed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Bookmarked => "bookmarked",
            Self::Skipped(Skip::UserMismatch) => "skipped: user mismatch",
            Self::Skipped(Skip::NotArchived) => "skipped: not archived",
            Self::Skipped(Skip::FetchedNotArchived) => "skipped: fetched article not archived",
            Self::Skipped(Skip::OptOut) => "skipped: opt-out label",
            Self::Failed(Failure::FetchFailed) => "failed: article fetch",
            Self::Failed(Failure::MissingUrl) => "failed: article has no url",
            Self::Failed(Failure::SubmitFailed) => "failed: bookmark submission",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct HandlerSettings {
    pub expected_user_id: String,
    pub username: String,
    /// Notification-capable variant: honors the opt-out label, reports a
    /// missing URL, and lets the reporter send email.
    pub notify: bool,
}

pub struct Handler {
    settings: HandlerSettings,
    articles: Arc<dyn ArticleSource>,
    bookmarks: Arc<dyn BookmarkSink>,
    reporter: Reporter,
}

impl Handler {
    pub fn new(
        settings: HandlerSettings,
        articles: Arc<dyn ArticleSource>,
        bookmarks: Arc<dyn BookmarkSink>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        let reporter = if settings.notify {
            Reporter::new(notifier)
        } else {
            Reporter::log_only()
        };
        Self {
            settings,
            articles,
            bookmarks,
            reporter,
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .context("build http client")?;

        let articles = Arc::new(OmnivoreClient::new(
            client.clone(),
            config.omnivore_graphql_url.clone(),
            config.omnivore_api_key.clone(),
        ));
        let bookmarks = Arc::new(PinboardClient::new(
            client,
            config.pinboard_api_url.clone(),
            config.pinboard_api_token.clone(),
        ));

        let notifier: Option<Arc<dyn Notifier>> =
            match (&config.notification_email, &config.smtp) {
                (Some(address), Some(smtp)) if config.notify => Some(Arc::new(
                    SmtpNotifier::new(address, smtp, config.http_timeout)
                        .context("build SMTP notifier")?,
                )),
                _ => None,
            };

        tracing::info!(
            notify = config.notify,
            email = notifier.is_some(),
            "webhook handler configured"
        );

        Ok(Self::new(
            HandlerSettings {
                expected_user_id: config.omnivore_user_id.clone(),
                username: config.omnivore_username.clone(),
                notify: config.notify,
            },
            articles,
            bookmarks,
            notifier,
        ))
    }

    /// Handles a raw webhook body.
    pub async fn handle_body(&self, body: &str) -> Result<Outcome, HandleError> {
        let event = IncomingEvent::parse(body)?;
        self.handle(&event).await
    }

    pub async fn handle(&self, event: &IncomingEvent) -> Result<Outcome, HandleError> {
        let expected = self.settings.expected_user_id.as_str();
        if event.user_id() != Some(expected) {
            let got = event.user_id().unwrap_or("<missing>");
            self.reporter
                .report(
                    &format!("userId {got} does not match {expected}, skipping"),
                    &serde_json::json!({}),
                )
                .await;
            return Ok(Outcome::Skipped(Skip::UserMismatch));
        }

        if !event.is_archived() {
            tracing::info!("not archived, skipping");
            return Ok(Outcome::Skipped(Skip::NotArchived));
        }

        let Some(article_id) = event.page_id() else {
            return Err(HandleError::MalformedEvent(
                "archived event has no page.id".to_owned(),
            ));
        };

        let lookup = match self
            .articles
            .fetch(&self.settings.username, article_id)
            .await
        {
            Ok(lookup) => lookup,
            Err(err) => {
                self.reporter
                    .report(
                        &format!("Article fetching failed: {err:#}"),
                        &serde_json::json!({ "id": article_id }),
                    )
                    .await;
                return Ok(Outcome::Failed(Failure::FetchFailed));
            }
        };

        let Some(article) = lookup.article.as_ref() else {
            let codes = lookup.error_codes.as_deref().unwrap_or_default();
            self.reporter
                .report(
                    &format!("Article fetching failed, errorcodes: {codes:?}"),
                    &lookup,
                )
                .await;
            return Ok(Outcome::Failed(Failure::FetchFailed));
        };

        tracing::info!(
            article_id,
            title = %article.title,
            url = ?article.url(),
            "fetched article"
        );
        if !article.is_archived {
            tracing::info!(article_id, "fetched article is not archived, skipping");
            return Ok(Outcome::Skipped(Skip::FetchedNotArchived));
        }

        let labels = article.label_names();
        tracing::info!(?labels, "parsed labels");
        if self.settings.notify && labels.iter().any(|label| label == OPT_OUT_LABEL) {
            tracing::info!(article_id, "fetched article has noarchive label, skipping");
            return Ok(Outcome::Skipped(Skip::OptOut));
        }

        let Some(url) = article.url() else {
            if !self.settings.notify {
                return Err(HandleError::MissingUrl {
                    article_id: article_id.to_owned(),
                });
            }
            self.reporter
                .report(
                    "Fetched article has no URL + missing noarchive label, skipping",
                    article,
                )
                .await;
            return Ok(Outcome::Failed(Failure::MissingUrl));
        };

        let bookmark = BookmarkPayload::from_article(article, url, labels);
        tracing::debug!(extended = %bookmark.extended, "description + highlights/notes");

        if let Err(err) = self.bookmarks.add(&bookmark).await {
            self.reporter
                .report(&format!("Pinboard error: {err:#}"), article)
                .await;
            return Ok(Outcome::Failed(Failure::SubmitFailed));
        }

        tracing::info!(article_id, url, "added to pinboard");
        Ok(Outcome::Bookmarked)
    }
}
