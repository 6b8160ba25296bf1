use thiserror::Error;

/// Faults the webhook handler hands back to its host.
///
/// Everything else the pipeline runs into is absorbed locally and shows up
/// only as an [`Outcome`](crate::handler::Outcome).
#[derive(Debug, Error)]
pub enum HandleError {
    /// The event body is not valid JSON or lacks a field the pipeline needs.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// The fetched article has no URL and the handler runs without
    /// notification support.
    #[error("article {article_id} has no url")]
    MissingUrl { article_id: String },
}

impl HandleError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedEvent(_))
    }
}
