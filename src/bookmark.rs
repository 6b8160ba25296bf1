use serde::Serialize;

use crate::omnivore::{Article, Highlight};

/// What gets submitted to the bookmark service.
///
/// Pinboard's `description` is the bookmark's title line, so it carries the
/// article title; the article description goes into `extended`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookmarkPayload {
    pub url: String,
    pub description: String,
    pub extended: String,
    pub tags: Vec<String>,
}

impl BookmarkPayload {
    pub fn from_article(article: &Article, url: &str, tags: Vec<String>) -> Self {
        Self {
            url: url.to_owned(),
            description: article.title.clone(),
            extended: extended_text(article.description.as_deref(), &article.highlights),
            tags,
        }
    }
}

pub fn extended_text(description: Option<&str>, highlights: &[Highlight]) -> String {
    let mut text = description.unwrap_or_default().to_owned();
    for highlight in highlights {
        text.push_str("\n\nQuote: ");
        text.push_str(highlight.quote.as_deref().unwrap_or_default());
        if let Some(note) = highlight.annotation.as_deref().filter(|n| !n.is_empty()) {
            text.push_str("\nNote: ");
            text.push_str(note);
        }
    }
    text
}
