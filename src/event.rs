use serde::Deserialize;
use serde_json::Value;

use crate::error::HandleError;

/// Webhook body sent by Omnivore when a page changes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingEvent {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub page: Option<Page>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub archived_at: Option<Value>,
}

impl IncomingEvent {
    pub fn parse(body: &str) -> Result<Self, HandleError> {
        serde_json::from_str(body).map_err(|err| HandleError::MalformedEvent(err.to_string()))
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Whether the page carries an archival timestamp.
    ///
    /// Absent, `null`, `false`, empty strings and zero all read as "not
    /// archived".
    pub fn is_archived(&self) -> bool {
        self.page
            .as_ref()
            .and_then(|page| page.archived_at.as_ref())
            .is_some_and(is_truthy)
    }

    pub fn page_id(&self) -> Option<&str> {
        self.page
            .as_ref()
            .and_then(|page| page.id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Extracts the webhook body from a hosting envelope such as
/// `{"body": "{\"userId\": ...}"}`.
pub fn unwrap_envelope(raw: &str) -> Result<String, HandleError> {
    #[derive(Deserialize)]
    struct Envelope {
        body: Option<String>,
    }

    let envelope: Envelope =
        serde_json::from_str(raw).map_err(|err| HandleError::MalformedEvent(err.to_string()))?;
    envelope
        .body
        .ok_or_else(|| HandleError::MalformedEvent("envelope has no `body` string".to_owned()))
}
