use anyhow::Context as _;
use async_trait::async_trait;
use serde::Deserialize;

use crate::bookmark::BookmarkPayload;

pub const DEFAULT_API_URL: &str = "https://api.pinboard.in/v1";

#[async_trait]
pub trait BookmarkSink: Send + Sync {
    async fn add(&self, bookmark: &BookmarkPayload) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct PinboardClient {
    client: reqwest::Client,
    base_url: String,
    auth_token: String,
}

impl PinboardClient {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            auth_token: auth_token.into(),
        }
    }

    fn add_endpoint(&self) -> String {
        let base_url = self.base_url.trim_end_matches('/');
        format!("{base_url}/posts/add")
    }
}

fn add_query(auth_token: &str, bookmark: &BookmarkPayload) -> Vec<(&'static str, String)> {
    vec![
        ("auth_token", auth_token.to_owned()),
        ("format", "json".to_owned()),
        ("url", bookmark.url.clone()),
        ("description", bookmark.description.clone()),
        ("extended", bookmark.extended.clone()),
        ("tags", bookmark.tags.join(" ")),
    ]
}

#[async_trait]
impl BookmarkSink for PinboardClient {
    async fn add(&self, bookmark: &BookmarkPayload) -> anyhow::Result<()> {
        #[derive(Debug, Deserialize)]
        struct ResultCode {
            result_code: String,
        }

        let endpoint = self.add_endpoint();
        let response = self
            .client
            .get(&endpoint)
            .query(&add_query(&self.auth_token, bookmark))
            .send()
            .await
            .with_context(|| format!("GET {endpoint}"))?;

        let status = response.status();
        let raw = response.text().await.context("read Pinboard response body")?;
        if !status.is_success() {
            anyhow::bail!("Pinboard API error ({status}): {}", raw.trim());
        }

        let result: ResultCode = serde_json::from_str(&raw).context("parse Pinboard response")?;
        if result.result_code != "done" {
            anyhow::bail!("Pinboard rejected bookmark: {}", result.result_code);
        }
        Ok(())
    }
}
