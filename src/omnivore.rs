use anyhow::Context as _;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_GRAPHQL_URL: &str = "https://api-prod.omnivore.app/api/graphql";

const ARTICLE_QUERY: &str = r#"query GetArticle($username: String!, $slug: String!) {
  article(username: $username, slug: $slug) {
    ... on ArticleSuccess {
      article {
        id
        title
        url
        description
        isArchived
        labels { name }
        highlights { quote annotation }
      }
    }
    ... on ArticleError {
      errorCodes
    }
  }
}"#;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_archived: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<Label>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub highlights: Vec<Highlight>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    #[serde(default)]
    pub quote: Option<String>,
    #[serde(default)]
    pub annotation: Option<String>,
}

impl Article {
    pub fn label_names(&self) -> Vec<String> {
        self.labels.iter().map(|label| label.name.clone()).collect()
    }

    /// The article URL, treating an empty string as missing.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.is_empty())
    }
}

/// Result of an article query: either the article or the service's error
/// codes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleLookup {
    #[serde(default)]
    pub article: Option<Article>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_codes: Option<Vec<String>>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch(&self, username: &str, article_id: &str) -> anyhow::Result<ArticleLookup>;
}

#[derive(Debug, Clone)]
pub struct OmnivoreClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl OmnivoreClient {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl ArticleSource for OmnivoreClient {
    async fn fetch(&self, username: &str, article_id: &str) -> anyhow::Result<ArticleLookup> {
        let body = serde_json::json!({
            "query": ARTICLE_QUERY,
            "variables": {
                "username": username,
                "slug": article_id,
            },
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {}", self.endpoint))?;

        let status = response.status();
        let raw = response.text().await.context("read Omnivore response body")?;
        if !status.is_success() {
            anyhow::bail!("Omnivore API error ({status}): {raw}");
        }

        parse_article_response(&raw)
    }
}

fn parse_article_response(raw: &str) -> anyhow::Result<ArticleLookup> {
    #[derive(Debug, Deserialize)]
    struct GraphqlResponse {
        data: Option<ArticleData>,
        #[serde(default)]
        errors: Vec<GraphqlError>,
    }

    #[derive(Debug, Deserialize)]
    struct ArticleData {
        article: Option<ArticleLookup>,
    }

    #[derive(Debug, Deserialize)]
    struct GraphqlError {
        message: String,
    }

    let response: GraphqlResponse =
        serde_json::from_str(raw).context("parse Omnivore response")?;

    match response.data {
        Some(data) => Ok(data.article.unwrap_or_default()),
        None => {
            let messages = response
                .errors
                .iter()
                .map(|err| err.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            if messages.is_empty() {
                anyhow::bail!("Omnivore response has no data");
            }
            anyhow::bail!("Omnivore GraphQL error: {messages}");
        }
    }
}
