//! HTTP content source backed by the CMS query API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::models::{Document, Settings};
use super::query::{document_query, settings_query};
use super::source::{ContentError, ContentSource, Perspective};
use crate::config::CmsConfig;

/// Request timeout for content queries.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Envelope of a query API response.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    result: Value,
}

/// Query API client.
pub struct SanityClient {
    http: reqwest::Client,
    /// Endpoint for published reads (CDN when enabled).
    published_endpoint: Url,
    /// Endpoint for draft reads (always the live API).
    drafts_endpoint: Url,
    token: Option<String>,
    document_query: String,
    settings_query: String,
}

impl SanityClient {
    /// Create a client for the configured project and dataset.
    pub fn new(config: &CmsConfig) -> Result<Self, ContentError> {
        let project_id = config
            .project_id
            .as_deref()
            .ok_or_else(|| ContentError::Config("missing project id".to_string()))?;

        if !project_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ContentError::Config(format!(
                "invalid project id '{project_id}'"
            )));
        }

        let published_endpoint = Self::endpoint(project_id, config, config.use_cdn)?;
        let drafts_endpoint = Self::endpoint(project_id, config, false)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            published_endpoint,
            drafts_endpoint,
            token: config.read_token.clone(),
            document_query: document_query(),
            settings_query: settings_query(),
        })
    }

    fn endpoint(project_id: &str, config: &CmsConfig, cdn: bool) -> Result<Url, ContentError> {
        let host = if cdn { "apicdn" } else { "api" };
        let api_version = config.api_version.trim_start_matches('v');
        Url::parse(&format!(
            "https://{project_id}.{host}.sanity.io/v{api_version}/data/query/{}",
            config.dataset
        ))
        .map_err(|e| ContentError::Config(format!("invalid query endpoint: {e}")))
    }

    /// Query endpoint used for the given perspective.
    pub fn endpoint_for(&self, perspective: Perspective) -> &Url {
        match perspective {
            Perspective::Published => &self.published_endpoint,
            Perspective::Drafts => &self.drafts_endpoint,
        }
    }

    /// Run a query and decode its `result`; a null result maps to `None`.
    async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        params: &[(&str, &str)],
        perspective: Perspective,
    ) -> Result<Option<T>, ContentError> {
        let mut pairs: Vec<(String, String)> = vec![
            ("query".to_string(), query.to_string()),
            ("perspective".to_string(), perspective.as_str().to_string()),
        ];
        for (name, value) in params {
            // Parameters are passed as JSON literals
            pairs.push((format!("${name}"), serde_json::to_string(value)?));
        }

        let mut request = self.http.get(self.endpoint_for(perspective).clone()).query(&pairs);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ContentError::Status {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        let body: QueryResponse = response.json().await?;
        if body.result.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(body.result)?))
    }
}

#[async_trait]
impl ContentSource for SanityClient {
    async fn document(
        &self,
        slug: &str,
        perspective: Perspective,
    ) -> Result<Option<Document>, ContentError> {
        debug!(slug = %slug, perspective = perspective.as_str(), "querying document");
        self.query(&self.document_query, &[("slug", slug)], perspective)
            .await
    }

    async fn settings(&self, perspective: Perspective) -> Result<Option<Settings>, ContentError> {
        self.query(&self.settings_query, &[], perspective).await
    }

    async fn healthy(&self) -> bool {
        self.query::<Value>(r#"*[_type == "settings"][0]._id"#, &[], Perspective::Published)
            .await
            .is_ok()
    }

    fn name(&self) -> &'static str {
        "sanity"
    }
}

impl std::fmt::Debug for SanityClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SanityClient")
            .field("published_endpoint", &self.published_endpoint.as_str())
            .field("has_token", &self.token.is_some())
            .finish()
    }
}
