/// HTTP backend for the hosted content store
use crate::content::{ContentClient, ContentError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Connection settings for the hosted store
#[derive(Debug, Clone)]
pub struct SanityClientConfig {
    pub project_id: String,
    pub dataset: String,
    /// Dated API version, e.g. `2022-02-01`
    pub api_version: String,
    /// Write token; required for `create`
    pub token: Option<String>,
    /// Read through the edge cache
    pub use_cdn: bool,
    /// Overrides the computed API origin (local stand-ins, proxies)
    pub api_host: Option<String>,
    pub user_agent: String,
    pub timeout: Option<Duration>,
}

impl SanityClientConfig {
    pub fn new(project_id: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset: dataset.into(),
            api_version: "2022-02-01".to_string(),
            token: None,
            use_cdn: true,
            api_host: None,
            user_agent: format!("portfolio-site/{}", env!("CARGO_PKG_VERSION")),
            timeout: None,
        }
    }
}

/// Query endpoint response
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    result: Value,
}

/// Mutation endpoint response
#[derive(Debug, Deserialize)]
struct MutateResponse {
    #[serde(default)]
    results: Vec<MutationResult>,
}

#[derive(Debug, Deserialize)]
struct MutationResult {
    id: Option<String>,
    document: Option<Value>,
}

/// Content client speaking the hosted store's HTTP API
#[derive(Clone)]
pub struct SanityClient {
    http: reqwest::Client,
    config: SanityClientConfig,
}

impl SanityClient {
    pub fn new(config: SanityClientConfig) -> Result<Self, ContentError> {
        let mut builder = reqwest::Client::builder().user_agent(&config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ContentError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    fn origin(&self, cached: bool) -> String {
        if let Some(host) = &self.config.api_host {
            return host.trim_end_matches('/').to_string();
        }
        let subdomain = if cached && self.config.use_cdn { "apicdn" } else { "api" };
        format!("https://{}.{}.sanity.io", self.config.project_id, subdomain)
    }

    fn query_url(&self, query: &str) -> String {
        format!(
            "{}/v{}/data/query/{}?query={}",
            self.origin(true),
            self.config.api_version,
            self.config.dataset,
            urlencoding::encode(query)
        )
    }

    fn mutate_url(&self) -> String {
        format!(
            "{}/v{}/data/mutate/{}?returnIds=true&returnDocuments=true",
            self.origin(false),
            self.config.api_version,
            self.config.dataset
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ContentError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ContentError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ContentClient for SanityClient {
    async fn fetch(&self, query: &str) -> Result<Vec<Value>, ContentError> {
        let response = self
            .authorize(self.http.get(self.query_url(query)))
            .send()
            .await
            .map_err(|e| ContentError::Transport(e.to_string()))?;

        let body: QueryResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ContentError::Decode(e.to_string()))?;

        match body.result {
            Value::Array(documents) => Ok(documents),
            Value::Null => Ok(Vec::new()),
            other => Err(ContentError::Decode(format!(
                "expected an array result, got {}",
                other
            ))),
        }
    }

    async fn create(&self, document: Value) -> Result<Value, ContentError> {
        if self.config.token.is_none() {
            return Err(ContentError::InvalidDocument(
                "write token not configured".to_string(),
            ));
        }
        if document.get("_type").and_then(Value::as_str).is_none() {
            return Err(ContentError::InvalidDocument(
                "document is missing _type".to_string(),
            ));
        }

        let payload = json!({ "mutations": [{ "create": document }] });
        let response = self
            .authorize(self.http.post(self.mutate_url()))
            .json(&payload)
            .send()
            .await
            .map_err(|e| ContentError::Transport(e.to_string()))?;

        let body: MutateResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ContentError::Decode(e.to_string()))?;

        let result = body
            .results
            .into_iter()
            .next()
            .ok_or_else(|| ContentError::Decode("mutation returned no results".to_string()))?;

        match (result.document, result.id) {
            (Some(document), _) => Ok(document),
            (None, Some(id)) => Ok(json!({ "_id": id })),
            (None, None) => Err(ContentError::Decode(
                "mutation result carries neither id nor document".to_string(),
            )),
        }
    }

    fn backend_tag(&self) -> &'static str {
        "sanity"
    }
}
