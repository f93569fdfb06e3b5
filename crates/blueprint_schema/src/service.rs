//! Persistence service client
//!
//! The service that physically applies schema changes is a black box reached
//! through [`SchemaService`]. [`HttpSchemaService`] speaks its JSON API:
//!
//! - `GET  {base}/schema/{event}`: one-element array holding the schema
//! - `GET  {base}/types`: `{"result": [tag, ...]}`
//! - `POST {base}/schema/{event}`: body is a [`CommitRequest`]
//!
//! Any non-success status is a failed commit. Transport errors and timeouts
//! are reported the same way; they do not imply the change was not applied.

use crate::commit::CommitRequest;
use crate::schema::Schema;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Fallback message when a failed response carries no detail.
const GENERIC_FAILURE: &str = "commit failed";

/// Errors from the persistence service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Schema not found: {0}")]
    NotFound(String),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Remote side of schema editing.
#[async_trait]
pub trait SchemaService: Send + Sync {
    /// Load the current baseline for an event.
    async fn fetch_schema(&self, event_name: &str) -> Result<Schema, ServiceError>;

    /// Transformer tags the service accepts.
    async fn fetch_types(&self) -> Result<Vec<String>, ServiceError>;

    /// Apply one validated change set atomically.
    async fn update_schema(&self, event_name: &str, request: &CommitRequest) -> Result<(), ServiceError>;
}

#[derive(Debug, Deserialize)]
struct TypesResponse {
    result: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "Error")]
    error: String,
}

/// Pull a human-readable message out of a failed response body.
pub fn error_message(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return GENERIC_FAILURE.to_string();
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.error.is_empty() => parsed.error,
        _ => body.to_string(),
    }
}

/// Decode a schema listing: the first element of a JSON array.
///
/// An empty array means the event has no schema. A body that does not decode,
/// or a schema with repeated outbound names, is an invalid response.
pub fn parse_schema_listing(body: &str, event_name: &str) -> Result<Schema, ServiceError> {
    let schemas: Vec<Schema> = serde_json::from_str(body)
        .map_err(|e| ServiceError::InvalidResponse(format!("schema for '{}': {}", event_name, e)))?;
    let schema = schemas
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::NotFound(event_name.to_string()))?;
    if !schema.has_unique_outbound_names() {
        return Err(ServiceError::InvalidResponse(format!(
            "schema for '{}' repeats an outbound name",
            event_name
        )));
    }
    Ok(schema)
}

/// Decode the `{"result": [...]}` transformer catalog.
pub fn parse_types(body: &str) -> Result<Vec<String>, ServiceError> {
    serde_json::from_str::<TypesResponse>(body)
        .map(|types| types.result)
        .map_err(|e| ServiceError::InvalidResponse(format!("transformer catalog: {}", e)))
}

/// [`SchemaService`] over HTTP.
pub struct HttpSchemaService {
    base_url: String,
    token: Option<String>,
    http_client: reqwest::Client,
}

impl HttpSchemaService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            http_client,
        })
    }

    /// Send a bearer token with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn schema_url(&self, event_name: &str) -> String {
        format!("{}/schema/{}", self.base_url, event_name)
    }

    fn types_url(&self) -> String {
        format!("{}/types", self.base_url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ServiceError::Rejected {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }
}

#[async_trait]
impl SchemaService for HttpSchemaService {
    async fn fetch_schema(&self, event_name: &str) -> Result<Schema, ServiceError> {
        let url = self.schema_url(event_name);
        debug!("Fetching schema from {}", url);

        let response = self.authorize(self.http_client.get(&url)).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ServiceError::NotFound(event_name.to_string()));
        }
        let body = Self::check(response).await?.text().await?;
        parse_schema_listing(&body, event_name)
    }

    async fn fetch_types(&self) -> Result<Vec<String>, ServiceError> {
        let url = self.types_url();
        debug!("Fetching transformer catalog from {}", url);

        let response = self.authorize(self.http_client.get(&url)).send().await?;
        let body = Self::check(response).await?.text().await?;
        parse_types(&body)
    }

    async fn update_schema(&self, event_name: &str, request: &CommitRequest) -> Result<(), ServiceError> {
        let url = self.schema_url(event_name);
        debug!("Posting schema update to {}", url);

        let response = self
            .authorize(self.http_client.post(&url))
            .json(request)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
