//! An async client for the xAPI statements resource.

use std::time::Duration;

use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use url::Url;
use uuid::Uuid;
use xapi_core::XAPI_VERSION;
use xapi_pipeline::{SendOutcome, Transport};

use crate::{Result, TransportError};

const VERSION_HEADER: &str = "X-Experience-API-Version";

fn default_timeout_secs() -> u64 { 30 }

/// Connection settings for the LRS.
#[derive(Debug, Clone, Deserialize)]
pub struct LrsConfig {
  /// Base xAPI endpoint, e.g. `https://lrs.example/xapi`.
  pub endpoint:     String,
  #[serde(default)]
  pub username:     String,
  #[serde(default)]
  pub password:     String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl LrsConfig {
  pub fn new(endpoint: impl Into<String>) -> Self {
    Self {
      endpoint:     endpoint.into(),
      username:     String::new(),
      password:     String::new(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

/// Posts statement batches to an LRS.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct LrsClient {
  client: Client,
  config: LrsConfig,
}

fn validate(endpoint: &str) -> Result<()> {
  Url::parse(endpoint)
    .map(|_| ())
    .map_err(|source| TransportError::InvalidEndpoint {
      endpoint: endpoint.to_string(),
      source,
    })
}

impl LrsClient {
  pub fn new(config: LrsConfig) -> Result<Self> {
    validate(&config.endpoint)?;
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  pub fn endpoint(&self) -> &str { &self.config.endpoint }

  /// `{endpoint}/{resource}`
  pub fn resource_url(&self, resource: &str) -> String {
    format!("{}/{resource}", self.config.endpoint.trim_end_matches('/'))
  }

  /// `{endpoint}/statements`
  pub fn statements_url(&self) -> String { self.resource_url("statements") }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
    self
      .auth(self.client.request(method, url))
      .header(VERSION_HEADER, XAPI_VERSION)
  }

  /// `POST {endpoint}/statements`
  pub async fn post_statements(&self, batch: &[Value]) -> Result<Vec<Uuid>> {
    let url = self.statements_url();
    let resp = self.request(Method::POST, &url).json(batch).send().await?;
    let resp = checked(resp, &url).await?;

    if resp.status() == StatusCode::NO_CONTENT {
      return Ok(Vec::new());
    }
    Ok(resp.json().await?)
  }

  /// `PUT {endpoint}/statements?statementId={id}`
  pub async fn put_statement(&self, id: Uuid, statement: &Value) -> Result<()> {
    let url = format!("{}?statementId={id}", self.statements_url());
    let resp = self.request(Method::PUT, &url).json(statement).send().await?;
    checked(resp, &url).await?;
    Ok(())
  }

  /// `GET {endpoint}/{resource}?{query}`
  pub async fn get_resource(&self, resource: &str, query: Option<&str>) -> Result<Value> {
    let url = match query.filter(|q| !q.is_empty()) {
      Some(query) => format!("{}?{query}", self.resource_url(resource)),
      None => self.resource_url(resource),
    };
    let resp = self.request(Method::GET, &url).send().await?;
    Ok(checked(resp, &url).await?.json().await?)
  }
}

/// Turn a non-2xx answer into [`TransportError::Status`].
async fn checked(resp: Response, url: &str) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body = resp.text().await.unwrap_or_default();
  if status != StatusCode::NOT_FOUND {
    tracing::warn!(%url, %status, "LRS rejected request: {body}");
  }
  Err(TransportError::Status {
    status: status.as_u16(),
    body,
  })
}

fn same_origin(a: &str, b: &str) -> bool {
  match (Url::parse(a), Url::parse(b)) {
    (Ok(a), Ok(b)) => a.origin() == b.origin(),
    _ => false,
  }
}

impl Transport for LrsClient {
  type Error = TransportError;

  async fn send(&self, batch: &[Value]) -> Result<SendOutcome> {
    let statement_ids = self.post_statements(batch).await?;
    tracing::debug!(count = statement_ids.len(), "LRS stored statements");
    Ok(SendOutcome { statement_ids })
  }

  async fn put(&self, id: Uuid, statement: &Value) -> Result<()> {
    self.put_statement(id, statement).await
  }

  async fn query(&self, resource: &str, query: Option<&str>) -> Result<Value> {
    self.get_resource(resource, query).await
  }

  fn retarget(&self, endpoint: &str) -> Result<Self> {
    validate(endpoint)?;
    let mut config = LrsConfig {
      endpoint: endpoint.to_string(),
      ..self.config.clone()
    };
    if !same_origin(&self.config.endpoint, endpoint) {
      tracing::debug!(endpoint, "dropping LRS credentials for a foreign origin");
      config.username.clear();
      config.password.clear();
    }
    Ok(Self {
      client: self.client.clone(),
      config,
    })
  }
}
