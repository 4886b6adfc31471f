//! Graph API client over HTTPS/JSON

use crate::auth::{provider_from_config, TokenProvider};
use crate::error::{GraphError, GraphResult};
use crate::odata::{ODataError, ODataResponse};
use crate::traits::{DirectoryClient, EntityQuery};
use async_trait::async_trait;
use dm_core::Config;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Graph API client.
///
/// Issues one request at a time and never retries; the request timeout is
/// the only bound on a call.
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
    page_size: u32,
}

type Query<'a> = [(&'a str, String)];

impl GraphClient {
    /// Create a client rooted at `base_url` (e.g. `https://graph.microsoft.com/v1.0`)
    pub fn new(
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
        timeout: Duration,
        page_size: u32,
    ) -> GraphResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GraphError::Config(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
            page_size,
        })
    }

    /// Create a client from the loaded config, obtaining credentials from the environment
    pub fn from_config(config: &Config, target: Option<&str>) -> GraphResult<Self> {
        let tokens = provider_from_config(
            &config.auth,
            config.get_tenant_id(target),
            &config.graph.endpoint,
        )?;
        Self::new(
            config.graph.base_url(),
            tokens,
            Duration::from_secs(config.graph.timeout_secs),
            config.graph.page_size,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("https://") || path.starts_with("http://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    /// GET a single JSON document
    pub async fn get_json(&self, path: &str, query: &Query<'_>) -> GraphResult<Value> {
        let url = self.url(path);
        let response = self.send(Method::GET, &url, query, None).await?;
        decode(&url, response).await
    }

    /// GET a collection, following `@odata.nextLink` until exhausted
    pub async fn get_all(&self, path: &str, query: &Query<'_>) -> GraphResult<Vec<Value>> {
        let mut url = self.url(path);
        let mut params = query;
        let mut items = Vec::new();
        let mut pages = 0usize;

        loop {
            let response = self.send(Method::GET, &url, params, None).await?;
            let page: ODataResponse<Value> = decode(&url, response).await?;
            pages += 1;
            items.extend(page.value);
            match page.next_link {
                // The next link already carries every query option
                Some(next) => {
                    url = next;
                    params = &[];
                }
                None => break,
            }
        }

        log::debug!("{}: {} item(s) in {} page(s)", path, items.len(), pages);
        Ok(items)
    }

    /// POST a JSON body, returning the created resource
    pub async fn post_json(&self, path: &str, body: &Value) -> GraphResult<Value> {
        let url = self.url(path);
        let response = self.send(Method::POST, &url, &[], Some(body)).await?;
        decode(&url, response).await
    }

    /// PATCH a JSON body; the response body is discarded
    pub async fn patch_json(&self, path: &str, body: &Value) -> GraphResult<()> {
        let url = self.url(path);
        self.send(Method::PATCH, &url, &[], Some(body)).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> GraphResult<()> {
        let url = self.url(path);
        self.send(Method::DELETE, &url, &[], None).await?;
        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        query: &Query<'_>,
        body: Option<&Value>,
    ) -> GraphResult<reqwest::Response> {
        let token = self.tokens.token().await?;
        log::debug!("{} {}", method, url);

        let mut request = self.http.request(method, url).bearer_auth(token);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| GraphError::Http {
            url: url.to_string(),
            source: e,
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            return Err(GraphError::NotFound {
                resource: resource_path(url).to_string(),
            });
        }
        let body = ODataError::parse(&text);
        Err(GraphError::Api {
            status: status.as_u16(),
            code: body.code,
            message: if body.message.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body.message
            },
        })
    }

    fn select_query(&self, select: &[&str]) -> Vec<(&'static str, String)> {
        if select.is_empty() {
            Vec::new()
        } else {
            vec![("$select", select.join(","))]
        }
    }
}

async fn decode<T: DeserializeOwned>(url: &str, response: reqwest::Response) -> GraphResult<T> {
    let text = response.text().await.map_err(|e| GraphError::Http {
        url: url.to_string(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| GraphError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// URL without scheme, host or query, for messages
fn resource_path(url: &str) -> &str {
    let without_query = url.split('?').next().unwrap_or(url);
    match without_query.split_once("://") {
        Some((_, rest)) => rest.find('/').map(|i| &rest[i..]).unwrap_or(rest),
        None => without_query,
    }
}

#[async_trait]
impl DirectoryClient for GraphClient {
    async fn list(&self, query: &EntityQuery) -> GraphResult<Vec<Value>> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if !query.select.is_empty() {
            params.push(("$select", query.select.join(",")));
        }
        if let Some(filter) = &query.filter {
            params.push(("$filter", filter.clone()));
        }
        params.push(("$top", self.page_size.to_string()));
        self.get_all(&query.collection, &params).await
    }

    async fn get_entity(&self, collection: &str, id: &str, select: &[&str]) -> GraphResult<Value> {
        let params = self.select_query(select);
        self.get_json(&format!("{}/{}", collection, id), &params).await
    }

    async fn list_related(
        &self,
        collection: &str,
        id: &str,
        relation: &str,
        select: &[&str],
    ) -> GraphResult<Vec<Value>> {
        let params = self.select_query(select);
        self.get_all(&format!("{}/{}/{}", collection, id, relation), &params)
            .await
    }

    fn client_type(&self) -> &'static str {
        "graph"
    }
}
