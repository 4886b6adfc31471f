//! Bearer token providers
//!
//! The session is an external collaborator: a token is either handed to the
//! process through an environment variable, or obtained with the
//! client-credentials grant and cached until shortly before it expires.

use crate::error::{GraphError, GraphResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dm_core::{AuthConfig, AuthMode};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Source of bearer tokens for the graph API
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// A token valid for at least the next request
    async fn token(&self) -> GraphResult<String>;
}

/// A pre-issued token
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Read the token from an environment variable
    pub fn from_env(var: &str) -> GraphResult<Self> {
        match std::env::var(var) {
            Ok(token) if !token.trim().is_empty() => Ok(Self::new(token.trim())),
            _ => Err(GraphError::Auth(format!(
                "environment variable {} is not set or empty",
                var
            ))),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> GraphResult<String> {
        Ok(self.token.clone())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Client-credentials grant against the tenant's token endpoint
pub struct ClientCredentials {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
    cached: Mutex<Option<CachedToken>>,
    grace: Duration,
}

impl ClientCredentials {
    pub fn new(
        authority: &str,
        tenant_id: &str,
        graph_endpoint: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url: format!(
                "{}/{}/oauth2/v2.0/token",
                authority.trim_end_matches('/'),
                tenant_id
            ),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: format!("{}/.default", graph_endpoint.trim_end_matches('/')),
            cached: Mutex::new(None),
            grace: Duration::minutes(5),
        }
    }

    async fn acquire(&self) -> GraphResult<CachedToken> {
        log::debug!("Requesting access token from {}", self.token_url);
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| GraphError::Auth(format!("token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::Auth(format!(
                "token request failed with status {}: {}",
                status,
                body.trim()
            )));
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| GraphError::Auth(format!("failed to parse token response: {}", e)))?;

        Ok(CachedToken {
            access_token: parsed.access_token,
            expires_at: Utc::now() + Duration::seconds(parsed.expires_in),
        })
    }
}

#[async_trait]
impl TokenProvider for ClientCredentials {
    async fn token(&self) -> GraphResult<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Utc::now() + self.grace < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }
        let fresh = self.acquire().await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }
}

/// Build the provider described by the `auth` config section
pub fn provider_from_config(
    auth: &AuthConfig,
    tenant_id: &str,
    graph_endpoint: &str,
) -> GraphResult<Arc<dyn TokenProvider>> {
    match auth.mode() {
        AuthMode::BearerToken { env } => Ok(Arc::new(StaticToken::from_env(&env)?)),
        AuthMode::ClientCredentials {
            client_id,
            secret_env,
        } => {
            let secret = std::env::var(&secret_env)
                .ok()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    GraphError::Auth(format!(
                        "environment variable {} is not set or empty",
                        secret_env
                    ))
                })?;
            Ok(Arc::new(ClientCredentials::new(
                &auth.authority,
                tenant_id,
                graph_endpoint,
                client_id,
                secret,
            )))
        }
    }
}
