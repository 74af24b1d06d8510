//! Bearer-token `Authorization` header helper.
//!
//! Fetches an access token from an OAuth2 client-credentials endpoint and
//! caches it until shortly before it expires.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::HookError;

/// Tokens are refreshed this long before their reported expiry.
const EXPIRY_MARGIN_SECS: i64 = 30;

/// Token endpoint settings, passed explicitly at construction.
#[derive(Debug, Clone)]
pub struct BearerTokenConfig {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .map_or(true, |at| now + Duration::seconds(EXPIRY_MARGIN_SECS) < at)
    }

    fn header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

pub struct BearerTokenProvider {
    config: BearerTokenConfig,
    client: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl BearerTokenProvider {
    pub fn new(config: BearerTokenConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: BearerTokenConfig, client: reqwest::Client) -> Self {
        Self {
            config,
            client,
            cached: Mutex::new(None),
        }
    }

    /// Return `"Bearer <token>"`, or `None` if the endpoint issued no token.
    ///
    /// A cached token is reused until it nears expiry; `renew` forces a new
    /// request regardless.
    pub async fn authorization_header(&self, renew: bool) -> Result<Option<String>, HookError> {
        let mut cached = self.cached.lock().await;
        if !renew {
            if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
                return Ok(Some(token.header()));
            }
        }

        *cached = self.request_token().await?;
        Ok(cached.as_ref().map(CachedToken::header))
    }

    async fn request_token(&self) -> Result<Option<CachedToken>, HookError> {
        let mut form = vec![
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        if let Some(scope) = &self.config.scope {
            form.push(("scope", scope.as_str()));
        }

        debug!("Requesting bearer token from {}", self.config.token_url);
        let response: TokenResponse = self
            .client
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(access_token) = response.access_token.filter(|t| !t.is_empty()) else {
            info!("Token endpoint {} returned no access token", self.config.token_url);
            return Ok(None);
        };
        let expires_at = response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));
        Ok(Some(CachedToken {
            access_token,
            expires_at,
        }))
    }
}
