use crate::models::{DiscordGuild, DiscordUser, TokenPair};
use crate::{DiscordError, DISCORD_API_URL, DISCORD_AUTHORIZE_URL};

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ATTEMPTS: u32 = 2;
const STATE_LENGTH: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TokenTypeHint {
    AccessToken,
    RefreshToken,
}

impl TokenTypeHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenTypeHint::AccessToken => "access_token",
            TokenTypeHint::RefreshToken => "refresh_token",
        }
    }
}

/// Generates an unpredictable OAuth `state` value for one authorization attempt.
pub fn generate_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}

/// The Discord operations the gateway depends on.
#[async_trait]
pub trait DiscordApi: Send + Sync {
    fn authorization_url(&self, state: &str) -> Result<String, DiscordError>;

    async fn exchange_code(&self, code: &str) -> Result<TokenPair, DiscordError>;

    async fn current_user(&self, access_token: &str) -> Result<DiscordUser, DiscordError>;

    async fn user_guilds(&self, access_token: &str) -> Result<Vec<DiscordGuild>, DiscordError>;

    /// Probes the token against Discord. A revoked or expired token yields
    /// `Err(DiscordError::Unauthorized)`.
    async fn is_authenticated(&self, access_token: &str) -> Result<bool, DiscordError>;

    async fn revoke_token(&self, token: &str, hint: TokenTypeHint) -> Result<(), DiscordError>;
}

#[derive(Clone, Debug)]
pub struct DiscordOAuthClient {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scopes: Vec<String>,
    api_base_url: String,
    authorize_url: String,
    http: Client,
}

#[derive(Deserialize)]
struct RateLimitBody {
    retry_after: Option<f64>,
}

impl DiscordOAuthClient {
    pub fn new(
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        scopes: &[String],
    ) -> Result<Self, DiscordError> {
        Self::with_timeout(client_id, client_secret, redirect_uri, scopes, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        scopes: &[String],
        timeout: Duration,
    ) -> Result<Self, DiscordError> {
        Url::parse(redirect_uri)?;
        let http = Client::builder().timeout(timeout).build()?;
        Ok(DiscordOAuthClient {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_uri: redirect_uri.to_string(),
            scopes: scopes.to_vec(),
            api_base_url: DISCORD_API_URL.to_string(),
            authorize_url: DISCORD_AUTHORIZE_URL.to_string(),
            http,
        })
    }

    pub fn set_api_base_url(&mut self, api_base_url: &str) -> &mut Self {
        self.api_base_url = api_base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    fn api(&self, route: &str) -> String {
        format!("{}{}", self.api_base_url, route)
    }

    /// Sends a request built by `build`, retrying once on timeout.
    async fn send<F>(&self, build: F) -> Result<Response, DiscordError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 1;
        loop {
            match build().send().await {
                Ok(resp) => return check_status(resp).await,
                Err(err) if err.is_timeout() && attempt < MAX_ATTEMPTS => {
                    warn!("Discord request timed out (attempt {}), retrying", attempt);
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        route: &str,
        access_token: &str,
    ) -> Result<T, DiscordError> {
        let url = self.api(route);
        let resp = self
            .send(|| self.http.get(&url).bearer_auth(access_token))
            .await?;
        Ok(resp.json::<T>().await?)
    }
}

async fn check_status(resp: Response) -> Result<Response, DiscordError> {
    match resp.status() {
        status if status.is_success() => Ok(resp),
        StatusCode::UNAUTHORIZED => Err(DiscordError::Unauthorized),
        StatusCode::TOO_MANY_REQUESTS => {
            let header = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<f64>().ok());
            let body = resp.json::<RateLimitBody>().await.ok().and_then(|b| b.retry_after);
            Err(DiscordError::RateLimited {
                retry_after: body.or(header),
            })
        }
        status => Err(DiscordError::Status(status.as_u16())),
    }
}

#[async_trait]
impl DiscordApi for DiscordOAuthClient {
    fn authorization_url(&self, state: &str) -> Result<String, DiscordError> {
        let scope = self.scopes.join(" ");
        let url = Url::parse_with_params(
            &self.authorize_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("state", state),
            ],
        )?;
        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenPair, DiscordError> {
        let url = self.api("/oauth2/token");
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];
        // authorization codes are single-use, so no retry here
        let resp = self
            .http
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&form)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(resp.json::<TokenPair>().await?)
    }

    async fn current_user(&self, access_token: &str) -> Result<DiscordUser, DiscordError> {
        if !self.has_scope("identify") {
            return Err(DiscordError::ScopeMissing("identify"));
        }
        self.get_json("/users/@me", access_token).await
    }

    async fn user_guilds(&self, access_token: &str) -> Result<Vec<DiscordGuild>, DiscordError> {
        if !self.has_scope("guilds") {
            return Err(DiscordError::ScopeMissing("guilds"));
        }
        self.get_json("/users/@me/guilds", access_token).await
    }

    async fn is_authenticated(&self, access_token: &str) -> Result<bool, DiscordError> {
        let url = self.api("/oauth2/@me");
        self.send(|| self.http.get(&url).bearer_auth(access_token))
            .await
            .map(|_| true)
    }

    async fn revoke_token(&self, token: &str, hint: TokenTypeHint) -> Result<(), DiscordError> {
        let url = self.api("/oauth2/token/revoke");
        let form = [("token", token), ("token_type_hint", hint.as_str())];
        let resp = self
            .http
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&form)
            .send()
            .await?;
        check_status(resp).await?;
        debug!("Discord {} revoked", hint.as_str());
        Ok(())
    }
}
