#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use actix_web::test::TestRequest;
use async_trait::async_trait;
use cas_client_core::{AttributeFilter, CasError, CasUser, TicketValidator, TicketVerification};
use cas_sso_discord::locale::Locale;
use cas_sso_discord::{Config, Gateway, RunMode, Settings, SESSION_COOKIE_NAME};
use discord_oauth_core::{
    DiscordApi, DiscordError, DiscordGuild, DiscordUser, TokenPair, TokenTypeHint,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

pub const CAS_URL: &str = "https://cas.example.org/cas";
pub const DISCORD_AUTHORIZE_URL: &str = "https://discord.example.org/oauth2/authorize";
pub const SERVICE_TICKET: &str = "ST-123";
pub const PROXY_TICKET: &str = "PT-1";
pub const GOOD_CODE: &str = "good-code";
/// Exchanges fine, but the user lookup with the resulting token fails.
pub const BROKEN_PROFILE_CODE: &str = "broken-profile-code";
pub const PROXY_GRANTING_TICKET_IOU: &str = "PGTIOU-1";
pub const PROXY_GRANTING_TICKET: &str = "PGT-1";
pub const DISCORD_USER_ID: &str = "80351110224678912";

/// Builds the app the way `main` does, around the given gateway.
macro_rules! test_app {
    ($gateway:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(cas_sso_discord::error_pages())
                .wrap(cas_sso_discord::session_middleware(&common::config()))
                .app_data($gateway.clone())
                .configure(cas_sso_discord::routes::configure),
        )
        .await
    };
}

pub fn config() -> Config {
    Config::from_lookup(|key| {
        let value = match key {
            "CAS_SERVER_URL" => CAS_URL,
            "DISCORD_CLIENT_ID" => "1234",
            "DISCORD_CLIENT_SECRET" => "discord-client",
            "APP_SECRET_KEY" => "test-signing-key-test-signing-key-0123456789",
            _ => return None,
        };
        Some(value.to_string())
    })
    .unwrap()
}

/// CAS server accepting `ST-123` (echoing a PGTIOU) and the proxy ticket `PT-1`
/// issued for `PGT-1`.
#[derive(Default)]
pub struct StubCas {
    pub verified: Mutex<Vec<String>>,
}

fn alice(attributes: &[(&str, &str)]) -> CasUser {
    let attributes: BTreeMap<String, String> = attributes
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    CasUser::new("alice", Some(attributes))
}

#[async_trait]
impl TicketValidator for StubCas {
    fn login_url(&self) -> Result<String, CasError> {
        Ok(format!("{}/login?service=http%3A%2F%2Flocalhost%3A8000%2Flogin", CAS_URL))
    }

    fn logout_url(&self, callback: &str) -> Result<String, CasError> {
        Ok(format!("{}/logout?service={}", CAS_URL, callback))
    }

    async fn verify_ticket(&self, ticket: &str) -> Result<Option<TicketVerification>, CasError> {
        self.verified.lock().unwrap().push(ticket.to_string());
        Ok(match ticket {
            SERVICE_TICKET => Some(TicketVerification {
                user: alice(&[("cn", "Alice"), ("secret", "x")]),
                proxy_granting_ticket_iou: Some(PROXY_GRANTING_TICKET_IOU.to_string()),
            }),
            _ => None,
        })
    }

    async fn verify_proxy_ticket(
        &self,
        ticket: &str,
    ) -> Result<Option<TicketVerification>, CasError> {
        self.verified.lock().unwrap().push(ticket.to_string());
        Ok(match ticket {
            PROXY_TICKET => Some(TicketVerification {
                user: alice(&[]),
                proxy_granting_ticket_iou: None,
            }),
            _ => None,
        })
    }

    async fn proxy_ticket(&self, proxy_granting_ticket: &str) -> Result<Option<String>, CasError> {
        Ok(match proxy_granting_ticket {
            PROXY_GRANTING_TICKET => Some(PROXY_TICKET.to_string()),
            _ => None,
        })
    }
}

/// What the stub answers to the liveness probe.
#[derive(Clone, Copy, Debug)]
pub enum Liveness {
    Live,
    Dead,
    RateLimited(f64),
    Unauthorized,
}

pub struct StubDiscord {
    pub liveness: Mutex<Liveness>,
    pub revoked: Mutex<Vec<(String, TokenTypeHint)>>,
}

impl Default for StubDiscord {
    fn default() -> Self {
        StubDiscord {
            liveness: Mutex::new(Liveness::Live),
            revoked: Mutex::new(Vec::new()),
        }
    }
}

impl StubDiscord {
    pub fn answer(&self, liveness: Liveness) {
        *self.liveness.lock().unwrap() = liveness;
    }
}

#[async_trait]
impl DiscordApi for StubDiscord {
    fn authorization_url(&self, state: &str) -> Result<String, DiscordError> {
        Ok(format!("{}?client_id=1234&state={}", DISCORD_AUTHORIZE_URL, state))
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenPair, DiscordError> {
        let (access_token, refresh_token) = match code {
            GOOD_CODE => ("access-token", "refresh-token"),
            BROKEN_PROFILE_CODE => ("orphan-access-token", "orphan-refresh-token"),
            _ => return Err(DiscordError::Status(400)),
        };
        Ok(TokenPair {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            token_type: "Bearer".to_string(),
            expires_in: Some(604800),
            scope: Some("identify guilds".to_string()),
        })
    }

    async fn current_user(&self, access_token: &str) -> Result<DiscordUser, DiscordError> {
        if access_token == "orphan-access-token" {
            return Err(DiscordError::Status(500));
        }
        Ok(DiscordUser {
            id: DISCORD_USER_ID.to_string(),
            username: "nelly".to_string(),
            discriminator: Some("0".to_string()),
            global_name: Some("Nelly".to_string()),
            avatar: Some("a1b2c3".to_string()),
        })
    }

    async fn user_guilds(&self, _access_token: &str) -> Result<Vec<DiscordGuild>, DiscordError> {
        Err(DiscordError::ScopeMissing("guilds"))
    }

    async fn is_authenticated(&self, _access_token: &str) -> Result<bool, DiscordError> {
        let liveness = *self.liveness.lock().unwrap();
        match liveness {
            Liveness::Live => Ok(true),
            Liveness::Dead => Ok(false),
            Liveness::RateLimited(seconds) => Err(DiscordError::RateLimited {
                retry_after: Some(seconds),
            }),
            Liveness::Unauthorized => Err(DiscordError::Unauthorized),
        }
    }

    async fn revoke_token(&self, token: &str, hint: TokenTypeHint) -> Result<(), DiscordError> {
        self.revoked.lock().unwrap().push((token.to_string(), hint));
        Ok(())
    }
}

pub struct Stubs {
    pub gateway: Gateway,
    pub cas: Arc<StubCas>,
    pub discord: Arc<StubDiscord>,
}

pub fn stubs(run_mode: RunMode) -> Stubs {
    let cas = Arc::new(StubCas::default());
    let discord = Arc::new(StubDiscord::default());
    let settings = Settings {
        run_mode,
        app_name: "CAS-SSO-Discord".to_string(),
        app_description: String::new(),
        version: "test",
        logout_callback_url: "http://localhost:8000/logout-callback".to_string(),
    };
    let gateway = Gateway::new(
        cas.clone(),
        discord.clone(),
        AttributeFilter::new(["cn"]),
        Locale::load().unwrap(),
        settings,
    );
    Stubs {
        gateway,
        cas,
        discord,
    }
}

/// Carries the session cookie from one response to the next request.
#[derive(Default)]
pub struct Browser {
    cookie: Option<Cookie<'static>>,
}

impl Browser {
    pub fn get(&self, uri: &str) -> TestRequest {
        self.attach(TestRequest::get().uri(uri))
    }

    pub fn post(&self, uri: &str) -> TestRequest {
        self.attach(TestRequest::post().uri(uri))
    }

    fn attach(&self, req: TestRequest) -> TestRequest {
        match &self.cookie {
            Some(cookie) => req.cookie(cookie.clone()),
            None => req,
        }
    }

    pub fn keep<B>(&mut self, resp: &ServiceResponse<B>) {
        if let Some(cookie) = session_cookie(resp) {
            self.cookie = match cookie.value() {
                "" => None,
                _ => Some(cookie),
            };
        }
    }
}

pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(|cookie| cookie.into_owned())
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Value of the `state` query parameter of a Discord authorization URL.
pub fn state_of(authorization_url: &str) -> String {
    url::Url::parse(authorization_url)
        .unwrap()
        .query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .unwrap()
}
