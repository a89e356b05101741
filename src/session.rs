use crate::config::Config;
use crate::error::GatewayError;
use crate::locale::{self, DEFAULT_LANGUAGE};
use crate::state::{RunMode, SessionState};

use actix_session::config::{CookieContentSecurity, PersistentSession};
use actix_session::storage::CookieSessionStore;
use actix_session::{Session, SessionMiddleware};
use actix_web::cookie::{time, Key, SameSite};
use cas_client_core::CasUser;
use discord_oauth_core::{DiscordUser, TokenPair};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const SESSION_COOKIE_NAME: &str = "cas-sso-discord";

const LANG_KEY: &str = "lang";
const CAS_USER_KEY: &str = "cas_user";
const DISCORD_KEY: &str = "discord";
const OAUTH_STATE_KEY: &str = "discord_oauth_state";

/// Signed cookie session, `SameSite=Strict`, expiring after `SESSION_MAX_AGE`.
pub fn session_middleware(config: &Config) -> SessionMiddleware<CookieSessionStore> {
    let key = Key::derive_from(config.secret_key.as_bytes());
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(SESSION_COOKIE_NAME.to_string())
        .cookie_content_security(CookieContentSecurity::Signed)
        .cookie_same_site(SameSite::Strict)
        .cookie_http_only(true)
        .cookie_secure(config.secure_cookies())
        .session_lifecycle(
            PersistentSession::default().session_ttl(time::Duration::seconds(config.session_max_age)),
        )
        .build()
}

/// Discord identity attached to a session. Both tokens live and die together.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct DiscordLink {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub username: String,
    pub global_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl DiscordLink {
    pub fn new(tokens: TokenPair, user: &DiscordUser) -> Self {
        DiscordLink {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user_id: user.id.clone(),
            username: user.display_username(),
            global_name: user.global_name.clone(),
            avatar_url: user.avatar_url(),
        }
    }
}

/// Typed view of the cookie session.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionRecord {
    pub lang: &'static str,
    pub cas_user: Option<CasUser>,
    pub discord: Option<DiscordLink>,
    pub oauth_state: Option<String>,
}

impl Default for SessionRecord {
    fn default() -> Self {
        SessionRecord {
            lang: DEFAULT_LANGUAGE,
            cas_user: None,
            discord: None,
            oauth_state: None,
        }
    }
}

impl SessionRecord {
    /// Reads the record. Unreadable entries are treated as absent and an
    /// unsupported language is corrected to the default.
    pub fn load(session: &Session) -> Self {
        SessionRecord {
            lang: current_lang(session),
            cas_user: read(session, CAS_USER_KEY),
            discord: read(session, DISCORD_KEY),
            oauth_state: read(session, OAUTH_STATE_KEY),
        }
    }

    /// Writes the record back, removing the keys of absent fields.
    pub fn store(&self, session: &Session) -> Result<(), GatewayError> {
        session.insert(LANG_KEY, self.lang)?;
        write(session, CAS_USER_KEY, self.cas_user.as_ref())?;
        write(session, DISCORD_KEY, self.discord.as_ref())?;
        write(session, OAUTH_STATE_KEY, self.oauth_state.as_ref())?;
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        SessionState::classify(self.cas_user.is_some(), self.discord.is_some())
    }

    pub fn set_lang(&mut self, lang: &'static str) {
        self.lang = lang;
    }

    pub fn sign_in_cas(&mut self, user: CasUser) {
        self.cas_user = Some(user);
    }

    pub fn begin_discord_login(&mut self, state: String) {
        self.oauth_state = Some(state);
    }

    /// Consumes the pending OAuth state; each issued value is accepted at most once.
    pub fn take_oauth_state(&mut self) -> Option<String> {
        self.oauth_state.take()
    }

    /// Attaches a Discord identity. Refused without a CAS identity unless diagnostic.
    pub fn link_discord(&mut self, link: DiscordLink, mode: RunMode) -> Result<(), GatewayError> {
        if self.cas_user.is_none() && !mode.is_diagnostic() {
            return Err(GatewayError::unauthorized_to("/login"));
        }
        self.discord = Some(link);
        Ok(())
    }

    /// Drops the Discord identity and hands it back for revocation.
    pub fn unlink_discord(&mut self) -> Option<DiscordLink> {
        self.discord.take()
    }

    /// Full logout: everything but the language goes.
    pub fn sign_out(&mut self) -> Option<DiscordLink> {
        self.cas_user = None;
        self.oauth_state = None;
        self.discord.take()
    }
}

/// Language stored in the session, or the default when absent or unsupported.
pub fn current_lang(session: &Session) -> &'static str {
    match read::<String>(session, LANG_KEY) {
        Some(lang) => locale::supported(&lang).unwrap_or_else(|| {
            warn!("Unsupported language {:?} in session, using {}", lang, DEFAULT_LANGUAGE);
            DEFAULT_LANGUAGE
        }),
        None => DEFAULT_LANGUAGE,
    }
}

fn read<T: DeserializeOwned>(session: &Session, key: &str) -> Option<T> {
    session.get::<T>(key).unwrap_or_else(|err| {
        warn!("Ignoring unreadable session entry {}: {}", key, err);
        None
    })
}

fn write<T: Serialize>(
    session: &Session,
    key: &'static str,
    value: Option<&T>,
) -> Result<(), GatewayError> {
    match value {
        Some(value) => session.insert(key, value)?,
        None => {
            session.remove(key);
        }
    }
    Ok(())
}
