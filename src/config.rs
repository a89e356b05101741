use crate::state::RunMode;

use cas_client_core::{AttributeFilter, CasError};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

const MIN_SECRET_LENGTH: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("APP_SECRET_KEY must be at least 32 bytes long (got {0})")]
    SecretTooShort(usize),

    #[error(
        "{path} could not be read ({source}); copy cas_attributes_filter.json.example, \
         set the CAS attributes to keep and rename it"
    )]
    AttributeFilterRead {
        path: String,
        source: std::io::Error,
    },

    #[error("{path} is not a JSON array of attribute names: {source}")]
    AttributeFilterFormat { path: String, source: CasError },

    #[error("bundled locale table is invalid: {0}")]
    Locale(#[from] serde_json::Error),

    #[error("CAS client could not be built: {0}")]
    Cas(#[from] CasError),

    #[error("Discord client could not be built: {0}")]
    Discord(#[from] discord_oauth_core::DiscordError),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub run_mode: RunMode,
    pub app_name: String,
    pub app_description: String,
    pub host: String,
    pub port: u16,
    /// Public base URL without trailing slash.
    pub site_url: String,

    pub cas_server_url: String,
    pub cas_validate_path: String,
    pub cas_proxy_validate_path: String,
    /// Asks CAS for a proxy-granting ticket and checks a proxy ticket at login.
    pub cas_proxy_check: bool,
    pub cas_login_prefix: String,
    pub cas_logout_prefix: String,
    pub cas_attributes_filter: PathBuf,

    pub discord_client_id: String,
    pub discord_client_secret: String,
    pub discord_redirect_uri: String,
    pub discord_scopes: Vec<String>,

    pub secret_key: String,
    pub session_max_age: i64,
    pub http_timeout: Duration,
}

impl Config {
    /// Reads the process environment. Call `dotenv` first to honour a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let site_url = or("SITE_URL", "http://localhost:8000")
            .trim_end_matches('/')
            .to_string();
        if Url::parse(&site_url).is_err() {
            return Err(ConfigError::Invalid {
                key: "SITE_URL",
                value: site_url,
            });
        }

        let secret_key = required("APP_SECRET_KEY")?;
        if secret_key.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::SecretTooShort(secret_key.len()));
        }

        let discord_redirect_uri = get("DISCORD_REDIRECT_URI")
            .unwrap_or_else(|| format!("{}/discord-callback", site_url));

        Ok(Config {
            run_mode: RunMode::from_flag(lookup("DEBUG").as_deref()),
            app_name: or("APP_NAME", "CAS-SSO-Discord"),
            app_description: or("APP_DESCRIPTION", ""),
            host: or("HOST", "localhost"),
            port: parse(&get, "PORT", 8000)?,
            cas_server_url: required("CAS_SERVER_URL")?,
            cas_validate_path: or("CAS_VALIDATE_PATH", "serviceValidate"),
            cas_proxy_validate_path: or("CAS_PROXY_VALIDATE_PATH", "proxyValidate"),
            cas_proxy_check: parse(&get, "CAS_PROXY_CHECK", false)?,
            cas_login_prefix: or("CAS_LOGIN_PREFIX", "login"),
            cas_logout_prefix: or("CAS_LOGOUT_PREFIX", "logout"),
            cas_attributes_filter: PathBuf::from(or(
                "CAS_ATTRIBUTES_FILTER",
                "config/cas_attributes_filter.json",
            )),
            discord_client_id: required("DISCORD_CLIENT_ID")?,
            discord_client_secret: required("DISCORD_CLIENT_SECRET")?,
            discord_redirect_uri,
            discord_scopes: or("DISCORD_SCOPES", "identify guilds")
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            secret_key,
            session_max_age: parse(&get, "SESSION_MAX_AGE", 12 * 3600)?,
            http_timeout: Duration::from_secs(parse(&get, "HTTP_TIMEOUT_SECS", 10)?),
            site_url,
        })
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }

    /// CAS `service` parameter: where the CAS server sends the ticket back.
    pub fn service_url(&self) -> String {
        format!("{}/login", self.site_url)
    }

    pub fn logout_callback_url(&self) -> String {
        format!("{}/logout-callback", self.site_url)
    }

    /// `pgtUrl` the CAS server delivers proxy-granting tickets to.
    pub fn proxy_callback_url(&self) -> String {
        format!("{}/proxy-callback", self.site_url)
    }

    pub fn secure_cookies(&self) -> bool {
        self.site_url.starts_with("https://")
    }

    /// Reads the CAS attribute allow-list. A missing file is fatal.
    pub fn load_attribute_filter(&self) -> Result<AttributeFilter, ConfigError> {
        let path = self.cas_attributes_filter.display().to_string();
        let raw = fs::read_to_string(&self.cas_attributes_filter).map_err(|source| {
            ConfigError::AttributeFilterRead {
                path: path.clone(),
                source,
            }
        })?;
        AttributeFilter::from_json(&raw)
            .map_err(|source| ConfigError::AttributeFilterFormat { path, source })
    }
}

fn parse<G, T>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match get(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
