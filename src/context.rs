use crate::config::{Config, ConfigError};
use crate::locale::Locale;
use crate::state::RunMode;

use actix_web::dev::Payload;
use actix_web::error::ErrorInternalServerError;
use actix_web::{Error, FromRequest, HttpRequest};
use cas_client_core::{AttributeFilter, CasClient, ProxyGrantingTickets, TicketValidator};
use discord_oauth_core::{DiscordApi, DiscordOAuthClient};
use futures::future::{err, ok, Ready};
use std::sync::Arc;

/// Process-wide values the handlers need besides the clients.
#[derive(Clone, Debug)]
pub struct Settings {
    pub run_mode: RunMode,
    pub app_name: String,
    pub app_description: String,
    pub version: &'static str,
    pub logout_callback_url: String,
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Settings {
            run_mode: config.run_mode,
            app_name: config.app_name.clone(),
            app_description: config.app_description.clone(),
            version: crate::VERSION,
            logout_callback_url: config.logout_callback_url(),
        }
    }
}

/// Everything a request handler depends on, built once at startup and
/// registered as app data.
#[derive(Clone)]
pub struct Gateway {
    cas: Arc<dyn TicketValidator>,
    discord: Arc<dyn DiscordApi>,
    attribute_filter: Arc<AttributeFilter>,
    proxy_tickets: Arc<ProxyGrantingTickets>,
    locale: Arc<Locale>,
    settings: Arc<Settings>,
}

impl Gateway {
    pub fn new(
        cas: Arc<dyn TicketValidator>,
        discord: Arc<dyn DiscordApi>,
        attribute_filter: AttributeFilter,
        locale: Locale,
        settings: Settings,
    ) -> Self {
        Gateway {
            cas,
            discord,
            attribute_filter: Arc::new(attribute_filter),
            proxy_tickets: Arc::new(ProxyGrantingTickets::default()),
            locale: Arc::new(locale),
            settings: Arc::new(settings),
        }
    }

    /// Builds the real CAS and Discord clients from the configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut cas = CasClient::with_timeout(&config.cas_server_url, config.http_timeout)?;
        cas.set_service_url(&config.service_url())
            .set_service_validate_prefix(&config.cas_validate_path)
            .set_login_prefix(&config.cas_login_prefix)
            .set_logout_prefix(&config.cas_logout_prefix)
            .set_proxy_validate_prefix(&config.cas_proxy_validate_path);
        if config.cas_proxy_check {
            cas.set_proxy_callback_url(&config.proxy_callback_url());
            match cas.proxy_callback_url() {
                Some(url) => info!("CAS proxy check enabled, callback: {}", url),
                None => warn!("CAS proxy check needs an https SITE_URL, disabled"),
            }
        }

        let discord = DiscordOAuthClient::with_timeout(
            &config.discord_client_id,
            &config.discord_client_secret,
            &config.discord_redirect_uri,
            &config.discord_scopes,
            config.http_timeout,
        )?;
        info!("Discord scopes: {}", discord.scopes().join(" "));

        Ok(Gateway::new(
            Arc::new(cas),
            Arc::new(discord),
            config.load_attribute_filter()?,
            Locale::load()?,
            Settings::from(config),
        ))
    }

    pub fn cas(&self) -> &dyn TicketValidator {
        self.cas.as_ref()
    }

    pub fn discord(&self) -> &dyn DiscordApi {
        self.discord.as_ref()
    }

    pub fn attribute_filter(&self) -> &AttributeFilter {
        &self.attribute_filter
    }

    /// Proxy-granting tickets received on `/proxy-callback`, awaiting their login.
    pub fn proxy_tickets(&self) -> &ProxyGrantingTickets {
        &self.proxy_tickets
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

/// Enable Gateway to be used in Actix "extractors".
impl FromRequest for Gateway {
    type Error = Error;
    type Future = Ready<Result<Self, Error>>;

    /// Extract the Gateway from the app data, registered with
    /// `App::new().app_data(gateway.clone())`.
    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.app_data::<Gateway>() {
            Some(gateway) => ok(gateway.clone()),
            None => {
                debug!("Failed to find Gateway. Request path: {:?}", req.path());
                err(ErrorInternalServerError(
                    "App data is not configured with Gateway.",
                ))
            }
        }
    }
}
