use crate::response::{parse_proxy_response, parse_service_response, ServiceResponse};
use crate::{CasError, CasUser};

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ATTEMPTS: u32 = 2;

/// Result of a successful ticket validation.
#[derive(Clone, Debug, PartialEq)]
pub struct TicketVerification {
    pub user: CasUser,
    /// `PGTIOU` echoed by the server when a `pgtUrl` was sent. The ticket itself
    /// arrives on the proxy callback.
    pub proxy_granting_ticket_iou: Option<String>,
}

/// The CAS operations the gateway depends on.
#[async_trait]
pub trait TicketValidator: Send + Sync {
    /// URL the browser is sent to in order to log in.
    fn login_url(&self) -> Result<String, CasError>;

    /// URL ending the CAS single sign-on session, coming back to `callback` afterwards.
    fn logout_url(&self, callback: &str) -> Result<String, CasError>;

    /// Validates a service ticket. `Ok(None)` means the server rejected it.
    async fn verify_ticket(&self, ticket: &str) -> Result<Option<TicketVerification>, CasError>;

    /// Validates a proxy ticket on `proxyValidate`.
    async fn verify_proxy_ticket(
        &self,
        ticket: &str,
    ) -> Result<Option<TicketVerification>, CasError>;

    /// Exchanges a proxy-granting ticket for a proxy ticket targeting our service.
    async fn proxy_ticket(&self, proxy_granting_ticket: &str) -> Result<Option<String>, CasError>;
}

#[derive(Clone, Debug)]
pub struct CasClient {
    cas_base_url: Url,
    login_prefix: String,
    logout_prefix: String,
    proxy_prefix: String,
    proxy_validate_prefix: String,
    proxy_callback_url: Option<String>,
    service_url: String,
    service_validate_prefix: String,
    http: Client,
}

impl CasClient {
    // ################################################################################
    // Constructor
    // ################################################################################
    pub fn new(cas_base_url: &str) -> Result<Self, CasError> {
        Self::with_timeout(cas_base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(cas_base_url: &str, timeout: Duration) -> Result<Self, CasError> {
        let cas_base_url = match cas_base_url.ends_with('/') {
            true => cas_base_url.to_string(),
            false => format!("{}/", cas_base_url),
        };
        let url = Url::parse(&cas_base_url).map_err(|e| {
            error!("CAS url is not valid! Error: {}", e);
            e
        })?;
        let http = Client::builder().timeout(timeout).build()?;
        Ok(CasClient {
            cas_base_url: url,
            login_prefix: String::from("login"),
            logout_prefix: String::from("logout"),
            proxy_prefix: String::from("proxy"),
            proxy_validate_prefix: String::from("proxyValidate"),
            proxy_callback_url: None,
            service_url: String::new(),
            service_validate_prefix: String::from("serviceValidate"),
            http,
        })
    }

    // ################################################################################
    // Getters / Setters
    // ################################################################################
    pub fn cas_base_url(&self) -> &Url {
        &self.cas_base_url
    }

    pub fn login_prefix(&self) -> &str {
        &self.login_prefix
    }

    pub fn set_login_prefix(&mut self, login_prefix: &str) -> &mut Self {
        if let Some(prefix) = normalize_prefix(login_prefix, "Login") {
            self.login_prefix = prefix;
        }
        self
    }

    pub fn logout_prefix(&self) -> &str {
        &self.logout_prefix
    }

    pub fn set_logout_prefix(&mut self, logout_prefix: &str) -> &mut Self {
        if let Some(prefix) = normalize_prefix(logout_prefix, "Logout") {
            self.logout_prefix = prefix;
        }
        self
    }

    pub fn proxy_prefix(&self) -> &str {
        &self.proxy_prefix
    }

    pub fn set_proxy_prefix(&mut self, proxy_prefix: &str) -> &mut Self {
        if let Some(prefix) = normalize_prefix(proxy_prefix, "Proxy") {
            self.proxy_prefix = prefix;
        }
        self
    }

    pub fn proxy_validate_prefix(&self) -> &str {
        &self.proxy_validate_prefix
    }

    pub fn set_proxy_validate_prefix(&mut self, proxy_validate_prefix: &str) -> &mut Self {
        if let Some(prefix) = normalize_prefix(proxy_validate_prefix, "Proxy validate") {
            self.proxy_validate_prefix = prefix;
        }
        self
    }

    /// `pgtUrl` sent along with service ticket validation. CAS only issues
    /// proxy-granting tickets to an https callback.
    pub fn proxy_callback_url(&self) -> Option<&str> {
        self.proxy_callback_url.as_deref()
    }

    pub fn set_proxy_callback_url(&mut self, proxy_callback_url: &str) -> &mut Self {
        match Url::parse(proxy_callback_url) {
            Ok(url) if url.scheme() == "https" => {
                self.proxy_callback_url = Some(proxy_callback_url.to_string())
            }
            Ok(_) => error!("Proxy callback url must use https: {}", proxy_callback_url),
            Err(err) => error!("Invalid proxy callback url! Error: {:?}", err),
        };
        self
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    pub fn set_service_url(&mut self, service_url: &str) -> &mut Self {
        match Url::parse(service_url) {
            Ok(_) => self.service_url = service_url.to_string(),
            Err(err) => error!("Invalid service url! Error: {:?}", err),
        };
        self
    }

    pub fn service_validate_prefix(&self) -> &str {
        &self.service_validate_prefix
    }

    pub fn set_service_validate_prefix(&mut self, service_validate_prefix: &str) -> &mut Self {
        if let Some(prefix) = normalize_prefix(service_validate_prefix, "Service validate") {
            self.service_validate_prefix = prefix;
        }
        self
    }

    // ################################################################################
    // Url builders
    // ################################################################################
    pub fn service_validate_url(&self, ticket: &str) -> Result<String, CasError> {
        let mut params = vec![("service", self.service_url()), ("ticket", ticket)];
        if let Some(pgt_url) = self.proxy_callback_url() {
            params.push(("pgtUrl", pgt_url));
        }
        self.endpoint(&self.service_validate_prefix, &params)
    }

    pub fn proxy_validate_url(&self, ticket: &str) -> Result<String, CasError> {
        self.endpoint(
            &self.proxy_validate_prefix,
            &[("service", self.service_url()), ("ticket", ticket)],
        )
    }

    pub fn proxy_url(&self, proxy_granting_ticket: &str) -> Result<String, CasError> {
        self.endpoint(
            &self.proxy_prefix,
            &[
                ("pgt", proxy_granting_ticket),
                ("targetService", self.service_url()),
            ],
        )
    }

    fn endpoint(&self, prefix: &str, params: &[(&str, &str)]) -> Result<String, CasError> {
        let url = Url::parse_with_params(&format!("{}{}", self.cas_base_url, prefix), params)?;
        Ok(url.to_string())
    }

    // ################################################################################
    // Network
    // ################################################################################
    /// GETs `url`, retrying once when the first attempt timed out.
    async fn fetch(&self, url: &str) -> Result<String, CasError> {
        let mut attempt = 1;
        loop {
            let sent = self
                .http
                .get(url)
                .send()
                .await
                .and_then(|resp| resp.error_for_status());
            match sent {
                Ok(resp) => return Ok(resp.text().await?),
                Err(err) if err.is_timeout() && attempt < MAX_ATTEMPTS => {
                    warn!("CAS request timed out (attempt {}), retrying", attempt);
                    attempt += 1;
                }
                Err(err) => {
                    error!("Error while requesting CAS server! Error: {}", err);
                    return Err(err.into());
                }
            }
        }
    }

    async fn validate(&self, url: &str) -> Result<Option<TicketVerification>, CasError> {
        let body = self.fetch(url).await?;
        match parse_service_response(&body)? {
            ServiceResponse::Success {
                user,
                attributes,
                proxy_granting_ticket_iou,
            } => Ok(Some(TicketVerification {
                user: CasUser::new(&user, Some(attributes)),
                proxy_granting_ticket_iou,
            })),
            ServiceResponse::Failure { code, message } => {
                warn!("Ticket rejected by CAS server: {} {}", code, message);
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl TicketValidator for CasClient {
    fn login_url(&self) -> Result<String, CasError> {
        self.endpoint(&self.login_prefix, &[("service", self.service_url())])
    }

    fn logout_url(&self, callback: &str) -> Result<String, CasError> {
        self.endpoint(&self.logout_prefix, &[("service", callback)])
    }

    async fn verify_ticket(&self, ticket: &str) -> Result<Option<TicketVerification>, CasError> {
        debug!("Validating service ticket: {}", ticket);
        self.validate(&self.service_validate_url(ticket)?).await
    }

    async fn verify_proxy_ticket(
        &self,
        ticket: &str,
    ) -> Result<Option<TicketVerification>, CasError> {
        debug!("Validating proxy ticket: {}", ticket);
        self.validate(&self.proxy_validate_url(ticket)?).await
    }

    async fn proxy_ticket(&self, proxy_granting_ticket: &str) -> Result<Option<String>, CasError> {
        let body = self.fetch(&self.proxy_url(proxy_granting_ticket)?).await?;
        parse_proxy_response(&body)
    }
}

fn normalize_prefix(prefix: &str, what: &str) -> Option<String> {
    match prefix.strip_prefix('/').unwrap_or(prefix) {
        "" => {
            error!("{} prefix cannot be empty", what);
            None
        }
        prefix => Some(prefix.to_string()),
    }
}
