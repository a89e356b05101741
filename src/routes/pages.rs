use crate::context::Gateway;
use crate::error::GatewayError;
use crate::routes::{supported_lang, temporary_redirect, user_path};
use crate::session::SessionRecord;
use crate::templates::{
    html, AboutTemplate, HelpTemplate, IndexTemplate, PageContext, PrivacyPolicyTemplate,
    TermsOfServiceTemplate,
};

use actix_session::Session;
use actix_web::{web, HttpResponse};

/// Resolves the `{lang}` segment and remembers it in the session.
pub(crate) fn enter(
    lang: &str,
    session: &Session,
) -> Result<(&'static str, SessionRecord), GatewayError> {
    let lang = supported_lang(lang)?;
    let mut record = SessionRecord::load(session);
    record.set_lang(lang);
    record.store(session)?;
    Ok((lang, record))
}

/// Landing page, or the profile when already signed in with CAS.
pub async fn index(
    gateway: Gateway,
    session: Session,
    lang: web::Path<String>,
) -> Result<HttpResponse, GatewayError> {
    let (lang, record) = enter(&lang, &session)?;
    if record.cas_user.is_some() {
        return Ok(temporary_redirect(&user_path(lang)));
    }
    html(&IndexTemplate {
        page: PageContext::new(&gateway, lang, "home_page_title", ""),
    })
}

pub async fn help(
    gateway: Gateway,
    session: Session,
    lang: web::Path<String>,
) -> Result<HttpResponse, GatewayError> {
    let (lang, _) = enter(&lang, &session)?;
    html(&HelpTemplate {
        page: PageContext::new(&gateway, lang, "help_page_title", "help"),
    })
}

pub async fn about(
    gateway: Gateway,
    session: Session,
    lang: web::Path<String>,
) -> Result<HttpResponse, GatewayError> {
    let (lang, _) = enter(&lang, &session)?;
    html(&AboutTemplate {
        page: PageContext::new(&gateway, lang, "about_page_title", "about"),
    })
}

pub async fn privacy_policy(
    gateway: Gateway,
    session: Session,
    lang: web::Path<String>,
) -> Result<HttpResponse, GatewayError> {
    let (lang, _) = enter(&lang, &session)?;
    html(&PrivacyPolicyTemplate {
        page: PageContext::new(&gateway, lang, "privacy_policy", "privacy-policy"),
    })
}

pub async fn terms_of_service(
    gateway: Gateway,
    session: Session,
    lang: web::Path<String>,
) -> Result<HttpResponse, GatewayError> {
    let (lang, _) = enter(&lang, &session)?;
    html(&TermsOfServiceTemplate {
        page: PageContext::new(&gateway, lang, "terms_of_service", "terms-of-service"),
    })
}
