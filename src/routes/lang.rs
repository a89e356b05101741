use crate::error::GatewayError;
use crate::locale::{self, DEFAULT_LANGUAGE};
use crate::routes::{index_path, redirect, supported_lang};

use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse, Route};

/// Route for a bare path, redirecting to `/{lang}/{target}`.
///
/// A supported preferred language gets a temporary redirect; anything else,
/// a missing header included, gets a permanent one to the default language.
pub fn redirect_to_preferred(target: &'static str) -> Route {
    web::get().to(move |req: HttpRequest| {
        let resp = language_redirect(&req, target);
        async move { resp }
    })
}

pub(crate) fn language_redirect(req: &HttpRequest, target: &str) -> HttpResponse {
    let accept_language = req
        .headers()
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok());
    match locale::preferred_language(accept_language) {
        Some(lang) => {
            debug!("Accept-Language {:?} => {}", accept_language, lang);
            redirect(StatusCode::TEMPORARY_REDIRECT, &format!("/{}/{}", lang, target))
        }
        None => redirect(
            StatusCode::PERMANENT_REDIRECT,
            &format!("/{}/{}", DEFAULT_LANGUAGE, target),
        ),
    }
}

/// `/{lang}` without the trailing slash.
pub async fn add_trailing_slash(lang: web::Path<String>) -> Result<HttpResponse, GatewayError> {
    let lang = supported_lang(&lang)?;
    Ok(redirect(StatusCode::PERMANENT_REDIRECT, &index_path(lang)))
}
