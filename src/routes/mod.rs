use crate::error::GatewayError;
use crate::locale;

use actix_files::Files;
use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpResponse};

pub mod cas;
pub mod discord;
pub mod lang;
pub mod pages;
pub mod user;

/// Registers every route. Fixed paths come before the `/{lang}` patterns.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(Files::new("/static", "static"))
        // CAS
        .route("/login", web::get().to(cas::login))
        .route("/logout", web::get().to(cas::logout))
        .route("/logout-callback", web::get().to(cas::logout_callback))
        .route("/proxy-callback", web::get().to(cas::proxy_callback))
        // Discord
        .route("/discord-login", web::get().to(discord::discord_login))
        .route("/discord-callback", web::get().to(discord::discord_callback))
        .route("/discord-authenticated", web::get().to(discord::discord_authenticated))
        .route("/discord-logout", web::get().to(discord::discord_logout))
        .route("/user/force-add-roles", web::post().to(user::force_add_roles))
        // Bare paths, redirected to their language-prefixed equivalent
        .route("/", lang::redirect_to_preferred(""))
        .route("/user", lang::redirect_to_preferred("user"))
        .route("/profile", lang::redirect_to_preferred("user"))
        .route("/me", lang::redirect_to_preferred("user"))
        .route("/help", lang::redirect_to_preferred("help"))
        .route("/about", lang::redirect_to_preferred("about"))
        .route("/privacy-policy", lang::redirect_to_preferred("privacy-policy"))
        .route("/terms-of-service", lang::redirect_to_preferred("terms-of-service"))
        // Language-prefixed views
        .route("/{lang}/", web::get().to(pages::index))
        .route("/{lang}/user", web::get().to(user::user))
        .route("/{lang}/profile", web::get().to(user::user_alias))
        .route("/{lang}/me", web::get().to(user::user_alias))
        .route("/{lang}/help", web::get().to(pages::help))
        .route("/{lang}/about", web::get().to(pages::about))
        .route("/{lang}/privacy-policy", web::get().to(pages::privacy_policy))
        .route("/{lang}/terms-of-service", web::get().to(pages::terms_of_service))
        .route("/{lang}", web::get().to(lang::add_trailing_slash))
        .default_service(web::to(not_found));
}

async fn not_found() -> Result<HttpResponse, GatewayError> {
    Err(GatewayError::NotFound)
}

/// Validates the `{lang}` path segment. Unknown languages are a 404.
pub(crate) fn supported_lang(lang: &str) -> Result<&'static str, GatewayError> {
    locale::supported(lang).ok_or(GatewayError::NotFound)
}

pub(crate) fn index_path(lang: &str) -> String {
    format!("/{}/", lang)
}

pub(crate) fn user_path(lang: &str) -> String {
    format!("/{}/user", lang)
}

pub(crate) fn redirect(status: StatusCode, location: &str) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header((header::LOCATION, location))
        .finish()
}

pub(crate) fn temporary_redirect(location: &str) -> HttpResponse {
    redirect(StatusCode::TEMPORARY_REDIRECT, location)
}
