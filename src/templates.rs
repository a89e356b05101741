use crate::context::Gateway;
use crate::error::GatewayError;
use crate::locale::{Locale, SUPPORTED_LANGUAGES};
use crate::session::DiscordLink;

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use askama::Template;
use cas_client_core::CasUser;
use std::collections::BTreeMap;

pub struct LanguageLink {
    pub code: &'static str,
    pub href: String,
    pub class: &'static str,
}

/// Values every page shares through `base.html`.
pub struct PageContext<'a> {
    pub lang: &'static str,
    pub title: &'a str,
    pub app_name: &'a str,
    pub app_description: &'a str,
    pub version: &'a str,
    pub languages: Vec<LanguageLink>,
    locale: &'a Locale,
}

impl<'a> PageContext<'a> {
    /// `page` is the path below the language prefix, used by the language switcher.
    pub fn new(gateway: &'a Gateway, lang: &'static str, title_key: &'a str, page: &str) -> Self {
        let settings = gateway.settings();
        PageContext {
            lang,
            title: gateway.locale().get(lang, title_key),
            app_name: &settings.app_name,
            app_description: &settings.app_description,
            version: settings.version,
            languages: SUPPORTED_LANGUAGES
                .iter()
                .map(|&code| LanguageLink {
                    code,
                    href: format!("/{}/{}", code, page),
                    class: if code == lang { "current" } else { "" },
                })
                .collect(),
            locale: gateway.locale(),
        }
    }

    pub fn t<'b>(&'b self, key: &'b str) -> &'b str {
        self.locale.get(self.lang, key)
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub page: PageContext<'a>,
}

#[derive(Template)]
#[template(path = "user.html")]
pub struct UserTemplate<'a> {
    pub page: PageContext<'a>,
    pub cas_username: &'a str,
    pub attributes: BTreeMap<String, String>,
}

#[derive(Template)]
#[template(path = "user_with_discord.html")]
pub struct UserWithDiscordTemplate<'a> {
    pub page: PageContext<'a>,
    pub cas_username: &'a str,
    pub attributes: BTreeMap<String, String>,
    pub discord_id: &'a str,
    pub discord_username: &'a str,
    pub discord_global_name: &'a str,
    pub discord_avatar_url: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "help.html")]
pub struct HelpTemplate<'a> {
    pub page: PageContext<'a>,
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate<'a> {
    pub page: PageContext<'a>,
}

#[derive(Template)]
#[template(path = "privacy_policy.html")]
pub struct PrivacyPolicyTemplate<'a> {
    pub page: PageContext<'a>,
}

#[derive(Template)]
#[template(path = "terms_of_service.html")]
pub struct TermsOfServiceTemplate<'a> {
    pub page: PageContext<'a>,
}

#[derive(Template)]
#[template(path = "401.html")]
pub struct UnauthorizedTemplate<'a> {
    pub page: PageContext<'a>,
}

#[derive(Template)]
#[template(path = "403.html")]
pub struct ForbiddenTemplate<'a> {
    pub page: PageContext<'a>,
}

#[derive(Template)]
#[template(path = "404.html")]
pub struct NotFoundTemplate<'a> {
    pub page: PageContext<'a>,
}

#[derive(Template)]
#[template(path = "429.html")]
pub struct RateLimitedTemplate<'a> {
    pub page: PageContext<'a>,
    pub retry_after: Option<u64>,
}

/// Renders `template` as a `200 OK` HTML response.
pub fn html<T: Template>(template: &T) -> Result<HttpResponse, GatewayError> {
    let body = template.render()?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body))
}

pub fn profile(
    gateway: &Gateway,
    lang: &'static str,
    user: &CasUser,
) -> Result<HttpResponse, GatewayError> {
    html(&UserTemplate {
        page: PageContext::new(gateway, lang, "user_page_title", "user"),
        cas_username: user.username(),
        attributes: user.attributes().clone(),
    })
}

pub fn linked_profile(
    gateway: &Gateway,
    lang: &'static str,
    user: &CasUser,
    link: &DiscordLink,
) -> Result<HttpResponse, GatewayError> {
    html(&UserWithDiscordTemplate {
        page: PageContext::new(gateway, lang, "user_page_title", "user"),
        cas_username: user.username(),
        attributes: user.attributes().clone(),
        discord_id: &link.user_id,
        discord_username: &link.username,
        discord_global_name: link.global_name.as_deref().unwrap_or(""),
        discord_avatar_url: link.avatar_url.as_deref(),
    })
}

/// Body of a dedicated error page, `None` for statuses without one.
pub fn error_page(
    gateway: &Gateway,
    lang: &'static str,
    status: StatusCode,
    retry_after: Option<u64>,
) -> Result<Option<String>, askama::Error> {
    let body = match status {
        StatusCode::UNAUTHORIZED => UnauthorizedTemplate {
            page: PageContext::new(gateway, lang, "unauthorized_page_title", ""),
        }
        .render()?,
        StatusCode::FORBIDDEN => ForbiddenTemplate {
            page: PageContext::new(gateway, lang, "forbidden_page_title", ""),
        }
        .render()?,
        StatusCode::NOT_FOUND => NotFoundTemplate {
            page: PageContext::new(gateway, lang, "not_found_page_title", ""),
        }
        .render()?,
        StatusCode::TOO_MANY_REQUESTS => RateLimitedTemplate {
            page: PageContext::new(gateway, lang, "rate_limited_page_title", ""),
            retry_after,
        }
        .render()?,
        _ => return Ok(None),
    };
    Ok(Some(body))
}
