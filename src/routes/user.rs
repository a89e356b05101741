use crate::context::Gateway;
use crate::error::GatewayError;
use crate::routes::discord::drop_rejected_link;
use crate::routes::pages::enter;
use crate::routes::{index_path, redirect, supported_lang, temporary_redirect, user_path};
use crate::session::SessionRecord;
use crate::state::{select_view, SessionState, View};
use crate::templates;

use actix_session::Session;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use discord_oauth_core::DiscordError;

/// Profile view. The Discord token is probed on every request before the
/// linked profile is shown.
pub async fn user(
    gateway: Gateway,
    session: Session,
    lang: web::Path<String>,
) -> Result<HttpResponse, GatewayError> {
    let (lang, mut record) = enter(&lang, &session)?;
    let state = record.state();

    let access_token = match (state, record.discord.as_ref()) {
        (SessionState::CasDiscord, Some(link)) => Some(link.access_token.clone()),
        _ => None,
    };
    let discord_live = match access_token {
        Some(access_token) => {
            match gateway.discord().is_authenticated(&access_token).await {
                Ok(live) => live,
                Err(DiscordError::Unauthorized) => {
                    drop_rejected_link(&gateway, &session, &mut record).await?;
                    return Err(GatewayError::unauthorized_to(&index_path(lang)));
                }
                Err(err @ DiscordError::RateLimited { .. }) => return Err(err.into()),
                Err(err) => {
                    warn!("Discord liveness check failed, showing CAS profile only: {}", err);
                    false
                }
            }
        }
        None => false,
    };

    match (select_view(state, discord_live), record.cas_user.as_ref(), record.discord.as_ref()) {
        (View::Profile, Some(user), _) => templates::profile(&gateway, lang, user),
        (View::LinkedProfile, Some(user), Some(link)) => {
            templates::linked_profile(&gateway, lang, user, link)
        }
        _ => {
            if state == SessionState::DiscordOrphaned {
                warn!("Session holds a Discord token without a CAS identity");
            }
            Err(GatewayError::unauthorized_to(&index_path(lang)))
        }
    }
}

/// `/{lang}/profile` and `/{lang}/me`.
pub async fn user_alias(lang: web::Path<String>) -> Result<HttpResponse, GatewayError> {
    let lang = supported_lang(&lang)?;
    Ok(temporary_redirect(&user_path(lang)))
}

/// Role synchronisation is not available yet: signed-in users get a 501,
/// anyone else a no-op redirect.
pub async fn force_add_roles(session: Session) -> Result<HttpResponse, GatewayError> {
    let record = SessionRecord::load(&session);
    if record.state().is_cas_authenticated() {
        info!(
            "Role synchronisation requested by {}",
            record.cas_user.as_ref().map(|user| user.username()).unwrap_or_default()
        );
        return Err(GatewayError::NotImplemented);
    }
    Ok(redirect(StatusCode::SEE_OTHER, &user_path(record.lang)))
}
