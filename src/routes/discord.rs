use crate::context::Gateway;
use crate::error::GatewayError;
use crate::routes::{index_path, temporary_redirect, user_path};
use crate::session::{DiscordLink, SessionRecord};
use crate::state::discord_flow_allowed;

use actix_session::Session;
use actix_web::{web, HttpResponse};
use discord_oauth_core::{generate_state, DiscordError, TokenTypeHint};
use futures::future::join;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Loads the record and enforces the CAS precondition of the Discord flow.
fn discord_session(gateway: &Gateway, session: &Session) -> Result<SessionRecord, GatewayError> {
    let record = SessionRecord::load(session);
    if !discord_flow_allowed(record.state(), gateway.settings().run_mode) {
        debug!("Discord flow refused without CAS identity");
        return Err(GatewayError::unauthorized_to("/login"));
    }
    Ok(record)
}

/// Issues a fresh state and sends the browser to Discord's authorization page.
pub async fn discord_login(
    gateway: Gateway,
    session: Session,
) -> Result<HttpResponse, GatewayError> {
    let mut record = discord_session(&gateway, &session)?;
    if record.discord.is_some() {
        return Ok(temporary_redirect(&user_path(record.lang)));
    }
    let state = generate_state();
    let authorization_url = gateway.discord().authorization_url(&state)?;
    record.begin_discord_login(state);
    record.store(&session)?;
    Ok(temporary_redirect(&authorization_url))
}

pub async fn discord_callback(
    gateway: Gateway,
    session: Session,
    query: web::Query<CallbackQuery>,
) -> Result<HttpResponse, GatewayError> {
    let mut record = discord_session(&gateway, &session)?;
    let query = query.into_inner();

    let expected = record.take_oauth_state();
    if expected.is_none() || query.state != expected {
        error!("Discord callback state does not match the issued one, purging session");
        session.purge();
        return Err(GatewayError::Forbidden);
    }
    record.store(&session)?;

    let code = match query.code.filter(|code| !code.is_empty()) {
        Some(code) => code,
        None => {
            warn!("Discord callback without code: {:?}", query.error);
            return Ok(temporary_redirect("/discord-login"));
        }
    };
    let tokens = match gateway.discord().exchange_code(&code).await {
        Ok(tokens) => tokens,
        Err(err) => {
            warn!("Discord code exchange failed: {}", err);
            return Ok(temporary_redirect("/discord-login"));
        }
    };
    if gateway.settings().run_mode.is_diagnostic() {
        debug!(
            "Discord tokens: access={} refresh={}",
            tokens.access_token, tokens.refresh_token
        );
    }

    let user = match gateway.discord().current_user(&tokens.access_token).await {
        Ok(user) => user,
        Err(err) => {
            warn!("Discord user lookup failed, revoking the new tokens: {}", err);
            revoke_tokens(&gateway, &tokens.access_token, &tokens.refresh_token, "unknown").await;
            return Err(err.into());
        }
    };
    match gateway.discord().user_guilds(&tokens.access_token).await {
        Ok(guilds) => info!("Discord user {} is in {} guild(s)", user.id, guilds.len()),
        Err(err) => warn!("Ignoring Discord guilds of {}: {}", user.id, err),
    }

    record.link_discord(DiscordLink::new(tokens, &user), gateway.settings().run_mode)?;
    record.store(&session)?;
    info!("Discord user {} linked", user.id);
    Ok(temporary_redirect(&user_path(record.lang)))
}

/// JSON boolean telling whether the stored Discord token is still accepted.
pub async fn discord_authenticated(
    gateway: Gateway,
    session: Session,
) -> Result<HttpResponse, GatewayError> {
    let mut record = SessionRecord::load(&session);
    if record.cas_user.is_none() {
        return Ok(temporary_redirect(&index_path(record.lang)));
    }
    let access_token = match record.discord.as_ref() {
        Some(link) => link.access_token.clone(),
        None => return Ok(HttpResponse::Ok().json(false)),
    };
    match gateway.discord().is_authenticated(&access_token).await {
        Ok(live) => Ok(HttpResponse::Ok().json(live)),
        Err(DiscordError::Unauthorized) => {
            drop_rejected_link(&gateway, &session, &mut record).await?;
            Ok(HttpResponse::Ok().json(false))
        }
        Err(err) => Err(err.into()),
    }
}

/// Discord refused the access token: the link is no longer a usable identity.
/// It is removed, whatever grant is left is revoked, and CAS stays signed in.
pub(crate) async fn drop_rejected_link(
    gateway: &Gateway,
    session: &Session,
    record: &mut SessionRecord,
) -> Result<(), GatewayError> {
    if let Some(link) = record.unlink_discord() {
        warn!("Discord rejected the token of user {}, unlinking", link.user_id);
        revoke_link(gateway, &link).await;
        record.store(session)?;
    }
    Ok(())
}

/// Revokes both tokens and removes the Discord identity. CAS is left alone.
pub async fn discord_logout(
    gateway: Gateway,
    session: Session,
) -> Result<HttpResponse, GatewayError> {
    let mut record = SessionRecord::load(&session);
    if let Some(link) = record.unlink_discord() {
        revoke_link(&gateway, &link).await;
        record.store(&session)?;
        info!("Discord user {} unlinked", link.user_id);
    }
    Ok(temporary_redirect(&user_path(record.lang)))
}

pub(crate) async fn revoke_link(gateway: &Gateway, link: &DiscordLink) {
    revoke_tokens(gateway, &link.access_token, &link.refresh_token, &link.user_id).await;
}

/// Revokes the access and refresh tokens concurrently. Failures are logged only.
async fn revoke_tokens(gateway: &Gateway, access_token: &str, refresh_token: &str, owner: &str) {
    let discord = gateway.discord();
    let (access, refresh) = join(
        discord.revoke_token(access_token, TokenTypeHint::AccessToken),
        discord.revoke_token(refresh_token, TokenTypeHint::RefreshToken),
    )
    .await;
    for (hint, result) in [
        (TokenTypeHint::AccessToken, access),
        (TokenTypeHint::RefreshToken, refresh),
    ] {
        if let Err(err) = result {
            error!(
                "Could not revoke Discord {} of user {}: {}",
                hint.as_str(),
                owner,
                err
            );
        }
    }
}
