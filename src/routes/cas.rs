use crate::context::Gateway;
use crate::error::GatewayError;
use crate::routes::discord::revoke_link;
use crate::routes::{index_path, temporary_redirect, user_path};
use crate::session::SessionRecord;

use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TicketQuery {
    ticket: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProxyCallbackQuery {
    #[serde(rename = "pgtIou")]
    pgt_iou: Option<String>,
    #[serde(rename = "pgtId")]
    pgt_id: Option<String>,
}

/// Starts the CAS login, or completes it when CAS comes back with a ticket.
pub async fn login(
    gateway: Gateway,
    session: Session,
    query: web::Query<TicketQuery>,
) -> Result<HttpResponse, GatewayError> {
    let mut record = SessionRecord::load(&session);
    if record.cas_user.is_some() {
        return Ok(temporary_redirect(&user_path(record.lang)));
    }

    let ticket = match query.into_inner().ticket.filter(|ticket| !ticket.is_empty()) {
        Some(ticket) => ticket,
        None => {
            let login_url = gateway.cas().login_url()?;
            debug!("Ticket not found, redirecting to CAS login: {}", login_url);
            return Ok(temporary_redirect(&login_url));
        }
    };

    let verification = match gateway.cas().verify_ticket(&ticket).await? {
        Some(verification) => verification,
        None => {
            warn!("CAS did not validate the service ticket");
            return Ok(temporary_redirect("/login"));
        }
    };
    if let Some(iou) = verification.proxy_granting_ticket_iou.as_deref() {
        match gateway.proxy_tickets().take(iou) {
            Some(pgt) => confirm_proxy(&gateway, &pgt).await,
            None => warn!("No proxy-granting ticket received for {}", iou),
        }
    }

    let user = verification.user.filtered(gateway.attribute_filter());
    info!("CAS user {} signed in", user.username());
    record.sign_in_cas(user);
    record.store(&session)?;
    Ok(temporary_redirect(&user_path(record.lang)))
}

/// Exchanges the proxy-granting ticket and validates the proxy ticket on
/// `proxyValidate` as a liveness check. Failures are only logged.
async fn confirm_proxy(gateway: &Gateway, proxy_granting_ticket: &str) {
    let proxy_ticket = match gateway.cas().proxy_ticket(proxy_granting_ticket).await {
        Ok(Some(proxy_ticket)) => proxy_ticket,
        Ok(None) => {
            warn!("CAS refused to issue a proxy ticket");
            return;
        }
        Err(err) => {
            warn!("Proxy ticket request failed: {}", err);
            return;
        }
    };
    match gateway.cas().verify_proxy_ticket(&proxy_ticket).await {
        Ok(Some(verification)) => debug!("Proxy ticket validated for {}", verification.user.username()),
        Ok(None) => warn!("CAS did not validate the proxy ticket"),
        Err(err) => warn!("Proxy ticket validation failed: {}", err),
    }
}

/// `pgtUrl` target. CAS first checks the endpoint answers, then delivers the
/// ticket with its IOU.
pub async fn proxy_callback(
    gateway: Gateway,
    query: web::Query<ProxyCallbackQuery>,
) -> HttpResponse {
    if let ProxyCallbackQuery {
        pgt_iou: Some(iou),
        pgt_id: Some(pgt),
    } = query.into_inner()
    {
        debug!("Received proxy-granting ticket for {}", iou);
        gateway.proxy_tickets().insert(&iou, &pgt);
    }
    HttpResponse::Ok().finish()
}

/// Sends a signed-in user to the CAS logout, which comes back to `/logout-callback`.
pub async fn logout(gateway: Gateway, session: Session) -> Result<HttpResponse, GatewayError> {
    let record = SessionRecord::load(&session);
    if record.cas_user.is_none() {
        return Ok(temporary_redirect("/login"));
    }
    let logout_url = gateway
        .cas()
        .logout_url(&gateway.settings().logout_callback_url)?;
    debug!("CAS logout URL: {}", logout_url);
    Ok(temporary_redirect(&logout_url))
}

/// CAS confirmed the logout: drop both identities, keep the language.
pub async fn logout_callback(
    gateway: Gateway,
    session: Session,
) -> Result<HttpResponse, GatewayError> {
    let mut record = SessionRecord::load(&session);
    if let Some(username) = record.cas_user.as_ref().map(|user| user.username().to_string()) {
        info!("CAS user {} signed out", username);
    }
    if let Some(link) = record.sign_out() {
        revoke_link(&gateway, &link).await;
    }
    record.store(&session)?;
    Ok(temporary_redirect(&index_path(record.lang)))
}
