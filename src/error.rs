use crate::context::Gateway;
use crate::session;
use crate::templates;

use actix_session::{SessionExt, SessionInsertError};
use actix_web::dev::ServiceResponse;
use actix_web::http::header::{self, HeaderValue};
use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlerResponse, ErrorHandlers};
use actix_web::{HttpResponse, ResponseError};
use cas_client_core::CasError;
use discord_oauth_core::DiscordError;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("authentication required")]
    Unauthorized { location: Option<String> },

    #[error("request rejected")]
    Forbidden,

    #[error("no such page")]
    NotFound,

    #[error("rate limited by Discord")]
    RateLimited { retry_after: Option<f64> },

    #[error("not implemented yet")]
    NotImplemented,

    #[error("CAS server error: {0}")]
    Cas(#[from] CasError),

    #[error("Discord error: {0}")]
    Discord(DiscordError),

    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    #[error("session error: {0}")]
    Session(#[from] SessionInsertError),
}

impl GatewayError {
    /// 401 carrying a `Location` to follow for signing in.
    pub fn unauthorized_to(location: &str) -> Self {
        GatewayError::Unauthorized {
            location: Some(location.to_string()),
        }
    }
}

impl From<DiscordError> for GatewayError {
    fn from(err: DiscordError) -> Self {
        match err {
            DiscordError::RateLimited { retry_after } => GatewayError::RateLimited { retry_after },
            DiscordError::Unauthorized => GatewayError::Unauthorized { location: None },
            other => GatewayError::Discord(other),
        }
    }
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            GatewayError::Forbidden => StatusCode::FORBIDDEN,
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            GatewayError::Cas(_) | GatewayError::Discord(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Template(_) | GatewayError::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Bare status and headers. Bodies of 401/403/404/429 come from [`error_pages`].
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let mut builder = HttpResponse::build(status);
        match self {
            GatewayError::Unauthorized {
                location: Some(location),
            } => {
                builder.insert_header((header::LOCATION, location.as_str()));
            }
            GatewayError::RateLimited {
                retry_after: Some(seconds),
            } => {
                builder.insert_header((header::RETRY_AFTER, seconds.ceil().max(0.0) as u64));
            }
            _ => {}
        }
        if status.is_server_error() {
            error!("{}", self);
            return builder
                .content_type("text/plain; charset=utf-8")
                .body(status.canonical_reason().unwrap_or("Error"));
        }
        builder.finish()
    }
}

/// Renders the dedicated 401, 403, 404 and 429 pages in the session language.
pub fn error_pages<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new()
        .handler(StatusCode::UNAUTHORIZED, render_error_page)
        .handler(StatusCode::FORBIDDEN, render_error_page)
        .handler(StatusCode::NOT_FOUND, render_error_page)
        .handler(StatusCode::TOO_MANY_REQUESTS, render_error_page)
}

fn render_error_page<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let body = {
        let req = res.request();
        let gateway = match req.app_data::<Gateway>() {
            Some(gateway) => gateway,
            None => return Ok(ErrorHandlerResponse::Response(res.map_into_left_body())),
        };
        let lang = session::current_lang(&req.get_session());
        let retry_after = res
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());
        templates::error_page(gateway, lang, res.status(), retry_after)
    };

    let body = match body {
        Ok(Some(body)) => body,
        Ok(None) => return Ok(ErrorHandlerResponse::Response(res.map_into_left_body())),
        Err(err) => {
            error!("Failed to render {} page: {}", res.status(), err);
            return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
        }
    };

    let (req, mut res) = res.into_parts();
    res.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    let res = ServiceResponse::new(req, res.set_body(body))
        .map_into_boxed_body()
        .map_into_right_body();
    Ok(ErrorHandlerResponse::Response(res))
}
