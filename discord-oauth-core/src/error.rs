#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    #[error("rate limited by Discord (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<f64> },

    #[error("Discord rejected the token")]
    Unauthorized,

    #[error("scope `{0}` was not requested")]
    ScopeMissing(&'static str),

    #[error("Discord answered with HTTP {0}")]
    Status(u16),

    #[error("Discord request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid Discord url: {0}")]
    Url(#[from] url::ParseError),
}
