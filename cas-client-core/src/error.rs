/// Errors raised while talking to a CAS server.
#[derive(Debug, thiserror::Error)]
pub enum CasError {
    #[error("invalid CAS url: {0}")]
    Url(#[from] url::ParseError),

    #[error("CAS request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed CAS response: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("unexpected CAS response: {0}")]
    UnexpectedResponse(String),

    #[error("invalid attribute filter: {0}")]
    Filter(#[from] serde_json::Error),
}
