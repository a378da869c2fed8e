use stratus_core::{ApiError, ApiErrorKind, CatalogError};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("authorization failure: {0}")]
    AuthorizationFailure(String),
    #[error("connection refused: {0}")]
    ConnectionRefused(String),
    #[error("auth system not found: {0}")]
    AuthSystemNotFound(String),
    #[error("token lookup is not supported by the legacy identity protocol")]
    NoTokenLookup,
    #[error("too many redirects while authenticating (last location: {location})")]
    TooManyRedirects { location: String },
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Api(err) if err.kind == ApiErrorKind::Unauthorized)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            ClientError::ConnectionRefused(err.to_string())
        } else {
            ClientError::Transport(err)
        }
    }
}
