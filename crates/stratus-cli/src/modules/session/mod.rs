mod error;
mod transcript;
mod transport;
pub(crate) mod types;

pub(crate) use error::ClientError;
pub(crate) use transport::Session;
pub(crate) use types::{ApiResponse, Credential, IdentityProtocol, SessionConfig, Timing};
