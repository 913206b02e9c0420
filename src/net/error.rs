//! Failure taxonomy for gateway calls.
//!
//! ERROR HANDLING
//! ==============
//! `GatewayError` never escapes the public gateway surface. Every variant
//! collapses into a `success = false` [`NormalizedResponse`] carrying a
//! message fit for display.

use super::envelope::NormalizedResponse;
use super::transport::TransportError;

pub const NETWORK_FAILURE_MESSAGE: &str = "Network connection failed, please check your network";
pub const AUTH_EXPIRED_MESSAGE: &str = "Authentication failed, please log in again";

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The request never reached the server.
    #[error("network error: {0}")]
    Network(String),
    /// The request could not be encoded locally.
    #[error("invalid request: {0}")]
    Request(String),
    /// The server answered with a non-2xx status.
    #[error("http {status}: {message}")]
    Http { status: u16, message: String, code: Option<String> },
    /// The server answered 2xx but the envelope reported failure.
    #[error("application error: {message}")]
    Application { message: String, code: Option<String> },
    /// The token expired locally or the server answered 401.
    #[error("authentication expired")]
    AuthExpired,
}

impl GatewayError {
    /// Build an HTTP failure, preferring the status table over the body.
    pub fn http(status: u16, body_message: Option<String>, code: Option<String>) -> Self {
        Self::Http { status, message: status_message(status, body_message), code }
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => NETWORK_FAILURE_MESSAGE.to_owned(),
            Self::Request(detail) => format!("Invalid request: {detail}"),
            Self::Http { message, .. } | Self::Application { message, .. } => message.clone(),
            Self::AuthExpired => AUTH_EXPIRED_MESSAGE.to_owned(),
        }
    }
}

impl From<TransportError> for GatewayError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Invalid(detail) => Self::Request(detail),
            other => Self::Network(other.to_string()),
        }
    }
}

impl From<GatewayError> for NormalizedResponse {
    fn from(err: GatewayError) -> Self {
        let code = match &err {
            GatewayError::Http { code, .. } | GatewayError::Application { code, .. } => code.clone(),
            _ => None,
        };
        NormalizedResponse::failure(err.user_message(), code)
    }
}

/// Display message for a failing HTTP status.
pub fn status_message(status: u16, body_message: Option<String>) -> String {
    match status {
        401 => AUTH_EXPIRED_MESSAGE.to_owned(),
        403 => "Access denied".to_owned(),
        404 => "Endpoint not found".to_owned(),
        500 => "Internal server error".to_owned(),
        _ => body_message.unwrap_or_else(|| format!("Request failed ({status})")),
    }
}
