//! Error handling for the WebUI protocol client
//!
//! Every failure is fatal for the operation that raised it and is returned to
//! the caller as-is. Nothing in this crate retries.

use thiserror::Error;

/// Main error type for the WebUI client
#[derive(Error, Debug)]
pub enum WebUiError {
    /// Credential material rejected before it ever reaches the server
    #[error("Invalid {field}: {value:?} does not match the required pattern")]
    Validation { field: &'static str, value: String },

    /// The server answered with something the protocol grammar does not allow
    #[error("Protocol format error: {0}")]
    ProtocolFormat(String),

    /// Error message reported by the remote application (verbatim)
    #[error("Remote application error: {0}")]
    RemoteApplication(String),

    #[error("Unknown endpoint '{0}'")]
    UnknownEndpoint(String),

    #[error("Unknown property '{0}'")]
    UnknownProperty(String),

    #[error("Unknown dialog '{0}'")]
    UnknownDialog(String),

    #[error("Unknown component '{0}'")]
    UnknownComponent(String),

    #[error("Application {0} is closed")]
    ApplicationClosed(i64),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl WebUiError {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        WebUiError::ProtocolFormat(message.into())
    }

    /// Whether the error was reported by the remote application itself
    pub fn is_remote(&self) -> bool {
        matches!(self, WebUiError::RemoteApplication(_))
    }
}

pub type Result<T> = std::result::Result<T, WebUiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_message_is_verbatim() {
        let err = WebUiError::RemoteApplication("Nepodarilo sa.".to_string());
        assert!(err.is_remote());
        assert_eq!(err.to_string(), "Remote application error: Nepodarilo sa.");
    }

    #[test]
    fn test_validation_message_names_field() {
        let err = WebUiError::Validation {
            field: "cookie name",
            value: "bogus".to_string(),
        };
        assert!(!err.is_remote());
        assert!(err.to_string().contains("cookie name"));
    }
}
