//! Error types for rseme.

use thiserror::Error;

use crate::session::SessionState;

/// Main error type for rseme operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No candidate key system was accepted by the platform.
    #[error("No supported key system among {0:?}")]
    UnsupportedKeySystem(Vec<String>),

    /// The certificate could not be fetched, or was required and absent.
    #[error("Certificate fetch failed: {0}")]
    CertificateFetch(String),

    /// The platform key-management object could not be created or attached.
    #[error("Key management creation failed: {0}")]
    KeyManagementCreation(String),

    /// The platform refused to create a key session.
    #[error("Session creation failed: {0}")]
    SessionCreation(String),

    /// The license exchange failed.
    #[error("License request failed: {0}")]
    LicenseRequest(String),

    /// The platform rejected the supplied license bytes.
    #[error("License application failed: {0}")]
    LicenseApplication(String),

    /// A key system entry is missing a required URL or hook.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Transport failure while talking to a certificate or license server.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Raw refusal reported by a platform primitive.
    #[error("Platform error: {0}")]
    Platform(String),

    /// A session attempted a transition the state machine does not allow.
    #[error("Invalid session transition from {from:?} to {to:?}")]
    InvalidTransition { from: SessionState, to: SessionState },

    /// Failed to decode data.
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// YAML configuration error.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

/// Coarse classification surfaced to callers of the acquisition entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedKeySystem,
    CertificateFetch,
    KeyManagementCreation,
    SessionCreation,
    LicenseRequest,
    LicenseApplication,
    Configuration,
    Transport,
    Platform,
    InvalidTransition,
    Decode,
    Io,
    Other,
}

impl Error {
    /// Return the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnsupportedKeySystem(_) => ErrorKind::UnsupportedKeySystem,
            Error::CertificateFetch(_) => ErrorKind::CertificateFetch,
            Error::KeyManagementCreation(_) => ErrorKind::KeyManagementCreation,
            Error::SessionCreation(_) => ErrorKind::SessionCreation,
            Error::LicenseRequest(_) => ErrorKind::LicenseRequest,
            Error::LicenseApplication(_) => ErrorKind::LicenseApplication,
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::Transport(_) => ErrorKind::Transport,
            Error::Platform(_) => ErrorKind::Platform,
            Error::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Error::DecodeError(_) | Error::YamlError(_) => ErrorKind::Decode,
            Error::IoError(_) => ErrorKind::Io,
            Error::Other(_) => ErrorKind::Other,
        }
    }

    /// Build an equivalent error of the same kind for another waiter.
    ///
    /// Used when one failure has to be reported to several queued callers.
    /// Kinds without a plain message payload collapse into
    /// `KeyManagementCreation` carrying the rendered message.
    pub(crate) fn replicate(&self) -> Error {
        match self {
            Error::UnsupportedKeySystem(candidates) => {
                Error::UnsupportedKeySystem(candidates.clone())
            }
            Error::CertificateFetch(m) => Error::CertificateFetch(m.clone()),
            Error::KeyManagementCreation(m) => Error::KeyManagementCreation(m.clone()),
            Error::SessionCreation(m) => Error::SessionCreation(m.clone()),
            Error::LicenseRequest(m) => Error::LicenseRequest(m.clone()),
            Error::LicenseApplication(m) => Error::LicenseApplication(m.clone()),
            Error::Configuration(m) => Error::Configuration(m.clone()),
            other => Error::KeyManagementCreation(other.to_string()),
        }
    }
}

/// Result type alias for rseme operations.
pub type Result<T> = std::result::Result<T, Error>;
