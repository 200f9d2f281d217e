//! Authorization error types
//!
//! Every ambiguous outcome maps to an error; nothing here ever defaults to
//! "allow".

use tessera_foundation::Error as FoundationError;
use thiserror::Error;

/// Result type alias for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;

/// Failure reaching the privilege-check service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// 401 from the service: the principal is not authenticated
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 403 from the service: the principal may not check privileges
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Any other non-success status
    #[error("Upstream error ({status}): {reason}")]
    Upstream { status: u16, reason: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The service answered with a body that is not a privilege-check response
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl TransportError {
    /// Classify an HTTP status and body
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 => TransportError::Unauthorized(body.to_string()),
            403 => TransportError::Forbidden(body.to_string()),
            _ => TransportError::Upstream {
                status,
                reason: body.to_string(),
            },
        }
    }

    /// 401/403: the principal's authentication state itself was rejected
    pub fn is_auth_state(&self) -> bool {
        matches!(
            self,
            TransportError::Unauthorized(_) | TransportError::Forbidden(_)
        )
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::Unauthorized(_) => Some(401),
            TransportError::Forbidden(_) => Some(403),
            TransportError::Upstream { status, .. } => Some(*status),
            TransportError::Network(_)
            | TransportError::Timeout(_)
            | TransportError::Decode(_) => None,
        }
    }
}

/// Errors raised while authorizing or enforcing a decision
#[derive(Error, Debug)]
pub enum AuthzError {
    /// The principal lacks a required privilege
    #[error("{message}")]
    Forbidden {
        message: String,
        missing_actions: Vec<String>,
    },

    /// The privilege-check call itself failed
    #[error("Privilege check failed: {0}")]
    Transport(#[from] TransportError),

    /// The privilege-check response does not match the request
    #[error("Invalid response received from privilege check service: {0}")]
    InvalidResponse(String),

    /// A resource granted login without the deployment's version action
    #[error("Multiple versions are running against the same privilege store, unable to authorize user.")]
    VersionMismatch,

    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    #[error("Saved object [{object_type}/{id}] not found")]
    NotFound { object_type: String, id: String },

    #[error("Saved object [{object_type}/{id}] conflict")]
    Conflict { object_type: String, id: String },

    #[error("Repository error: {0}")]
    Repository(String),

    #[error(transparent)]
    Foundation(#[from] FoundationError),
}

impl AuthzError {
    pub fn forbidden(message: impl Into<String>, missing_actions: Vec<String>) -> Self {
        AuthzError::Forbidden {
            message: message.into(),
            missing_actions,
        }
    }

    pub fn not_found(object_type: impl Into<String>, id: impl Into<String>) -> Self {
        AuthzError::NotFound {
            object_type: object_type.into(),
            id: id.into(),
        }
    }

    pub fn conflict(object_type: impl Into<String>, id: impl Into<String>) -> Self {
        AuthzError::Conflict {
            object_type: object_type.into(),
            id: id.into(),
        }
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, AuthzError::Forbidden { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AuthzError::NotFound { .. })
    }

    /// The transport error behind this failure, if any
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            AuthzError::Transport(e) => Some(e),
            _ => None,
        }
    }
}
