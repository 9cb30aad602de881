use serde::Deserialize;
use thiserror::Error;

/// Failures surfaced by the remote data client.
///
/// `Display` is the short, human-readable string views attach to a screen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("Please sign in to continue")]
    Unauthenticated,
    #[error("Network unavailable, check your connection")]
    NetworkUnavailable,
    #[error("{message}")]
    ClientRejected { status: u16, message: String },
    #[error("Server error ({status}), please try again later")]
    ServerError { status: u16 },
    #[error("Unexpected response from server")]
    MalformedResponse(String),
    #[error("{0}")]
    InvalidInput(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl ClientError {
    /// Maps a non-success status and its body onto the taxonomy.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        match status {
            401 => ClientError::Unauthenticated,
            400..=499 => ClientError::ClientRejected {
                status,
                message: rejection_message(status, body),
            },
            _ => ClientError::ServerError { status },
        }
    }

    pub fn user_message(&self) -> String {
        self.to_string()
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ClientError::Unauthenticated)
    }
}

fn rejection_message(status: u16, body: &[u8]) -> String {
    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
    parsed
        .error
        .or(parsed.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| match status {
            403 => "You are not allowed to do that".to_string(),
            404 => "Not found".to_string(),
            409 => "Already exists".to_string(),
            _ => "Request rejected".to_string(),
        })
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::MalformedResponse(err.to_string())
        } else {
            ClientError::NetworkUnavailable
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::MalformedResponse(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(err: validator::ValidationErrors) -> Self {
        ClientError::InvalidInput(err.to_string())
    }
}

/// Failures of an optimistic mutation. The local state has already been
/// rolled back by the time one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("Still saving your last change")]
    InFlight,
    #[error("You cannot follow yourself")]
    SelfFollow,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Only the author can do that")]
    NotAuthor,
    #[error(transparent)]
    Remote(#[from] ClientError),
}

pub type MutationResult<T> = Result<T, MutationError>;

impl MutationError {
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, MutationError::Remote(e) if e.is_auth_failure())
    }
}

impl From<validator::ValidationErrors> for MutationError {
    fn from(err: validator::ValidationErrors) -> Self {
        MutationError::Remote(err.into())
    }
}
