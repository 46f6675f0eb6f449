//! Error taxonomy shared by every call that crosses the network boundary.
//!
//! Messages are shown to the operator verbatim; nothing is sanitized here.

use thiserror::Error;

/// Failure of a gateway call or of a local precondition in front of one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No credential in the session store. Raised before any network I/O.
    #[error("missing API token: run `cmdbdash token set <TOKEN>` first")]
    Auth,

    /// The remote answered with a non-success status.
    #[error("{status} {status_text}: {body}")]
    Transport {
        status: u16,
        status_text: String,
        body: String,
    },

    /// The remote could not be reached at all.
    #[error("network error: {message}")]
    Network { message: String },

    /// A local precondition failed, e.g. a required form field is missing.
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Short label used in the journal and on the status line.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Transport { .. } => "transport",
            Self::Network { .. } => "network",
            Self::Validation(_) => "validation",
        }
    }
}
