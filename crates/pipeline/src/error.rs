//! Request failures

use std::error::Error as _;
use thiserror::Error;

/// Why a request produced no image
///
/// Both variants collapse into a `RequestOutcome::Failure` at the pipeline
/// boundary; only the message survives.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Network unreachable, DNS failure, timeout, broken body
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("{body}")]
    Service { status: u16, body: String },

    /// The configured endpoint is not a usable URL
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    Endpoint { endpoint: String, reason: String },
}

impl PipelineError {
    /// Text shown to the user
    ///
    /// Service errors show the body verbatim. Transport errors include their
    /// source chain, since reqwest keeps the useful part (connection refused,
    /// timed out) in the sources.
    pub fn message(&self) -> String {
        match self {
            Self::Service { body, .. } => body.clone(),
            Self::Transport(err) => {
                let mut message = err.to_string();
                let mut source = err.source();
                while let Some(cause) = source {
                    let text = cause.to_string();
                    if !message.contains(&text) {
                        message.push_str(": ");
                        message.push_str(&text);
                    }
                    source = cause.source();
                }
                message
            }
            Self::Endpoint { .. } => self.to_string(),
        }
    }

    /// Whether the failure happened before a response arrived
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
