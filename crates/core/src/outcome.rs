//! Terminal results of a single request

use crate::snapshot::FormSnapshot;
use bytes::Bytes;

/// Binary image payload returned by the image service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    /// Raw response body
    pub bytes: Bytes,
    /// Response `Content-Type`, if the service sent one
    pub content_type: Option<String>,
}

impl Payload {
    pub fn new(bytes: impl Into<Bytes>, content_type: Option<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type,
        }
    }

    /// Payload size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Media type without parameters, lowercased
    ///
    /// `image/svg+xml; charset=utf-8` becomes `image/svg+xml`.
    pub fn media_type(&self) -> Option<String> {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .filter(|ct| !ct.is_empty())
    }

    /// File extension matching the media type
    pub fn extension(&self) -> &'static str {
        match self.media_type().as_deref() {
            Some("image/svg+xml") => "svg",
            Some("image/png") => "png",
            Some("image/jpeg") => "jpg",
            Some("image/gif") => "gif",
            Some("image/webp") => "webp",
            _ => "bin",
        }
    }
}

/// Result of one request attempt
///
/// Produced once per fired trigger and consumed once by the render controller.
/// Transport and service failures are indistinguishable past this point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The service produced an image for `snapshot`
    Success {
        payload: Payload,
        snapshot: FormSnapshot,
    },
    /// The request failed; `message` is shown to the user verbatim
    Failure { message: String },
}

impl RequestOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
