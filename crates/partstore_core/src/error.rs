//! Failure taxonomy shared by repository and service layers.
//!
//! Every error surfaced by this crate maps onto exactly one `ErrorKind`, which
//! callers translate into their own status vocabulary.

/// Classification of a failure as seen by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or rule-breaking input. Never retried.
    Validation,
    /// No live part matches the requested key.
    NotFound,
    /// Storage-layer failure. Not retried.
    Persistence,
}

impl ErrorKind {
    /// HTTP status code used by the part routes for this kind.
    pub fn http_status(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::NotFound => 404,
            Self::Persistence => 500,
        }
    }
}
