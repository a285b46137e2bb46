use thiserror::Error;

/// Failure of an OT function.
///
/// The three kinds demand different reactions from the caller: a
/// [`OtError::Validation`] rejects one malformed operation, while
/// [`OtError::Conflict`] and [`OtError::InvariantViolation`] mean the two
/// sites no longer agree about the document and a full resync is needed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OtError {
    #[error("invalid operation: {0}")]
    Validation(String),

    #[error("conflicting operations: {0}")]
    Conflict(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl OtError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        OtError::Validation(msg.into())
    }

    pub(crate) fn conflict(msg: impl Into<String>) -> Self {
        OtError::Conflict(msg.into())
    }

    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        OtError::InvariantViolation(msg.into())
    }

    /// Whether the caller must re-derive the document from an authoritative
    /// source instead of retrying or dropping the operation.
    pub fn requires_resync(&self) -> bool {
        !matches!(self, OtError::Validation(_))
    }
}

pub type OtResult<T> = Result<T, OtError>;
