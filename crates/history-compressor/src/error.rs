use ot_types::OtError;
use thiserror::Error;

/// Failure while compressing or replaying a batch of updates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompressError {
    /// An update does not have the expected shape.
    #[error("invalid update: {0}")]
    InvalidUpdate(String),

    /// The batch disagrees with its own bookkeeping; the flush job has to
    /// rebuild the document history from an authoritative copy.
    #[error("resync required: {0}")]
    ResyncRequired(String),

    #[error(transparent)]
    Ot(#[from] OtError),
}

impl CompressError {
    pub fn requires_resync(&self) -> bool {
        match self {
            CompressError::InvalidUpdate(_) => false,
            CompressError::ResyncRequired(_) => true,
            CompressError::Ot(err) => err.requires_resync(),
        }
    }
}

impl From<serde_json::Error> for CompressError {
    fn from(err: serde_json::Error) -> Self {
        CompressError::InvalidUpdate(err.to_string())
    }
}

pub type CompressResult<T> = Result<T, CompressError>;
