use thiserror::Error;

use crate::model::{AccountError, ParseIdError, QuizError, SubjectError};

/// Any validation failure raised while building a payload.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error(transparent)]
    Subject(#[from] SubjectError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    ParseId(#[from] ParseIdError),
    #[error("invalid date {raw:?}, expected YYYY-MM-DD")]
    InvalidDate { raw: String },
}
