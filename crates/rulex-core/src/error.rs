use thiserror::Error;

use rulex_query::QueryError;

use crate::session::{EditorMode, ParseState};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("expression parse error: {0}")]
    Parse(#[from] QueryError),

    #[error("invalid threshold: {0}")]
    InvalidThreshold(String),

    #[error("threshold editor is unavailable while the expression is {0}")]
    SimpleModeUnavailable(ParseState),

    #[error("operation requires {expected} mode, editor is in {actual} mode")]
    WrongMode {
        expected: EditorMode,
        actual: EditorMode,
    },
}

pub type CoreResult<T> = Result<T, CoreError>;
