use thiserror::Error;

/// Failure to turn query text into an [`crate::Expr`].
///
/// Every positional variant carries the byte offset into the source.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected character {found:?} at offset {pos}")]
    UnexpectedChar { pos: usize, found: char },

    #[error("unterminated string starting at offset {pos}")]
    UnterminatedString { pos: usize },

    #[error("invalid number literal {text:?} at offset {pos}")]
    InvalidNumber { pos: usize, text: String },

    #[error("unexpected {found} at offset {pos}, expected {expected}")]
    UnexpectedToken {
        pos: usize,
        found: String,
        expected: &'static str,
    },

    #[error("duplicate label matcher {name:?} at offset {pos}")]
    DuplicateLabel { pos: usize, name: String },

    #[error("vector selector at offset {pos} needs a metric name or a label matcher")]
    EmptySelector { pos: usize },

    #[error("{op} at offset {pos} expects {expected} argument(s), got {got}")]
    AggregationArity {
        pos: usize,
        op: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("range or offset modifier at offset {pos} must follow a vector selector")]
    InvalidModifier { pos: usize },

    #[error("expression nested deeper than {limit} levels at offset {pos}")]
    TooDeep { pos: usize, limit: usize },
}

impl QueryError {
    /// Byte offset of the failure, if it has one.
    pub fn position(&self) -> Option<usize> {
        match self {
            QueryError::Empty => None,
            QueryError::UnexpectedChar { pos, .. }
            | QueryError::UnterminatedString { pos }
            | QueryError::InvalidNumber { pos, .. }
            | QueryError::UnexpectedToken { pos, .. }
            | QueryError::DuplicateLabel { pos, .. }
            | QueryError::EmptySelector { pos }
            | QueryError::AggregationArity { pos, .. }
            | QueryError::InvalidModifier { pos }
            | QueryError::TooDeep { pos, .. } => Some(*pos),
        }
    }
}

pub type QueryResult<T> = Result<T, QueryError>;
