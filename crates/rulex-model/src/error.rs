use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown comparator: {0} (expected one of: == != > < >= <=)")]
    UnknownComparator(String),

    #[error("unknown time unit: {0} (expected: h|m|s)")]
    UnknownTimeUnit(String),

    #[error("unknown label match operator: {0} (expected one of: = != =~ !~)")]
    UnknownMatchOp(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
