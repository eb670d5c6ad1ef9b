//! # rulex-query
//!
//! Abstract syntax tree and parser for the subset of PromQL used by alert
//! rules.
//!
//! ## Overview
//! - [`parse`] turns query text into an [`Expr`] tree or a [`QueryError`]
//!   carrying the byte offset of the failure.
//! - [`Expr`] is a closed sum type; consumers pattern-match on it instead of
//!   probing node types at runtime.
//! - Every node implements [`std::fmt::Display`], producing query text that
//!   parses back to an equal tree (NaN literals compare equal to each
//!   other).
//!
//! ## Supported syntax
//! Number and string literals, instant and range selectors with `= != =~ !~`
//! matchers, `offset`, function calls, aggregations with `by`/`without`,
//! unary `+`/`-`, arithmetic, comparison (with `bool`) and set operators with
//! the usual precedence, `on`/`ignoring` with `group_left`/`group_right`, and
//! parentheses. Subqueries and `@` modifiers are not supported.
//!
//! ```rust
//! use rulex_query::{Expr, parse};
//!
//! let expr = parse(r#"cpu_util{job="node"} > 90"#).unwrap();
//! assert!(matches!(expr, Expr::Binary(_)));
//! assert_eq!(expr.to_string(), r#"cpu_util{job="node"} > 90"#);
//! ```

mod ast;
pub use ast::{
    Aggregation, AggregationOp, BinaryOperation, BinaryOperator, Expr, FunctionCall, GroupSide,
    Grouping, InstantSelector, MatchingKind, RangeSelector, Scalar, StringLiteral, UnaryOperation,
    UnaryOperator, VectorMatching,
};

mod display;

mod error;
pub use error::{QueryError, QueryResult};

mod lexer;

mod parser;
pub use parser::{MAX_NESTING, parse};
