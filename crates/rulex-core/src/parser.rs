//! Seam between the editor core and the query-language parser.
use rulex_query::{Expr, QueryResult};

/// Turns query text into an expression tree.
///
/// The session only ever sees the grammar through this trait, so a different
/// parser (or a test double) can be plugged in.
pub trait QueryParser: Send + Sync {
    fn parse(&self, source: &str) -> QueryResult<Expr>;
}

/// Default parser backed by [`rulex_query::parse`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PromqlParser;

impl QueryParser for PromqlParser {
    fn parse(&self, source: &str) -> QueryResult<Expr> {
        rulex_query::parse(source)
    }
}
