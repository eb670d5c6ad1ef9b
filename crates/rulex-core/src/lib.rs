//! Core of the simplified alert-rule editor.
//!
//! Maps query expressions to threshold records and back, and drives the
//! parse-once lifecycle that decides between the threshold editor and the
//! raw-text editor.
pub mod config;
pub mod error;
pub mod extract;
pub mod parser;
pub mod session;

pub mod prelude {
    pub use crate::config::EditorConfig;
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::extract::{
        ThresholdExtractor, extract_threshold, render_threshold, threshold_from_query,
        threshold_to_expr,
    };
    pub use crate::parser::{PromqlParser, QueryParser};
    pub use crate::session::{EditorMode, EditorWarning, ExpressionSession, ParseState};
}
