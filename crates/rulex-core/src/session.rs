//! Parse-once lifecycle of the expression being edited.
//!
//! A session owns a single expression value. Each time the caller hands it a
//! *different* value the session parses it exactly once and lands in one of
//! four states:
//!
//! | state                | mode     | threshold        |
//! |----------------------|----------|------------------|
//! | `Unparsed`           | simple   | default record   |
//! | `ParseFailed`        | advanced | none (+ warning) |
//! | `ParsedNotThreshold` | advanced | none             |
//! | `ParsedThreshold`    | simple   | extracted record |
//!
//! Later edits work on the threshold record or on the raw text directly and
//! never re-derive one from the other through the parser.
use std::fmt;

use tracing::{debug, instrument, trace, warn};

use rulex_model::{DEFAULT_THRESHOLD, ThresholdExpression};
use rulex_query::QueryError;

use crate::{
    config::EditorConfig,
    error::{CoreError, CoreResult},
    extract::ThresholdExtractor,
    parser::{PromqlParser, QueryParser},
};

/// Message shown once when an existing expression cannot be parsed.
pub const PARSE_WARNING: &str = "There was a problem parsing the alert rule expression. \
     The UI-based editor is unavailable until the expression is manually fixed.";

/// Where the session is in the parse lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Nothing to parse: a fresh rule with an empty expression.
    Unparsed,
    /// The expression is not valid query text.
    ParseFailed,
    /// Valid query text, but not `<selector> <comparator> <scalar>`.
    ParsedNotThreshold,
    /// Valid threshold expression.
    ParsedThreshold,
}

impl ParseState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ParseState::Unparsed => "unparsed",
            ParseState::ParseFailed => "unparseable",
            ParseState::ParsedNotThreshold => "not a simple threshold",
            ParseState::ParsedThreshold => "a simple threshold",
        }
    }

    /// Whether the threshold editor can represent the expression.
    pub const fn allows_simple_mode(&self) -> bool {
        matches!(self, ParseState::Unparsed | ParseState::ParsedThreshold)
    }
}

impl fmt::Display for ParseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which editor the UI should show.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    /// Threshold editor.
    #[default]
    Simple,
    /// Raw query text editor.
    Advanced,
}

impl fmt::Display for EditorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EditorMode::Simple => "simple",
            EditorMode::Advanced => "advanced",
        })
    }
}

/// One-shot notification produced when an expression fails to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorWarning {
    pub message: String,
    /// The expression that failed.
    pub source: String,
    pub error: QueryError,
}

/// Editing session for a single alert-rule expression.
///
/// Every transition takes `&mut self`, so one session is driven by one caller
/// at a time.
#[derive(Debug)]
pub struct ExpressionSession<P = PromqlParser> {
    parser: P,
    extractor: ThresholdExtractor,
    source: Option<String>,
    state: ParseState,
    mode: EditorMode,
    threshold: Option<ThresholdExpression>,
    raw: String,
    warning: Option<EditorWarning>,
}

impl ExpressionSession<PromqlParser> {
    /// Session backed by the built-in query parser.
    pub fn new(cfg: &EditorConfig) -> Self {
        Self::with_parser(PromqlParser, cfg)
    }
}

impl<P: QueryParser> ExpressionSession<P> {
    /// Session for a fresh rule: `Unparsed`, simple mode, default threshold.
    pub fn with_parser(parser: P, cfg: &EditorConfig) -> Self {
        Self {
            parser,
            extractor: ThresholdExtractor::from_config(cfg),
            source: None,
            state: ParseState::Unparsed,
            mode: EditorMode::Simple,
            threshold: Some(DEFAULT_THRESHOLD),
            raw: String::new(),
            warning: None,
        }
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// Current threshold record; `None` whenever the expression is not one.
    pub fn threshold(&self) -> Option<&ThresholdExpression> {
        self.threshold.as_ref()
    }

    /// Raw text for the advanced editor.
    pub fn raw_expression(&self) -> &str {
        &self.raw
    }

    /// Last expression value handed to [`Self::set_expression`].
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Take the pending parse warning. Returns it once, then `None`.
    pub fn take_warning(&mut self) -> Option<EditorWarning> {
        self.warning.take()
    }

    /// Feed the current expression value.
    ///
    /// Unchanged values are ignored: no re-parse and no new warning. Empty or
    /// whitespace-only values are never parsed and reset the session to a
    /// fresh rule.
    #[instrument(level = "debug", skip(self, source), fields(len = source.map_or(0, str::len)))]
    pub fn set_expression(&mut self, source: Option<&str>) -> ParseState {
        let source = source.filter(|s| !s.trim().is_empty());
        if source == self.source.as_deref() {
            trace!(state = %self.state, "expression unchanged");
            return self.state;
        }

        self.source = source.map(str::to_owned);
        self.state = ParseState::Unparsed;
        self.warning = None;

        match source {
            None => self.enter_fresh(),
            Some(source) => self.enter_parsed(source),
        }
        self.state
    }

    fn enter_fresh(&mut self) {
        debug!("empty expression; starting from the default threshold");
        self.mode = EditorMode::Simple;
        self.threshold = Some(DEFAULT_THRESHOLD);
        self.raw.clear();
    }

    fn enter_parsed(&mut self, source: &str) {
        self.raw = source.to_owned();

        let expr = match self.parser.parse(source) {
            Ok(expr) => expr,
            Err(error) => {
                warn!(%error, "alert rule expression could not be parsed; using advanced editor");
                self.state = ParseState::ParseFailed;
                self.mode = EditorMode::Advanced;
                self.threshold = None;
                self.warning = Some(EditorWarning {
                    message: PARSE_WARNING.to_string(),
                    source: source.to_owned(),
                    error,
                });
                return;
            }
        };

        match self.extractor.extract(&expr) {
            Some(threshold) => {
                debug!(metric = %threshold.metric_name, "expression is a simple threshold");
                self.state = ParseState::ParsedThreshold;
                self.mode = EditorMode::Simple;
                self.threshold = Some(threshold);
            }
            None => {
                debug!(kind = expr.kind(), "expression is not a simple threshold");
                self.state = ParseState::ParsedNotThreshold;
                self.mode = EditorMode::Advanced;
                self.threshold = None;
            }
        }
    }

    /// Edit the threshold record in place (simple mode only).
    ///
    /// The reserved label is removed again afterwards.
    pub fn update_threshold(
        &mut self,
        edit: impl FnOnce(&mut ThresholdExpression),
    ) -> CoreResult<()> {
        self.require_mode(EditorMode::Simple)?;
        let reserved = self.extractor.reserved_label();
        let threshold = self.threshold.get_or_insert(DEFAULT_THRESHOLD);
        edit(threshold);
        threshold.filters.remove(reserved);
        Ok(())
    }

    /// Replace the threshold record (simple mode only).
    pub fn set_threshold(&mut self, threshold: ThresholdExpression) -> CoreResult<()> {
        self.update_threshold(|t| *t = threshold)
    }

    /// Replace the raw text (advanced mode only). The text is not parsed.
    pub fn set_raw_expression(&mut self, text: impl Into<String>) -> CoreResult<()> {
        self.require_mode(EditorMode::Advanced)?;
        self.raw = text.into();
        Ok(())
    }

    /// Switch between editors.
    ///
    /// Entering advanced mode seeds the raw text from the threshold when it
    /// renders. Returning to simple mode restores the threshold as it was and
    /// discards raw edits; it is refused when the expression never was a
    /// threshold.
    pub fn set_mode(&mut self, mode: EditorMode) -> CoreResult<()> {
        if mode == self.mode {
            return Ok(());
        }

        match mode {
            EditorMode::Advanced => {
                if let Some(threshold) = &self.threshold {
                    match self.extractor.to_expr(threshold) {
                        Ok(expr) => self.raw = expr.to_string(),
                        Err(e) => debug!(error = %e, "threshold not rendered; keeping raw text"),
                    }
                }
            }
            EditorMode::Simple => {
                if !self.state.allows_simple_mode() || self.threshold.is_none() {
                    return Err(CoreError::SimpleModeUnavailable(self.state));
                }
            }
        }

        debug!(from = %self.mode, to = %mode, "editor mode switched");
        self.mode = mode;
        Ok(())
    }

    /// Query text to store for the rule, taken from the active editor.
    pub fn expression(&self) -> CoreResult<String> {
        match (self.mode, &self.threshold) {
            (EditorMode::Simple, Some(threshold)) => {
                Ok(self.extractor.to_expr(threshold)?.to_string())
            }
            (EditorMode::Simple, None) => Err(CoreError::SimpleModeUnavailable(self.state)),
            (EditorMode::Advanced, _) => Ok(self.raw.clone()),
        }
    }

    fn require_mode(&self, expected: EditorMode) -> CoreResult<()> {
        if self.mode == expected {
            Ok(())
        } else {
            Err(CoreError::WrongMode {
                expected,
                actual: self.mode,
            })
        }
    }
}
