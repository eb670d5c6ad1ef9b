//! Query expression ⇄ threshold record.
//!
//! Only one shape is representable as a threshold:
//! `<instant selector> <comparator> <scalar>`, with no `bool` modifier, no
//! vector matching and no `offset`. Everything else is left to the raw-text
//! editor.
use tracing::trace;

use rulex_model::{LABEL_NETWORK_ID, ThresholdExpression};
use rulex_query::{BinaryOperation, BinaryOperator, Expr, InstantSelector};

use crate::{
    config::EditorConfig,
    error::{CoreError, CoreResult},
};

/// Extracts threshold records from expressions, hiding one reserved label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdExtractor {
    reserved_label: String,
}

impl Default for ThresholdExtractor {
    fn default() -> Self {
        Self::new(LABEL_NETWORK_ID)
    }
}

impl ThresholdExtractor {
    pub fn new(reserved_label: impl Into<String>) -> Self {
        Self {
            reserved_label: reserved_label.into(),
        }
    }

    pub fn from_config(cfg: &EditorConfig) -> Self {
        Self::new(cfg.reserved_label.clone())
    }

    pub fn reserved_label(&self) -> &str {
        &self.reserved_label
    }

    /// Returns the threshold record if `expr` has the threshold shape.
    ///
    /// The reserved label is dropped from a copy of the selector's labels;
    /// `expr` itself is never modified.
    pub fn extract(&self, expr: &Expr) -> Option<ThresholdExpression> {
        let Expr::Binary(op) = expr else {
            trace!(kind = expr.kind(), "not a binary operation");
            return None;
        };
        let Some(comparator) = op.operator.as_comparator() else {
            trace!(operator = %op.operator, "operator is not a comparator");
            return None;
        };
        if op.return_bool || op.matching.is_some() {
            trace!("comparison carries modifiers");
            return None;
        }

        let (Expr::InstantSelector(selector), Expr::Scalar(scalar)) =
            (op.left_hand.as_ref(), op.right_hand.as_ref())
        else {
            trace!(
                left = op.left_hand.kind(),
                right = op.right_hand.kind(),
                "operands are not selector and scalar"
            );
            return None;
        };
        if selector.offset.is_some() {
            trace!("selector carries an offset");
            return None;
        }
        let Some(metric_name) = &selector.selector_name else {
            trace!("selector has no metric name");
            return None;
        };

        Some(ThresholdExpression {
            metric_name: metric_name.clone(),
            filters: selector.labels.without(&self.reserved_label),
            comparator,
            value: scalar.value,
        })
    }

    /// Builds `metric{filters} <comparator> value` from a threshold record.
    ///
    /// Fails when the metric or a filter name is not a valid identifier, or
    /// when the filters carry the reserved label.
    pub fn to_expr(&self, threshold: &ThresholdExpression) -> CoreResult<Expr> {
        let metric = threshold.metric_name.trim();
        if metric.is_empty() {
            return Err(CoreError::InvalidThreshold("metric name is empty".to_string()));
        }
        if !is_valid_name(metric) {
            return Err(CoreError::InvalidThreshold(format!(
                "invalid metric name {metric:?}"
            )));
        }
        for m in &threshold.filters {
            if m.name() == self.reserved_label {
                return Err(CoreError::InvalidThreshold(format!(
                    "label {:?} is reserved",
                    self.reserved_label
                )));
            }
            if !is_valid_name(m.name()) || m.name().contains(':') {
                return Err(CoreError::InvalidThreshold(format!(
                    "invalid label name {:?}",
                    m.name()
                )));
            }
        }

        let selector = InstantSelector::new(metric, threshold.filters.clone());
        Ok(BinaryOperation::new(
            selector.into(),
            BinaryOperator::Compare(threshold.comparator),
            Expr::scalar(threshold.value),
        )
        .into())
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == ':')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// [`ThresholdExtractor::extract`] with `networkID` as the reserved label.
pub fn extract_threshold(expr: &Expr) -> Option<ThresholdExpression> {
    ThresholdExtractor::default().extract(expr)
}

/// [`ThresholdExtractor::to_expr`] with `networkID` as the reserved label.
pub fn threshold_to_expr(threshold: &ThresholdExpression) -> CoreResult<Expr> {
    ThresholdExtractor::default().to_expr(threshold)
}

/// Renders a threshold record as query text, e.g. `cpu_util{job="node"} > 90`.
pub fn render_threshold(threshold: &ThresholdExpression) -> CoreResult<String> {
    threshold_to_expr(threshold).map(|expr| expr.to_string())
}

/// Parses `source` and extracts its threshold, if it has one.
pub fn threshold_from_query(source: &str) -> CoreResult<Option<ThresholdExpression>> {
    let expr = rulex_query::parse(source)?;
    Ok(extract_threshold(&expr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulex_model::{Comparator, MatchOp};
    use rulex_query::parse;

    fn extract(src: &str) -> Option<ThresholdExpression> {
        extract_threshold(&parse(src).unwrap())
    }

    #[test]
    fn extracts_simple_comparison() {
        let t = extract("cpu_util{} > 90").unwrap();

        assert_eq!(t.metric_name, "cpu_util");
        assert_eq!(t.comparator, Comparator::Gt);
        assert_eq!(t.value, 90.0);
        assert!(t.filters.is_empty());
    }

    #[test]
    fn extracts_every_comparator() {
        for c in Comparator::ALL {
            let t = extract(&format!("up {c} 1")).unwrap();
            assert_eq!(t.comparator, c);
        }
    }

    #[test]
    fn strips_reserved_label_and_keeps_the_rest() {
        let t = extract(r#"disk_used{networkID="abc", mount="/", host=~"gw.*"} >= 0.9"#).unwrap();

        assert!(!t.filters.contains("networkID"));
        let names: Vec<&str> = t.filters.iter().map(|m| m.name()).collect();
        assert_eq!(names, ["mount", "host"]);
        assert_eq!(t.filters.get_matcher("host").unwrap().op(), MatchOp::Regex);
        assert_eq!(t.value, 0.9);
    }

    #[test]
    fn leaves_input_expression_untouched() {
        let expr = parse(r#"up{networkID="abc"} == 0"#).unwrap();
        let before = expr.clone();

        let t = extract_threshold(&expr).unwrap();
        assert!(t.filters.is_empty());
        assert_eq!(expr, before);

        let Expr::Binary(op) = &expr else {
            panic!("expected binary");
        };
        let Expr::InstantSelector(sel) = op.left_hand.as_ref() else {
            panic!("expected selector");
        };
        assert_eq!(sel.labels.get("networkID"), Some("abc"));
    }

    #[test]
    fn custom_reserved_label() {
        let extractor = ThresholdExtractor::from_config(&EditorConfig {
            reserved_label: "tenant".into(),
        });
        let t = extractor
            .extract(&parse(r#"up{tenant="t1", networkID="n"} < 1"#).unwrap())
            .unwrap();

        assert!(!t.filters.contains("tenant"));
        assert_eq!(t.filters.get("networkID"), Some("n"));
    }

    #[test]
    fn rejects_other_shapes() {
        let not_thresholds = [
            "cpu_util + 90",
            "cpu_util > other",
            "90 < cpu_util",
            "sum(cpu_util) > 90",
            "rate(x[5m]) > 1",
            "(cpu_util > 90)",
            "cpu_util > bool 90",
            "cpu_util > on (job) 90",
            "cpu_util offset 5m > 90",
            r#"{__name__="cpu_util"} > 90"#,
            "cpu_util > 90 and up == 1",
            "-cpu_util > 90",
            "cpu_util",
            "90",
        ];
        for src in not_thresholds {
            assert!(extract(src).is_none(), "{src:?} should not be a threshold");
        }
    }

    #[test]
    fn render_then_extract_round_trips() {
        let t = ThresholdExpression::new("node_load1", Comparator::Ne, -2.5)
            .with_filter("job", "node")
            .with_filter("instance", "10.0.0.1:9100");

        let text = render_threshold(&t).unwrap();
        assert_eq!(
            text,
            r#"node_load1{job="node", instance="10.0.0.1:9100"} != -2.5"#
        );
        assert_eq!(threshold_from_query(&text).unwrap(), Some(t));
    }

    #[test]
    fn to_expr_validates_the_record() {
        let empty = ThresholdExpression::default();
        assert!(matches!(
            threshold_to_expr(&empty),
            Err(CoreError::InvalidThreshold(_))
        ));

        let bad_metric = ThresholdExpression::new("cpu util", Comparator::Gt, 1.0);
        assert!(matches!(
            threshold_to_expr(&bad_metric),
            Err(CoreError::InvalidThreshold(_))
        ));

        let reserved =
            ThresholdExpression::new("up", Comparator::Eq, 0.0).with_filter("networkID", "abc");
        assert!(matches!(
            threshold_to_expr(&reserved),
            Err(CoreError::InvalidThreshold(_))
        ));

        let bad_label = ThresholdExpression::new("up", Comparator::Eq, 0.0).with_filter("a:b", "x");
        assert!(matches!(
            threshold_to_expr(&bad_label),
            Err(CoreError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn deserialized_record_renders_parseable_text() {
        let t: ThresholdExpression = serde_json::from_str(
            r#"{"metricName":"up","filters":[{"name":"a","value":"1"},{"name":"a","value":"2"}],"comparator":">","value":1}"#,
        )
        .unwrap();

        let text = render_threshold(&t).unwrap();
        assert_eq!(text, r#"up{a="2"} > 1"#);
        assert_eq!(threshold_from_query(&text).unwrap(), Some(t));
    }

    #[test]
    fn threshold_from_query_surfaces_parse_errors() {
        assert!(matches!(
            threshold_from_query("cpu >"),
            Err(CoreError::Parse(_))
        ));
        assert_eq!(threshold_from_query("sum(x) > 1").unwrap(), None);
    }
}
