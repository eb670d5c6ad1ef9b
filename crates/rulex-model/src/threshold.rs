use serde::{Deserialize, Serialize};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

use crate::{Comparator, Labels};

/// Simplified alert condition: `metric{filters} <comparator> value`.
///
/// This is what the threshold editor edits. `filters` never contains
/// [`crate::LABEL_NETWORK_ID`]; that label is owned by the surrounding system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ThresholdExpression {
    pub metric_name: String,
    #[serde(default, skip_serializing_if = "Labels::is_empty")]
    pub filters: Labels,
    pub comparator: Comparator,
    pub value: f64,
}

/// Starting point for a fresh rule: no metric, no filters, `== 0`.
pub const DEFAULT_THRESHOLD: ThresholdExpression = ThresholdExpression {
    metric_name: String::new(),
    filters: Labels::new(),
    comparator: Comparator::Eq,
    value: 0.0,
};

impl ThresholdExpression {
    pub fn new(metric_name: impl Into<String>, comparator: Comparator, value: f64) -> Self {
        Self {
            metric_name: metric_name.into(),
            filters: Labels::new(),
            comparator,
            value,
        }
    }

    /// Builder-style helper adding an equality filter.
    pub fn with_filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(name, value);
        self
    }

    /// `true` once a metric has been chosen.
    pub fn is_complete(&self) -> bool {
        !self.metric_name.trim().is_empty()
    }
}

impl Default for ThresholdExpression {
    fn default() -> Self {
        DEFAULT_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_the_zero_threshold() {
        let t = ThresholdExpression::default();
        assert_eq!(t, DEFAULT_THRESHOLD);
        assert!(t.metric_name.is_empty());
        assert!(t.filters.is_empty());
        assert_eq!(t.comparator, Comparator::Eq);
        assert_eq!(t.value, 0.0);
        assert!(!t.is_complete());
    }

    #[test]
    fn builder_adds_filters() {
        let t = ThresholdExpression::new("cpu_util", Comparator::Gt, 90.0)
            .with_filter("job", "node")
            .with_filter("instance", "a");

        assert!(t.is_complete());
        assert_eq!(t.filters.get("job"), Some("node"));
        assert_eq!(t.filters.len(), 2);
    }

    #[test]
    fn serde_roundtrip_json() {
        let t = ThresholdExpression::new("cpu_util", Comparator::Ge, 90.5).with_filter("job", "node");

        let json = serde_json::to_string(&t).unwrap();
        assert!(json.contains(r#""metricName":"cpu_util""#));
        assert!(json.contains(r#""comparator":">=""#));

        let back: ThresholdExpression = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn serde_skips_empty_filters() {
        let json = serde_json::to_string(&ThresholdExpression::new("up", Comparator::Eq, 0.0)).unwrap();
        assert!(!json.contains("filters"));

        let back: ThresholdExpression =
            serde_json::from_str(r#"{"metricName":"up","comparator":"==","value":0}"#).unwrap();
        assert!(back.filters.is_empty());
    }
}
