use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

use crate::error::{ModelError, ModelResult};

/// How a label matcher compares the series label against its value.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub enum MatchOp {
    /// `name="value"`
    #[default]
    #[serde(rename = "=")]
    Equal,
    /// `name!="value"`
    #[serde(rename = "!=")]
    NotEqual,
    /// `name=~"regex"`
    #[serde(rename = "=~")]
    Regex,
    /// `name!~"regex"`
    #[serde(rename = "!~")]
    NotRegex,
}

impl MatchOp {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MatchOp::Equal => "=",
            MatchOp::NotEqual => "!=",
            MatchOp::Regex => "=~",
            MatchOp::NotRegex => "!~",
        }
    }
}

impl FromStr for MatchOp {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim() {
            "=" => Ok(MatchOp::Equal),
            "!=" => Ok(MatchOp::NotEqual),
            "=~" => Ok(MatchOp::Regex),
            "!~" => Ok(MatchOp::NotRegex),
            other => Err(ModelError::UnknownMatchOp(other.to_string())),
        }
    }
}

impl fmt::Display for MatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single label filter: `name <op> "value"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct LabelMatcher {
    name: String,
    value: String,
    #[serde(default)]
    op: MatchOp,
}

impl LabelMatcher {
    /// Create an equality matcher.
    pub fn new<N, V>(name: N, value: V) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        Self::with_op(name, MatchOp::Equal, value)
    }

    pub fn with_op<N, V>(name: N, op: MatchOp, value: V) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            value: value.into(),
            op,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn op(&self) -> MatchOp {
        self.op
    }
}

impl From<(&str, &str)> for LabelMatcher {
    fn from((name, value): (&str, &str)) -> Self {
        Self::new(name, value)
    }
}

/// Ordered set of label matchers with unique names.
///
/// Insertion order is preserved so that filters render in the order the user
/// (or the query text) wrote them. Inserting a name that is already present
/// replaces that entry in place. Deserialization goes through the same path,
/// so a repeated name keeps its first position and its last value.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(transparent)]
pub struct Labels(Vec<LabelMatcher>);

impl Labels {
    /// Create an empty set of labels.
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no labels are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Insert or overwrite an equality matcher.
    ///
    /// Returns `self` for chaining.
    pub fn insert<N, V>(&mut self, name: N, value: V) -> &mut Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        self.insert_matcher(LabelMatcher::new(name, value))
    }

    /// Insert or overwrite a matcher, keeping the position of an existing name.
    pub fn insert_matcher(&mut self, matcher: LabelMatcher) -> &mut Self {
        match self.0.iter_mut().find(|m| m.name == matcher.name) {
            Some(slot) => *slot = matcher,
            None => self.0.push(matcher),
        }
        self
    }

    /// Get the value for a name, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_matcher(name).map(LabelMatcher::value)
    }

    pub fn get_matcher(&self, name: &str) -> Option<&LabelMatcher> {
        self.0.iter().find(|m| m.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get_matcher(name).is_some()
    }

    /// Remove a label in place, returning the removed matcher.
    pub fn remove(&mut self, name: &str) -> Option<LabelMatcher> {
        let idx = self.0.iter().position(|m| m.name == name)?;
        Some(self.0.remove(idx))
    }

    /// Copy of this set without `name`; `self` is left untouched.
    pub fn without(&self, name: &str) -> Labels {
        Labels(self.0.iter().filter(|m| m.name != name).cloned().collect())
    }

    /// Iterate through all matchers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &LabelMatcher> {
        self.0.iter()
    }
}

impl FromIterator<LabelMatcher> for Labels {
    fn from_iter<I: IntoIterator<Item = LabelMatcher>>(iter: I) -> Self {
        let mut labels = Labels::new();
        for m in iter {
            labels.insert_matcher(m);
        }
        labels
    }
}

impl<'de> Deserialize<'de> for Labels {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<LabelMatcher>::deserialize(deserializer).map(Labels::from_iter)
    }
}

impl<'a> IntoIterator for &'a Labels {
    type Item = &'a LabelMatcher;
    type IntoIter = std::slice::Iter<'a, LabelMatcher>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
