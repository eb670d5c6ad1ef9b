use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

use crate::error::{ModelError, ModelResult};

/// Relational operator of a threshold condition.
///
/// Serialized as the operator symbol itself (`">="`, `"!="`, ...), which is
/// also what the query language uses.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub enum Comparator {
    #[default]
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
}

impl Comparator {
    /// All six comparators, in the order the editor lists them.
    pub const ALL: [Comparator; 6] = [
        Comparator::Eq,
        Comparator::Ne,
        Comparator::Gt,
        Comparator::Lt,
        Comparator::Ge,
        Comparator::Le,
    ];

    /// Returns the operator symbol.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Comparator::Eq => "==",
            Comparator::Ne => "!=",
            Comparator::Gt => ">",
            Comparator::Lt => "<",
            Comparator::Ge => ">=",
            Comparator::Le => "<=",
        }
    }
}

impl FromStr for Comparator {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        Comparator::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| ModelError::UnknownComparator(s.to_string()))
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_symbol() {
        for c in Comparator::ALL {
            assert_eq!(c.as_str().parse::<Comparator>().unwrap(), c);
        }
        assert_eq!(" >= ".parse::<Comparator>().unwrap(), Comparator::Ge);
    }

    #[test]
    fn rejects_non_relational_operators() {
        for bad in ["", "=", "+", "=~", "=<", "and"] {
            let err = bad.parse::<Comparator>().unwrap_err();
            assert!(matches!(err, ModelError::UnknownComparator(_)), "{bad:?}");
        }
    }

    #[test]
    fn serde_uses_symbols() {
        let json = serde_json::to_string(&Comparator::Le).unwrap();
        assert_eq!(json, r#""<=""#);

        let back: Comparator = serde_json::from_str(r#""!=""#).unwrap();
        assert_eq!(back, Comparator::Ne);
    }
}
