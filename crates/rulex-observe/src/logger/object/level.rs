use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::logger::LoggerError;

/// Validated `EnvFilter` directive string, e.g. `"info"` or
/// `"rulex_core=trace,info"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LoggerLevel(String);

impl LoggerLevel {
    pub fn new(s: impl Into<String>) -> Result<Self, LoggerError> {
        Self::try_from(s.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds the filter. The directive was validated on construction, so
    /// the `info` fallback is never expected to apply.
    pub fn to_env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(self.as_str()).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

impl Default for LoggerLevel {
    fn default() -> Self {
        LoggerLevel("info".to_string())
    }
}

impl FromStr for LoggerLevel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_owned())
    }
}

impl TryFrom<String> for LoggerLevel {
    type Error = LoggerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.trim().is_empty() {
            return Err(LoggerError::InvalidLevel("empty filter".to_string()));
        }
        match EnvFilter::try_new(&s) {
            Ok(_) => Ok(LoggerLevel(s)),
            Err(e) => Err(LoggerError::InvalidLevel(format!("{s}: {e}"))),
        }
    }
}

impl From<LoggerLevel> for String {
    fn from(l: LoggerLevel) -> Self {
        l.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_levels_and_directives() {
        for lvl in ["info", "warn", "trace", "rulex_core=trace,rulex_query=debug,info"] {
            assert!(lvl.parse::<LoggerLevel>().is_ok(), "{lvl:?} should be accepted");
        }
    }

    #[test]
    fn rejects_bad_directives() {
        for lvl in ["", "   ", "rulex_core=loud", "a=trace,b=wat"] {
            assert!(
                matches!(LoggerLevel::from_str(lvl), Err(LoggerError::InvalidLevel(_))),
                "{lvl:?} should be rejected"
            );
        }
    }

    #[test]
    fn default_is_info() {
        let lvl = LoggerLevel::default();
        assert_eq!(lvl.as_str(), "info");
        let _filter = lvl.to_env_filter();
    }

    #[test]
    fn serde_validates_on_the_way_in() {
        let lvl: LoggerLevel = serde_json::from_str(r#""debug""#).unwrap();
        assert_eq!(lvl, LoggerLevel::new("debug").unwrap());
        assert_eq!(serde_json::to_string(&lvl).unwrap(), r#""debug""#);

        assert!(serde_json::from_str::<LoggerLevel>(r#""x=nope""#).is_err());
    }
}
