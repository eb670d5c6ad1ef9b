use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::logger::{
    error::LoggerResult,
    object::{LoggerFormat, LoggerLevel},
};

/// Env var overriding [`LoggerConfig::level`].
pub const ENV_LOG_LEVEL: &str = "RULEX_LOG";
/// Env var overriding [`LoggerConfig::format`].
pub const ENV_LOG_FORMAT: &str = "RULEX_LOG_FORMAT";

/// Logger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// Filter expression (e.g. `"info"`, `"rulex_core=debug,info"`).
    pub level: LoggerLevel,
    /// Include module targets in text/json output.
    pub with_targets: bool,
    /// Color text output; only honored when stdout is a terminal.
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::default(),
            level: LoggerLevel::default(),
            with_targets: true,
            use_color: true,
        }
    }
}

impl LoggerConfig {
    /// Defaults overridden by `RULEX_LOG` and `RULEX_LOG_FORMAT`.
    pub fn from_env() -> LoggerResult<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up through `var`. Unset or blank values keep
    /// the current setting; malformed ones are errors.
    pub fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> LoggerResult<Self> {
        let lookup = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.level = level.parse()?;
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            self.format = format.parse()?;
        }
        Ok(self)
    }

    pub fn should_use_color(&self) -> bool {
        self.use_color && std::io::stdout().is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::LoggerError;

    fn vars<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn default_values() {
        let cfg = LoggerConfig::default();

        assert_eq!(cfg.format, LoggerFormat::Text);
        assert_eq!(cfg.level.as_str(), "info");
        assert!(cfg.with_targets);
        assert!(cfg.use_color);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: LoggerConfig =
            serde_json::from_str(r#"{"format": "json", "withTargets": false}"#).unwrap();

        assert_eq!(cfg.format, LoggerFormat::Json);
        assert!(!cfg.with_targets);
        assert_eq!(cfg.level, LoggerLevel::default());
        assert!(cfg.use_color);
    }

    #[test]
    fn overrides_replace_level_and_format() {
        let cfg = LoggerConfig::default()
            .with_overrides(vars(&[
                (ENV_LOG_LEVEL, "rulex_core=trace,warn"),
                (ENV_LOG_FORMAT, "json"),
            ]))
            .unwrap();

        assert_eq!(cfg.level.as_str(), "rulex_core=trace,warn");
        assert_eq!(cfg.format, LoggerFormat::Json);
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let base = LoggerConfig {
            format: LoggerFormat::Json,
            ..Default::default()
        };
        let cfg = base
            .clone()
            .with_overrides(vars(&[(ENV_LOG_LEVEL, "  ")]))
            .unwrap();

        assert_eq!(cfg, base);
    }

    #[test]
    fn malformed_overrides_are_errors() {
        let err = LoggerConfig::default()
            .with_overrides(vars(&[(ENV_LOG_FORMAT, "xml")]))
            .unwrap_err();
        assert!(matches!(err, LoggerError::InvalidFormat(_)));

        let err = LoggerConfig::default()
            .with_overrides(vars(&[(ENV_LOG_LEVEL, "rulex=shout")]))
            .unwrap_err();
        assert!(matches!(err, LoggerError::InvalidLevel(_)));
    }
}
