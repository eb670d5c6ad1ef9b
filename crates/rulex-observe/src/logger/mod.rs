mod config;
mod error;
mod init;
mod object;

pub use config::{ENV_LOG_FORMAT, ENV_LOG_LEVEL, LoggerConfig};
pub use error::{LoggerError, LoggerResult};
pub use object::{LoggerFormat, LoggerLevel, UtcRfc3339};

/// Installs the global tracing subscriber described by `cfg`.
///
/// Can succeed once per process; later calls return
/// [`LoggerError::AlreadyInitialized`].
///
/// ```rust
/// use rulex_observe::{LoggerConfig, init_logger};
///
/// let cfg = LoggerConfig::from_env().unwrap_or_default();
/// init_logger(&cfg).expect("logger");
/// tracing::info!("ready");
/// ```
pub fn init_logger(cfg: &LoggerConfig) -> LoggerResult<()> {
    match cfg.format {
        LoggerFormat::Text => init::init_text(cfg),
        LoggerFormat::Json => init::init_json(cfg),
        LoggerFormat::Journald => init::init_journald(cfg),
    }
}
