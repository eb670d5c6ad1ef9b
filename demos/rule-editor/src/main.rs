use std::{env, fs};

use anyhow::Context;
use tracing::{info, warn};

use rulex_core::prelude::*;
use rulex_model::Duration;
use rulex_observe::{LoggerConfig, init_logger};

const USAGE: &str = "usage: rule-editor <expression> [for-duration] [editor-config.json]";

fn main() -> anyhow::Result<()> {
    // 1) logger
    let log_cfg = LoggerConfig::from_env()?;
    init_logger(&log_cfg)?;

    // 2) arguments
    let mut args = env::args().skip(1);
    let expression = args.next().context(USAGE)?;
    let for_duration = args.next().unwrap_or_default();
    let cfg = match args.next() {
        Some(path) => {
            let raw = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            serde_json::from_str::<EditorConfig>(&raw)
                .with_context(|| format!("parsing editor config {path}"))?
        }
        None => EditorConfig::default(),
    };

    // 3) duration field
    let duration = Duration::parse(&for_duration);
    let shown = duration.most_significant();
    info!(input = %for_duration, parsed = %duration, shown = %shown, "for-duration");

    // 4) expression lifecycle
    let mut session = ExpressionSession::new(&cfg);
    let state = session.set_expression(Some(&expression));
    if let Some(warning) = session.take_warning() {
        warn!(error = %warning.error, "{}", warning.message);
    }
    info!(%state, mode = %session.mode(), "expression loaded");

    match session.threshold() {
        Some(threshold) => {
            println!("{}", serde_json::to_string_pretty(threshold)?);
            match session.expression() {
                Ok(text) => println!("{text}"),
                Err(e) => warn!(error = %e, "threshold does not render yet"),
            }
        }
        None => {
            println!("{}", session.expression()?);
            if let Err(e) = session.set_mode(EditorMode::Simple) {
                info!(error = %e, "threshold editor unavailable");
            }
        }
    }
    Ok(())
}
