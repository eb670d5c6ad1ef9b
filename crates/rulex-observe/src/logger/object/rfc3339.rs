use std::fmt;

use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};

/// RFC3339 timestamps in UTC, e.g. `2026-10-16T08:30:00.123456789Z`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UtcRfc3339;

impl UtcRfc3339 {
    pub(crate) fn now() -> String {
        OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "<invalid-time>".to_string())
    }
}

impl FormatTime for UtcRfc3339 {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{} ", Self::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_utc_rfc3339() {
        let ts = UtcRfc3339::now();

        assert!(ts.ends_with('Z'), "expected UTC suffix in {ts:?}");
        assert_eq!(ts.as_bytes()[10], b'T');
        assert!(ts[..4].chars().all(|c| c.is_ascii_digit()));
    }
}
