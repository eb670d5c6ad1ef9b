//! Compact duration strings used by alert rules (`for: 1h30m`).
//!
//! Accepted grammar is `(\d+h)?(\d+m)?(\d+s)?`, segments in that fixed order
//! and each one optional. Parsing never fails: anything outside the grammar
//! degrades to a zero [`Duration`] so the editor always has a usable value.
//!
//! The numeric editor only shows one unit, see [`Duration::most_significant`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

use crate::error::{ModelError, ModelResult};

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 3_600;

/// Unit of a single-field duration editor.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub enum TimeUnit {
    #[serde(rename = "h")]
    Hours,
    #[serde(rename = "m")]
    Minutes,
    #[default]
    #[serde(rename = "s")]
    Seconds,
}

impl TimeUnit {
    /// Units from most to least significant.
    pub const ALL: [TimeUnit; 3] = [TimeUnit::Hours, TimeUnit::Minutes, TimeUnit::Seconds];

    /// Suffix used in duration strings.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Hours => "h",
            TimeUnit::Minutes => "m",
            TimeUnit::Seconds => "s",
        }
    }

    const fn suffix(&self) -> u8 {
        match self {
            TimeUnit::Hours => b'h',
            TimeUnit::Minutes => b'm',
            TimeUnit::Seconds => b's',
        }
    }
}

impl FromStr for TimeUnit {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h" => Ok(TimeUnit::Hours),
            "m" => Ok(TimeUnit::Minutes),
            "s" => Ok(TimeUnit::Seconds),
            _ => Err(ModelError::UnknownTimeUnit(s.to_string())),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hours, minutes and seconds as written in a duration string.
///
/// Fields are not normalized: `"90m"` stays `{0, 90, 0}`.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(default, rename_all = "camelCase")]
pub struct Duration {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl Duration {
    pub const ZERO: Duration = Duration::new(0, 0, 0);

    pub const fn new(hours: u64, minutes: u64, seconds: u64) -> Self {
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    /// Parse a compact duration string such as `"2h30m15s"` or `"45m"`.
    ///
    /// Input outside the grammar (wrong segment order, unknown units,
    /// whitespace, signs, overflowing numbers) yields [`Duration::ZERO`].
    pub fn parse(input: &str) -> Self {
        Self::parse_strict(input).unwrap_or_default()
    }

    fn parse_strict(input: &str) -> Option<Self> {
        let mut out = Duration::ZERO;
        let mut rest = input;

        for unit in TimeUnit::ALL {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            if digits == 0 || rest.as_bytes().get(digits) != Some(&unit.suffix()) {
                continue;
            }
            let value = rest[..digits].parse::<u64>().ok()?;
            out.set(unit, value);
            rest = &rest[digits + 1..];
        }

        rest.is_empty().then_some(out)
    }

    fn set(&mut self, unit: TimeUnit, value: u64) {
        match unit {
            TimeUnit::Hours => self.hours = value,
            TimeUnit::Minutes => self.minutes = value,
            TimeUnit::Seconds => self.seconds = value,
        }
    }

    pub const fn is_zero(&self) -> bool {
        self.hours == 0 && self.minutes == 0 && self.seconds == 0
    }

    /// Total length in seconds, saturating on overflow.
    pub const fn total_seconds(&self) -> u64 {
        self.hours
            .saturating_mul(SECONDS_PER_HOUR)
            .saturating_add(self.minutes.saturating_mul(SECONDS_PER_MINUTE))
            .saturating_add(self.seconds)
    }

    /// Reduce to the most significant non-zero unit.
    ///
    /// Precedence is hours, then minutes, then seconds. Lower fields are
    /// discarded: `{1, 30, 0}` becomes `1h` and the 30 minutes are lost. An
    /// all-zero duration reduces to `0s`.
    pub const fn most_significant(&self) -> MostSignificantTime {
        if self.hours != 0 {
            MostSignificantTime::new(self.hours, TimeUnit::Hours)
        } else if self.minutes != 0 {
            MostSignificantTime::new(self.minutes, TimeUnit::Minutes)
        } else {
            MostSignificantTime::new(self.seconds, TimeUnit::Seconds)
        }
    }
}

impl FromStr for Duration {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Duration::parse(s))
    }
}

/// Canonical multi-segment form, e.g. `1h30m`; zero renders as `0s`.
impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0s");
        }
        for (value, unit) in [
            (self.hours, TimeUnit::Hours),
            (self.minutes, TimeUnit::Minutes),
            (self.seconds, TimeUnit::Seconds),
        ] {
            if value != 0 {
                write!(f, "{value}{unit}")?;
            }
        }
        Ok(())
    }
}

impl From<Duration> for std::time::Duration {
    fn from(d: Duration) -> Self {
        std::time::Duration::from_secs(d.total_seconds())
    }
}

/// Single unit plus magnitude, as shown by a one-field numeric editor.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct MostSignificantTime {
    pub magnitude: u64,
    pub unit: TimeUnit,
}

impl MostSignificantTime {
    pub const fn new(magnitude: u64, unit: TimeUnit) -> Self {
        Self { magnitude, unit }
    }

    /// Parse a duration string and reduce it in one step.
    pub fn from_time_string(input: &str) -> Self {
        Duration::parse(input).most_significant()
    }

    /// Expand back into a [`Duration`] with only `unit` set.
    pub const fn to_duration(&self) -> Duration {
        match self.unit {
            TimeUnit::Hours => Duration::new(self.magnitude, 0, 0),
            TimeUnit::Minutes => Duration::new(0, self.magnitude, 0),
            TimeUnit::Seconds => Duration::new(0, 0, self.magnitude),
        }
    }
}

impl fmt::Display for MostSignificantTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.magnitude, self.unit)
    }
}

/// Render `"<magnitude><unit>"`, e.g. `format_duration(5, TimeUnit::Minutes) == "5m"`.
pub fn format_duration(magnitude: u64, unit: TimeUnit) -> String {
    MostSignificantTime::new(magnitude, unit).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_zero() {
        assert_eq!(Duration::parse(""), Duration::new(0, 0, 0));
    }

    #[test]
    fn parses_all_segments() {
        assert_eq!(Duration::parse("2h30m15s"), Duration::new(2, 30, 15));
        assert_eq!(Duration::parse("45m"), Duration::new(0, 45, 0));
        assert_eq!(Duration::parse("1h15s"), Duration::new(1, 0, 15));
        assert_eq!(Duration::parse("007s"), Duration::new(0, 0, 7));
        assert_eq!(Duration::parse("90m"), Duration::new(0, 90, 0));
    }

    #[test]
    fn non_matching_input_falls_back_to_zero() {
        let bad = [
            "garbage", "30s5m", "5m1h", "5", "h", "5x", "5 m", " 5m", "-5m", "1.5h", "5d", "5mm",
            "5M", "99999999999999999999999s",
        ];
        for input in bad {
            assert_eq!(Duration::parse(input), Duration::ZERO, "{input:?}");
        }
    }

    #[test]
    fn from_str_never_fails() {
        let d: Duration = "garbage".parse().unwrap();
        assert!(d.is_zero());
    }

    #[test]
    fn most_significant_prefers_larger_units() {
        assert_eq!(
            Duration::new(2, 30, 15).most_significant(),
            MostSignificantTime::new(2, TimeUnit::Hours)
        );
        assert_eq!(
            Duration::new(0, 5, 59).most_significant(),
            MostSignificantTime::new(5, TimeUnit::Minutes)
        );
        assert_eq!(
            Duration::ZERO.most_significant(),
            MostSignificantTime::new(0, TimeUnit::Seconds)
        );
    }

    #[test]
    fn reduction_drops_lower_units() {
        let reduced = Duration::new(1, 30, 0).most_significant();
        assert_eq!(reduced.to_string(), "1h");
        assert_eq!(Duration::parse(&reduced.to_string()), Duration::new(1, 0, 0));
    }

    #[test]
    fn single_unit_durations_round_trip() {
        for n in [1, 7, 60, 1_000] {
            for unit in TimeUnit::ALL {
                let d = MostSignificantTime::new(n, unit).to_duration();
                let reduced = d.most_significant();
                let text = format_duration(reduced.magnitude, reduced.unit);

                assert_eq!(text, format!("{n}{}", unit.as_str()));
                assert_eq!(Duration::parse(&text), d);
            }
        }
    }

    #[test]
    fn from_time_string_parses_and_reduces() {
        assert_eq!(
            MostSignificantTime::from_time_string("10m30s"),
            MostSignificantTime::new(10, TimeUnit::Minutes)
        );
        assert_eq!(
            MostSignificantTime::from_time_string("bogus"),
            MostSignificantTime::new(0, TimeUnit::Seconds)
        );
    }

    #[test]
    fn display_renders_canonical_form() {
        assert_eq!(Duration::new(1, 30, 0).to_string(), "1h30m");
        assert_eq!(Duration::new(0, 0, 0).to_string(), "0s");
        assert_eq!(Duration::new(2, 0, 5).to_string(), "2h5s");
    }

    #[test]
    fn converts_to_std_duration() {
        let d: std::time::Duration = Duration::new(1, 1, 1).into();
        assert_eq!(d.as_secs(), 3_661);
        assert_eq!(Duration::new(u64::MAX, 1, 0).total_seconds(), u64::MAX);
    }

    #[test]
    fn time_unit_parses_suffixes() {
        assert_eq!("H".parse::<TimeUnit>().unwrap(), TimeUnit::Hours);
        assert_eq!(" m ".parse::<TimeUnit>().unwrap(), TimeUnit::Minutes);
        assert!(matches!(
            "d".parse::<TimeUnit>(),
            Err(ModelError::UnknownTimeUnit(_))
        ));
    }

    #[test]
    fn serde_shapes() {
        let json = serde_json::to_string(&MostSignificantTime::new(5, TimeUnit::Minutes)).unwrap();
        assert_eq!(json, r#"{"magnitude":5,"unit":"m"}"#);

        let d: Duration = serde_json::from_str(r#"{"minutes":3}"#).unwrap();
        assert_eq!(d, Duration::new(0, 3, 0));
    }
}
