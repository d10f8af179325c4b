use crate::error::{Result, SilError};
use crate::logs::LogRecord;
use chrono::{DateTime, FixedOffset, Local, Offset, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use std::fmt;
use tracing::debug;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Date and time part of a rendered timestamp; hundredths of a second and the
/// numeric offset (`+hhmm`) are appended after it.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Time zone log timestamps are rendered in.
///
/// Resolved once at startup and passed down to every formatting call.
/// Formatting never consults the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayZone {
    /// A zone from the tz database, with its daylight saving rules
    Named(Tz),
    /// A fixed offset from UTC
    Fixed(FixedOffset),
}

impl DisplayZone {
    pub fn utc() -> Self {
        DisplayZone::Fixed(Utc.fix())
    }

    /// Capture the zone of the running process.
    ///
    /// `TZ` wins over the system setting. When neither names a known zone,
    /// the current local offset is frozen instead.
    pub fn local() -> Self {
        let name = std::env::var("TZ")
            .ok()
            .map(|tz| tz.trim_start_matches(':').to_string())
            .filter(|tz| !tz.is_empty())
            .or_else(|| iana_time_zone::get_timezone().ok());

        match name.as_deref().and_then(|name| name.parse::<Tz>().ok()) {
            Some(tz) => DisplayZone::Named(tz),
            None => {
                let offset = Local::now().offset().fix();
                debug!(?name, %offset, "Local zone unknown, using current offset");
                DisplayZone::Fixed(offset)
            }
        }
    }

    /// Parse a zone setting: `local`, `utc`/`z`, a tz database name such as
    /// `Europe/London`, or an offset `+hh:mm`, `-hhmm` or `+hh`
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "local" => return Ok(DisplayZone::local()),
            "utc" | "z" => return Ok(DisplayZone::utc()),
            _ => {}
        }

        let invalid = || SilError::ConfigError(format!("Invalid time zone: '{}'", value));

        let (sign, digits) = match trimmed.chars().next() {
            Some('+') => (1, &trimmed[1..]),
            Some('-') => (-1, &trimmed[1..]),
            _ => return trimmed.parse::<Tz>().map(DisplayZone::Named).map_err(|_| invalid()),
        };
        let digits: String = digits.chars().filter(|c| *c != ':').collect();
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let (hours, minutes) = match digits.len() {
            2 => (&digits[..2], "0"),
            4 => (&digits[..2], &digits[2..]),
            _ => return Err(invalid()),
        };
        let hours: i32 = hours.parse().map_err(|_| invalid())?;
        let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
        if minutes >= 60 {
            return Err(invalid());
        }

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(DisplayZone::Fixed)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for DisplayZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayZone::Named(tz) => write!(f, "{}", tz.name()),
            DisplayZone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

/// Render epoch nanoseconds as `YYYY-MM-DDThh:mm:ss.ss±hhmm` in `zone`.
///
/// Fractional seconds are truncated to hundredths, not rounded.
pub fn format_timestamp(timestamp_nanos: i64, zone: DisplayZone) -> String {
    let secs = timestamp_nanos.div_euclid(NANOS_PER_SEC);
    let nanos = timestamp_nanos.rem_euclid(NANOS_PER_SEC) as u32;
    let utc = DateTime::from_timestamp(secs, nanos).unwrap_or_default();

    match zone {
        DisplayZone::Named(tz) => render(&utc.with_timezone(&tz)),
        DisplayZone::Fixed(offset) => render(&utc.with_timezone(&offset)),
    }
}

fn render<Z>(datetime: &DateTime<Z>) -> String
where
    Z: TimeZone,
    Z::Offset: fmt::Display,
{
    format!(
        "{}.{:02}{}",
        datetime.format(LOG_TIMESTAMP_FORMAT),
        datetime.nanosecond() / 10_000_000,
        datetime.format("%z")
    )
}

/// Format one log record as a display line:
/// `<time> [<source type>/<source instance>] <OUT|ERR> <message>`
pub fn format_record(record: &LogRecord, zone: DisplayZone) -> String {
    format!(
        "{} [{}/{}] {} {}",
        format_timestamp(record.timestamp_nanos, zone),
        record.source_type,
        record.source_instance,
        record.kind,
        record.message_text()
    )
}
