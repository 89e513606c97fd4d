use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

/// Point in time as stored by the document store.
///
/// Missing fields deserialize to zero, which [`format_timestamp`] treats as no timestamp.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanoseconds: i64,
}

impl Timestamp {
    const NANOS_PER_SECOND: i64 = 1_000_000_000;

    pub fn new(seconds: i64, nanoseconds: i64) -> Self {
        Self {
            seconds,
            nanoseconds,
        }
    }

    /// Milliseconds since the Unix epoch, or `None` for an unset or malformed timestamp.
    pub fn to_millis(&self) -> Option<i64> {
        if self.seconds == 0 || !(0..Self::NANOS_PER_SECOND).contains(&self.nanoseconds) {
            return None;
        }

        self.seconds
            .checked_mul(1000)?
            .checked_add(self.nanoseconds / 1_000_000)
    }
}

/// One historical sample.
///
/// Documents missing a value still make a row, the cell is just left empty.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct MeasurementRecord {
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

impl MeasurementRecord {
    pub fn new(humidity: f64, temperature: f64, timestamp: Option<Timestamp>) -> Self {
        Self {
            humidity: Some(humidity),
            temperature: Some(temperature),
            timestamp,
        }
    }

    pub fn humidity_text(&self) -> String {
        self.humidity
            .map(|value| crate::Quantity::Humidity.format(value))
            .unwrap_or_default()
    }

    pub fn temperature_text(&self) -> String {
        self.temperature
            .map(|value| crate::Quantity::Temperature.format(value))
            .unwrap_or_default()
    }

    pub fn time_text(&self) -> String {
        format_timestamp(self.timestamp.as_ref())
    }
}

/// Formats `timestamp` in the local time zone, or returns an empty string if it is missing or malformed.
pub fn format_timestamp(timestamp: Option<&Timestamp>) -> String {
    format_timestamp_in(timestamp, &Local)
}

/// Same as [`format_timestamp`], in the time zone `tz`.
pub fn format_timestamp_in<Tz>(timestamp: Option<&Timestamp>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    timestamp
        .and_then(Timestamp::to_millis)
        .and_then(DateTime::from_timestamp_millis)
        .map(|utc| {
            utc.with_timezone(tz)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_default()
}
