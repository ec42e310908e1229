//! Per-player clock duration.
//!
//! The wire format (spec §6) accepts either an `"HH:MM:SS"` string or a
//! float number of seconds on the way in, and always emits a float number
//! of seconds on the way out (matching `original_source`'s
//! `time_left.total_seconds()` call sites in the Centrifugo client).

use std::fmt;
use std::time::Duration;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClockDuration(Duration);

impl ClockDuration {
    pub const ZERO: ClockDuration = ClockDuration(Duration::ZERO);

    pub fn from_secs_f64(secs: f64) -> Self {
        Self(Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::ZERO))
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0.as_secs_f64()
    }

    pub fn as_std(&self) -> Duration {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn saturating_sub(self, other: Duration) -> Self {
        Self(self.0.saturating_sub(other))
    }

    fn parse_hms(s: &str) -> Option<Duration> {
        let mut parts = s.splitn(3, ':');
        let h: u64 = parts.next()?.parse().ok()?;
        let m: u64 = parts.next()?.parse().ok()?;
        let s: f64 = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Duration::from_secs_f64(
            (h * 3600 + m * 60) as f64 + s.max(0.0),
        ))
    }
}

impl fmt::Display for ClockDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.0.as_secs();
        write!(f, "{:02}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
    }
}

impl Serialize for ClockDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_secs_f64())
    }
}

struct ClockDurationVisitor;

impl<'de> Visitor<'de> for ClockDurationVisitor {
    type Value = ClockDuration;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a duration as \"HH:MM:SS\" or a number of seconds")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        if let Some(d) = ClockDuration::parse_hms(v) {
            return Ok(ClockDuration(d));
        }
        v.parse::<f64>()
            .map(ClockDuration::from_secs_f64)
            .map_err(|_| E::custom(format!("invalid duration: {v}")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(ClockDuration::from_secs_f64(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(ClockDuration::from_secs_f64(v as f64))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(ClockDuration::from_secs_f64(v as f64))
    }
}

impl<'de> Deserialize<'de> for ClockDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ClockDurationVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hms() {
        let d: ClockDuration = serde_json::from_str("\"00:01:00\"").unwrap();
        assert_eq!(d.as_secs_f64(), 60.0);
    }

    #[test]
    fn parses_float_seconds() {
        let d: ClockDuration = serde_json::from_str("90.5").unwrap();
        assert_eq!(d.as_secs_f64(), 90.5);
    }

    #[test]
    fn serializes_as_float_seconds() {
        let d = ClockDuration::from_secs_f64(60.0);
        assert_eq!(serde_json::to_string(&d).unwrap(), "60.0");
    }

    #[test]
    fn saturating_sub_does_not_go_negative() {
        let d = ClockDuration::from_secs_f64(5.0);
        let after = d.saturating_sub(Duration::from_secs(10));
        assert!(after.is_zero());
    }
}
