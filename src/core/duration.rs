//! Durations and their two-column relational encoding.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Scheduling time unit.
///
/// Elapsed units count calendar time; the others count working time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
    Percent,
    ElapsedMinutes,
    ElapsedHours,
    ElapsedDays,
    ElapsedWeeks,
    ElapsedMonths,
    ElapsedYears,
    ElapsedPercent,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 14] = [
        TimeUnit::Minutes,
        TimeUnit::Hours,
        TimeUnit::Days,
        TimeUnit::Weeks,
        TimeUnit::Months,
        TimeUnit::Years,
        TimeUnit::Percent,
        TimeUnit::ElapsedMinutes,
        TimeUnit::ElapsedHours,
        TimeUnit::ElapsedDays,
        TimeUnit::ElapsedWeeks,
        TimeUnit::ElapsedMonths,
        TimeUnit::ElapsedYears,
        TimeUnit::ElapsedPercent,
    ];

    /// Canonical label stored in `duration_units`.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Minutes => "MINUTES",
            TimeUnit::Hours => "HOURS",
            TimeUnit::Days => "DAYS",
            TimeUnit::Weeks => "WEEKS",
            TimeUnit::Months => "MONTHS",
            TimeUnit::Years => "YEARS",
            TimeUnit::Percent => "PERCENT",
            TimeUnit::ElapsedMinutes => "ELAPSED_MINUTES",
            TimeUnit::ElapsedHours => "ELAPSED_HOURS",
            TimeUnit::ElapsedDays => "ELAPSED_DAYS",
            TimeUnit::ElapsedWeeks => "ELAPSED_WEEKS",
            TimeUnit::ElapsedMonths => "ELAPSED_MONTHS",
            TimeUnit::ElapsedYears => "ELAPSED_YEARS",
            TimeUnit::ElapsedPercent => "ELAPSED_PERCENT",
        }
    }

    /// Short suffix used when displaying a duration, e.g. `5d`.
    pub fn abbreviation(&self) -> &'static str {
        match self {
            TimeUnit::Minutes => "m",
            TimeUnit::Hours => "h",
            TimeUnit::Days => "d",
            TimeUnit::Weeks => "w",
            TimeUnit::Months => "mo",
            TimeUnit::Years => "y",
            TimeUnit::Percent => "%",
            TimeUnit::ElapsedMinutes => "em",
            TimeUnit::ElapsedHours => "eh",
            TimeUnit::ElapsedDays => "ed",
            TimeUnit::ElapsedWeeks => "ew",
            TimeUnit::ElapsedMonths => "emo",
            TimeUnit::ElapsedYears => "ey",
            TimeUnit::ElapsedPercent => "e%",
        }
    }

    /// Parse a unit label.
    ///
    /// Accepts the canonical label in any ASCII case or the exact
    /// abbreviation. Anything else is a [`Error::UnitParse`].
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        TimeUnit::ALL
            .into_iter()
            .find(|unit| {
                unit.as_str().eq_ignore_ascii_case(trimmed) || unit.abbreviation() == trimmed
            })
            .ok_or_else(|| Error::UnitParse(s.to_string()))
    }

    pub fn is_elapsed(&self) -> bool {
        self.as_str().starts_with("ELAPSED_")
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TimeUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TimeUnit::parse(s)
    }
}

/// A magnitude paired with a time unit, e.g. five days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Duration {
    magnitude: f64,
    unit: TimeUnit,
}

impl Duration {
    pub fn new(magnitude: f64, unit: TimeUnit) -> Self {
        Self { magnitude, unit }
    }

    pub fn days(magnitude: f64) -> Self {
        Self::new(magnitude, TimeUnit::Days)
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }
}

impl std::fmt::Display for Duration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.magnitude, self.unit.abbreviation())
    }
}

/// Converts between [`Duration`] and the `(duration_value, duration_units)`
/// column pair.
///
/// Both columns are NULL together or set together.
pub struct DurationCodec;

impl DurationCodec {
    /// Encode an optional duration into `(value, unit label)`.
    pub fn encode(duration: Option<&Duration>) -> (Option<f64>, Option<&'static str>) {
        match duration {
            Some(d) => (Some(d.magnitude), Some(d.unit.as_str())),
            None => (None, None),
        }
    }

    /// Decode a column pair back into an optional duration.
    ///
    /// A missing unit yields `None` whatever the value. A known unit with a
    /// missing value also yields `None`. An unknown unit fails even when the
    /// value is missing.
    pub fn decode(value: Option<f64>, unit: Option<&str>) -> Result<Option<Duration>> {
        let Some(label) = unit else {
            return Ok(None);
        };
        let unit = TimeUnit::parse(label)?;
        match value {
            Some(v) if !v.is_finite() => Err(Error::InvalidDuration(format!(
                "stored magnitude {v} is not finite"
            ))),
            Some(v) => Ok(Some(Duration::new(v, unit))),
            None => Ok(None),
        }
    }
}
