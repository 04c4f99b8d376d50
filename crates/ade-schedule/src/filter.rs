//! Caller-supplied filter criteria and the period validator.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};

/// Criteria applied while deriving parsed events.
///
/// Every field is optional. An unset `class` is inferred from the first
/// event's description. `timezone` is only used to read floating
/// DTSTART/DTEND values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub class: Option<String>,
    pub group: Option<String>,
    pub location: Option<String>,
    pub timezone: Tz,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            class: None,
            group: None,
            location: None,
            timezone: Tz::UTC,
        }
    }
}

impl FilterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_from(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_to(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    /// Set both bounds. Ordering is checked when the period is used, see [`FilterConfig::period`].
    pub fn with_period(self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.with_from(from).with_to(to)
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// The active date window, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidPeriod`] when both bounds are set and
    /// `from > to`.
    pub fn period(&self) -> Result<Option<Period>> {
        match (self.from, self.to) {
            (Some(from), Some(to)) => Period::new(from, to).map(Some),
            _ => Ok(None),
        }
    }
}

/// An inclusive `[from, to]` window with `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl Period {
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidPeriod`] if `from > to`.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self> {
        if from > to {
            return Err(ScheduleError::InvalidPeriod { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn from(&self) -> DateTime<Utc> {
        self.from
    }

    pub fn to(&self) -> DateTime<Utc> {
        self.to
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant <= self.to
    }
}
