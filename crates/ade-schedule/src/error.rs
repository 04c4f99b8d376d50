//! Error types for schedule extraction.
//!
//! Every variant aborts the current pipeline invocation. Messages are full
//! sentences so callers can surface them verbatim.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("The content is not in ICS format.")]
    InvalidSource,

    #[error("No {0} to parse.")]
    MissingInput(&'static str),

    #[error("Unable to parse the class automatically, is the format valid?")]
    ClassInference,

    #[error("The start date (from) must be before or equal to the end date (to). Got from={from}, to={to}.")]
    InvalidPeriod {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },

    #[error("No parsed events to merge.")]
    NoEventsToReconcile,

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
