//! Semantic derivation: raw VEVENT properties → schedule attributes.
//!
//! The ADE generator encodes schedule data in free text:
//!
//! - `DESCRIPTION` holds one `<class> - TP <letter>` line per lab group
//!   attending, plus the trainer's name on another line.
//! - `SUMMARY` starts with a course code (`R1.01`, `SAÉ 2.03`, `SAÉ 2.03.B`)
//!   followed by the title, or reads `Autonomie <code> - ...` for
//!   self-study slots.
//! - `LOCATION` is a comma-separated list of rooms.
//!
//! Filters from [`FilterConfig`] are applied in the same pass. An event
//! failing any of them produces no [`ParsedEvent`], but the survivors keep
//! the index of the raw event they came from.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::filter::{FilterConfig, Period};
use crate::property::{RawEvent, DESCRIPTION, DTEND, DTSTART, LOCATION, SUMMARY};
use crate::timestamp::parse_ics_timestamp;

static RE_COURSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(R\d+\.\d+|SAÉ \d+\.\d+(?:\.[A-Z])?)\s+(.*)$").expect("valid course regex")
});
static RE_TITLE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\([A-Z]+\)|\s* - [A-Z].*").expect("valid title suffix regex")
});
static RE_AUTONOMY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Autonomie (.*?) -").expect("valid autonomy regex"));

const GROUP_MARKER: &str = " - TP ";
const AUTONOMY_TITLE: &str = "Autonomie";

// ── Types ───────────────────────────────────────────────────────────────────

/// Session type implied by how many lab groups attend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupFormat {
    /// Practical work: one group.
    #[serde(rename = "TP")]
    Tp,
    /// Tutorial: two groups.
    #[serde(rename = "TD")]
    Td,
    /// Lecture: more than two groups.
    #[serde(rename = "CM")]
    Cm,
}

impl GroupFormat {
    /// `None` when no group attends.
    pub fn from_group_count(count: usize) -> Option<Self> {
        match count {
            0 => None,
            1 => Some(Self::Tp),
            2 => Some(Self::Td),
            _ => Some(Self::Cm),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tp => "TP",
            Self::Td => "TD",
            Self::Cm => "CM",
        }
    }
}

impl fmt::Display for GroupFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schedule attributes derived from one raw event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedEvent {
    /// Position of the originating raw event.
    pub index: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_format: Option<GroupFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trainer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub location: Vec<String>,
}

// ── Derivation ──────────────────────────────────────────────────────────────

/// Derive parsed events from `raw`, dropping those that fail a filter.
///
/// `class` memoises the inferred class across calls: when the config has
/// no class and `class` is `None`, the first raw event's description is
/// used and the result stored back. A configured class always wins.
///
/// # Errors
///
/// Checked in this order, before any event is derived:
///
/// - [`ScheduleError::InvalidPeriod`] if `from > to`.
/// - [`ScheduleError::MissingInput`] if `raw` is empty.
/// - [`ScheduleError::ClassInference`] if the class must be inferred and the
///   first description is missing or blank.
///
/// During derivation, [`ScheduleError::InvalidTimestamp`] aborts the whole
/// call if a DTSTART/DTEND value is malformed.
pub fn derive_events(
    raw: &[RawEvent],
    config: &FilterConfig,
    class: &mut Option<String>,
) -> Result<Vec<ParsedEvent>> {
    let period = config.period()?;

    let Some(first) = raw.first() else {
        return Err(ScheduleError::MissingInput("raw events"));
    };

    if config.class.is_none() && class.is_none() {
        let inferred = infer_class(first)?;
        tracing::debug!(class = %inferred, "inferred class from first event");
        *class = Some(inferred);
    }
    let class = config
        .class
        .as_deref()
        .or(class.as_deref())
        .ok_or(ScheduleError::ClassInference)?;

    let deriver = Deriver {
        class,
        config,
        period,
    };

    let mut events = Vec::with_capacity(raw.len());
    for (index, event) in raw.iter().enumerate() {
        match deriver.derive(index, event)? {
            Outcome::Kept(parsed) => events.push(parsed),
            Outcome::Dropped(reason) => {
                tracing::trace!(index, reason = reason.as_str(), "dropped event");
            }
        }
    }

    tracing::debug!(
        raw = raw.len(),
        parsed = events.len(),
        "derived parsed events"
    );
    Ok(events)
}

/// First whitespace-delimited token of the event's description.
///
/// # Errors
///
/// Returns [`ScheduleError::ClassInference`] if the description is absent
/// or contains no token.
pub fn infer_class(event: &RawEvent) -> Result<String> {
    event
        .get(DESCRIPTION)
        .and_then(|description| description.split_whitespace().next())
        .map(str::to_string)
        .ok_or(ScheduleError::ClassInference)
}

/// Trailing letter of a `<class> - TP <A-Z>` line. The class is compared verbatim.
pub fn group_letter(line: &str, class: &str) -> Option<char> {
    let rest = line.strip_prefix(class)?.strip_prefix(GROUP_MARKER)?;
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) if letter.is_ascii_uppercase() => Some(letter),
        _ => None,
    }
}

/// Course code and title from a summary, if it follows a known pattern.
pub fn course_from_summary(summary: &str) -> Option<(String, String)> {
    if let Some(caps) = RE_COURSE.captures(summary) {
        let code = caps[1].to_string();
        let title = RE_TITLE_SUFFIX.replace_all(&caps[2], "").into_owned();
        return Some((code, title));
    }
    RE_AUTONOMY
        .captures(summary)
        .map(|caps| (caps[1].to_string(), AUTONOMY_TITLE.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DropReason {
    Group,
    Start,
    End,
    Location,
}

impl DropReason {
    fn as_str(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Start => "start outside period",
            Self::End => "end outside period",
            Self::Location => "location",
        }
    }
}

enum Outcome {
    Kept(ParsedEvent),
    Dropped(DropReason),
}

struct Deriver<'a> {
    class: &'a str,
    config: &'a FilterConfig,
    period: Option<Period>,
}

impl Deriver<'_> {
    fn derive(&self, index: usize, raw: &RawEvent) -> Result<Outcome> {
        let mut parsed = ParsedEvent {
            index,
            ..Default::default()
        };

        // Every non-group line overwrites the trainer; the last one wins.
        let mut trainer = None;
        for line in raw.get(DESCRIPTION).into_iter().flat_map(|d| d.split('\n')) {
            match group_letter(line, self.class) {
                Some(letter) => parsed.group.push(letter.to_string()),
                None => trainer = Some(line.to_string()),
            }
        }
        parsed.group_format = GroupFormat::from_group_count(parsed.group.len());

        if let Some(wanted) = &self.config.group {
            if !parsed.group.contains(wanted) {
                return Ok(Outcome::Dropped(DropReason::Group));
            }
        }

        parsed.trainer = trainer;

        if let Some((code, title)) = raw.get(SUMMARY).and_then(course_from_summary) {
            parsed.code = Some(code);
            parsed.title = Some(title);
        }

        if let Some(value) = raw.get(DTSTART) {
            let start = parse_ics_timestamp(value, self.config.timezone)?;
            parsed.start = Some(start);
            if self.outside_period(start) {
                return Ok(Outcome::Dropped(DropReason::Start));
            }
        }

        if let Some(value) = raw.get(DTEND) {
            let end = parse_ics_timestamp(value, self.config.timezone)?;
            parsed.end = Some(end);
            if self.outside_period(end) {
                return Ok(Outcome::Dropped(DropReason::End));
            }
        }

        if let Some(value) = raw.get(LOCATION) {
            parsed.location = value.split(',').map(str::to_string).collect();
            if let Some(wanted) = &self.config.location {
                if !parsed.location.contains(wanted) {
                    return Ok(Outcome::Dropped(DropReason::Location));
                }
            }
        }

        Ok(Outcome::Kept(parsed))
    }

    fn outside_period(&self, instant: DateTime<Utc>) -> bool {
        self.period.is_some_and(|period| !period.contains(instant))
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
