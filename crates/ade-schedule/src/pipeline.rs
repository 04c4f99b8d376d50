//! The lazy extraction pipeline and the reconciler.
//!
//! A [`Pipeline`] owns one validated source and caches what it computes:
//!
//! ```text
//! source ──blocks──▶ raw events ──derive(config)──▶ parsed events ──▶ merged
//!          (cached once)          (recomputed per call, cached)      (never cached)
//! ```
//!
//! Raw events depend only on the source and are built once. Parsed events
//! depend on the current [`FilterConfig`]; [`Pipeline::parsed_events`]
//! always re-derives from the cached raw events. [`Pipeline::merged_events`]
//! reuses cached parsed events when present and derives them otherwise.

use serde::Serialize;

use crate::derive::{derive_events, ParsedEvent};
use crate::error::{Result, ScheduleError};
use crate::filter::FilterConfig;
use crate::property::{parse_blocks, RawEvent};
use crate::source::IcsSource;

/// A parsed event together with the raw event it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedEvent {
    pub raw: RawEvent,
    pub parsed: ParsedEvent,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    source: IcsSource,
    config: FilterConfig,
    raw: Option<Vec<RawEvent>>,
    parsed: Option<Vec<ParsedEvent>>,
    inferred_class: Option<String>,
}

impl Pipeline {
    pub fn new(source: IcsSource) -> Self {
        Self::with_config(source, FilterConfig::default())
    }

    pub fn with_config(source: IcsSource, config: FilterConfig) -> Self {
        Self {
            source,
            config,
            raw: None,
            parsed: None,
            inferred_class: None,
        }
    }

    /// Validate `text` and build a pipeline over it.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidSource`] if `text` lacks the
    /// `BEGIN:VCALENDAR` signature.
    pub fn from_source(text: impl Into<String>) -> Result<Self> {
        IcsSource::new(text).map(Self::new)
    }

    pub fn source(&self) -> &IcsSource {
        &self.source
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Replace the filter configuration. Cached raw events are kept.
    pub fn configure(&mut self, config: FilterConfig) {
        self.config = config;
    }

    /// The class used for group matching: configured, or inferred by an
    /// earlier derivation.
    pub fn class(&self) -> Option<&str> {
        self.config
            .class
            .as_deref()
            .or(self.inferred_class.as_deref())
    }

    /// Raw events, one per VEVENT block. Built on first request.
    ///
    /// A source with no VEVENT blocks yields an empty slice, not an error.
    pub fn raw_events(&mut self) -> &[RawEvent] {
        let source = &self.source;
        self.raw.get_or_insert_with(|| {
            let raw = parse_blocks(source.blocks());
            tracing::debug!(raw = raw.len(), "parsed raw events");
            raw
        })
    }

    /// Derive parsed events from the raw events under the current config.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::InvalidPeriod`], [`ScheduleError::MissingInput`] when
    /// the source has no events, [`ScheduleError::ClassInference`], or
    /// [`ScheduleError::InvalidTimestamp`]. On error the previous cached
    /// parsed events are discarded.
    pub fn parsed_events(&mut self) -> Result<&[ParsedEvent]> {
        self.parsed = None;
        self.raw_events();
        let raw = self.raw.as_deref().unwrap_or_default();
        let parsed = derive_events(raw, &self.config, &mut self.inferred_class)?;
        Ok(self.parsed.insert(parsed).as_slice())
    }

    /// Pair every surviving parsed event with its raw event, in order.
    ///
    /// # Errors
    ///
    /// Anything [`Pipeline::parsed_events`] returns, or
    /// [`ScheduleError::NoEventsToReconcile`] when every event was filtered out.
    pub fn merged_events(&mut self) -> Result<Vec<MergedEvent>> {
        if self.parsed.as_ref().is_none_or(Vec::is_empty) {
            self.parsed_events()?;
        }
        let raw = self.raw.as_deref().unwrap_or_default();
        let parsed = self.parsed.as_deref().unwrap_or_default();
        reconcile(raw, parsed)
    }
}

/// Pair each parsed event with `raw[parsed.index]`.
///
/// # Errors
///
/// Returns [`ScheduleError::NoEventsToReconcile`] if `parsed` is empty, or
/// [`ScheduleError::MissingInput`] if a parsed event points past `raw`.
pub fn reconcile(raw: &[RawEvent], parsed: &[ParsedEvent]) -> Result<Vec<MergedEvent>> {
    if parsed.is_empty() {
        return Err(ScheduleError::NoEventsToReconcile);
    }
    parsed
        .iter()
        .map(|event| {
            let source = raw
                .get(event.index)
                .ok_or(ScheduleError::MissingInput("raw events"))?;
            Ok(MergedEvent {
                raw: source.clone(),
                parsed: event.clone(),
            })
        })
        .collect()
}
