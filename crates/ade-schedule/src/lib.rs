//! # ade-schedule
//!
//! Class-schedule extraction from iCalendar feeds exported by the ADE
//! university timetabling tool.
//!
//! The generator packs schedule data into free-text properties: lab groups
//! and the trainer in `DESCRIPTION`, the course code in `SUMMARY`, rooms in
//! `LOCATION`. This crate unfolds the VEVENT blocks, derives those
//! attributes, filters by date window, class, group and room, and pairs
//! every surviving event with its raw properties.
//!
//! It is not a general RFC 5545 parser: no recurrence expansion, no
//! property parameters, no `VTIMEZONE` handling.
//!
//! ## Modules
//!
//! - [`source`]: `BEGIN:VCALENDAR` signature check and VEVENT block extraction
//! - [`property`]: block body → [`RawEvent`] (line unfolding, C-style un-escaping)
//! - [`timestamp`]: DTSTART/DTEND grammar
//! - [`filter`]: [`FilterConfig`] and the [`Period`] validator
//! - [`derive`]: [`RawEvent`] → [`ParsedEvent`] with filtering
//! - [`pipeline`]: lazy cached [`Pipeline`] and the reconciler
//! - [`error`]: Error types
//!
//! ## Example
//!
//! ```
//! use ade_schedule::{FilterConfig, Pipeline};
//!
//! let ics = "BEGIN:VCALENDAR\n\
//!            BEGIN:VEVENT\n\
//!            SUMMARY:R1.01 Intro (A) - B\n\
//!            DESCRIPTION:R1 - TP A\\nTrainer X\n\
//!            LOCATION:RoomA,RoomB\n\
//!            END:VEVENT\n\
//!            END:VCALENDAR\n";
//!
//! let mut pipeline = Pipeline::from_source(ics).unwrap();
//! pipeline.configure(FilterConfig::new().with_group("A"));
//!
//! let merged = pipeline.merged_events().unwrap();
//! assert_eq!(merged[0].parsed.code.as_deref(), Some("R1.01"));
//! assert_eq!(merged[0].parsed.trainer.as_deref(), Some("Trainer X"));
//! assert_eq!(merged[0].raw.get("LOCATION"), Some("RoomA,RoomB"));
//! ```

pub mod derive;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod property;
pub mod source;
pub mod timestamp;

pub use derive::{derive_events, GroupFormat, ParsedEvent};
pub use error::{Result, ScheduleError};
pub use filter::{FilterConfig, Period};
pub use pipeline::{reconcile, MergedEvent, Pipeline};
pub use property::{parse_block, parse_blocks, RawEvent};
pub use source::{extract_blocks, is_ics_format, IcsSource};
pub use timestamp::parse_ics_timestamp;
