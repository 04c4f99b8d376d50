//! Input boundary and VEVENT block extraction.
//!
//! [`IcsSource`] is the only way text enters the pipeline: constructing one
//! performs the `BEGIN:VCALENDAR` signature check, so every later stage can
//! assume it is looking at calendar text.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, ScheduleError};

/// Signature every accepted document must contain.
pub const ICS_SIGNATURE: &str = "BEGIN:VCALENDAR";

// Non-greedy across newlines; nested VEVENTs are not supported.
static RE_VEVENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)BEGIN:VEVENT(.*?)END:VEVENT").expect("valid VEVENT block regex")
});

/// Calendar text that passed the signature check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcsSource {
    text: String,
}

impl IcsSource {
    /// Validate `text` as ICS.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidSource`] if the text does not contain
    /// [`ICS_SIGNATURE`].
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if !is_ics_format(&text) {
            return Err(ScheduleError::InvalidSource);
        }
        Ok(Self { text })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Bodies of every `BEGIN:VEVENT` ... `END:VEVENT` block, in document order.
    pub fn blocks(&self) -> Vec<&str> {
        extract_blocks(&self.text)
    }
}

/// Whether `text` carries the iCalendar signature.
pub fn is_ics_format(text: &str) -> bool {
    text.contains(ICS_SIGNATURE)
}

/// Return the text strictly between each `BEGIN:VEVENT` marker and the next
/// `END:VEVENT` marker.
///
/// Finding no markers is not an error; the result is simply empty.
pub fn extract_blocks(text: &str) -> Vec<&str> {
    let blocks: Vec<&str> = RE_VEVENT
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();
    tracing::debug!(blocks = blocks.len(), "extracted VEVENT blocks");
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_requires_signature() {
        assert_eq!(
            IcsSource::new("BEGIN:VEVENT\nEND:VEVENT").unwrap_err(),
            ScheduleError::InvalidSource
        );
        assert!(IcsSource::new("BEGIN:VCALENDAR\nEND:VCALENDAR").is_ok());
    }

    #[test]
    fn test_signature_may_appear_anywhere() {
        assert!(is_ics_format("garbage\r\nBEGIN:VCALENDAR\r\n"));
        assert!(!is_ics_format("begin:vcalendar"));
    }

    #[test]
    fn test_extract_single_block() {
        let blocks = extract_blocks("BEGIN:VEVENT\nSUMMARY:x\nEND:VEVENT");
        assert_eq!(blocks, vec!["\nSUMMARY:x\n"]);
    }

    #[test]
    fn test_extract_is_non_greedy() {
        let text = "BEGIN:VEVENT\nA:1\nEND:VEVENT\nBEGIN:VEVENT\nB:2\nEND:VEVENT";
        let blocks = extract_blocks(text);
        assert_eq!(blocks, vec!["\nA:1\n", "\nB:2\n"]);
    }

    #[test]
    fn test_extract_no_markers_is_empty() {
        assert!(extract_blocks("BEGIN:VCALENDAR\nEND:VCALENDAR").is_empty());
    }

    #[test]
    fn test_unterminated_block_is_ignored() {
        let text = "BEGIN:VEVENT\nA:1\nEND:VEVENT\nBEGIN:VEVENT\nB:2\n";
        assert_eq!(extract_blocks(text).len(), 1);
    }

    #[test]
    fn test_source_blocks_preserve_crlf() {
        let src = IcsSource::new("BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nA:1\r\nEND:VEVENT\r\n").unwrap();
        assert_eq!(src.blocks(), vec!["\r\nA:1\r\n"]);
    }
}
