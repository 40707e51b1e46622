//! Validated field values carried by widget commands.

use crate::error::InputError;
use chrono::NaiveTime;
use std::fmt;

/// Trimmed, non-empty text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldText(String);

impl FieldText {
    pub fn parse(field: &'static str, raw: &str) -> Result<Self, InputError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(InputError::Empty { field });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Like [`FieldText::parse`] but treats blank input as "not provided".
    pub fn optional(field: &'static str, raw: &str) -> Option<Self> {
        Self::parse(field, raw).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for FieldText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Event start time in 24h `HH:MM` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventTime(NaiveTime);

impl EventTime {
    /// Blank input means an all-day event and yields `Ok(None)`.
    pub fn parse(raw: &str) -> Result<Option<Self>, InputError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        NaiveTime::parse_from_str(trimmed, "%H:%M")
            .map(|time| Some(Self(time)))
            .map_err(|_| InputError::InvalidTime(trimmed.to_string()))
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}
