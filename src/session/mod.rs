//! Per-conversation state accumulators.
//!
//! Each persona that collects structured data owns one accumulator. Fields
//! arrive one at a time from the conversation runtime (usually an LLM tool
//! call), the accumulator reports whether the required fields are present,
//! and once the caller confirms it produces an immutable record for the
//! [`RecordStore`](crate::store::RecordStore).

pub mod lead;
pub mod order;
pub mod wellness;

pub use lead::{LeadField, LeadRecord, LeadState};
pub use order::{DrinkSize, OrderField, OrderRecord, OrderState};
pub use wellness::{EnergyLevel, WellnessEntry, WellnessField, WellnessState};

/// Result of applying a single field update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The value was stored
    Applied,
    /// The update was dropped; the reason is suitable for handing back to the LLM
    Ignored(String),
}

impl UpdateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, UpdateOutcome::Applied)
    }
}

/// Common surface of the order, wellness and lead accumulators
pub trait SessionState {
    type Record;

    /// Set a scalar field or append to a list field
    fn update(&mut self, field: &str, value: &str) -> UpdateOutcome;

    /// True once every required field has been supplied
    fn is_complete(&self) -> bool;

    /// Human-readable names of the required fields still missing
    fn missing_fields(&self) -> Vec<&'static str>;

    /// One-line recap of what has been collected so far
    fn summary(&self) -> String;

    /// Snapshot the current state, stamped with the current time.
    ///
    /// Not blocked on [`is_complete`](SessionState::is_complete); the
    /// conversation decides when a snapshot is worth persisting.
    fn to_record(&self) -> Self::Record;
}

/// Split a comma-separated list, dropping blanks
pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trimmed value, or `None` when there is nothing left
pub(crate) fn clean_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Deserializers that accept records written by other tools.
///
/// Timestamps may lack a UTC offset (local time is assumed) and keyword
/// fields may use any case; a keyword we do not recognise reads as `None`.
pub(crate) mod lenient {
    use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
    use serde::{de, Deserialize, Deserializer};
    use std::str::FromStr;

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
        let raw = raw.trim();
        if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
            return Some(timestamp.with_timezone(&Local));
        }

        let naive = NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())?;
        Some(
            Local
                .from_local_datetime(&naive)
                .earliest()
                .unwrap_or_else(|| Local.from_utc_datetime(&naive)),
        )
    }

    pub fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Local>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw)
            .ok_or_else(|| de::Error::custom(format!("unrecognised timestamp '{}'", raw)))
    }

    pub fn keyword<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.and_then(|value| match T::from_str(value.trim()) {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                log::debug!("Ignoring unrecognised value '{}'", value);
                None
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(" vanilla syrup, ,extra shot "),
            vec!["vanilla syrup".to_string(), "extra shot".to_string()]
        );
        assert!(split_list(" , ").is_empty());
    }

    #[test]
    fn test_clean_value() {
        assert_eq!(clean_value("  Alex "), Some("Alex".to_string()));
        assert_eq!(clean_value("   "), None);
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let naive = lenient::parse_timestamp("2025-11-24T09:15:30.123456").unwrap();
        assert_eq!((naive.year(), naive.month(), naive.day()), (2025, 11, 24));
        assert_eq!((naive.hour(), naive.minute(), naive.second()), (9, 15, 30));

        assert!(lenient::parse_timestamp("2025-11-24T09:15:30").is_some());
        assert!(lenient::parse_timestamp("2025-11-24T09:15:30.5+02:00").is_some());
        assert!(lenient::parse_timestamp("yesterday").is_none());
    }
}
