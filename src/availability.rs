//! Weekly availability: a sparse day → time range map. A day that is present
//! is available; a missing day is not.

use crate::payload::FieldValue;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayName {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayName {
    pub const ALL: [DayName; 7] = [
        DayName::Monday,
        DayName::Tuesday,
        DayName::Wednesday,
        DayName::Thursday,
        DayName::Friday,
        DayName::Saturday,
        DayName::Sunday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DayName::Monday => "monday",
            DayName::Tuesday => "tuesday",
            DayName::Wednesday => "wednesday",
            DayName::Thursday => "thursday",
            DayName::Friday => "friday",
            DayName::Saturday => "saturday",
            DayName::Sunday => "sunday",
        }
    }

    pub fn parse(value: &str) -> Option<DayName> {
        DayName::ALL
            .into_iter()
            .find(|day| day.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start_time: String,
    pub end_time: String,
}

impl TimeRange {
    pub fn new(start_time: impl Into<String>, end_time: impl Into<String>) -> Self {
        Self {
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }
}

/// Accepts the 12-hour labels the time pickers emit ("9:00 AM") as well as
/// 24-hour "18:00".
pub fn parse_clock_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    ["%I:%M %p", "%I:%M%p", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvailabilityMap {
    days: BTreeMap<DayName, TimeRange>,
}

impl AvailabilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_day(mut self, day: DayName, range: TimeRange) -> Self {
        self.days.insert(day, range);
        self
    }

    pub fn is_available(&self, day: DayName) -> bool {
        self.days.contains_key(&day)
    }

    pub fn get(&self, day: DayName) -> Option<&TimeRange> {
        self.days.get(&day)
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Reads the nested map shape used inside step payloads. Errors are
    /// addressed relative to `base_path`.
    pub fn from_field_value(
        value: &FieldValue,
        base_path: &str,
    ) -> Result<Self, BTreeMap<String, String>> {
        let mut errors = BTreeMap::new();
        let Some(map) = value.as_map() else {
            errors.insert(base_path.to_string(), "Invalid availability".to_string());
            return Err(errors);
        };

        let mut days = BTreeMap::new();
        for (key, entry) in map {
            let path = format!("{base_path}.{key}");
            let Some(day) = DayName::parse(key) else {
                errors.insert(path, format!("Unknown day: {key}"));
                continue;
            };
            let start = entry.as_map().and_then(|m| m.get("startTime")).and_then(FieldValue::as_str);
            let end = entry.as_map().and_then(|m| m.get("endTime")).and_then(FieldValue::as_str);
            match (start, end) {
                (Some(start), Some(end)) => {
                    days.insert(day, TimeRange::new(start, end));
                }
                (None, _) => {
                    errors.insert(format!("{path}.startTime"), "Start time is required".to_string());
                }
                (_, None) => {
                    errors.insert(format!("{path}.endTime"), "End time is required".to_string());
                }
            }
        }

        if errors.is_empty() {
            Ok(Self { days })
        } else {
            Err(errors)
        }
    }

    /// Every present day must carry parseable times with the end strictly
    /// after the start.
    pub fn validate(&self, base_path: &str) -> BTreeMap<String, String> {
        let mut errors = BTreeMap::new();
        for (day, range) in &self.days {
            let path = format!("{base_path}.{}", day.as_str());
            let start = parse_clock_time(&range.start_time);
            let end = parse_clock_time(&range.end_time);
            match (start, end) {
                (None, _) => {
                    errors.insert(format!("{path}.startTime"), "Invalid start time".to_string());
                }
                (_, None) => {
                    errors.insert(format!("{path}.endTime"), "Invalid end time".to_string());
                }
                (Some(start), Some(end)) if end <= start => {
                    errors.insert(
                        format!("{path}.endTime"),
                        "End time must be after start time".to_string(),
                    );
                }
                _ => {}
            }
        }
        errors
    }
}
