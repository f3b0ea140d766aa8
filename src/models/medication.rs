use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Frequency, MedicationStatus};

/// Time of day a dose is scheduled for. Serialized as `"HH:MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DoseTime {
    hour: u8,
    minute: u8,
}

impl DoseTime {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        u32::from(self.hour) * 60 + u32::from(self.minute)
    }

    pub fn to_naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or_default()
    }

    /// Combine with a calendar day into a wall-clock timestamp.
    pub fn on(&self, day: NaiveDate) -> NaiveDateTime {
        day.and_time(self.to_naive_time())
    }

    /// Format as a 12-hour clock label, e.g. `9:00 AM`, `12:30 PM`.
    pub fn to_12_hour(&self) -> String {
        let period = if self.hour >= 12 { "PM" } else { "AM" };
        let hour12 = match self.hour % 12 {
            0 => 12,
            h => h,
        };
        format!("{hour12}:{:02} {period}", self.minute)
    }
}

impl fmt::Display for DoseTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for DoseTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, m) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("Invalid dose time: {s}"))?;
        let hour: u8 = h.parse().map_err(|_| format!("Invalid dose hour: {s}"))?;
        let minute: u8 = m.parse().map_err(|_| format!("Invalid dose minute: {s}"))?;
        Self::new(hour, minute).ok_or_else(|| format!("Dose time out of range: {s}"))
    }
}

impl TryFrom<String> for DoseTime {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DoseTime> for String {
    fn from(value: DoseTime) -> Self {
        value.to_string()
    }
}

impl Frequency {
    /// Reminder times used when the user leaves the timing preference empty.
    pub fn default_dose_times(&self) -> Vec<DoseTime> {
        let hours: &[u8] = match self {
            Self::Once => &[9],
            Self::Twice => &[9, 21],
            Self::Thrice => &[9, 14, 21],
            Self::Custom => &[],
        };
        hours.iter().filter_map(|h| DoseTime::new(*h, 0)).collect()
    }
}

/// A prescribed treatment definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub dosage: String,
    pub instructions: Option<String>,
    pub prescribed_by: Option<String>,
    pub frequency: Frequency,
    pub dose_times: Vec<DoseTime>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub remaining_quantity: u32,
    pub refill_threshold: u32,
    pub status: MedicationStatus,
    pub renewal_requested_at: Option<NaiveDateTime>,
}

impl Medication {
    pub fn is_active(&self) -> bool {
        self.status == MedicationStatus::Active
    }

    /// Check the structural invariants: dose-time count matches the
    /// frequency, and the date range is not inverted.
    pub fn validate(&self) -> Result<(), String> {
        match self.frequency.cardinality() {
            Some(expected) if self.dose_times.len() != expected => {
                return Err(format!(
                    "frequency '{}' expects {expected} dose time(s), got {}",
                    self.frequency,
                    self.dose_times.len()
                ));
            }
            None if self.dose_times.is_empty() => {
                return Err("custom frequency requires at least one dose time".into());
            }
            _ => {}
        }

        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = self.dose_times.iter().find(|t| !seen.insert(**t)) {
            return Err(format!("dose time {dup} listed more than once"));
        }

        if let Some(end) = self.end_date {
            if self.start_date > end {
                return Err(format!(
                    "start date {} is after end date {end}",
                    self.start_date
                ));
            }
        }

        Ok(())
    }

    /// True when `day` falls inside `[start_date, end_date]`.
    pub fn is_scheduled_on(&self, day: NaiveDate) -> bool {
        day >= self.start_date && self.end_date.map_or(true, |end| day <= end)
    }
}
