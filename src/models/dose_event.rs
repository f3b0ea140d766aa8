use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::DoseEventStatus;
use super::medication::DoseTime;

/// A recorded user action (or synthesized miss) on one scheduled dose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseEvent {
    pub id: Uuid,
    pub user_id: String,
    pub medication_id: Uuid,
    pub dose_time: DoseTime,
    /// Day the dose was scheduled for. Older records only carry the
    /// action timestamp, in which case its date is used.
    pub scheduled_date: Option<NaiveDate>,
    pub timestamp: NaiveDateTime,
    pub status: DoseEventStatus,
    pub notes: Option<String>,
}

/// Identity of one scheduled dose: at most one authoritative event per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DoseKey {
    pub medication_id: Uuid,
    pub calendar_day: NaiveDate,
    pub dose_time: DoseTime,
}

impl DoseEvent {
    pub fn calendar_day(&self) -> NaiveDate {
        self.scheduled_date.unwrap_or_else(|| self.timestamp.date())
    }

    pub fn key(&self) -> DoseKey {
        DoseKey {
            medication_id: self.medication_id,
            calendar_day: self.calendar_day(),
            dose_time: self.dose_time,
        }
    }
}
