use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ScheduleWarning;
use crate::models::enums::DoseEventStatus;
use crate::models::{DoseEvent, DoseKey, DoseTime, Medication};

// ═══════════════════════════════════════════
// Dose status
// ═══════════════════════════════════════════

/// Resolved status of one dose instance.
///
/// `Upcoming` and `Due` are transient and recomputed on every call.
/// The other three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoseStatus {
    Upcoming,
    Due,
    Taken,
    Skipped,
    Missed,
}

impl DoseStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Taken | Self::Skipped | Self::Missed)
    }
}

impl From<DoseEventStatus> for DoseStatus {
    fn from(status: DoseEventStatus) -> Self {
        match status {
            DoseEventStatus::Taken => Self::Taken,
            DoseEventStatus::Skipped => Self::Skipped,
            DoseEventStatus::Missed => Self::Missed,
        }
    }
}

// ═══════════════════════════════════════════
// Dose instances
// ═══════════════════════════════════════════

/// Display fields copied from the medication when the instance is generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationSnapshot {
    pub name: String,
    pub dosage: String,
    pub instructions: Option<String>,
}

impl From<&Medication> for MedicationSnapshot {
    fn from(med: &Medication) -> Self {
        Self {
            name: med.name.clone(),
            dosage: med.dosage.clone(),
            instructions: med.instructions.clone(),
        }
    }
}

/// One concrete occurrence of a medication's dose on a calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoseInstance {
    pub medication_id: Uuid,
    pub calendar_day: NaiveDate,
    pub dose_time: DoseTime,
    pub scheduled_at: NaiveDateTime,
    pub status: DoseStatus,
    pub medication: MedicationSnapshot,
}

impl DoseInstance {
    /// Unresolved skeleton as emitted by the generator.
    pub fn scheduled(
        medication_id: Uuid,
        calendar_day: NaiveDate,
        dose_time: DoseTime,
        medication: MedicationSnapshot,
    ) -> Self {
        Self {
            medication_id,
            calendar_day,
            dose_time,
            scheduled_at: dose_time.on(calendar_day),
            status: DoseStatus::Upcoming,
            medication,
        }
    }

    pub fn key(&self) -> DoseKey {
        DoseKey {
            medication_id: self.medication_id,
            calendar_day: self.calendar_day,
            dose_time: self.dose_time,
        }
    }

    /// The event a caller persists for an instance reported in
    /// `Resolution::newly_missed`.
    pub fn missed_event(&self, user_id: &str, now: NaiveDateTime) -> DoseEvent {
        DoseEvent {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            medication_id: self.medication_id,
            dose_time: self.dose_time,
            scheduled_date: Some(self.calendar_day),
            timestamp: now,
            status: DoseEventStatus::Missed,
            notes: None,
        }
    }
}

/// Generator output: ordered skeletons plus skipped-medication warnings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeneratedSchedule {
    pub instances: Vec<DoseInstance>,
    pub warnings: Vec<ScheduleWarning>,
}

/// Resolver output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Resolution {
    pub resolved: Vec<DoseInstance>,
    /// Inferred misses with no event yet. Persist each exactly once.
    pub newly_missed: Vec<DoseInstance>,
    pub warnings: Vec<ScheduleWarning>,
}

// ═══════════════════════════════════════════
// Adherence
// ═══════════════════════════════════════════

/// Adherence rate reported for a period with no terminal doses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyPeriodPolicy {
    /// Nothing to fail: 100%.
    #[default]
    Perfect,
    Zero,
}

impl EmptyPeriodPolicy {
    pub fn rate(&self) -> u32 {
        match self {
            Self::Perfect => 100,
            Self::Zero => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdherenceSummary {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    /// Terminal doses only: taken + skipped + missed.
    pub total_doses: u32,
    pub taken_count: u32,
    pub skipped_count: u32,
    pub missed_count: u32,
    /// Upcoming or due doses, excluded from the rate.
    pub pending_count: u32,
    /// Rounded percentage.
    pub adherence_rate: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!DoseStatus::Upcoming.is_terminal());
        assert!(!DoseStatus::Due.is_terminal());
        assert!(DoseStatus::Taken.is_terminal());
        assert!(DoseStatus::Skipped.is_terminal());
        assert!(DoseStatus::Missed.is_terminal());
    }

    #[test]
    fn scheduled_instance_combines_day_and_time() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let instance = DoseInstance::scheduled(
            Uuid::new_v4(),
            day,
            DoseTime::new(20, 0).unwrap(),
            MedicationSnapshot {
                name: "Lisinopril".into(),
                dosage: "10mg".into(),
                instructions: None,
            },
        );
        assert_eq!(instance.scheduled_at, day.and_hms_opt(20, 0, 0).unwrap());
        assert_eq!(instance.key().calendar_day, day);
    }

    #[test]
    fn missed_event_targets_instance_key() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let instance = DoseInstance::scheduled(
            Uuid::new_v4(),
            day,
            DoseTime::new(8, 0).unwrap(),
            MedicationSnapshot {
                name: "Lisinopril".into(),
                dosage: "10mg".into(),
                instructions: None,
            },
        );
        let now = day.and_hms_opt(8, 45, 0).unwrap();
        let event = instance.missed_event("user-1", now);
        assert_eq!(event.key(), instance.key());
        assert_eq!(event.status, DoseEventStatus::Missed);
        assert_eq!(event.timestamp, now);
    }

    #[test]
    fn empty_period_policy_rates() {
        assert_eq!(EmptyPeriodPolicy::default(), EmptyPeriodPolicy::Perfect);
        assert_eq!(EmptyPeriodPolicy::Perfect.rate(), 100);
        assert_eq!(EmptyPeriodPolicy::Zero.rate(), 0);
    }
}
