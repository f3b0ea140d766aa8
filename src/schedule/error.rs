use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Structural errors: fatal to the call that raised them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// Data-quality problems recovered locally and returned next to an
/// otherwise complete result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleWarning {
    InvalidMedication { medication_id: Uuid, reason: String },
    MalformedEvent { event_id: Uuid, reason: String },
}

impl fmt::Display for ScheduleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMedication { medication_id, reason } => {
                write!(f, "Medication {medication_id} skipped: {reason}")
            }
            Self::MalformedEvent { event_id, reason } => {
                write!(f, "Dose event {event_id} ignored: {reason}")
            }
        }
    }
}

pub(crate) fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), ScheduleError> {
    if start > end {
        return Err(ScheduleError::InvalidRange { start, end });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_range_is_rejected() {
        let a = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let err = check_range(a, b).unwrap_err();
        assert_eq!(err, ScheduleError::InvalidRange { start: a, end: b });
        assert!(err.to_string().contains("2024-01-02"));
        assert!(check_range(b, b).is_ok());
    }

    #[test]
    fn warning_serializes_with_kind_tag() {
        let warning = ScheduleWarning::MalformedEvent {
            event_id: Uuid::nil(),
            reason: "missing medication id".into(),
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "malformed_event");
        assert!(warning.to_string().contains("missing medication id"));
    }
}
