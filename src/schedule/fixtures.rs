//! Shared test fixtures for the schedule engine.

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::models::enums::{DoseEventStatus, Frequency, MedicationStatus};
use crate::models::{DoseEvent, DoseTime, Medication};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(day: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
    day.and_hms_opt(h, m, 0).unwrap()
}

pub fn time(h: u8, m: u8) -> DoseTime {
    DoseTime::new(h, m).unwrap()
}

pub fn medication(frequency: Frequency, dose_times: Vec<DoseTime>, start: NaiveDate) -> Medication {
    Medication {
        id: Uuid::new_v4(),
        user_id: "user-1".into(),
        name: "Metformin".into(),
        dosage: "500mg".into(),
        instructions: Some("Take with food".into()),
        prescribed_by: Some("Dr. Osei".into()),
        frequency,
        dose_times,
        start_date: start,
        end_date: None,
        remaining_quantity: 30,
        refill_threshold: 5,
        status: MedicationStatus::Active,
        renewal_requested_at: None,
    }
}

pub fn event(
    medication_id: Uuid,
    day: NaiveDate,
    dose_time: DoseTime,
    status: DoseEventStatus,
    timestamp: NaiveDateTime,
) -> DoseEvent {
    DoseEvent {
        id: Uuid::new_v4(),
        user_id: "user-1".into(),
        medication_id,
        dose_time,
        scheduled_date: Some(day),
        timestamp,
        status,
        notes: None,
    }
}
