//! Medication entry form: input type, defaults and validation.
//!
//! Turns what the user typed into a `Medication` that satisfies the
//! schedule invariants. Empty timing preferences fall back to the
//! frequency's default reminder times.

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::DEFAULT_REFILL_THRESHOLD;
use crate::models::enums::{Frequency, MedicationStatus};
use crate::models::{DoseTime, Medication};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MedicationInputError {
    #[error("Medication name is required")]
    MissingName,

    #[error("Dosage is required")]
    MissingDosage,

    #[error("Invalid dose time: {0}")]
    InvalidDoseTime(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),
}

/// Medication entry as submitted from the add-medication form.
#[derive(Debug, Clone, Deserialize)]
pub struct MedicationInput {
    pub name: String,
    pub dosage: String,
    pub frequency: Frequency,
    /// `"HH:MM"` entries. Empty uses the frequency defaults.
    #[serde(default)]
    pub dose_times: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub instructions: Option<String>,
    pub prescribed_by: Option<String>,
    #[serde(default)]
    pub remaining_quantity: u32,
    pub refill_threshold: Option<u32>,
}

impl MedicationInput {
    pub fn into_medication(self, user_id: &str) -> Result<Medication, MedicationInputError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(MedicationInputError::MissingName);
        }
        let dosage = self.dosage.trim().to_string();
        if dosage.is_empty() {
            return Err(MedicationInputError::MissingDosage);
        }

        let mut dose_times = self
            .dose_times
            .iter()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| raw.parse::<DoseTime>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(MedicationInputError::InvalidDoseTime)?;
        if dose_times.is_empty() {
            dose_times = self.frequency.default_dose_times();
        }
        dose_times.sort();

        let medication = Medication {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            name,
            dosage,
            instructions: non_empty(self.instructions),
            prescribed_by: non_empty(self.prescribed_by),
            frequency: self.frequency,
            dose_times,
            start_date: self.start_date,
            end_date: self.end_date,
            remaining_quantity: self.remaining_quantity,
            refill_threshold: self.refill_threshold.unwrap_or(DEFAULT_REFILL_THRESHOLD),
            status: MedicationStatus::Active,
            renewal_requested_at: None,
        };

        medication
            .validate()
            .map_err(MedicationInputError::InvalidSchedule)?;
        Ok(medication)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
