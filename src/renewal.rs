//! Prescription renewals: low-stock detection and request assembly.

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::models::enums::RenewalStatus;
use crate::models::{Medication, RenewalItem, RenewalRequest};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RenewalError {
    #[error("No medications selected for renewal")]
    EmptySelection,

    #[error("Medication {0} is not in the active list")]
    UnknownMedication(Uuid),
}

pub fn needs_renewal(med: &Medication) -> bool {
    med.remaining_quantity <= med.refill_threshold
}

/// Active medications at or below their refill threshold, lowest stock first.
pub fn renewal_candidates(medications: &[Medication]) -> Vec<&Medication> {
    let mut candidates: Vec<_> = medications
        .iter()
        .filter(|m| m.is_active() && needs_renewal(m))
        .collect();
    candidates.sort_by(|a, b| {
        a.remaining_quantity
            .cmp(&b.remaining_quantity)
            .then_with(|| a.name.cmp(&b.name))
    });
    candidates
}

/// Build a pending request snapshotting each selected medication.
pub fn build_request(
    user_id: &str,
    medications: &[Medication],
    selected: &[Uuid],
    now: NaiveDateTime,
) -> Result<RenewalRequest, RenewalError> {
    if selected.is_empty() {
        return Err(RenewalError::EmptySelection);
    }

    let items = selected
        .iter()
        .map(|id| {
            medications
                .iter()
                .find(|m| m.id == *id)
                .map(|m| RenewalItem {
                    medication_id: m.id,
                    name: m.name.clone(),
                    dosage: m.dosage.clone(),
                    current_quantity: m.remaining_quantity,
                })
                .ok_or(RenewalError::UnknownMedication(*id))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RenewalRequest {
        id: Uuid::new_v4(),
        user_id: user_id.to_string(),
        items,
        status: RenewalStatus::Pending,
        requested_at: now,
    })
}
