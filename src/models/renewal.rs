use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::RenewalStatus;

/// A prescription renewal request covering one or more medications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenewalRequest {
    pub id: Uuid,
    pub user_id: String,
    pub items: Vec<RenewalItem>,
    pub status: RenewalStatus,
    pub requested_at: NaiveDateTime,
}

/// Medication details captured at request time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenewalItem {
    pub medication_id: Uuid,
    pub name: String,
    pub dosage: String,
    pub current_quantity: u32,
}
