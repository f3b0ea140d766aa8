use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{
    format_date, format_datetime, parse_date, parse_datetime, parse_uuid, MedicationRepository,
    SqliteStore,
};
use crate::db::DatabaseError;
use crate::models::enums::{Frequency, MedicationStatus};
use crate::models::{DoseTime, Medication};

const MEDICATION_COLUMNS: &str = "id, user_id, name, dosage, instructions, prescribed_by, frequency,
     start_date, end_date, remaining_quantity, refill_threshold, status, renewal_requested_at";

impl MedicationRepository for SqliteStore {
    fn list_active(&self, user_id: &str) -> Result<Vec<Medication>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MEDICATION_COLUMNS} FROM medications
             WHERE user_id = ?1 AND status = 'active'
             ORDER BY start_date ASC, name ASC"
        ))?;

        let rows = stmt.query_map(params![user_id], medication_row_from_rusqlite)?;

        let mut meds = Vec::new();
        for row in rows {
            // A single corrupt record must not hide the rest of the list
            match medication_from_row(&self.conn, row?) {
                Ok(med) => meds.push(med),
                Err(e) => tracing::warn!(error = %e, "Skipping undecodable medication row"),
            }
        }
        Ok(meds)
    }

    fn decrement_quantity(&self, medication_id: &Uuid, amount: u32) -> Result<u32, DatabaseError> {
        adjust_quantity(&self.conn, medication_id, -i64::from(amount))
    }

    fn insert(&self, med: &Medication) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO medications (id, user_id, name, dosage, instructions, prescribed_by,
             frequency, start_date, end_date, remaining_quantity, refill_threshold, status,
             renewal_requested_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                med.id.to_string(),
                med.user_id,
                med.name,
                med.dosage,
                med.instructions,
                med.prescribed_by,
                med.frequency.as_str(),
                format_date(med.start_date),
                med.end_date.map(format_date),
                med.remaining_quantity,
                med.refill_threshold,
                med.status.as_str(),
                med.renewal_requested_at.map(format_datetime),
            ],
        )?;

        for (position, dose_time) in med.dose_times.iter().enumerate() {
            tx.execute(
                "INSERT INTO medication_dose_times (medication_id, position, dose_time)
                 VALUES (?1, ?2, ?3)",
                params![med.id.to_string(), position as i64, dose_time.to_string()],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn get(&self, medication_id: &Uuid) -> Result<Option<Medication>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {MEDICATION_COLUMNS} FROM medications WHERE id = ?1"),
                params![medication_id.to_string()],
                medication_row_from_rusqlite,
            )
            .optional()?;

        row.map(|r| medication_from_row(&self.conn, r)).transpose()
    }

    fn deactivate(&self, medication_id: &Uuid) -> Result<(), DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE medications SET status = ?2 WHERE id = ?1",
            params![medication_id.to_string(), MedicationStatus::Inactive.as_str()],
        )?;
        if changed == 0 {
            return Err(not_found(medication_id));
        }
        Ok(())
    }

    fn mark_renewal_requested(
        &self,
        medication_id: &Uuid,
        at: NaiveDateTime,
    ) -> Result<(), DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE medications SET renewal_requested_at = ?2 WHERE id = ?1",
            params![medication_id.to_string(), format_datetime(at)],
        )?;
        if changed == 0 {
            return Err(not_found(medication_id));
        }
        Ok(())
    }
}

/// Shift remaining stock by `delta`, floored at zero. Returns the new count.
pub(super) fn adjust_quantity(
    conn: &Connection,
    medication_id: &Uuid,
    delta: i64,
) -> Result<u32, DatabaseError> {
    let changed = conn.execute(
        "UPDATE medications
         SET remaining_quantity = MAX(remaining_quantity + ?2, 0)
         WHERE id = ?1",
        params![medication_id.to_string(), delta],
    )?;
    if changed == 0 {
        return Err(not_found(medication_id));
    }

    let remaining: u32 = conn.query_row(
        "SELECT remaining_quantity FROM medications WHERE id = ?1",
        params![medication_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(remaining)
}

fn not_found(medication_id: &Uuid) -> DatabaseError {
    DatabaseError::NotFound {
        entity_type: "medication".into(),
        id: medication_id.to_string(),
    }
}

fn load_dose_times(conn: &Connection, medication_id: &str) -> Result<Vec<DoseTime>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT dose_time FROM medication_dose_times
         WHERE medication_id = ?1 ORDER BY position ASC",
    )?;
    let rows = stmt.query_map(params![medication_id], |row| row.get::<_, String>(0))?;

    let mut times = Vec::new();
    for raw in rows {
        let raw = raw?;
        let time = raw.parse().map_err(|_| DatabaseError::InvalidValue {
            field: "dose_time".into(),
            value: raw.clone(),
        })?;
        times.push(time);
    }
    Ok(times)
}

// Internal row type for Medication mapping
struct MedicationRow {
    id: String,
    user_id: String,
    name: String,
    dosage: String,
    instructions: Option<String>,
    prescribed_by: Option<String>,
    frequency: String,
    start_date: String,
    end_date: Option<String>,
    remaining_quantity: u32,
    refill_threshold: u32,
    status: String,
    renewal_requested_at: Option<String>,
}

fn medication_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<MedicationRow, rusqlite::Error> {
    Ok(MedicationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        dosage: row.get(3)?,
        instructions: row.get(4)?,
        prescribed_by: row.get(5)?,
        frequency: row.get(6)?,
        start_date: row.get(7)?,
        end_date: row.get(8)?,
        remaining_quantity: row.get(9)?,
        refill_threshold: row.get(10)?,
        status: row.get(11)?,
        renewal_requested_at: row.get(12)?,
    })
}

fn medication_from_row(conn: &Connection, row: MedicationRow) -> Result<Medication, DatabaseError> {
    let dose_times = load_dose_times(conn, &row.id)?;
    Ok(Medication {
        id: parse_uuid("medications.id", &row.id)?,
        user_id: row.user_id,
        name: row.name,
        dosage: row.dosage,
        instructions: row.instructions,
        prescribed_by: row.prescribed_by,
        frequency: Frequency::from_str(&row.frequency)?,
        dose_times,
        start_date: parse_date("start_date", &row.start_date)?,
        end_date: row
            .end_date
            .as_deref()
            .map(|d| parse_date("end_date", d))
            .transpose()?,
        remaining_quantity: row.remaining_quantity,
        refill_threshold: row.refill_threshold,
        status: MedicationStatus::from_str(&row.status)?,
        renewal_requested_at: row
            .renewal_requested_at
            .as_deref()
            .map(|d| parse_datetime("renewal_requested_at", d))
            .transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn setup() -> SqliteStore {
        SqliteStore::open_in_memory().expect("Failed to open in-memory DB")
    }

    fn make_medication(user_id: &str, name: &str) -> Medication {
        Medication {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            name: name.into(),
            dosage: "10mg".into(),
            instructions: Some("After breakfast".into()),
            prescribed_by: None,
            frequency: Frequency::Twice,
            dose_times: vec![DoseTime::new(8, 0).unwrap(), DoseTime::new(20, 0).unwrap()],
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: Some(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()),
            remaining_quantity: 12,
            refill_threshold: 5,
            status: MedicationStatus::Active,
            renewal_requested_at: None,
        }
    }

    #[test]
    fn insert_and_get_round_trip() {
        let store = setup();
        let med = make_medication("user-1", "Lisinopril");
        store.insert(&med).unwrap();

        let loaded = store.get(&med.id).unwrap().expect("medication exists");
        assert_eq!(loaded, med);
        assert!(store.get(&Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn list_active_scopes_by_user_and_status() {
        let store = setup();
        let mine = make_medication("user-1", "Lisinopril");
        let stopped = make_medication("user-1", "Atorvastatin");
        let theirs = make_medication("user-2", "Metformin");
        for med in [&mine, &stopped, &theirs] {
            store.insert(med).unwrap();
        }
        store.deactivate(&stopped.id).unwrap();

        let active = store.list_active("user-1").unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, mine.id);
        assert_eq!(active[0].dose_times.len(), 2);
    }

    #[test]
    fn decrement_floors_at_zero() {
        let store = setup();
        let med = make_medication("user-1", "Lisinopril");
        store.insert(&med).unwrap();

        assert_eq!(store.decrement_quantity(&med.id, 1).unwrap(), 11);
        assert_eq!(store.decrement_quantity(&med.id, 50).unwrap(), 0);
    }

    #[test]
    fn missing_medication_is_not_found() {
        let store = setup();
        let id = Uuid::new_v4();
        assert!(matches!(
            store.decrement_quantity(&id, 1),
            Err(DatabaseError::NotFound { .. })
        ));
        assert!(matches!(store.deactivate(&id), Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn renewal_timestamp_is_stored() {
        let store = setup();
        let med = make_medication("user-1", "Lisinopril");
        store.insert(&med).unwrap();

        let at = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        store.mark_renewal_requested(&med.id, at).unwrap();
        assert_eq!(
            store.get(&med.id).unwrap().unwrap().renewal_requested_at,
            Some(at)
        );
    }

    #[test]
    fn corrupt_row_is_skipped() {
        let store = setup();
        let good = make_medication("user-1", "Lisinopril");
        store.insert(&good).unwrap();
        store
            .connection()
            .execute(
                "INSERT INTO medications (id, user_id, name, dosage, frequency, start_date, status)
                 VALUES (?1, 'user-1', 'Broken', '1mg', 'hourly', '2024-01-01', 'active')",
                params![Uuid::new_v4().to_string()],
            )
            .unwrap();

        let active = store.list_active("user-1").unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, good.id);
    }

    #[test]
    fn dose_times_cascade_on_delete() {
        let store = setup();
        let med = make_medication("user-1", "Lisinopril");
        store.insert(&med).unwrap();
        store
            .connection()
            .execute("DELETE FROM medications WHERE id = ?1", params![med.id.to_string()])
            .unwrap();

        let remaining: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM medication_dose_times", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
