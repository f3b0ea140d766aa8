use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection};

use super::{
    format_date, format_datetime, parse_date, parse_datetime, parse_uuid, DoseEventRepository,
    SqliteStore,
};
use super::medication::adjust_quantity;
use crate::db::DatabaseError;
use crate::models::enums::DoseEventStatus;
use crate::models::DoseEvent;

impl DoseEventRepository for SqliteStore {
    fn list_in_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DoseEvent>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, medication_id, dose_time, scheduled_date, timestamp, status, notes
             FROM dose_events
             WHERE user_id = ?1 AND scheduled_date >= ?2 AND scheduled_date <= ?3
             ORDER BY timestamp ASC, rowid ASC",
        )?;

        let rows = stmt.query_map(
            params![user_id, format_date(start), format_date(end)],
            |row| {
                Ok(DoseEventRow {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    medication_id: row.get(2)?,
                    dose_time: row.get(3)?,
                    scheduled_date: row.get(4)?,
                    timestamp: row.get(5)?,
                    status: row.get(6)?,
                    notes: row.get(7)?,
                })
            },
        )?;

        let mut events = Vec::new();
        for row in rows {
            let row = row?;
            let id = row.id.clone();
            // Corrupt log entries are dropped, not fatal
            match dose_event_from_row(row) {
                Ok(event) => events.push(event),
                Err(e) => tracing::warn!(event_id = %id, error = %e, "Skipping undecodable dose event"),
            }
        }
        Ok(events)
    }

    fn append(&self, event: &DoseEvent) -> Result<(), DatabaseError> {
        insert_event(&self.conn, event)
    }

    fn append_with_stock_change(
        &self,
        event: &DoseEvent,
        stock_delta: i64,
    ) -> Result<u32, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        insert_event(&tx, event)?;
        // A zero delta still verifies the medication exists
        let remaining = adjust_quantity(&tx, &event.medication_id, stock_delta)?;
        tx.commit()?;
        Ok(remaining)
    }
}

fn insert_event(conn: &Connection, event: &DoseEvent) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO dose_events
         (id, user_id, medication_id, dose_time, scheduled_date, timestamp, status, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            event.id.to_string(),
            event.user_id,
            event.medication_id.to_string(),
            event.dose_time.to_string(),
            format_date(event.calendar_day()),
            format_datetime(event.timestamp),
            event.status.as_str(),
            event.notes,
        ],
    )?;
    Ok(())
}

struct DoseEventRow {
    id: String,
    user_id: String,
    medication_id: String,
    dose_time: String,
    scheduled_date: String,
    timestamp: String,
    status: String,
    notes: Option<String>,
}

fn dose_event_from_row(row: DoseEventRow) -> Result<DoseEvent, DatabaseError> {
    Ok(DoseEvent {
        id: parse_uuid("dose_events.id", &row.id)?,
        user_id: row.user_id,
        medication_id: parse_uuid("dose_events.medication_id", &row.medication_id)?,
        dose_time: row
            .dose_time
            .parse()
            .map_err(|_| DatabaseError::InvalidValue {
                field: "dose_time".into(),
                value: row.dose_time.clone(),
            })?,
        scheduled_date: Some(parse_date("scheduled_date", &row.scheduled_date)?),
        timestamp: parse_datetime("timestamp", &row.timestamp)?,
        status: DoseEventStatus::from_str(&row.status)?,
        notes: row.notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DoseTime;
    use uuid::Uuid;

    fn setup() -> SqliteStore {
        SqliteStore::open_in_memory().expect("Failed to open in-memory DB")
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn make_event(user_id: &str, scheduled: NaiveDate, status: DoseEventStatus) -> DoseEvent {
        DoseEvent {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            medication_id: Uuid::new_v4(),
            dose_time: DoseTime::new(8, 0).unwrap(),
            scheduled_date: Some(scheduled),
            timestamp: scheduled.and_hms_opt(8, 10, 0).unwrap(),
            status,
            notes: Some("with breakfast".into()),
        }
    }

    #[test]
    fn append_and_list_round_trip() {
        let store = setup();
        let event = make_event("user-1", day(2), DoseEventStatus::Taken);
        store.append(&event).unwrap();

        let events = store.list_in_range("user-1", day(1), day(3)).unwrap();
        assert_eq!(events, vec![event]);
    }

    #[test]
    fn range_is_by_scheduled_day_inclusive() {
        let store = setup();
        for d in 1..=5 {
            store
                .append(&make_event("user-1", day(d), DoseEventStatus::Taken))
                .unwrap();
        }
        // Logged after midnight for the previous evening's dose
        let mut late = make_event("user-1", day(5), DoseEventStatus::Skipped);
        late.timestamp = day(6).and_hms_opt(0, 30, 0).unwrap();
        store.append(&late).unwrap();

        let events = store.list_in_range("user-1", day(2), day(4)).unwrap();
        assert_eq!(events.len(), 3);

        let fifth = store.list_in_range("user-1", day(5), day(5)).unwrap();
        assert_eq!(fifth.len(), 2);
        assert!(fifth.iter().any(|e| e.id == late.id));
    }

    #[test]
    fn list_scopes_by_user() {
        let store = setup();
        store.append(&make_event("user-1", day(1), DoseEventStatus::Taken)).unwrap();
        store.append(&make_event("user-2", day(1), DoseEventStatus::Missed)).unwrap();

        let events = store.list_in_range("user-2", day(1), day(1)).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, DoseEventStatus::Missed);
    }

    #[test]
    fn timestamp_fallback_is_persisted_as_day() {
        let store = setup();
        let mut event = make_event("user-1", day(3), DoseEventStatus::Taken);
        event.scheduled_date = None;
        store.append(&event).unwrap();

        let events = store.list_in_range("user-1", day(3), day(3)).unwrap();
        assert_eq!(events[0].scheduled_date, Some(day(3)));
    }

    #[test]
    fn unknown_status_rows_are_skipped() {
        let store = setup();
        let good = make_event("user-1", day(1), DoseEventStatus::Taken);
        store.append(&good).unwrap();
        store
            .connection()
            .execute(
                "INSERT INTO dose_events
                 (id, user_id, medication_id, dose_time, scheduled_date, timestamp, status)
                 VALUES (?1, 'user-1', ?2, '08:00', '2024-01-01', '2024-01-01T08:00:00', 'snoozed')",
                params![Uuid::new_v4().to_string(), Uuid::new_v4().to_string()],
            )
            .unwrap();

        let events = store.list_in_range("user-1", day(1), day(1)).unwrap();
        assert_eq!(events, vec![good]);
    }

    #[test]
    fn stock_change_is_applied_with_event() {
        use crate::db::MedicationRepository;
        use crate::models::enums::Frequency;
        use crate::schedule::fixtures::medication;

        let store = setup();
        let med = medication(Frequency::Once, vec![DoseTime::new(8, 0).unwrap()], day(1));
        store.insert(&med).unwrap();

        let mut event = make_event("user-1", day(2), DoseEventStatus::Taken);
        event.medication_id = med.id;
        assert_eq!(store.append_with_stock_change(&event, -1).unwrap(), 29);

        let mut undo = make_event("user-1", day(2), DoseEventStatus::Skipped);
        undo.medication_id = med.id;
        assert_eq!(store.append_with_stock_change(&undo, 1).unwrap(), 30);
        assert_eq!(store.list_in_range("user-1", day(2), day(2)).unwrap().len(), 2);
    }

    #[test]
    fn failed_stock_change_rolls_back_event() {
        let store = setup();
        // No medication row: the stock update fails after the insert
        let event = make_event("user-1", day(2), DoseEventStatus::Taken);

        assert!(matches!(
            store.append_with_stock_change(&event, -1),
            Err(DatabaseError::NotFound { .. })
        ));
        assert!(store.list_in_range("user-1", day(2), day(2)).unwrap().is_empty());
    }
}
