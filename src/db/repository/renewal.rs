use std::str::FromStr;

use rusqlite::params;

use super::{format_datetime, parse_datetime, parse_uuid, RenewalRepository, SqliteStore};
use crate::db::DatabaseError;
use crate::models::enums::RenewalStatus;
use crate::models::{RenewalItem, RenewalRequest};

impl RenewalRepository for SqliteStore {
    fn insert_request(&self, request: &RenewalRequest) -> Result<(), DatabaseError> {
        let items_json = serde_json::to_string(&request.items)?;

        self.conn.execute(
            "INSERT INTO renewal_requests (id, user_id, items, status, requested_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                request.id.to_string(),
                request.user_id,
                items_json,
                request.status.as_str(),
                format_datetime(request.requested_at),
            ],
        )?;
        Ok(())
    }

    fn list_requests(&self, user_id: &str) -> Result<Vec<RenewalRequest>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, items, status, requested_at
             FROM renewal_requests
             WHERE user_id = ?1
             ORDER BY requested_at DESC",
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut requests = Vec::new();
        for row in rows {
            let (id, user_id, items, status, requested_at) = row?;
            let items: Vec<RenewalItem> = serde_json::from_str(&items)?;
            requests.push(RenewalRequest {
                id: parse_uuid("renewal_requests.id", &id)?,
                user_id,
                items,
                status: RenewalStatus::from_str(&status)?,
                requested_at: parse_datetime("requested_at", &requested_at)?,
            });
        }
        Ok(requests)
    }
}
