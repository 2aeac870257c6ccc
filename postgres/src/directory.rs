//! Guest directory over the `guests` table.

use crate::{PostgresPlannerStore, db_error, rows};
use wedplan_core::ids::{ContainerId, GuestId};
use wedplan_core::store::{GuestDirectory, StoreError, StoreFuture};
use wedplan_core::types::{Guest, ResourceCategory, RsvpStatus};

impl PostgresPlannerStore {
    /// Insert or replace a guest record.
    ///
    /// Guest management belongs to the wider application; this exists for
    /// seeding and tests.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the write fails.
    pub async fn upsert_guest(&self, guest: &Guest) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO guests (id, first_name, last_name, rsvp, room_id, vehicle_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (id) DO UPDATE
             SET first_name = EXCLUDED.first_name,
                 last_name = EXCLUDED.last_name,
                 rsvp = EXCLUDED.rsvp,
                 room_id = EXCLUDED.room_id,
                 vehicle_id = EXCLUDED.vehicle_id",
        )
        .bind(*guest.id.as_uuid())
        .bind(&guest.first_name)
        .bind(&guest.last_name)
        .bind(guest.rsvp.as_str())
        .bind(guest.room_id.map(|id| *id.as_uuid()))
        .bind(guest.vehicle_id.map(|id| *id.as_uuid()))
        .execute(self.pool())
        .await
        .map_err(|e| db_error("upsert_guest", &e))?;
        Ok(())
    }
}

impl GuestDirectory for PostgresPlannerStore {
    fn list_eligible(&self, category: ResourceCategory) -> StoreFuture<'_, Vec<Guest>> {
        Box::pin(async move {
            let statuses: Vec<String> = RsvpStatus::ALL
                .into_iter()
                .filter(|rsvp| category.admits_rsvp(*rsvp))
                .map(|rsvp| rsvp.as_str().to_string())
                .collect();

            let records = sqlx::query(
                "SELECT id, first_name, last_name, rsvp, room_id, vehicle_id
                 FROM guests
                 WHERE rsvp = ANY($1)
                 ORDER BY created_at, id",
            )
            .bind(statuses)
            .fetch_all(self.pool())
            .await
            .map_err(|e| db_error("list_eligible", &e))?;

            records.iter().map(rows::guest).collect()
        })
    }

    fn get(&self, id: GuestId) -> StoreFuture<'_, Option<Guest>> {
        Box::pin(async move {
            let row = sqlx::query(
                "SELECT id, first_name, last_name, rsvp, room_id, vehicle_id
                 FROM guests
                 WHERE id = $1",
            )
            .bind(*id.as_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| db_error("get_guest", &e))?;

            row.as_ref().map(rows::guest).transpose()
        })
    }

    fn update_backref(
        &self,
        id: GuestId,
        category: ResourceCategory,
        container: Option<ContainerId>,
    ) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let column = match category {
                ResourceCategory::Room => "room_id",
                ResourceCategory::Vehicle => "vehicle_id",
                // Seats are their own records.
                ResourceCategory::Table => return Ok(()),
            };

            let query = format!("UPDATE guests SET {column} = $2 WHERE id = $1");
            let result = sqlx::query(&query)
                .bind(*id.as_uuid())
                .bind(container.map(|c| *c.as_uuid()))
                .execute(self.pool())
                .await
                .map_err(|e| db_error("update_backref", &e))?;

            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound(format!("guest {id}")));
            }
            Ok(())
        })
    }
}
