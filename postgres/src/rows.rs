//! Row decoding.

use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;
use wedplan_core::ids::{AssignmentId, ContainerId, GuestId, ParentId, UserId};
use wedplan_core::store::StoreError;
use wedplan_core::types::{
    Capacity, Container, Guest, Parent, ResourceCategory, RsvpStatus, TableAssignment,
};

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| StoreError::Serialization(format!("column {name}: {e}")))
}

fn category(row: &PgRow) -> Result<ResourceCategory, StoreError> {
    let raw: String = column(row, "category")?;
    ResourceCategory::parse(&raw)
        .ok_or_else(|| StoreError::Serialization(format!("Invalid category: {raw}")))
}

/// Stored capacities that are NULL, zero or negative read as "not set".
fn capacity(raw: Option<i32>) -> Option<Capacity> {
    raw.and_then(|v| u32::try_from(v).ok()).and_then(Capacity::new)
}

/// Capacity as stored.
pub(crate) fn capacity_column(capacity: Capacity) -> Result<i32, StoreError> {
    i32::try_from(capacity.value())
        .map_err(|_| StoreError::Serialization(format!("Capacity {capacity} out of range")))
}

pub(crate) fn parent(row: &PgRow) -> Result<Parent, StoreError> {
    Ok(Parent {
        id: ParentId::from_uuid(column(row, "id")?),
        category: category(row)?,
        name: column(row, "name")?,
        created_at: column(row, "created_at")?,
    })
}

pub(crate) fn container(row: &PgRow) -> Result<Container, StoreError> {
    let occupants: Vec<Uuid> = column(row, "occupants")?;
    Ok(Container {
        id: ContainerId::from_uuid(column(row, "id")?),
        parent_id: ParentId::from_uuid(column(row, "parent_id")?),
        category: category(row)?,
        label: column(row, "label")?,
        kind: column(row, "kind")?,
        capacity: capacity(column(row, "capacity")?),
        occupants: occupants.into_iter().map(GuestId::from_uuid).collect(),
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
    })
}

pub(crate) fn table_assignment(row: &PgRow) -> Result<TableAssignment, StoreError> {
    Ok(TableAssignment {
        id: AssignmentId::from_uuid(column(row, "id")?),
        guest_id: GuestId::from_uuid(column(row, "guest_id")?),
        table_id: ContainerId::from_uuid(column(row, "table_id")?),
        event_id: ParentId::from_uuid(column(row, "event_id")?),
        assigned_at: column(row, "assigned_at")?,
        assigned_by: UserId::from_uuid(column(row, "assigned_by")?),
    })
}

pub(crate) fn guest(row: &PgRow) -> Result<Guest, StoreError> {
    let rsvp: String = column(row, "rsvp")?;
    let room_id: Option<Uuid> = column(row, "room_id")?;
    let vehicle_id: Option<Uuid> = column(row, "vehicle_id")?;
    Ok(Guest {
        id: GuestId::from_uuid(column(row, "id")?),
        first_name: column(row, "first_name")?,
        last_name: column(row, "last_name")?,
        rsvp: RsvpStatus::parse(&rsvp),
        room_id: room_id.map(ContainerId::from_uuid),
        vehicle_id: vehicle_id.map(ContainerId::from_uuid),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_or_invalid_capacity_reads_as_none() {
        assert_eq!(capacity(None), None);
        assert_eq!(capacity(Some(0)), None);
        assert_eq!(capacity(Some(-3)), None);
        assert_eq!(capacity(Some(4)), Capacity::new(4));
    }

    #[test]
    fn oversized_capacity_is_rejected_on_write() {
        let huge = Capacity::new(u32::MAX).map(capacity_column);
        assert!(matches!(huge, Some(Err(StoreError::Serialization(_)))));
    }
}
