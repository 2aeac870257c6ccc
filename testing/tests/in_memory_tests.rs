//! Tests for the in-memory collaborators

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use wedplan_core::ids::{AssignmentId, ContainerId, ParentId, UserId};
use wedplan_core::store::{GuestDirectory, PersistentStore, StoreError};
use wedplan_core::types::{
    Capacity, Container, ContainerPatch, Parent, ResourceCategory, TableAssignment,
};
use wedplan_core::{DateTime, Utc};
use wedplan_testing::{InMemoryGuestDirectory, InMemoryPlannerStore, helpers};

fn at(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_735_689_600 + seconds, 0).unwrap()
}

fn parent(category: ResourceCategory, name: &str) -> Parent {
    Parent {
        id: ParentId::new(),
        category,
        name: name.to_string(),
        created_at: at(0),
    }
}

fn container(parent: &Parent, label: &str, seconds: i64) -> Container {
    Container {
        id: ContainerId::new(),
        parent_id: parent.id,
        category: parent.category,
        label: label.to_string(),
        kind: "Double".to_string(),
        capacity: Capacity::new(2),
        occupants: Vec::new(),
        created_at: at(seconds),
        updated_at: at(seconds),
    }
}

#[tokio::test]
async fn test_store_lists_containers_of_one_parent_in_creation_order() {
    let store = InMemoryPlannerStore::new();
    let hotel = parent(ResourceCategory::Room, "Grand Hotel");
    let other = parent(ResourceCategory::Room, "Seaside Inn");
    store.create_parent(hotel.clone()).await.unwrap();
    store.create_parent(other.clone()).await.unwrap();

    let second = container(&hotel, "102", 2);
    let first = container(&hotel, "101", 1);
    store.create_container(second.clone()).await.unwrap();
    store.create_container(first.clone()).await.unwrap();
    store.create_container(container(&other, "1", 0)).await.unwrap();

    let listed = store.list_containers(hotel.id).await.unwrap();
    let labels: Vec<&str> = listed.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["101", "102"]);
    assert_eq!(store.list_parents().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_store_applies_patch_fields_that_are_set() {
    let store = InMemoryPlannerStore::new();
    let hotel = parent(ResourceCategory::Room, "Grand Hotel");
    let room = container(&hotel, "101", 0);
    store.create_container(room.clone()).await.unwrap();

    let guest = helpers::attending("Jane", "Doe");
    store
        .update_container(
            room.id,
            ContainerPatch {
                occupants: Some(vec![guest.id]),
                capacity: None,
                updated_at: at(10),
            },
        )
        .await
        .unwrap();

    let stored = store.container(room.id).unwrap();
    assert_eq!(stored.occupants, vec![guest.id]);
    assert_eq!(stored.capacity, Capacity::new(2));
    assert_eq!(stored.updated_at, at(10));
}

#[tokio::test]
async fn test_store_update_of_missing_container_is_not_found() {
    let store = InMemoryPlannerStore::new();
    let result = store
        .update_container(ContainerId::new(), ContainerPatch::touch(at(0)))
        .await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn test_store_does_not_cascade() {
    let store = InMemoryPlannerStore::new();
    let hotel = parent(ResourceCategory::Room, "Grand Hotel");
    let room = container(&hotel, "101", 0);
    store.create_parent(hotel.clone()).await.unwrap();
    store.create_container(room.clone()).await.unwrap();

    store.delete_parent(hotel.id).await.unwrap();

    assert!(store.parent(hotel.id).is_none());
    assert!(store.container(room.id).is_some());
}

#[tokio::test]
async fn test_fail_writes_fails_exactly_that_many() {
    let store = InMemoryPlannerStore::new();
    let hotel = parent(ResourceCategory::Room, "Grand Hotel");
    store.fail_writes(2);

    assert!(matches!(
        store.create_parent(hotel.clone()).await,
        Err(StoreError::Unavailable(_))
    ));
    assert!(store.create_parent(hotel.clone()).await.is_err());
    store.create_parent(hotel.clone()).await.unwrap();

    assert_eq!(store.write_count(), 1);
    assert!(store.parent(hotel.id).is_some());
}

#[tokio::test]
async fn test_offline_store_rejects_writes_until_back_online() {
    let store = InMemoryPlannerStore::new();
    let hotel = parent(ResourceCategory::Room, "Grand Hotel");

    store.set_offline(true);
    assert!(store.create_parent(hotel.clone()).await.is_err());
    store.set_offline(false);
    store.create_parent(hotel).await.unwrap();
}

#[tokio::test]
async fn test_clones_share_data() {
    let store = InMemoryPlannerStore::new();
    let session = store.clone();
    let hotel = parent(ResourceCategory::Room, "Grand Hotel");

    session.create_parent(hotel.clone()).await.unwrap();

    assert!(store.parent(hotel.id).is_some());
}

#[tokio::test]
async fn test_seats_are_listed_per_event() {
    let store = InMemoryPlannerStore::new();
    let reception = parent(ResourceCategory::Table, "Reception");
    let rehearsal = parent(ResourceCategory::Table, "Rehearsal Dinner");
    let rose = container(&reception, "Rose", 0);
    let guest = helpers::attending("Jane", "Doe");

    for (event, seconds) in [(reception.id, 1), (rehearsal.id, 2)] {
        store
            .record_table_assignment(TableAssignment {
                id: AssignmentId::new(),
                guest_id: guest.id,
                table_id: rose.id,
                event_id: event,
                assigned_at: at(seconds),
                assigned_by: UserId::new(),
            })
            .await
            .unwrap();
    }

    let seats = store.list_table_assignments(reception.id).await.unwrap();
    assert_eq!(seats.len(), 1);
    assert_eq!(store.seat_count(), 2);

    store.remove_table_assignment(seats[0].id).await.unwrap();
    // Removing again is not an error.
    store.remove_table_assignment(seats[0].id).await.unwrap();
    assert!(store.list_table_assignments(reception.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_directory_filters_by_category_eligibility() {
    let directory = InMemoryGuestDirectory::with_guests([
        helpers::attending("Jane", "Doe"),
        helpers::pending("John", "Smith"),
        helpers::declined("Max", "Mustermann"),
    ]);

    let rooms = directory.list_eligible(ResourceCategory::Room).await.unwrap();
    let vehicles = directory.list_eligible(ResourceCategory::Vehicle).await.unwrap();

    assert_eq!(rooms.len(), 2);
    assert_eq!(vehicles.len(), 1);
    assert_eq!(vehicles[0].first_name, "Jane");
}

#[tokio::test]
async fn test_directory_updates_backrefs() {
    let directory = InMemoryGuestDirectory::new();
    let jane = directory.insert(helpers::attending("Jane", "Doe"));
    let room = ContainerId::new();

    directory
        .update_backref(jane, ResourceCategory::Room, Some(room))
        .await
        .unwrap();
    assert_eq!(directory.guest(jane).unwrap().room_id, Some(room));

    directory
        .update_backref(jane, ResourceCategory::Room, None)
        .await
        .unwrap();
    assert_eq!(directory.guest(jane).unwrap().room_id, None);
}

#[tokio::test]
async fn test_offline_directory_fails_reads() {
    let directory = InMemoryGuestDirectory::new();
    let jane = directory.insert(helpers::attending("Jane", "Doe"));

    directory.set_offline(true);
    assert!(directory.get(jane).await.is_err());
    assert!(directory.list_eligible(ResourceCategory::Room).await.is_err());
}
