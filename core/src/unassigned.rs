//! Unassigned-guest view.
//!
//! Recomputed from the guest list and the current containers on every read. There
//! is no cache to go stale.

use crate::ids::GuestId;
use crate::types::{Container, Guest};
use std::collections::HashSet;

/// Eligible guests that appear in none of the given containers.
///
/// The result keeps the relative order of `guests`. Pass only the containers of
/// the category (and, for tables, the event) being examined.
#[must_use]
pub fn compute_unassigned<'a, C, P>(guests: &[Guest], containers: C, eligible: P) -> Vec<Guest>
where
    C: IntoIterator<Item = &'a Container>,
    P: Fn(&Guest) -> bool,
{
    let assigned: HashSet<GuestId> = containers
        .into_iter()
        .flat_map(|container| container.occupants.iter().copied())
        .collect();

    guests
        .iter()
        .filter(|guest| eligible(guest) && !assigned.contains(&guest.id))
        .cloned()
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ids::{ContainerId, ParentId};
    use crate::types::{Capacity, ResourceCategory, RsvpStatus};
    use chrono::Utc;
    use proptest::prelude::*;

    fn container_with(occupants: Vec<GuestId>) -> Container {
        Container {
            id: ContainerId::new(),
            parent_id: ParentId::new(),
            category: ResourceCategory::Room,
            label: "A".to_string(),
            kind: "Suite".to_string(),
            capacity: Capacity::new(4),
            occupants,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn keeps_original_order() {
        let guests = vec![
            Guest::new("Zoe", "Adams", RsvpStatus::Attending),
            Guest::new("Amy", "Zimmer", RsvpStatus::Pending),
            Guest::new("Bob", "Brown", RsvpStatus::Attending),
        ];
        let rooms = [container_with(vec![guests[1].id])];

        let result = compute_unassigned(&guests, &rooms, |g| ResourceCategory::Room.admits(g));

        let names: Vec<_> = result.iter().map(Guest::full_name).collect();
        assert_eq!(names, vec!["Zoe Adams", "Bob Brown"]);
    }

    #[test]
    fn ineligible_guests_are_excluded() {
        let guests = vec![
            Guest::new("Dee", "Clined", RsvpStatus::Declined),
            Guest::new("Ann", "Tending", RsvpStatus::Attending),
        ];

        let result = compute_unassigned(&guests, std::iter::empty::<&Container>(), |g| ResourceCategory::Room.admits(g));

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].first_name, "Ann");
    }

    fn rsvp() -> impl Strategy<Value = RsvpStatus> {
        prop_oneof![
            Just(RsvpStatus::Attending),
            Just(RsvpStatus::Pending),
            Just(RsvpStatus::Declined),
        ]
    }

    proptest! {
        #[test]
        fn matches_brute_force(
            statuses in prop::collection::vec(rsvp(), 0..30),
            placement in prop::collection::vec(prop::option::of(0usize..5), 0..30),
        ) {
            let guests: Vec<Guest> = statuses
                .iter()
                .map(|status| Guest::new("G", "X", *status))
                .collect();

            let mut containers: Vec<Container> = (0..5).map(|_| container_with(Vec::new())).collect();
            for (guest, slot) in guests.iter().zip(&placement) {
                if let Some(index) = slot {
                    containers[*index].occupants.push(guest.id);
                }
            }

            let result = compute_unassigned(&guests, &containers, |g| ResourceCategory::Room.admits(g));

            let expected: Vec<GuestId> = guests
                .iter()
                .filter(|g| ResourceCategory::Room.admits(g))
                .filter(|g| !containers.iter().any(|c| c.holds(g.id)))
                .map(|g| g.id)
                .collect();
            let actual: Vec<GuestId> = result.iter().map(|g| g.id).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
