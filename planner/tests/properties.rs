//! Property tests: random assignment workloads never break the ledger invariants

#![allow(clippy::unwrap_used)] // Tests can unwrap

use proptest::prelude::*;
use std::collections::HashMap;
use wedplan_core::capacity;
use wedplan_core::error::AssignmentError;
use wedplan_core::ids::{ContainerId, GuestId, ParentId};
use wedplan_core::ledger::{LedgerAction, LedgerEnvironment, LedgerReducer, LedgerState};
use wedplan_core::reducer::Reducer;
use wedplan_core::types::{Guest, ResourceCategory};
use wedplan_testing::helpers;
use wedplan_testing::properties::{self, LedgerOp};

/// Two hotels, one route and two events with their containers.
struct World {
    state: LedgerState,
    env: LedgerEnvironment,
    containers: Vec<ContainerId>,
    events: Vec<ParentId>,
}

impl World {
    fn new(capacities: &[u32]) -> Self {
        let env = helpers::test_env();
        let mut state = LedgerState::new();
        let reducer = LedgerReducer::new();
        let layout = [
            (ResourceCategory::Room, "Grand Hotel", 2),
            (ResourceCategory::Room, "Lakeside Inn", 1),
            (ResourceCategory::Vehicle, "Airport Shuttle", 1),
            (ResourceCategory::Table, "Rehearsal Dinner", 1),
            (ResourceCategory::Table, "Reception", 2),
        ];

        let mut containers = Vec::new();
        let mut events = Vec::new();
        let mut capacities = capacities.iter().copied().cycle();
        for (category, name, count) in layout {
            let (parent, action) = helpers::create_parent(category, name);
            reducer.reduce(&mut state, action, &env).unwrap();
            if category == ResourceCategory::Table {
                events.push(parent);
            }
            for n in 0..count {
                let (id, action) =
                    helpers::create_container(parent, &n.to_string(), capacities.next());
                reducer.reduce(&mut state, action, &env).unwrap();
                containers.push(id);
            }
        }

        Self {
            state,
            env,
            containers,
            events,
        }
    }

    fn container(&self, index: usize) -> ContainerId {
        self.containers[index % self.containers.len()]
    }

    fn apply(&mut self, op: LedgerOp, guests: &[Guest]) -> Result<(), AssignmentError> {
        let reducer = LedgerReducer::new();
        let guest = |index: usize| guests[index % guests.len()].clone();
        match op {
            LedgerOp::Assign { guest: g, container } => {
                let action = LedgerAction::Assign {
                    guest: guest(g),
                    container_id: self.container(container),
                };
                reducer.reduce(&mut self.state, action, &self.env).map(drop)
            }
            LedgerOp::Unassign { guest: g, container } => {
                let action = helpers::unassign(guest(g).id, self.container(container));
                reducer.reduce(&mut self.state, action, &self.env).map(drop)
            }
            LedgerOp::Reassign { guest: g, from, to } => {
                let guest = guest(g);
                let release = helpers::unassign(guest.id, self.container(from));
                reducer.reduce(&mut self.state, release, &self.env)?;
                let action = LedgerAction::Assign {
                    guest,
                    container_id: self.container(to),
                };
                reducer.reduce(&mut self.state, action, &self.env).map(drop)
            }
        }
    }
}

fn held_per_scope(state: &LedgerState) -> HashMap<(GuestId, ResourceCategory, Option<ParentId>), usize> {
    let mut held = HashMap::new();
    for container in state.all_containers() {
        let scope = container
            .category
            .scoped_to_parent()
            .then_some(container.parent_id);
        for guest_id in &container.occupants {
            *held.entry((*guest_id, container.category, scope)).or_insert(0) += 1;
        }
    }
    held
}

proptest! {
    #[test]
    fn occupancy_never_exceeds_capacity(
        capacities in prop::collection::vec(properties::capacity(4), 1..6),
        guests in properties::guests(1, 12),
        ops in properties::ledger_ops(60),
    ) {
        let mut world = World::new(&capacities);
        for op in ops {
            let before = world.state.clone();
            if world.apply(op, &guests).is_err() && !matches!(op, LedgerOp::Reassign { .. }) {
                prop_assert_eq!(&world.state, &before);
            }
            for container in world.state.all_containers() {
                prop_assert!(!capacity::is_over_capacity(container));
            }
        }
    }

    #[test]
    fn guest_holds_at_most_one_container_per_scope(
        capacities in prop::collection::vec(properties::capacity(4), 1..6),
        guests in properties::guests(1, 12),
        ops in properties::ledger_ops(60),
    ) {
        let mut world = World::new(&capacities);
        for op in ops {
            let _ = world.apply(op, &guests);
            for count in held_per_scope(&world.state).values() {
                prop_assert_eq!(*count, 1);
            }
        }

        for container in world.state.all_containers() {
            let mut unique = container.occupants.clone();
            unique.sort();
            unique.dedup();
            prop_assert_eq!(unique.len(), container.occupants.len());
        }

        let seated: usize = world
            .state
            .containers_in(ResourceCategory::Table)
            .iter()
            .map(|c| c.occupancy())
            .sum();
        prop_assert_eq!(world.state.seats().len(), seated);
    }

    #[test]
    fn unassigned_view_matches_occupancy(
        capacities in prop::collection::vec(properties::capacity(4), 1..6),
        guests in properties::guests(1, 12),
        ops in properties::ledger_ops(40),
    ) {
        let mut world = World::new(&capacities);
        for op in ops {
            let _ = world.apply(op, &guests);
        }

        let mut scopes: Vec<(ResourceCategory, Option<ParentId>)> = vec![
            (ResourceCategory::Room, None),
            (ResourceCategory::Vehicle, None),
        ];
        scopes.extend(world.events.iter().map(|e| (ResourceCategory::Table, Some(*e))));

        for (category, scope) in scopes {
            let view = world
                .state
                .unassigned(&guests, category, scope, |g| category.admits(g));

            let expected: Vec<GuestId> = guests
                .iter()
                .filter(|g| category.admits(g))
                .filter(|g| world.state.holding(g.id, category, scope).is_none())
                .map(|g| g.id)
                .collect();
            let actual: Vec<GuestId> = view.iter().map(|g| g.id).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
