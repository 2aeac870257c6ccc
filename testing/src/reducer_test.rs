//! Ergonomic testing utilities for reducers
//!
//! This module provides a fluent API for testing reducers with readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use wedplan_core::{effect::Effect, reducer::Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion = Box<dyn FnOnce(&[Effect])>;

/// Type alias for error assertion functions
type ErrorAssertion<Err> = Box<dyn FnOnce(&Err)>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// Actions listed with [`ReducerTest::given_actions`] are applied first and must
/// succeed; their effects are discarded. Assertions then run against the result
/// of [`ReducerTest::when_action`].
///
/// # Example
///
/// ```ignore
/// use wedplan_testing::ReducerTest;
///
/// ReducerTest::new(LedgerReducer::new())
///     .with_env(helpers::test_env())
///     .given_state(LedgerState::new())
///     .given_actions(vec![create_hotel, create_room])
///     .when_action(LedgerAction::Assign { guest, container_id: room })
///     .then_state(|state| {
///         assert_eq!(state.container(room).unwrap().occupancy(), 1);
///     })
///     .then_effects(|effects| {
///         assert_eq!(effects.len(), 2);
///     })
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E, Err>
where
    R: Reducer<State = S, Action = A, Environment = E, Error = Err>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    setup: Vec<A>,
    action: Option<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion>,
    error_assertions: Vec<ErrorAssertion<Err>>,
}

impl<R, S, A, E, Err> ReducerTest<R, S, A, E, Err>
where
    R: Reducer<State = S, Action = A, Environment = E, Error = Err>,
    S: Clone,
    A: Clone,
    Err: std::fmt::Debug,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            setup: Vec::new(),
            action: None,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
            error_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Actions applied to the initial state before the action under test (Given)
    #[must_use]
    pub fn given_actions(mut self, actions: Vec<A>) -> Self {
        self.setup = actions;
        self
    }

    /// Set the action to test (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    ///
    /// After a rejected action this sees the state the action was rejected
    /// against.
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the resulting effects (Then)
    ///
    /// The action under test must succeed.
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the rejection (Then)
    ///
    /// The action under test must fail.
    #[must_use]
    pub fn then_error<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&Err) + 'static,
    {
        self.error_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set, if a setup
    /// action fails, if the outcome does not match the kind of assertions
    /// registered, or if any assertion fails.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        let action = self.action.expect("Action must be set with when_action()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        for (index, setup) in self.setup.into_iter().enumerate() {
            if let Err(error) = self.reducer.reduce(&mut state, setup, &env) {
                panic!("Setup action {index} was rejected: {error:?}");
            }
        }

        let result = self.reducer.reduce(&mut state, action, &env);

        match result {
            Ok(effects) => {
                assert!(
                    self.error_assertions.is_empty(),
                    "Expected the action to be rejected, but it produced {} effects",
                    effects.len()
                );
                for assertion in self.state_assertions {
                    assertion(&state);
                }
                for assertion in self.effect_assertions {
                    assertion(&effects);
                }
            }
            Err(error) => {
                assert!(
                    self.effect_assertions.is_empty(),
                    "Expected effects, but the action was rejected: {error:?}"
                );
                for assertion in self.state_assertions {
                    assertion(&state);
                }
                for assertion in self.error_assertions {
                    assertion(&error);
                }
            }
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use wedplan_core::effect::Effect;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if effects is not empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects(effects: &[Effect]) {
        assert!(
            effects.is_empty(),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count(effects: &[Effect], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that effects contain a backward-reference write
    ///
    /// # Panics
    ///
    /// Panics if no `SetBackref` or `ClearBackref` effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_backref_effect(effects: &[Effect]) {
        assert!(
            effects.iter().any(|e| matches!(
                e,
                Effect::SetBackref { .. } | Effect::ClearBackref { .. }
            )),
            "Expected a backref effect, but none found: {effects:?}"
        );
    }

    /// Assert that effects contain a seat record write
    ///
    /// # Panics
    ///
    /// Panics if no `RecordSeat` or `RemoveSeat` effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_seat_effect(effects: &[Effect]) {
        assert!(
            effects
                .iter()
                .any(|e| matches!(e, Effect::RecordSeat(_) | Effect::RemoveSeat(_))),
            "Expected a seat effect, but none found: {effects:?}"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::helpers;
    use wedplan_core::error::AssignmentError;
    use wedplan_core::ledger::{LedgerAction, LedgerReducer, LedgerState};
    use wedplan_core::types::ResourceCategory;

    #[test]
    fn assign_to_room_writes_occupants_and_backref() {
        let (hotel, create_hotel) = helpers::create_parent(ResourceCategory::Room, "Grand Hotel");
        let (room, create_room) = helpers::create_container(hotel, "101", Some(2));
        let jane = helpers::attending("Jane", "Doe");
        let jane_id = jane.id;

        ReducerTest::new(LedgerReducer::new())
            .with_env(helpers::test_env())
            .given_state(LedgerState::new())
            .given_actions(vec![create_hotel, create_room])
            .when_action(LedgerAction::Assign {
                guest: jane,
                container_id: room,
            })
            .then_state(move |state| {
                assert_eq!(state.container(room).unwrap().occupants, vec![jane_id]);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 2);
                assertions::assert_has_backref_effect(effects);
            })
            .run();
    }

    #[test]
    fn assign_to_full_table_is_rejected() {
        let (event, create_event) = helpers::create_parent(ResourceCategory::Table, "Reception");
        let (table, create_table) = helpers::create_container(event, "Rose", Some(1));
        let seated = helpers::attending("Jane", "Doe");
        let late = helpers::attending("John", "Smith");

        ReducerTest::new(LedgerReducer::new())
            .with_env(helpers::test_env())
            .given_state(LedgerState::new())
            .given_actions(vec![
                create_event,
                create_table,
                LedgerAction::Assign {
                    guest: seated,
                    container_id: table,
                },
            ])
            .when_action(LedgerAction::Assign {
                guest: late,
                container_id: table,
            })
            .then_state(move |state| {
                assert_eq!(state.container(table).unwrap().occupancy(), 1);
            })
            .then_error(|error| {
                assert!(matches!(error, AssignmentError::CapacityExceeded { .. }));
            })
            .run();
    }

    #[test]
    fn unassign_of_unknown_guest_has_no_effects() {
        let (event, create_event) = helpers::create_parent(ResourceCategory::Table, "Reception");
        let (table, create_table) = helpers::create_container(event, "Rose", None);

        ReducerTest::new(LedgerReducer::new())
            .with_env(helpers::test_env())
            .given_state(LedgerState::new())
            .given_actions(vec![create_event, create_table])
            .when_action(helpers::unassign(helpers::attending("A", "B").id, table))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn seat_effects_are_recognised() {
        let (event, create_event) = helpers::create_parent(ResourceCategory::Table, "Reception");
        let (table, create_table) = helpers::create_container(event, "Rose", None);

        ReducerTest::new(LedgerReducer::new())
            .with_env(helpers::test_env())
            .given_state(LedgerState::new())
            .given_actions(vec![create_event, create_table])
            .when_action(LedgerAction::Assign {
                guest: helpers::pending("Jane", "Doe"),
                container_id: table,
            })
            .then_effects(assertions::assert_has_seat_effect)
            .run();
    }
}
