//! The assignment ledger shell.

use crate::metrics::LedgerMetrics;
use crate::outcome::{
    OverCapacityAfterEdit, ReassignError, ResizeOutcome, WriteMode, WriteOutcome,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use wedplan_core::capacity::{self, OccupancyStatus};
use wedplan_core::effect::{Effect, Effects};
use wedplan_core::error::{AssignmentError, Missing, RemoteWriteFailure};
use wedplan_core::export::{OccupancyRow, occupancy_rows, to_csv};
use wedplan_core::ids::{ContainerId, GuestId, ParentId};
use wedplan_core::ledger::{LedgerAction, LedgerEnvironment, LedgerReducer, LedgerState};
use wedplan_core::reducer::Reducer;
use wedplan_core::store::{GuestDirectory, PersistentStore, StoreError};
use wedplan_core::types::{Container, Guest, ResourceCategory};

/// Read-through/write-through cache of the assignment ledger for one planner
/// session.
///
/// Every mutation runs the [`LedgerReducer`] against the local [`LedgerState`] and
/// then issues the resulting writes to the [`PersistentStore`] and
/// [`GuestDirectory`] according to the configured [`WriteMode`].
///
/// No lock or version token guards the remote store. Two ledgers over the same
/// store can both pass the capacity check and together overshoot a container.
///
/// # Example
///
/// ```ignore
/// let ledger = AssignmentLedger::load(store, directory, env, WriteMode::Optimistic).await?;
///
/// let (hotel, _) = ledger.create_parent(ResourceCategory::Room, "Grand Hotel").await?;
/// let (room, _) = ledger.create_container(hotel, "101", "Double", Some(2)).await?;
/// let outcome = ledger.assign(guest_id, room).await?;
/// assert!(outcome.is_committed());
/// ```
pub struct AssignmentLedger {
    state: Arc<RwLock<LedgerState>>,
    reducer: LedgerReducer,
    env: LedgerEnvironment,
    store: Arc<dyn PersistentStore>,
    directory: Arc<dyn GuestDirectory>,
    mode: WriteMode,
}

impl AssignmentLedger {
    /// Create a ledger with empty local state.
    #[must_use]
    pub fn new(
        store: Arc<dyn PersistentStore>,
        directory: Arc<dyn GuestDirectory>,
        env: LedgerEnvironment,
        mode: WriteMode,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(LedgerState::new())),
            reducer: LedgerReducer::new(),
            env,
            store,
            directory,
            mode,
        }
    }

    /// Create a ledger and fill its local state from the store.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentError::Store`] if any read fails.
    pub async fn load(
        store: Arc<dyn PersistentStore>,
        directory: Arc<dyn GuestDirectory>,
        env: LedgerEnvironment,
        mode: WriteMode,
    ) -> Result<Self, AssignmentError> {
        let ledger = Self::new(store, directory, env, mode);
        ledger.reload().await?;
        Ok(ledger)
    }

    /// Replace the local state with a fresh read of the store.
    ///
    /// This is the only way to resolve divergence left by failed remote writes.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentError::Store`] if any read fails; the local state is then
    /// left as it was.
    pub async fn reload(&self) -> Result<(), AssignmentError> {
        let parents = self.store.list_parents().await.map_err(AssignmentError::Store)?;

        let mut containers = Vec::new();
        let mut seats = Vec::new();
        for parent in &parents {
            containers.extend(
                self.store
                    .list_containers(parent.id)
                    .await
                    .map_err(AssignmentError::Store)?,
            );
            if parent.category == ResourceCategory::Table {
                seats.extend(
                    self.store
                        .list_table_assignments(parent.id)
                        .await
                        .map_err(AssignmentError::Store)?,
                );
            }
        }

        tracing::debug!(
            parents = parents.len(),
            containers = containers.len(),
            seats = seats.len(),
            "Ledger reloaded from store"
        );
        *self.state.write().await = LedgerState::from_snapshot(parents, containers, seats);
        LedgerMetrics::record_reload();
        Ok(())
    }

    /// The configured write mode.
    #[must_use]
    pub const fn mode(&self) -> WriteMode {
        self.mode
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Create a hotel, route or event.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentError::RemoteWriteFailed`] in transactional mode when
    /// the store rejects the write.
    pub async fn create_parent(
        &self,
        category: ResourceCategory,
        name: impl Into<String>,
    ) -> Result<(ParentId, WriteOutcome), AssignmentError> {
        let id = ParentId::new();
        let outcome = self
            .dispatch(LedgerAction::CreateParent {
                id,
                category,
                name: name.into(),
            })
            .await?;
        Ok((id, outcome))
    }

    /// Create an empty container under a parent.
    ///
    /// `capacity` of `None` stores no capacity; the default of two applies.
    ///
    /// # Errors
    ///
    /// - [`AssignmentError::NotFound`] if the parent is unknown
    /// - [`AssignmentError::InvalidCapacity`] for a capacity of zero
    /// - [`AssignmentError::RemoteWriteFailed`] in transactional mode
    pub async fn create_container(
        &self,
        parent_id: ParentId,
        label: impl Into<String>,
        kind: impl Into<String>,
        capacity: Option<u32>,
    ) -> Result<(ContainerId, WriteOutcome), AssignmentError> {
        let id = ContainerId::new();
        let outcome = self
            .dispatch(LedgerAction::CreateContainer {
                id,
                parent_id,
                label: label.into(),
                kind: kind.into(),
                capacity,
            })
            .await?;
        Ok((id, outcome))
    }

    /// Unassign every occupant, then delete the container.
    ///
    /// # Errors
    ///
    /// - [`AssignmentError::NotFound`] if the container is unknown
    /// - [`AssignmentError::RemoteWriteFailed`] in transactional mode
    pub async fn delete_container(
        &self,
        container_id: ContainerId,
    ) -> Result<WriteOutcome, AssignmentError> {
        let outcome = self
            .dispatch(LedgerAction::DeleteContainer { container_id })
            .await?;
        LedgerMetrics::record_container_deleted(1);
        Ok(outcome)
    }

    /// Delete every child container (drain first), then the parent.
    ///
    /// # Errors
    ///
    /// - [`AssignmentError::NotFound`] if the parent is unknown
    /// - [`AssignmentError::RemoteWriteFailed`] in transactional mode
    pub async fn delete_parent(&self, parent_id: ParentId) -> Result<WriteOutcome, AssignmentError> {
        let children = self.state.read().await.containers_of(parent_id).len();
        let outcome = self.dispatch(LedgerAction::DeleteParent { parent_id }).await?;
        LedgerMetrics::record_container_deleted(children);
        Ok(outcome)
    }

    /// Change a container's capacity.
    ///
    /// Lowering capacity below the current occupancy is allowed and evicts no one;
    /// the result carries an [`OverCapacityAfterEdit`] warning instead.
    ///
    /// # Errors
    ///
    /// - [`AssignmentError::NotFound`] if the container is unknown
    /// - [`AssignmentError::InvalidCapacity`] for a capacity of zero
    /// - [`AssignmentError::RemoteWriteFailed`] in transactional mode
    pub async fn resize(
        &self,
        container_id: ContainerId,
        capacity: u32,
    ) -> Result<ResizeOutcome, AssignmentError> {
        let outcome = self
            .dispatch(LedgerAction::Resize {
                container_id,
                capacity,
            })
            .await?;

        let state = self.state.read().await;
        let warning = state
            .container(container_id)
            .filter(|c| capacity::is_over_capacity(c))
            .map(|c| OverCapacityAfterEdit {
                container_id,
                capacity: c.effective_capacity(),
                occupancy: c.occupancy(),
            });
        LedgerMetrics::record_over_capacity(
            state
                .all_containers()
                .into_iter()
                .filter(|c| capacity::is_over_capacity(c))
                .count(),
        );

        Ok(ResizeOutcome { outcome, warning })
    }

    // ------------------------------------------------------------------------
    // Assignment
    // ------------------------------------------------------------------------

    /// Place a guest in a container.
    ///
    /// If the guest already holds another container in the same scope (the same
    /// category, or the same event for tables) that assignment is moved, but only
    /// after the capacity check on the target has passed.
    ///
    /// # Errors
    ///
    /// - [`AssignmentError::NotFound`] if the guest or container is unknown
    /// - [`AssignmentError::CapacityExceeded`] if the container is full (nothing changes)
    /// - [`AssignmentError::Directory`] if the guest lookup fails
    /// - [`AssignmentError::RemoteWriteFailed`] in transactional mode
    pub async fn assign(
        &self,
        guest_id: GuestId,
        container_id: ContainerId,
    ) -> Result<WriteOutcome, AssignmentError> {
        let guest = self.guest(guest_id).await?;

        match self
            .dispatch(LedgerAction::Assign {
                guest,
                container_id,
            })
            .await
        {
            Ok(outcome) => {
                LedgerMetrics::record_assign();
                Ok(outcome)
            }
            Err(error) => {
                if let AssignmentError::CapacityExceeded { category, .. } = &error {
                    LedgerMetrics::record_capacity_rejection(category.as_str());
                }
                Err(error)
            }
        }
    }

    /// Remove a guest from a container.
    ///
    /// Unknown guests, unknown containers and guests not in the container are a
    /// no-op, so calling this twice is the same as calling it once.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentError::RemoteWriteFailed`] in transactional mode only.
    pub async fn unassign(
        &self,
        guest_id: GuestId,
        container_id: ContainerId,
    ) -> Result<WriteOutcome, AssignmentError> {
        let (outcome, writes) = self
            .dispatch_counted(LedgerAction::Unassign {
                guest_id,
                container_id,
            })
            .await?;
        if writes > 0 {
            LedgerMetrics::record_unassign();
        }
        Ok(outcome)
    }

    /// Move a guest: unassign from `from`, then assign to `to`.
    ///
    /// The unassign is applied first and is not undone. If `to` is full the guest
    /// ends up unassigned and the capacity error is returned alongside the
    /// outcome of the unassign, so pending writes can still be flushed and
    /// failed ones seen.
    ///
    /// # Errors
    ///
    /// Returns [`ReassignError`] carrying the assign (or unassign) error and the
    /// released outcome.
    pub async fn reassign(
        &self,
        guest_id: GuestId,
        from: ContainerId,
        to: ContainerId,
    ) -> Result<WriteOutcome, ReassignError> {
        let released = self
            .unassign(guest_id, from)
            .await
            .map_err(|error| ReassignError {
                released: WriteOutcome::Committed,
                error,
            })?;

        match self.assign(guest_id, to).await {
            Ok(placed) => Ok(released.merge(placed)),
            Err(error) => {
                tracing::warn!(
                    guest_id = %guest_id,
                    from = %from,
                    to = %to,
                    error = %error,
                    release_pending = !released.pending().is_empty(),
                    release_diverged = released.is_diverged(),
                    "Reassign left guest unassigned"
                );
                Err(ReassignError { released, error })
            }
        }
    }

    /// Issue writes returned in [`WriteOutcome::Pending`].
    pub async fn flush(&self, effects: Effects) -> WriteOutcome {
        self.execute_all(&effects).await
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// A copy of the local state.
    pub async fn snapshot(&self) -> LedgerState {
        self.state.read().await.clone()
    }

    /// Look up a container in the local state.
    pub async fn container(&self, id: ContainerId) -> Option<Container> {
        self.state.read().await.container(id).cloned()
    }

    /// Containers of a parent, oldest first.
    pub async fn containers_of(&self, parent_id: ParentId) -> Vec<Container> {
        self.state
            .read()
            .await
            .containers_of(parent_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Occupancy state of a container.
    pub async fn occupancy_status(&self, id: ContainerId) -> Option<OccupancyStatus> {
        self.state
            .read()
            .await
            .container(id)
            .map(capacity::occupancy_status)
    }

    /// Eligible guests with no container in the scope, in directory order.
    ///
    /// `scope` selects the event for tables and is ignored otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentError::Directory`] if the guest list cannot be read.
    pub async fn unassigned(
        &self,
        category: ResourceCategory,
        scope: Option<ParentId>,
    ) -> Result<Vec<Guest>, AssignmentError> {
        let guests = self
            .directory
            .list_eligible(category)
            .await
            .map_err(AssignmentError::Directory)?;
        let state = self.state.read().await;
        Ok(state.unassigned(&guests, category, scope, |guest| category.admits(guest)))
    }

    /// One export row per container.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentError::Directory`] if an occupant lookup fails.
    pub async fn export_rows(&self) -> Result<Vec<OccupancyRow>, AssignmentError> {
        let state = self.snapshot().await;

        let mut names: HashMap<GuestId, String> = HashMap::new();
        for container in state.all_containers() {
            for guest_id in &container.occupants {
                if names.contains_key(guest_id) {
                    continue;
                }
                if let Some(guest) = self
                    .directory
                    .get(*guest_id)
                    .await
                    .map_err(AssignmentError::Directory)?
                {
                    names.insert(*guest_id, guest.full_name());
                }
            }
        }

        Ok(occupancy_rows(&state, |id| names.get(&id).cloned()))
    }

    /// The export rendered as CSV.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentError::Directory`] if an occupant lookup fails.
    pub async fn export_csv(&self) -> Result<String, AssignmentError> {
        Ok(to_csv(&self.export_rows().await?))
    }

    // ------------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------------

    async fn guest(&self, guest_id: GuestId) -> Result<Guest, AssignmentError> {
        self.directory
            .get(guest_id)
            .await
            .map_err(AssignmentError::Directory)?
            .ok_or(AssignmentError::NotFound(Missing::Guest(guest_id)))
    }

    async fn dispatch(&self, action: LedgerAction) -> Result<WriteOutcome, AssignmentError> {
        self.dispatch_counted(action).await.map(|(outcome, _)| outcome)
    }

    /// Like [`Self::dispatch`], also reporting how many writes the reducer produced.
    async fn dispatch_counted(
        &self,
        action: LedgerAction,
    ) -> Result<(WriteOutcome, usize), AssignmentError> {
        match self.mode {
            WriteMode::Optimistic => {
                let effects = {
                    let mut state = self.state.write().await;
                    self.reducer.reduce(&mut state, action, &self.env)?
                };
                Ok((self.execute_all(&effects).await, effects.len()))
            }
            WriteMode::Deferred => {
                let effects = {
                    let mut state = self.state.write().await;
                    self.reducer.reduce(&mut state, action, &self.env)?
                };
                let count = effects.len();
                if effects.is_empty() {
                    Ok((WriteOutcome::Committed, count))
                } else {
                    Ok((WriteOutcome::Pending(effects), count))
                }
            }
            WriteMode::Transactional => {
                let mut state = self.state.write().await;
                let mut staged = state.clone();
                let effects = self.reducer.reduce(&mut staged, action, &self.env)?;

                for effect in &effects {
                    if let Err(error) = self.execute(effect).await {
                        LedgerMetrics::record_remote_failures(1);
                        tracing::error!(
                            effect = %effect,
                            error = %error,
                            "Remote write failed; local state not changed"
                        );
                        return Err(AssignmentError::RemoteWriteFailed(RemoteWriteFailure {
                            effect: effect.clone(),
                            error,
                        }));
                    }
                }

                *state = staged;
                Ok((WriteOutcome::Committed, effects.len()))
            }
        }
    }

    /// Issues every write in order. Failures are logged and collected; later
    /// writes are still attempted.
    async fn execute_all(&self, effects: &[Effect]) -> WriteOutcome {
        let mut failures = Vec::new();
        for effect in effects {
            if let Err(error) = self.execute(effect).await {
                tracing::error!(
                    effect = %effect,
                    error = %error,
                    "Remote write failed; local state has diverged from the store"
                );
                failures.push(RemoteWriteFailure {
                    effect: effect.clone(),
                    error,
                });
            }
        }

        if failures.is_empty() {
            WriteOutcome::Committed
        } else {
            LedgerMetrics::record_remote_failures(failures.len());
            WriteOutcome::Diverged(failures)
        }
    }

    async fn execute(&self, effect: &Effect) -> Result<(), StoreError> {
        match effect {
            Effect::CreateParent(parent) => self.store.create_parent(parent.clone()).await,
            Effect::DeleteParent(id) => self.store.delete_parent(*id).await,
            Effect::CreateContainer(container) => {
                self.store.create_container(container.clone()).await
            }
            Effect::UpdateContainer { id, patch } => {
                self.store.update_container(*id, patch.clone()).await
            }
            Effect::DeleteContainer(id) => self.store.delete_container(*id).await,
            Effect::SetBackref {
                guest_id,
                category,
                container_id,
            } => {
                self.directory
                    .update_backref(*guest_id, *category, Some(*container_id))
                    .await
            }
            Effect::ClearBackref {
                guest_id,
                category,
                container_id,
            } => {
                let points_here = self
                    .directory
                    .get(*guest_id)
                    .await?
                    .is_some_and(|guest| guest.backref(*category) == Some(*container_id));
                if points_here {
                    self.directory
                        .update_backref(*guest_id, *category, None)
                        .await
                } else {
                    Ok(())
                }
            }
            Effect::RecordSeat(seat) => self.store.record_table_assignment(seat.clone()).await,
            Effect::RemoveSeat(id) => self.store.remove_table_assignment(*id).await,
        }
    }
}

impl std::fmt::Debug for AssignmentLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssignmentLedger")
            .field("env", &self.env)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
