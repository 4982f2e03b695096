//! Swap service: resolves actors, runs the state machine and commits.

use crate::machine::{self, Proposal};
use chrono::Utc;
use roster_core::{
    Agent, AgentId, AgentResponse, AuditEntry, DateRange, EntityType, Role, RosterError,
    RosterResult, ShiftPair, ShiftRecord, StorageError, SupervisorDecision, SwapCommand,
    SwapDraft, SwapFilter, SwapId, SwapPolicy, SwapRequest, SwapStatistics, SwapStatus,
    ValidationError,
};
use roster_storage::{RosterStore, SwapCommit, SwapQuery};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Entry points of the swap workflow.
///
/// Every operation takes the caller's identifier; the service resolves it in
/// the directory and applies role and visibility rules before touching the
/// ledger.
#[derive(Clone)]
pub struct SwapService {
    store: Arc<dyn RosterStore>,
    policy: SwapPolicy,
}

impl SwapService {
    pub fn new(store: Arc<dyn RosterStore>, policy: SwapPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &SwapPolicy {
        &self.policy
    }

    /// Check that the backing store answers.
    pub async fn ping(&self) -> RosterResult<()> {
        self.store.ping().await
    }

    // ========================================================================
    // TRANSITIONS
    // ========================================================================

    /// Create a pending request from the caller to `draft.recipient_id`.
    pub async fn create_swap(&self, caller: AgentId, draft: SwapDraft) -> RosterResult<SwapRequest> {
        let requester = self.resolve_actor(caller).await?;
        if draft.recipient_id == requester.agent_id {
            return Err(ValidationError::SelfSwap.into());
        }

        let recipient = self
            .store
            .get_agent(draft.recipient_id)
            .await?
            .ok_or_else(|| unknown_reference(EntityType::Agent, draft.recipient_id.as_uuid()))?;
        let requester_shift = self
            .store
            .shift_get_by_id(draft.requester_shift_id)
            .await?
            .ok_or_else(|| {
                unknown_reference(EntityType::ShiftRecord, draft.requester_shift_id.as_uuid())
            })?;
        let recipient_shift = self
            .store
            .shift_get_by_id(draft.recipient_shift_id)
            .await?
            .ok_or_else(|| {
                unknown_reference(EntityType::ShiftRecord, draft.recipient_shift_id.as_uuid())
            })?;

        let request = machine::propose(
            Proposal {
                requester: &requester,
                recipient: &recipient,
                requester_shift: &requester_shift,
                recipient_shift: &recipient_shift,
            },
            draft.message,
            &self.policy,
            Utc::now(),
        )?;

        let pair = request.shift_pair();
        let outcome = self
            .store
            .commit(SwapCommit::create(request))
            .await
            .map_err(|err| creation_error(err, pair))?;

        info!(
            swap_id = %outcome.record.swap_id,
            requester = %outcome.record.requester_id,
            recipient = %outcome.record.recipient_id,
            "Swap request created"
        );
        Ok(outcome.record)
    }

    /// Recipient accepts or refuses a pending request.
    pub async fn agent_respond(
        &self,
        caller: AgentId,
        swap_id: SwapId,
        response: AgentResponse,
        comment: Option<String>,
    ) -> RosterResult<SwapRequest> {
        self.transition(caller, swap_id, SwapCommand::Respond { response, comment })
            .await
    }

    /// Supervisor validates (exchanging the shifts) or refuses an accepted request.
    pub async fn supervisor_decide(
        &self,
        caller: AgentId,
        swap_id: SwapId,
        decision: SupervisorDecision,
        comment: Option<String>,
    ) -> RosterResult<SwapRequest> {
        self.transition(caller, swap_id, SwapCommand::Decide { decision, comment })
            .await
    }

    /// Requester or an admin withdraws a non-terminal request.
    pub async fn cancel_swap(&self, caller: AgentId, swap_id: SwapId) -> RosterResult<SwapRequest> {
        self.transition(caller, swap_id, SwapCommand::Cancel).await
    }

    async fn transition(
        &self,
        caller: AgentId,
        swap_id: SwapId,
        command: SwapCommand,
    ) -> RosterResult<SwapRequest> {
        let actor = self.resolve_actor(caller).await?;
        if matches!(command, SwapCommand::Decide { .. }) && !actor.role.can_decide_swaps() {
            return Err(RosterError::forbidden(
                actor.agent_id,
                "decide on swap requests",
            ));
        }
        let request = self.load(swap_id).await?;
        let action = command.action_name();

        let transition = machine::apply(&request, command, &actor, &self.policy, Utc::now())?;
        let exchanged = transition.exchanges_shifts();

        match self.store.commit(SwapCommit::transition(transition)).await {
            Ok(outcome) => {
                info!(
                    swap_id = %swap_id,
                    action,
                    status = %outcome.record.status,
                    actor = %actor.agent_id,
                    exchanged,
                    "Swap request updated"
                );
                Ok(outcome.record)
            }
            Err(err) => Err(transition_error(err, swap_id, action)),
        }
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Fetch a request the caller can see.
    pub async fn get_swap(&self, caller: AgentId, swap_id: SwapId) -> RosterResult<SwapRequest> {
        let actor = self.resolve_actor(caller).await?;
        let request = self.load(swap_id).await?;
        if !request.is_visible_to(&actor) {
            debug!(swap_id = %swap_id, caller = %caller, "Swap request hidden from caller");
            return Err(RosterError::not_found(EntityType::SwapRequest, swap_id));
        }
        Ok(request)
    }

    /// Requests visible to the caller, newest first.
    pub async fn list_swaps(
        &self,
        caller: AgentId,
        filter: SwapFilter,
    ) -> RosterResult<Vec<SwapRequest>> {
        let actor = self.resolve_actor(caller).await?;
        let query = SwapQuery {
            involving: visibility_scope(&actor),
            status: filter.status,
            created: DateRange::unbounded(),
        };
        let requests = self.store.swap_list(query).await?;
        let visible: Vec<SwapRequest> = requests
            .into_iter()
            .filter(|request| filter.matches(request, &actor))
            .collect();
        debug!(caller = %caller, count = visible.len(), "Listed swap requests");
        Ok(visible)
    }

    /// Requests waiting on the caller's decision.
    ///
    /// Agents get the pending requests addressed to them, supervisors every
    /// accepted request, admins nothing.
    pub async fn list_actionable(&self, caller: AgentId) -> RosterResult<Vec<SwapRequest>> {
        let actor = self.resolve_actor(caller).await?;
        let query = match actor.role {
            Role::Agent => SwapQuery {
                involving: Some(actor.agent_id),
                status: Some(SwapStatus::Pending),
                created: DateRange::unbounded(),
            },
            Role::Supervisor => SwapQuery {
                involving: None,
                status: Some(SwapStatus::AgentAccepted),
                created: DateRange::unbounded(),
            },
            Role::Admin => return Ok(Vec::new()),
        };
        let requests = self.store.swap_list(query).await?;
        Ok(requests
            .into_iter()
            .filter(|request| match actor.role {
                Role::Agent => request.can_be_answered_by(actor.agent_id),
                Role::Supervisor => request.can_be_decided_by_supervisor(),
                Role::Admin => false,
            })
            .collect())
    }

    /// Audit trail of a visible request, newest first.
    pub async fn swap_history(
        &self,
        caller: AgentId,
        swap_id: SwapId,
    ) -> RosterResult<Vec<AuditEntry>> {
        let request = self.get_swap(caller, swap_id).await?;
        self.store.audit_list(request.swap_id).await
    }

    /// Statistics over the requests visible to the caller, created in `range`.
    pub async fn get_statistics(
        &self,
        caller: AgentId,
        range: DateRange,
    ) -> RosterResult<SwapStatistics> {
        range.validate()?;
        let actor = self.resolve_actor(caller).await?;
        let query = SwapQuery {
            involving: visibility_scope(&actor),
            status: None,
            created: range,
        };
        let requests = self.store.swap_list(query).await?;
        let visible: Vec<&SwapRequest> = requests
            .iter()
            .filter(|request| request.is_visible_to(&actor))
            .collect();
        Ok(SwapStatistics::compute(visible, range))
    }

    // ========================================================================
    // DIRECTORY AND SCHEDULE READS
    // ========================================================================

    /// Active accounts, optionally filtered by role.
    pub async fn list_active_agents(
        &self,
        caller: AgentId,
        role: Option<Role>,
    ) -> RosterResult<Vec<Agent>> {
        self.resolve_actor(caller).await?;
        self.store.list_active_agents(role).await
    }

    /// Shift records of an agent within a range, oldest first.
    pub async fn list_agent_shifts(
        &self,
        caller: AgentId,
        agent_id: AgentId,
        range: DateRange,
    ) -> RosterResult<Vec<ShiftRecord>> {
        range.validate()?;
        self.resolve_actor(caller).await?;
        if self.store.get_agent(agent_id).await?.is_none() {
            return Err(RosterError::not_found(EntityType::Agent, agent_id));
        }
        self.store.shift_list_by_agent(agent_id, range).await
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    async fn resolve_actor(&self, caller: AgentId) -> RosterResult<Agent> {
        let actor = self
            .store
            .get_agent(caller)
            .await?
            .ok_or_else(|| RosterError::not_found(EntityType::Agent, caller))?;
        if !actor.is_active {
            warn!(caller = %caller, "Deactivated account attempted an operation");
            return Err(RosterError::forbidden(caller, "act while deactivated"));
        }
        Ok(actor)
    }

    async fn load(&self, swap_id: SwapId) -> RosterResult<SwapRequest> {
        self.store
            .swap_get(swap_id)
            .await?
            .ok_or_else(|| RosterError::not_found(EntityType::SwapRequest, swap_id))
    }
}

fn visibility_scope(actor: &Agent) -> Option<AgentId> {
    if actor.role.sees_all_swaps() {
        None
    } else {
        Some(actor.agent_id)
    }
}

fn unknown_reference(entity_type: EntityType, id: uuid::Uuid) -> RosterError {
    ValidationError::UnknownReference { entity_type, id }.into()
}

/// Translate commit failures of a creation into input validation errors.
fn creation_error(err: RosterError, pair: ShiftPair) -> RosterError {
    match err {
        RosterError::Storage(StorageError::UniqueViolation { .. }) => {
            ValidationError::DuplicateActiveRequest {
                first: pair.low(),
                second: pair.high(),
            }
            .into()
        }
        RosterError::Storage(StorageError::OwnershipChanged {
            shift_id,
            expected,
            actual,
        }) => ValidationError::ShiftOwnershipMismatch {
            shift_id,
            expected,
            actual,
        }
        .into(),
        RosterError::Storage(StorageError::NotFound { entity_type, id }) => {
            unknown_reference(entity_type, id)
        }
        other => {
            log_storage_failure(&other);
            other
        }
    }
}

/// Translate commit failures of a transition into workflow errors.
fn transition_error(err: RosterError, swap_id: SwapId, action: &str) -> RosterError {
    match err {
        RosterError::Storage(StorageError::StatusConflict { actual, .. }) => {
            warn!(swap_id = %swap_id, action, status = %actual, "Lost a concurrent transition");
            RosterError::InvalidTransition {
                swap_id,
                status: actual,
                action: action.to_string(),
            }
        }
        RosterError::Storage(StorageError::OwnershipChanged {
            shift_id,
            expected,
            actual,
        }) => {
            warn!(
                swap_id = %swap_id,
                shift_id = %shift_id,
                expected = %expected,
                actual = %actual,
                "Shift ownership changed since the request was created"
            );
            RosterError::Inconsistency {
                swap_id,
                shift_id,
                expected,
                actual,
            }
        }
        RosterError::Storage(StorageError::NotFound { entity_type, id }) => {
            RosterError::NotFound { entity_type, id }
        }
        other => {
            log_storage_failure(&other);
            other
        }
    }
}

fn log_storage_failure(err: &RosterError) {
    if let RosterError::Storage(storage) = err {
        error!(error = %storage, "Swap commit failed");
    }
}
