//! Async contracts for the collaborators of the swap workflow.

use crate::{CommitOutcome, SwapCommit};
use ::async_trait::async_trait;
use chrono::NaiveDate;
use roster_core::{
    Agent, AgentId, AuditEntry, DateRange, Role, RosterResult, ShiftId, ShiftRecord, SwapId,
    SwapRequest, SwapStatus,
};

/// Read access to accounts. The workflow never writes to the directory.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Get an account by ID, active or not.
    async fn get_agent(&self, id: AgentId) -> RosterResult<Option<Agent>>;

    /// Active accounts, optionally restricted to one role, sorted by last
    /// then first name.
    async fn list_active_agents(&self, role: Option<Role>) -> RosterResult<Vec<Agent>>;
}

/// Date-keyed shift records, one per (agent, date).
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Get the record of an agent for a date.
    async fn shift_get(&self, agent_id: AgentId, date: NaiveDate)
        -> RosterResult<Option<ShiftRecord>>;

    /// Get a record by ID.
    async fn shift_get_by_id(&self, id: ShiftId) -> RosterResult<Option<ShiftRecord>>;

    /// Insert or replace the record for `(record.agent_id, record.date)`.
    ///
    /// When a record already exists for that key it keeps its ID and
    /// creation time and takes the supplied content. Returns the stored record.
    async fn shift_save(&self, record: &ShiftRecord) -> RosterResult<ShiftRecord>;

    /// Records of an agent within a range, oldest date first.
    async fn shift_list_by_agent(
        &self,
        agent_id: AgentId,
        range: DateRange,
    ) -> RosterResult<Vec<ShiftRecord>>;
}

/// Pre-filter pushed down to the ledger when listing requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwapQuery {
    /// Only requests where this agent is requester or recipient.
    pub involving: Option<AgentId>,
    pub status: Option<SwapStatus>,
    /// Creation day range.
    pub created: DateRange,
}

/// Swap requests and their audit trail.
#[async_trait]
pub trait SwapLedger: Send + Sync {
    async fn swap_get(&self, id: SwapId) -> RosterResult<Option<SwapRequest>>;

    /// Requests matching the query, newest first.
    async fn swap_list(&self, query: SwapQuery) -> RosterResult<Vec<SwapRequest>>;

    /// Audit entries of a request, newest first.
    async fn audit_list(&self, swap_id: SwapId) -> RosterResult<Vec<AuditEntry>>;

    /// Check every guard of `commit` and apply it as one unit.
    ///
    /// Guard failures map to `StorageError::UniqueViolation` (active pair
    /// taken), `StatusConflict`, `OwnershipChanged` and `NotFound`. A failed
    /// commit leaves the store untouched.
    async fn commit(&self, commit: SwapCommit) -> RosterResult<CommitOutcome>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> RosterResult<()> {
        Ok(())
    }
}

/// Everything the swap service needs from a backend.
pub trait RosterStore: Directory + ScheduleStore + SwapLedger {}

impl<T> RosterStore for T where T: Directory + ScheduleStore + SwapLedger {}
