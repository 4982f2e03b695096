//! In-memory store for tests and single-process deployments.

use crate::{
    CommitOutcome, Directory, OwnershipGuard, RecordGuard, ScheduleStore, SwapCommit, SwapLedger,
    SwapQuery,
};
use ::async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use roster_core::{
    exchange_content, Agent, AgentId, AuditEntry, DateRange, EntityType, Role, RosterResult,
    ShiftExchange, ShiftId, ShiftRecord, StorageError, SwapEffect, SwapId, SwapRequest,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Name of the constraint guarding the one-active-request-per-pair rule.
pub const ACTIVE_PAIR_CONSTRAINT: &str = "swap_requests_active_pair";

#[derive(Debug, Default)]
struct MemoryState {
    agents: HashMap<AgentId, Agent>,
    shifts: HashMap<ShiftId, ShiftRecord>,
    shift_index: HashMap<(AgentId, NaiveDate), ShiftId>,
    swaps: HashMap<SwapId, SwapRequest>,
    audit: Vec<AuditEntry>,
}

/// Store holding every map behind a single lock, so a commit's guards and
/// writes happen in one critical section.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a directory account.
    pub async fn insert_agent(&self, agent: Agent) {
        let mut state = self.state.write().await;
        state.agents.insert(agent.agent_id, agent);
    }

    pub async fn swap_count(&self) -> usize {
        self.state.read().await.swaps.len()
    }

    pub async fn audit_count(&self) -> usize {
        self.state.read().await.audit.len()
    }

    /// Remove every entity.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        *state = MemoryState::default();
    }
}

impl MemoryState {
    fn check_record_guard(&self, commit: &SwapCommit) -> RosterResult<()> {
        let record = &commit.record;
        match commit.guard {
            RecordGuard::New => {
                if self.swaps.contains_key(&record.swap_id) {
                    return Err(StorageError::InsertFailed {
                        entity_type: EntityType::SwapRequest,
                        reason: format!("{} already exists", record.swap_id),
                    }
                    .into());
                }
                let pair = record.shift_pair();
                if let Some(existing) = self
                    .swaps
                    .values()
                    .find(|swap| swap.is_active() && swap.shift_pair() == pair)
                {
                    return Err(StorageError::UniqueViolation {
                        constraint: ACTIVE_PAIR_CONSTRAINT.to_string(),
                        reason: format!("request {} is still {}", existing.swap_id, existing.status),
                    }
                    .into());
                }
            }
            RecordGuard::Status(expected) => {
                let current = self.swaps.get(&record.swap_id).ok_or(StorageError::NotFound {
                    entity_type: EntityType::SwapRequest,
                    id: record.swap_id.as_uuid(),
                })?;
                if current.status != expected {
                    return Err(StorageError::StatusConflict {
                        swap_id: record.swap_id,
                        expected,
                        actual: current.status,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    fn check_ownership(&self, guard: &OwnershipGuard) -> RosterResult<()> {
        let shift = self.shifts.get(&guard.shift_id).ok_or(StorageError::NotFound {
            entity_type: EntityType::ShiftRecord,
            id: guard.shift_id.as_uuid(),
        })?;
        if shift.agent_id != guard.owner {
            return Err(StorageError::OwnershipChanged {
                shift_id: guard.shift_id,
                expected: guard.owner,
                actual: shift.agent_id,
            }
            .into());
        }
        Ok(())
    }

    fn exchanged_pair(
        &self,
        exchange: &ShiftExchange,
        now: roster_core::Timestamp,
    ) -> RosterResult<(ShiftRecord, ShiftRecord)> {
        let lookup = |id: ShiftId| {
            self.shifts.get(&id).cloned().ok_or(StorageError::NotFound {
                entity_type: EntityType::ShiftRecord,
                id: id.as_uuid(),
            })
        };
        let mut requester_shift = lookup(exchange.requester_shift_id)?;
        let mut recipient_shift = lookup(exchange.recipient_shift_id)?;
        exchange_content(&mut requester_shift, &mut recipient_shift, now);
        Ok((requester_shift, recipient_shift))
    }
}

#[async_trait]
impl Directory for MemoryStore {
    async fn get_agent(&self, id: AgentId) -> RosterResult<Option<Agent>> {
        Ok(self.state.read().await.agents.get(&id).cloned())
    }

    async fn list_active_agents(&self, role: Option<Role>) -> RosterResult<Vec<Agent>> {
        let state = self.state.read().await;
        let mut agents: Vec<Agent> = state
            .agents
            .values()
            .filter(|agent| agent.is_active)
            .filter(|agent| role.map_or(true, |role| agent.role == role))
            .cloned()
            .collect();
        agents.sort_by(|a, b| {
            (&a.last_name, &a.first_name, &a.username).cmp(&(&b.last_name, &b.first_name, &b.username))
        });
        Ok(agents)
    }
}

#[async_trait]
impl ScheduleStore for MemoryStore {
    async fn shift_get(
        &self,
        agent_id: AgentId,
        date: NaiveDate,
    ) -> RosterResult<Option<ShiftRecord>> {
        let state = self.state.read().await;
        Ok(state
            .shift_index
            .get(&(agent_id, date))
            .and_then(|id| state.shifts.get(id))
            .cloned())
    }

    async fn shift_get_by_id(&self, id: ShiftId) -> RosterResult<Option<ShiftRecord>> {
        Ok(self.state.read().await.shifts.get(&id).cloned())
    }

    async fn shift_save(&self, record: &ShiftRecord) -> RosterResult<ShiftRecord> {
        let mut state = self.state.write().await;
        let key = (record.agent_id, record.date);
        let mut stored = record.clone();

        match state.shift_index.get(&key).copied() {
            Some(existing_id) => {
                if let Some(existing) = state.shifts.get(&existing_id) {
                    stored.shift_id = existing_id;
                    stored.created_at = existing.created_at;
                }
                if existing_id != record.shift_id {
                    // The supplied id is superseded by the natural key; drop any
                    // record it pointed to elsewhere.
                    if let Some(old) = state.shifts.remove(&record.shift_id) {
                        state.shift_index.remove(&(old.agent_id, old.date));
                    }
                }
            }
            None => {
                // Moving an existing record to a new owner or date frees its old key.
                if let Some(old) = state.shifts.get(&record.shift_id) {
                    let old_key = (old.agent_id, old.date);
                    state.shift_index.remove(&old_key);
                }
            }
        }

        stored.updated_at = Utc::now();
        state.shift_index.insert(key, stored.shift_id);
        state.shifts.insert(stored.shift_id, stored.clone());
        Ok(stored)
    }

    async fn shift_list_by_agent(
        &self,
        agent_id: AgentId,
        range: DateRange,
    ) -> RosterResult<Vec<ShiftRecord>> {
        let state = self.state.read().await;
        let mut shifts: Vec<ShiftRecord> = state
            .shifts
            .values()
            .filter(|shift| shift.agent_id == agent_id && range.contains_date(shift.date))
            .cloned()
            .collect();
        shifts.sort_by_key(|shift| shift.date);
        Ok(shifts)
    }
}

#[async_trait]
impl SwapLedger for MemoryStore {
    async fn swap_get(&self, id: SwapId) -> RosterResult<Option<SwapRequest>> {
        Ok(self.state.read().await.swaps.get(&id).cloned())
    }

    async fn swap_list(&self, query: SwapQuery) -> RosterResult<Vec<SwapRequest>> {
        let state = self.state.read().await;
        let mut swaps: Vec<SwapRequest> = state
            .swaps
            .values()
            .filter(|swap| query.involving.map_or(true, |agent| swap.involves(agent)))
            .filter(|swap| query.status.map_or(true, |status| swap.status == status))
            .filter(|swap| query.created.contains(swap.created_at))
            .cloned()
            .collect();
        swaps.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.swap_id.cmp(&a.swap_id))
        });
        Ok(swaps)
    }

    async fn audit_list(&self, swap_id: SwapId) -> RosterResult<Vec<AuditEntry>> {
        let state = self.state.read().await;
        let mut entries: Vec<AuditEntry> = state
            .audit
            .iter()
            .filter(|entry| entry.swap_id == swap_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.entry_id.cmp(&a.entry_id))
        });
        Ok(entries)
    }

    async fn commit(&self, commit: SwapCommit) -> RosterResult<CommitOutcome> {
        let mut state = self.state.write().await;

        // Validate everything before the first write.
        state.check_record_guard(&commit)?;
        for guard in &commit.ownership {
            state.check_ownership(guard)?;
        }
        let now = commit.record.updated_at;
        let mut rewritten = Vec::new();
        let mut audit = Vec::new();
        for effect in &commit.effects {
            match effect {
                SwapEffect::ExchangeShifts(exchange) => {
                    let (first, second) = state.exchanged_pair(exchange, now)?;
                    rewritten.push(first);
                    rewritten.push(second);
                }
                SwapEffect::AppendAudit(entry) => audit.push(entry.clone()),
            }
        }

        for shift in &rewritten {
            state.shifts.insert(shift.shift_id, shift.clone());
        }
        state.audit.extend(audit);
        state
            .swaps
            .insert(commit.record.swap_id, commit.record.clone());

        Ok(CommitOutcome {
            record: commit.record,
            shifts: rewritten,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use roster_core::{ServiceType, SwapDraft};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        /// Whatever order creations arrive in, each unordered pair of shifts
        /// holds at most one active request.
        #[test]
        fn prop_one_active_request_per_pair(
            attempts in proptest::collection::vec((0usize..4, 0usize..4, any::<bool>()), 1..20),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("runtime");
            runtime.block_on(async {
                let store = MemoryStore::new();
                let a = AgentId::now_v7();
                let b = AgentId::now_v7();
                let date = NaiveDate::from_ymd_opt(2025, 6, 24).expect("valid date");
                let mut a_shifts = Vec::new();
                let mut b_shifts = Vec::new();
                for offset in 0..4u64 {
                    let day = date + chrono::Days::new(offset);
                    a_shifts.push(store.shift_save(&ShiftRecord::new(a, day, ServiceType::Morning)).await.expect("save"));
                    b_shifts.push(store.shift_save(&ShiftRecord::new(b, day, ServiceType::Night)).await.expect("save"));
                }

                for (i, j, reversed) in attempts {
                    let (requester, recipient, own, theirs) = if reversed {
                        (b, a, &b_shifts[j], &a_shifts[i])
                    } else {
                        (a, b, &a_shifts[i], &b_shifts[j])
                    };
                    let request = SwapRequest::pending(
                        requester,
                        SwapDraft {
                            recipient_id: recipient,
                            requester_shift_id: own.shift_id,
                            recipient_shift_id: theirs.shift_id,
                            message: None,
                        },
                        Utc::now(),
                    );
                    let _ = store.commit(SwapCommit::create(request)).await;
                }

                let active: Vec<SwapRequest> = store
                    .swap_list(SwapQuery::default())
                    .await
                    .expect("list")
                    .into_iter()
                    .filter(SwapRequest::is_active)
                    .collect();
                let mut pairs: Vec<_> = active.iter().map(SwapRequest::shift_pair).collect();
                let before = pairs.len();
                pairs.sort();
                pairs.dedup();
                prop_assert_eq!(pairs.len(), before);
                Ok(())
            })?;
        }
    }
}
