//! The unit of work handed to a ledger.
//!
//! A [`SwapCommit`] bundles the new swap request snapshot, the preconditions
//! the store must re-check while holding its lock or transaction, and the
//! effects to apply alongside the status change. Either every guard holds
//! and every write lands, or nothing changes.

use roster_core::{
    AgentId, ShiftId, ShiftRecord, SwapEffect, SwapRequest, SwapStatus, Transition,
};

/// Precondition on the stored swap request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordGuard {
    /// The request must not exist yet, and no other active request may
    /// cover the same unordered pair of shifts.
    New,
    /// The stored request must still have this status.
    Status(SwapStatus),
}

/// Precondition that a shift record still belongs to an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipGuard {
    pub shift_id: ShiftId,
    pub owner: AgentId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapCommit {
    pub record: SwapRequest,
    pub guard: RecordGuard,
    pub ownership: Vec<OwnershipGuard>,
    pub effects: Vec<SwapEffect>,
}

impl SwapCommit {
    /// Insert a freshly proposed request.
    pub fn create(record: SwapRequest) -> Self {
        let ownership = vec![
            OwnershipGuard {
                shift_id: record.requester_shift_id,
                owner: record.requester_id,
            },
            OwnershipGuard {
                shift_id: record.recipient_shift_id,
                owner: record.recipient_id,
            },
        ];
        Self {
            record,
            guard: RecordGuard::New,
            ownership,
            effects: Vec::new(),
        }
    }

    /// Persist a transition computed by the state machine.
    ///
    /// Every exchange effect adds ownership guards for both of its shifts.
    pub fn transition(transition: Transition) -> Self {
        let ownership = transition
            .effects
            .iter()
            .filter_map(|effect| match effect {
                SwapEffect::ExchangeShifts(exchange) => Some([
                    OwnershipGuard {
                        shift_id: exchange.requester_shift_id,
                        owner: exchange.requester_id,
                    },
                    OwnershipGuard {
                        shift_id: exchange.recipient_shift_id,
                        owner: exchange.recipient_id,
                    },
                ]),
                SwapEffect::AppendAudit(_) => None,
            })
            .flatten()
            .collect();

        Self {
            record: transition.next,
            guard: RecordGuard::Status(transition.previous),
            ownership,
            effects: transition.effects,
        }
    }
}

/// What a successful commit wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub record: SwapRequest,
    /// Shift records rewritten by an exchange, requester's first.
    pub shifts: Vec<ShiftRecord>,
}
