//! Swap requests and the effects of their transitions

use crate::{Agent, AgentId, AuditEntry, EnumParseError, Role, ShiftId, SwapId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// STATUS
// ============================================================================

/// Status of a swap request.
///
/// ```text
/// pending -> agent_accepted -> supervisor_validated
///    |              |-> supervisor_refused
///    |              `-> cancelled
///    |-> agent_refused
///    `-> cancelled
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum SwapStatus {
    /// Waiting for the recipient's answer
    #[default]
    Pending,
    /// Recipient accepted, waiting for a supervisor
    AgentAccepted,
    /// Recipient refused (terminal)
    AgentRefused,
    /// Supervisor validated and the shifts were exchanged (terminal)
    SupervisorValidated,
    /// Supervisor refused (terminal)
    SupervisorRefused,
    /// Withdrawn by the requester or an admin (terminal)
    Cancelled,
}

impl SwapStatus {
    pub const ALL: [SwapStatus; 6] = [
        SwapStatus::Pending,
        SwapStatus::AgentAccepted,
        SwapStatus::AgentRefused,
        SwapStatus::SupervisorValidated,
        SwapStatus::SupervisorRefused,
        SwapStatus::Cancelled,
    ];

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            SwapStatus::Pending => "pending",
            SwapStatus::AgentAccepted => "agent_accepted",
            SwapStatus::AgentRefused => "agent_refused",
            SwapStatus::SupervisorValidated => "supervisor_validated",
            SwapStatus::SupervisorRefused => "supervisor_refused",
            SwapStatus::Cancelled => "cancelled",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(SwapStatus::Pending),
            "agent_accepted" => Ok(SwapStatus::AgentAccepted),
            "agent_refused" => Ok(SwapStatus::AgentRefused),
            "supervisor_validated" => Ok(SwapStatus::SupervisorValidated),
            "supervisor_refused" => Ok(SwapStatus::SupervisorRefused),
            "cancelled" => Ok(SwapStatus::Cancelled),
            _ => Err(EnumParseError::new("swap status", s)),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SwapStatus::Pending => "Awaiting response",
            SwapStatus::AgentAccepted => "Accepted by agent",
            SwapStatus::AgentRefused => "Refused by agent",
            SwapStatus::SupervisorValidated => "Validated by supervisor",
            SwapStatus::SupervisorRefused => "Refused by supervisor",
            SwapStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SwapStatus::AgentRefused
                | SwapStatus::SupervisorValidated
                | SwapStatus::SupervisorRefused
                | SwapStatus::Cancelled
        )
    }

    /// Statuses that block a second request on the same pair of shifts.
    pub fn is_active(&self) -> bool {
        matches!(self, SwapStatus::Pending | SwapStatus::AgentAccepted)
    }
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for SwapStatus {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

// ============================================================================
// COMMANDS
// ============================================================================

/// Recipient's answer to a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum AgentResponse {
    #[serde(alias = "accepter")]
    Accept,
    #[serde(alias = "refuser")]
    Refuse,
}

/// Supervisor's decision on an accepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum SupervisorDecision {
    #[serde(alias = "valider")]
    Validate,
    #[serde(alias = "refuser")]
    Refuse,
}

/// A transition attempted on an existing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapCommand {
    Respond {
        response: AgentResponse,
        comment: Option<String>,
    },
    Decide {
        decision: SupervisorDecision,
        comment: Option<String>,
    },
    Cancel,
}

impl SwapCommand {
    /// Short verb used in errors and logs.
    pub fn action_name(&self) -> &'static str {
        match self {
            SwapCommand::Respond {
                response: AgentResponse::Accept,
                ..
            } => "accept",
            SwapCommand::Respond {
                response: AgentResponse::Refuse,
                ..
            } => "refuse",
            SwapCommand::Decide {
                decision: SupervisorDecision::Validate,
                ..
            } => "validate",
            SwapCommand::Decide {
                decision: SupervisorDecision::Refuse,
                ..
            } => "supervisor-refuse",
            SwapCommand::Cancel => "cancel",
        }
    }
}

/// Caller input for a new request. The requester is the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SwapDraft {
    pub recipient_id: AgentId,
    pub requester_shift_id: ShiftId,
    pub recipient_shift_id: ShiftId,
    #[serde(default)]
    pub message: Option<String>,
}

// ============================================================================
// REQUEST
// ============================================================================

/// Unordered pair of shift ids; `(a, b)` and `(b, a)` compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShiftPair {
    low: ShiftId,
    high: ShiftId,
}

impl ShiftPair {
    pub fn new(a: ShiftId, b: ShiftId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn low(&self) -> ShiftId {
        self.low
    }

    pub fn high(&self) -> ShiftId {
        self.high
    }
}

/// A proposal to exchange the content of two agents' shift records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SwapRequest {
    pub swap_id: SwapId,
    pub requester_id: AgentId,
    pub recipient_id: AgentId,
    pub requester_shift_id: ShiftId,
    pub recipient_shift_id: ShiftId,
    pub status: SwapStatus,
    /// Requester's rationale.
    pub message: Option<String>,
    pub recipient_comment: Option<String>,
    pub supervisor_comment: Option<String>,
    pub supervisor_id: Option<AgentId>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub responded_at: Option<Timestamp>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub decided_at: Option<Timestamp>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub cancelled_at: Option<Timestamp>,
}

impl SwapRequest {
    /// Build a pending request from an already validated draft.
    pub fn pending(requester_id: AgentId, draft: SwapDraft, now: Timestamp) -> Self {
        Self {
            swap_id: SwapId::now_v7(),
            requester_id,
            recipient_id: draft.recipient_id,
            requester_shift_id: draft.requester_shift_id,
            recipient_shift_id: draft.recipient_shift_id,
            status: SwapStatus::Pending,
            message: draft.message,
            recipient_comment: None,
            supervisor_comment: None,
            supervisor_id: None,
            created_at: now,
            updated_at: now,
            responded_at: None,
            decided_at: None,
            cancelled_at: None,
        }
    }

    pub fn shift_pair(&self) -> ShiftPair {
        ShiftPair::new(self.requester_shift_id, self.recipient_shift_id)
    }

    pub fn involves(&self, agent_id: AgentId) -> bool {
        self.requester_id == agent_id || self.recipient_id == agent_id
    }

    /// Agents see the requests they are party to; supervisors and admins see all.
    pub fn is_visible_to(&self, actor: &Agent) -> bool {
        match actor.role {
            Role::Admin | Role::Supervisor => true,
            Role::Agent => self.involves(actor.agent_id),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == SwapStatus::Pending
    }

    pub fn is_agent_accepted(&self) -> bool {
        self.status == SwapStatus::AgentAccepted
    }

    pub fn is_validated(&self) -> bool {
        self.status == SwapStatus::SupervisorValidated
    }

    pub fn is_refused(&self) -> bool {
        matches!(
            self.status,
            SwapStatus::AgentRefused | SwapStatus::SupervisorRefused
        )
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn can_be_answered_by(&self, agent_id: AgentId) -> bool {
        self.is_pending() && self.recipient_id == agent_id
    }

    pub fn can_be_decided_by_supervisor(&self) -> bool {
        self.is_agent_accepted()
    }
}

// ============================================================================
// EFFECTS
// ============================================================================

/// The two records whose content a validated request exchanges, with the
/// owners they must still have at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftExchange {
    pub requester_shift_id: ShiftId,
    pub requester_id: AgentId,
    pub recipient_shift_id: ShiftId,
    pub recipient_id: AgentId,
}

impl ShiftExchange {
    pub fn for_request(request: &SwapRequest) -> Self {
        Self {
            requester_shift_id: request.requester_shift_id,
            requester_id: request.requester_id,
            recipient_shift_id: request.recipient_shift_id,
            recipient_id: request.recipient_id,
        }
    }
}

/// Side effect of a transition, applied by the store in the same commit as
/// the status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapEffect {
    ExchangeShifts(ShiftExchange),
    AppendAudit(AuditEntry),
}

/// Output of the state machine for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub previous: SwapStatus,
    pub next: SwapRequest,
    pub effects: Vec<SwapEffect>,
}

impl Transition {
    pub fn exchanges_shifts(&self) -> bool {
        self.effects
            .iter()
            .any(|effect| matches!(effect, SwapEffect::ExchangeShifts(_)))
    }

    pub fn audit_entries(&self) -> impl Iterator<Item = &AuditEntry> {
        self.effects.iter().filter_map(|effect| match effect {
            SwapEffect::AppendAudit(entry) => Some(entry),
            SwapEffect::ExchangeShifts(_) => None,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn draft(recipient_id: AgentId) -> SwapDraft {
        SwapDraft {
            recipient_id,
            requester_shift_id: ShiftId::now_v7(),
            recipient_shift_id: ShiftId::now_v7(),
            message: Some("family event".to_string()),
        }
    }

    #[test]
    fn test_status_db_roundtrip() {
        for status in SwapStatus::ALL {
            assert_eq!(SwapStatus::from_db_str(status.as_db_str()), Ok(status));
            assert_eq!(status.to_string(), status.as_db_str());
        }
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&SwapStatus::SupervisorValidated).expect("serializable");
        assert_eq!(json, "\"supervisor_validated\"");
    }

    #[test]
    fn test_terminal_and_active_partition_statuses() {
        for status in SwapStatus::ALL {
            assert_ne!(status.is_terminal(), status.is_active(), "{status}");
        }
    }

    #[test]
    fn test_french_command_aliases() {
        let response: AgentResponse = serde_json::from_str("\"accepter\"").expect("alias");
        assert_eq!(response, AgentResponse::Accept);
        let decision: SupervisorDecision = serde_json::from_str("\"valider\"").expect("alias");
        assert_eq!(decision, SupervisorDecision::Validate);
    }

    #[test]
    fn test_shift_pair_is_unordered() {
        let a = ShiftId::now_v7();
        let b = ShiftId::now_v7();
        assert_eq!(ShiftPair::new(a, b), ShiftPair::new(b, a));
        assert_eq!(ShiftPair::new(b, a).low(), a);
    }

    #[test]
    fn test_visibility() {
        let requester = Agent::new("a", Role::Agent);
        let recipient = Agent::new("b", Role::Agent);
        let bystander = Agent::new("c", Role::Agent);
        let supervisor = Agent::new("s", Role::Supervisor);
        let admin = Agent::new("root", Role::Admin);

        let request = SwapRequest::pending(requester.agent_id, draft(recipient.agent_id), Utc::now());

        assert!(request.is_visible_to(&requester));
        assert!(request.is_visible_to(&recipient));
        assert!(!request.is_visible_to(&bystander));
        assert!(request.is_visible_to(&supervisor));
        assert!(request.is_visible_to(&admin));
    }

    #[test]
    fn test_predicates_follow_status() {
        let recipient = AgentId::now_v7();
        let mut request = SwapRequest::pending(AgentId::now_v7(), draft(recipient), Utc::now());
        assert!(request.can_be_answered_by(recipient));
        assert!(!request.can_be_decided_by_supervisor());

        request.status = SwapStatus::AgentAccepted;
        assert!(!request.can_be_answered_by(recipient));
        assert!(request.can_be_decided_by_supervisor());

        request.status = SwapStatus::SupervisorRefused;
        assert!(request.is_refused());
        assert!(request.is_terminal());
    }

    #[test]
    fn test_command_action_names() {
        assert_eq!(SwapCommand::Cancel.action_name(), "cancel");
        let validate = SwapCommand::Decide {
            decision: SupervisorDecision::Validate,
            comment: None,
        };
        assert_eq!(validate.action_name(), "validate");
    }
}
