//! Append-only history of swap request transitions

use crate::{AgentId, AuditEntryId, EnumParseError, SwapId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What happened to a swap request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    AgentAccepted,
    AgentRefused,
    /// Validated and the two shift records were exchanged
    SupervisorValidated,
    /// Refused; no schedule record was touched
    SupervisorRefused,
    Cancelled,
}

impl AuditAction {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            AuditAction::AgentAccepted => "agent_accepted",
            AuditAction::AgentRefused => "agent_refused",
            AuditAction::SupervisorValidated => "supervisor_validated",
            AuditAction::SupervisorRefused => "supervisor_refused",
            AuditAction::Cancelled => "cancelled",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match s.trim().to_lowercase().as_str() {
            "agent_accepted" => Ok(AuditAction::AgentAccepted),
            "agent_refused" => Ok(AuditAction::AgentRefused),
            "supervisor_validated" => Ok(AuditAction::SupervisorValidated),
            "supervisor_refused" => Ok(AuditAction::SupervisorRefused),
            "cancelled" => Ok(AuditAction::Cancelled),
            _ => Err(EnumParseError::new("audit action", s)),
        }
    }

    /// Whether the schedule was mutated by this action.
    pub fn exchanged_shifts(&self) -> bool {
        matches!(self, AuditAction::SupervisorValidated)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AuditAction::AgentAccepted => "Accepted by the recipient",
            AuditAction::AgentRefused => "Refused by the recipient",
            AuditAction::SupervisorValidated => "Validated by a supervisor, shifts exchanged",
            AuditAction::SupervisorRefused => "Refused by a supervisor, no exchange",
            AuditAction::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for AuditAction {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// One row of a swap request's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuditEntry {
    pub entry_id: AuditEntryId,
    pub swap_id: SwapId,
    pub action: AuditAction,
    /// Human-readable description of the action.
    pub label: String,
    pub actor_id: AgentId,
    pub comment: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl AuditEntry {
    pub fn new(
        swap_id: SwapId,
        action: AuditAction,
        actor_id: AgentId,
        comment: Option<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            entry_id: AuditEntryId::now_v7(),
            swap_id,
            action,
            label: action.label().to_string(),
            actor_id,
            comment,
            created_at,
        }
    }
}
