//! Error types for ROSTER operations

use crate::{AgentId, EntityType, ShiftId, SwapId, SwapStatus};
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: EntityType, id: Uuid },

    #[error("Unique constraint {constraint} violated: {reason}")]
    UniqueViolation { constraint: String, reason: String },

    #[error("Swap request {swap_id} is {actual}, expected {expected}")]
    StatusConflict {
        swap_id: SwapId,
        expected: SwapStatus,
        actual: SwapStatus,
    },

    #[error("Shift {shift_id} is owned by {actual}, expected {expected}")]
    OwnershipChanged {
        shift_id: ShiftId,
        expected: AgentId,
        actual: AgentId,
    },

    #[error("Insert failed for {entity_type}: {reason}")]
    InsertFailed { entity_type: EntityType, reason: String },

    #[error("Update failed for {entity_type} with id {id}: {reason}")]
    UpdateFailed {
        entity_type: EntityType,
        id: Uuid,
        reason: String,
    },

    #[error("Storage backend failure: {reason}")]
    Backend { reason: String },
}

/// Validation errors raised while checking caller input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("An agent cannot request a swap with themselves")]
    SelfSwap,

    #[error("Shift {shift_id} belongs to {actual}, not to {expected}")]
    ShiftOwnershipMismatch {
        shift_id: ShiftId,
        expected: AgentId,
        actual: AgentId,
    },

    #[error("An active swap request already exists for shifts {first} and {second}")]
    DuplicateActiveRequest { first: ShiftId, second: ShiftId },

    #[error("Unknown {entity_type} reference: {id}")]
    UnknownReference { entity_type: EntityType, id: Uuid },

    #[error("Agent {agent_id} is not active in scheduling")]
    InactiveAgent { agent_id: AgentId },

    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all ROSTER errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: EntityType, id: Uuid },

    #[error("Agent {actor} is not allowed to {action}")]
    Forbidden { actor: AgentId, action: String },

    #[error("Cannot {action} swap request {swap_id} while it is {status}")]
    InvalidTransition {
        swap_id: SwapId,
        status: SwapStatus,
        action: String,
    },

    #[error("Swap request {swap_id} is out of date: shift {shift_id} now belongs to {actual}, expected {expected}")]
    Inconsistency {
        swap_id: SwapId,
        shift_id: ShiftId,
        expected: AgentId,
        actual: AgentId,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for ROSTER operations.
pub type RosterResult<T> = Result<T, RosterError>;

/// Caller-facing classification of a [`RosterError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Forbidden,
    InvalidTransition,
    Inconsistency,
    Storage,
}

impl ErrorKind {
    /// Stable code exposed to callers.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::InvalidTransition => "INVALID_TRANSITION",
            ErrorKind::Inconsistency => "INCONSISTENCY",
            ErrorKind::Storage => "STORAGE_ERROR",
        }
    }
}

impl RosterError {
    pub fn not_found(entity_type: EntityType, id: impl Into<Uuid>) -> Self {
        RosterError::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    pub fn forbidden(actor: AgentId, action: impl Into<String>) -> Self {
        RosterError::Forbidden {
            actor,
            action: action.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RosterError::Validation(_) => ErrorKind::Validation,
            RosterError::NotFound { .. } => ErrorKind::NotFound,
            RosterError::Forbidden { .. } => ErrorKind::Forbidden,
            RosterError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            RosterError::Inconsistency { .. } => ErrorKind::Inconsistency,
            RosterError::Storage(_) | RosterError::Config(_) => ErrorKind::Storage,
        }
    }

    /// The caller's view is stale and the operation may succeed after a reload.
    pub fn should_refresh(&self) -> bool {
        matches!(self, RosterError::Inconsistency { .. })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_status_conflict() {
        let swap_id = SwapId::new(Uuid::nil());
        let err = StorageError::StatusConflict {
            swap_id,
            expected: SwapStatus::AgentAccepted,
            actual: SwapStatus::SupervisorValidated,
        };
        assert_eq!(
            err.to_string(),
            format!(
                "Swap request {} is supervisor_validated, expected agent_accepted",
                swap_id
            )
        );
    }

    #[test]
    fn test_validation_error_display_self_swap() {
        let err = RosterError::from(ValidationError::SelfSwap);
        assert_eq!(
            err.to_string(),
            "Validation error: An agent cannot request a swap with themselves"
        );
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_error_kind_codes() {
        let swap_id = SwapId::now_v7();
        let agent = AgentId::now_v7();
        let shift = ShiftId::now_v7();

        let cases = vec![
            (RosterError::not_found(EntityType::SwapRequest, swap_id), "NOT_FOUND"),
            (RosterError::forbidden(agent, "decide"), "FORBIDDEN"),
            (
                RosterError::InvalidTransition {
                    swap_id,
                    status: SwapStatus::Cancelled,
                    action: "accept".to_string(),
                },
                "INVALID_TRANSITION",
            ),
            (
                RosterError::Inconsistency {
                    swap_id,
                    shift_id: shift,
                    expected: agent,
                    actual: AgentId::now_v7(),
                },
                "INCONSISTENCY",
            ),
            (
                RosterError::from(StorageError::Backend {
                    reason: "connection reset".to_string(),
                }),
                "STORAGE_ERROR",
            ),
        ];

        for (err, code) in cases {
            assert_eq!(err.kind().code(), code, "{err}");
        }
    }

    #[test]
    fn test_only_inconsistency_asks_for_refresh() {
        let swap_id = SwapId::now_v7();
        let inconsistency = RosterError::Inconsistency {
            swap_id,
            shift_id: ShiftId::now_v7(),
            expected: AgentId::now_v7(),
            actual: AgentId::now_v7(),
        };
        assert!(inconsistency.should_refresh());
        assert!(!RosterError::not_found(EntityType::SwapRequest, swap_id).should_refresh());
    }
}
