//! Directory accounts

use crate::{AgentId, Role, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// An account as seen by the swap workflow.
///
/// Owned by the directory; the workflow reads it and never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Agent {
    pub agent_id: AgentId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    /// Employee number, when the account belongs to a staff member.
    pub employee_number: Option<String>,
    pub is_active: bool,
    /// Whether the agent currently appears in the scheduling rotation.
    pub is_active_in_scheduling: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl Agent {
    /// Create an active account with a fresh identifier.
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            agent_id: AgentId::now_v7(),
            username: username.into(),
            first_name: String::new(),
            last_name: String::new(),
            role,
            employee_number: None,
            is_active: true,
            is_active_in_scheduling: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, agent_id: AgentId) -> Self {
        self.agent_id = agent_id;
        self
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    pub fn with_employee_number(mut self, employee_number: impl Into<String>) -> Self {
        self.employee_number = Some(employee_number.into());
        self
    }

    /// Mark the account as deactivated.
    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Keep the account but take it out of the scheduling rotation.
    pub fn out_of_rotation(mut self) -> Self {
        self.is_active_in_scheduling = false;
        self
    }

    /// "First Last", or the username when no name is recorded.
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    /// Active and part of the scheduling rotation.
    pub fn is_schedulable(&self) -> bool {
        self.is_active && self.is_active_in_scheduling
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_falls_back_to_username() {
        let agent = Agent::new("jdupont", Role::Agent);
        assert_eq!(agent.full_name(), "jdupont");

        let agent = agent.with_name("Jeanne", "Dupont");
        assert_eq!(agent.full_name(), "Jeanne Dupont");

        let agent = Agent::new("mlefevre", Role::Agent).with_name("", "Lefevre");
        assert_eq!(agent.full_name(), "Lefevre");
    }

    #[test]
    fn test_schedulable_requires_both_flags() {
        let agent = Agent::new("a", Role::Agent);
        assert!(agent.is_schedulable());
        assert!(!agent.clone().deactivated().is_schedulable());
        assert!(!agent.out_of_rotation().is_schedulable());
    }
}
