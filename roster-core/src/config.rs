//! Configuration types

use crate::{ConfigError, DEFAULT_LINE};
use serde::{Deserialize, Serialize};

/// Rules applied when a swap request is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct SwapPolicy {
    /// Refuse requests involving agents that are inactive or out of rotation.
    pub require_active_agents: bool,
    /// Maximum length, in characters, of rationales and comments.
    pub max_message_len: usize,
    /// Post label reported for stored schedule rows that carry none.
    /// Records built in memory start from [`DEFAULT_LINE`].
    pub default_line: String,
}

impl Default for SwapPolicy {
    fn default() -> Self {
        Self {
            require_active_agents: true,
            max_message_len: 2000,
            default_line: DEFAULT_LINE.to_string(),
        }
    }
}

impl SwapPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_message_len == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_message_len".to_string(),
                value: self.max_message_len.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.default_line.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "default_line".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        let policy = SwapPolicy::default();
        assert!(policy.require_active_agents);
        assert_eq!(policy.max_message_len, 2000);
        assert_eq!(policy.default_line, "T8");
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_invalid_policies() {
        let policy = SwapPolicy {
            max_message_len: 0,
            ..SwapPolicy::default()
        };
        assert!(matches!(
            policy.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "max_message_len"
        ));

        let policy = SwapPolicy {
            default_line: "  ".to_string(),
            ..SwapPolicy::default()
        };
        assert!(matches!(policy.validate(), Err(ConfigError::MissingRequired { .. })));
    }

    #[test]
    fn test_partial_policy_deserializes_with_defaults() {
        let policy: SwapPolicy =
            serde_json::from_str(r#"{"require_active_agents": false}"#).expect("deserializable");
        assert!(!policy.require_active_agents);
        assert_eq!(policy.max_message_len, 2000);
    }
}
