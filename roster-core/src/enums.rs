//! Enum types for ROSTER entities

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CORE ENUMS
// ============================================================================

/// Entity type discriminator used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EntityType {
    Agent,
    ShiftRecord,
    SwapRequest,
    AuditEntry,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityType::Agent => "Agent",
            EntityType::ShiftRecord => "ShiftRecord",
            EntityType::SwapRequest => "SwapRequest",
            EntityType::AuditEntry => "AuditEntry",
        };
        f.write_str(name)
    }
}

/// Error when parsing an invalid enum string from storage or the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumParseError {
    pub kind: &'static str,
    pub value: String,
}

impl EnumParseError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for EnumParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for EnumParseError {}

// ============================================================================
// ROLE
// ============================================================================

/// Role of a directory account.
///
/// Closed set: every authorization decision matches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Supervisor,
    #[default]
    Agent,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Supervisor, Role::Agent];

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Supervisor => "supervisor",
            Role::Agent => "agent",
        }
    }

    /// Parse from database string representation.
    ///
    /// Accepts the legacy `superviseur` spelling still present in older exports.
    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "supervisor" | "superviseur" => Ok(Role::Supervisor),
            "agent" => Ok(Role::Agent),
            _ => Err(EnumParseError::new("role", s)),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Supervisor => "Supervisor",
            Role::Agent => "Agent",
        }
    }

    /// Whether this role may validate or refuse an accepted swap request.
    pub fn can_decide_swaps(&self) -> bool {
        match self {
            Role::Supervisor => true,
            Role::Admin | Role::Agent => false,
        }
    }

    /// Whether this role sees every swap request rather than only its own.
    pub fn sees_all_swaps(&self) -> bool {
        match self {
            Role::Admin | Role::Supervisor => true,
            Role::Agent => false,
        }
    }

    /// Whether this role may cancel requests it did not create.
    pub fn can_cancel_any_swap(&self) -> bool {
        match self {
            Role::Admin => true,
            Role::Supervisor | Role::Agent => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for Role {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

// ============================================================================
// SERVICE TYPE
// ============================================================================

/// Kind of service worked on a given day.
///
/// Start and end times are a fixed function of the service type, see
/// [`ServiceType::time_range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ServiceType {
    #[serde(rename = "matin")]
    Morning,
    #[serde(rename = "apres_midi")]
    Afternoon,
    #[serde(rename = "journee")]
    Day,
    #[serde(rename = "nuit")]
    Night,
    #[default]
    #[serde(rename = "repos")]
    Rest,
    #[serde(rename = "vacances")]
    Vacation,
    #[serde(rename = "jour_ferie_repos")]
    HolidayRest,
}

impl ServiceType {
    pub const ALL: [ServiceType; 7] = [
        ServiceType::Morning,
        ServiceType::Afternoon,
        ServiceType::Day,
        ServiceType::Night,
        ServiceType::Rest,
        ServiceType::Vacation,
        ServiceType::HolidayRest,
    ];

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ServiceType::Morning => "matin",
            ServiceType::Afternoon => "apres_midi",
            ServiceType::Day => "journee",
            ServiceType::Night => "nuit",
            ServiceType::Rest => "repos",
            ServiceType::Vacation => "vacances",
            ServiceType::HolidayRest => "jour_ferie_repos",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match s.trim().to_lowercase().as_str() {
            "matin" => Ok(ServiceType::Morning),
            "apres_midi" => Ok(ServiceType::Afternoon),
            "journee" => Ok(ServiceType::Day),
            "nuit" => Ok(ServiceType::Night),
            "repos" => Ok(ServiceType::Rest),
            "vacances" => Ok(ServiceType::Vacation),
            "jour_ferie_repos" => Ok(ServiceType::HolidayRest),
            _ => Err(EnumParseError::new("service type", s)),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ServiceType::Morning => "Morning service",
            ServiceType::Afternoon => "Afternoon service",
            ServiceType::Day => "Day service",
            ServiceType::Night => "Night service",
            ServiceType::Rest => "Rest",
            ServiceType::Vacation => "Vacation",
            ServiceType::HolidayRest => "Public holiday rest",
        }
    }

    /// Fixed (start, end) lookup. `None` for non-working days.
    ///
    /// Night service ends the next morning, so its end is before its start.
    pub fn time_range(&self) -> Option<(NaiveTime, NaiveTime)> {
        let (start, end) = match self {
            ServiceType::Morning => ((5, 0), (13, 0)),
            ServiceType::Afternoon => ((13, 0), (21, 0)),
            ServiceType::Day => ((8, 45), (16, 30)),
            ServiceType::Night => ((21, 0), (5, 0)),
            ServiceType::Rest | ServiceType::Vacation | ServiceType::HolidayRest => return None,
        };
        Some((hour_minute(start)?, hour_minute(end)?))
    }

    pub fn is_working_day(&self) -> bool {
        match self {
            ServiceType::Morning
            | ServiceType::Afternoon
            | ServiceType::Day
            | ServiceType::Night => true,
            ServiceType::Rest | ServiceType::Vacation | ServiceType::HolidayRest => false,
        }
    }
}

fn hour_minute((hour, minute): (u32, u32)) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(hour, minute, 0)
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for ServiceType {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

// ============================================================================
// TESTS
// ============================================================================
