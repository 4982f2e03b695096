//! Query filters for the swap ledger and the schedule

use crate::{Agent, SwapRequest, SwapStatus, Timestamp, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive range of whole days (UTC). Open ends are unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DateRange {
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub from: Option<NaiveDate>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Reject ranges whose start is after their end.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => Err(ValidationError::InvalidValue {
                field: "from".to_string(),
                reason: format!("{} is after {}", from, to),
            }),
            _ => Ok(()),
        }
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }

    /// Whether the instant falls on a day inside the range.
    pub fn contains(&self, at: Timestamp) -> bool {
        self.contains_date(at.date_naive())
    }

    /// Human-readable period, e.g. `2025-06-01 to now`.
    pub fn label(&self) -> String {
        let from = self
            .from
            .map_or_else(|| "beginning".to_string(), |d| d.to_string());
        let to = self.to.map_or_else(|| "now".to_string(), |d| d.to_string());
        format!("{} to {}", from, to)
    }
}

/// Which side of a request the caller is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Involvement {
    #[default]
    Any,
    /// Caller is the requester
    Sent,
    /// Caller is the recipient
    Received,
}

/// Filter for listing swap requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SwapFilter {
    pub status: Option<SwapStatus>,
    #[serde(default)]
    pub involvement: Involvement,
}

impl SwapFilter {
    pub fn with_status(mut self, status: SwapStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_involvement(mut self, involvement: Involvement) -> Self {
        self.involvement = involvement;
        self
    }

    /// Visibility is always applied on top of the filter fields.
    pub fn matches(&self, request: &SwapRequest, actor: &Agent) -> bool {
        if !request.is_visible_to(actor) {
            return false;
        }
        if self.status.is_some_and(|status| request.status != status) {
            return false;
        }
        match self.involvement {
            Involvement::Any => true,
            Involvement::Sent => request.requester_id == actor.agent_id,
            Involvement::Received => request.recipient_id == actor.agent_id,
        }
    }
}
