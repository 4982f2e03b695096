//! Schedule records and the content exchange

use crate::{AgentId, ServiceType, ShiftId, Timestamp};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Post label given to new records when none is specified.
pub const DEFAULT_LINE: &str = "T8";

/// One agent's schedule entry for one date.
///
/// Owner and date identify the record and never change. The start/end
/// times are derived from the service type and are only written through
/// [`ShiftRecord::set_service_type`] and [`ShiftRecord::apply_content`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ShiftRecord {
    pub shift_id: ShiftId,
    pub agent_id: AgentId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date"))]
    pub date: NaiveDate,
    service_type: ServiceType,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "time"))]
    start_time: Option<NaiveTime>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "time"))]
    end_time: Option<NaiveTime>,
    /// Post / assignment label.
    pub line: String,
    pub note: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// The exchangeable part of a shift record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ShiftContent {
    pub service_type: ServiceType,
    pub line: String,
    pub note: Option<String>,
}

impl ShiftRecord {
    pub fn new(agent_id: AgentId, date: NaiveDate, service_type: ServiceType) -> Self {
        let now = Utc::now();
        let (start_time, end_time) = split_range(service_type);
        Self {
            shift_id: ShiftId::now_v7(),
            agent_id,
            date,
            service_type,
            start_time,
            end_time,
            line: DEFAULT_LINE.to_string(),
            note: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, shift_id: ShiftId) -> Self {
        self.shift_id = shift_id;
        self
    }

    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.line = line.into();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn service_type(&self) -> ServiceType {
        self.service_type
    }

    pub fn start_time(&self) -> Option<NaiveTime> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<NaiveTime> {
        self.end_time
    }

    /// Change the service type and re-derive the time bounds.
    pub fn set_service_type(&mut self, service_type: ServiceType, now: Timestamp) {
        self.service_type = service_type;
        let (start_time, end_time) = split_range(service_type);
        self.start_time = start_time;
        self.end_time = end_time;
        self.updated_at = now;
    }

    pub fn content(&self) -> ShiftContent {
        ShiftContent {
            service_type: self.service_type,
            line: self.line.clone(),
            note: self.note.clone(),
        }
    }

    /// Replace the exchangeable content, keeping owner and date.
    pub fn apply_content(&mut self, content: ShiftContent, now: Timestamp) {
        self.set_service_type(content.service_type, now);
        self.line = content.line;
        self.note = content.note;
    }

    /// Worked hours. A shift ending before it starts crosses midnight.
    pub fn duration_hours(&self) -> f64 {
        let (Some(start), Some(end)) = (self.start_time, self.end_time) else {
            return 0.0;
        };
        let mut minutes = (end - start).num_minutes();
        if minutes < 0 {
            minutes += 24 * 60;
        }
        minutes as f64 / 60.0
    }

    pub fn is_working_day(&self) -> bool {
        self.service_type.is_working_day()
    }
}

fn split_range(service_type: ServiceType) -> (Option<NaiveTime>, Option<NaiveTime>) {
    match service_type.time_range() {
        Some((start, end)) => (Some(start), Some(end)),
        None => (None, None),
    }
}

/// Swap the content of two records. Owners and dates stay put; both
/// records get their times re-derived and `updated_at = now`.
pub fn exchange_content(first: &mut ShiftRecord, second: &mut ShiftRecord, now: Timestamp) {
    let first_content = first.content();
    let second_content = second.content();
    first.apply_content(second_content, now);
    second.apply_content(first_content, now);
}

// ============================================================================
// DESERIALIZATION
// ============================================================================

/// Wire shape accepted on input. Times are ignored and re-derived.
#[derive(Deserialize)]
struct ShiftRecordWire {
    shift_id: ShiftId,
    agent_id: AgentId,
    date: NaiveDate,
    service_type: ServiceType,
    #[serde(default = "default_line")]
    line: String,
    #[serde(default)]
    note: Option<String>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

fn default_line() -> String {
    DEFAULT_LINE.to_string()
}

impl From<ShiftRecordWire> for ShiftRecord {
    fn from(wire: ShiftRecordWire) -> Self {
        let (start_time, end_time) = split_range(wire.service_type);
        Self {
            shift_id: wire.shift_id,
            agent_id: wire.agent_id,
            date: wire.date,
            service_type: wire.service_type,
            start_time,
            end_time,
            line: wire.line,
            note: wire.note,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        }
    }
}

impl<'de> Deserialize<'de> for ShiftRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        ShiftRecordWire::deserialize(deserializer).map(ShiftRecord::from)
    }
}

// ============================================================================
// TESTS
// ============================================================================
