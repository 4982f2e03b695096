//! ROSTER Test Utilities
//!
//! Shared test infrastructure for the ROSTER workspace:
//! - Proptest generators for entity types
//! - A seeded in-memory roster for workflow scenarios
//! - Assertions on the error taxonomy

// Re-export the in-memory store from its source crate
pub use roster_storage::MemoryStore;

// Re-export core types for convenience
pub use roster_core::{
    Agent, AgentId, AuditAction, AuditEntry, DateRange, EntityIdType, EntityType, Role,
    RosterError, RosterResult, ServiceType, ShiftId, ShiftRecord, StorageError, SwapDraft,
    SwapId, SwapRequest, SwapStatus, Timestamp, ValidationError,
};

use chrono::NaiveDate;
use uuid::Uuid;

/// Build a date, panicking on invalid input. Test use only.
#[track_caller]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => panic!("invalid test date {year}-{month}-{day}"),
    }
}

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating ROSTER entity types.

    use super::*;
    use proptest::prelude::*;

    /// Generate a random UUID (for generic ID generation).
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    pub fn arb_agent_id() -> impl Strategy<Value = AgentId> {
        arb_uuid().prop_map(AgentId::new)
    }

    pub fn arb_shift_id() -> impl Strategy<Value = ShiftId> {
        arb_uuid().prop_map(ShiftId::new)
    }

    pub fn arb_role() -> impl Strategy<Value = Role> {
        proptest::sample::select(Role::ALL.to_vec())
    }

    pub fn arb_service_type() -> impl Strategy<Value = ServiceType> {
        proptest::sample::select(ServiceType::ALL.to_vec())
    }

    pub fn arb_swap_status() -> impl Strategy<Value = SwapStatus> {
        proptest::sample::select(SwapStatus::ALL.to_vec())
    }

    /// A day in 2025.
    pub fn arb_date() -> impl Strategy<Value = NaiveDate> {
        (0u64..365).prop_map(|offset| date(2025, 1, 1) + chrono::Days::new(offset))
    }

    /// Optional free text, sometimes blank.
    pub fn arb_comment() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            Just(Some("   ".to_string())),
            "[a-zA-Z ]{1,40}".prop_map(Some),
        ]
    }

    /// An active account with the given role.
    pub fn arb_agent(role: Role) -> impl Strategy<Value = Agent> {
        ("[a-z]{3,10}", "[A-Z][a-z]{2,8}", "[A-Z][a-z]{2,8}").prop_map(
            move |(username, first, last)| Agent::new(username, role).with_name(first, last),
        )
    }

    pub fn arb_shift_record(agent_id: AgentId) -> impl Strategy<Value = ShiftRecord> {
        (arb_date(), arb_service_type(), "T[0-9]{1,2}").prop_map(
            move |(day, service, line)| ShiftRecord::new(agent_id, day, service).with_line(line),
        )
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;
    use roster_storage::ScheduleStore;

    /// A small team seeded into a [`MemoryStore`].
    ///
    /// Alice works the morning of 2025-06-24, Bruno the night of 2025-06-25.
    /// Chloe is an agent with no stake in the default swap.
    #[derive(Debug, Clone)]
    pub struct SeededRoster {
        pub store: MemoryStore,
        pub alice: Agent,
        pub bruno: Agent,
        pub chloe: Agent,
        pub supervisor: Agent,
        pub admin: Agent,
        pub alice_shift: ShiftRecord,
        pub bruno_shift: ShiftRecord,
    }

    impl SeededRoster {
        /// Draft from Alice to Bruno over the two seeded shifts.
        pub fn alice_to_bruno(&self, message: Option<&str>) -> SwapDraft {
            SwapDraft {
                recipient_id: self.bruno.agent_id,
                requester_shift_id: self.alice_shift.shift_id,
                recipient_shift_id: self.bruno_shift.shift_id,
                message: message.map(str::to_string),
            }
        }

        /// Save a new record for `agent` and return it as stored.
        pub async fn add_shift(
            &self,
            agent: &Agent,
            day: NaiveDate,
            service: ServiceType,
        ) -> ShiftRecord {
            match self
                .store
                .shift_save(&ShiftRecord::new(agent.agent_id, day, service))
                .await
            {
                Ok(record) => record,
                Err(err) => panic!("seeding shift failed: {err}"),
            }
        }

        /// Fetch a record by id, panicking when missing.
        pub async fn shift(&self, shift_id: ShiftId) -> ShiftRecord {
            match self.store.shift_get_by_id(shift_id).await {
                Ok(Some(record)) => record,
                other => panic!("shift {shift_id} not readable: {other:?}"),
            }
        }
    }

    pub async fn seeded_roster() -> SeededRoster {
        let store = MemoryStore::new();

        let alice = Agent::new("amartin", Role::Agent)
            .with_name("Alice", "Martin")
            .with_employee_number("T8-0012");
        let bruno = Agent::new("bbernard", Role::Agent)
            .with_name("Bruno", "Bernard")
            .with_employee_number("T8-0027");
        let chloe = Agent::new("cpetit", Role::Agent).with_name("Chloe", "Petit");
        let supervisor = Agent::new("sdurand", Role::Supervisor).with_name("Sam", "Durand");
        let admin = Agent::new("admin", Role::Admin);

        for agent in [&alice, &bruno, &chloe, &supervisor, &admin] {
            store.insert_agent(agent.clone()).await;
        }

        let mut shifts = Vec::with_capacity(2);
        for record in [
            ShiftRecord::new(alice.agent_id, date(2025, 6, 24), ServiceType::Morning),
            ShiftRecord::new(bruno.agent_id, date(2025, 6, 25), ServiceType::Night),
        ] {
            match store.shift_save(&record).await {
                Ok(stored) => shifts.push(stored),
                Err(err) => panic!("seeding shift failed: {err}"),
            }
        }
        let bruno_shift = shifts.remove(1);
        let alice_shift = shifts.remove(0);

        SeededRoster {
            store,
            alice,
            bruno,
            chloe,
            supervisor,
            admin,
            alice_shift,
            bruno_shift,
        }
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertion functions for ROSTER-specific validation.

    use super::*;

    /// Assert that a RosterResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &RosterResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a RosterResult is a validation error.
    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &RosterResult<T>) {
        match result {
            Err(RosterError::Validation(_)) => {}
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    /// Assert that a RosterResult is a NotFound error for the entity type.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &RosterResult<T>, entity_type: EntityType) {
        match result {
            Err(RosterError::NotFound { entity_type: et, .. }) => {
                assert_eq!(*et, entity_type, "Wrong entity type in NotFound error");
            }
            other => panic!("Expected NotFound error for {:?}, got: {:?}", entity_type, other),
        }
    }

    #[track_caller]
    pub fn assert_forbidden<T: std::fmt::Debug>(result: &RosterResult<T>) {
        match result {
            Err(RosterError::Forbidden { .. }) => {}
            other => panic!("Expected Forbidden error, got: {:?}", other),
        }
    }

    /// Assert that a RosterResult is an InvalidTransition from `status`.
    #[track_caller]
    pub fn assert_invalid_transition<T: std::fmt::Debug>(
        result: &RosterResult<T>,
        status: SwapStatus,
    ) {
        match result {
            Err(RosterError::InvalidTransition { status: actual, .. }) => {
                assert_eq!(*actual, status, "Wrong status in InvalidTransition error");
            }
            other => panic!("Expected InvalidTransition from {}, got: {:?}", status, other),
        }
    }

    #[track_caller]
    pub fn assert_inconsistency<T: std::fmt::Debug>(result: &RosterResult<T>) {
        match result {
            Err(err @ RosterError::Inconsistency { .. }) => {
                assert!(err.should_refresh());
            }
            other => panic!("Expected Inconsistency error, got: {:?}", other),
        }
    }

    /// Assert that a record's times match the lookup for its service type.
    #[track_caller]
    pub fn assert_times_derived(record: &ShiftRecord) {
        let expected = record.service_type().time_range();
        assert_eq!(record.start_time(), expected.map(|range| range.0));
        assert_eq!(record.end_time(), expected.map(|range| range.1));
    }
}
