//! ROSTER Storage - Collaborator Contracts
//!
//! Async traits for the directory, the schedule store and the swap ledger,
//! the [`SwapCommit`] unit of work, and [`MemoryStore`], an implementation
//! serialised behind a single lock.

mod commit;
mod memory;
mod traits;

pub use commit::{CommitOutcome, OwnershipGuard, RecordGuard, SwapCommit};
pub use memory::{MemoryStore, ACTIVE_PAIR_CONSTRAINT};
pub use traits::{Directory, RosterStore, ScheduleStore, SwapLedger, SwapQuery};
