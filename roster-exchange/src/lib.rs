//! ROSTER Exchange - Swap Workflow
//!
//! The two-stage approval of shift swaps:
//! - [`machine`]: pure transition rules over a request snapshot
//! - [`SwapService`]: actor resolution, visibility and the transactional
//!   commit of each transition against a [`roster_storage::RosterStore`]

pub mod machine;
mod service;

pub use machine::{apply, propose, Proposal};
pub use service::SwapService;
