//! ROSTER Core - Entity Types
//!
//! Data structures shared by every other crate: identifiers, directory
//! accounts, schedule records, swap requests, audit entries, filters and
//! the error taxonomy. No I/O happens here.

mod agent;
mod audit;
mod config;
mod enums;
mod error;
mod filter;
mod identity;
mod shift;
mod stats;
mod swap;

pub use agent::*;
pub use audit::*;
pub use config::*;
pub use enums::*;
pub use error::*;
pub use filter::*;
pub use identity::*;
pub use shift::*;
pub use stats::*;
pub use swap::*;
