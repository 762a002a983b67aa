//! Wire protocol framing for the columnstore stream-socket transport
//! (spec.md §6). This crate owns everything the core engine explicitly
//! doesn't: the header+payload framing, the load/print sub-protocols, and
//! the session loop that drives one connection's commands through
//! `columnstore_core::dispatch`.
//!
//! Out of scope for design rigor per spec.md §1 ("thin collaborators") —
//! this module is a format contract, not the hard part of the system.

pub mod proto;
pub mod session;

pub use proto::{Header, StatusWire};
