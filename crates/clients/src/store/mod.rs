// Path: crates/clients/src/store/mod.rs
//! Proposal store implementations.

mod memory;
mod rest;

pub use memory::MemoryProposalStore;
pub use rest::RestProposalStore;
